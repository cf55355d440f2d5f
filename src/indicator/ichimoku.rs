use crate::config_loader::{ConfigError, ConfigResult, ConfigValidation};
use crate::indicator::rolling::{MAX_RESERVE, RollingWindow};
use crate::indicator::{TABuilder, TAs, TAsBuilder};
use crate::model::Candle;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;

/// 전환선 기본 기간
pub const DEFAULT_TENKAN_PERIOD: usize = 9;
/// 기준선 기본 기간
pub const DEFAULT_KIJUN_PERIOD: usize = 26;
/// 선행스팬 B 기본 기간
pub const DEFAULT_SENKOU_B_PERIOD: usize = 52;
/// 기본 이동(displacement) 값
pub const DEFAULT_DISPLACEMENT: usize = 26;

/// 출력 히스토리 보관 정책
///
/// 선행스팬 값은 히스토리에서 `displacement`만큼 이전 값을 읽어 반환합니다.
/// `Unbounded`는 모든 값을 보관하므로 스트림 길이에 비례해 메모리가 늘어납니다.
/// `Displacement`는 조회에 필요한 최근 `displacement + 1`개만 남기며, 반환 값은
/// 두 정책에서 항상 같습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRetention {
    /// 모든 값을 보관 (기본값)
    #[default]
    Unbounded,
    /// 최근 `displacement + 1`개만 보관
    Displacement,
}

/// 일목균형표 설정
///
/// 모든 필드는 선택 사항이며, 지정하지 않은 필드는 기본값(9, 26, 52, 26)을 사용합니다.
/// 명시적으로 지정한 0은 기본값으로 바뀌지 않고 그대로 사용됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IchimokuConfig {
    /// 전환선 기간
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenkan_period: Option<usize>,
    /// 기준선 기간
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kijun_period: Option<usize>,
    /// 선행스팬 B 기간 (원시 가격 버퍼의 최대 크기이기도 함)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub senkou_b_period: Option<usize>,
    /// 후행스팬 조회와 선행스팬 출력 지연에 쓰이는 이동 값
    #[serde(skip_serializing_if = "Option::is_none")]
    pub displacement: Option<usize>,
    /// 히스토리 보관 정책
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention: Option<HistoryRetention>,
}

impl IchimokuConfig {
    /// 지정되지 않은 필드를 기본값으로 채운 매개변수 반환
    pub fn params(&self) -> IchimokuParams {
        IchimokuParams {
            tenkan_period: self.tenkan_period.unwrap_or(DEFAULT_TENKAN_PERIOD),
            kijun_period: self.kijun_period.unwrap_or(DEFAULT_KIJUN_PERIOD),
            senkou_b_period: self.senkou_b_period.unwrap_or(DEFAULT_SENKOU_B_PERIOD),
            displacement: self.displacement.unwrap_or(DEFAULT_DISPLACEMENT),
        }
    }

    /// 히스토리 보관 정책 (기본값: Unbounded)
    pub fn retention(&self) -> HistoryRetention {
        self.retention.unwrap_or_default()
    }
}

impl ConfigValidation for IchimokuConfig {
    fn validate(&self) -> ConfigResult<()> {
        let periods = [
            ("tenkan_period", self.tenkan_period),
            ("kijun_period", self.kijun_period),
            ("senkou_b_period", self.senkou_b_period),
        ];

        for (name, period) in periods {
            if period == Some(0) {
                return Err(ConfigError::ValidationError(format!(
                    "{}은(는) 0보다 커야 합니다",
                    name
                )));
            }
        }

        Ok(())
    }
}

/// 일목균형표 매개변수 구조체
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IchimokuParams {
    /// 전환선 기간 (일반적으로 9)
    pub tenkan_period: usize,
    /// 기준선 기간 (일반적으로 26)
    pub kijun_period: usize,
    /// 선행스팬 B 기간 (일반적으로 52)
    pub senkou_b_period: usize,
    /// 이동 값 (일반적으로 26)
    pub displacement: usize,
}

impl Default for IchimokuParams {
    fn default() -> Self {
        IchimokuParams {
            tenkan_period: DEFAULT_TENKAN_PERIOD,
            kijun_period: DEFAULT_KIJUN_PERIOD,
            senkou_b_period: DEFAULT_SENKOU_B_PERIOD,
            displacement: DEFAULT_DISPLACEMENT,
        }
    }
}

impl Display for IchimokuParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Ichimoku({},{},{},{})",
            self.tenkan_period, self.kijun_period, self.senkou_b_period, self.displacement
        )
    }
}

/// 일목균형표를 구성하는 선
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IchimokuLine {
    /// 전환선
    TenkanSen,
    /// 기준선
    KijunSen,
    /// 선행스팬 A
    SenkouSpanA,
    /// 선행스팬 B
    SenkouSpanB,
    /// 후행스팬
    ChikouSpan,
}

/// 한 캔들 시점의 일목균형표 값
///
/// 아직 계산할 수 없는 선은 None입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ichimoku {
    /// 전환선 값 (단기 모멘텀)
    pub tenkan_sen: Option<f64>,
    /// 기준선 값 (중기 모멘텀)
    pub kijun_sen: Option<f64>,
    /// 선행스팬 A 값 (히스토리에서 displacement만큼 이전 값)
    pub senkou_span_a: Option<f64>,
    /// 선행스팬 B 값 (히스토리에서 displacement만큼 이전 값)
    pub senkou_span_b: Option<f64>,
    /// 후행스팬 값 (displacement만큼 이전 캔들의 종가)
    pub chikou_span: Option<f64>,
}

struct OptionalValue(Option<f64>);

impl Display for OptionalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{:.2}", value),
            None => write!(f, "-"),
        }
    }
}

impl Display for Ichimoku {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Ichimoku(T:{}, K:{}, SpA:{}, SpB:{}, C:{})",
            OptionalValue(self.tenkan_sen),
            OptionalValue(self.kijun_sen),
            OptionalValue(self.senkou_span_a),
            OptionalValue(self.senkou_span_b),
            OptionalValue(self.chikou_span)
        )
    }
}

impl Ichimoku {
    /// 선 종류로 값 조회
    pub fn line(&self, line: IchimokuLine) -> Option<f64> {
        match line {
            IchimokuLine::TenkanSen => self.tenkan_sen,
            IchimokuLine::KijunSen => self.kijun_sen,
            IchimokuLine::SenkouSpanA => self.senkou_span_a,
            IchimokuLine::SenkouSpanB => self.senkou_span_b,
            IchimokuLine::ChikouSpan => self.chikou_span,
        }
    }

    /// 다섯 선이 모두 계산되었는지 확인
    pub fn is_complete(&self) -> bool {
        self.tenkan_sen.is_some()
            && self.kijun_sen.is_some()
            && self.senkou_span_a.is_some()
            && self.senkou_span_b.is_some()
            && self.chikou_span.is_some()
    }

    fn cloud(&self) -> Option<(f64, f64)> {
        Some((self.senkou_span_a?, self.senkou_span_b?))
    }

    /// 클라우드의 두께 (선행스팬 A와 B 사이의 거리)
    ///
    /// 양수 값은 상승 트렌드, 음수 값은 하락 트렌드를 나타냅니다.
    ///
    /// # Returns
    /// * `Option<f64>` - 선행스팬이 하나라도 없으면 None
    pub fn cloud_thickness(&self) -> Option<f64> {
        self.cloud().map(|(a, b)| a - b)
    }

    /// 가격이 클라우드 위에 있는지 확인
    ///
    /// # Arguments
    /// * `price` - 현재 가격
    ///
    /// # Returns
    /// * `bool` - 클라우드 위 여부 (클라우드가 없으면 false)
    pub fn is_price_above_cloud(&self, price: f64) -> bool {
        self.cloud()
            .is_some_and(|(a, b)| price > a && price > b)
    }

    /// 가격이 클라우드 아래에 있는지 확인
    ///
    /// # Arguments
    /// * `price` - 현재 가격
    ///
    /// # Returns
    /// * `bool` - 클라우드 아래 여부 (클라우드가 없으면 false)
    pub fn is_price_below_cloud(&self, price: f64) -> bool {
        self.cloud()
            .is_some_and(|(a, b)| price < a && price < b)
    }

    /// 가격이 클라우드 내에 있는지 확인
    ///
    /// # Arguments
    /// * `price` - 현재 가격
    ///
    /// # Returns
    /// * `bool` - 클라우드 내 여부 (클라우드가 없으면 false)
    pub fn is_price_in_cloud(&self, price: f64) -> bool {
        self.cloud().is_some()
            && !self.is_price_above_cloud(price)
            && !self.is_price_below_cloud(price)
    }

    /// 전환선이 기준선 위에 있는지 확인 (골든 크로스 후 상태)
    pub fn is_tenkan_above_kijun(&self) -> bool {
        matches!((self.tenkan_sen, self.kijun_sen), (Some(t), Some(k)) if t > k)
    }

    /// 전환선이 기준선 아래에 있는지 확인 (데드 크로스 후 상태)
    pub fn is_tenkan_below_kijun(&self) -> bool {
        matches!((self.tenkan_sen, self.kijun_sen), (Some(t), Some(k)) if t < k)
    }

    /// 클라우드가 상승 트렌드인지 확인 (선행스팬 A > 선행스팬 B)
    pub fn is_bullish_cloud(&self) -> bool {
        self.cloud().is_some_and(|(a, b)| a > b)
    }

    /// 클라우드가 하락 트렌드인지 확인 (선행스팬 A < 선행스팬 B)
    pub fn is_bearish_cloud(&self) -> bool {
        self.cloud().is_some_and(|(a, b)| a < b)
    }
}

/// 계산된 값만 순서대로 쌓는 출력 히스토리
#[derive(Debug, Clone)]
struct LineHistory {
    values: VecDeque<f64>,
    limit: Option<usize>,
}

impl LineHistory {
    fn new(retention: HistoryRetention, displacement: usize) -> Self {
        let limit = match retention {
            HistoryRetention::Unbounded => None,
            HistoryRetention::Displacement => Some(displacement.saturating_add(1)),
        };

        LineHistory {
            values: VecDeque::with_capacity(limit.unwrap_or(0).min(MAX_RESERVE)),
            limit,
        }
    }

    fn push(&mut self, value: f64) {
        self.values.push_back(value);
        if let Some(limit) = self.limit {
            if self.values.len() > limit {
                self.values.pop_front();
            }
        }
    }

    /// 최신 값으로부터 `displacement`만큼 이전 값
    fn displaced(&self, displacement: usize) -> Option<f64> {
        let len = self.values.len();
        if len > displacement {
            self.values.get(len - 1 - displacement).copied()
        } else {
            None
        }
    }
}

/// 일목균형표 스트리밍 계산기
///
/// 캔들을 하나씩 받아 다섯 선을 갱신합니다. 고가/저가/종가 버퍼는
/// `senkou_b_period` 크기로 제한되며, 출력 히스토리는 `HistoryRetention`에 따라
/// 보관됩니다. 인스턴스끼리는 상태를 공유하지 않습니다.
#[derive(Debug, Clone)]
pub struct IchimokuBuilder {
    params: IchimokuParams,
    retention: HistoryRetention,
    high: RollingWindow,
    low: RollingWindow,
    close: RollingWindow,
    tenkan_history: LineHistory,
    kijun_history: LineHistory,
    senkou_a_history: LineHistory,
    senkou_b_history: LineHistory,
    chikou_history: LineHistory,
}

impl Default for IchimokuBuilder {
    fn default() -> Self {
        IchimokuBuilder::new(IchimokuParams::default())
    }
}

impl IchimokuBuilder {
    /// 새 일목균형표 계산기 생성 (히스토리는 무제한 보관)
    ///
    /// # Arguments
    /// * `params` - 일목균형표 매개변수
    pub fn new(params: IchimokuParams) -> Self {
        Self::with_retention(params, HistoryRetention::Unbounded)
    }

    /// 히스토리 보관 정책을 지정하여 계산기 생성
    ///
    /// # Arguments
    /// * `params` - 일목균형표 매개변수
    /// * `retention` - 히스토리 보관 정책
    pub fn with_retention(params: IchimokuParams, retention: HistoryRetention) -> Self {
        debug!("일목균형표 계산기 생성: {}, 보관 정책: {:?}", params, retention);

        let history = || LineHistory::new(retention, params.displacement);
        let builder = IchimokuBuilder {
            params,
            retention,
            high: RollingWindow::new(params.senkou_b_period),
            low: RollingWindow::new(params.senkou_b_period),
            close: RollingWindow::new(params.senkou_b_period),
            tenkan_history: history(),
            kijun_history: history(),
            senkou_a_history: history(),
            senkou_b_history: history(),
            chikou_history: history(),
        };

        debug!("가격 버퍼: {}", builder.high);
        builder
    }

    /// 설정으로부터 계산기 생성
    pub fn from_config(config: &IchimokuConfig) -> Self {
        Self::with_retention(config.params(), config.retention())
    }

    pub fn params(&self) -> &IchimokuParams {
        &self.params
    }

    pub fn retention(&self) -> HistoryRetention {
        self.retention
    }

    /// 호출이 끝난 뒤 원시 가격 버퍼가 유지하는 최대 길이 (`senkou_b_period`)
    pub fn buffer_capacity(&self) -> usize {
        self.high.capacity()
    }

    /// 현재 원시 가격 버퍼 길이 (세 버퍼는 항상 같은 길이)
    pub fn buffer_len(&self) -> usize {
        self.high.len()
    }

    fn line_history(&self, line: IchimokuLine) -> &LineHistory {
        match line {
            IchimokuLine::TenkanSen => &self.tenkan_history,
            IchimokuLine::KijunSen => &self.kijun_history,
            IchimokuLine::SenkouSpanA => &self.senkou_a_history,
            IchimokuLine::SenkouSpanB => &self.senkou_b_history,
            IchimokuLine::ChikouSpan => &self.chikou_history,
        }
    }

    /// 보관 중인 히스토리 값 개수
    pub fn history_len(&self, line: IchimokuLine) -> usize {
        self.line_history(line).values.len()
    }

    /// 보관 중인 히스토리 값 (오래된 값부터)
    pub fn history(&self, line: IchimokuLine) -> impl Iterator<Item = f64> + '_ {
        self.line_history(line).values.iter().copied()
    }

    /// 최고가와 최저가의 중간값 계산
    ///
    /// # Arguments
    /// * `period` - 계산 기간
    ///
    /// # Returns
    /// * `Option<f64>` - 데이터가 부족하면 None
    fn midpoint(&self, period: usize) -> Option<f64> {
        let highest = self.high.max_of_last(period)?;
        let lowest = self.low.min_of_last(period)?;
        Some((highest + lowest) / 2.0)
    }

    /// 새 캔들로 일목균형표 갱신
    ///
    /// # Arguments
    /// * `candle` - 새 캔들 데이터
    ///
    /// # Returns
    /// * `Ichimoku` - 현재 캔들 시점의 값
    pub fn next<C: Candle + ?Sized>(&mut self, candle: &C) -> Ichimoku {
        self.high.push(candle.high_price());
        self.low.push(candle.low_price());
        self.close.push(candle.close_price());

        // 전환선 (Tenkan-sen)
        let tenkan_sen = self.midpoint(self.params.tenkan_period);
        if let Some(value) = tenkan_sen {
            self.tenkan_history.push(value);
        }

        // 기준선 (Kijun-sen)
        let kijun_sen = self.midpoint(self.params.kijun_period);
        if let Some(value) = kijun_sen {
            self.kijun_history.push(value);
        }

        // 선행스팬 A (Senkou Span A)
        let senkou_span_a = match (tenkan_sen, kijun_sen) {
            (Some(tenkan), Some(kijun)) => Some((tenkan + kijun) / 2.0),
            _ => None,
        };
        if let Some(value) = senkou_span_a {
            self.senkou_a_history.push(value);
        }

        // 선행스팬 B (Senkou Span B)
        let senkou_span_b = self.midpoint(self.params.senkou_b_period);
        if let Some(value) = senkou_span_b {
            self.senkou_b_history.push(value);
        }

        // 후행스팬 (Chikou Span): 축출 전 버퍼 기준
        let chikou_span = self.close.back(self.params.displacement);
        if let Some(value) = chikou_span {
            self.chikou_history.push(value);
        }

        self.high.evict_overflow();
        self.low.evict_overflow();
        self.close.evict_overflow();

        let ichimoku = Ichimoku {
            tenkan_sen,
            kijun_sen,
            senkou_span_a: self.senkou_a_history.displaced(self.params.displacement),
            senkou_span_b: self.senkou_b_history.displaced(self.params.displacement),
            chikou_span,
        };

        trace!("{} -> {}", self.params, ichimoku);
        ichimoku
    }

    /// 고가, 저가, 종가를 직접 전달하는 `next`
    pub fn next_value(&mut self, high: f64, low: f64, close: f64) -> Ichimoku {
        self.next(&crate::model::HlcCandle::new(high, low, close))
    }
}

impl<C> TABuilder<Ichimoku, C> for IchimokuBuilder
where
    C: Candle,
{
    fn next(&mut self, data: &C) -> Ichimoku {
        IchimokuBuilder::next(self, data)
    }
}

/// 여러 일목균형표 지표 컬렉션 타입
pub type Ichimokus = TAs<IchimokuParams, Ichimoku>;

/// 여러 일목균형표 지표 빌더 타입
pub type IchimokusBuilder<C> = TAsBuilder<IchimokuParams, Ichimoku, C>;

/// 일목균형표 컬렉션 빌더 팩토리
pub struct IchimokusBuilderFactory;

impl IchimokusBuilderFactory {
    /// 여러 일목균형표 매개변수 세트에 대한 빌더 생성
    ///
    /// # Arguments
    /// * `params` - 일목균형표 매개변수 세트 목록
    ///
    /// # Returns
    /// * `IchimokusBuilder` - 여러 일목균형표 빌더
    pub fn build<C: Candle + 'static>(params: &[IchimokuParams]) -> IchimokusBuilder<C> {
        IchimokusBuilder::new("ichimokus".to_owned(), params, |param| {
            Box::new(IchimokuBuilder::new(*param))
        })
    }

    /// 기본 일목균형표 매개변수로 빌더 생성 (9, 26, 52, 26)
    pub fn build_default<C: Candle + 'static>() -> IchimokusBuilder<C> {
        Self::build(&[IchimokuParams::default()])
    }
}
