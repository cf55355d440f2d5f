use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// 지표 계산에 필요한 캔들 인터페이스
///
/// 일목균형표는 고가, 저가, 종가만 사용합니다.
pub trait Candle: Debug {
    /// 고가
    fn high_price(&self) -> f64;

    /// 저가
    fn low_price(&self) -> f64;

    /// 종가
    fn close_price(&self) -> f64;
}

/// 고가/저가/종가만 담는 단순 캔들 레코드
///
/// 호출자가 소유하며 지표에 전달된 후에는 따로 보관되지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HlcCandle {
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl HlcCandle {
    /// 새 캔들 생성
    pub fn new(high: f64, low: f64, close: f64) -> Self {
        HlcCandle { high, low, close }
    }
}

impl Candle for HlcCandle {
    fn high_price(&self) -> f64 {
        self.high
    }

    fn low_price(&self) -> f64 {
        self.low
    }

    fn close_price(&self) -> f64 {
        self.close
    }
}

impl std::fmt::Display for HlcCandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HLC(h={}, l={}, c={})", self.high, self.low, self.close)
    }
}
