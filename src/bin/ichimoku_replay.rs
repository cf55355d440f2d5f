use log::{debug, error, info, trace, warn};
use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use trading_ichimoku::config_loader::{ConfigFormat, ConfigLoader};
use trading_ichimoku::indicator::ichimoku::{IchimokuBuilder, IchimokuConfig};
use trading_ichimoku::model::HlcCandle;

/// 표준 입력의 JSON Lines 캔들을 하나씩 일목균형표에 넣고,
/// 캔들마다 결과를 JSON 한 줄로 출력합니다.
fn main() {
    // 로그 초기화
    env_logger::init();

    info!("일목균형표 리플레이 시작");

    let args: Vec<String> = env::args().collect();
    debug!("커맨드 라인 인수: {:?}", args);

    if args.iter().skip(1).any(|arg| arg == "-h" || arg == "--help") {
        println!("사용법: {} [설정_파일_경로(.toml|.json)] < candles.jsonl", args[0]);
        println!("입력 한 줄 예시: {{\"high\":10.5,\"low\":9.5,\"close\":10.0}}");
        return;
    }

    let config = match args.get(1).map(PathBuf::from) {
        Some(path) => {
            match ConfigLoader::load_from_file::<IchimokuConfig>(&path, ConfigFormat::Auto) {
                Ok(config) => config,
                Err(err) => {
                    error!("설정 로드 실패: {}", err);
                    eprintln!("설정 로드 실패: {}", err);
                    std::process::exit(1);
                }
            }
        }
        None => {
            debug!("설정 파일 없음, 기본 설정 사용");
            IchimokuConfig::default()
        }
    };

    let mut builder = IchimokuBuilder::from_config(&config);
    info!(
        "설정: {}, 보관 정책: {:?}",
        builder.params(),
        builder.retention()
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    match replay(&mut builder, stdin.lock(), stdout.lock()) {
        Ok(summary) => info!(
            "일목균형표 리플레이 종료: 처리 {}개, 건너뜀 {}개",
            summary.processed, summary.skipped
        ),
        Err(err) => {
            error!("리플레이 중단: {}", err);
            std::process::exit(1);
        }
    }
}

/// 리플레이 처리 결과
#[derive(Debug, Default, PartialEq, Eq)]
struct ReplaySummary {
    /// 처리한 캔들 수
    processed: usize,
    /// 파싱에 실패해 건너뛴 줄 수
    skipped: usize,
}

/// JSON Lines 캔들을 읽어 캔들마다 결과 JSON 한 줄을 씁니다.
///
/// 빈 줄은 무시하고, 파싱할 수 없는 줄은 로그를 남기고 건너뜁니다.
/// 입력 읽기나 출력 쓰기에 실패하면 오류를 반환합니다.
fn replay(
    builder: &mut IchimokuBuilder,
    input: impl BufRead,
    mut out: impl Write,
) -> io::Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();

    for (line_no, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let candle: HlcCandle = match serde_json::from_str(&line) {
            Ok(candle) => candle,
            Err(err) => {
                warn!("{}번째 줄 파싱 실패, 건너뜀: {}", line_no + 1, err);
                summary.skipped += 1;
                continue;
            }
        };

        let ichimoku = builder.next(&candle);
        trace!("{} -> {}", candle, ichimoku);
        summary.processed += 1;

        let json = serde_json::to_string(&ichimoku).map_err(io::Error::other)?;
        writeln!(out, "{}", json)?;
    }

    out.flush()?;
    Ok(summary)
}
