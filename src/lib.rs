//! 캔들 스트림에서 일목균형표(Ichimoku Kinko Hyo)를 증분 계산하는 라이브러리

pub mod indicator;
pub mod model;

/// 설정 로더
pub mod config_loader;
