use log::{debug, error, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// 설정 로드 오류
#[derive(Debug)]
pub enum ConfigError {
    /// 파일 오류
    FileError(String),
    /// 파싱 오류
    ParseError(String),
    /// 유효성 검사 오류
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileError(msg) => write!(f, "설정 파일 오류: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "설정 파싱 오류: {}", msg),
            ConfigError::ValidationError(msg) => write!(f, "설정 유효성 검사 오류: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// 설정 로드 결과
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 설정 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON 형식
    Json,
    /// TOML 형식
    Toml,
    /// 자동 감지 (파일은 확장자, 문자열은 JSON 후 TOML 순으로 시도)
    Auto,
}

/// 설정 유효성 검사 트레이트
pub trait ConfigValidation {
    /// 설정 유효성 검사
    fn validate(&self) -> ConfigResult<()>;
}

/// 설정 파일 로더
#[derive(Debug)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// 파일에서 설정 로드
    ///
    /// # Arguments
    /// * `path` - 설정 파일 경로
    /// * `format` - 설정 파일 형식 (Auto면 확장자로 감지)
    ///
    /// # Returns
    /// * `ConfigResult<T>` - 설정 객체 또는 오류
    pub fn load_from_file<T>(path: &Path, format: ConfigFormat) -> ConfigResult<T>
    where
        T: DeserializeOwned + ConfigValidation,
    {
        debug!("설정 파일 로드 시작: {}", path.display());

        let format = match format {
            ConfigFormat::Auto => Self::detect_format(path).inspect_err(|_| {
                error!("설정 파일 형식 감지 실패: {}", path.display());
            })?,
            format => format,
        };

        let content = std::fs::read_to_string(path).map_err(|e| {
            error!("설정 파일 읽기 실패: {} - {}", path.display(), e);
            ConfigError::FileError(format!("파일 읽기 실패: {}", e))
        })?;

        let config = Self::load_from_string(&content, format).inspect_err(|e| {
            error!("설정 파일 로드 실패: {} - {}", path.display(), e);
        })?;

        info!("설정 파일 로드 완료: {}", path.display());
        Ok(config)
    }

    /// 문자열에서 설정 로드
    ///
    /// # Arguments
    /// * `content` - 설정 문자열
    /// * `format` - 설정 형식
    ///
    /// # Returns
    /// * `ConfigResult<T>` - 설정 객체 또는 오류
    pub fn load_from_string<T>(content: &str, format: ConfigFormat) -> ConfigResult<T>
    where
        T: DeserializeOwned + ConfigValidation,
    {
        let config: T = match format {
            ConfigFormat::Json => Self::parse_json(content)?,
            ConfigFormat::Toml => Self::parse_toml(content)?,
            ConfigFormat::Auto => match Self::parse_json::<T>(content) {
                Ok(config) => config,
                Err(_) => Self::parse_toml(content)?,
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// 설정 파일 저장
    ///
    /// # Arguments
    /// * `config` - 설정 객체
    /// * `path` - 저장할 파일 경로
    /// * `format` - 설정 파일 형식 (Auto면 확장자, 확장자가 없으면 TOML)
    ///
    /// # Returns
    /// * `ConfigResult<()>` - 성공 또는 오류
    pub fn save_to_file<T>(config: &T, path: &Path, format: ConfigFormat) -> ConfigResult<()>
    where
        T: Serialize + ConfigValidation,
    {
        debug!("설정 파일 저장 시작: {}", path.display());
        config.validate()?;

        let format = match format {
            ConfigFormat::Auto => Self::detect_format(path).unwrap_or_else(|_| {
                debug!("확장자 없음, 기본 TOML 형식 선택됨");
                ConfigFormat::Toml
            }),
            format => format,
        };

        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| {
                error!("JSON 직렬화 실패: {}", e);
                ConfigError::ParseError(format!("JSON 직렬화 실패: {}", e))
            })?,
            ConfigFormat::Toml | ConfigFormat::Auto => {
                toml::to_string_pretty(config).map_err(|e| {
                    error!("TOML 직렬화 실패: {}", e);
                    ConfigError::ParseError(format!("TOML 직렬화 실패: {}", e))
                })?
            }
        };

        std::fs::write(path, &content).map_err(|e| {
            error!("설정 파일 쓰기 실패: {} - {}", path.display(), e);
            ConfigError::FileError(format!("파일 쓰기 실패: {}", e))
        })?;

        info!("설정 파일 저장 완료: {}", path.display());
        Ok(())
    }

    fn parse_json<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
        serde_json::from_str(content).map_err(|e| {
            warn!("JSON 파싱 실패: {}", e);
            ConfigError::ParseError(format!("JSON 파싱 실패: {}", e))
        })
    }

    fn parse_toml<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
        toml::from_str(content).map_err(|e| {
            warn!("TOML 파싱 실패: {}", e);
            ConfigError::ParseError(format!("TOML 파싱 실패: {}", e))
        })
    }

    /// 파일 확장자로 형식 감지
    fn detect_format(path: &Path) -> ConfigResult<ConfigFormat> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                debug!("JSON 파일 형식 감지됨: {}", path.display());
                Ok(ConfigFormat::Json)
            }
            Some("toml") => {
                debug!("TOML 파일 형식 감지됨: {}", path.display());
                Ok(ConfigFormat::Toml)
            }
            _ => {
                warn!("지원되지 않는 파일 형식: {}", path.display());
                Err(ConfigError::FileError(format!(
                    "파일 형식을 감지할 수 없음: {}",
                    path.display()
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::ichimoku::{HistoryRetention, IchimokuConfig};
    use tempfile::TempDir;

    #[test]
    fn test_load_from_json_string() {
        let json = r#"{"tenkan_period":7,"displacement":22}"#;
        let config =
            ConfigLoader::load_from_string::<IchimokuConfig>(json, ConfigFormat::Json).unwrap();
        assert_eq!(config.tenkan_period, Some(7));
        assert_eq!(config.kijun_period, None);
        assert_eq!(config.displacement, Some(22));
        assert_eq!(config.params().kijun_period, 26);
    }

    #[test]
    fn test_load_from_toml_string() {
        let toml_str = r#"
            kijun_period = 30
            senkou_b_period = 60
            retention = "displacement"
        "#;
        let config =
            ConfigLoader::load_from_string::<IchimokuConfig>(toml_str, ConfigFormat::Toml)
                .unwrap();
        assert_eq!(config.kijun_period, Some(30));
        assert_eq!(config.senkou_b_period, Some(60));
        assert_eq!(config.retention, Some(HistoryRetention::Displacement));
    }

    #[test]
    fn test_auto_format_string_falls_back_to_toml() {
        let config = ConfigLoader::load_from_string::<IchimokuConfig>(
            "tenkan_period = 5",
            ConfigFormat::Auto,
        )
        .unwrap();
        assert_eq!(config.tenkan_period, Some(5));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config =
            ConfigLoader::load_from_string::<IchimokuConfig>("{}", ConfigFormat::Json).unwrap();
        assert_eq!(config, IchimokuConfig::default());
    }

    #[test]
    fn test_parse_error() {
        let result =
            ConfigLoader::load_from_string::<IchimokuConfig>("tenkan_period = ", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));

        let result = ConfigLoader::load_from_string::<IchimokuConfig>(
            r#"{"tenkan_period": -1}"#,
            ConfigFormat::Json,
        );
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_error() {
        let json = r#"{"senkou_b_period":0}"#;
        let result = ConfigLoader::load_from_string::<IchimokuConfig>(json, ConfigFormat::Json);
        match result {
            Err(ConfigError::ValidationError(_)) => (),
            _ => panic!("유효성 검사 오류가 발생해야 함"),
        }
    }

    #[test]
    fn test_save_and_load_file() {
        let config = IchimokuConfig {
            tenkan_period: Some(10),
            displacement: Some(0),
            retention: Some(HistoryRetention::Displacement),
            ..Default::default()
        };
        let dir = TempDir::new().unwrap();

        let json_path = dir.path().join("ichimoku.json");
        ConfigLoader::save_to_file(&config, &json_path, ConfigFormat::Auto).unwrap();
        let loaded_json =
            ConfigLoader::load_from_file::<IchimokuConfig>(&json_path, ConfigFormat::Auto)
                .unwrap();
        assert_eq!(loaded_json, config);

        let toml_path = dir.path().join("ichimoku.toml");
        ConfigLoader::save_to_file(&config, &toml_path, ConfigFormat::Toml).unwrap();
        let loaded_toml =
            ConfigLoader::load_from_file::<IchimokuConfig>(&toml_path, ConfigFormat::Auto)
                .unwrap();
        assert_eq!(loaded_toml, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.toml");
        let result = ConfigLoader::load_from_file::<IchimokuConfig>(&path, ConfigFormat::Auto);
        assert!(matches!(result, Err(ConfigError::FileError(_))));
    }

    #[test]
    fn test_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ichimoku.yaml");
        std::fs::write(&path, "tenkan_period = 5").unwrap();
        let result = ConfigLoader::load_from_file::<IchimokuConfig>(&path, ConfigFormat::Auto);
        assert!(matches!(result, Err(ConfigError::FileError(_))));

        // 형식을 직접 지정하면 확장자와 무관하게 읽음
        let config =
            ConfigLoader::load_from_file::<IchimokuConfig>(&path, ConfigFormat::Toml).unwrap();
        assert_eq!(config.tenkan_period, Some(5));
    }
}
