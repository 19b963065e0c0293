//! 설정 모듈
//!
//! 기본값 → JSON 설정 파일 → 환경변수 순으로 적용합니다.
//! 설정 파일 위치: `$CUSTOMS_RAG_CONFIG` 또는 ~/.customs-rag/config.json

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 설정 파일 경로 환경변수
pub const CONFIG_PATH_ENV: &str = "CUSTOMS_RAG_CONFIG";

// ============================================================================
// Data Directory
// ============================================================================

/// 데이터 디렉토리 경로 (~/.customs-rag/)
pub fn get_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".customs-rag")
}

/// 설정 파일 경로
pub fn config_path() -> PathBuf {
    match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => get_data_dir().join("config.json"),
    }
}

// ============================================================================
// Types
// ============================================================================

/// 전체 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub router: RouterConfig,
    pub boost: BoostConfig,
    pub chroma: ChromaConfig,
    pub embedding: EmbeddingConfig,
}

/// 라우터 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// 정규화 전 쿼리 최대 길이 (문자 수)
    pub max_query_chars: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_query_chars: 1000,
        }
    }
}

/// 부스팅 가중치
///
/// 운영 중 튜닝 대상이며 기본값에 특별한 근거는 없습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    /// 우선 데이터 소스 일치 시 배율
    pub priority_source_multiplier: f32,
    /// 쿼리 품목명과 `product_name` 정확 일치 시 배율
    pub exact_product_multiplier: f32,
    /// 부스트 키워드가 본문에 포함될 때 배율
    pub keyword_multiplier: f32,
    /// 에이전트 선호 `data_type`이 아닐 때 배율
    pub off_type_penalty: f32,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            priority_source_multiplier: 1.5,
            exact_product_multiplier: 1.3,
            keyword_multiplier: 1.1,
            off_type_penalty: 0.9,
        }
    }
}

/// ChromaDB 접속 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromaConfig {
    pub base_url: String,
    pub collection: String,
    pub top_k: usize,
    pub timeout_secs: u64,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            collection: "customs_documents".to_string(),
            top_k: 8,
            timeout_secs: 30,
        }
    }
}

/// 임베딩 API 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl CoreConfig {
    /// 기본 위치에서 설정 로드 (파일이 없으면 기본값)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path())
    }

    /// 지정된 파일에서 설정 로드 후 환경변수 적용
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            let parsed: CoreConfig =
                serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            tracing::debug!("Loaded config from {:?}", path);
            parsed
        } else {
            tracing::debug!("Config file not found, using defaults: {:?}", path);
            CoreConfig::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// 환경변수 오버라이드
    ///
    /// - `CHROMA_URL` → chroma.base_url
    /// - `CHROMA_COLLECTION` → chroma.collection
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("CHROMA_URL") {
            if !url.is_empty() {
                self.chroma.base_url = url;
            }
        }
        if let Ok(collection) = std::env::var("CHROMA_COLLECTION") {
            if !collection.is_empty() {
                self.chroma.collection = collection;
            }
        }
    }

    /// 값 검증
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.router.max_query_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "router.max_query_chars",
                reason: "must be greater than 0".to_string(),
            });
        }

        let multipliers = [
            ("boost.priority_source_multiplier", self.boost.priority_source_multiplier),
            ("boost.exact_product_multiplier", self.boost.exact_product_multiplier),
            ("boost.keyword_multiplier", self.boost.keyword_multiplier),
            ("boost.off_type_penalty", self.boost.off_type_penalty),
        ];
        for (field, value) in multipliers {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a finite non-negative number, got {}", value),
                });
            }
        }

        if self.chroma.top_k == 0 {
            return Err(ConfigError::Invalid {
                field: "chroma.top_k",
                reason: "must be greater than 0".to_string(),
            });
        }

        url::Url::parse(&self.chroma.base_url).map_err(|e| ConfigError::Invalid {
            field: "chroma.base_url",
            reason: e.to_string(),
        })?;

        if self.embedding.dimension == 0 {
            return Err(ConfigError::Invalid {
                field: "embedding.dimension",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = CoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.router.max_query_chars, 1000);
        assert_eq!(config.chroma.top_k, 8);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoreConfig::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.boost, BoostConfig::default());
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"boost": {{"priority_source_multiplier": 2.0}}}}"#).unwrap();

        let config = CoreConfig::load_from(file.path()).unwrap();
        assert_eq!(config.boost.priority_source_multiplier, 2.0);
        assert_eq!(config.boost.exact_product_multiplier, 1.3);
        assert_eq!(config.embedding.model, "text-embedding-3-small");
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = CoreConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_negative_multiplier_rejected() {
        let mut config = CoreConfig::default();
        config.boost.keyword_multiplier = -1.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("boost.keyword_multiplier"));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let mut config = CoreConfig::default();
        config.chroma.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_url_rejected() {
        let mut config = CoreConfig::default();
        config.chroma.base_url = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "chroma.base_url",
                ..
            }
        ));
    }

    #[test]
    fn test_data_dir_name() {
        assert!(get_data_dir().ends_with(".customs-rag"));
    }
}
