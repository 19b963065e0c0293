//! 코어 에러 타입
//!
//! 라우팅/설정 경계에서 사용하는 타입 에러입니다.
//! HTTP 클라이언트와 CLI는 `anyhow::Result`를 그대로 사용합니다.

use std::path::PathBuf;

use thiserror::Error;

/// 라우팅 실패 종류
///
/// `QueryRouter::route`는 이 에러를 밖으로 내보내지 않고
/// `error_fallback` 결정으로 변환합니다.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// 스코어 계산기가 유한하지 않은 값을 반환
    #[error("scorer '{scorer}' produced a non-finite score: {value}")]
    NonFiniteScore { scorer: &'static str, value: f32 },

    /// 블로킹 워커 태스크 실패 (panic / cancel)
    #[error("classification worker failed: {0}")]
    Worker(String),
}

/// 설정 로드/검증 에러
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config value '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_error_display() {
        let err = RoutingError::NonFiniteScore {
            scorer: "law",
            value: f32::NAN,
        };
        assert!(err.to_string().contains("law"));
        assert!(err.to_string().contains("non-finite"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid {
            field: "chroma.top_k",
            reason: "must be greater than 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value 'chroma.top_k': must be greater than 0"
        );
    }
}
