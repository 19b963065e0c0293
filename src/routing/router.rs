//! QueryRouter / AsyncQueryRouter
//!
//! 원문 쿼리 → 정규화 → 점수 계산 → 라우팅 결정.
//! 테이블은 생성 후 읽기 전용이므로 하나의 인스턴스를 여러 태스크가 잠금 없이 공유합니다.

use std::sync::Arc;

use futures::future::join_all;

use crate::config::RouterConfig;
use crate::error::RoutingError;

use super::decision::{decide, RoutingDecision};
use super::keywords::DomainTables;
use super::normalizer::{normalize_query, truncate_chars};
use super::scorer::{detect_products, ScoreSet};

// ============================================================================
// QueryRouter
// ============================================================================

/// 동기 쿼리 라우터
#[derive(Debug, Clone)]
pub struct QueryRouter {
    tables: DomainTables,
    config: RouterConfig,
}

impl Default for QueryRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryRouter {
    /// 내장 테이블 + 기본 설정
    pub fn new() -> Self {
        Self::with_tables(DomainTables::builtin(), RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> Self {
        Self::with_tables(DomainTables::builtin(), config)
    }

    pub fn with_tables(tables: DomainTables, config: RouterConfig) -> Self {
        Self { tables, config }
    }

    pub fn tables(&self) -> &DomainTables {
        &self.tables
    }

    /// 길이 제한 후 정규화
    pub fn normalize(&self, query: &str) -> String {
        normalize_query(truncate_chars(query, self.config.max_query_chars))
    }

    /// 정규화된 쿼리의 점수
    pub fn scores(&self, normalized: &str) -> ScoreSet {
        ScoreSet::compute(&self.tables, normalized)
    }

    /// 라우팅 (에러 반환)
    pub fn try_route(&self, query: &str) -> Result<RoutingDecision, RoutingError> {
        let normalized = self.normalize(query);
        let scores = self.scores(&normalized);

        for (scorer, value) in scores.named() {
            if !value.is_finite() {
                return Err(RoutingError::NonFiniteScore { scorer, value });
            }
        }

        tracing::debug!(
            "Scores for {:?}: law={:.2} animal_plant={:.2} regulation={:.2} consultation={:.2}",
            normalized,
            scores.law,
            scores.animal_plant,
            scores.regulation,
            scores.consultation
        );

        let decision = decide(&scores, || detect_products(&self.tables, &normalized));

        tracing::info!(
            "Routed query -> {} (confidence={:.2}, reason={})",
            decision.classification(),
            decision.confidence(),
            decision.reason()
        );

        Ok(decision)
    }

    /// 라우팅 (항상 결정 반환)
    ///
    /// 내부 실패는 `error_fallback` 결정으로 변환됩니다.
    pub fn route(&self, query: &str) -> RoutingDecision {
        self.try_route(query).unwrap_or_else(|e| {
            tracing::warn!("Routing failed, using fallback: {}", e);
            RoutingDecision::error_fallback()
        })
    }
}

// ============================================================================
// AsyncQueryRouter
// ============================================================================

/// 비동기 쿼리 라우터
///
/// 분류를 블로킹 워커로 넘겨 이벤트 루프를 막지 않습니다.
/// 결과는 동기 라우터와 동일합니다.
#[derive(Debug, Clone)]
pub struct AsyncQueryRouter {
    inner: Arc<QueryRouter>,
}

impl Default for AsyncQueryRouter {
    fn default() -> Self {
        Self::new(QueryRouter::new())
    }
}

impl AsyncQueryRouter {
    pub fn new(router: QueryRouter) -> Self {
        Self {
            inner: Arc::new(router),
        }
    }

    pub fn from_shared(router: Arc<QueryRouter>) -> Self {
        Self { inner: router }
    }

    /// 내부 동기 라우터
    pub fn router(&self) -> &QueryRouter {
        &self.inner
    }

    pub async fn try_route(&self, query: &str) -> Result<RoutingDecision, RoutingError> {
        let router = Arc::clone(&self.inner);
        let query = query.to_string();

        tokio::task::spawn_blocking(move || router.try_route(&query))
            .await
            .map_err(|e| RoutingError::Worker(e.to_string()))?
    }

    pub async fn route(&self, query: &str) -> RoutingDecision {
        match self.try_route(query).await {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!("Async routing failed, using fallback: {}", e);
                RoutingDecision::error_fallback()
            }
        }
    }

    /// 여러 쿼리를 동시에 라우팅 (입력 순서 유지)
    pub async fn route_many<S: AsRef<str>>(&self, queries: &[S]) -> Vec<RoutingDecision> {
        join_all(queries.iter().map(|q| self.route(q.as_ref()))).await
    }
}

// ============================================================================
// Tests
// ============================================================================
