//! 듀얼 에이전트 검색기
//!
//! 쿼리 라우팅 → 에이전트별 필터 → 임베딩 → 벡터 검색 → 부스팅/병합.
//! MIXED 질의는 규제/상담 에이전트가 모두 검색하고 한 목록으로 합칩니다.

use anyhow::{Context, Result};
use futures::future::try_join_all;
use serde::Serialize;
use serde_json::Value;

use crate::embedding::EmbeddingProvider;
use crate::routing::{AsyncQueryRouter, RoutingDecision};

use super::booster::{Booster, MergedResults};
use super::context::SearchContext;
use super::vector::VectorSearch;

/// 검색 결과 + 라우팅 정보
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalOutcome {
    pub decision: RoutingDecision,
    pub contexts: Vec<SearchContext>,
    pub results: MergedResults,
}

/// 듀얼 에이전트 검색기
pub struct DualAgentRetriever<S, E> {
    router: AsyncQueryRouter,
    search: S,
    embedder: E,
    booster: Booster,
    top_k: usize,
}

impl<S, E> DualAgentRetriever<S, E>
where
    S: VectorSearch,
    E: EmbeddingProvider,
{
    pub fn new(
        router: AsyncQueryRouter,
        search: S,
        embedder: E,
        booster: Booster,
        top_k: usize,
    ) -> Self {
        Self {
            router,
            search,
            embedder,
            booster,
            top_k,
        }
    }

    pub fn router(&self) -> &AsyncQueryRouter {
        &self.router
    }

    /// 검색
    ///
    /// # Arguments
    /// * `query` - 사용자 질의 원문
    /// * `caller_filter` - 호출자 평면 필터 (에이전트 기본 필터를 필드 단위로 덮어씀)
    pub async fn retrieve(
        &self,
        query: &str,
        caller_filter: &[(String, Value)],
    ) -> Result<RetrievalOutcome> {
        let decision = self.router.route(query).await;
        let router = self.router.router();
        let normalized = router.normalize(query);

        let contexts: Vec<SearchContext> = decision
            .agents()
            .iter()
            .map(|&agent| SearchContext::for_decision(agent, &decision, &normalized, router.tables()))
            .collect();

        let embedding = self
            .embedder
            .embed(query)
            .await
            .context("Failed to embed query")?;

        let searches = contexts.iter().map(|ctx| {
            let filter = ctx.filter(caller_filter);
            let embedding = &embedding;
            async move {
                let candidates = self
                    .search
                    .search(embedding, self.top_k, filter.as_ref())
                    .await
                    .with_context(|| format!("{} agent search failed", ctx.agent.as_str()))?;
                Ok::<MergedResults, anyhow::Error>(self.booster.boost_and_merge(candidates, ctx))
            }
        });
        let per_agent = try_join_all(searches).await?;

        let results = if per_agent.len() == 1 {
            per_agent.into_iter().next().unwrap_or_default()
        } else {
            Booster::merge(per_agent)
        };

        tracing::info!(
            "Retrieved {} documents for {} query via {} ({} boosted)",
            results.len(),
            decision.classification(),
            self.search.name(),
            results.boosted_count
        );

        Ok(RetrievalOutcome {
            decision,
            contexts,
            results,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Map};

    use crate::retrieval::filter::WhereCondition;
    use crate::retrieval::vector::{CandidateDocument, InMemoryVectorSearch};
    use crate::routing::{QueryType, RoutingReason};

    /// 모든 텍스트를 같은 벡터로 임베딩
    struct FixedEmbedding;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedding {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct FailingSearch;

    #[async_trait]
    impl VectorSearch for FailingSearch {
        async fn search(
            &self,
            _query_embedding: &[f32],
            _top_k: usize,
            _where_filter: Option<&WhereCondition>,
        ) -> Result<Vec<CandidateDocument>> {
            anyhow::bail!("connection refused")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn meta(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    fn corpus() -> InMemoryVectorSearch {
        let store = InMemoryVectorSearch::new();
        let docs = [
            (
                vec![0.9, 0.1],
                "reg-other",
                "바나나 수입 요건",
                json!({"data_type": "trade_regulation", "data_source": "수입규제", "product_name": "바나나"}),
            ),
            (
                vec![0.6, 0.4],
                "reg-berry",
                "딸기 수입 허용 국가 목록",
                json!({"data_type": "trade_regulation", "data_source": "동식물허용금지지역", "product_name": "딸기"}),
            ),
            (
                vec![0.8, 0.2],
                "reg-apple",
                "사과 수입 허용 국가 목록",
                json!({"data_type": "trade_regulation", "data_source": "동식물허용금지지역", "product_name": "사과"}),
            ),
            (
                vec![0.95, 0.05],
                "case-1",
                "통관 절차 상담 사례",
                json!({"data_type": "consultation_case", "data_source": "민원상담사례"}),
            ),
            (
                vec![0.5, 0.5],
                "law-1",
                "관세법 제1조 목적",
                json!({"data_type": "customs_law", "data_source": "관세법"}),
            ),
        ];
        for (embedding, id, content, metadata) in docs {
            store
                .insert(embedding, CandidateDocument::new(id, content, meta(metadata), 0.0))
                .unwrap();
        }
        store
    }

    fn retriever<S: VectorSearch>(search: S) -> DualAgentRetriever<S, FixedEmbedding> {
        DualAgentRetriever::new(
            AsyncQueryRouter::default(),
            search,
            FixedEmbedding,
            Booster::default(),
            10,
        )
    }

    #[tokio::test]
    async fn test_animal_plant_query_filters_and_boosts() {
        let outcome = retriever(corpus())
            .retrieve("딸기는 어느 나라에서 수입해야해?", &[])
            .await
            .unwrap();

        assert_eq!(outcome.decision.reason(), RoutingReason::AnimalPlantImportQuery);
        let ids: Vec<&str> = outcome.results.documents.iter().map(|d| d.id.as_str()).collect();
        // data_source 필터로 동식물 문서만, 정확 품목 일치가 먼저
        assert_eq!(ids, vec!["reg-berry", "reg-apple"]);
        assert!(outcome.results.documents.iter().all(|d| d.boosted));
        assert_eq!(outcome.results.by_data_source["동식물허용금지지역"], 2);
    }

    #[tokio::test]
    async fn test_consultation_query_uses_consultation_agent() {
        let outcome = retriever(corpus())
            .retrieve("통관 절차는 어떻게 되나요?", &[])
            .await
            .unwrap();

        assert_eq!(outcome.decision.classification(), QueryType::Consultation);
        assert_eq!(outcome.contexts.len(), 1);
        let ids: Vec<&str> = outcome.results.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["case-1"]);
    }

    #[tokio::test]
    async fn test_mixed_query_searches_both_agents() {
        let outcome = retriever(corpus())
            .retrieve("검역 요건과 통관 신고 서류", &[])
            .await
            .unwrap();

        assert_eq!(outcome.decision.classification(), QueryType::Mixed);
        assert_eq!(outcome.contexts.len(), 2);
        assert_eq!(outcome.results.by_data_type["trade_regulation"], 3);
        assert_eq!(outcome.results.by_data_type["consultation_case"], 1);
    }

    #[tokio::test]
    async fn test_caller_filter_overrides_default() {
        let caller = vec![("data_source".to_string(), json!("수입규제"))];
        let outcome = retriever(corpus())
            .retrieve("검역 요건이 필요한 품목", &caller)
            .await
            .unwrap();

        assert_eq!(outcome.decision.classification(), QueryType::Regulation);
        let ids: Vec<&str> = outcome.results.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["reg-other"]);
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let err = retriever(FailingSearch)
            .retrieve("통관 절차는 어떻게 되나요?", &[])
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("connection refused"));
    }
}
