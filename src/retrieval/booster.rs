//! 결과 부스팅 / 병합
//!
//! 벡터 유사도에 도메인 규칙 배율을 곱해 재정렬합니다.
//!
//! - 우선 데이터 소스 일치: `priority_source_multiplier`
//! - 쿼리에 문서의 `product_name`이 그대로 포함: `exact_product_multiplier`
//! - 부스트 키워드가 본문에 포함: `keyword_multiplier`
//! - 에이전트 선호 `data_type`이 아님: `off_type_penalty`
//!
//! 점수는 항상 원래 `similarity`에서 다시 계산하므로 여러 번 적용해도 결과가 같습니다.
//! 후보는 절대 버리지 않습니다.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::config::BoostConfig;

use super::context::SearchContext;
use super::vector::CandidateDocument;

/// data_type / data_source가 없는 문서의 집계 키
const UNKNOWN_KEY: &str = "unknown";

/// 부스팅 결과 + 진단용 집계
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedResults {
    /// 부스트 점수 내림차순 문서
    pub documents: Vec<CandidateDocument>,
    pub by_data_type: BTreeMap<String, usize>,
    pub by_data_source: BTreeMap<String, usize>,
    pub boosted_count: usize,
}

impl MergedResults {
    fn from_documents(documents: Vec<CandidateDocument>) -> Self {
        let mut by_data_type = BTreeMap::new();
        let mut by_data_source = BTreeMap::new();

        for doc in &documents {
            *by_data_type
                .entry(doc.data_type().unwrap_or(UNKNOWN_KEY).to_string())
                .or_insert(0) += 1;
            *by_data_source
                .entry(doc.data_source().unwrap_or(UNKNOWN_KEY).to_string())
                .or_insert(0) += 1;
        }

        let boosted_count = documents.iter().filter(|d| d.boosted).count();

        Self {
            documents,
            by_data_type,
            by_data_source,
            boosted_count,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// 부스터
#[derive(Debug, Clone, Default)]
pub struct Booster {
    config: BoostConfig,
}

impl Booster {
    pub fn new(config: BoostConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BoostConfig {
        &self.config
    }

    /// 후보 재정렬 + 부스트 표시
    pub fn boost_and_merge(
        &self,
        candidates: Vec<CandidateDocument>,
        context: &SearchContext,
    ) -> MergedResults {
        let mut documents: Vec<CandidateDocument> = candidates
            .into_iter()
            .map(|mut doc| {
                let (score, boosted) = self.effective_score(&doc, context);
                doc.score = score;
                doc.boosted = boosted;
                doc
            })
            .collect();

        sort_by_score(&mut documents);

        let merged = MergedResults::from_documents(documents);
        tracing::debug!(
            "Boosted {}/{} candidates for {} agent",
            merged.boosted_count,
            merged.len(),
            context.agent.as_str()
        );
        merged
    }

    /// (부스트 점수, 부스트 여부)
    fn effective_score(&self, doc: &CandidateDocument, context: &SearchContext) -> (f32, bool) {
        let mut score = doc.similarity;
        let mut boosted = false;

        if doc
            .data_source()
            .is_some_and(|source| context.priority_sources.iter().any(|p| p == source))
        {
            score *= self.config.priority_source_multiplier;
            boosted = true;
        }

        if let Some(product) = doc.product_name() {
            let product = product.trim().to_lowercase();
            if !product.is_empty() && context.query.contains(&product) {
                score *= self.config.exact_product_multiplier;
                boosted = true;
            }
        }

        if !context.boost_keywords.is_empty() {
            let content = doc.content.to_lowercase();
            if context
                .boost_keywords
                .iter()
                .any(|k| content.contains(k.as_str()))
            {
                score *= self.config.keyword_multiplier;
                boosted = true;
            }
        }

        if !context.preferred_types.is_empty() {
            let preferred = doc
                .data_type()
                .is_some_and(|t| context.preferred_types.iter().any(|p| p == t));
            if !preferred {
                score *= self.config.off_type_penalty;
            }
        }

        (score, boosted)
    }

    /// 에이전트별 결과 병합 (MIXED)
    ///
    /// 같은 문서 ID는 점수가 높은 쪽 하나만 남깁니다.
    pub fn merge(results: Vec<MergedResults>) -> MergedResults {
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut documents: Vec<CandidateDocument> = Vec::new();

        for doc in results.into_iter().flat_map(|r| r.documents) {
            match by_id.get(&doc.id) {
                Some(&idx) => {
                    if doc.score > documents[idx].score {
                        documents[idx] = doc;
                    }
                }
                None => {
                    by_id.insert(doc.id.clone(), documents.len());
                    documents.push(doc);
                }
            }
        }

        sort_by_score(&mut documents);
        MergedResults::from_documents(documents)
    }
}

/// 점수 내림차순 (stable)
fn sort_by_score(documents: &mut [CandidateDocument]) {
    documents.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::AgentKind;
    use serde_json::{json, Map, Value};

    fn doc(id: &str, content: &str, meta: Value, similarity: f32) -> CandidateDocument {
        let meta: Map<String, Value> = meta.as_object().cloned().unwrap_or_default();
        CandidateDocument::new(id, content, meta, similarity)
    }

    fn context() -> SearchContext {
        SearchContext {
            agent: AgentKind::Regulation,
            query: "딸기는 어느 나라에서 수입해야해".to_string(),
            boost_keywords: vec![],
            priority_sources: vec!["동식물허용금지지역".to_string()],
            preferred_types: vec![],
            default_filter: vec![],
        }
    }

    fn ids(results: &MergedResults) -> Vec<&str> {
        results.documents.iter().map(|d| d.id.as_str()).collect()
    }

    #[test]
    fn test_priority_source_reorders() {
        let booster = Booster::default();
        let candidates = vec![
            doc("plain", "일반 문서", json!({"data_source": "기타"}), 0.8),
            doc("priority", "우선 문서", json!({"data_source": "동식물허용금지지역"}), 0.6),
        ];
        let out = booster.boost_and_merge(candidates, &context());

        assert_eq!(ids(&out), vec!["priority", "plain"]);
        assert!(out.documents[0].boosted);
        assert!(!out.documents[1].boosted);
        assert!((out.documents[0].score - 0.9).abs() < 1e-5);
        assert_eq!(out.documents[0].similarity, 0.6);
    }

    #[test]
    fn test_exact_product_boost() {
        let booster = Booster::default();
        let candidates = vec![
            doc("apple", "사과", json!({"product_name": "사과"}), 0.7),
            doc("berry", "딸기", json!({"product_name": "딸기"}), 0.6),
        ];
        let out = booster.boost_and_merge(candidates, &context());

        assert_eq!(ids(&out), vec!["berry", "apple"]);
        assert!(out.documents[0].boosted);
        assert!((out.documents[0].score - 0.6 * 1.3).abs() < 1e-5);
    }

    #[test]
    fn test_keyword_boost_and_type_penalty() {
        let booster = Booster::default();
        let mut ctx = context();
        ctx.priority_sources.clear();
        ctx.boost_keywords = vec!["검역".to_string()];
        ctx.preferred_types = vec!["trade_regulation".to_string()];

        let candidates = vec![
            doc("case", "상담 사례", json!({"data_type": "consultation_case"}), 0.7),
            doc("reg", "검역 요건", json!({"data_type": "trade_regulation"}), 0.62),
        ];
        let out = booster.boost_and_merge(candidates, &ctx);

        assert_eq!(ids(&out), vec!["reg", "case"]);
        // 감점은 부스트로 표시하지 않음
        assert!(!out.documents[1].boosted);
        assert!((out.documents[1].score - 0.63).abs() < 1e-5);
    }

    #[test]
    fn test_never_drops_candidates_and_counts() {
        let booster = Booster::default();
        let candidates = vec![
            doc(
                "a",
                "",
                json!({"data_type": "trade_regulation", "data_source": "동식물허용금지지역"}),
                0.1,
            ),
            doc("b", "", json!({"data_type": "consultation_case"}), 0.2),
            doc("c", "", json!({}), 0.0),
        ];
        let out = booster.boost_and_merge(candidates, &context());

        assert_eq!(out.len(), 3);
        assert_eq!(out.by_data_type["trade_regulation"], 1);
        assert_eq!(out.by_data_type["consultation_case"], 1);
        assert_eq!(out.by_data_type["unknown"], 1);
        assert_eq!(out.by_data_source["동식물허용금지지역"], 1);
        assert_eq!(out.boosted_count, 1);
    }

    #[test]
    fn test_empty_input() {
        let out = Booster::default().boost_and_merge(vec![], &context());
        assert!(out.is_empty());
        assert!(out.by_data_type.is_empty());
    }

    #[test]
    fn test_boosting_is_idempotent() {
        let booster = Booster::default();
        let candidates = vec![
            doc(
                "a",
                "딸기 검역",
                json!({"data_source": "동식물허용금지지역", "product_name": "딸기"}),
                0.3,
            ),
            doc("b", "", json!({"data_source": "기타"}), 0.5),
            doc("c", "", json!({"data_source": "동식물허용금지지역"}), 0.35),
            doc("d", "", json!({}), 0.5),
        ];

        let once = booster.boost_and_merge(candidates, &context());
        let twice = booster.boost_and_merge(once.documents.clone(), &context());

        assert_eq!(ids(&once), ids(&twice));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_merge_dedupes_by_id() {
        let booster = Booster::default();
        let mut regulation_ctx = context();
        regulation_ctx.priority_sources = vec!["관세법".to_string()];
        let mut consultation_ctx = context();
        consultation_ctx.agent = AgentKind::Consultation;
        consultation_ctx.priority_sources = vec!["민원상담사례".to_string()];

        let shared = json!({"data_source": "관세법"});
        let regulation = booster.boost_and_merge(
            vec![doc("law-1", "", shared.clone(), 0.5), doc("reg-1", "", json!({}), 0.6)],
            &regulation_ctx,
        );
        let consultation = booster.boost_and_merge(
            vec![
                doc("law-1", "", shared, 0.5),
                doc("case-1", "", json!({"data_source": "민원상담사례"}), 0.3),
            ],
            &consultation_ctx,
        );

        let merged = Booster::merge(vec![regulation, consultation]);
        assert_eq!(ids(&merged), vec!["law-1", "reg-1", "case-1"]);
        assert!(merged.documents[0].boosted);
        assert_eq!(merged.by_data_source["관세법"], 1);
    }
}
