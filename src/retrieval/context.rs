//! 검색 컨텍스트
//!
//! 라우팅 결정과 에이전트 종류로부터 부스트 키워드, 우선 데이터 소스,
//! 기본 메타데이터 필터를 구성합니다.

use serde::Serialize;
use serde_json::Value;

use crate::routing::{AgentKind, DomainTables, RoutingDecision, RoutingReason};

use super::filter::{build_filter, WhereCondition};

/// 관세법 조문
pub const DATA_TYPE_CUSTOMS_LAW: &str = "customs_law";
/// 무역 규제 (수출입 제한, 동식물 허용/금지 지역 등)
pub const DATA_TYPE_TRADE_REGULATION: &str = "trade_regulation";
/// 민원 상담 사례
pub const DATA_TYPE_CONSULTATION_CASE: &str = "consultation_case";

pub const SOURCE_CUSTOMS_LAW: &str = "관세법";
pub const SOURCE_ANIMAL_PLANT: &str = "동식물허용금지지역";
pub const SOURCE_IMPORT_REGULATION: &str = "수입규제";
pub const SOURCE_EXPORT_REGULATION: &str = "수출제한";
pub const SOURCE_CONSULTATION: &str = "민원상담사례";

/// 에이전트 하나의 검색 조건
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchContext {
    pub agent: AgentKind,
    /// 정규화된 쿼리
    pub query: String,
    /// 본문에 포함되면 부스트하는 키워드
    pub boost_keywords: Vec<String>,
    /// 우선 데이터 소스
    pub priority_sources: Vec<String>,
    /// 에이전트가 선호하는 data_type (그 외는 감점)
    pub preferred_types: Vec<String>,
    /// 기본 평면 필터 (호출자 필터가 필드 단위로 덮어씀)
    pub default_filter: Vec<(String, Value)>,
}

impl SearchContext {
    /// 결정 + 에이전트 → 컨텍스트
    pub fn for_decision(
        agent: AgentKind,
        decision: &RoutingDecision,
        normalized_query: &str,
        tables: &DomainTables,
    ) -> Self {
        match agent {
            AgentKind::Regulation => Self::regulation(decision, normalized_query, tables),
            AgentKind::Consultation => Self::consultation(normalized_query, tables),
        }
    }

    fn regulation(decision: &RoutingDecision, query: &str, tables: &DomainTables) -> Self {
        let mut boost_keywords: Vec<String> = tables
            .law_keywords
            .matches(query)
            .chain(tables.regulation_keywords.matches(query))
            .map(str::to_string)
            .collect();

        let (priority_sources, preferred_types, default_filter) = match decision.reason() {
            RoutingReason::CustomsLawQuery => (
                vec![SOURCE_CUSTOMS_LAW],
                vec![DATA_TYPE_CUSTOMS_LAW, DATA_TYPE_TRADE_REGULATION],
                vec![("data_type", DATA_TYPE_CUSTOMS_LAW)],
            ),
            RoutingReason::AnimalPlantImportQuery => {
                boost_keywords.extend(tables.products.all_matches(query));
                (
                    vec![SOURCE_ANIMAL_PLANT],
                    vec![DATA_TYPE_TRADE_REGULATION],
                    vec![
                        ("data_type", DATA_TYPE_TRADE_REGULATION),
                        ("data_source", SOURCE_ANIMAL_PLANT),
                    ],
                )
            }
            _ => (
                vec![
                    SOURCE_IMPORT_REGULATION,
                    SOURCE_EXPORT_REGULATION,
                    SOURCE_ANIMAL_PLANT,
                ],
                vec![DATA_TYPE_TRADE_REGULATION, DATA_TYPE_CUSTOMS_LAW],
                vec![("data_type", DATA_TYPE_TRADE_REGULATION)],
            ),
        };

        Self {
            agent: AgentKind::Regulation,
            query: query.to_string(),
            boost_keywords,
            priority_sources: to_strings(&priority_sources),
            preferred_types: to_strings(&preferred_types),
            default_filter: to_filter(&default_filter),
        }
    }

    fn consultation(query: &str, tables: &DomainTables) -> Self {
        Self {
            agent: AgentKind::Consultation,
            query: query.to_string(),
            boost_keywords: tables
                .consultation_keywords
                .matches(query)
                .map(str::to_string)
                .collect(),
            priority_sources: to_strings(&[SOURCE_CONSULTATION]),
            preferred_types: to_strings(&[DATA_TYPE_CONSULTATION_CASE]),
            default_filter: to_filter(&[("data_type", DATA_TYPE_CONSULTATION_CASE)]),
        }
    }

    /// 기본 필터 + 호출자 필터 → where 조건
    ///
    /// 같은 필드는 호출자 값이 이기고, 기본 필터에 없는 필드는 뒤에 붙습니다.
    pub fn filter(&self, caller: &[(String, Value)]) -> Option<WhereCondition> {
        let mut merged: Vec<(String, Value)> = self
            .default_filter
            .iter()
            .map(|(field, default)| {
                let value = caller
                    .iter()
                    .find(|(k, _)| k == field)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_else(|| default.clone());
                (field.clone(), value)
            })
            .collect();

        for (field, value) in caller {
            if !merged.iter().any(|(k, _)| k == field) {
                merged.push((field.clone(), value.clone()));
            }
        }

        build_filter(merged)
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn to_filter(items: &[(&str, &str)]) -> Vec<(String, Value)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::QueryRouter;
    use serde_json::json;

    fn context_for(query: &str, agent: AgentKind) -> SearchContext {
        let router = QueryRouter::new();
        let decision = router.route(query);
        let normalized = router.normalize(query);
        SearchContext::for_decision(agent, &decision, &normalized, router.tables())
    }

    #[test]
    fn test_animal_plant_context() {
        let ctx = context_for("딸기는 어느 나라에서 수입해야해?", AgentKind::Regulation);
        assert_eq!(ctx.priority_sources, vec![SOURCE_ANIMAL_PLANT]);
        assert!(ctx.boost_keywords.contains(&"딸기".to_string()));
        assert_eq!(
            ctx.filter(&[]).map(|f| f.to_json()),
            Some(json!({"$and": [
                {"data_type": {"$eq": "trade_regulation"}},
                {"data_source": {"$eq": "동식물허용금지지역"}}
            ]}))
        );
    }

    #[test]
    fn test_law_context() {
        let ctx = context_for("관세법 제1조는 무엇인가요?", AgentKind::Regulation);
        assert_eq!(ctx.priority_sources, vec![SOURCE_CUSTOMS_LAW]);
        assert!(ctx.boost_keywords.contains(&"관세법".to_string()));
        assert_eq!(
            ctx.filter(&[]).map(|f| f.to_json()),
            Some(json!({"data_type": {"$eq": "customs_law"}}))
        );
    }

    #[test]
    fn test_consultation_context() {
        let ctx = context_for("통관 절차는 어떻게 되나요?", AgentKind::Consultation);
        assert_eq!(ctx.agent, AgentKind::Consultation);
        assert_eq!(ctx.preferred_types, vec![DATA_TYPE_CONSULTATION_CASE]);
        assert!(ctx.boost_keywords.contains(&"통관".to_string()));
        assert!(ctx.boost_keywords.contains(&"절차".to_string()));
    }

    #[test]
    fn test_caller_filter_overrides_and_appends() {
        let ctx = context_for("통관 절차는 어떻게 되나요?", AgentKind::Consultation);
        let caller = vec![
            ("country".to_string(), json!("CN")),
            ("data_type".to_string(), json!("trade_regulation")),
            ("bogus".to_string(), json!("x")),
        ];
        assert_eq!(
            ctx.filter(&caller).map(|f| f.to_json()),
            Some(json!({"$and": [
                {"data_type": {"$eq": "trade_regulation"}},
                {"country": {"$eq": "CN"}}
            ]}))
        );
    }
}
