//! 라우팅 결정
//!
//! 네 가지 점수를 우선순위 규칙으로 해석해 분류/신뢰도/사유를 만듭니다.
//!
//! 1. 법령 점수 > 0.7 → REGULATION (`customs_law_query`)
//! 2. 동식물 점수 > 0.8 → REGULATION (`animal_plant_import_query`)
//! 3. 규제 vs 상담 점수 비교 (차이 / 혼합 / 저신뢰 기본값 / 선호)

use std::collections::BTreeMap;
use std::fmt;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use super::scorer::ScoreSet;

/// 법령 오버라이드 임계값
pub const LAW_THRESHOLD: f32 = 0.7;
/// 동식물 오버라이드 임계값
pub const ANIMAL_PLANT_THRESHOLD: f32 = 0.8;
/// 규제/상담 점수 차이가 이보다 크면 높은 쪽을 선택
pub const SCORE_GAP_THRESHOLD: f32 = 0.3;
/// 두 점수가 모두 이보다 크면 MIXED
pub const MIXED_THRESHOLD: f32 = 0.4;
/// 두 점수가 모두 이보다 작으면 기본값
pub const LOW_SCORE_THRESHOLD: f32 = 0.3;
/// 기본값/에러 시 신뢰도
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

// ============================================================================
// Types
// ============================================================================

/// 쿼리 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryType {
    Regulation,
    Consultation,
    Mixed,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Regulation => "REGULATION",
            QueryType::Consultation => "CONSULTATION",
            QueryType::Mixed => "MIXED",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 검색을 수행하는 전문 에이전트
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// 법령 + 무역 규제 문서
    Regulation,
    /// 민원 상담 사례
    Consultation,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Regulation => "regulation",
            AgentKind::Consultation => "consultation",
        }
    }
}

/// 결정 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingReason {
    CustomsLawQuery,
    AnimalPlantImportQuery,
    HighRegulationScore,
    HighConsultationScore,
    MixedQueryType,
    LowConfidenceDefault,
    RegulationPreference,
    ConsultationPreference,
    ErrorFallback,
}

impl RoutingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingReason::CustomsLawQuery => "customs_law_query",
            RoutingReason::AnimalPlantImportQuery => "animal_plant_import_query",
            RoutingReason::HighRegulationScore => "high_regulation_score",
            RoutingReason::HighConsultationScore => "high_consultation_score",
            RoutingReason::MixedQueryType => "mixed_query_type",
            RoutingReason::LowConfidenceDefault => "low_confidence_default",
            RoutingReason::RegulationPreference => "regulation_preference",
            RoutingReason::ConsultationPreference => "consultation_preference",
            RoutingReason::ErrorFallback => "error_fallback",
        }
    }
}

impl fmt::Display for RoutingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 신뢰도 등급
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

/// 라우팅 결정 (생성 후 불변)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    classification: QueryType,
    confidence: f32,
    reason: RoutingReason,
    confidence_level: ConfidenceLevel,
    metadata: BTreeMap<String, Value>,
}

impl RoutingDecision {
    fn new(
        classification: QueryType,
        confidence: f32,
        reason: RoutingReason,
        confidence_level: ConfidenceLevel,
        scores: Option<&ScoreSet>,
    ) -> Self {
        let mut metadata = BTreeMap::new();
        if let Some(scores) = scores {
            for (name, value) in scores.named() {
                metadata.insert(format!("{}_score", name), json!(round4(value)));
            }
        }
        metadata.insert("reason".to_string(), json!(reason.as_str()));
        metadata.insert(
            "confidence_level".to_string(),
            json!(confidence_level.as_str()),
        );
        metadata.insert("routed_at".to_string(), json!(Utc::now().to_rfc3339()));

        Self {
            classification,
            confidence: confidence.clamp(0.0, 1.0),
            reason,
            confidence_level,
            metadata,
        }
    }

    /// 에러 시 고정 기본값: CONSULTATION / 0.5 / `error_fallback`
    pub fn error_fallback() -> Self {
        Self::new(
            QueryType::Consultation,
            DEFAULT_CONFIDENCE,
            RoutingReason::ErrorFallback,
            ConfidenceLevel::Low,
            None,
        )
    }

    fn with_products(mut self, products: Vec<String>) -> Self {
        self.metadata
            .insert("detected_products".to_string(), json!(products));
        self
    }

    pub fn classification(&self) -> QueryType {
        self.classification
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn reason(&self) -> RoutingReason {
        self.reason
    }

    pub fn confidence_level(&self) -> ConfidenceLevel {
        self.confidence_level
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// 동식물 분기에서 감지된 품목
    pub fn detected_products(&self) -> Vec<&str> {
        self.metadata
            .get("detected_products")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// 분류에 대응하는 에이전트 목록
    pub fn agents(&self) -> &'static [AgentKind] {
        match self.classification {
            QueryType::Regulation => &[AgentKind::Regulation],
            QueryType::Consultation => &[AgentKind::Consultation],
            QueryType::Mixed => &[AgentKind::Regulation, AgentKind::Consultation],
        }
    }
}

fn round4(value: f32) -> f64 {
    (value as f64 * 10_000.0).round() / 10_000.0
}

// ============================================================================
// Decision Procedure
// ============================================================================

/// 점수 → 결정
///
/// `products`는 동식물 분기에서만 호출됩니다.
pub fn decide(scores: &ScoreSet, products: impl FnOnce() -> Vec<String>) -> RoutingDecision {
    use ConfidenceLevel::*;

    if scores.law > LAW_THRESHOLD {
        return RoutingDecision::new(
            QueryType::Regulation,
            scores.law,
            RoutingReason::CustomsLawQuery,
            High,
            Some(scores),
        );
    }

    if scores.animal_plant > ANIMAL_PLANT_THRESHOLD {
        return RoutingDecision::new(
            QueryType::Regulation,
            scores.animal_plant,
            RoutingReason::AnimalPlantImportQuery,
            High,
            Some(scores),
        )
        .with_products(products());
    }

    let regulation = scores.regulation;
    let consultation = scores.consultation;

    if (regulation - consultation).abs() > SCORE_GAP_THRESHOLD {
        let (classification, confidence, reason) = if regulation > consultation {
            (QueryType::Regulation, regulation, RoutingReason::HighRegulationScore)
        } else {
            (QueryType::Consultation, consultation, RoutingReason::HighConsultationScore)
        };
        return RoutingDecision::new(classification, confidence, reason, High, Some(scores));
    }

    if regulation > MIXED_THRESHOLD && consultation > MIXED_THRESHOLD {
        return RoutingDecision::new(
            QueryType::Mixed,
            regulation.max(consultation),
            RoutingReason::MixedQueryType,
            Medium,
            Some(scores),
        );
    }

    if regulation < LOW_SCORE_THRESHOLD && consultation < LOW_SCORE_THRESHOLD {
        return RoutingDecision::new(
            QueryType::Consultation,
            DEFAULT_CONFIDENCE,
            RoutingReason::LowConfidenceDefault,
            Low,
            Some(scores),
        );
    }

    // 점수가 가깝고 하나 이상 0.3 이상: 동점이면 REGULATION
    let (classification, confidence, reason) = if regulation >= consultation {
        (QueryType::Regulation, regulation, RoutingReason::RegulationPreference)
    } else {
        (QueryType::Consultation, consultation, RoutingReason::ConsultationPreference)
    };
    RoutingDecision::new(classification, confidence, reason, Medium, Some(scores))
}

// ============================================================================
// Tests
// ============================================================================
