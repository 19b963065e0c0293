//! 스코어 계산기
//!
//! 정규화된 쿼리를 받아 [0.0, 1.0] 범위의 점수를 반환하는 순수 함수들입니다.
//! 서로 독립적이라 어떤 순서로, 혹은 동시에 실행해도 결과가 같습니다.

use serde::Serialize;

use super::keywords::DomainTables;

/// 품목 일치 시 고정 점수 (품목 수와 무관)
pub const PRODUCT_MATCH_BONUS: f32 = 0.6;

/// 쿼리 하나에 대한 네 가지 점수
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreSet {
    pub law: f32,
    pub animal_plant: f32,
    pub regulation: f32,
    pub consultation: f32,
}

impl ScoreSet {
    /// 네 계산기를 모두 실행
    pub fn compute(tables: &DomainTables, normalized: &str) -> Self {
        Self {
            law: law_score(tables, normalized),
            animal_plant: animal_plant_score(tables, normalized),
            regulation: regulation_score(tables, normalized),
            consultation: consultation_score(tables, normalized),
        }
    }

    /// 이름과 함께 순회 (검증/로깅용)
    pub fn named(&self) -> [(&'static str, f32); 4] {
        [
            ("law", self.law),
            ("animal_plant", self.animal_plant),
            ("regulation", self.regulation),
            ("consultation", self.consultation),
        ]
    }
}

/// [0, 1] 범위로 자르기
///
/// NaN은 그대로 통과시켜 상위에서 감지하도록 합니다.
fn clamp_unit(score: f32) -> f32 {
    if score.is_nan() {
        score
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// 관세법 조문 질의 점수
pub fn law_score(tables: &DomainTables, normalized: &str) -> f32 {
    let score =
        tables.law_keywords.weight_sum(normalized) + tables.law_patterns.bonus(normalized);
    clamp_unit(score)
}

/// 동식물 수입 질의 점수
///
/// 수입 의도 패턴마다 +0.4, 품목이 하나라도 있으면 +0.6 (첫 매칭에서 중단).
pub fn animal_plant_score(tables: &DomainTables, normalized: &str) -> f32 {
    let mut score = tables.import_patterns.bonus(normalized);
    if tables.products.first_match(normalized).is_some() {
        score += PRODUCT_MATCH_BONUS;
    }
    clamp_unit(score)
}

/// 무역 규제 점수
pub fn regulation_score(tables: &DomainTables, normalized: &str) -> f32 {
    let score = tables.regulation_keywords.weight_sum(normalized)
        + tables.regulation_patterns.bonus(normalized);
    clamp_unit(score)
}

/// 상담 사례 점수
pub fn consultation_score(tables: &DomainTables, normalized: &str) -> f32 {
    let score = tables.consultation_keywords.weight_sum(normalized)
        + tables.consultation_patterns.bonus(normalized);
    clamp_unit(score)
}

/// 쿼리에 등장한 동식물 품목 전부
pub fn detect_products(tables: &DomainTables, normalized: &str) -> Vec<String> {
    tables.products.all_matches(normalized)
}

// ============================================================================
// Tests
// ============================================================================
