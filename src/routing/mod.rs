//! Routing 모듈 - 질의 분류 및 에이전트 선택
//!
//! - Keywords: 도메인별 가중치 키워드 / 정규식 패턴 / 동식물 품목 테이블
//! - Normalizer: 소문자화 + 특수문자 제거 + 공백 정리
//! - Scorer: 법령 / 동식물 / 규제 / 상담 점수
//! - Decision: 우선순위 규칙에 따른 분류 결정
//! - Router: 동기/비동기 라우터

mod decision;
mod keywords;
mod normalizer;
mod router;
mod scorer;

// Re-exports
pub use decision::{
    decide, AgentKind, ConfidenceLevel, QueryType, RoutingDecision, RoutingReason,
    ANIMAL_PLANT_THRESHOLD, DEFAULT_CONFIDENCE, LAW_THRESHOLD,
};
pub use keywords::{DomainTables, KeywordTable, PatternList, ProductList};
pub use normalizer::{normalize_query, truncate_chars};
pub use router::{AsyncQueryRouter, QueryRouter};
pub use scorer::{
    animal_plant_score, consultation_score, detect_products, law_score, regulation_score,
    ScoreSet,
};
