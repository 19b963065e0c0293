//! Retrieval 모듈 - 듀얼 에이전트 RAG 검색
//!
//! - Filter: 평면 필터 → ChromaDB where 조건 (`$eq` / `$and`)
//! - Vector: 후보 문서 모델 + 벡터 검색 트레이트
//! - Chroma: ChromaDB REST 클라이언트
//! - Context: 에이전트별 부스트 키워드 / 우선 소스 / 기본 필터
//! - Booster: 도메인 규칙 기반 재정렬 + 집계
//! - Retriever: 라우팅부터 병합까지 전체 흐름

mod booster;
mod chroma;
mod context;
mod filter;
mod retriever;
mod vector;

// Re-exports
pub use booster::{Booster, MergedResults};
pub use chroma::ChromaClient;
pub use context::{
    SearchContext, DATA_TYPE_CONSULTATION_CASE, DATA_TYPE_CUSTOMS_LAW,
    DATA_TYPE_TRADE_REGULATION, SOURCE_ANIMAL_PLANT, SOURCE_CONSULTATION, SOURCE_CUSTOMS_LAW,
    SOURCE_EXPORT_REGULATION, SOURCE_IMPORT_REGULATION,
};
pub use filter::{
    build_filter, build_filter_from_map, is_supported_field, WhereCondition, SUPPORTED_FIELDS,
};
pub use retriever::{DualAgentRetriever, RetrievalOutcome};
pub use vector::{cosine_similarity, CandidateDocument, InMemoryVectorSearch, VectorSearch};
