//! customs-rag - 관세 통관 챗봇 질의 라우팅 + 듀얼 에이전트 RAG 코어
//!
//! 사용자 질의를 법령 / 동식물 수입 / 무역 규제 / 상담 사례 점수로 분류하고,
//! 선택된 에이전트의 메타데이터 필터로 ChromaDB를 검색한 뒤
//! 도메인 규칙으로 결과를 재정렬합니다.

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod retrieval;
pub mod routing;

// Re-exports
pub use config::{BoostConfig, ChromaConfig, CoreConfig, EmbeddingConfig, RouterConfig};
pub use embedding::{get_api_key, has_api_key, EmbeddingProvider, OpenAiEmbedding};
pub use error::{ConfigError, RoutingError};
pub use retrieval::{
    build_filter, Booster, CandidateDocument, ChromaClient, DualAgentRetriever, MergedResults,
    RetrievalOutcome, SearchContext, VectorSearch, WhereCondition,
};
pub use routing::{
    AgentKind, AsyncQueryRouter, QueryRouter, QueryType, RoutingDecision, RoutingReason, ScoreSet,
};
