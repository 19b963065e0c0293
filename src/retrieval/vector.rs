//! Vector Search - 벡터 검색 트레이트 및 후보 문서
//!
//! 코어는 벡터 검색 결과를 읽고 재정렬만 합니다.
//! 저장/인덱싱은 외부 서비스(ChromaDB)의 몫입니다.

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::filter::WhereCondition;

// ============================================================================
// Types
// ============================================================================

/// 벡터 검색 후보 문서
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDocument {
    /// 문서 ID
    pub id: String,
    /// 본문
    pub content: String,
    /// 메타데이터 (data_type, data_source, product_name 등)
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// 벡터 유사도 (0.0 ~ 1.0), 부스팅으로 바뀌지 않음
    pub similarity: f32,
    /// 부스팅 후 정렬 점수
    #[serde(default)]
    pub score: f32,
    /// 부스트 규칙 적용 여부
    #[serde(default)]
    pub boosted: bool,
}

impl CandidateDocument {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        metadata: Map<String, Value>,
        similarity: f32,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata,
            similarity,
            score: similarity,
            boosted: false,
        }
    }

    fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn data_type(&self) -> Option<&str> {
        self.metadata_str("data_type")
    }

    pub fn data_source(&self) -> Option<&str> {
        self.metadata_str("data_source")
    }

    pub fn product_name(&self) -> Option<&str> {
        self.metadata_str("product_name")
    }
}

// ============================================================================
// VectorSearch Trait
// ============================================================================

/// 벡터 검색 인터페이스 (async)
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// 유사도 내림차순 상위 `top_k`개
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        where_filter: Option<&WhereCondition>,
    ) -> Result<Vec<CandidateDocument>>;

    /// 백엔드 이름
    fn name(&self) -> &str;
}

// ============================================================================
// InMemoryVectorSearch
// ============================================================================

/// 인메모리 벡터 검색 (테스트/오프라인용)
///
/// 코사인 유사도 완전 탐색이며 where 조건은 `WhereCondition::matches`로 평가합니다.
#[derive(Debug, Default)]
pub struct InMemoryVectorSearch {
    entries: RwLock<Vec<(Vec<f32>, CandidateDocument)>>,
}

impl InMemoryVectorSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 문서 추가
    pub fn insert(&self, embedding: Vec<f32>, doc: CandidateDocument) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        entries.push((embedding, doc));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VectorSearch for InMemoryVectorSearch {
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        where_filter: Option<&WhereCondition>,
    ) -> Result<Vec<CandidateDocument>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let mut results: Vec<CandidateDocument> = entries
            .iter()
            .filter(|(_, doc)| where_filter.map_or(true, |f| f.matches(&doc.metadata)))
            .map(|(embedding, doc)| {
                let similarity = cosine_similarity(query_embedding, embedding).clamp(0.0, 1.0);
                CandidateDocument::new(
                    doc.id.clone(),
                    doc.content.clone(),
                    doc.metadata.clone(),
                    similarity,
                )
            })
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(top_k);

        Ok(results)
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

// ============================================================================
// Utility Functions
// ============================================================================

/// 코사인 유사도 (-1.0 ~ 1.0)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

// ============================================================================
// Tests
// ============================================================================
