//! ChromaDB Vector Search - REST API 클라이언트
//!
//! 컬렉션 이름 → ID 조회 후 `query` 엔드포인트로 검색합니다.
//! ref: https://docs.trychroma.com/reference/python/client

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use url::Url;

use crate::config::ChromaConfig;

use super::filter::WhereCondition;
use super::vector::{CandidateDocument, VectorSearch};

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query_embeddings: Vec<&'a [f32]>,
    n_results: usize,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    where_filter: Option<Value>,
    include: [&'static str; 3],
}

/// query 응답 (쿼리 임베딩별 2차원 배열)
#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<Map<String, Value>>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

/// 첫 번째 쿼리 결과를 후보 문서로 변환
///
/// 코사인 거리 d → 유사도 clamp(1 - d, 0, 1)
fn into_candidates(response: QueryResponse) -> Vec<CandidateDocument> {
    let ids = response.ids.into_iter().next().unwrap_or_default();
    let mut documents = response
        .documents
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default()
        .into_iter();
    let mut metadatas = response
        .metadatas
        .and_then(|m| m.into_iter().next())
        .unwrap_or_default()
        .into_iter();
    let mut distances = response
        .distances
        .and_then(|d| d.into_iter().next())
        .unwrap_or_default()
        .into_iter();

    ids.into_iter()
        .map(|id| {
            let content = documents.next().flatten().unwrap_or_default();
            let metadata = metadatas.next().flatten().unwrap_or_default();
            let similarity = distances
                .next()
                .map(|d| (1.0 - d).clamp(0.0, 1.0))
                .unwrap_or(0.0);
            CandidateDocument::new(id, content, metadata, similarity)
        })
        .collect()
}

// ============================================================================
// ChromaClient
// ============================================================================

/// ChromaDB HTTP 클라이언트
pub struct ChromaClient {
    client: reqwest::Client,
    base_url: Url,
    collection: String,
    collection_id: OnceCell<String>,
}

impl ChromaClient {
    pub fn new(config: &ChromaConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid ChromaDB URL: {}", config.base_url))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url,
            collection: config.collection.clone(),
            collection_id: OnceCell::new(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("Invalid ChromaDB endpoint: {}", path))
    }

    /// 서버 상태 확인
    pub async fn heartbeat(&self) -> Result<()> {
        let url = self.endpoint("/api/v1/heartbeat")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("ChromaDB heartbeat request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("ChromaDB heartbeat returned {}", response.status());
        }
        Ok(())
    }

    /// 컬렉션 ID (최초 1회 조회 후 캐시)
    async fn collection_id(&self) -> Result<&str> {
        let id = self
            .collection_id
            .get_or_try_init(|| async {
                let url = self.endpoint(&format!("/api/v1/collections/{}", self.collection))?;
                let response = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .context("Failed to fetch ChromaDB collection")?;

                let status = response.status();
                let body = response
                    .text()
                    .await
                    .context("Failed to read response body")?;
                if !status.is_success() {
                    anyhow::bail!(
                        "ChromaDB collection '{}' lookup failed ({}): {}",
                        self.collection,
                        status,
                        body
                    );
                }

                let info: CollectionInfo =
                    serde_json::from_str(&body).context("Failed to parse collection info")?;
                tracing::debug!("Resolved collection '{}' -> {}", self.collection, info.id);
                Ok::<String, anyhow::Error>(info.id)
            })
            .await?;

        Ok(id.as_str())
    }
}

#[async_trait]
impl VectorSearch for ChromaClient {
    async fn search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        where_filter: Option<&WhereCondition>,
    ) -> Result<Vec<CandidateDocument>> {
        let collection_id = self.collection_id().await?;
        let url = self.endpoint(&format!("/api/v1/collections/{}/query", collection_id))?;

        let request = QueryRequest {
            query_embeddings: vec![query_embedding],
            n_results: top_k,
            where_filter: where_filter.map(WhereCondition::to_json),
            include: ["documents", "metadatas", "distances"],
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .context("ChromaDB query request failed")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;
        if !status.is_success() {
            anyhow::bail!("ChromaDB query failed ({}): {}", status, body);
        }

        let parsed: QueryResponse =
            serde_json::from_str(&body).context("Failed to parse ChromaDB query response")?;
        let candidates = into_candidates(parsed);

        tracing::info!(
            "ChromaDB returned {} candidates from '{}'",
            candidates.len(),
            self.collection
        );
        Ok(candidates)
    }

    fn name(&self) -> &str {
        "chromadb"
    }
}

// ============================================================================
// Tests
// ============================================================================
