//! CLI 모듈
//!
//! customs-rag CLI 명령어 정의 및 구현

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::config::{config_path, CoreConfig};
use crate::embedding::{has_api_key, OpenAiEmbedding, API_KEY_ENV};
use crate::retrieval::{build_filter, Booster, ChromaClient, DualAgentRetriever, SUPPORTED_FIELDS};
use crate::routing::{AsyncQueryRouter, QueryRouter};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "customs-rag")]
#[command(version, about = "관세 통관 질의 라우팅 + 듀얼 에이전트 RAG", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 질의 분류 (에이전트 선택)
    Route {
        /// 사용자 질의
        query: String,

        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 평면 필터를 ChromaDB where 조건으로 변환
    Filter {
        /// key=value 형식 필드 (반복 가능)
        #[arg(short, long = "field")]
        fields: Vec<String>,
    },

    /// 라우팅 + 벡터 검색 + 부스팅
    Search {
        /// 사용자 질의
        query: String,

        /// key=value 형식 필드 (반복 가능)
        #[arg(short, long = "field")]
        fields: Vec<String>,

        /// 에이전트별 검색 개수 (기본: 설정의 chroma.top_k)
        #[arg(short, long)]
        limit: Option<usize>,

        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Route { query, json } => cmd_route(&query, json).await,
        Commands::Filter { fields } => cmd_filter(&fields),
        Commands::Search {
            query,
            fields,
            limit,
            json,
        } => cmd_search(&query, &fields, limit, json).await,
        Commands::Status => cmd_status().await,
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 분류 명령어 (route)
async fn cmd_route(query: &str, json: bool) -> Result<()> {
    let config = CoreConfig::load().context("설정 로드 실패")?;
    let router = AsyncQueryRouter::new(QueryRouter::with_config(config.router));

    let decision = router.route(query).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    println!("[OK] 분류: {}", decision.classification());
    println!("     신뢰도: {:.2} ({})", decision.confidence(), decision.confidence_level().as_str());
    println!("     사유: {}", decision.reason());

    let agents: Vec<&str> = decision.agents().iter().map(|a| a.as_str()).collect();
    println!("     에이전트: {}", agents.join(", "));

    let products = decision.detected_products();
    if !products.is_empty() {
        println!("     감지 품목: {}", products.join(", "));
    }

    Ok(())
}

/// 필터 변환 명령어 (filter)
fn cmd_filter(fields: &[String]) -> Result<()> {
    let flat = parse_fields(fields)?;

    for (key, _) in &flat {
        if !SUPPORTED_FIELDS.contains(&key.as_str()) {
            println!("[!] 지원하지 않는 필드는 제외됩니다: {}", key);
        }
    }

    match build_filter(flat) {
        Some(condition) => println!("{}", serde_json::to_string_pretty(&condition)?),
        None => println!("null"),
    }

    Ok(())
}

/// 검색 명령어 (search)
async fn cmd_search(
    query: &str,
    fields: &[String],
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    if !has_api_key() {
        bail!(
            "API 키가 설정되지 않았습니다.\n\
             설정: export {}=your-key",
            API_KEY_ENV
        );
    }

    let config = CoreConfig::load().context("설정 로드 실패")?;
    let caller_filter = parse_fields(fields)?;
    let top_k = limit.unwrap_or(config.chroma.top_k);
    if top_k == 0 {
        bail!("--limit은 1 이상이어야 합니다");
    }

    let search = ChromaClient::new(&config.chroma).context("ChromaDB 클라이언트 생성 실패")?;
    let embedder = OpenAiEmbedding::from_env(&config.embedding).context("임베딩 클라이언트 생성 실패")?;
    let retriever = DualAgentRetriever::new(
        AsyncQueryRouter::new(QueryRouter::with_config(config.router)),
        search,
        embedder,
        Booster::new(config.boost),
        top_k,
    );

    if !json {
        println!("[*] 검색 중: \"{}\"", query);
    }

    let outcome = retriever
        .retrieve(query, &caller_filter)
        .await
        .context("검색 실패")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!(
        "[OK] 분류: {} ({:.2}, {})",
        outcome.decision.classification(),
        outcome.decision.confidence(),
        outcome.decision.reason()
    );

    if outcome.results.is_empty() {
        println!("\n[!] 검색 결과가 없습니다.");
        return Ok(());
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", outcome.results.len());

    for (i, doc) in outcome.results.documents.iter().enumerate() {
        let marker = if doc.boosted { "BOOST" } else { "-" };
        println!(
            "{}. [{}] [점수: {:.4} / 유사도: {:.4}] {}",
            i + 1,
            marker,
            doc.score,
            doc.similarity,
            doc.id
        );
        println!(
            "   유형: {} | 출처: {}",
            doc.data_type().unwrap_or("-"),
            doc.data_source().unwrap_or("-")
        );
        println!("   내용: {}", truncate_text(&doc.content, 200));
        println!();
    }

    let counts: Vec<String> = outcome
        .results
        .by_data_type
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    println!("[*] 유형별: {}", counts.join(", "));

    Ok(())
}

/// 상태 명령어 (status)
async fn cmd_status() -> Result<()> {
    println!("customs-rag v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("[*] 설정 파일: {}", config_path().display());

    let config = match CoreConfig::load() {
        Ok(config) => {
            println!("[OK] 설정: 유효");
            config
        }
        Err(e) => {
            println!("[!] 설정 오류: {}", e);
            return Ok(());
        }
    };

    if has_api_key() {
        println!("[OK] API 키: 설정됨 ({})", config.embedding.model);
    } else {
        println!("[!] API 키: 미설정");
        println!("    설정: export {}=your-key", API_KEY_ENV);
    }

    match ChromaClient::new(&config.chroma) {
        Ok(client) => match client.heartbeat().await {
            Ok(()) => println!(
                "[OK] ChromaDB: {} (컬렉션: {})",
                config.chroma.base_url,
                client.collection()
            ),
            Err(e) => {
                println!("[!] ChromaDB 연결 실패: {}", config.chroma.base_url);
                tracing::debug!("ChromaDB heartbeat failed: {:#}", e);
            }
        },
        Err(e) => println!("[!] ChromaDB 클라이언트 생성 실패: {}", e),
    }

    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

/// `key=value` 목록 파싱 (값은 문자열)
fn parse_fields(fields: &[String]) -> Result<Vec<(String, Value)>> {
    fields
        .iter()
        .map(|field| {
            let (key, value) = field
                .split_once('=')
                .ok_or_else(|| anyhow::anyhow!("필드 형식이 잘못되었습니다 (key=value): {}", field))?;
            let key = key.trim();
            if key.is_empty() {
                bail!("필드 이름이 비어 있습니다: {}", field);
            }
            Ok((key.to_string(), Value::String(value.trim().to_string())))
        })
        .collect()
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================
