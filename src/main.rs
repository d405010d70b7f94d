use std::error::Error;
use std::sync::Arc;

use ai_llm_service::config::default_config::{config_chat, config_embedding};
use ai_llm_service::service_profiles::LlmServiceProfiles;
use clap::Parser;
use grounded_answer::{AnswerService, PipelineConfig, Request, Response};
use rag_store::{RagConfig, RagStore, VectorStore};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Answer one question from the configured Qdrant collection.
#[derive(Parser, Debug)]
#[command(name = "grounded-rag", version, about, long_about = None)]
struct Cli {
    /// Question to answer
    question: String,

    /// Number of fragments to retrieve (0 uses RAG_TOP_K)
    #[arg(long, default_value_t = 0)]
    top_k: u64,

    /// Ask the model whether the question needs clarification first
    #[arg(long)]
    clarify: bool,

    /// Print the full response as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Missing .env is fine: variables may come from the environment.
    let _ = dotenvy::dotenv();

    let filter = ai_llm_service::telemetry::env_filter_with_levels(
        "info",
        &[("grounded_rag", Level::INFO)],
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(ai_llm_service::telemetry::layer())
        .with(grounded_answer::telemetry::layer())
        .with(ai_llm_service::telemetry::scoped_layer("rag_store"))
        .with(ai_llm_service::telemetry::scoped_layer("grounded_rag"))
        .init();

    let cli = Cli::parse();

    let llm = Arc::new(LlmServiceProfiles::new(config_chat()?, config_embedding()?));
    let rag_cfg = RagConfig::from_env()?;
    let store = Arc::new(RagStore::new(rag_cfg.clone())?);

    let mut cfg = PipelineConfig::from_env();
    cfg.collection = rag_cfg.collection;
    info!(collection = %cfg.collection, top_k = cfg.default_top_k, "pipeline configured");

    let mut svc = AnswerService::new(cfg, llm.clone(), llm, store.clone());
    if cli.clarify {
        svc = svc.with_llm_clarifier();
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            on_ctrl_c.cancel();
        }
    });

    let req = Request::new(cli.question).with_top_k(cli.top_k);
    let result = svc.answer_with_cancel(&req, &cancel).await;
    store.close().await?;
    let resp = result?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&resp)?);
    } else {
        print_response(&resp);
    }
    Ok(())
}

fn print_response(resp: &Response) {
    if resp.need_clarification {
        println!(
            "Clarification needed: {}",
            resp.clarifying_question.as_deref().unwrap_or("(no question)")
        );
        for q in &resp.suggested_queries {
            println!("  suggested query: {q}");
        }
        return;
    }

    println!("{}\n", resp.answer);
    if !resp.citations.is_empty() {
        println!("Sources:");
        for c in &resp.citations {
            println!("  [{}] {}: \"{}\"", c.id, c.data_source, c.quote);
        }
        println!();
    }
    println!("Fragments offered: {}", resp.chunks.len());
    for ch in &resp.chunks {
        println!("  [{}] {}", ch.id, ch.data_source);
    }
    println!(
        "Validation: {}{}",
        if resp.validation.ok { "ok" } else { "failed" },
        if resp.validation.notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", resp.validation.notes)
        }
    );
}
