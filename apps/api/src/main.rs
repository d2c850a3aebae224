mod config;
mod db;
mod errors;
mod extract;
mod journal;
mod llm_client;
mod mood;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{AnalyzerBackend, Config};
use crate::db::connect_entry_store;
use crate::journal::analysis::AnalysisService;
use crate::journal::memory::InMemoryEntryRepository;
use crate::journal::repository::EntryRepository;
use crate::llm_client::LlmClient;
use crate::mood::{
    ExpressionMeasurer, HumeExpressionClient, LlmMoodAnalyzer, MockMoodAnalyzer, MoodAnalyzer,
};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Journal API v{}", env!("CARGO_PKG_VERSION"));

    let entries: Arc<dyn EntryRepository> = match &config.database_url {
        Some(url) => Arc::new(connect_entry_store(url).await?),
        None => {
            warn!("DATABASE_URL not set; entries are kept in memory and lost on restart");
            Arc::new(InMemoryEntryRepository::new())
        }
    };

    let analyzer: Arc<dyn MoodAnalyzer> = match config.analyzer {
        AnalyzerBackend::Llm => {
            if config.llm.api_key.is_none() {
                warn!("ANTHROPIC_API_KEY not set; text analysis will fail until it is configured");
            }
            let llm = LlmClient::new(config.llm.clone()).context("failed to build LLM client")?;
            info!("LLM mood analyzer initialized (model: {})", llm.model());
            Arc::new(LlmMoodAnalyzer::new(llm))
        }
        AnalyzerBackend::Mock => {
            warn!("Using mock mood analyzer");
            Arc::new(MockMoodAnalyzer::new())
        }
    };

    let measurer: Option<Arc<dyn ExpressionMeasurer>> = if config.has_expression_service() {
        let client = HumeExpressionClient::new(config.hume.clone())
            .context("failed to build expression measurement client")?;
        info!("Expression measurement client initialized");
        Some(Arc::new(client))
    } else {
        warn!("HUME_API_KEY not set; video entries without a report cannot be analyzed");
        None
    };

    let analysis = AnalysisService::new(entries.clone(), analyzer, measurer, config.retry);

    let state = AppState { entries, analysis };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
