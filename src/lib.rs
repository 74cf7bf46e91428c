pub mod api;
pub mod config;
pub mod models;
pub mod db;
pub mod pipeline;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use config::{ConfigError, LlmBackend, LlmSettings, ServiceConfig};
use db::DatabaseError;
use pipeline::catalogue::ContentCatalogue;
use pipeline::chat::gateway::GatewayChatClient;
use pipeline::chat::ollama::OllamaChatClient;
use pipeline::chat::{ChatModel, ModelError};
use pipeline::keywords::KeywordTables;
use pipeline::triage::KeywordClassifier;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Language model client error: {0}")]
    Model(#[from] ModelError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Build the configured language-model backend.
pub fn build_model(settings: &LlmSettings) -> Result<Arc<dyn ChatModel>, ModelError> {
    let model: Arc<dyn ChatModel> = match settings.backend {
        LlmBackend::Ollama => Arc::new(OllamaChatClient::new(
            &settings.base_url,
            &settings.model,
            settings.timeout_secs,
        )?),
        LlmBackend::Gateway => Arc::new(GatewayChatClient::new(
            &settings.base_url,
            settings.api_key.as_deref().unwrap_or_default(),
            &settings.model,
            settings.timeout_secs,
        )?),
    };
    Ok(model)
}

/// Load keyword tables from the configured file, or the built-in defaults.
pub fn load_keyword_tables(config: &ServiceConfig) -> Result<KeywordTables, ConfigError> {
    match &config.keywords_file {
        Some(path) => {
            let tables = KeywordTables::from_json_file(path)?;
            tracing::info!(path = %path.display(), "Keyword tables loaded");
            Ok(tables)
        }
        None => Ok(KeywordTables::default()),
    }
}

/// Load the starter content catalogue from the configured file, or the built-in one.
pub fn load_content_catalogue(config: &ServiceConfig) -> Result<ContentCatalogue, ConfigError> {
    match &config.content_file {
        Some(path) => {
            let catalogue = ContentCatalogue::from_json_file(path)?;
            tracing::info!(path = %path.display(), entries = catalogue.entries.len(), "Content catalogue loaded");
            Ok(catalogue)
        }
        None => Ok(ContentCatalogue::default()),
    }
}

pub fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = ServiceConfig::from_env()?;
    let classifier = KeywordClassifier::new(Arc::new(load_keyword_tables(&config)?));

    // Blocking HTTP clients must be built and dropped outside the async runtime
    let model = build_model(&config.llm)?;
    tracing::info!(
        backend = ?config.llm.backend,
        model = %config.llm.model,
        url = %config.llm.base_url,
        "Language model configured"
    );

    let catalogue = load_content_catalogue(&config)?;

    // Fail fast on an unusable database; requests reopen it as needed
    {
        let conn = db::sqlite::open_database(&config.db_path)?;
        let seeded = catalogue.seed_if_empty(&conn)?;
        if seeded > 0 {
            tracing::info!(entries = seeded, "Content catalogue seeded");
        }
    }
    tracing::info!(path = %config.db_path.display(), "Database ready");

    let ctx = api::ApiContext::new(
        config.db_path.clone(),
        classifier,
        Arc::clone(&model),
        config.content_limit,
        config.ticket_policy,
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(async move {
        let server = api::start_api_server(ctx, config.bind_addr)
            .await
            .map_err(StartupError::Server)?;

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {e}");
        }
        server.shutdown().await;
        Ok(())
    });

    drop(runtime);
    drop(model);
    result
}
