//! Survey engine HTTP server.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use survey_engine::adapters::audit::{FileAuditSink, NoOpAuditSink};
use survey_engine::adapters::http::{app_router, SurveyHandlers};
use survey_engine::adapters::inference::{OllamaProvider, ResilientInferenceClient};
use survey_engine::adapters::storage::{InMemorySurveyRepository, SqliteSurveyRepository};
use survey_engine::application::{CloseSessionHandler, ProcessTurnHandler, SessionLocks};
use survey_engine::config::{AppConfig, StorageBackend, StorageConfig};
use survey_engine::ports::{AuditSink, FeedbackAnalyzer, RepositoryError, SurveyRepository};

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn open_repository(storage: &StorageConfig) -> Result<Arc<dyn SurveyRepository>, RepositoryError> {
    match storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory session storage, sessions are lost on restart");
            Ok(Arc::new(InMemorySurveyRepository::new()))
        }
        StorageBackend::Sqlite => {
            let repository =
                SqliteSurveyRepository::connect(&storage.database_url, storage.max_connections).await?;
            Ok(Arc::new(repository))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let provider = OllamaProvider::new(config.inference.ollama_config())?;
    let analyzer: Arc<dyn FeedbackAnalyzer> = Arc::new(
        ResilientInferenceClient::new(provider, config.inference.retry_policy())
            .with_probe_timeout(config.inference.probe_timeout()),
    );
    let repository = open_repository(&config.storage).await?;
    let audit: Arc<dyn AuditSink> = if config.audit.enabled {
        Arc::new(FileAuditSink::new(&config.audit.log_path))
    } else {
        Arc::new(NoOpAuditSink)
    };
    let locks = Arc::new(SessionLocks::new());

    let turn_handler = ProcessTurnHandler::new(
        repository.clone(),
        analyzer.clone(),
        audit.clone(),
        locks.clone(),
    )
    .with_message_seed(config.survey.message_seed)
    .with_lock_wait(config.turn_lock_wait());
    let close_handler = CloseSessionHandler::new(repository, analyzer.clone(), audit, locks);

    if analyzer.check_connection().await {
        tracing::info!(
            base_url = %config.inference.base_url,
            model = %config.inference.model,
            "Inference backend online"
        );
    } else {
        tracing::warn!(
            base_url = %config.inference.base_url,
            "Inference backend unreachable, turns will use neutral sentiment until it recovers"
        );
    }

    let handlers = SurveyHandlers::new(
        Arc::new(turn_handler),
        Arc::new(close_handler),
        analyzer,
    );
    let app = app_router(handlers, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Survey engine listening");
    axum::serve(listener, app).await?;

    Ok(())
}
