use anyhow::{Context, Result};
use axum::serve;
use fieldops_database::{initialize_database, AuditRepository, PgImportStore, PostgresPool};
use fieldops_utils::import::ImportEngine;
use fieldops_utils::{init_logging, AppConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

mod handlers;
mod metrics;
mod middleware;
mod routes;

use metrics::ImportMetrics;

pub type PgImportEngine = ImportEngine<PgImportStore, AuditRepository>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|_| {
        eprintln!("Failed to load configuration, using defaults");
        AppConfig::default()
    });

    init_logging(&config.logging)?;
    info!("Starting FieldOps API Gateway");

    let pool = initialize_database(&config.database).await?;
    info!("Database connection established");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server host or port")?;

    let state = AppState::new(pool, config)?;
    let app = routes::create_app(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("API Gateway listening on {}", addr);

    serve(listener, app).await?;

    Ok(())
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PostgresPool,
    pub config: AppConfig,
    pub engine: Arc<PgImportEngine>,
    pub metrics: ImportMetrics,
}

impl AppState {
    pub fn new(pool: PostgresPool, config: AppConfig) -> Result<Self> {
        let engine = ImportEngine::new(
            PgImportStore::new(pool.clone()),
            AuditRepository::new(pool.clone()),
            &config.import,
        );
        let metrics = ImportMetrics::new(&config.monitoring).context("Failed to register metrics")?;

        Ok(Self {
            pool,
            config,
            engine: Arc::new(engine),
            metrics,
        })
    }
}
