use std::sync::Arc;

use guidebuoy_intake::analytics::Analytics;
use guidebuoy_intake::api::{AppState, api_routes};
use guidebuoy_intake::auth::{LettreMailer, Mailer, NoopMailer};
use guidebuoy_intake::config::AppConfig;
use guidebuoy_intake::evidence::EvidenceStorage;
use guidebuoy_intake::llm::create_provider;
use guidebuoy_intake::ratelimit::RateLimiter;
use guidebuoy_intake::store::{Database, LibSqlBackend};
use tower_http::cors::CorsLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Arc::new(AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export GOOGLE_GENERATIVE_AI_API_KEY=...");
        std::process::exit(1);
    }));

    eprintln!("GuideBuoy intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   API: http://0.0.0.0:{}/api", config.port);
    eprintln!("   Public base: {}", config.public_base);

    let llm = create_provider(&config.llm);

    // ── Database ────────────────────────────────────────────────────
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&config.db_path)
            .await
            .unwrap_or_else(|e| {
                eprintln!(
                    "Error: Failed to open database at {}: {e}",
                    config.db_path.display()
                );
                std::process::exit(1);
            }),
    );
    eprintln!("   Database: {}", config.db_path.display());

    // ── Mailer ──────────────────────────────────────────────────────
    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => {
            info!(host = %smtp.host, "SMTP mailer enabled");
            Arc::new(LettreMailer::new(smtp.clone()))
        }
        None => {
            info!("SMTP not configured, verification links will be logged");
            Arc::new(NoopMailer)
        }
    };

    let state = AppState {
        analytics: Analytics::new(Arc::clone(&db)),
        storage: EvidenceStorage::new(&config.storage_root),
        limiter: Arc::new(RateLimiter::new()),
        db,
        llm,
        mailer,
        config: Arc::clone(&config),
    };

    let app = api_routes(state).layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "Listening");
    axum::serve(listener, app).await?;

    Ok(())
}
