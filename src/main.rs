use mmcalc::api::{self, AppState};
use mmcalc::config::{Config, EntitlementMode};
use mmcalc::db::{init_db, Repository};
use mmcalc::orchestration::{Autosaver, SessionManager};
use mmcalc::persistence::{AllowAllGate, EntitlementGate, SnapshotStore, SqliteGate, SqliteStore};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and collaborators
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let store: Arc<dyn SnapshotStore> = Arc::new(SqliteStore::new(repo.clone()));
    let gate: Arc<dyn EntitlementGate> = match config.entitlement_mode {
        EntitlementMode::Open => Arc::new(AllowAllGate),
        EntitlementMode::Enforced => Arc::new(SqliteGate::new(repo.clone())),
    };

    let autosaver = Autosaver::spawn(
        store.clone(),
        Duration::from_millis(config.autosave_debounce_ms),
    );
    let manager = Arc::new(SessionManager::new(store, gate, autosaver));

    // Create router
    let app = api::create_router(AppState { manager });

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
