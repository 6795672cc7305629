use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wisdom_cards::config::{self, AppConfig};
use wisdom_cards::dataset::DatasetStore;
use wisdom_cards::db::{self, LogOnError};
use wisdom_cards::generator::CardGenerator;
use wisdom_cards::handlers;
use wisdom_cards::state::AppState;

#[tokio::main]
async fn main() {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wisdom_cards=debug,tower_http=debug".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  let config = AppConfig::load();

  let pool = db::init_db(&config.database_path).expect("Failed to initialize database");

  {
    let conn = pool.lock().expect("Database lock failed during startup");
    let cutoff = chrono::Utc::now() - chrono::Duration::days(config::PROGRESS_RETENTION_DAYS);
    if let Some(removed) =
      db::prune_records_before(&conn, cutoff).log_warn("Failed to prune stale progress")
    {
      tracing::info!("Pruned {} stale progress record(s)", removed);
    }
  }

  let generator = CardGenerator::from_config(&config);
  if !generator.is_configured() {
    tracing::warn!("GEMINI_API_KEY is not set; card generation is disabled");
  }

  let state = AppState::new(DatasetStore::new(&config.datasets_dir), pool, generator);
  if let Err(e) = state.reload_catalog() {
    tracing::warn!("Starting without datasets: {}", e);
  }

  let app = handlers::router(state);

  let bind_addr = config.bind_addr();
  let listener = tokio::net::TcpListener::bind(&bind_addr)
    .await
    .unwrap_or_else(|_| panic!("Failed to bind to {}", bind_addr));

  tracing::info!("Server running on http://localhost:{}", config.server_port);

  axum::serve(listener, app)
    .await
    .expect("Server failed to start");
}
