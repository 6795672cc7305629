//! Application configuration.
//!
//! Values are resolved with priority: config.toml > environment (.env) > default.
//! The Gemini API key is only ever read from the environment.

use serde::Deserialize;
use std::path::PathBuf;

// ==================== File Configuration ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    server: Option<ServerSection>,
    data: Option<DataSection>,
    generator: Option<GeneratorSection>,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    addr: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct DataSection {
    datasets_dir: Option<String>,
    database_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeneratorSection {
    model: Option<String>,
    endpoint: Option<String>,
}

// ==================== Defaults ====================

/// Server address to bind to
pub const SERVER_ADDR: &str = "0.0.0.0";

/// Server port
pub const SERVER_PORT: u16 = 3000;

/// Directory scanned for `*.json` datasets
pub const DEFAULT_DATASETS_DIR: &str = "json_data";

/// SQLite file holding persisted learner progress
pub const DEFAULT_DATABASE_PATH: &str = "data/progress.db";

/// Generative model used for card generation
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash-lite";

/// Base URL of the Gemini REST API
pub const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

// ==================== Session Configuration ====================

/// Idle learner sessions are dropped from memory after this many hours
pub const SESSION_EXPIRY_HOURS: i64 = 12;

/// Probability threshold for session cleanup (0-255, lower = more frequent)
/// Value of 25 means ~10% chance (25/256) on each session access
pub const SESSION_CLEANUP_THRESHOLD: u8 = 25;

/// Session cookie lifetime in days
pub const SESSION_COOKIE_DAYS: i64 = 365;

/// Progress rows untouched for this long are deleted at startup.
/// Matches the cookie lifetime: older rows belong to cookies that have expired.
pub const PROGRESS_RETENTION_DAYS: i64 = SESSION_COOKIE_DAYS;

// ==================== Learning Configuration ====================

/// Number of cards requested from the model when the caller gives no count
pub const DEFAULT_GENERATE_COUNT: u32 = 10;

/// Storage key for revealed ids + active dataset
pub const REVEALED_RECORD_KEY: &str = "revealed_wisdom";

/// Storage key for mastered ids per dataset
pub const MASTERED_RECORD_KEY: &str = "mastered_wisdom";

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_addr: String,
    pub server_port: u16,
    pub datasets_dir: PathBuf,
    pub database_path: PathBuf,
    pub gemini_model: String,
    pub gemini_endpoint: String,
    pub gemini_api_key: Option<String>,
}

impl AppConfig {
    /// Load configuration from config.toml, the environment and defaults.
    pub fn load() -> Self {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let file = match std::fs::read_to_string("config.toml") {
            Ok(contents) => match toml::from_str::<FileConfig>(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config.toml");
                    config
                }
                Err(e) => {
                    tracing::warn!("Ignoring invalid config.toml: {}", e);
                    FileConfig::default()
                }
            },
            Err(_) => FileConfig::default(),
        };

        Self::resolve(file, |name| std::env::var(name).ok())
    }

    fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let server = file.server;
        let data = file.data;
        let generator = file.generator;

        let server_addr = server
            .as_ref()
            .and_then(|s| s.addr.clone())
            .unwrap_or_else(|| SERVER_ADDR.to_string());

        let server_port = server
            .as_ref()
            .and_then(|s| s.port)
            .or_else(|| env("PORT").and_then(|p| p.parse().ok()))
            .unwrap_or(SERVER_PORT);

        let datasets_dir = data
            .as_ref()
            .and_then(|d| d.datasets_dir.clone())
            .or_else(|| env("DATASETS_DIR"))
            .unwrap_or_else(|| DEFAULT_DATASETS_DIR.to_string());

        let database_path = data
            .as_ref()
            .and_then(|d| d.database_path.clone())
            .or_else(|| env("DATABASE_PATH"))
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let gemini_model = generator
            .as_ref()
            .and_then(|g| g.model.clone())
            .or_else(|| env("GEMINI_MODEL"))
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        let gemini_endpoint = generator
            .as_ref()
            .and_then(|g| g.endpoint.clone())
            .unwrap_or_else(|| DEFAULT_GEMINI_ENDPOINT.to_string());

        let gemini_api_key = env("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());

        Self {
            server_addr,
            server_port,
            datasets_dir: PathBuf::from(datasets_dir),
            database_path: PathBuf::from(database_path),
            gemini_model,
            gemini_endpoint,
            gemini_api_key,
        }
    }

    /// Get the full server bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_addr, self.server_port)
    }
}
