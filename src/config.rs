use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

/// Chunk budget applied when `MAX_CHUNK_SIZE` is unset.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1000;
/// Per-request embedding deadline applied when `EMBEDDING_TIMEOUT_SECS` is unset.
pub const DEFAULT_EMBEDDING_TIMEOUT_SECS: u64 = 30;
/// Backing file used when `NODE_HISTORY_FILE` is unset.
pub const DEFAULT_NODE_HISTORY_FILE: &str = "node_history.json";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the Docpulp server.
#[derive(Debug)]
pub struct Config {
    /// Postgres connection string for the document store.
    pub database_url: String,
    /// Base URL of the Ollama runtime that produces embeddings.
    pub ollama_url: String,
    /// Embedding model identifier passed to Ollama.
    pub embedding_model: String,
    /// Dimensionality every stored vector must have.
    pub embedding_dimension: usize,
    /// Upper bound, in characters, for a single chunk.
    pub max_chunk_size: usize,
    /// Deadline for one embedding request, in seconds.
    pub embedding_timeout_secs: u64,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
    /// Location of the flat file backing the visible-nodes collection.
    pub node_history_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        let embedding_dimension: usize = load_env("EMBEDDING_DIMENSION")?
            .parse()
            .map_err(|_| ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()))?;
        if embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".to_string()));
        }
        let max_chunk_size = match load_env_optional("MAX_CHUNK_SIZE") {
            Some(value) => value
                .parse()
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| ConfigError::InvalidValue("MAX_CHUNK_SIZE".to_string()))?,
            None => DEFAULT_MAX_CHUNK_SIZE,
        };
        Ok(Self {
            database_url: load_env("DATABASE_URL")?,
            ollama_url: load_env("OLLAMA_URL")?,
            embedding_model: load_env("EMBEDDING_MODEL")?,
            embedding_dimension,
            max_chunk_size,
            embedding_timeout_secs: load_env_optional("EMBEDDING_TIMEOUT_SECS")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("EMBEDDING_TIMEOUT_SECS".into()))
                })
                .transpose()?
                .unwrap_or(DEFAULT_EMBEDDING_TIMEOUT_SECS),
            server_port: load_env_optional("SERVER_PORT")
                .map(|value| {
                    value
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("SERVER_PORT".into()))
                })
                .transpose()?,
            node_history_file: load_env_optional("NODE_HISTORY_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_NODE_HISTORY_FILE)),
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Global configuration cache populated during process start.
pub static CONFIG: OnceLock<Config> = OnceLock::new();

/// Retrieve the loaded configuration, panicking if initialization has not occurred.
pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config not initialized")
}

/// Load configuration from the environment and install it in the global cache.
pub fn init_config() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("Failed to load config from environment");
    tracing::debug!(
        ollama_url = %config.ollama_url,
        embedding_model = %config.embedding_model,
        embedding_dimension = config.embedding_dimension,
        max_chunk_size = config.max_chunk_size,
        server_port = ?config.server_port,
        "Loaded configuration"
    );
    CONFIG.set(config).expect("Failed to set config");
}
