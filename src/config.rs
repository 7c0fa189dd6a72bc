use anyhow::{Context, Result};
use clap::Parser;
use std::env;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    pub default_owner_id: i64,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Document ingestion and retrieval API")]
pub struct Args {
    /// Host to bind to (overrides DOC_STORE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides DOC_STORE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where uploaded files are stored (overrides DOC_STORE_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Database URL (overrides DOC_STORE_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// User id that owns ingested documents (overrides DOC_STORE_DEFAULT_OWNER)
    #[arg(long)]
    pub default_owner: Option<i64>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("DOC_STORE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("DOC_STORE_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing DOC_STORE_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading DOC_STORE_PORT"),
        };
        let env_storage =
            env::var("DOC_STORE_STORAGE_DIR").unwrap_or_else(|_| "./data/uploads".into());
        let env_db = env::var("DOC_STORE_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/meta/doc_store.db".into());
        let env_owner = match env::var("DOC_STORE_DEFAULT_OWNER") {
            Ok(value) => value
                .parse::<i64>()
                .with_context(|| format!("parsing DOC_STORE_DEFAULT_OWNER value `{}`", value))?,
            Err(env::VarError::NotPresent) => 1,
            Err(err) => return Err(err).context("reading DOC_STORE_DEFAULT_OWNER"),
        };

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            default_owner_id: args.default_owner.unwrap_or(env_owner),
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
