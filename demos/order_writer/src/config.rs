// order_writer/src/config.rs

use crate::errors::{AppError, Result}; // Use AppError specific Result
use order_uow::WriteStrategy;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
  /// Postgres connection string. Unset means the in-memory store.
  pub database_url: Option<String>,
  pub db_max_connections: u32,
  pub strategy: WriteStrategy,
  /// JSON order document. Unset means the built-in sample order.
  pub order_data_path: Option<PathBuf>,
  /// Insert the document's user and products before writing so foreign keys resolve.
  pub seed_reference_data: bool,
}

impl AppConfig {
  /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
  pub fn from_env() -> Result<Self> {
    Self::from_lookup(|var_name| env::var(var_name).ok())
  }

  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get_env = |var_name: &str| lookup(var_name).filter(|v| !v.trim().is_empty());

    let database_url = get_env("DATABASE_URL");
    let db_max_connections = get_env("DB_MAX_CONNECTIONS")
      .unwrap_or_else(|| "5".to_string())
      .parse::<u32>()
      .map_err(|e| AppError::Config(format!("Invalid DB_MAX_CONNECTIONS: {}", e)))?;
    let strategy = get_env("ORDER_STRATEGY")
      .map(|s| s.parse::<WriteStrategy>())
      .transpose()
      .map_err(|e| AppError::Config(format!("Invalid ORDER_STRATEGY: {}", e)))?
      .unwrap_or_default();
    let order_data_path = get_env("ORDER_DATA_PATH").map(PathBuf::from);
    let seed_reference_data = get_env("SEED_REFERENCE_DATA")
      .unwrap_or_else(|| "true".to_string())
      .parse::<bool>()
      .map_err(|e| AppError::Config(format!("Invalid SEED_REFERENCE_DATA value: {}", e)))?;

    tracing::info!(
      backend = if database_url.is_some() { "postgres" } else { "memory" },
      %strategy,
      "Application configuration loaded successfully."
    );
    // DATABASE_URL may carry credentials; it is never logged.

    Ok(Self {
      database_url,
      db_max_connections,
      strategy,
      order_data_path,
      seed_reference_data,
    })
  }
}
