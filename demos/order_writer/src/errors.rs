// order_writer/src/errors.rs

use order_uow::UowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Order Write Error: {source}")]
  Write {
    #[from] // Allows conversion from order_uow::UowError
    source: UowError,
  },

  #[error("Input Error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Invalid Order Document: {0}")]
  Json(#[from] serde_json::Error),
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
