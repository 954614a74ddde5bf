// order_writer/src/main.rs

// Declare modules for the application
mod config;
mod db;
mod errors;
mod state;

use crate::config::AppConfig;
use crate::errors::{AppError, Result as AppResult}; // Use the app's Result alias
use crate::state::AppState;

use order_uow::OrderData;
use std::sync::Arc;
use tracing_subscriber::fmt::format::FmtSpan; // For span events in tracing
use tracing_subscriber::EnvFilter;

fn default_filter() -> EnvFilter {
  EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn init_tracing() {
  let builder = tracing_subscriber::fmt()
    .with_env_filter(default_filter()) // RUST_LOG overrides the info default
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration

  if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
    builder.json().init();
  } else {
    builder.init();
  }
}

async fn load_order_data(config: &AppConfig) -> AppResult<OrderData> {
  match &config.order_data_path {
    Some(path) => {
      let raw = tokio::fs::read_to_string(path).await?;
      let data = OrderData::from_json(&raw)?;
      tracing::info!(path = %path.display(), items = data.order_items.len(), "Loaded order document.");
      Ok(data)
    }
    None => {
      tracing::info!("No ORDER_DATA_PATH set; using the sample order.");
      Ok(OrderData::sample())
    }
  }
}

#[tokio::main]
async fn main() -> AppResult<()> {
  dotenvy::dotenv().ok(); // Load .env file if present
  init_tracing();

  tracing::info!("Starting order writer...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg), // Arc the config for sharing
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(e);
    }
  };

  let data = load_order_data(&app_config).await?;
  let app_state = AppState::from_config(app_config).await?;

  if app_state.config.seed_reference_data {
    app_state.seed_reference_data(&data).await?;
  }

  let strategy = app_state.config.strategy;
  let mut session = app_state.open_session();
  let order_id = match strategy.run(&mut *session, &data).await {
    Ok(id) => id,
    Err(e) => {
      tracing::error!(%strategy, error = %e, "Order write failed.");
      return Err(e.into());
    }
  };

  let order = app_state
    .load_order(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("order {} after commit", order_id)))?;
  tracing::info!(%order_id, %strategy, items = order.order_items.len(), "Order persisted.");
  println!("{}", serde_json::to_string_pretty(&order)?);
  Ok(())
}
