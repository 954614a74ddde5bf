// order_writer/src/state.rs
use crate::config::AppConfig;
use crate::db::{self, PgSession};
use crate::errors::Result;
use order_uow::{MemoryStore, Order, OrderData, Session};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub enum StorageBackend {
  Memory(Arc<MemoryStore>),
  Postgres(PgPool),
}

#[derive(Clone)]
pub struct AppState {
  pub backend: StorageBackend,
  pub config: Arc<AppConfig>, // Share loaded config
}

impl AppState {
  /// Connects to Postgres and bootstraps the schema when `DATABASE_URL` is set,
  /// otherwise starts an empty in-memory store.
  pub async fn from_config(config: Arc<AppConfig>) -> Result<Self> {
    let backend = match &config.database_url {
      Some(url) => {
        let pool = db::connect(url, config.db_max_connections).await?;
        tracing::info!("Successfully connected to the database.");
        db::bootstrap_schema(&pool).await?;
        StorageBackend::Postgres(pool)
      }
      None => {
        tracing::info!("No DATABASE_URL set; using the in-memory store.");
        StorageBackend::Memory(MemoryStore::shared())
      }
    };
    Ok(Self { backend, config })
  }

  pub fn open_session(&self) -> Box<dyn Session> {
    match &self.backend {
      StorageBackend::Memory(store) => Box::new(store.session()),
      StorageBackend::Postgres(pool) => Box::new(PgSession::new(pool.clone())),
    }
  }

  pub async fn seed_reference_data(&self, data: &OrderData) -> Result<()> {
    match &self.backend {
      StorageBackend::Memory(store) => store.seed_from(data),
      StorageBackend::Postgres(pool) => db::seed_reference_data(pool, data).await?,
    }
    Ok(())
  }

  pub async fn load_order(&self, order_id: Uuid) -> Result<Option<Order>> {
    match &self.backend {
      StorageBackend::Memory(store) => Ok(store.order_with_items(order_id)),
      StorageBackend::Postgres(pool) => Ok(db::fetch_order_with_items(pool, order_id).await?),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use order_uow::WriteStrategy;

  fn memory_config(strategy: WriteStrategy) -> Arc<AppConfig> {
    Arc::new(AppConfig {
      database_url: None,
      db_max_connections: 1,
      strategy,
      order_data_path: None,
      seed_reference_data: true,
    })
  }

  #[tokio::test]
  async fn memory_backend_writes_and_reads_back() {
    for strategy in [WriteStrategy::Traditional, WriteStrategy::UnitOfWork] {
      let state = AppState::from_config(memory_config(strategy)).await.unwrap();
      let data = OrderData::sample();
      state.seed_reference_data(&data).await.unwrap();

      let mut session = state.open_session();
      let order_id = strategy.run(&mut *session, &data).await.unwrap();
      let order = state.load_order(order_id).await.unwrap().expect("order persisted");
      assert_eq!(order.order_items.len(), 2);
    }
  }

  #[tokio::test]
  async fn unseeded_memory_backend_rejects_order() {
    let state = AppState::from_config(memory_config(WriteStrategy::UnitOfWork)).await.unwrap();
    let mut session = state.open_session();
    assert!(WriteStrategy::UnitOfWork
      .run(&mut *session, &OrderData::sample())
      .await
      .is_err());
  }
}
