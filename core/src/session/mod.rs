// order_uow/src/session/mod.rs

//! The storage seam. A `Session` stages records and flushes them as one
//! transaction per `commit`. Implementations: `MemorySession` here, and the
//! Postgres session in the `order_writer` app.

pub mod memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::UowResult;
use crate::model::{Order, OrderItem, Record};

pub use memory::{MemorySession, MemoryStore, StoreSnapshot};

/// What a successful commit persisted, with generated identifiers filled in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitReceipt {
  /// Staged orders, each carrying the items cascaded with it.
  pub orders: Vec<Order>,
  /// Items staged on their own (not through an order).
  pub order_items: Vec<OrderItem>,
}

impl CommitReceipt {
  pub fn is_empty(&self) -> bool {
    self.orders.is_empty() && self.order_items.is_empty()
  }

  pub fn order_ids(&self) -> Vec<Uuid> {
    self.orders.iter().filter_map(|o| o.id).collect()
  }

  pub fn first_order_id(&self) -> Option<Uuid> {
    self.orders.first().and_then(|o| o.id)
  }

  /// Orders plus every item written, cascaded or standalone.
  pub fn record_count(&self) -> usize {
    let cascaded: usize = self.orders.iter().map(|o| o.order_items.len()).sum();
    self.orders.len() + cascaded + self.order_items.len()
  }
}

#[async_trait]
pub trait Session: Send {
  /// Stages a record for the next commit. Nothing is written yet.
  fn add(&mut self, record: Record);

  /// Flushes every staged record in a single transaction.
  ///
  /// Assigns missing identifiers, cascades an order's attached items, and fails
  /// on constraint violations. On failure nothing from this batch is visible
  /// and the staged set is discarded.
  async fn commit(&mut self) -> UowResult<CommitReceipt>;

  /// Discards staged records without writing them.
  fn rollback(&mut self);

  fn staged_len(&self) -> usize;
}
