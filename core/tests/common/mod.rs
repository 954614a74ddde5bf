// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use async_trait::async_trait;
use order_uow::{
  CommitReceipt, MemorySession, MemoryStore, OrderData, OrderItemData, Record, Session, StoreSnapshot, UowResult,
};
use std::sync::Arc;
use tracing::Level;
use uuid::Uuid;

// --- Fixtures ---
pub const SAMPLE_USER_ID: &str = "d1e20a44-b5cf-4d34-b9cd-4ee3d6c23f59";
pub const SAMPLE_PRODUCT_A: &str = "179d74ab-d2cd-4eef-a6c0-526d5c1606cc";
pub const SAMPLE_PRODUCT_B: &str = "3dc761d2-a3db-4672-a1a9-e002635afe70";

/// A store that already knows the sample user and products.
pub fn seeded_store() -> Arc<MemoryStore> {
  let store = MemoryStore::shared();
  store.seed_from(&OrderData::sample());
  store
}

/// An order of `n` items against freshly registered products, quantities 1..=n.
pub fn order_with_n_items(store: &MemoryStore, n: usize) -> OrderData {
  let user_id = Uuid::new_v4();
  store.register_user(user_id);
  let items = (1..=n)
    .map(|q| {
      let product_id = Uuid::new_v4();
      store.register_product(product_id);
      OrderItemData::new(product_id.to_string(), q as i32)
    })
    .collect();
  OrderData::new(user_id.to_string(), items)
}

pub fn fixture_id(s: &str) -> Uuid {
  Uuid::parse_str(s).expect("fixture uuid")
}

/// Shape of a committed graph, independent of generated ids and timestamps:
/// per order, the sorted (product, quantity) pairs of its items.
pub fn graph_shape(snapshot: &StoreSnapshot) -> Vec<(Uuid, Vec<(Uuid, i32)>)> {
  let mut shape: Vec<_> = snapshot
    .orders
    .iter()
    .map(|o| {
      let mut items: Vec<_> = o.order_items.iter().map(|i| (i.product_id, i.quantity)).collect();
      items.sort();
      (o.user_id, items)
    })
    .collect();
  shape.sort();
  shape
}

// --- Session wrapper that takes a snapshot after every commit attempt ---
pub struct ObservingSession {
  inner: MemorySession,
  pub observed: Vec<StoreSnapshot>,
}

impl ObservingSession {
  pub fn new(store: &Arc<MemoryStore>) -> Self {
    Self {
      inner: store.session(),
      observed: Vec::new(),
    }
  }
}

#[async_trait]
impl Session for ObservingSession {
  fn add(&mut self, record: Record) {
    self.inner.add(record);
  }

  async fn commit(&mut self) -> UowResult<CommitReceipt> {
    let result = self.inner.commit().await;
    self.observed.push(self.inner.store().snapshot());
    result
  }

  fn rollback(&mut self) {
    self.inner.rollback();
  }

  fn staged_len(&self) -> usize {
    self.inner.staged_len()
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
