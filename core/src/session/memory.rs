// order_uow/src/session/memory.rs

//! An in-memory storage engine with the constraint behavior of the Postgres
//! schema: NOT NULL parent keys, foreign keys to users/products/orders, and
//! restricted deletion. Each commit is validated as a whole and applied under
//! one write lock, so readers never see half a transaction.

use std::collections::HashSet;
use std::mem;
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{CommitReceipt, Session};
use crate::error::{UowError, UowResult};
use crate::input::OrderData;
use crate::model::{Order, OrderItem, Record};

pub const USERS_TABLE: &str = "users";
pub const PRODUCTS_TABLE: &str = "products";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
  /// Fail the n-th commit attempt (1-based).
  CommitNumber(usize),
  /// Fail the commit that attempts the n-th item write (1-based, counted across commits).
  ItemWrite(usize),
}

/// Read-only copy of committed state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
  /// Committed orders, each with the items that reference it.
  pub orders: Vec<Order>,
  pub order_items: Vec<OrderItem>,
}

impl StoreSnapshot {
  pub fn is_empty(&self) -> bool {
    self.orders.is_empty() && self.order_items.is_empty()
  }

  pub fn order_count(&self) -> usize {
    self.orders.len()
  }

  pub fn item_count(&self) -> usize {
    self.order_items.len()
  }
}

#[derive(Debug, Default)]
struct StoreState {
  users: HashSet<Uuid>,
  products: HashSet<Uuid>,
  // Rows are kept with an empty `order_items`; reads assemble the collection.
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
  order_ids: HashSet<Uuid>,
  item_ids: HashSet<Uuid>,
  commits_attempted: usize,
  commits_applied: usize,
  item_writes_attempted: usize,
  faults: Vec<Fault>,
}

/// A staged batch after identifier assignment and cascade.
struct PreparedBatch {
  orders: Vec<Order>,
  standalone_items: Vec<OrderItem>,
}

impl PreparedBatch {
  fn prepare(records: Vec<Record>) -> Self {
    let mut orders = Vec::new();
    let mut standalone_items = Vec::new();
    for record in records {
      match record {
        Record::Order(mut order) => {
          let order_id = *order.id.get_or_insert_with(Uuid::new_v4);
          for item in &mut order.order_items {
            item.id.get_or_insert_with(Uuid::new_v4);
            item.order_id = Some(order_id);
          }
          orders.push(order);
        }
        Record::OrderItem(mut item) => {
          item.id.get_or_insert_with(Uuid::new_v4);
          standalone_items.push(item);
        }
      }
    }
    Self { orders, standalone_items }
  }

  fn items(&self) -> impl Iterator<Item = &OrderItem> {
    self
      .orders
      .iter()
      .flat_map(|o| o.order_items.iter())
      .chain(self.standalone_items.iter())
  }
}

impl StoreState {
  fn has_order(&self, id: Uuid) -> bool {
    self.order_ids.contains(&id)
  }

  fn has_item(&self, id: Uuid) -> bool {
    self.item_ids.contains(&id)
  }

  fn assemble(&self, order: &Order) -> Order {
    let mut assembled = order.clone();
    assembled.order_items = self
      .order_items
      .iter()
      .filter(|i| i.order_id.is_some() && i.order_id == order.id)
      .cloned()
      .collect();
    assembled
  }

  fn check_fault(&self, fault: Fault) -> UowResult<()> {
    if self.faults.contains(&fault) {
      return Err(UowError::Storage {
        source: anyhow!("injected storage failure ({:?})", fault),
      });
    }
    Ok(())
  }

  fn validate(&mut self, batch: &PreparedBatch) -> UowResult<()> {
    let mut batch_order_ids = HashSet::new();
    for order in &batch.orders {
      let id = order.id.ok_or(UowError::NotNullViolation {
        table: Order::TABLE,
        column: "id",
      })?;
      if self.has_order(id) || !batch_order_ids.insert(id) {
        return Err(UowError::UniqueViolation { table: Order::TABLE, id });
      }
      if !self.users.contains(&order.user_id) {
        return Err(UowError::ForeignKeyViolation {
          table: Order::TABLE,
          column: "user_id",
          value: order.user_id,
        });
      }
    }

    let mut batch_item_ids = HashSet::new();
    for item in batch.items() {
      self.item_writes_attempted += 1;
      self.check_fault(Fault::ItemWrite(self.item_writes_attempted))?;

      let id = item.id.ok_or(UowError::NotNullViolation {
        table: OrderItem::TABLE,
        column: "id",
      })?;
      if self.has_item(id) || !batch_item_ids.insert(id) {
        return Err(UowError::UniqueViolation { table: OrderItem::TABLE, id });
      }
      let order_id = item.order_id.ok_or(UowError::NotNullViolation {
        table: OrderItem::TABLE,
        column: "order_id",
      })?;
      if !batch_order_ids.contains(&order_id) && !self.has_order(order_id) {
        return Err(UowError::ForeignKeyViolation {
          table: OrderItem::TABLE,
          column: "order_id",
          value: order_id,
        });
      }
      if !self.products.contains(&item.product_id) {
        return Err(UowError::ForeignKeyViolation {
          table: OrderItem::TABLE,
          column: "product_id",
          value: item.product_id,
        });
      }
    }
    Ok(())
  }

  fn insert(&mut self, batch: &PreparedBatch) {
    for order in &batch.orders {
      let mut row = order.clone();
      row.order_items.clear();
      self.order_ids.extend(row.id);
      self.orders.push(row);
    }
    for item in batch.items() {
      self.item_ids.extend(item.id);
      self.order_items.push(item.clone());
    }
    self.commits_applied += 1;
  }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
  state: RwLock<StoreState>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn shared() -> Arc<Self> {
    Arc::new(Self::new())
  }

  pub fn session(self: &Arc<Self>) -> MemorySession {
    MemorySession::new(Arc::clone(self))
  }

  pub fn register_user(&self, id: Uuid) {
    self.state.write().users.insert(id);
  }

  pub fn register_product(&self, id: Uuid) {
    self.state.write().products.insert(id);
  }

  /// Registers the user and products an input document refers to. Unparseable
  /// identifiers are skipped; the strategies report them.
  pub fn seed_from(&self, data: &OrderData) {
    if let Ok(user_id) = data.require_user_id() {
      self.register_user(user_id);
    }
    for item in &data.order_items {
      if let Ok(product_id) = item.require_product_id() {
        self.register_product(product_id);
      }
    }
  }

  /// Makes the n-th commit attempt (1-based) fail with a storage error.
  pub fn fail_commit_number(&self, n: usize) {
    self.state.write().faults.push(Fault::CommitNumber(n));
  }

  /// Makes whichever commit attempts the n-th item write (1-based) fail.
  pub fn fail_item_write(&self, n: usize) {
    self.state.write().faults.push(Fault::ItemWrite(n));
  }

  pub fn clear_faults(&self) {
    self.state.write().faults.clear();
  }

  /// Successful commits so far.
  pub fn commit_count(&self) -> usize {
    self.state.read().commits_applied
  }

  pub fn commits_attempted(&self) -> usize {
    self.state.read().commits_attempted
  }

  pub fn snapshot(&self) -> StoreSnapshot {
    let state = self.state.read();
    StoreSnapshot {
      orders: state.orders.iter().map(|o| state.assemble(o)).collect(),
      order_items: state.order_items.clone(),
    }
  }

  pub fn order_with_items(&self, id: Uuid) -> Option<Order> {
    let state = self.state.read();
    state.orders.iter().find(|o| o.id == Some(id)).map(|o| state.assemble(o))
  }

  /// Applies one transaction. All-or-nothing.
  fn apply(&self, records: Vec<Record>) -> UowResult<CommitReceipt> {
    let mut state = self.state.write();
    state.commits_attempted += 1;
    let commit_number = state.commits_attempted;
    state.check_fault(Fault::CommitNumber(commit_number))?;

    let batch = PreparedBatch::prepare(records);
    if let Err(e) = state.validate(&batch) {
      warn!(commit_number, error = %e, "Transaction rejected; nothing written.");
      return Err(e);
    }
    state.insert(&batch);
    debug!(
      commit_number,
      orders = batch.orders.len(),
      standalone_items = batch.standalone_items.len(),
      "Transaction applied."
    );

    Ok(CommitReceipt {
      orders: batch.orders,
      order_items: batch.standalone_items,
    })
  }

  pub fn delete_order(&self, id: Uuid) -> UowResult<bool> {
    let mut state = self.state.write();
    let dependents = state.order_items.iter().filter(|i| i.order_id == Some(id)).count();
    if dependents > 0 {
      return Err(UowError::RestrictedDelete {
        table: Order::TABLE,
        id,
        dependents,
      });
    }
    state.orders.retain(|o| o.id != Some(id));
    Ok(state.order_ids.remove(&id))
  }

  pub fn delete_order_item(&self, id: Uuid) -> UowResult<bool> {
    let mut state = self.state.write();
    state.order_items.retain(|i| i.id != Some(id));
    Ok(state.item_ids.remove(&id))
  }

  pub fn delete_user(&self, id: Uuid) -> UowResult<bool> {
    let mut state = self.state.write();
    let dependents = state.orders.iter().filter(|o| o.user_id == id).count();
    if dependents > 0 {
      return Err(UowError::RestrictedDelete {
        table: USERS_TABLE,
        id,
        dependents,
      });
    }
    Ok(state.users.remove(&id))
  }

  pub fn delete_product(&self, id: Uuid) -> UowResult<bool> {
    let mut state = self.state.write();
    let dependents = state.order_items.iter().filter(|i| i.product_id == id).count();
    if dependents > 0 {
      return Err(UowError::RestrictedDelete {
        table: PRODUCTS_TABLE,
        id,
        dependents,
      });
    }
    Ok(state.products.remove(&id))
  }
}

/// A `Session` over a shared `MemoryStore`.
#[derive(Debug)]
pub struct MemorySession {
  store: Arc<MemoryStore>,
  staged: Vec<Record>,
}

impl MemorySession {
  pub fn new(store: Arc<MemoryStore>) -> Self {
    Self {
      store,
      staged: Vec::new(),
    }
  }

  pub fn store(&self) -> &Arc<MemoryStore> {
    &self.store
  }
}

#[async_trait]
impl Session for MemorySession {
  fn add(&mut self, record: Record) {
    debug!(table = record.table(), "Staged record.");
    self.staged.push(record);
  }

  #[instrument(name = "MemorySession::commit", skip(self), fields(staged = self.staged.len()), err(Display))]
  async fn commit(&mut self) -> UowResult<CommitReceipt> {
    let batch = mem::take(&mut self.staged);
    self.store.apply(batch)
  }

  fn rollback(&mut self) {
    if !self.staged.is_empty() {
      debug!(discarded = self.staged.len(), "Rolling back staged records.");
    }
    self.staged.clear();
  }

  fn staged_len(&self) -> usize {
    self.staged.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn seeded_store() -> (Arc<MemoryStore>, Uuid, Uuid) {
    let store = MemoryStore::shared();
    let user = Uuid::new_v4();
    let product = Uuid::new_v4();
    store.register_user(user);
    store.register_product(product);
    (store, user, product)
  }

  #[test]
  fn cascade_assigns_ids_and_parent_keys() {
    let (store, user, product) = seeded_store();
    let order = Order::with_items(user, vec![OrderItem::new(product, 1), OrderItem::new(product, 2)]);
    let receipt = store.apply(vec![order.into()]).expect("commit should succeed");

    let order_id = receipt.first_order_id().expect("order id assigned");
    assert_eq!(receipt.record_count(), 3);
    for item in &receipt.orders[0].order_items {
      assert!(item.id.is_some());
      assert_eq!(item.order_id, Some(order_id));
    }
    let stored = store.order_with_items(order_id).expect("order persisted");
    assert_eq!(stored.order_items.len(), 2);
  }

  #[test]
  fn detached_item_violates_not_null() {
    let (store, _user, product) = seeded_store();
    let err = store.apply(vec![OrderItem::new(product, 1).into()]).unwrap_err();
    assert!(matches!(
      err,
      UowError::NotNullViolation { table: "order_items", column: "order_id" }
    ));
    assert!(store.snapshot().is_empty());
  }

  #[test]
  fn bad_item_rejects_whole_batch() {
    let (store, user, product) = seeded_store();
    let unknown_product = Uuid::new_v4();
    let order = Order::with_items(user, vec![OrderItem::new(product, 1), OrderItem::new(unknown_product, 1)]);
    let err = store.apply(vec![order.into()]).unwrap_err();
    match err {
      UowError::ForeignKeyViolation { column, value, .. } => {
        assert_eq!(column, "product_id");
        assert_eq!(value, unknown_product);
      }
      other => panic!("Expected ForeignKeyViolation, got {:?}", other),
    }
    assert!(store.snapshot().is_empty());
    assert_eq!(store.commit_count(), 0);
    assert_eq!(store.commits_attempted(), 1);
  }

  #[test]
  fn unknown_user_is_rejected() {
    let store = MemoryStore::shared();
    let err = store.apply(vec![Order::new(Uuid::new_v4()).into()]).unwrap_err();
    assert!(matches!(err, UowError::ForeignKeyViolation { column: "user_id", .. }));
  }

  #[test]
  fn duplicate_order_id_is_rejected() {
    let (store, user, _product) = seeded_store();
    let mut order = Order::new(user);
    order.id = Some(Uuid::new_v4());
    store.apply(vec![order.clone().into()]).expect("first insert");
    let err = store.apply(vec![order.into()]).unwrap_err();
    assert!(matches!(err, UowError::UniqueViolation { table: "orders", .. }));
    assert_eq!(store.snapshot().order_count(), 1);
  }

  #[test]
  fn restricted_deletes() {
    let (store, user, product) = seeded_store();
    let receipt = store
      .apply(vec![Order::with_items(user, vec![OrderItem::new(product, 3)]).into()])
      .expect("commit");
    let order_id = receipt.first_order_id().expect("order id");
    let item_id = receipt.orders[0].order_items[0].id.expect("item id");

    assert!(matches!(
      store.delete_user(user),
      Err(UowError::RestrictedDelete { table: "users", dependents: 1, .. })
    ));
    assert!(matches!(
      store.delete_product(product),
      Err(UowError::RestrictedDelete { table: "products", .. })
    ));
    assert!(matches!(
      store.delete_order(order_id),
      Err(UowError::RestrictedDelete { table: "orders", .. })
    ));

    assert!(store.delete_order_item(item_id).unwrap());
    assert!(store.delete_order(order_id).unwrap());
    assert!(store.delete_product(product).unwrap());
    assert!(store.delete_user(user).unwrap());
    assert!(store.snapshot().is_empty());
  }

  #[test]
  fn injected_commit_failure_only_hits_that_commit() {
    let (store, user, _product) = seeded_store();
    store.fail_commit_number(2);
    assert!(store.apply(vec![Order::new(user).into()]).is_ok());
    assert!(matches!(
      store.apply(vec![Order::new(user).into()]),
      Err(UowError::Storage { .. })
    ));
    assert!(store.apply(vec![Order::new(user).into()]).is_ok());
    assert_eq!(store.snapshot().order_count(), 2);
  }

  #[tokio::test]
  async fn session_rollback_discards_staged() {
    let (store, user, _product) = seeded_store();
    let mut session = store.session();
    session.add(Order::new(user).into());
    assert_eq!(session.staged_len(), 1);
    session.rollback();
    assert_eq!(session.staged_len(), 0);
    let receipt = session.commit().await.expect("empty commit");
    assert!(receipt.is_empty());
    assert!(store.snapshot().is_empty());
  }

  #[tokio::test]
  async fn failed_commit_clears_staged_set() {
    let (store, _user, _product) = seeded_store();
    let mut session = store.session();
    session.add(Order::new(Uuid::new_v4()).into());
    assert!(session.commit().await.is_err());
    assert_eq!(session.staged_len(), 0);
  }
}
