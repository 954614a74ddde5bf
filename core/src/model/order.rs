// order_uow/src/model/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::OrderItem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  /// Assigned by the session at commit when left empty.
  pub id: Option<Uuid>,
  pub user_id: Uuid,
  pub last_updated_at: DateTime<Utc>,
  /// Owned line items. Staging the order cascades to these on commit.
  pub order_items: Vec<OrderItem>,
}

impl Order {
  pub const TABLE: &'static str = "orders";

  pub fn new(user_id: Uuid) -> Self {
    Self {
      id: None,
      user_id,
      last_updated_at: Utc::now(),
      order_items: Vec::new(),
    }
  }

  pub fn with_items(user_id: Uuid, order_items: Vec<OrderItem>) -> Self {
    Self {
      order_items,
      ..Self::new(user_id)
    }
  }

  pub fn attach(&mut self, item: OrderItem) {
    self.order_items.push(item);
  }

  /// Refreshes `last_updated_at` on the order and every attached item.
  pub fn touch(&mut self, now: DateTime<Utc>) {
    self.last_updated_at = now;
    for item in &mut self.order_items {
      item.touch(now);
    }
  }
}
