// order_uow/src/model/order_item.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
  pub id: Option<Uuid>,
  /// Required once persisted. Left empty while the item is attached to an unsaved order.
  pub order_id: Option<Uuid>,
  pub product_id: Uuid,
  pub quantity: i32,
  pub last_updated_at: DateTime<Utc>,
}

impl OrderItem {
  pub const TABLE: &'static str = "order_items";

  /// A detached item, meant to be attached to an `Order` before staging.
  pub fn new(product_id: Uuid, quantity: i32) -> Self {
    Self {
      id: None,
      order_id: None,
      product_id,
      quantity,
      last_updated_at: Utc::now(),
    }
  }

  pub fn for_order(order_id: Uuid, product_id: Uuid, quantity: i32) -> Self {
    Self {
      order_id: Some(order_id),
      ..Self::new(product_id, quantity)
    }
  }

  pub fn touch(&mut self, now: DateTime<Utc>) {
    self.last_updated_at = now;
  }
}
