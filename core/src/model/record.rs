// order_uow/src/model/record.rs

use super::{Order, OrderItem};

/// Anything a `Session` can stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
  Order(Order),
  OrderItem(OrderItem),
}

impl Record {
  pub fn table(&self) -> &'static str {
    match self {
      Record::Order(_) => Order::TABLE,
      Record::OrderItem(_) => OrderItem::TABLE,
    }
  }
}

impl From<Order> for Record {
  fn from(order: Order) -> Self {
    Record::Order(order)
  }
}

impl From<OrderItem> for Record {
  fn from(item: OrderItem) -> Self {
    Record::OrderItem(item)
  }
}
