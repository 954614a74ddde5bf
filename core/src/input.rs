// order_uow/src/input.rs

//! The nested document both write strategies consume:
//! `{user_id, order_items: [{product_id, quantity}, ...]}`.
//!
//! Fields are optional at the serde level so that a missing value surfaces as
//! `UowError::MissingField` from the strategy, not as a parse failure.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{UowError, UowResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderData {
  #[serde(default)]
  pub user_id: Option<String>,
  #[serde(default)]
  pub order_items: Vec<OrderItemData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItemData {
  #[serde(default)]
  pub product_id: Option<String>,
  #[serde(default)]
  pub quantity: Option<i32>,
}

fn parse_id(field: &'static str, value: Option<&str>) -> UowResult<Uuid> {
  let value = value.ok_or(UowError::MissingField { field })?;
  Uuid::parse_str(value).map_err(|source| UowError::InvalidIdentifier {
    field,
    value: value.to_string(),
    source,
  })
}

impl OrderData {
  pub fn new(user_id: impl Into<String>, order_items: Vec<OrderItemData>) -> Self {
    Self {
      user_id: Some(user_id.into()),
      order_items,
    }
  }

  /// The two-item order used throughout the demo and tests.
  pub fn sample() -> Self {
    Self::new(
      "d1e20a44-b5cf-4d34-b9cd-4ee3d6c23f59",
      vec![
        OrderItemData::new("179d74ab-d2cd-4eef-a6c0-526d5c1606cc", 4),
        OrderItemData::new("3dc761d2-a3db-4672-a1a9-e002635afe70", 5),
      ],
    )
  }

  pub fn from_json(raw: &str) -> serde_json::Result<Self> {
    serde_json::from_str(raw)
  }

  pub fn require_user_id(&self) -> UowResult<Uuid> {
    parse_id("user_id", self.user_id.as_deref())
  }
}

impl OrderItemData {
  pub fn new(product_id: impl Into<String>, quantity: i32) -> Self {
    Self {
      product_id: Some(product_id.into()),
      quantity: Some(quantity),
    }
  }

  pub fn require_product_id(&self) -> UowResult<Uuid> {
    parse_id("product_id", self.product_id.as_deref())
  }

  pub fn require_quantity(&self) -> UowResult<i32> {
    self.quantity.ok_or(UowError::MissingField { field: "quantity" })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_document_without_user_id() {
    let data = OrderData::from_json(r#"{"order_items": [{"product_id": "179d74ab-d2cd-4eef-a6c0-526d5c1606cc", "quantity": 4}]}"#)
      .expect("document should parse");
    assert!(data.user_id.is_none());
    assert!(matches!(data.require_user_id(), Err(UowError::MissingField { field: "user_id" })));
    assert_eq!(data.order_items[0].require_quantity().unwrap(), 4);
  }

  #[test]
  fn rejects_malformed_identifier() {
    let data = OrderData::new("not-a-uuid", vec![]);
    match data.require_user_id() {
      Err(UowError::InvalidIdentifier { field, value, .. }) => {
        assert_eq!(field, "user_id");
        assert_eq!(value, "not-a-uuid");
      }
      other => panic!("Expected InvalidIdentifier, got {:?}", other),
    }
  }

  #[test]
  fn item_missing_quantity() {
    let item = OrderItemData {
      product_id: Some("179d74ab-d2cd-4eef-a6c0-526d5c1606cc".to_string()),
      quantity: None,
    };
    assert!(item.require_product_id().is_ok());
    assert!(matches!(item.require_quantity(), Err(UowError::MissingField { field: "quantity" })));
  }

  #[test]
  fn sample_matches_reference_document() {
    let sample = OrderData::sample();
    let quantities: Vec<_> = sample.order_items.iter().filter_map(|i| i.quantity).collect();
    assert_eq!(quantities, vec![4, 5]);
    assert!(sample.require_user_id().is_ok());
  }
}
