// order_uow/src/strategy/mod.rs

//! The two ways of writing an order graph.

pub mod traditional;
pub mod unit_of_work;

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use thiserror::Error;
use uuid::Uuid;

use crate::error::{UowError, UowResult};
use crate::input::OrderData;
use crate::session::{CommitReceipt, Session};

pub use traditional::create_order_traditional;
pub use unit_of_work::create_order_unit_of_work;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteStrategy {
  /// One commit for the order, then one per item.
  Traditional,
  /// One commit for the order and all of its items.
  #[default]
  UnitOfWork,
}

impl WriteStrategy {
  pub async fn run<S>(self, session: &mut S, data: &OrderData) -> UowResult<Uuid>
  where
    S: Session + ?Sized,
  {
    match self {
      WriteStrategy::Traditional => create_order_traditional(session, data).await,
      WriteStrategy::UnitOfWork => create_order_unit_of_work(session, data).await,
    }
  }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown write strategy '{0}' (expected 'traditional' or 'unit_of_work')")]
pub struct ParseStrategyError(pub String);

impl FromStr for WriteStrategy {
  type Err = ParseStrategyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "traditional" => Ok(WriteStrategy::Traditional),
      "unit_of_work" | "unit-of-work" | "uow" => Ok(WriteStrategy::UnitOfWork),
      _ => Err(ParseStrategyError(s.to_string())),
    }
  }
}

impl fmt::Display for WriteStrategy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      WriteStrategy::Traditional => f.write_str("traditional"),
      WriteStrategy::UnitOfWork => f.write_str("unit_of_work"),
    }
  }
}

/// The session may have flushed records the caller staged earlier; the order
/// this call created must be among them.
fn ensure_committed(receipt: &CommitReceipt, order_id: Uuid) -> UowResult<()> {
  if receipt.order_ids().contains(&order_id) {
    return Ok(());
  }
  Err(UowError::Storage {
    source: anyhow!("commit receipt does not include order {}", order_id),
  })
}
