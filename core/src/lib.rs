// src/lib.rs

//! order-uow: persisting an order and its line items two ways.
//!
//!  - `create_order_traditional` commits the order, then commits each item on its
//!    own. A failure midway leaves the order partially written.
//!  - `create_order_unit_of_work` assembles the full graph in memory and commits
//!    it once. The session cascades the items, so the write is all-or-nothing.
//!
//! Storage sits behind the `Session` trait (`add` + `commit`). `MemoryStore`
//! is a constraint-checking in-memory engine for tests and demos; the
//! `order_writer` app ships a Postgres session.

pub mod error;
pub mod input;
pub mod model;
pub mod session;
pub mod strategy;

// --- Re-exports for the Public API ---

pub use crate::error::{UowError, UowResult};
pub use crate::input::{OrderData, OrderItemData};
pub use crate::model::{Order, OrderItem, Record};
pub use crate::session::{CommitReceipt, MemorySession, MemoryStore, Session, StoreSnapshot};
pub use crate::strategy::{create_order_traditional, create_order_unit_of_work, ParseStrategyError, WriteStrategy};

/*
    Typical use:
    1. Open a session on your storage (`MemoryStore::session()` or a database-backed one).
    2. Build an `OrderData` (or deserialize one with `OrderData::from_json`).
    3. Call `create_order_unit_of_work(&mut session, &data).await?` and keep the returned id.
*/
