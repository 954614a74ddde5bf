// order_uow/src/model/mod.rs

//! Plain record shapes. Relationships are expressed by owned collections and
//! optional foreign keys; the session fills in identifiers at commit.

pub mod order;
pub mod order_item;
pub mod record;

pub use order::Order;
pub use order_item::OrderItem;
pub use record::Record;
