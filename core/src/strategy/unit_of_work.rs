// order_uow/src/strategy/unit_of_work.rs

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::UowResult;
use crate::input::OrderData;
use crate::model::{Order, OrderItem};
use crate::session::Session;

use super::ensure_committed;

/// Builds the whole order graph in memory and persists it with a single commit.
///
/// Every descriptor is checked before anything is staged. The session cascades
/// the order's items, so either the full graph is written or nothing is.
#[instrument(name = "create_order_unit_of_work", skip_all, fields(requested_items = data.order_items.len()), err(Display))]
pub async fn create_order_unit_of_work<S>(session: &mut S, data: &OrderData) -> UowResult<Uuid>
where
  S: Session + ?Sized,
{
  let user_id = data.require_user_id()?;
  let order_items = data
    .order_items
    .iter()
    .map(|d| Ok(OrderItem::new(d.require_product_id()?, d.require_quantity()?)))
    .collect::<UowResult<Vec<_>>>()?;

  let order_id = Uuid::new_v4();
  let mut order = Order::with_items(user_id, order_items);
  order.id = Some(order_id);
  order.touch(Utc::now());
  session.add(order.into());
  debug!(staged = session.staged_len(), "Order graph staged.");

  let receipt = session.commit().await?;
  ensure_committed(&receipt, order_id)?;

  info!(%order_id, records = receipt.record_count(), "Order created in a single unit of work.");
  Ok(order_id)
}
