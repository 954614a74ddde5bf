// order_uow/src/strategy/traditional.rs

use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::UowResult;
use crate::input::{OrderData, OrderItemData};
use crate::model::{Order, OrderItem};
use crate::session::Session;

use super::ensure_committed;

/// Persists the order, then each item, one committed transaction at a time.
///
/// If an item fails, the order and every item before it stay committed. The
/// error is returned unchanged and nothing is undone.
#[instrument(name = "create_order_traditional", skip_all, fields(requested_items = data.order_items.len()), err(Display))]
pub async fn create_order_traditional<S>(session: &mut S, data: &OrderData) -> UowResult<Uuid>
where
  S: Session + ?Sized,
{
  let user_id = data.require_user_id()?;

  let order_id = Uuid::new_v4();
  let mut order = Order::new(user_id);
  order.id = Some(order_id);
  order.touch(Utc::now());
  session.add(order.into());
  let receipt = session.commit().await?;
  ensure_committed(&receipt, order_id)?;
  debug!(%order_id, "Order committed on its own.");

  for (committed_items, descriptor) in data.order_items.iter().enumerate() {
    if let Err(e) = commit_item(session, order_id, descriptor).await {
      warn!(
        %order_id,
        committed_items,
        requested_items = data.order_items.len(),
        error = %e,
        "Order left partially written."
      );
      return Err(e);
    }
  }

  info!(%order_id, items = data.order_items.len(), "Order created with one commit per row.");
  Ok(order_id)
}

async fn commit_item<S>(session: &mut S, order_id: Uuid, descriptor: &OrderItemData) -> UowResult<()>
where
  S: Session + ?Sized,
{
  let product_id = descriptor.require_product_id()?;
  let mut item = OrderItem::for_order(order_id, product_id, descriptor.require_quantity()?);
  item.touch(Utc::now());
  session.add(item.into());
  session.commit().await?;
  debug!(%order_id, %product_id, "Item committed.");
  Ok(())
}
