// order_writer/src/db/mod.rs

//! Postgres plumbing: schema bootstrap, reference-data seeding, read-back,
//! and the `Session` implementation in `pg_session`.

pub mod pg_session;

use chrono::{DateTime, Utc};
use order_uow::{Order, OrderData, OrderItem};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{info, instrument};
use uuid::Uuid;

pub use pg_session::PgSession;

const SCHEMA_SQL: &str = include_str!("../../schema.sql");

#[derive(Debug, FromRow)]
struct OrderRow {
  id: Uuid,
  user_id: Uuid,
  last_updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
  id: Uuid,
  order_id: Uuid,
  product_id: Uuid,
  quantity: i32,
  last_updated_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
  fn from(row: OrderItemRow) -> Self {
    OrderItem {
      id: Some(row.id),
      order_id: Some(row.order_id),
      product_id: row.product_id,
      quantity: row.quantity,
      last_updated_at: row.last_updated_at,
    }
  }
}

pub async fn connect(database_url: &str, max_connections: u32) -> sqlx::Result<PgPool> {
  PgPoolOptions::new()
    .max_connections(max_connections)
    .connect(database_url)
    .await
}

/// Creates the tables if they do not exist yet.
#[instrument(skip_all, err(Display))]
pub async fn bootstrap_schema(pool: &PgPool) -> sqlx::Result<()> {
  sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;
  info!("Schema is in place.");
  Ok(())
}

/// Inserts the user and products a document refers to, skipping rows that exist.
#[instrument(skip_all, err(Display))]
pub async fn seed_reference_data(pool: &PgPool, data: &OrderData) -> sqlx::Result<()> {
  let mut tx = pool.begin().await?;
  if let Ok(user_id) = data.require_user_id() {
    sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
      .bind(user_id)
      .execute(&mut *tx)
      .await?;
  }
  for item in &data.order_items {
    if let Ok(product_id) = item.require_product_id() {
      sqlx::query("INSERT INTO products (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
        .bind(product_id)
        .execute(&mut *tx)
        .await?;
    }
  }
  tx.commit().await?;
  info!(products = data.order_items.len(), "Reference data seeded.");
  Ok(())
}

/// Reads an order back together with every item whose `order_id` points at it.
pub async fn fetch_order_with_items(pool: &PgPool, order_id: Uuid) -> sqlx::Result<Option<Order>> {
  let row: Option<OrderRow> = sqlx::query_as("SELECT id, user_id, last_updated_at FROM orders WHERE id = $1")
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
  let Some(row) = row else {
    return Ok(None);
  };

  let items: Vec<OrderItemRow> = sqlx::query_as(
    "SELECT id, order_id, product_id, quantity, last_updated_at FROM order_items WHERE order_id = $1 ORDER BY quantity, id",
  )
  .bind(order_id)
  .fetch_all(pool)
  .await?;

  Ok(Some(Order {
    id: Some(row.id),
    user_id: row.user_id,
    last_updated_at: row.last_updated_at,
    order_items: items.into_iter().map(OrderItem::from).collect(),
  }))
}
