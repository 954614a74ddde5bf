// order_writer/src/db/pg_session.rs

use std::mem;

use async_trait::async_trait;
use order_uow::{CommitReceipt, Order, OrderItem, Record, Session, UowError, UowResult};
use sqlx::error::ErrorKind;
use sqlx::postgres::PgDatabaseError;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, instrument};
use uuid::Uuid;

/// A `Session` that writes each commit in one Postgres transaction.
///
/// Staged records stay in memory until `commit`; if any insert fails the
/// transaction is dropped, which rolls it back.
#[derive(Debug, Clone)]
pub struct PgSession {
  pool: PgPool,
  staged: Vec<Record>,
}

/// The row an insert was writing, for naming the violated column and value.
#[derive(Debug, Clone, Copy)]
enum RowRef<'a> {
  Order(&'a Order),
  Item(&'a OrderItem),
}

impl PgSession {
  pub fn new(pool: PgPool) -> Self {
    Self {
      pool,
      staged: Vec::new(),
    }
  }
}

#[async_trait]
impl Session for PgSession {
  fn add(&mut self, record: Record) {
    debug!(table = record.table(), "Staged record.");
    self.staged.push(record);
  }

  #[instrument(name = "PgSession::commit", skip(self), fields(staged = self.staged.len()), err(Display))]
  async fn commit(&mut self) -> UowResult<CommitReceipt> {
    let staged = mem::take(&mut self.staged);
    let mut tx = self.pool.begin().await.map_err(storage_error)?;
    let mut receipt = CommitReceipt::default();

    for record in staged {
      match record {
        Record::Order(mut order) => {
          let order_id = *order.id.get_or_insert_with(Uuid::new_v4);
          insert_order(&mut tx, &order).await?;
          for item in &mut order.order_items {
            item.id.get_or_insert_with(Uuid::new_v4);
            item.order_id = Some(order_id);
            insert_item(&mut tx, item).await?;
          }
          receipt.orders.push(order);
        }
        Record::OrderItem(mut item) => {
          item.id.get_or_insert_with(Uuid::new_v4);
          insert_item(&mut tx, &item).await?;
          receipt.order_items.push(item);
        }
      }
    }

    tx.commit().await.map_err(storage_error)?;
    debug!(records = receipt.record_count(), "Transaction committed.");
    Ok(receipt)
  }

  fn rollback(&mut self) {
    self.staged.clear();
  }

  fn staged_len(&self) -> usize {
    self.staged.len()
  }
}

async fn insert_order(conn: &mut PgConnection, order: &Order) -> UowResult<()> {
  sqlx::query("INSERT INTO orders (id, user_id, last_updated_at) VALUES ($1, $2, $3)")
    .bind(order.id)
    .bind(order.user_id)
    .bind(order.last_updated_at)
    .execute(conn)
    .await
    .map_err(|e| classify(e, RowRef::Order(order)))?;
  Ok(())
}

async fn insert_item(conn: &mut PgConnection, item: &OrderItem) -> UowResult<()> {
  sqlx::query(
    "INSERT INTO order_items (id, order_id, product_id, quantity, last_updated_at) VALUES ($1, $2, $3, $4, $5)",
  )
  .bind(item.id)
  .bind(item.order_id)
  .bind(item.product_id)
  .bind(item.quantity)
  .bind(item.last_updated_at)
  .execute(conn)
  .await
  .map_err(|e| classify(e, RowRef::Item(item)))?;
  Ok(())
}

fn storage_error(err: sqlx::Error) -> UowError {
  UowError::Storage { source: err.into() }
}

/// Maps a constraint name from schema.sql to its column.
fn fk_column(constraint: &str) -> Option<&'static str> {
  match constraint {
    "orders_user_id_fkey" => Some("user_id"),
    "order_items_order_id_fkey" => Some("order_id"),
    "order_items_product_id_fkey" => Some("product_id"),
    _ => None,
  }
}

fn static_column(column: &str) -> &'static str {
  match column {
    "id" => "id",
    "user_id" => "user_id",
    "order_id" => "order_id",
    "product_id" => "product_id",
    "quantity" => "quantity",
    "last_updated_at" => "last_updated_at",
    _ => "unknown",
  }
}

/// Translates Postgres constraint failures into the same taxonomy the memory store uses.
fn classify(err: sqlx::Error, row: RowRef<'_>) -> UowError {
  let (table, id) = match row {
    RowRef::Order(order) => (Order::TABLE, order.id),
    RowRef::Item(item) => (OrderItem::TABLE, item.id),
  };

  let sqlx::Error::Database(db_err) = &err else {
    return storage_error(err);
  };

  match db_err.kind() {
    ErrorKind::ForeignKeyViolation => {
      let Some(column) = db_err.constraint().and_then(fk_column) else {
        return storage_error(err);
      };
      let value = match (row, column) {
        (RowRef::Order(order), _) => order.user_id,
        (RowRef::Item(item), "product_id") => item.product_id,
        (RowRef::Item(item), _) => item.order_id.unwrap_or_default(),
      };
      UowError::ForeignKeyViolation { table, column, value }
    }
    ErrorKind::NotNullViolation => {
      let column = db_err
        .try_downcast_ref::<PgDatabaseError>()
        .and_then(|pg| pg.column())
        .map(static_column)
        .unwrap_or("unknown");
      UowError::NotNullViolation { table, column }
    }
    ErrorKind::UniqueViolation => UowError::UniqueViolation {
      table,
      id: id.unwrap_or_default(),
    },
    _ => storage_error(err),
  }
}
