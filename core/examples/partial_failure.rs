// order_uow/examples/partial_failure.rs

use order_uow::{MemoryStore, OrderData, WriteStrategy};
use tracing::{error, info};

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Partial Failure Example ---");

  // Same failure for both strategies: the second item cannot be written.
  for strategy in [WriteStrategy::Traditional, WriteStrategy::UnitOfWork] {
    info!("\nStrategy: {}", strategy);
    run_with_second_item_failing(strategy).await;
  }
}

async fn run_with_second_item_failing(strategy: WriteStrategy) {
  let data = OrderData::sample();
  let store = MemoryStore::shared();
  store.seed_from(&data);
  store.fail_item_write(2);

  let mut session = store.session();
  match strategy.run(&mut session, &data).await {
    Ok(order_id) => info!("Unexpected success, order {}", order_id),
    Err(e) => error!("Write failed as intended: {}", e),
  }

  let snapshot = store.snapshot();
  info!(
    "Left behind: {} order(s), {} item(s) across {} successful commit(s)",
    snapshot.order_count(),
    snapshot.item_count(),
    store.commit_count()
  );
}
