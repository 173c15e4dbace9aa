//! taskstore demo
//!
//! Drives a [`TaskStore`] against the in-memory task service on a tokio
//! runtime and prints the final snapshot as JSON.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Logging level (default: `taskstore=debug,taskstore_demo=info`)
//! - `TASK_STORE_REFRESH_INTERVAL_MS`: periodic refresh interval (default: off)
//! - `TASK_STORE_WARM_ON_START`: warm both partitions on start (default: `true`)
//! - `TASK_SERVICE_FAILURE_RATE`, `TASK_SERVICE_DELAY_MIN_MS`,
//!   `TASK_SERVICE_DELAY_MAX_MS`, `TASK_SERVICE_TIMEOUT_RATE`,
//!   `TASK_SERVICE_TIMEOUT_MS`, `TASK_SERVICE_SEED`: fail injection for the
//!   in-memory service (default: off)

use std::sync::Arc;
use std::time::Duration;

use taskstore::prelude::*;
use taskstore::service::FailInjectionConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upper bound on how long the demo waits for background work to settle.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

fn main() {
    dotenvy::dotenv().ok();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");
    runtime.block_on(async_main());
}

async fn async_main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskstore=debug,taskstore_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match StoreConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "Configuration error");
            std::process::exit(1);
        }
    };
    let fail_injection = match FailInjectionConfig::from_env("TASK_SERVICE") {
        Ok(fail_injection) => fail_injection,
        Err(error) => {
            tracing::error!(%error, "Fail injection configuration error");
            std::process::exit(1);
        }
    };
    tracing::info!(
        refresh_interval = ?config.refresh_interval,
        warm_on_start = config.warm_on_start,
        fail_injection = fail_injection.is_enabled(),
        "Configuration loaded"
    );

    let service = InMemoryTaskService::with_fail_injection(fail_injection);
    service.seed("Water the plants", false);
    service.seed("File expense report", true);
    service.seed("Book dentist appointment", false);

    let observer = CallbackObserver::new(
        || tracing::trace!("view refresh"),
        |message: &str| tracing::info!(message, "Toast"),
    );
    let store = TaskStore::new(
        Arc::new(service.clone()),
        Arc::new(observer),
        Arc::new(TokioScheduler::current()),
    );

    let _auto_refresh = store.start(&config);
    settle(&store).await;

    match store.create_task("Call the landlord") {
        Ok(placeholder) => tracing::info!(%placeholder, "Created"),
        Err(error) => tracing::warn!(%error, "Create rejected"),
    }
    if let Err(error) = store.create_task("   ") {
        tracing::info!(%error, "Empty title rejected as expected");
    }
    settle(&store).await;

    let pending = store.tasks(Partition::Pending);
    if let Some(first) = pending.first() {
        store.toggle_completed(first.id, true);
    }
    if let Some(last) = pending.last() {
        let renamed = format!("{} (urgent)", last.subject);
        if let Err(error) = store.update_subject(last.id, &renamed) {
            tracing::warn!(%error, "Rename rejected");
        }
    }
    if let Some(done) = store.tasks(Partition::Completed).last() {
        store.delete_task(done.id);
    }
    settle(&store).await;

    store.refresh_partition(Partition::Pending);
    settle(&store).await;

    let snapshot = store.snapshot();
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{json}"),
        Err(error) => tracing::error!(%error, "Failed to serialize snapshot"),
    }
    tracing::info!(
        stored_pending = service.stored(Partition::Pending).len(),
        stored_completed = service.stored(Partition::Completed).len(),
        calls = service.calls().len(),
        "Done"
    );
}

/// Waits until no mutation or refresh is in flight.
async fn settle(store: &TaskStore) {
    let waited = tokio::time::timeout(SETTLE_TIMEOUT, async {
        loop {
            let snapshot = store.snapshot();
            if snapshot.pending_ids.is_empty()
                && !snapshot.refreshing_pending
                && !snapshot.refreshing_completed
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    if waited.is_err() {
        tracing::warn!("Background work did not settle in time");
    }
}
