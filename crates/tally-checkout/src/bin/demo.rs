//! Scripted end-to-end checkout against the simulated gateway.
//!
//! Runs the full flow on an in-memory store: sign-in, ring up items,
//! commit a cash sale, print the receipt, then take the gateway down and
//! show the offline capture path.
//!
//! ```sh
//! cargo run -p tally-checkout --bin demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tally_checkout::{
    CheckoutConfig, CheckoutProcessor, RefreshWorker, SimulatedGateway, SubmitOutcome, Tender,
    TracingNotifier,
};
use tally_core::Actor;
use tally_store::{Store, StoreConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = CheckoutConfig::load()?;
    let receipt_width = config.receipt_width;

    let store = Store::new(StoreConfig::in_memory()).await?;
    let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
    let processor = Arc::new(
        CheckoutProcessor::new(
            config,
            store.clone(),
            Arc::clone(&gateway),
            Arc::new(TracingNotifier),
        )
        .await?,
    );
    info!(terminal = %processor.terminal(), "Engine ready");

    // Background refresh: catalog + daily totals
    let (worker, refresh) = RefreshWorker::new(
        Arc::clone(&gateway),
        processor.catalog(),
        store.daily_sales(),
        Duration::from_secs(30),
    );
    let worker_task = tokio::spawn(worker.run());

    // Wait for the initial catalog load
    while processor.catalog().is_empty() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    processor
        .login(
            Actor {
                tenant: "store-001".to_string(),
                user: "amina".to_string(),
                role: "cashier".to_string(),
            },
            "Amina",
        )
        .await?;

    // Ring up 2 × Olive Oil and 1 × Espresso Beans (by barcode)
    let oil = processor.catalog().find("p-olive-oil").expect("demo product");
    processor.add_to_cart(&oil)?;
    processor.update_quantity(&oil, 1)?;
    processor.add_by_barcode("6001000000024").await?;

    let totals = processor.totals();
    info!(
        subtotal = totals.subtotal_cents,
        tax = totals.tax_cents,
        total = totals.total_cents,
        "Cart ready"
    );

    // Cash sale with change
    match processor.submit(Tender::cash(totals.total_cents + 2_000)).await {
        SubmitOutcome::Committed(txn) => {
            println!("{}", processor.receipt(&txn).render_text(receipt_width));
            println!("{}", serde_json::to_string_pretty(&txn)?);
        }
        other => info!(?other, "Unexpected outcome"),
    }

    // Take the gateway down: the next sale is captured offline
    gateway.fail_next_commits(u32::MAX);
    let oil = processor.catalog().find("p-olive-oil").expect("demo product");
    processor.add_to_cart(&oil)?;
    let total = processor.totals().total_cents;
    match processor.submit(Tender::cash(total)).await {
        SubmitOutcome::Offline(txn) => {
            println!("{}", processor.receipt(&txn).render_text(receipt_width));
        }
        other => info!(?other, "Unexpected outcome"),
    }
    info!(
        queued = store.offline_queue().count().await?,
        "Offline queue after outage"
    );

    processor
        .audit()
        .security("Demo run finished; no voids attempted")
        .await;
    processor.logout().await?;

    info!(
        audit_entries = store.audit_log().count().await?,
        "Audit trail written"
    );

    refresh.shutdown().await;
    worker_task.await?;
    Ok(())
}
