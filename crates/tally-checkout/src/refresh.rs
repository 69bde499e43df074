//! # Background Refresh
//!
//! Periodically refreshes the catalog snapshot and the persisted daily
//! totals from the gateway.
//!
//! ## Refresh Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    RefreshWorker                                        │
//! │                                                                         │
//! │  loop {                                                                 │
//! │      select! {                                                          │
//! │          interval (~30s)  ──► refresh catalog + daily totals           │
//! │          refresh request  ──► same, on demand                          │
//! │          shutdown         ──► break                                    │
//! │      }                                                                  │
//! │  }                                                                      │
//! │                                                                         │
//! │  PURELY ADDITIVE: replaces the catalog snapshot and overwrites the     │
//! │  day's persisted totals. Never touches an in-progress cart or          │
//! │  transaction. Failures are logged and the loop continues.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use tally_store::DailySalesRepository;

use crate::catalog::CatalogCache;
use crate::error::CheckoutResult;
use crate::gateway::CatalogSource;

/// Handle for controlling the refresh worker.
#[derive(Clone)]
pub struct RefreshHandle {
    request_tx: mpsc::Sender<()>,
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Requests an out-of-cycle refresh. Non-blocking; a refresh already
    /// in flight absorbs the request.
    pub fn request_refresh(&self) {
        let _ = self.request_tx.try_send(());
    }

    /// Triggers graceful shutdown.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Periodic catalog + daily totals refresher.
pub struct RefreshWorker<G> {
    gateway: Arc<G>,
    catalog: Arc<CatalogCache>,
    daily: DailySalesRepository,
    interval: Duration,
    request_rx: mpsc::Receiver<()>,
    shutdown_rx: mpsc::Receiver<()>,
}

impl<G: CatalogSource> RefreshWorker<G> {
    /// Creates a new refresh worker and returns a handle.
    pub fn new(
        gateway: Arc<G>,
        catalog: Arc<CatalogCache>,
        daily: DailySalesRepository,
        interval: Duration,
    ) -> (Self, RefreshHandle) {
        let (request_tx, request_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let worker = RefreshWorker {
            gateway,
            catalog,
            daily,
            interval,
            request_rx,
            shutdown_rx,
        };

        let handle = RefreshHandle {
            request_tx,
            shutdown_tx,
        };

        (worker, handle)
    }

    /// Runs the refresh loop.
    ///
    /// This should be spawned as a background task. The first interval
    /// tick fires immediately, so the catalog is loaded at startup.
    pub async fn run(mut self) {
        info!(interval = ?self.interval, "Refresh worker starting");

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.refresh_once().await {
                        error!(error = %e, "Periodic refresh failed");
                    }
                }

                Some(()) = self.request_rx.recv() => {
                    if let Err(e) = self.refresh_once().await {
                        error!(error = %e, "Requested refresh failed");
                    }
                }

                _ = self.shutdown_rx.recv() => {
                    info!("Refresh worker shutting down");
                    break;
                }
            }
        }

        info!("Refresh worker stopped");
    }

    /// One refresh pass: catalog snapshot, then today's totals.
    pub async fn refresh_once(&self) -> CheckoutResult<()> {
        let products = self.gateway.products().await?;
        debug!(count = products.len(), "Catalog snapshot refreshed");
        self.catalog.replace(products);

        let today = Utc::now().date_naive();
        let totals = self.gateway.daily_sales(today).await?;
        self.daily.put(totals).await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
