//! # Gateways
//!
//! External interfaces of the checkout engine: the read-only catalog
//! source and the transaction commit endpoint.
//!
//! ## Structured Rejections
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Commit Error Contract                                │
//! │                                                                         │
//! │  CommitError::Rejected(CommitRejection)                                │
//! │  ├── InsufficientStock   ──► targeted notification + catalog reload    │
//! │  ├── InsufficientPayment ──► targeted notification                     │
//! │  └── ProductNotFound     ──► targeted notification + catalog reload    │
//! │                                                                         │
//! │  CommitError::Transport(..)  ──► retried, then offline fallback        │
//! │                                                                         │
//! │  The engine matches on these VARIANTS, never on message text. The      │
//! │  rejection kind is part of the gateway contract.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::debug;

use tally_core::{
    DailySales, InventoryStatus, Money, PaymentMethod, Product, TaxRate, Transaction,
    TransactionRequest, TransactionStatus,
};

use crate::ids;

// =============================================================================
// Errors
// =============================================================================

/// Catalog gateway errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway could not be reached.
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    /// The gateway answered with something the engine cannot use.
    #[error("Malformed gateway response: {0}")]
    Malformed(String),
}

/// Result type for catalog operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Why the commit endpoint rejected a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitRejection {
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    #[error("Insufficient payment: required {required_cents} cents, received {received_cents} cents")]
    InsufficientPayment {
        required_cents: i64,
        received_cents: i64,
    },

    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: String },
}

impl CommitRejection {
    /// Whether the catalog should be reloaded so the display reflects
    /// current truth.
    pub fn warrants_catalog_reload(&self) -> bool {
        matches!(
            self,
            CommitRejection::InsufficientStock { .. } | CommitRejection::ProductNotFound { .. }
        )
    }
}

/// Commit endpoint errors.
#[derive(Debug, Error)]
pub enum CommitError {
    /// The endpoint understood the request and said no.
    #[error(transparent)]
    Rejected(#[from] CommitRejection),

    /// The endpoint could not be reached or gave no usable answer.
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl CommitError {
    /// Transport failures are transient and worth retrying; rejections
    /// are final.
    pub fn is_transient(&self) -> bool {
        matches!(self, CommitError::Transport(_))
    }
}

// =============================================================================
// Traits
// =============================================================================

/// Read-only catalog queries.
pub trait CatalogSource: Send + Sync {
    /// All active products.
    fn products(&self) -> impl Future<Output = GatewayResult<Vec<Product>>> + Send;

    /// Distinct category names, sorted.
    fn categories(&self) -> impl Future<Output = GatewayResult<Vec<String>>> + Send;

    /// Looks up one product by barcode.
    fn product_by_barcode(
        &self,
        code: &str,
    ) -> impl Future<Output = GatewayResult<Option<Product>>> + Send;

    /// Authoritative totals for a calendar day.
    fn daily_sales(&self, date: NaiveDate)
        -> impl Future<Output = GatewayResult<DailySales>> + Send;

    /// Catalog-wide stock summary.
    fn inventory_status(&self) -> impl Future<Output = GatewayResult<InventoryStatus>> + Send;
}

/// The transaction commit endpoint.
pub trait TransactionGateway: Send + Sync {
    /// Attempts to commit a transaction.
    fn process_transaction(
        &self,
        request: &TransactionRequest,
    ) -> impl Future<Output = Result<Transaction, CommitError>> + Send;
}

// =============================================================================
// Simulated Gateway
// =============================================================================

/// In-process catalog + commit simulation.
///
/// The production deployment points the engine at a real backend; the
/// simulation backs demos and tests, with failure injection for the
/// transport and rejection paths.
///
/// ## Failure Injection
/// ```rust,ignore
/// let gateway = SimulatedGateway::with_demo_catalog();
/// gateway.fail_next_commits(2);          // two transport failures, then normal
/// gateway.reject_next_commit(rejection); // one structured rejection
/// ```
pub struct SimulatedGateway {
    catalog: Mutex<Vec<Product>>,
    committed: Mutex<Vec<Transaction>>,
    daily: Mutex<HashMap<NaiveDate, DailySales>>,
    reject_next: Mutex<Option<CommitRejection>>,
    commit_delay: Mutex<Duration>,
    fail_commits: AtomicU32,
    fail_catalog: AtomicBool,
    commit_calls: AtomicU32,
}

/// Products at or below this stock level are reported as low.
const LOW_STOCK_THRESHOLD: i64 = 5;

impl SimulatedGateway {
    /// Creates a simulation over the given catalog.
    pub fn new(catalog: Vec<Product>) -> Self {
        SimulatedGateway {
            catalog: Mutex::new(catalog),
            committed: Mutex::new(Vec::new()),
            daily: Mutex::new(HashMap::new()),
            reject_next: Mutex::new(None),
            commit_delay: Mutex::new(Duration::ZERO),
            fail_commits: AtomicU32::new(0),
            fail_catalog: AtomicBool::new(false),
            commit_calls: AtomicU32::new(0),
        }
    }

    /// Creates a simulation seeded with a small demo catalog.
    pub fn with_demo_catalog() -> Self {
        Self::new(demo_catalog())
    }

    /// The next `n` commits fail at the transport level.
    pub fn fail_next_commits(&self, n: u32) {
        self.fail_commits.store(n, Ordering::SeqCst);
    }

    /// Catalog queries fail until turned off again.
    pub fn set_catalog_down(&self, down: bool) {
        self.fail_catalog.store(down, Ordering::SeqCst);
    }

    /// The next commit is rejected with the given kind.
    pub fn reject_next_commit(&self, rejection: CommitRejection) {
        *self.reject_next.lock().expect("gateway mutex poisoned") = Some(rejection);
    }

    /// Every commit sleeps this long before answering.
    pub fn set_commit_delay(&self, delay: Duration) {
        *self.commit_delay.lock().expect("gateway mutex poisoned") = delay;
    }

    /// Number of commit attempts seen so far.
    pub fn commit_calls(&self) -> u32 {
        self.commit_calls.load(Ordering::SeqCst)
    }

    /// Snapshot of committed transactions.
    pub fn committed(&self) -> Vec<Transaction> {
        self.committed.lock().expect("gateway mutex poisoned").clone()
    }

    /// Overwrites one product's stock level.
    pub fn set_stock(&self, product_id: &str, stock: i64) {
        let mut catalog = self.catalog.lock().expect("gateway mutex poisoned");
        if let Some(product) = catalog.iter_mut().find(|p| p.id == product_id) {
            product.stock = stock;
        }
    }

    fn check_catalog_up(&self) -> GatewayResult<()> {
        if self.fail_catalog.load(Ordering::SeqCst) {
            Err(GatewayError::Unavailable("catalog simulation is down".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CatalogSource for SimulatedGateway {
    async fn products(&self) -> GatewayResult<Vec<Product>> {
        self.check_catalog_up()?;
        let catalog = self.catalog.lock().expect("gateway mutex poisoned");
        Ok(catalog.iter().filter(|p| p.is_active).cloned().collect())
    }

    async fn categories(&self) -> GatewayResult<Vec<String>> {
        self.check_catalog_up()?;
        let catalog = self.catalog.lock().expect("gateway mutex poisoned");
        let mut categories: Vec<String> = catalog.iter().map(|p| p.category.clone()).collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn product_by_barcode(&self, code: &str) -> GatewayResult<Option<Product>> {
        self.check_catalog_up()?;
        let catalog = self.catalog.lock().expect("gateway mutex poisoned");
        Ok(catalog
            .iter()
            .find(|p| p.is_active && p.barcode.as_deref() == Some(code))
            .cloned())
    }

    async fn daily_sales(&self, date: NaiveDate) -> GatewayResult<DailySales> {
        self.check_catalog_up()?;
        let daily = self.daily.lock().expect("gateway mutex poisoned");
        Ok(daily.get(&date).copied().unwrap_or_else(|| DailySales::empty(date)))
    }

    async fn inventory_status(&self) -> GatewayResult<InventoryStatus> {
        self.check_catalog_up()?;
        let catalog = self.catalog.lock().expect("gateway mutex poisoned");

        let mut status = InventoryStatus {
            total_products: catalog.len(),
            ..Default::default()
        };
        for product in catalog.iter() {
            if product.stock <= 0 {
                status.out_of_stock.push(product.name.clone());
            } else if product.stock <= LOW_STOCK_THRESHOLD {
                status.low_stock.push(product.name.clone());
            }
        }
        Ok(status)
    }
}

impl TransactionGateway for SimulatedGateway {
    async fn process_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<Transaction, CommitError> {
        self.commit_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.commit_delay.lock().expect("gateway mutex poisoned");
        if delay > Duration::ZERO {
            tokio::time::sleep(delay).await;
        }

        if self.fail_commits.load(Ordering::SeqCst) > 0 {
            self.fail_commits.fetch_sub(1, Ordering::SeqCst);
            return Err(CommitError::Transport("simulated outage".to_string()));
        }

        if let Some(rejection) = self
            .reject_next
            .lock()
            .expect("gateway mutex poisoned")
            .take()
        {
            return Err(CommitError::Rejected(rejection));
        }

        let mut catalog = self.catalog.lock().expect("gateway mutex poisoned");

        // Server-side stock check against its own catalog
        for item in &request.items {
            let Some(product) = catalog.iter().find(|p| p.id == item.product_id && p.is_active)
            else {
                return Err(CommitError::Rejected(CommitRejection::ProductNotFound {
                    product_id: item.product_id.clone(),
                }));
            };
            if product.stock < item.quantity {
                return Err(CommitError::Rejected(CommitRejection::InsufficientStock {
                    name: product.name.clone(),
                    available: product.stock,
                    requested: item.quantity,
                }));
            }
        }

        // Server-side totals, same per-line rounding as the engine
        let subtotal: i64 = request.items.iter().map(|i| i.line_total_cents).sum();
        let tax: i64 = request
            .items
            .iter()
            .map(|i| {
                Money::from_cents(i.line_total_cents)
                    .calculate_tax(TaxRate::from_bps(i.tax_rate_bps))
                    .cents()
            })
            .sum();
        let total = subtotal + tax;

        let received = match request.payment_method {
            PaymentMethod::Cash => {
                if request.payment_received_cents < total {
                    return Err(CommitError::Rejected(CommitRejection::InsufficientPayment {
                        required_cents: total,
                        received_cents: request.payment_received_cents,
                    }));
                }
                request.payment_received_cents
            }
            // Card captures are for the exact total
            PaymentMethod::Card => total,
        };

        for item in &request.items {
            if let Some(product) = catalog.iter_mut().find(|p| p.id == item.product_id) {
                product.stock -= item.quantity;
            }
        }
        drop(catalog);

        let now = Utc::now();
        let transaction = Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            receipt_number: ids::receipt_number(),
            status: TransactionStatus::Committed,
            items: request.items.clone(),
            subtotal_cents: subtotal,
            tax_cents: tax,
            total_cents: total,
            payment_method: request.payment_method,
            payment_received_cents: received,
            change_cents: received - total,
            timestamp: now,
            cashier: request.cashier.clone(),
            terminal: request.terminal.clone(),
        };

        {
            let mut daily = self.daily.lock().expect("gateway mutex poisoned");
            let entry = daily
                .entry(now.date_naive())
                .or_insert_with(|| DailySales::empty(now.date_naive()));
            entry.sales_cents += total;
            entry.transaction_count += 1;
        }

        self.committed
            .lock()
            .expect("gateway mutex poisoned")
            .push(transaction.clone());

        debug!(receipt = %transaction.receipt_number, total, "Simulated commit accepted");
        Ok(transaction)
    }
}

// =============================================================================
// Demo Catalog
// =============================================================================

fn demo_product(
    id: &str,
    name: &str,
    category: &str,
    barcode: &str,
    price_cents: i64,
    stock: i64,
) -> Product {
    Product {
        id: id.to_string(),
        sku: format!("SKU-{}", id),
        barcode: Some(barcode.to_string()),
        name: name.to_string(),
        description: None,
        category: category.to_string(),
        price_cents,
        stock,
        tax_rate_bps: None,
        icon: None,
        is_active: true,
    }
}

/// A small catalog for demos and tests.
pub fn demo_catalog() -> Vec<Product> {
    vec![
        demo_product("p-olive-oil", "Olive Oil 1L", "pantry", "6001000000017", 4500, 12),
        demo_product("p-espresso", "Espresso Beans 500g", "beverages", "6001000000024", 1299, 8),
        demo_product("p-flour", "Bread Flour 2kg", "pantry", "6001000000031", 650, 3),
        demo_product("p-soap", "Hand Soap", "household", "6001000000048", 349, 0),
    ]
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::TransactionItem;

    fn request_for(product_id: &str, quantity: i64, unit_price_cents: i64) -> TransactionRequest {
        TransactionRequest {
            items: vec![TransactionItem {
                product_id: product_id.to_string(),
                name: product_id.to_string(),
                barcode: None,
                unit_price_cents,
                quantity,
                tax_rate_bps: 1500,
                line_total_cents: unit_price_cents * quantity,
            }],
            payment_method: PaymentMethod::Cash,
            payment_received_cents: 1_000_000,
            cashier: "test".to_string(),
            terminal: "POS-001".to_string(),
        }
    }

    #[tokio::test]
    async fn test_commit_decrements_stock_and_records_daily() {
        let gateway = SimulatedGateway::with_demo_catalog();

        let txn = gateway
            .process_transaction(&request_for("p-olive-oil", 2, 4500))
            .await
            .unwrap();

        assert_eq!(txn.status, TransactionStatus::Committed);
        assert_eq!(txn.subtotal_cents, 9000);
        assert_eq!(txn.tax_cents, 1350);
        assert_eq!(txn.total_cents, 10350);

        let products = gateway.products().await.unwrap();
        let oil = products.iter().find(|p| p.id == "p-olive-oil").unwrap();
        assert_eq!(oil.stock, 10);

        let daily = gateway.daily_sales(txn.timestamp.date_naive()).await.unwrap();
        assert_eq!(daily.sales_cents, 10350);
        assert_eq!(daily.transaction_count, 1);
    }

    #[tokio::test]
    async fn test_commit_rejects_insufficient_stock() {
        let gateway = SimulatedGateway::with_demo_catalog();

        let err = gateway
            .process_transaction(&request_for("p-flour", 10, 650))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CommitError::Rejected(CommitRejection::InsufficientStock { available: 3, .. })
        ));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_commit_rejects_unknown_product() {
        let gateway = SimulatedGateway::with_demo_catalog();

        let err = gateway
            .process_transaction(&request_for("p-ghost", 1, 100))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CommitError::Rejected(CommitRejection::ProductNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_commit_rejects_short_cash() {
        let gateway = SimulatedGateway::with_demo_catalog();

        let mut request = request_for("p-olive-oil", 2, 4500);
        request.payment_received_cents = 10000; // total is 10350

        let err = gateway.process_transaction(&request).await.unwrap_err();
        assert!(matches!(
            err,
            CommitError::Rejected(CommitRejection::InsufficientPayment {
                required_cents: 10350,
                received_cents: 10000,
            })
        ));
    }

    #[tokio::test]
    async fn test_card_captures_exact_total() {
        let gateway = SimulatedGateway::with_demo_catalog();

        let mut request = request_for("p-olive-oil", 2, 4500);
        request.payment_method = PaymentMethod::Card;
        request.payment_received_cents = 0; // ignored for card

        let txn = gateway.process_transaction(&request).await.unwrap();
        assert_eq!(txn.payment_received_cents, txn.total_cents);
        assert_eq!(txn.change_cents, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_injection() {
        let gateway = SimulatedGateway::with_demo_catalog();
        gateway.fail_next_commits(1);

        let err = gateway
            .process_transaction(&request_for("p-olive-oil", 1, 4500))
            .await
            .unwrap_err();
        assert!(err.is_transient());

        // Next commit succeeds
        gateway
            .process_transaction(&request_for("p-olive-oil", 1, 4500))
            .await
            .unwrap();
        assert_eq!(gateway.commit_calls(), 2);
    }

    #[tokio::test]
    async fn test_catalog_queries() {
        let gateway = SimulatedGateway::with_demo_catalog();

        let categories = gateway.categories().await.unwrap();
        assert_eq!(categories, vec!["beverages", "household", "pantry"]);

        let product = gateway
            .product_by_barcode("6001000000024")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(product.name, "Espresso Beans 500g");

        assert!(gateway.product_by_barcode("0000").await.unwrap().is_none());

        let status = gateway.inventory_status().await.unwrap();
        assert_eq!(status.total_products, 4);
        assert_eq!(status.out_of_stock, vec!["Hand Soap"]);
        assert_eq!(status.low_stock, vec!["Bread Flour 2kg"]);
    }

    #[tokio::test]
    async fn test_catalog_down() {
        let gateway = SimulatedGateway::with_demo_catalog();
        gateway.set_catalog_down(true);
        assert!(gateway.products().await.is_err());

        gateway.set_catalog_down(false);
        assert!(gateway.products().await.is_ok());
    }
}
