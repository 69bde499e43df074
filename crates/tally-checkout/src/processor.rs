//! # Transaction Processor
//!
//! The checkout state machine and its orchestration.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Checkout State Machine                               │
//! │                                                                         │
//! │              ┌──────────┐                                               │
//! │              │   Idle   │◄──────────────── (failed fallback:            │
//! │              └────┬─────┘                   cart preserved)             │
//! │                   │ submit(tender)                                      │
//! │                   ▼                                                     │
//! │            ┌────────────┐   invalid   ┌────────────┐                   │
//! │            │ Validating ├────────────►│  Rejected  │ (cart intact)     │
//! │            └────┬───────┘             └────────────┘                   │
//! │                 │ valid                     ▲                           │
//! │                 ▼                           │ structured rejection      │
//! │            ┌────────────┐ ──────────────────┘                          │
//! │            │ Submitting │                                              │
//! │            └────┬───────┘                                              │
//! │          commit │     transport failure (after retries)                │
//! │                 ▼                     │                                 │
//! │         ┌────────────┐        ┌───────▼─────────┐                      │
//! │         │ Committed  │        │ OfflineFallback │                      │
//! │         └────────────┘        └─────────────────┘                      │
//! │          cart cleared           cart cleared, queued locally           │
//! │                                                                         │
//! │  Validation and draft construction are PURE; all side effects live    │
//! │  in the orchestrator. submit() is infallible: every failure mode       │
//! │  resolves to an outcome, never a propagated error.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tally_core::validation::{validate_barcode, validate_payment_amount};
use tally_core::{
    build_receipt, Cart, CartItem, CartTotals, CoreError, CoreResult, PaymentMethod, Product,
    ReceiptDocument, TaxRate, Transaction, TransactionItem, TransactionRequest, TransactionStatus,
    Actor,
};
use tally_store::{OperatorSession, Store};

use crate::audit::AuditLogger;
use crate::catalog::CatalogCache;
use crate::config::CheckoutConfig;
use crate::error::CheckoutResult;
use crate::gateway::{CatalogSource, CommitError, CommitRejection, TransactionGateway};
use crate::ids;
use crate::notify::{Notification, Notifier};
use crate::retry::{retry_request, RetryPolicy};

// =============================================================================
// Tender
// =============================================================================

/// Payment input for a submission.
#[derive(Debug, Clone, Copy)]
pub struct Tender {
    pub method: PaymentMethod,
    /// Amount handed over. Ignored for card: captures are for the exact
    /// total.
    pub received_cents: i64,
}

impl Tender {
    /// Cash tender of the given amount.
    pub fn cash(received_cents: i64) -> Self {
        Tender {
            method: PaymentMethod::Cash,
            received_cents,
        }
    }

    /// Card tender; the capture amount is the transaction total.
    pub fn card() -> Self {
        Tender {
            method: PaymentMethod::Card,
            received_cents: 0,
        }
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Why a submission was rejected. The cart is never touched on this path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RejectReason {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Insufficient payment: required {required_cents} cents, received {received_cents} cents")]
    InsufficientPayment {
        required_cents: i64,
        received_cents: i64,
    },

    #[error("Stock unavailable for {name}: {available} remaining, {requested} in cart")]
    StockUnavailable {
        name: String,
        available: i64,
        requested: i64,
    },

    /// The commit endpoint said no, with a structured kind.
    #[error(transparent)]
    Gateway(#[from] CommitRejection),

    #[error("A submission is already in progress")]
    SubmissionInFlight,
}

/// Processor lifecycle states.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutState {
    Idle,
    Validating,
    Submitting,
    Committed { receipt_number: String },
    OfflineFallback { receipt_number: String },
    Rejected { message: String },
}

/// The result of a submission. [`CheckoutProcessor::submit`] is
/// infallible: every failure mode maps to one of these.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// Accepted by the commit endpoint.
    Committed(Transaction),
    /// Captured locally; queued for reconciliation.
    Offline(Transaction),
    /// Rejected before or by the endpoint; cart preserved.
    Rejected(RejectReason),
    /// Even the offline fallback could not be persisted; cart preserved.
    Failed,
}

// =============================================================================
// Pure Validation
// =============================================================================

/// A validated, fully priced submission draft.
#[derive(Debug, Clone)]
struct Draft {
    items: Vec<TransactionItem>,
    subtotal_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    received_cents: i64,
    change_cents: i64,
}

/// Pure validation and draft construction.
///
/// Checks run in order; the first failure wins:
/// 1. cart non-empty
/// 2. cash covers the total
/// 3. live stock covers every cart line (re-checked at submit time to
///    catch depletion since the items were added)
fn validate_submission(
    cart: &Cart,
    tender: &Tender,
    live_products: &[Product],
    default_rate: TaxRate,
) -> Result<Draft, RejectReason> {
    if cart.is_empty() {
        return Err(RejectReason::EmptyCart);
    }

    let subtotal_cents = cart.subtotal_cents();
    let tax_cents = cart.tax_cents(default_rate);
    let total_cents = subtotal_cents + tax_cents;

    let (received_cents, change_cents) = match tender.method {
        PaymentMethod::Cash => {
            if validate_payment_amount(tender.received_cents).is_err()
                || tender.received_cents < total_cents
            {
                return Err(RejectReason::InsufficientPayment {
                    required_cents: total_cents,
                    received_cents: tender.received_cents,
                });
            }
            (tender.received_cents, tender.received_cents - total_cents)
        }
        // Card captures are for the exact total; no change handling
        PaymentMethod::Card => (total_cents, 0),
    };

    for item in &cart.items {
        let available = live_products
            .iter()
            .find(|p| p.id == item.product_id && p.is_active)
            .map(|p| p.stock)
            .unwrap_or(0);
        if available < item.quantity {
            return Err(RejectReason::StockUnavailable {
                name: item.name.clone(),
                available,
                requested: item.quantity,
            });
        }
    }

    Ok(Draft {
        items: cart.snapshot_items(default_rate),
        subtotal_cents,
        tax_cents,
        total_cents,
        received_cents,
        change_cents,
    })
}

// =============================================================================
// Processor
// =============================================================================

/// The checkout engine.
///
/// Owns the cart, the catalog snapshot, and the submission state machine;
/// talks to the world through the injected gateway, store, and notifier.
pub struct CheckoutProcessor<G> {
    config: CheckoutConfig,
    store: Store,
    gateway: Arc<G>,
    notifier: Arc<dyn Notifier>,
    audit: Arc<AuditLogger>,
    catalog: Arc<CatalogCache>,
    cart: Mutex<Cart>,
    state: Mutex<CheckoutState>,
    /// Submission guard: only one commit may be in flight.
    in_flight: AtomicBool,
    retry_policy: RetryPolicy,
    terminal: String,
    cashier: Mutex<String>,
}

impl<G> CheckoutProcessor<G>
where
    G: CatalogSource + TransactionGateway,
{
    /// Creates the engine: resolves the terminal id, wires the audit
    /// logger, and resumes a persisted operator session if one exists.
    pub async fn new(
        config: CheckoutConfig,
        store: Store,
        gateway: Arc<G>,
        notifier: Arc<dyn Notifier>,
    ) -> CheckoutResult<Self> {
        let terminal = store
            .terminal()
            .get_or_generate(&config.terminal_prefix)
            .await?;

        let audit = Arc::new(AuditLogger::new(
            store.audit_log(),
            terminal.clone(),
            config.audit_retention,
        ));

        let cashier = match store.session().load().await? {
            Some(session) => {
                audit.set_actor(session.actor.clone());
                debug!(cashier = %session.cashier, "Resumed operator session");
                session.cashier
            }
            None => "unassigned".to_string(),
        };

        let retry_policy = config.retry_policy();

        Ok(CheckoutProcessor {
            config,
            store,
            gateway,
            notifier,
            audit,
            catalog: Arc::new(CatalogCache::new()),
            cart: Mutex::new(Cart::new()),
            state: Mutex::new(CheckoutState::Idle),
            in_flight: AtomicBool::new(false),
            retry_policy,
            terminal,
            cashier: Mutex::new(cashier),
        })
    }

    /// The shared catalog snapshot (also handed to the refresh worker).
    pub fn catalog(&self) -> Arc<CatalogCache> {
        Arc::clone(&self.catalog)
    }

    /// The audit logger.
    pub fn audit(&self) -> Arc<AuditLogger> {
        Arc::clone(&self.audit)
    }

    /// This terminal's cached id.
    pub fn terminal(&self) -> &str {
        &self.terminal
    }

    /// Current state machine position.
    pub fn state(&self) -> CheckoutState {
        self.state.lock().expect("state mutex poisoned").clone()
    }

    fn set_state(&self, state: CheckoutState) {
        *self.state.lock().expect("state mutex poisoned") = state;
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Signs an operator in: persists the session snapshot and switches
    /// the audit identity.
    pub async fn login(&self, actor: Actor, cashier: impl Into<String>) -> CheckoutResult<()> {
        let cashier = cashier.into();
        let session = OperatorSession {
            actor: actor.clone(),
            cashier: cashier.clone(),
            logged_in_at: Utc::now(),
        };
        self.store.session().save(&session).await?;
        *self.cashier.lock().expect("cashier mutex poisoned") = cashier;
        self.audit.login(actor).await;
        Ok(())
    }

    /// Signs the operator out and clears the persisted session.
    pub async fn logout(&self) -> CheckoutResult<()> {
        self.store.session().clear().await?;
        self.audit.logout().await;
        *self.cashier.lock().expect("cashier mutex poisoned") = "unassigned".to_string();
        Ok(())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Reloads the catalog snapshot from the gateway.
    pub async fn reload_catalog(&self) -> CheckoutResult<usize> {
        match self.gateway.products().await {
            Ok(products) => {
                self.audit.api_call("catalog/products", 200).await;
                let count = products.len();
                self.catalog.replace(products);
                debug!(count, "Catalog reloaded");
                Ok(count)
            }
            Err(e) => {
                self.audit.api_call("catalog/products", 503).await;
                Err(e.into())
            }
        }
    }

    /// Looks a product up by barcode and adds it to the cart.
    pub async fn add_by_barcode(&self, code: &str) -> CheckoutResult<CartTotals> {
        validate_barcode(code).map_err(CoreError::from)?;

        let product = self.gateway.product_by_barcode(code).await?;
        self.audit.api_call("catalog/barcode", 200).await;

        match product {
            Some(product) => Ok(self.add_to_cart(&product)?),
            None => {
                let err = CoreError::ProductNotFound(code.to_string());
                self.notifier.notify(Notification::warning(err.to_string()));
                Err(err.into())
            }
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds one unit of a product. Business rejections surface as
    /// warnings and leave the cart untouched.
    pub fn add_to_cart(&self, product: &Product) -> CoreResult<CartTotals> {
        let result = {
            let mut cart = self.cart.lock().expect("cart mutex poisoned");
            cart.add_item(product)
                .map(|_| cart.totals(self.config.default_tax_rate()))
        };
        if let Err(e) = &result {
            self.notifier.notify(Notification::warning(e.to_string()));
        }
        result
    }

    /// Applies a quantity delta; reaching zero removes the line.
    pub fn update_quantity(&self, product: &Product, delta: i64) -> CoreResult<CartTotals> {
        let result = {
            let mut cart = self.cart.lock().expect("cart mutex poisoned");
            cart.update_quantity(product, delta)
                .map(|_| cart.totals(self.config.default_tax_rate()))
        };
        if let Err(e) = &result {
            self.notifier.notify(Notification::warning(e.to_string()));
        }
        result
    }

    /// Removes a line unconditionally.
    pub fn remove_item(&self, product_id: &str) -> CoreResult<CartTotals> {
        let mut cart = self.cart.lock().expect("cart mutex poisoned");
        cart.remove_item(product_id)
            .map(|_| cart.totals(self.config.default_tax_rate()))
    }

    /// Empties the cart.
    pub fn clear_cart(&self) {
        self.cart.lock().expect("cart mutex poisoned").clear();
    }

    /// Current cart totals.
    pub fn totals(&self) -> CartTotals {
        self.cart
            .lock()
            .expect("cart mutex poisoned")
            .totals(self.config.default_tax_rate())
    }

    /// Snapshot of the cart lines.
    pub fn cart_items(&self) -> Vec<CartItem> {
        self.cart.lock().expect("cart mutex poisoned").items.clone()
    }

    /// Builds the receipt document for a finalized transaction.
    pub fn receipt(&self, txn: &Transaction) -> ReceiptDocument {
        build_receipt(&self.config.profile, txn)
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submits the cart for payment.
    ///
    /// Infallible: validation failures, gateway rejections, transport
    /// failures and even a failing offline fallback all resolve to a
    /// [`SubmitOutcome`].
    pub async fn submit(&self, tender: Tender) -> SubmitOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            let reason = RejectReason::SubmissionInFlight;
            self.notifier.notify(Notification::warning(reason.to_string()));
            return SubmitOutcome::Rejected(reason);
        }

        let outcome = self.submit_inner(tender).await;
        self.in_flight.store(false, Ordering::Release);
        outcome
    }

    async fn submit_inner(&self, tender: Tender) -> SubmitOutcome {
        self.set_state(CheckoutState::Validating);

        let default_rate = self.config.default_tax_rate();
        let live_products = self.catalog.all();
        let draft = {
            let cart = self.cart.lock().expect("cart mutex poisoned");
            validate_submission(&cart, &tender, &live_products, default_rate)
        };

        let draft = match draft {
            Ok(draft) => draft,
            Err(reason) => {
                self.notifier.notify(Notification::error(reason.to_string()));
                self.set_state(CheckoutState::Rejected {
                    message: reason.to_string(),
                });
                return SubmitOutcome::Rejected(reason);
            }
        };

        self.set_state(CheckoutState::Submitting);

        let request = TransactionRequest {
            items: draft.items.clone(),
            payment_method: tender.method,
            payment_received_cents: draft.received_cents,
            cashier: self.cashier.lock().expect("cashier mutex poisoned").clone(),
            terminal: self.terminal.clone(),
        };

        info!(
            items = request.items.len(),
            total_cents = draft.total_cents,
            method = %request.payment_method,
            "Submitting transaction"
        );

        let result = retry_request(
            &self.retry_policy,
            |e: &CommitError| e.is_transient(),
            || self.gateway.process_transaction(&request),
        )
        .await;

        match result {
            Ok(txn) => {
                self.audit.api_call("transactions/commit", 200).await;
                self.finish_committed(&txn).await;
                SubmitOutcome::Committed(txn)
            }

            Err(CommitError::Rejected(rejection)) => {
                self.audit.api_call("transactions/commit", 422).await;
                self.notifier.notify(Notification::error(rejection.to_string()));

                // Stock and not-found rejections mean our snapshot lies;
                // reload so the display reflects current truth.
                if rejection.warrants_catalog_reload() {
                    if let Err(e) = self.reload_catalog().await {
                        warn!(error = %e, "Catalog reload after rejection failed");
                    }
                }

                self.set_state(CheckoutState::Rejected {
                    message: rejection.to_string(),
                });
                SubmitOutcome::Rejected(RejectReason::Gateway(rejection))
            }

            Err(CommitError::Transport(reason)) => {
                self.audit.api_call("transactions/commit", 503).await;
                warn!(error = %reason, "Commit endpoint unreachable, capturing offline");
                self.offline_fallback(draft, tender.method).await
            }
        }
    }

    /// Side effects of a successful commit.
    async fn finish_committed(&self, txn: &Transaction) {
        self.clear_cart();

        let date = txn.timestamp.date_naive();
        if let Err(e) = self
            .store
            .daily_sales()
            .record_transaction(date, txn.total_cents)
            .await
        {
            warn!(error = %e, "Daily totals update failed");
        }

        if let Err(e) = self.reload_catalog().await {
            warn!(error = %e, "Catalog refresh after commit failed");
        }

        self.notifier.notify(Notification::success(format!(
            "Receipt {} committed · total {}",
            txn.receipt_number,
            txn.total().format_with(&self.config.profile.currency_symbol)
        )));

        self.audit.transaction(txn).await;
        self.audit
            .inventory_change(format!(
                "Sale {} reduced stock across {} line(s)",
                txn.receipt_number,
                txn.items.len()
            ))
            .await;

        self.set_state(CheckoutState::Committed {
            receipt_number: txn.receipt_number.clone(),
        });
    }

    /// Transport failure path: capture the transaction locally.
    ///
    /// Never propagates an error. If even the local capture fails, the
    /// cart is preserved and a generic failure is reported.
    async fn offline_fallback(&self, draft: Draft, method: PaymentMethod) -> SubmitOutcome {
        let txn = Transaction {
            id: format!("offline-{}", Uuid::new_v4()),
            receipt_number: ids::offline_receipt_number(),
            status: TransactionStatus::OfflinePending,
            items: draft.items,
            subtotal_cents: draft.subtotal_cents,
            tax_cents: draft.tax_cents,
            total_cents: draft.total_cents,
            payment_method: method,
            payment_received_cents: draft.received_cents,
            change_cents: draft.change_cents,
            timestamp: Utc::now(),
            cashier: self.cashier.lock().expect("cashier mutex poisoned").clone(),
            terminal: self.terminal.clone(),
        };

        match self.store.offline_queue().append(&txn).await {
            Ok(queued) => {
                self.clear_cart();
                self.notifier.notify(Notification::offline(format!(
                    "Offline transaction {} recorded ({} awaiting sync)",
                    txn.receipt_number, queued
                )));
                self.audit.transaction(&txn).await;
                self.set_state(CheckoutState::OfflineFallback {
                    receipt_number: txn.receipt_number.clone(),
                });
                SubmitOutcome::Offline(txn)
            }
            Err(e) => {
                warn!(error = %e, "Offline capture failed; cart preserved");
                self.notifier.notify(Notification::error(
                    "Transaction could not be processed. Please try again.",
                ));
                self.set_state(CheckoutState::Idle);
                SubmitOutcome::Failed
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SimulatedGateway;
    use crate::notify::NotificationKind;
    use std::time::Duration;
    use tally_core::{LogCategory, LogSeverity};
    use tally_store::StoreConfig;

    /// Notifier that records everything for assertions.
    #[derive(Default)]
    struct CollectingNotifier {
        events: Mutex<Vec<Notification>>,
    }

    impl CollectingNotifier {
        fn kinds(&self) -> Vec<NotificationKind> {
            self.events
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.kind)
                .collect()
        }

        fn has_kind(&self, kind: NotificationKind) -> bool {
            self.kinds().contains(&kind)
        }
    }

    impl Notifier for CollectingNotifier {
        fn notify(&self, notification: Notification) {
            self.events.lock().unwrap().push(notification);
        }
    }

    async fn engine(
        gateway: Arc<SimulatedGateway>,
    ) -> (
        Store,
        Arc<CheckoutProcessor<SimulatedGateway>>,
        Arc<CollectingNotifier>,
    ) {
        let store = Store::new(StoreConfig::in_memory()).await.unwrap();
        let mut config = CheckoutConfig::default();
        // No sleeping in tests
        config.retry.backoff_base_ms = 0;

        let notifier = Arc::new(CollectingNotifier::default());
        let dyn_notifier: Arc<dyn Notifier> = notifier.clone();
        let processor = CheckoutProcessor::new(config, store.clone(), gateway, dyn_notifier)
            .await
            .unwrap();
        processor.reload_catalog().await.unwrap();
        (store, Arc::new(processor), notifier)
    }

    fn oil(processor: &CheckoutProcessor<SimulatedGateway>) -> Product {
        processor.catalog().find("p-olive-oil").unwrap()
    }

    /// Worked example cart: 2 × 45.00 at the 15% default rate.
    fn ring_up_oil_twice(processor: &CheckoutProcessor<SimulatedGateway>) {
        let product = oil(processor);
        processor.add_to_cart(&product).unwrap();
        processor.add_to_cart(&product).unwrap();
        assert_eq!(processor.totals().total_cents, 10350);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_without_network() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (_store, processor, notifier) = engine(gateway.clone()).await;

        let outcome = processor.submit(Tender::cash(10_000)).await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(RejectReason::EmptyCart)
        ));
        assert_eq!(gateway.commit_calls(), 0);
        assert!(matches!(processor.state(), CheckoutState::Rejected { .. }));
        assert!(notifier.has_kind(NotificationKind::Error));
    }

    #[tokio::test]
    async fn test_insufficient_cash_rejected_without_network() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (_store, processor, _notifier) = engine(gateway.clone()).await;
        ring_up_oil_twice(&processor);

        let outcome = processor.submit(Tender::cash(10_000)).await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(RejectReason::InsufficientPayment {
                required_cents: 10350,
                received_cents: 10000,
            })
        ));
        assert_eq!(gateway.commit_calls(), 0);
        // Cart untouched
        assert_eq!(processor.totals().total_cents, 10350);
    }

    #[tokio::test]
    async fn test_cash_commit_happy_path() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (store, processor, notifier) = engine(gateway.clone()).await;
        processor
            .login(
                Actor {
                    tenant: "store-001".to_string(),
                    user: "amina".to_string(),
                    role: "cashier".to_string(),
                },
                "Amina",
            )
            .await
            .unwrap();
        ring_up_oil_twice(&processor);

        let outcome = processor.submit(Tender::cash(11_000)).await;

        let SubmitOutcome::Committed(txn) = outcome else {
            panic!("expected commit");
        };
        assert_eq!(txn.subtotal_cents, 9000);
        assert_eq!(txn.tax_cents, 1350);
        assert_eq!(txn.total_cents, 10350);
        assert_eq!(txn.change_cents, 650);
        assert_eq!(txn.cashier, "Amina");
        assert_eq!(txn.terminal, processor.terminal());

        // Cart cleared, state terminal, success notified
        assert!(processor.totals().item_count == 0);
        assert!(matches!(processor.state(), CheckoutState::Committed { .. }));
        assert!(notifier.has_kind(NotificationKind::Success));

        // Daily totals persisted
        let totals = store
            .daily_sales()
            .get(txn.timestamp.date_naive())
            .await
            .unwrap();
        assert_eq!(totals.sales_cents, 10350);
        assert_eq!(totals.transaction_count, 1);

        // Catalog refreshed: stock reflects the sale
        assert_eq!(processor.catalog().find("p-olive-oil").unwrap().stock, 10);

        // Nothing queued offline
        assert_eq!(store.offline_queue().count().await.unwrap(), 0);

        // Audit trail has the committed transaction
        let entries = store.audit_log().entries().await.unwrap();
        assert!(entries
            .iter()
            .any(|e| e.action == "transaction_committed" && e.severity == LogSeverity::Info));
    }

    #[tokio::test]
    async fn test_card_captures_exact_total() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (_store, processor, _notifier) = engine(gateway).await;
        ring_up_oil_twice(&processor);

        let SubmitOutcome::Committed(txn) = processor.submit(Tender::card()).await else {
            panic!("expected commit");
        };
        assert_eq!(txn.payment_received_cents, txn.total_cents);
        assert_eq!(txn.change_cents, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_captures_offline() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (store, processor, notifier) = engine(gateway.clone()).await;
        ring_up_oil_twice(&processor);
        gateway.fail_next_commits(u32::MAX);

        let outcome = processor.submit(Tender::cash(11_000)).await;

        let SubmitOutcome::Offline(txn) = outcome else {
            panic!("expected offline capture");
        };
        assert_eq!(txn.status, TransactionStatus::OfflinePending);
        assert!(txn.receipt_number.starts_with("OFF-"));
        // Totals identical to the pre-failure cart
        assert_eq!(txn.total_cents, 10350);
        assert_eq!(txn.change_cents, 650);

        // Exactly one queued transaction; cart cleared as if committed
        let queued = store.offline_queue().pending().await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].total_cents, 10350);
        assert_eq!(processor.totals().item_count, 0);
        assert!(matches!(
            processor.state(),
            CheckoutState::OfflineFallback { .. }
        ));

        // Distinct offline notification, not a success
        assert!(notifier.has_kind(NotificationKind::Offline));
        assert!(!notifier.has_kind(NotificationKind::Success));

        // Offline capture audit-logged at warning severity
        let entries = store.audit_log().entries().await.unwrap();
        assert!(entries
            .iter()
            .any(|e| e.action == "transaction_offline"
                && e.severity == LogSeverity::Warning
                && e.category == LogCategory::Transaction));
    }

    #[tokio::test]
    async fn test_retries_then_commits() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (_store, processor, _notifier) = engine(gateway.clone()).await;
        ring_up_oil_twice(&processor);
        gateway.fail_next_commits(2);

        let outcome = processor.submit(Tender::cash(11_000)).await;

        assert!(matches!(outcome, SubmitOutcome::Committed(_)));
        // Two transport failures + one success = three attempts
        assert_eq!(gateway.commit_calls(), 3);
    }

    #[tokio::test]
    async fn test_gateway_rejection_preserves_cart() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (store, processor, notifier) = engine(gateway.clone()).await;
        ring_up_oil_twice(&processor);
        gateway.reject_next_commit(CommitRejection::InsufficientStock {
            name: "Olive Oil 1L".to_string(),
            available: 1,
            requested: 2,
        });

        let outcome = processor.submit(Tender::cash(11_000)).await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(RejectReason::Gateway(
                CommitRejection::InsufficientStock { .. }
            ))
        ));
        // Cart preserved for retry; nothing queued
        assert_eq!(processor.totals().total_cents, 10350);
        assert_eq!(store.offline_queue().count().await.unwrap(), 0);
        assert!(notifier.has_kind(NotificationKind::Error));
    }

    #[tokio::test]
    async fn test_stock_revalidated_at_submit_time() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (_store, processor, _notifier) = engine(gateway.clone()).await;
        ring_up_oil_twice(&processor); // quantity 2 against stock 12

        // Stock depleted elsewhere since the items were added
        gateway.set_stock("p-olive-oil", 1);
        processor.reload_catalog().await.unwrap();

        let calls_before = gateway.commit_calls();
        let outcome = processor.submit(Tender::cash(11_000)).await;

        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(RejectReason::StockUnavailable {
                available: 1,
                requested: 2,
                ..
            })
        ));
        // Rejected during validation: the endpoint was never called
        assert_eq!(gateway.commit_calls(), calls_before);
    }

    #[tokio::test]
    async fn test_second_submission_rejected_while_in_flight() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (_store, processor, _notifier) = engine(gateway.clone()).await;
        ring_up_oil_twice(&processor);
        gateway.set_commit_delay(Duration::from_millis(100));

        let first = {
            let processor = Arc::clone(&processor);
            tokio::spawn(async move { processor.submit(Tender::cash(11_000)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let calls_before = gateway.commit_calls();
        let second = processor.submit(Tender::cash(11_000)).await;
        assert!(matches!(
            second,
            SubmitOutcome::Rejected(RejectReason::SubmissionInFlight)
        ));
        // The guard rejected before validation: no extra gateway call
        assert_eq!(gateway.commit_calls(), calls_before);

        assert!(matches!(
            first.await.unwrap(),
            SubmitOutcome::Committed(_)
        ));
    }

    #[tokio::test]
    async fn test_failed_offline_capture_preserves_cart() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (store, processor, notifier) = engine(gateway.clone()).await;
        ring_up_oil_twice(&processor);
        gateway.fail_next_commits(u32::MAX);

        // Kill the store so even the offline capture fails
        store.close().await;

        let outcome = processor.submit(Tender::cash(11_000)).await;

        assert!(matches!(outcome, SubmitOutcome::Failed));
        assert_eq!(processor.totals().total_cents, 10350); // cart preserved
        assert!(matches!(processor.state(), CheckoutState::Idle));
        assert!(notifier.has_kind(NotificationKind::Error));
    }

    #[tokio::test]
    async fn test_cart_warnings_notify() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (_store, processor, notifier) = engine(gateway).await;

        // Hand Soap is out of stock in the demo catalog
        let soap = processor.catalog().find("p-soap").unwrap();
        assert!(processor.add_to_cart(&soap).is_err());
        assert_eq!(processor.totals().item_count, 0);
        assert!(notifier.has_kind(NotificationKind::Warning));
    }

    #[tokio::test]
    async fn test_add_by_barcode() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (_store, processor, _notifier) = engine(gateway).await;

        let totals = processor.add_by_barcode("6001000000024").await.unwrap();
        assert_eq!(totals.item_count, 1);

        // Malformed barcode is a validation error
        assert!(processor.add_by_barcode("not-digits").await.is_err());
        // Unknown barcode is a not-found error
        assert!(processor.add_by_barcode("9999999999999").await.is_err());
    }

    #[tokio::test]
    async fn test_session_resumes_from_store() {
        let gateway = Arc::new(SimulatedGateway::with_demo_catalog());
        let (store, processor, _notifier) = engine(gateway.clone()).await;
        processor
            .login(
                Actor {
                    tenant: "store-001".to_string(),
                    user: "amina".to_string(),
                    role: "cashier".to_string(),
                },
                "Amina",
            )
            .await
            .unwrap();

        // A new engine over the same store resumes the session
        let notifier: Arc<dyn Notifier> = Arc::new(CollectingNotifier::default());
        let resumed = CheckoutProcessor::new(
            CheckoutConfig::default(),
            store.clone(),
            gateway,
            notifier,
        )
        .await
        .unwrap();
        resumed.reload_catalog().await.unwrap();

        let product = resumed.catalog().find("p-espresso").unwrap();
        resumed.add_to_cart(&product).unwrap();
        let SubmitOutcome::Committed(txn) = resumed.submit(Tender::card()).await else {
            panic!("expected commit");
        };
        assert_eq!(txn.cashier, "Amina");
    }

    // =========================================================================
    // Pure Validation Tests
    // =========================================================================

    mod validate {
        use super::super::*;
        use crate::gateway::demo_catalog;

        const VAT: TaxRate = TaxRate::from_bps(1500);

        fn cart_with_oil(quantity: i64) -> Cart {
            let mut cart = Cart::new();
            let catalog = demo_catalog();
            let product = catalog.iter().find(|p| p.id == "p-olive-oil").unwrap();
            cart.add_item(product).unwrap();
            if quantity > 1 {
                cart.update_quantity(product, quantity - 1).unwrap();
            }
            cart
        }

        #[test]
        fn empty_cart_first() {
            let cart = Cart::new();
            let result = validate_submission(&cart, &Tender::cash(0), &demo_catalog(), VAT);
            assert!(matches!(result, Err(RejectReason::EmptyCart)));
        }

        #[test]
        fn cash_must_cover_total() {
            let cart = cart_with_oil(2);
            let result = validate_submission(&cart, &Tender::cash(10_349), &demo_catalog(), VAT);
            assert!(matches!(
                result,
                Err(RejectReason::InsufficientPayment {
                    required_cents: 10350,
                    received_cents: 10349,
                })
            ));

            // Exact payment is enough
            let draft =
                validate_submission(&cart, &Tender::cash(10_350), &demo_catalog(), VAT).unwrap();
            assert_eq!(draft.change_cents, 0);
        }

        #[test]
        fn change_is_exact() {
            let cart = cart_with_oil(2);
            let draft =
                validate_submission(&cart, &Tender::cash(11_000), &demo_catalog(), VAT).unwrap();
            assert_eq!(draft.subtotal_cents, 9000);
            assert_eq!(draft.tax_cents, 1350);
            assert_eq!(draft.total_cents, 10350);
            assert_eq!(draft.change_cents, 650);
        }

        #[test]
        fn missing_live_product_counts_as_zero_stock() {
            let cart = cart_with_oil(1);
            let result = validate_submission(&cart, &Tender::cash(100_000), &[], VAT);
            assert!(matches!(
                result,
                Err(RejectReason::StockUnavailable { available: 0, .. })
            ));
        }

        #[test]
        fn card_ignores_received_amount() {
            let cart = cart_with_oil(2);
            let draft = validate_submission(&cart, &Tender::card(), &demo_catalog(), VAT).unwrap();
            assert_eq!(draft.received_cents, 10350);
            assert_eq!(draft.change_cents, 0);
        }
    }
}
