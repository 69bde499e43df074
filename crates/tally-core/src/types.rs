//! # Domain Types
//!
//! Core domain types used throughout Tally POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │  Transaction    │   │    LogEntry     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  barcode        │   │  receipt_number │   │  actor          │       │
//! │  │  price_cents    │   │  status         │   │  category       │       │
//! │  │  stock          │   │  total_cents    │   │  severity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Transaction items are immutable snapshots of cart items at commit     │
//! │  time. They carry no live reference back to Product, so historical     │
//! │  receipts cannot be mutated retroactively.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1500 bps = 15.00% (the default VAT rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// Loaded from the catalog source at session start. Stock is mutated only
/// by successful commits on the gateway side; the engine treats products
/// as read-only snapshots between refreshes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier.
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.). Unique across the catalog.
    pub barcode: Option<String>,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Catalog category this product is filed under.
    pub category: String,

    /// Price in cents (smallest currency unit). Never negative.
    pub price_cents: i64,

    /// Current stock level. Never negative.
    pub stock: i64,

    /// Tax rate in basis points. `None` means "use the configured default".
    pub tax_rate_bps: Option<u32>,

    /// Opaque icon reference for display layers.
    pub icon: Option<String>,

    /// Whether product is active (soft delete).
    pub is_active: bool,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the tax rate, falling back to the supplied default.
    #[inline]
    pub fn tax_rate_or(&self, default: TaxRate) -> TaxRate {
        self.tax_rate_bps.map(TaxRate::from_bps).unwrap_or(default)
    }

    /// Checks if the product has stock to cover the requested quantity.
    pub fn can_cover(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
        }
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// The status of a committed transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Accepted by the remote commit endpoint.
    Committed,
    /// Created locally while the commit endpoint was unreachable;
    /// queued for later reconciliation.
    OfflinePending,
}

/// A line item inside a transaction.
/// Uses snapshot pattern to freeze cart data at commit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionItem {
    pub product_id: String,
    /// Product name at commit time (frozen).
    pub name: String,
    pub barcode: Option<String>,
    /// Unit price in cents at commit time (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// Tax rate in basis points applied to this line.
    pub tax_rate_bps: u32,
    /// Line total before tax (unit_price × quantity).
    pub line_total_cents: i64,
}

impl TransactionItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A finalized transaction (committed or offline-pending).
///
/// ## Invariants
/// - `total_cents == subtotal_cents + tax_cents`
/// - cash: `payment_received_cents >= total_cents` and
///   `change_cents == payment_received_cents - total_cents`
/// - card: `payment_received_cents == total_cents` and `change_cents == 0`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    /// Human-legible unique identifier, distinct from the internal id.
    pub receipt_number: String,
    pub status: TransactionStatus,
    pub items: Vec<TransactionItem>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_received_cents: i64,
    pub change_cents: i64,
    pub timestamp: DateTime<Utc>,
    /// Cashier display name.
    pub cashier: String,
    /// Terminal id this transaction was rung up on.
    pub terminal: String,
}

impl Transaction {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the change due as Money.
    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

/// The request sent to the commit endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub items: Vec<TransactionItem>,
    pub payment_method: PaymentMethod,
    pub payment_received_cents: i64,
    pub cashier: String,
    pub terminal: String,
}

// =============================================================================
// Daily Sales
// =============================================================================

/// Running totals for a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySales {
    pub date: NaiveDate,
    pub sales_cents: i64,
    pub transaction_count: i64,
}

impl DailySales {
    /// Empty totals for the given date.
    pub fn empty(date: NaiveDate) -> Self {
        DailySales {
            date,
            sales_cents: 0,
            transaction_count: 0,
        }
    }
}

// =============================================================================
// Inventory Status
// =============================================================================

/// Catalog-wide stock summary returned by the catalog source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryStatus {
    pub total_products: usize,
    /// Product names with zero stock.
    pub out_of_stock: Vec<String>,
    /// Product names at or below the low-stock threshold.
    pub low_stock: Vec<String>,
}

// =============================================================================
// Audit Log
// =============================================================================

/// Who performed a logged action.
///
/// Stored by value: log entries never reference a live session object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub tenant: String,
    pub user: String,
    pub role: String,
}

impl Actor {
    /// The fallback identity used before any session is established.
    pub fn system() -> Self {
        Actor {
            tenant: "system".to_string(),
            user: "system".to_string(),
            role: "system".to_string(),
        }
    }
}

/// Where a log entry originated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSource {
    pub terminal: String,
    pub component: String,
}

/// Log entry category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    Login,
    Logout,
    Transaction,
    System,
    Error,
    Security,
    Inventory,
    UserManagement,
    Support,
    Api,
    Performance,
}

/// Log entry severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl LogSeverity {
    /// Derives a severity from an HTTP-style status code.
    ///
    /// ≥400 → error, ≥300 → warning, else info.
    pub fn from_status_code(status: u16) -> Self {
        if status >= 400 {
            LogSeverity::Error
        } else if status >= 300 {
            LogSeverity::Warning
        } else {
            LogSeverity::Info
        }
    }
}

/// A structured audit log entry.
///
/// Append-only; retention is enforced by the store (oldest evicted first).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub actor: Actor,
    pub action: String,
    pub description: String,
    pub category: LogCategory,
    pub severity: LogSeverity,
    pub source: LogSource,
}

// =============================================================================
// Unit Tests
// =============================================================================
