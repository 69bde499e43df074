//! # Cart
//!
//! The active checkout session's cart.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Caller Action            Operation               Cart Change           │
//! │  ─────────────            ─────────               ───────────           │
//! │                                                                         │
//! │  Scan / tap product ────► add_item() ───────────► upsert, qty capped   │
//! │                                                    at product stock     │
//! │  Change quantity ───────► update_quantity() ────► delta applied, ≤0    │
//! │                                                    removes the item     │
//! │  Remove line ───────────► remove_item() ────────► unconditional        │
//! │                                                                         │
//! │  Void sale ─────────────► clear() ──────────────► items emptied        │
//! │                                                                         │
//! │  INVARIANTS: no two items share a product id; quantity never exceeds   │
//! │  the product's stock at the time of the operation.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, TaxRate, TransactionItem};

// =============================================================================
// Cart Item
// =============================================================================

/// An item in the cart.
///
/// ## Design Notes
/// - `product_id`: reference to the product (for catalog lookup)
/// - price and tax rate are frozen at add time, so the cart displays
///   consistent data even if the catalog refreshes underneath it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Product id.
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Barcode at time of adding (frozen).
    pub barcode: Option<String>,

    /// Price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Tax rate in basis points at time of adding; `None` defers to the
    /// configured default VAT rate.
    pub tax_rate_bps: Option<u32>,

    /// Quantity in cart.
    pub quantity: i64,

    /// When this item was added to cart.
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a new cart item from a product with quantity 1.
    fn from_product(product: &Product) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            barcode: product.barcode.clone(),
            unit_price_cents: product.price_cents,
            tax_rate_bps: product.tax_rate_bps,
            quantity: 1,
            added_at: Utc::now(),
        }
    }

    /// Line total before tax (unit price × quantity).
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// Tax for this line, using the item's rate or the supplied default.
    pub fn tax_cents(&self, default_rate: TaxRate) -> i64 {
        let rate = self
            .tax_rate_bps
            .map(TaxRate::from_bps)
            .unwrap_or(default_rate);
        Money::from_cents(self.line_total_cents())
            .calculate_tax(rate)
            .cents()
    }

    /// Freezes this cart line into an immutable transaction snapshot.
    pub fn to_transaction_item(&self, default_rate: TaxRate) -> TransactionItem {
        let rate = self
            .tax_rate_bps
            .map(TaxRate::from_bps)
            .unwrap_or(default_rate);
        TransactionItem {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            barcode: self.barcode.clone(),
            unit_price_cents: self.unit_price_cents,
            quantity: self.quantity,
            tax_rate_bps: rate.bps(),
            line_total_cents: self.line_total_cents(),
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The checkout cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding same product increases quantity)
/// - Quantity is always ≥ 1 (an update reaching 0 removes the item)
/// - Quantity never exceeds the product's stock at the time of the operation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Cart {
    /// Items in the cart.
    pub items: Vec<CartItem>,

    /// When the cart was created/last cleared.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds one unit of a product to the cart.
    ///
    /// ## Behavior
    /// - Out of stock or inactive: cart unchanged, error returned for the
    ///   caller to surface as a warning
    /// - Already in cart: quantity incremented, capped at `product.stock`
    ///   (cap hit leaves the quantity unchanged)
    /// - Otherwise: new item appended with quantity 1
    pub fn add_item(&mut self, product: &Product) -> CoreResult<()> {
        if !product.is_active {
            return Err(CoreError::ProductNotFound(product.id.clone()));
        }

        if product.stock <= 0 {
            return Err(CoreError::OutOfStock {
                name: product.name.clone(),
            });
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            if item.quantity + 1 > product.stock {
                return Err(CoreError::InsufficientStock {
                    name: product.name.clone(),
                    available: product.stock,
                    requested: item.quantity + 1,
                });
            }
            item.quantity += 1;
            return Ok(());
        }

        self.items.push(CartItem::from_product(product));
        Ok(())
    }

    /// Applies a quantity delta to an item in the cart.
    ///
    /// ## Behavior
    /// - New quantity ≤ 0: removes the item
    /// - New quantity > `product.stock`: rejected, item unchanged
    /// - Otherwise: applied
    pub fn update_quantity(&mut self, product: &Product, delta: i64) -> CoreResult<()> {
        let Some(pos) = self.items.iter().position(|i| i.product_id == product.id) else {
            return Err(CoreError::NotInCart {
                product_id: product.id.clone(),
            });
        };

        let new_quantity = self.items[pos].quantity + delta;

        if new_quantity <= 0 {
            self.items.remove(pos);
            return Ok(());
        }

        if new_quantity > product.stock {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
                requested: new_quantity,
            });
        }

        self.items[pos].quantity = new_quantity;
        Ok(())
    }

    /// Removes an item from the cart by product id.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart {
                product_id: product_id.to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Clears all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    /// Returns the number of unique items in the cart.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity of all items.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Calculates the subtotal (before tax).
    pub fn subtotal_cents(&self) -> i64 {
        self.items.iter().map(|i| i.line_total_cents()).sum()
    }

    /// Calculates the total tax at the given default VAT rate.
    pub fn tax_cents(&self, default_rate: TaxRate) -> i64 {
        self.items.iter().map(|i| i.tax_cents(default_rate)).sum()
    }

    /// Calculates the grand total (subtotal + tax).
    pub fn total_cents(&self, default_rate: TaxRate) -> i64 {
        self.subtotal_cents() + self.tax_cents(default_rate)
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Freezes every line into transaction snapshots.
    pub fn snapshot_items(&self, default_rate: TaxRate) -> Vec<TransactionItem> {
        self.items
            .iter()
            .map(|i| i.to_transaction_item(default_rate))
            .collect()
    }

    /// Derives the totals summary for display layers.
    pub fn totals(&self, default_rate: TaxRate) -> CartTotals {
        CartTotals {
            item_count: self.item_count(),
            total_quantity: self.total_quantity(),
            subtotal_cents: self.subtotal_cents(),
            tax_cents: self.tax_cents(default_rate),
            total_cents: self.total_cents(default_rate),
        }
    }
}

/// Cart totals summary.
///
/// Derived on demand from cart state; no caching, no side effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
