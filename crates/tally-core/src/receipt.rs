//! # Receipt Builder
//!
//! Pure transformation from a finalized [`Transaction`] into a display or
//! print representation.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Receipt Building                                     │
//! │                                                                         │
//! │  Transaction ──► build_receipt(profile, txn) ──► ReceiptDocument       │
//! │                                                       │                 │
//! │                              ┌────────────────────────┤                 │
//! │                              ▼                        ▼                 │
//! │                    on-screen dialog          render_text(width)         │
//! │                    (reads the document)      (print-formatted)          │
//! │                                                                         │
//! │  No Transaction field is recomputed here - only formatted. Both        │
//! │  consumers read the SAME document, so they can never disagree.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{PaymentMethod, Transaction};

// =============================================================================
// Store Profile
// =============================================================================

/// Static store identity printed on every receipt.
///
/// Loaded once from configuration; the receipt builder never mutates it.
/// Missing fields fall back to the defaults, so a config file can set
/// just the store name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreProfile {
    pub name: String,
    pub address_lines: Vec<String>,
    pub phone: String,
    pub email: String,
    /// VAT registration number printed in the header.
    pub vat_registration: String,
    /// Commercial/legal registration number printed in the footer.
    pub commercial_registration: String,
    /// Currency symbol prefix for all formatted amounts.
    pub currency_symbol: String,
    /// Return/exchange policy lines printed in the footer.
    pub policy_lines: Vec<String>,
}

impl Default for StoreProfile {
    fn default() -> Self {
        StoreProfile {
            name: "Tally Store".to_string(),
            address_lines: vec!["1 Market Street".to_string()],
            phone: "+00 000 0000".to_string(),
            email: "info@tally.example".to_string(),
            vat_registration: "VAT-0000000000".to_string(),
            commercial_registration: "CR-0000000000".to_string(),
            currency_symbol: "$".to_string(),
            policy_lines: vec!["Goods may be exchanged within 7 days with receipt.".to_string()],
        }
    }
}

// =============================================================================
// Receipt Document
// =============================================================================

/// Store identity block at the top of the receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptHeader {
    pub store_name: String,
    pub address_lines: Vec<String>,
    pub phone: String,
    pub vat_registration: String,
}

/// Transaction metadata block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptMeta {
    pub date: String,
    pub time: String,
    pub receipt_number: String,
    pub terminal: String,
    pub cashier: String,
    /// Set when the transaction was captured offline.
    pub offline: bool,
}

/// One itemized line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: String,
    pub line_total: String,
}

/// Totals block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptTotals {
    pub subtotal: String,
    pub tax: String,
    pub total: String,
}

/// Payment block; cash carries tendered/change, card an approval notice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ReceiptPayment {
    Cash { received: String, change: String },
    Card { notice: String },
}

/// Footer block: policy, contact, legal registration numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptFooter {
    pub policy_lines: Vec<String>,
    pub contact: String,
    pub commercial_registration: String,
}

/// The complete receipt document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptDocument {
    pub header: ReceiptHeader,
    pub meta: ReceiptMeta,
    pub lines: Vec<ReceiptLine>,
    pub totals: ReceiptTotals,
    pub payment: ReceiptPayment,
    pub footer: ReceiptFooter,
}

// =============================================================================
// Builder
// =============================================================================

/// Builds the receipt document for a finalized transaction.
///
/// Every monetary field is formatted from the transaction verbatim;
/// nothing is recomputed.
pub fn build_receipt(profile: &StoreProfile, txn: &Transaction) -> ReceiptDocument {
    let symbol = profile.currency_symbol.as_str();

    let lines = txn
        .items
        .iter()
        .map(|item| ReceiptLine {
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price().format_with(symbol),
            line_total: item.line_total().format_with(symbol),
        })
        .collect();

    let payment = match txn.payment_method {
        PaymentMethod::Cash => ReceiptPayment::Cash {
            received: Money::from_cents(txn.payment_received_cents).format_with(symbol),
            change: txn.change().format_with(symbol),
        },
        PaymentMethod::Card => ReceiptPayment::Card {
            notice: "CARD PAYMENT APPROVED".to_string(),
        },
    };

    ReceiptDocument {
        header: ReceiptHeader {
            store_name: profile.name.clone(),
            address_lines: profile.address_lines.clone(),
            phone: profile.phone.clone(),
            vat_registration: profile.vat_registration.clone(),
        },
        meta: ReceiptMeta {
            date: txn.timestamp.format("%Y-%m-%d").to_string(),
            time: txn.timestamp.format("%H:%M:%S").to_string(),
            receipt_number: txn.receipt_number.clone(),
            terminal: txn.terminal.clone(),
            cashier: txn.cashier.clone(),
            offline: matches!(txn.status, crate::types::TransactionStatus::OfflinePending),
        },
        lines,
        totals: ReceiptTotals {
            subtotal: Money::from_cents(txn.subtotal_cents).format_with(symbol),
            tax: Money::from_cents(txn.tax_cents).format_with(symbol),
            total: txn.total().format_with(symbol),
        },
        payment,
        footer: ReceiptFooter {
            policy_lines: profile.policy_lines.clone(),
            contact: format!("{} · {}", profile.phone, profile.email),
            commercial_registration: profile.commercial_registration.clone(),
        },
    }
}

// =============================================================================
// Text Rendering
// =============================================================================

impl ReceiptDocument {
    /// Renders the document as fixed-width text for printing.
    ///
    /// Deterministic: rendering the same document twice yields the same
    /// output, and the on-screen dialog reads the identical fields.
    pub fn render_text(&self, width: usize) -> String {
        let width = width.max(24);
        let mut out = String::new();
        let rule = "-".repeat(width);

        out.push_str(&center(&self.header.store_name, width));
        for line in &self.header.address_lines {
            out.push_str(&center(line, width));
        }
        out.push_str(&center(&self.header.phone, width));
        out.push_str(&center(&format!("VAT {}", self.header.vat_registration), width));
        out.push_str(&rule);
        out.push('\n');

        out.push_str(&two_col(&format!("Date: {}", self.meta.date), &self.meta.time, width));
        out.push_str(&two_col("Receipt:", &self.meta.receipt_number, width));
        out.push_str(&two_col("Terminal:", &self.meta.terminal, width));
        out.push_str(&two_col("Cashier:", &self.meta.cashier, width));
        if self.meta.offline {
            out.push_str(&center("* OFFLINE - PENDING SYNC *", width));
        }
        out.push_str(&rule);
        out.push('\n');

        for line in &self.lines {
            out.push_str(&line.name);
            out.push('\n');
            out.push_str(&two_col(
                &format!("  {} x {}", line.quantity, line.unit_price),
                &line.line_total,
                width,
            ));
        }
        out.push_str(&rule);
        out.push('\n');

        out.push_str(&two_col("Subtotal", &self.totals.subtotal, width));
        out.push_str(&two_col("Tax", &self.totals.tax, width));
        out.push_str(&two_col("TOTAL", &self.totals.total, width));
        out.push_str(&rule);
        out.push('\n');

        match &self.payment {
            ReceiptPayment::Cash { received, change } => {
                out.push_str(&two_col("Cash", received, width));
                out.push_str(&two_col("Change", change, width));
            }
            ReceiptPayment::Card { notice } => {
                out.push_str(&center(notice, width));
            }
        }
        out.push_str(&rule);
        out.push('\n');

        for line in &self.footer.policy_lines {
            out.push_str(&center(line, width));
        }
        out.push_str(&center(&self.footer.contact, width));
        out.push_str(&center(&format!("Reg {}", self.footer.commercial_registration), width));

        out
    }
}

fn center(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let pad = width.saturating_sub(len) / 2;
    format!("{}{}\n", " ".repeat(pad), text)
}

fn two_col(left: &str, right: &str, width: usize) -> String {
    let used = left.chars().count() + right.chars().count();
    let pad = width.saturating_sub(used).max(1);
    format!("{}{}{}\n", left, " ".repeat(pad), right)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransactionItem, TransactionStatus};
    use chrono::TimeZone;

    fn sample_transaction(method: PaymentMethod) -> Transaction {
        Transaction {
            id: "txn-1".to_string(),
            receipt_number: "260806-120000-0042".to_string(),
            status: TransactionStatus::Committed,
            items: vec![TransactionItem {
                product_id: "p1".to_string(),
                name: "Olive Oil 1L".to_string(),
                barcode: Some("6001234567890".to_string()),
                unit_price_cents: 4500,
                quantity: 2,
                tax_rate_bps: 1500,
                line_total_cents: 9000,
            }],
            subtotal_cents: 9000,
            tax_cents: 1350,
            total_cents: 10350,
            payment_method: method,
            payment_received_cents: 11000,
            change_cents: 650,
            timestamp: chrono::Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap(),
            cashier: "Amina".to_string(),
            terminal: "POS-042".to_string(),
        }
    }

    #[test]
    fn test_build_receipt_formats_without_recomputing() {
        let profile = StoreProfile::default();
        // Deliberately inconsistent tax: the builder must format it
        // verbatim, not recompute it from the items.
        let mut txn = sample_transaction(PaymentMethod::Cash);
        txn.tax_cents = 9999;

        let doc = build_receipt(&profile, &txn);
        assert_eq!(doc.totals.tax, "$99.99");
        assert_eq!(doc.totals.subtotal, "$90.00");
        assert_eq!(doc.totals.total, "$103.50");
    }

    #[test]
    fn test_cash_payment_block() {
        let doc = build_receipt(&StoreProfile::default(), &sample_transaction(PaymentMethod::Cash));
        match doc.payment {
            ReceiptPayment::Cash { received, change } => {
                assert_eq!(received, "$110.00");
                assert_eq!(change, "$6.50");
            }
            ReceiptPayment::Card { .. } => panic!("expected cash block"),
        }
    }

    #[test]
    fn test_card_payment_block() {
        let doc = build_receipt(&StoreProfile::default(), &sample_transaction(PaymentMethod::Card));
        assert!(matches!(doc.payment, ReceiptPayment::Card { .. }));
    }

    #[test]
    fn test_meta_fields() {
        let doc = build_receipt(&StoreProfile::default(), &sample_transaction(PaymentMethod::Cash));
        assert_eq!(doc.meta.date, "2026-08-06");
        assert_eq!(doc.meta.time, "12:00:00");
        assert_eq!(doc.meta.receipt_number, "260806-120000-0042");
        assert_eq!(doc.meta.terminal, "POS-042");
        assert_eq!(doc.meta.cashier, "Amina");
        assert!(!doc.meta.offline);
    }

    #[test]
    fn test_offline_flag_set() {
        let mut txn = sample_transaction(PaymentMethod::Cash);
        txn.status = TransactionStatus::OfflinePending;

        let doc = build_receipt(&StoreProfile::default(), &txn);
        assert!(doc.meta.offline);
        assert!(doc.render_text(42).contains("OFFLINE"));
    }

    #[test]
    fn test_render_text_is_deterministic() {
        let doc = build_receipt(&StoreProfile::default(), &sample_transaction(PaymentMethod::Cash));
        let a = doc.render_text(42);
        let b = doc.render_text(42);
        assert_eq!(a, b);

        assert!(a.contains("Tally Store"));
        assert!(a.contains("260806-120000-0042"));
        assert!(a.contains("2 x $45.00"));
        assert!(a.contains("$103.50"));
        assert!(a.contains("Change"));
    }

    #[test]
    fn test_render_narrow_width_does_not_panic() {
        let doc = build_receipt(&StoreProfile::default(), &sample_transaction(PaymentMethod::Cash));
        let _ = doc.render_text(0);
        let _ = doc.render_text(24);
    }
}
