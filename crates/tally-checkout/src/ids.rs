//! # Identifier Generation
//!
//! Receipt numbers are human-legible and distinct from internal UUIDs:
//! a cashier can read one over the phone, and support can locate the
//! transaction from it.

use chrono::Utc;

/// Generates a receipt number: `yymmdd-HHMMSS-NNNN`.
pub(crate) fn receipt_number() -> String {
    format!("{}-{:04}", Utc::now().format("%y%m%d-%H%M%S"), clock_noise() % 10_000)
}

/// Generates an offline receipt number: `OFF-yymmdd-HHMMSS-NNNN`.
///
/// The prefix keeps offline records visibly distinct during
/// reconciliation.
pub(crate) fn offline_receipt_number() -> String {
    format!("OFF-{}", receipt_number())
}

fn clock_noise() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0)
}
