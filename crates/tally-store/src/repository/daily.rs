//! # Daily Sales Totals
//!
//! Per-calendar-day running totals, incremented on every committed or
//! offline-committed transaction and overwritten by the background
//! refresh when the gateway reports authoritative numbers.

use chrono::NaiveDate;
use tracing::debug;

use tally_core::DailySales;

use crate::error::StoreResult;
use crate::kv::KvRepository;

/// Key prefix; the full key is `daily_sales:<YYYY-MM-DD>`.
const KEY_PREFIX: &str = "daily_sales:";

fn key_for(date: NaiveDate) -> String {
    format!("{}{}", KEY_PREFIX, date)
}

/// Repository for per-day sales totals.
#[derive(Debug, Clone)]
pub struct DailySalesRepository {
    kv: KvRepository,
}

impl DailySalesRepository {
    /// Creates a new DailySalesRepository.
    pub fn new(kv: KvRepository) -> Self {
        DailySalesRepository { kv }
    }

    /// Returns the totals for a date (zeroed if nothing recorded yet).
    pub async fn get(&self, date: NaiveDate) -> StoreResult<DailySales> {
        Ok(self
            .kv
            .get_json(&key_for(date))
            .await?
            .unwrap_or_else(|| DailySales::empty(date)))
    }

    /// Records one transaction against the date's totals.
    pub async fn record_transaction(
        &self,
        date: NaiveDate,
        total_cents: i64,
    ) -> StoreResult<DailySales> {
        let mut totals = self.get(date).await?;
        totals.sales_cents += total_cents;
        totals.transaction_count += 1;
        self.kv.set_json(&key_for(date), &totals).await?;

        debug!(
            date = %date,
            sales_cents = totals.sales_cents,
            count = totals.transaction_count,
            "Daily totals updated"
        );
        Ok(totals)
    }

    /// Overwrites a date's totals with authoritative gateway numbers.
    pub async fn put(&self, totals: DailySales) -> StoreResult<()> {
        self.kv.set_json(&key_for(totals.date), &totals).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
