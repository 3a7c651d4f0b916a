use chrono::NaiveDate;
use serde::Serialize;

use crate::ProgressLedger;

/// Point-in-time health of a ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub ready: bool,
    /// Memory holds changes the store has not accepted yet.
    pub pending_write: bool,
    pub period_start: NaiveDate,
    pub history_len: usize,
}

impl Health {
    /// Snapshot after bringing the ledger onto the current period.
    pub fn of(ledger: &mut ProgressLedger) -> Self {
        ledger.check_rollover();
        Self {
            ready: true,
            pending_write: ledger.pending_write(),
            period_start: ledger.period().period_start,
            history_len: ledger.history().len(),
        }
    }
}
