//! Period state: construction, point accumulation and rollover archiving.
//!
//! Everything here is pure state manipulation. Persistence and the clock live
//! in [`crate::ledger`].

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::utils::period_day_keys;
use crate::{
    Category, CompletionRates, DayPoints, HISTORY_CAPACITY, HistoryEntry, LedgerError, Streaks,
};

/// The active tracking week.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(alias = "weekStart")]
    pub period_start: NaiveDate,
    pub daily_points: BTreeMap<NaiveDate, DayPoints>,
    #[serde(alias = "weeklyTotal")]
    pub period_total: i64,
    #[serde(rename = "weeklyCompletion", alias = "completionRates", default)]
    pub completion_rates: CompletionRates,
    #[serde(default)]
    pub streaks: Streaks,
}

impl Period {
    /// A zeroed period with one entry per day of the week starting at `start`.
    pub fn fresh(start: NaiveDate) -> Self {
        let daily_points = period_day_keys(start)
            .into_iter()
            .map(|day| (day, DayPoints::default()))
            .collect();
        Self {
            period_start: start,
            daily_points,
            period_total: 0,
            completion_rates: CompletionRates::default(),
            streaks: Streaks::default(),
        }
    }

    /// Whether `day` is one of the seven nominal days of this period.
    pub fn contains(&self, day: NaiveDate) -> bool {
        period_day_keys(self.period_start).contains(&day)
    }

    /// Add `delta` to `category` on `day`, creating the day if needed.
    ///
    /// Nothing changes when the day or period total would overflow.
    pub fn apply(
        &mut self,
        day: NaiveDate,
        category: Category,
        delta: i64,
    ) -> Result<DayPoints, LedgerError> {
        let overflow = || LedgerError::PointsOverflow { day, category };
        let current = self.daily_points.get(&day).copied().unwrap_or_default();
        let updated = current.checked_add(category, delta).ok_or_else(overflow)?;
        let period_total = self
            .daily_points
            .iter()
            .filter(|(key, _)| **key != day)
            .try_fold(updated.total, |acc, (_, points)| acc.checked_add(points.total))
            .ok_or_else(overflow)?;
        self.daily_points.insert(day, updated);
        self.period_total = period_total;
        Ok(updated)
    }

    /// Apply the steps bonus unless the day already carries steps points.
    /// Returns whether the bonus was applied.
    ///
    /// Only an exact zero counts as "not yet awarded", so a bonus that was
    /// undone back to zero can be earned again.
    pub fn award_steps_bonus(&mut self, day: NaiveDate, bonus: i64) -> Result<bool, LedgerError> {
        let already = self
            .daily_points
            .get(&day)
            .is_some_and(|points| points.steps != 0);
        if already {
            return Ok(false);
        }
        self.apply(day, Category::Steps, bonus)?;
        Ok(true)
    }

    /// Zero an existing day. Missing days are left alone.
    pub fn reset_day(&mut self, day: NaiveDate) -> bool {
        let Some(entry) = self.daily_points.get_mut(&day) else {
            return false;
        };
        *entry = DayPoints::default();
        self.recompute_total();
        true
    }

    /// Set the weekly completion percentage from a completed/total count.
    /// A zero total leaves the rate untouched.
    pub fn record_completion(
        &mut self,
        category: Category,
        completed: u32,
        total: u32,
    ) -> Option<u8> {
        if total == 0 {
            return None;
        }
        let percent = (f64::from(completed) / f64::from(total) * 100.0).round();
        let percent = percent.clamp(0.0, 100.0) as u8;
        self.completion_rates.set(category, percent);
        Some(percent)
    }

    /// Full recomputation rather than incremental so drift cannot accumulate.
    /// Saturates, since stored records are not bounded by [`Period::apply`].
    pub fn recompute_total(&mut self) {
        self.period_total = self
            .daily_points
            .values()
            .fold(0i64, |acc, d| acc.saturating_add(d.total));
    }
}

/// The complete persisted record: the active period plus archived history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LedgerState {
    #[serde(flatten)]
    pub period: Period,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl LedgerState {
    pub fn fresh(start: NaiveDate) -> Self {
        Self {
            period: Period::fresh(start),
            history: Vec::new(),
        }
    }

    /// Move to the period beginning at `new_start`.
    ///
    /// A non-empty outgoing period is archived at the front of the history,
    /// which is then cut back to [`HISTORY_CAPACITY`]. Streaks carry over.
    /// Returns `false` without touching anything when already on `new_start`.
    pub fn roll_over(&mut self, new_start: NaiveDate) -> bool {
        if self.period.period_start == new_start {
            return false;
        }
        if self.period.period_total > 0 {
            self.history.insert(
                0,
                HistoryEntry {
                    period_start: self.period.period_start,
                    total: self.period.period_total,
                    completion_rates: self.period.completion_rates,
                },
            );
            self.history.truncate(HISTORY_CAPACITY);
        }
        self.period = Period {
            streaks: self.period.streaks,
            ..Period::fresh(new_start)
        };
        true
    }

    /// Record the externally derived streak and ratchet the longest seen.
    pub fn update_streak(&mut self, current: u32) {
        let streaks = &mut self.period.streaks;
        streaks.current = current;
        if current > streaks.longest {
            streaks.longest = current;
        }
    }
}
