//! The progress ledger: period state bound to a clock and a persistence gateway.
//!
//! Every mutating call first checks for a week rollover, then mutates the
//! in-memory state, then saves through the gateway. Saves are best effort: a
//! failure is logged and the write stays pending until the next mutation
//! saves the full record again.

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;

use crate::config::{DayKeyPolicy, LedgerConfig, PointsConfig};
use crate::period::{LedgerState, Period};
use crate::store::{Gateway, KeyValueStore, PROGRESS_KEY};
use crate::utils::{Clock, period_start_key, today_key};
use crate::{Category, CompletionRates, DayPoints, HistoryEntry, LedgerError, Streaks};

pub struct ProgressLedger {
    state: LedgerState,
    gateway: Gateway<LedgerState>,
    clock: Arc<dyn Clock>,
    policy: DayKeyPolicy,
    points: PointsConfig,
    pending_write: bool,
}

impl ProgressLedger {
    /// Rehydrate the ledger from `store`, or start a fresh period.
    ///
    /// A stored record from an earlier week is rolled over (and archived)
    /// immediately, so the returned ledger always sits on the current period.
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: &LedgerConfig,
    ) -> Self {
        let gateway = Gateway::new(store, PROGRESS_KEY);
        let start = period_start_key(clock.as_ref());
        let mut state = gateway.load_or_else(|| LedgerState::fresh(start));
        // Derived totals are never trusted from storage.
        state.period.recompute_total();
        let mut ledger = Self {
            state,
            gateway,
            clock,
            policy: config.day_policy,
            points: config.points,
            pending_write: false,
        };
        ledger.check_rollover();
        tracing::debug!(
            period_start = %ledger.state.period.period_start,
            history = ledger.state.history.len(),
            "progress ledger opened"
        );
        ledger
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    /// The period as of the last mutation or rollover check. Use
    /// [`Self::summary`] for a view aligned with today.
    pub fn period(&self) -> &Period {
        &self.state.period
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.state.history
    }

    pub fn streaks(&self) -> Streaks {
        self.state.period.streaks
    }

    pub fn day(&self, day: NaiveDate) -> Option<&DayPoints> {
        self.state.period.daily_points.get(&day)
    }

    pub fn today(&self) -> NaiveDate {
        today_key(self.clock.as_ref())
    }

    pub fn policy(&self) -> DayKeyPolicy {
        self.policy
    }

    /// True when the last save failed and memory is ahead of storage.
    pub fn pending_write(&self) -> bool {
        self.pending_write
    }

    /// Start a new period if the calendar week has moved on.
    pub fn check_rollover(&mut self) -> bool {
        let current = period_start_key(self.clock.as_ref());
        let outgoing = self.state.period.period_start;
        if !self.state.roll_over(current) {
            return false;
        }
        tracing::info!(
            from = %outgoing,
            to = %current,
            archived = self.state.history.first().is_some_and(|h| h.period_start == outgoing),
            "progress period rolled over"
        );
        self.persist();
        true
    }

    /// Add a signed point delta to `category` on `day`.
    ///
    /// The steps category is not guarded here; use [`Self::award_steps_bonus`]
    /// for the once-per-day goal bonus.
    pub fn apply_points(
        &mut self,
        day: NaiveDate,
        category: Category,
        delta: i64,
    ) -> Result<DayPoints, LedgerError> {
        self.check_rollover();
        self.admit(day)?;
        let updated = self.state.period.apply(day, category, delta)?;
        tracing::debug!(%day, %category, delta, total = updated.total, "points applied");
        self.persist();
        Ok(updated)
    }

    /// Apply the steps-goal bonus to `day` unless that day already has steps
    /// points. Returns whether the bonus was applied.
    pub fn award_steps_bonus(&mut self, day: NaiveDate) -> Result<bool, LedgerError> {
        self.check_rollover();
        self.admit(day)?;
        let applied = self
            .state
            .period
            .award_steps_bonus(day, self.points.steps_goal_bonus)?;
        if applied {
            tracing::debug!(%day, bonus = self.points.steps_goal_bonus, "steps goal bonus awarded");
            self.persist();
        }
        Ok(applied)
    }

    /// Meal checked (`completed`) or skipped. Defaults to today.
    pub fn track_diet(
        &mut self,
        day: Option<NaiveDate>,
        completed: bool,
    ) -> Result<DayPoints, LedgerError> {
        let day = day.unwrap_or_else(|| self.today());
        let delta = if completed {
            self.points.diet_completed
        } else {
            self.points.diet_skipped
        };
        self.apply_points(day, Category::Diet, delta)
    }

    /// Workout checked (`completed`) or skipped. Defaults to today.
    pub fn track_workout(
        &mut self,
        day: Option<NaiveDate>,
        completed: bool,
    ) -> Result<DayPoints, LedgerError> {
        let day = day.unwrap_or_else(|| self.today());
        let delta = if completed {
            self.points.workout_completed
        } else {
            self.points.workout_skipped
        };
        self.apply_points(day, Category::Workout, delta)
    }

    /// Habit toggled today; `points` is negative when a habit is unchecked.
    pub fn track_habit(&mut self, points: i64) -> Result<DayPoints, LedgerError> {
        let today = self.today();
        self.apply_points(today, Category::Habits, points)
    }

    pub fn track_steps_goal(&mut self, achieved: bool) -> Result<bool, LedgerError> {
        if !achieved {
            return Ok(false);
        }
        let today = self.today();
        self.award_steps_bonus(today)
    }

    /// Set a category's weekly completion rate from a completed/total count.
    pub fn record_completion(
        &mut self,
        category: Category,
        completed: u32,
        total: u32,
    ) -> Option<u8> {
        self.check_rollover();
        let percent = self.state.period.record_completion(category, completed, total)?;
        self.persist();
        Some(percent)
    }

    /// Zero one day's points. Returns whether the day existed.
    pub fn reset_day(&mut self, day: NaiveDate) -> bool {
        self.check_rollover();
        let reset = self.state.period.reset_day(day);
        if reset {
            self.persist();
        }
        reset
    }

    /// Record the current streak computed by the habit tracker.
    pub fn update_streak(&mut self, current: u32) {
        self.check_rollover();
        self.state.update_streak(current);
        self.persist();
    }

    /// Derived view of the current period. Rolls over first so the view
    /// never mixes today's date with last week's points.
    pub fn summary(&mut self) -> WeekSummary {
        self.check_rollover();
        let today = self.today();
        let period = &self.state.period;
        let days: Vec<DaySummary> = period
            .daily_points
            .iter()
            .map(|(date, points)| DaySummary::new(*date, points.total))
            .collect();
        // Best day needs strictly positive points.
        let best_day = days
            .iter()
            .fold(None::<&DaySummary>, |best, d| match best {
                Some(b) if b.total >= d.total => Some(b),
                _ if d.total > 0 => Some(d),
                _ => best,
            })
            .cloned();
        let previous_period_total = self.state.history.first().map_or(0, |h| h.total);
        // Computed in f64; the cast back to i64 saturates.
        let change_percent = if previous_period_total > 0 {
            let previous = previous_period_total as f64;
            ((period.period_total as f64 - previous) / previous * 100.0).round() as i64
        } else {
            0
        };
        WeekSummary {
            period_start: period.period_start,
            today,
            today_points: period.daily_points.get(&today).copied().unwrap_or_default(),
            days,
            best_day,
            period_total: period.period_total,
            previous_period_total,
            change_percent,
            completion_rates: period.completion_rates,
            streaks: period.streaks,
        }
    }

    fn admit(&self, day: NaiveDate) -> Result<(), LedgerError> {
        if self.policy == DayKeyPolicy::Strict && !self.state.period.contains(day) {
            return Err(LedgerError::DayOutsidePeriod {
                day,
                period_start: self.state.period.period_start,
            });
        }
        Ok(())
    }

    fn persist(&mut self) {
        match self.gateway.save(&self.state) {
            Ok(()) => {
                if self.pending_write {
                    tracing::info!(
                        key = self.gateway.key(),
                        "progress ledger saved after earlier failure"
                    );
                }
                self.pending_write = false;
            }
            Err(err) => {
                tracing::warn!(
                    key = self.gateway.key(),
                    error = %err,
                    "failed to save progress ledger; keeping in-memory state"
                );
                self.pending_write = true;
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub weekday: String,
    pub total: i64,
}

impl DaySummary {
    fn new(date: NaiveDate, total: i64) -> Self {
        Self {
            date,
            weekday: date.format("%a").to_string(),
            total,
        }
    }
}

/// Derived view of the active period for dashboards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    pub period_start: NaiveDate,
    pub today: NaiveDate,
    pub today_points: DayPoints,
    pub days: Vec<DaySummary>,
    pub best_day: Option<DaySummary>,
    pub period_total: i64,
    pub previous_period_total: i64,
    pub change_percent: i64,
    pub completion_rates: CompletionRates,
    pub streaks: Streaks,
}
