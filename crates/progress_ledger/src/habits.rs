//! Daily habit completion and the streak derived from it.
//!
//! The ledger only records streak values; this tracker owns the day-over-day
//! computation and hands its result to [`crate::ProgressLedger::update_streak`].

use chrono::{NaiveDate, TimeDelta};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::store::{Gateway, HABITS_KEY, KeyValueStore};
use crate::utils::Clock;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HabitLog {
    /// Per day, habit id to checked state.
    #[serde(default)]
    pub completed: BTreeMap<NaiveDate, BTreeMap<String, bool>>,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub streak: u32,
    /// Last day a habit was toggled.
    #[serde(default)]
    pub last_date: Option<NaiveDate>,
}

impl HabitLog {
    /// Whether at least one habit is checked on `day`.
    pub fn any_completed(&self, day: NaiveDate) -> bool {
        self.completed
            .get(&day)
            .is_some_and(|habits| habits.values().any(|done| *done))
    }

    pub fn is_completed(&self, day: NaiveDate, habit_id: &str) -> bool {
        self.completed
            .get(&day)
            .and_then(|habits| habits.get(habit_id))
            .copied()
            .unwrap_or(false)
    }

    /// Flip `habit_id` on `today` and return the signed point delta.
    pub fn toggle(&mut self, today: NaiveDate, habit_id: &str, habit_points: i64) -> i64 {
        let was_completed = self.is_completed(today, habit_id);
        self.completed
            .entry(today)
            .or_default()
            .insert(habit_id.to_string(), !was_completed);

        let delta = if was_completed {
            habit_points.saturating_neg()
        } else {
            habit_points
        };
        self.points = self.points.saturating_add(delta);

        if self.last_date != Some(today) {
            let yesterday = today - TimeDelta::days(1);
            self.streak = if self.any_completed(yesterday) {
                self.streak.saturating_add(1)
            } else {
                1
            };
            self.last_date = Some(today);
        }
        delta
    }
}

pub struct HabitTracker {
    log: HabitLog,
    gateway: Gateway<HabitLog>,
    clock: Arc<dyn Clock>,
}

impl HabitTracker {
    pub fn open(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let gateway = Gateway::new(store, HABITS_KEY);
        let log = gateway.load_or_else(HabitLog::default);
        Self { log, gateway, clock }
    }

    pub fn log(&self) -> &HabitLog {
        &self.log
    }

    pub fn streak(&self) -> u32 {
        self.log.streak
    }

    pub fn points(&self) -> i64 {
        self.log.points
    }

    pub fn is_completed_today(&self, habit_id: &str) -> bool {
        self.log.is_completed(self.clock.today(), habit_id)
    }

    /// Toggle a habit for today. Returns the signed point delta to feed into
    /// the ledger's habits category.
    pub fn toggle(&mut self, habit_id: &str, habit_points: i64) -> i64 {
        let today = self.clock.today();
        let delta = self.log.toggle(today, habit_id, habit_points);
        tracing::debug!(habit_id, delta, streak = self.log.streak, "habit toggled");
        self.persist();
        delta
    }

    /// Clear today's completions, keeping streak and points.
    pub fn reset_day(&mut self) {
        let today = self.clock.today();
        self.log.completed.insert(today, BTreeMap::new());
        self.persist();
    }

    /// Put back a log captured earlier with [`Self::log`].
    pub fn restore(&mut self, log: HabitLog) {
        self.log = log;
        self.persist();
    }

    /// Forget everything.
    pub fn reset(&mut self) {
        self.log = HabitLog::default();
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.gateway.save(&self.log) {
            tracing::warn!(key = self.gateway.key(), error = %err, "failed to save habit log");
        }
    }
}
