//! Weekly points ledger for the health tracker.
//!
//! Points earned per day and category are accumulated into a Monday-aligned
//! period. When the calendar week changes the period rolls over and a summary
//! of the old week is archived into a short history.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod habits;
pub mod ledger;
pub mod observability;
pub mod period;
pub mod steps;
pub mod store;
pub mod utils;

pub use config::{DayKeyPolicy, LedgerConfig, PointsConfig};
pub use ledger::{DaySummary, ProgressLedger, WeekSummary};
pub use period::{LedgerState, Period};
pub use store::{Gateway, JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use utils::{Clock, ManualClock, SystemClock};

/// Maximum number of archived periods kept in the history.
pub const HISTORY_CAPACITY: usize = 4;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid day key: {0}")]
    InvalidDayKey(String),
    #[error("day {day} is outside the active period starting {period_start}")]
    DayOutsidePeriod {
        day: NaiveDate,
        period_start: NaiveDate,
    },
    #[error("points on {day} for {category} would overflow")]
    PointsOverflow { day: NaiveDate, category: Category },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// A source of point contributions.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Diet,
    Workout,
    Habits,
    Steps,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Diet,
        Category::Workout,
        Category::Habits,
        Category::Steps,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Diet => "diet",
            Category::Workout => "workout",
            Category::Habits => "habits",
            Category::Steps => "steps",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diet" => Ok(Category::Diet),
            "workout" => Ok(Category::Workout),
            "habits" | "habit" => Ok(Category::Habits),
            "steps" => Ok(Category::Steps),
            other => Err(LedgerError::Config(format!("unknown category: {other}"))),
        }
    }
}

/// Points earned on one calendar day.
///
/// `total` always equals the sum of the four category fields when the record
/// is only built through [`DayPoints::checked_add`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DayPoints {
    pub diet: i64,
    pub workout: i64,
    pub habits: i64,
    pub steps: i64,
    pub total: i64,
}

impl DayPoints {
    pub fn get(&self, category: Category) -> i64 {
        match category {
            Category::Diet => self.diet,
            Category::Workout => self.workout,
            Category::Habits => self.habits,
            Category::Steps => self.steps,
        }
    }

    /// The record with `delta` added to `category` and to `total`, or `None`
    /// if either would overflow.
    pub fn checked_add(&self, category: Category, delta: i64) -> Option<DayPoints> {
        let mut next = *self;
        let field = match category {
            Category::Diet => &mut next.diet,
            Category::Workout => &mut next.workout,
            Category::Habits => &mut next.habits,
            Category::Steps => &mut next.steps,
        };
        *field = field.checked_add(delta)?;
        next.total = next.total.checked_add(delta)?;
        Some(next)
    }

    /// Sum of the four categories, `None` on overflow.
    pub fn category_sum(&self) -> Option<i64> {
        self.diet
            .checked_add(self.workout)?
            .checked_add(self.habits)?
            .checked_add(self.steps)
    }
}

/// Weekly completion percentage per category, each in `0..=100`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CompletionRates {
    pub diet: u8,
    pub workout: u8,
    pub habits: u8,
    pub steps: u8,
}

impl CompletionRates {
    pub fn get(&self, category: Category) -> u8 {
        match category {
            Category::Diet => self.diet,
            Category::Workout => self.workout,
            Category::Habits => self.habits,
            Category::Steps => self.steps,
        }
    }

    pub fn set(&mut self, category: Category, percent: u8) {
        let percent = percent.min(100);
        match category {
            Category::Diet => self.diet = percent,
            Category::Workout => self.workout = percent,
            Category::Habits => self.habits = percent,
            Category::Steps => self.steps = percent,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Streaks {
    pub current: u32,
    pub longest: u32,
}

/// Summary of a completed period, immutable once archived.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(alias = "weekStart")]
    pub period_start: NaiveDate,
    pub total: i64,
    #[serde(rename = "completion", alias = "completionRates", default)]
    pub completion_rates: CompletionRates,
}
