use crate::LedgerError;
use std::path::PathBuf;

pub const DEFAULT_DATA_DIR: &str = ".progress-ledger";
pub const DEFAULT_STEPS_GOAL: u32 = 10_000;

/// How the ledger treats day keys outside the active period's seven days.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DayKeyPolicy {
    /// Create the day and count it towards the period.
    #[default]
    Lenient,
    /// Reject the update with [`LedgerError::DayOutsidePeriod`].
    Strict,
}

impl std::str::FromStr for DayKeyPolicy {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(LedgerError::Config(format!(
                "PROGRESS_LEDGER_DAY_POLICY must be lenient or strict, got {other}"
            ))),
        }
    }
}

/// Points awarded by the convenience tracking entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointsConfig {
    pub diet_completed: i64,
    pub diet_skipped: i64,
    pub workout_completed: i64,
    pub workout_skipped: i64,
    pub steps_goal_bonus: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            diet_completed: 10,
            diet_skipped: -5,
            workout_completed: 15,
            workout_skipped: -5,
            steps_goal_bonus: 20,
        }
    }
}

#[derive(Clone, Debug)]
pub struct LedgerConfig {
    pub data_dir: PathBuf,
    pub day_policy: DayKeyPolicy,
    pub steps_goal: u32,
    pub points: PointsConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            day_policy: DayKeyPolicy::default(),
            steps_goal: DEFAULT_STEPS_GOAL,
            points: PointsConfig::default(),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Result<Self, LedgerError> {
        Self::from_env_with(|k| std::env::var(k).ok())
    }

    /// Testable helper that reads configuration values using the provided
    /// function instead of the process environment.
    pub fn from_env_with<F>(mut get: F) -> Result<Self, LedgerError>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let data_dir = get("PROGRESS_LEDGER_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let day_policy = match get("PROGRESS_LEDGER_DAY_POLICY") {
            Some(raw) => raw.parse()?,
            None => DayKeyPolicy::default(),
        };
        let steps_goal = match get("PROGRESS_LEDGER_STEPS_GOAL") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|g| *g > 0)
                .ok_or_else(|| {
                    LedgerError::Config(format!(
                        "PROGRESS_LEDGER_STEPS_GOAL must be a positive integer, got {raw}"
                    ))
                })?,
            None => DEFAULT_STEPS_GOAL,
        };
        Ok(Self {
            data_dir,
            day_policy,
            steps_goal,
            points: PointsConfig::default(),
        })
    }
}
