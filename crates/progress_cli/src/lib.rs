//! Command-line driver for the progress ledger.
//!
//! Each invocation opens the ledger, habit log and step tally from one data
//! directory, applies a single command and prints the result as JSON.

use chrono::NaiveDate;
use serde_json::{Value, json};
use std::sync::Arc;

use progress_ledger::habits::HabitTracker;
use progress_ledger::observability::Health;
use progress_ledger::steps::{Acceleration, StepCounter, StepDetector};
use progress_ledger::utils::{day_key, parse_day_key};
use progress_ledger::{Category, Clock, KeyValueStore, LedgerConfig, LedgerState, ProgressLedger};
use tracing_subscriber::EnvFilter;

pub mod error;

pub use error::{CliError, CliResult};

pub const LOG_LEVEL_ENV: &str = "PROGRESS_LEDGER_LOG_LEVEL";
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Build the log filter from `PROGRESS_LEDGER_LOG_LEVEL`, then `RUST_LOG`,
/// then `info`. An unparsable directive falls back to `info`.
pub fn log_filter<F>(get: F) -> (String, EnvFilter)
where
    F: Fn(&str) -> Option<String>,
{
    let directive = get(LOG_LEVEL_ENV)
        .or_else(|| get("RUST_LOG"))
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    let filter =
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    (directive, filter)
}

pub const USAGE: &str = "\
usage: progress-ledger <command>

commands:
  status                               weekly summary and ledger health
  schema                               JSON schema of the stored progress record
  diet <done|skip> [YYYY-MM-DD]        meal checked or skipped
  workout <done|skip> [YYYY-MM-DD]     workout checked or skipped
  habit <id> <points>                  toggle a habit for today
  steps <count>                        add steps to today's tally
  steps-set <count>                    overwrite today's step count
  steps-reset                          zero today's step count
  steps-goal <count>                   change the daily step goal
  tracking <on|off>                    start or stop motion tracking
  motion <ms[,x,y,z]>...               feed accelerometer samples while tracking
  completion <category> <done> <total> set a category's weekly completion
  reset-day [YYYY-MM-DD]               zero one day's points
  rollover                             start a new week if the calendar moved on";

/// One motion event. `acceleration` is absent when the device sent none.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionSample {
    pub at_ms: u64,
    pub acceleration: Option<Acceleration>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Status,
    Schema,
    Diet { completed: bool, day: Option<NaiveDate> },
    Workout { completed: bool, day: Option<NaiveDate> },
    Habit { id: String, points: i64 },
    Steps { count: u32 },
    StepsSet { count: u32 },
    StepsReset,
    StepsGoal { goal: u32 },
    Tracking { on: bool },
    Motion { samples: Vec<MotionSample> },
    Completion { category: Category, completed: u32, total: u32 },
    ResetDay { day: Option<NaiveDate> },
    Rollover,
    Help,
}

fn parse_outcome(raw: Option<&str>) -> CliResult<bool> {
    match raw {
        Some("done" | "completed" | "yes") => Ok(true),
        Some("skip" | "skipped" | "no") => Ok(false),
        Some(other) => Err(CliError::Usage(format!("expected done or skip, got {other}"))),
        None => Err(CliError::Usage("missing done|skip".into())),
    }
}

fn parse_optional_day(raw: Option<&str>) -> CliResult<Option<NaiveDate>> {
    raw.map(parse_day_key).transpose().map_err(CliError::from)
}

fn parse_switch(raw: Option<&str>) -> CliResult<bool> {
    match raw {
        Some("on" | "start") => Ok(true),
        Some("off" | "stop") => Ok(false),
        Some(other) => Err(CliError::Usage(format!("expected on or off, got {other}"))),
        None => Err(CliError::Usage("missing on|off".into())),
    }
}

/// `<ms>` alone, or `<ms>,<x>,<y>,<z>`.
fn parse_motion_sample(raw: &str) -> CliResult<MotionSample> {
    let bad = || CliError::Usage(format!("motion sample must be ms[,x,y,z], got {raw}"));
    let mut fields = raw.split(',');
    let at_ms = fields
        .next()
        .and_then(|ms| ms.trim().parse().ok())
        .ok_or_else(bad)?;
    let axes = fields
        .map(|v| v.trim().parse::<f64>().map_err(|_| bad()))
        .collect::<CliResult<Vec<_>>>()?;
    let acceleration = match axes.as_slice() {
        [] => None,
        [x, y, z] => Some(Acceleration {
            x: *x,
            y: *y,
            z: *z,
        }),
        _ => return Err(bad()),
    };
    Ok(MotionSample {
        at_ms,
        acceleration,
    })
}

fn parse_number<T: std::str::FromStr>(raw: Option<&str>, what: &str) -> CliResult<T> {
    let raw = raw.ok_or_else(|| CliError::Usage(format!("missing {what}")))?;
    raw.parse()
        .map_err(|_| CliError::Usage(format!("{what} must be a number, got {raw}")))
}

/// Parse command-line arguments, excluding the program name.
pub fn parse_args<S: AsRef<str>>(args: &[S]) -> CliResult<Command> {
    let mut it = args.iter().map(|s| s.as_ref());
    let command = match it.next() {
        None | Some("help" | "-h" | "--help") => Command::Help,
        Some("status") => Command::Status,
        Some("schema") => Command::Schema,
        Some("diet") => Command::Diet {
            completed: parse_outcome(it.next())?,
            day: parse_optional_day(it.next())?,
        },
        Some("workout") => Command::Workout {
            completed: parse_outcome(it.next())?,
            day: parse_optional_day(it.next())?,
        },
        Some("habit") => {
            let id = it
                .next()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| CliError::Usage("missing habit id".into()))?
                .to_string();
            Command::Habit {
                id,
                points: parse_number(it.next(), "points")?,
            }
        }
        Some("steps") => Command::Steps {
            count: parse_number(it.next(), "step count")?,
        },
        Some("steps-set") => Command::StepsSet {
            count: parse_number(it.next(), "step count")?,
        },
        Some("steps-reset") => Command::StepsReset,
        Some("steps-goal") => Command::StepsGoal {
            goal: parse_number(it.next(), "step goal")?,
        },
        Some("tracking") => Command::Tracking {
            on: parse_switch(it.next())?,
        },
        Some("motion") => {
            let samples = it
                .by_ref()
                .map(parse_motion_sample)
                .collect::<CliResult<Vec<_>>>()?;
            if samples.is_empty() {
                return Err(CliError::Usage("missing motion samples".into()));
            }
            Command::Motion { samples }
        }
        Some("completion") => {
            let category: Category = it
                .next()
                .ok_or_else(|| CliError::Usage("missing category".into()))?
                .parse()?;
            Command::Completion {
                category,
                completed: parse_number(it.next(), "completed count")?,
                total: parse_number(it.next(), "total count")?,
            }
        }
        Some("reset-day") => Command::ResetDay {
            day: parse_optional_day(it.next())?,
        },
        Some("rollover") => Command::Rollover,
        Some(other) => return Err(CliError::Usage(format!("unknown command: {other}"))),
    };
    if let Some(extra) = it.next() {
        return Err(CliError::Usage(format!("unexpected argument: {extra}")));
    }
    Ok(command)
}

/// The ledger and its collaborators, all backed by the same store.
pub struct Session {
    pub ledger: ProgressLedger,
    pub habits: HabitTracker,
    pub steps: StepCounter,
}

impl Session {
    pub fn open(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: &LedgerConfig,
    ) -> Self {
        Self {
            ledger: ProgressLedger::open(store.clone(), clock.clone(), config),
            habits: HabitTracker::open(store.clone(), clock.clone()),
            steps: StepCounter::open(store, clock, config.steps_goal),
        }
    }

    pub fn run(&mut self, command: Command) -> CliResult<Value> {
        let output = match command {
            Command::Help => json!({ "usage": USAGE }),
            Command::Status => {
                let summary = self.ledger.summary();
                let health = Health::of(&mut self.ledger);
                json!({
                    "summary": summary,
                    "history": self.ledger.history(),
                    "health": health,
                    "habitStreak": self.habits.streak(),
                    "steps": self.steps.tally(),
                })
            }
            Command::Schema => serde_json::to_value(schemars::schema_for!(LedgerState))?,
            Command::Diet { completed, day } => {
                let points = self.ledger.track_diet(day, completed)?;
                json!({ "category": Category::Diet, "completed": completed, "day": points })
            }
            Command::Workout { completed, day } => {
                let points = self.ledger.track_workout(day, completed)?;
                json!({ "category": Category::Workout, "completed": completed, "day": points })
            }
            Command::Habit { id, points } => {
                let before = self.habits.log().clone();
                let delta = self.habits.toggle(&id, points);
                let day = match self.ledger.track_habit(delta) {
                    Ok(day) => day,
                    Err(err) => {
                        self.habits.restore(before);
                        return Err(err.into());
                    }
                };
                self.ledger.update_streak(self.habits.streak());
                json!({
                    "habit": id,
                    "completed": self.habits.is_completed_today(&id),
                    "delta": delta,
                    "day": day,
                    "streaks": self.ledger.streaks(),
                })
            }
            Command::Steps { count } => {
                self.steps.add(count);
                self.steps_report()?
            }
            Command::StepsSet { count } => {
                self.steps.set(count);
                self.steps_report()?
            }
            Command::StepsReset => {
                self.steps.reset();
                self.steps_report()?
            }
            Command::StepsGoal { goal } => {
                self.steps.set_goal(goal);
                self.steps_report()?
            }
            Command::Tracking { on } => {
                if on {
                    self.steps.start_tracking();
                } else {
                    self.steps.stop_tracking();
                }
                json!({ "tracking": self.steps.tally().is_tracking })
            }
            Command::Motion { samples } => {
                let detected = self.detect_steps(&samples);
                let mut report = self.steps_report()?;
                report["detected"] = json!(detected);
                report["tracking"] = json!(self.steps.tally().is_tracking);
                report
            }
            Command::Completion {
                category,
                completed,
                total,
            } => {
                let percent = self.ledger.record_completion(category, completed, total);
                json!({ "category": category, "percent": percent })
            }
            Command::ResetDay { day } => {
                let day = day.unwrap_or_else(|| self.ledger.today());
                let reset = self.ledger.reset_day(day);
                json!({ "day": day_key(day), "reset": reset })
            }
            Command::Rollover => {
                let rolled = self.ledger.check_rollover();
                json!({
                    "rolledOver": rolled,
                    "periodStart": self.ledger.period().period_start,
                    "history": self.ledger.history(),
                })
            }
        };
        Ok(output)
    }

    /// Run the samples through a step detector and add what it counts to
    /// today's tally. Samples are dropped while tracking is off.
    fn detect_steps(&mut self, samples: &[MotionSample]) -> u32 {
        if !self.steps.tally().is_tracking {
            tracing::debug!(samples = samples.len(), "tracking off; ignoring motion");
            return 0;
        }
        let mut detector = StepDetector::default();
        for sample in samples {
            detector.on_motion(sample.acceleration, sample.at_ms);
        }
        let detected = u32::try_from(detector.steps()).unwrap_or(u32::MAX);
        if detected > 0 {
            self.steps.add(detected);
        }
        detected
    }

    /// Current tally, awarding the steps bonus if the goal is now met.
    fn steps_report(&mut self) -> CliResult<Value> {
        let bonus = self.ledger.track_steps_goal(self.steps.goal_reached())?;
        let tally = self.steps.tally();
        Ok(json!({
            "steps": tally.steps,
            "goal": tally.goal,
            "bonusAwarded": bonus,
        }))
    }
}
