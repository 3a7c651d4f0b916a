//! Daily step tally and a naive accelerometer step detector.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::{Gateway, KeyValueStore, STEPS_KEY};
use crate::utils::Clock;

pub const DEFAULT_THRESHOLD: f64 = 1.3;
pub const DEFAULT_MIN_INTERVAL_MS: u64 = 300;

/// Steps counted on one day against a goal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepTally {
    pub steps: u32,
    pub goal: u32,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_tracking: bool,
}

impl StepTally {
    pub fn new(date: NaiveDate, goal: u32) -> Self {
        Self {
            steps: 0,
            goal,
            date,
            is_tracking: false,
        }
    }

    /// Start over at zero when `today` differs from the tally's date.
    pub fn roll_to(&mut self, today: NaiveDate) -> bool {
        if self.date == today {
            return false;
        }
        self.steps = 0;
        self.date = today;
        true
    }

    pub fn goal_reached(&self) -> bool {
        self.goal > 0 && self.steps >= self.goal
    }
}

pub struct StepCounter {
    tally: StepTally,
    gateway: Gateway<StepTally>,
    clock: Arc<dyn Clock>,
}

impl StepCounter {
    /// Load today's tally. A stored tally from another day keeps its goal but
    /// restarts the count, and tracking is off.
    pub fn open(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, default_goal: u32) -> Self {
        let gateway = Gateway::new(store, STEPS_KEY);
        let today = clock.today();
        let mut tally = gateway.load_or_else(|| StepTally::new(today, default_goal));
        if tally.roll_to(today) {
            tally.is_tracking = false;
        }
        Self {
            tally,
            gateway,
            clock,
        }
    }

    pub fn tally(&self) -> &StepTally {
        &self.tally
    }

    pub fn goal_reached(&self) -> bool {
        self.tally.goal_reached()
    }

    pub fn start_tracking(&mut self) {
        self.tally.is_tracking = true;
        self.persist();
    }

    pub fn stop_tracking(&mut self) {
        self.tally.is_tracking = false;
        self.persist();
    }

    /// Add steps to today's tally and return the new count.
    pub fn add(&mut self, steps: u32) -> u32 {
        self.tally.roll_to(self.clock.today());
        self.tally.steps = self.tally.steps.saturating_add(steps);
        self.persist();
        self.tally.steps
    }

    /// Overwrite today's count.
    pub fn set(&mut self, steps: u32) {
        self.tally.roll_to(self.clock.today());
        self.tally.steps = steps;
        self.persist();
    }

    pub fn reset(&mut self) {
        self.tally.steps = 0;
        self.tally.date = self.clock.today();
        self.persist();
    }

    pub fn set_goal(&mut self, goal: u32) {
        self.tally.goal = goal;
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.gateway.save(&self.tally) {
            tracing::warn!(key = self.gateway.key(), error = %err, "failed to save step tally");
        }
    }
}

/// One accelerometer reading including gravity, in m/s².
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Acceleration {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Acceleration {
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Counts a step whenever the acceleration magnitude jumps by more than
/// `threshold` and at least `min_interval_ms` has passed since the last step.
#[derive(Clone, Debug)]
pub struct StepDetector {
    pub threshold: f64,
    pub min_interval_ms: u64,
    steps: u64,
    previous: Option<f64>,
    last_step_ms: Option<u64>,
}

impl Default for StepDetector {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD, DEFAULT_MIN_INTERVAL_MS)
    }
}

impl StepDetector {
    pub fn new(threshold: f64, min_interval_ms: u64) -> Self {
        Self {
            threshold,
            min_interval_ms,
            steps: 0,
            previous: None,
            last_step_ms: None,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Feed one motion event. Events without acceleration data are ignored.
    /// Returns whether a step was counted.
    pub fn on_motion(&mut self, sample: Option<Acceleration>, now_ms: u64) -> bool {
        let Some(sample) = sample else {
            return false;
        };
        let magnitude = sample.magnitude();
        // The first reading only establishes the baseline.
        let Some(previous) = self.previous.replace(magnitude) else {
            return false;
        };
        let interval_ok = self
            .last_step_ms
            .is_none_or(|last| now_ms.saturating_sub(last) > self.min_interval_ms);
        if (magnitude - previous).abs() > self.threshold && interval_ok {
            self.steps += 1;
            self.last_step_ms = Some(now_ms);
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.steps = 0;
        self.last_step_ms = None;
    }
}
