use chrono::NaiveDate;
use progress_cli::{CliError, Command, Session, parse_args};
use progress_ledger::{Category, JsonFileStore, LedgerConfig, LedgerError, ManualClock};
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn session(dir: &std::path::Path, clock: &Arc<ManualClock>, config: &LedgerConfig) -> Session {
    Session::open(Arc::new(JsonFileStore::new(dir)), clock.clone(), config)
}

#[test]
fn habit_command_feeds_points_and_streak() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(date(2024, 5, 6)));
    let config = LedgerConfig::default();

    let mut s = session(dir.path(), &clock, &config);
    let out = s.run(parse_args(&["habit", "water", "5"]).unwrap()).unwrap();
    assert_eq!(out["delta"], 5);
    assert_eq!(out["completed"], true);
    assert_eq!(out["streaks"]["current"], 1);

    clock.advance_days(1);
    let mut s = session(dir.path(), &clock, &config);
    let out = s.run(parse_args(&["habit", "water", "5"]).unwrap()).unwrap();
    assert_eq!(out["streaks"]["current"], 2);
    assert_eq!(out["streaks"]["longest"], 2);
    assert_eq!(s.ledger.period().period_total, 10);

    let out = s.run(parse_args(&["habit", "water", "5"]).unwrap()).unwrap();
    assert_eq!(out["delta"], -5);
    assert_eq!(out["completed"], false);
    assert_eq!(s.ledger.period().period_total, 5);
}

#[test]
fn steps_command_awards_bonus_once() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(date(2024, 5, 6)));
    let config = LedgerConfig {
        steps_goal: 1_000,
        ..LedgerConfig::default()
    };

    let mut s = session(dir.path(), &clock, &config);
    let out = s.run(Command::Steps { count: 600 }).unwrap();
    assert_eq!(out["bonusAwarded"], false);
    let out = s.run(Command::Steps { count: 600 }).unwrap();
    assert_eq!(out["steps"], 1_200);
    assert_eq!(out["bonusAwarded"], true);
    let out = s.run(Command::Steps { count: 10 }).unwrap();
    assert_eq!(out["bonusAwarded"], false);
    assert_eq!(s.ledger.day(date(2024, 5, 6)).unwrap().steps, 20);
}

#[test]
fn status_reports_summary_and_health() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(date(2024, 5, 8)));
    let config = LedgerConfig::default();

    let mut s = session(dir.path(), &clock, &config);
    s.run(parse_args(&["diet", "done"]).unwrap()).unwrap();
    s.run(parse_args(&["workout", "done", "2024-05-07"]).unwrap()).unwrap();
    s.run(parse_args(&["completion", "diet", "1", "3"]).unwrap()).unwrap();

    let out = s.run(Command::Status).unwrap();
    assert_eq!(out["summary"]["periodStart"], "2024-05-06");
    assert_eq!(out["summary"]["periodTotal"], 25);
    assert_eq!(out["summary"]["todayPoints"]["diet"], 10);
    assert_eq!(out["summary"]["bestDay"]["date"], "2024-05-07");
    assert_eq!(out["summary"]["completionRates"]["diet"], 33);
    assert_eq!(out["health"]["ready"], true);
    assert_eq!(out["health"]["pendingWrite"], false);
    assert_eq!(out["steps"]["goal"], 10_000);
}

#[test]
fn rollover_and_reset_day_commands() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(date(2024, 5, 8)));
    let config = LedgerConfig::default();

    let mut s = session(dir.path(), &clock, &config);
    s.run(parse_args(&["workout", "done"]).unwrap()).unwrap();
    let out = s.run(Command::ResetDay { day: None }).unwrap();
    assert_eq!(out["reset"], true);
    assert_eq!(s.ledger.period().period_total, 0);
    s.ledger.apply_points(date(2024, 5, 9), Category::Diet, 30).unwrap();

    let out = s.run(Command::Rollover).unwrap();
    assert_eq!(out["rolledOver"], false);

    clock.advance_days(7);
    let out = s.run(Command::Rollover).unwrap();
    assert_eq!(out["rolledOver"], true);
    assert_eq!(out["periodStart"], "2024-05-13");
    assert_eq!(out["history"][0]["periodStart"], "2024-05-06");
    assert_eq!(out["history"][0]["total"], 30);
}

#[test]
fn strict_policy_error_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(date(2024, 5, 8)));
    let config = LedgerConfig::from_env_with(|k| match k {
        "PROGRESS_LEDGER_DAY_POLICY" => Some("strict".into()),
        _ => None,
    })
    .unwrap();

    let mut s = session(dir.path(), &clock, &config);
    let err = s
        .run(parse_args(&["diet", "done", "2024-04-01"]).unwrap())
        .unwrap_err();
    assert!(err.to_string().contains("outside the active period"));
}

#[test]
fn schema_describes_stored_record() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(date(2024, 5, 8)));
    let mut s = session(dir.path(), &clock, &LedgerConfig::default());
    let out = s.run(Command::Schema).unwrap();
    let props = out["properties"].as_object().expect("properties");
    assert!(props.contains_key("periodStart"));
    assert!(props.contains_key("dailyPoints"));
    assert!(props.contains_key("weeklyCompletion"));
    assert!(props.contains_key("history"));
}

#[test]
fn step_tally_commands_share_the_bonus_rule() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(date(2024, 5, 6)));
    let mut s = session(dir.path(), &clock, &LedgerConfig::default());

    let out = s.run(parse_args(&["steps-goal", "500"]).unwrap()).unwrap();
    assert_eq!(out["goal"], 500);
    assert_eq!(out["bonusAwarded"], false);

    let out = s.run(parse_args(&["steps-set", "800"]).unwrap()).unwrap();
    assert_eq!(out["steps"], 800);
    assert_eq!(out["bonusAwarded"], true);

    let out = s.run(Command::StepsReset).unwrap();
    assert_eq!(out["steps"], 0);
    assert_eq!(out["bonusAwarded"], false);
    assert_eq!(s.ledger.day(date(2024, 5, 6)).unwrap().steps, 20);

    let reopened = session(dir.path(), &clock, &LedgerConfig::default());
    assert_eq!(reopened.steps.tally().goal, 500);
    assert_eq!(reopened.steps.tally().steps, 0);
}

#[test]
fn motion_counts_steps_only_while_tracking() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(date(2024, 5, 6)));
    let config = LedgerConfig {
        steps_goal: 2,
        ..LedgerConfig::default()
    };
    let mut s = session(dir.path(), &clock, &config);
    let walk = ["motion", "0,0,0,9.8", "400,0,0,12", "500,0,0,9.8", "900,0,0,12"];

    let out = s.run(parse_args(&walk).unwrap()).unwrap();
    assert_eq!(out["tracking"], false);
    assert_eq!(out["detected"], 0);
    assert_eq!(out["steps"], 0);

    let out = s.run(parse_args(&["tracking", "on"]).unwrap()).unwrap();
    assert_eq!(out["tracking"], true);
    let out = s.run(parse_args(&walk).unwrap()).unwrap();
    assert_eq!(out["detected"], 2);
    assert_eq!(out["steps"], 2);
    assert_eq!(out["bonusAwarded"], true);

    s.run(parse_args(&["tracking", "off"]).unwrap()).unwrap();
    let reopened = session(dir.path(), &clock, &config);
    assert!(!reopened.steps.tally().is_tracking);
    assert_eq!(reopened.steps.tally().steps, 2);
}

#[test]
fn overflowing_habit_points_are_rejected_and_rolled_back() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(date(2024, 5, 6)));
    let config = LedgerConfig::default();
    let mut s = session(dir.path(), &clock, &config);
    s.run(parse_args(&["diet", "done"]).unwrap()).unwrap();

    let max = i64::MAX.to_string();
    let err = s
        .run(parse_args(&["habit", "water", max.as_str()]).unwrap())
        .unwrap_err();
    assert!(matches!(err, CliError::Ledger(LedgerError::PointsOverflow { .. })));
    assert!(!s.habits.is_completed_today("water"));
    assert_eq!(s.habits.points(), 0);
    assert_eq!(s.ledger.period().period_total, 10);

    let reopened = session(dir.path(), &clock, &config);
    assert!(!reopened.habits.is_completed_today("water"));
    assert_eq!(reopened.ledger.period().period_total, 10);
}

#[test]
fn status_after_week_change_reports_new_period() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(date(2024, 5, 8)));
    let mut s = session(dir.path(), &clock, &LedgerConfig::default());
    s.run(parse_args(&["workout", "done"]).unwrap()).unwrap();

    clock.advance_days(7);
    let out = s.run(Command::Status).unwrap();
    assert_eq!(out["summary"]["periodStart"], "2024-05-13");
    assert_eq!(out["summary"]["periodTotal"], 0);
    assert_eq!(out["health"]["periodStart"], "2024-05-13");
    assert_eq!(out["history"][0]["total"], 15);
}
