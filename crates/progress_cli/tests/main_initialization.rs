//! Start-up wiring shared by the binary: log filter and config defaults.

use progress_cli::{DEFAULT_LOG_FILTER, LOG_LEVEL_ENV, log_filter};

fn env(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    }
}

#[test]
fn test_log_level_var_wins_over_rust_log() {
    let (directive, filter) = log_filter(env(&[(LOG_LEVEL_ENV, "debug"), ("RUST_LOG", "warn")]));
    assert_eq!(directive, "debug");
    assert_eq!(filter.to_string(), "debug");
}

#[test]
fn test_rust_log_used_when_ledger_var_missing() {
    let (directive, filter) = log_filter(env(&[("RUST_LOG", "progress_ledger=trace")]));
    assert_eq!(directive, "progress_ledger=trace");
    assert_eq!(filter.to_string(), "progress_ledger=trace");
}

#[test]
fn test_defaults_to_info() {
    let (directive, filter) = log_filter(env(&[]));
    assert_eq!(directive, DEFAULT_LOG_FILTER);
    assert_eq!(filter.to_string(), "info");
}

#[test]
fn test_invalid_directive_falls_back_to_info() {
    let (directive, filter) = log_filter(env(&[(LOG_LEVEL_ENV, "progress_ledger=loud")]));
    assert_eq!(directive, "progress_ledger=loud");
    assert_eq!(filter.to_string(), "info");
}

#[test]
fn test_config_defaults_without_env() {
    let cfg = progress_ledger::LedgerConfig::from_env_with(|_| None).expect("cfg");
    assert_eq!(cfg.data_dir, std::path::PathBuf::from(".progress-ledger"));
    assert_eq!(cfg.steps_goal, 10_000);
}
