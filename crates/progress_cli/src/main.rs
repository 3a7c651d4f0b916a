use std::sync::Arc;

use progress_cli::{Command, Session, USAGE, log_filter, parse_args};
use progress_ledger::{JsonFileStore, LedgerConfig, SystemClock};

fn main() -> anyhow::Result<()> {
    // PROGRESS_LEDGER_LOG_LEVEL wins over RUST_LOG; both default to `info`.
    let (log_env, env_filter) = log_filter(|key| std::env::var(key).ok());
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
    tracing::debug!("progress_ledger: log filter: {}", log_env);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match parse_args(&args) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{e}\n\n{USAGE}");
            std::process::exit(2);
        }
    };
    if matches!(command, Command::Help) {
        println!("{USAGE}");
        return Ok(());
    }

    let config = LedgerConfig::from_env()?;
    tracing::debug!(data_dir = %config.data_dir.display(), "progress_ledger: opening store");
    let store = Arc::new(JsonFileStore::new(&config.data_dir));
    let mut session = Session::open(store, Arc::new(SystemClock), &config);

    let output = session.run(command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    if session.ledger.pending_write() {
        tracing::warn!("progress_ledger: latest changes were not saved");
    }
    Ok(())
}
