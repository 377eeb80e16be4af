//! CLI probe for the scholaria core.
//!
//! # Responsibility
//! - Load configuration, open the store and report what it found.
//! - Exit non-zero with a one-line message when bootstrap fails.
//!
//! Usage: `scholaria [config_dir]` (defaults to the current directory).

use scholaria_core::db::migrations::{current_user_version, latest_version};
use scholaria_core::{core_version, default_log_level, init_logging, ping, ScholariaConfig, Store};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    let base_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    match run(&base_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("scholaria: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(base_dir: &Path) -> Result<(), String> {
    let base_dir = std::path::absolute(base_dir).map_err(|err| err.to_string())?;
    let config = ScholariaConfig::load_or_init(&base_dir).map_err(|err| err.to_string())?;

    let level = config
        .logging
        .level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let log_dir = config.log_dir(&base_dir);
    init_logging(&level, &log_dir.to_string_lossy())?;

    let store = Store::open(&config, &base_dir).map_err(|err| err.to_string())?;
    let schema_version =
        current_user_version(store.connection()).map_err(|err| err.to_string())?;

    println!("scholaria_core ping={}", ping());
    println!("scholaria_core version={}", core_version());
    println!(
        "database={} schema_version={schema_version}/{}",
        config.database_path(&base_dir).display(),
        latest_version()
    );
    println!(
        "search default_page_size={} max_page_size={} default_sort={}",
        config.search.default_page_size, config.search.max_page_size, config.search.default_sort
    );

    store.close().map_err(|err| err.to_string())?;
    log::info!("event=cli_probe module=cli status=ok");
    Ok(())
}
