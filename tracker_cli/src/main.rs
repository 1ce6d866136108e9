#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]

mod cli;
mod error_fmt;
mod logging;
mod prompt;
mod run;

use std::path::Path;

use clap::Parser;
use eyre::WrapErr;
use tracker_core::TrackerError;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};

/// 1-based line of a byte offset, for TOML error messages.
fn line_of(text: &str, offset: usize) -> usize {
    text.get(..offset).map_or(1, |head| head.matches('\n').count() + 1)
}

fn config_error(detail: String) -> eyre::Report {
    eyre::Report::new(TrackerError::Config(detail))
}

fn load_config(path: &Path) -> eyre::Result<tracker_config::Config> {
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = tracker_config::load_toml(&text).map_err(|e: toml::de::Error| match e.span() {
        Some(span) => config_error(format!(
            "line {}: {}",
            line_of(&text, span.start),
            e.message()
        )),
        None => config_error(e.message().to_string()),
    })?;
    cfg.validate().map_err(|e| config_error(e.to_string()))?;
    Ok(cfg)
}

fn dispatch(cli: &Cli, cfg: &tracker_config::Config) -> eyre::Result<()> {
    match &cli.cmd {
        Commands::Run {
            restore,
            cycles,
            rest_ms,
        } => run::cmd_run(cfg, *restore, *cycles, *rest_ms, cli.json),
        Commands::Measure { count } => run::cmd_measure(cfg, *count, cli.json),
        Commands::Report => run::cmd_report(cfg, cli.json),
        Commands::Home => run::cmd_home(cfg, cli.json),
        Commands::SelfCheck => run::cmd_self_check(cfg, cli.json),
    }
}

fn real_main() -> eyre::Result<()> {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    if let Err(e) = color_eyre::install() {
        eprintln!("color-eyre install failed: {e}");
    }

    let cfg = load_config(&cli.config)?;
    logging::init_tracing(cli.json, cli.log_level.as_deref(), &cfg.logging)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    dispatch(&cli, &cfg)
}

fn main() {
    if let Err(e) = real_main() {
        let json = JSON_MODE.get().copied().unwrap_or(false);
        if json {
            eprintln!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(exit_code_for_error(&e));
    }
}
