//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "tracker", version, about = "Two-axis solar tracker")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/tracker.toml")]
    pub config: PathBuf,

    /// Log and print results as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Log level (error|warn|info|debug|trace); overrides logging.level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Whether to restore the saved position before the first cycle.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RestoreMode {
    /// Prompt on the terminal
    Ask,
    /// Restore without asking
    Yes,
    /// Treat the current position as origin
    No,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Orient the panel, then optimize yaw and pitch in cycles until Ctrl-C
    Run {
        /// Restore the saved position first
        #[arg(long, value_enum, default_value = "ask")]
        restore: RestoreMode,
        /// Stop after this many cycles (overrides cycle.max_cycles)
        #[arg(long, value_name = "N")]
        cycles: Option<u32>,
        /// Rest between cycles in ms (overrides cycle.rest_interval_ms)
        #[arg(long = "rest-ms", value_name = "MS")]
        rest_ms: Option<u64>,
    },
    /// Take voltage samples without moving
    Measure {
        /// Number of samples
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Print the saved position
    Report,
    /// Drive both axes back to the saved origin and store zeros
    Home,
    /// Quick health check (sensor presence / sim ok)
    SelfCheck,
}
