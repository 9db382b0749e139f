use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "beehive",
    version,
    about = "Keyboard-driven terminal frontend for the bees dedup/compression daemon."
)]
pub struct CliArgs {
    /// Refresh interval in milliseconds
    #[arg(long, default_value_t = 2_000)]
    pub refresh_ms: u64,

    /// Control CLI used to talk to the daemon
    #[arg(long)]
    pub ctl: Option<String>,

    /// Path to the runtime config file (discovered if omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}
