//! CLI surface: flags only, no subcommands. The binary is a foreground
//! daemon; it runs until a termination signal.

use std::path::PathBuf;

use clap::Parser;

/// waveroam — wireless-link roaming supervisor.
#[derive(Debug, Parser)]
#[command(name = "waveroam", version, about)]
pub struct Cli {
    /// Wireless interface to supervise.
    #[arg(short = 'i', long)]
    pub interface: String,

    /// RSSI threshold in dBm; rescan whenever the link drops below it.
    #[arg(short = 'r', long, allow_negative_numbers = true)]
    pub roam_threshold: i32,

    /// Leave the DHCP client unmanaged.
    #[arg(short = 'N', long = "no-dhcp")]
    pub no_dhcp: bool,

    /// Optional TOML configuration file overriding built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the tick cadence in milliseconds.
    #[arg(long, value_name = "MS")]
    pub tick_ms: Option<u64>,

    /// Override the rescan cooldown in milliseconds.
    #[arg(long, value_name = "MS")]
    pub cooldown_ms: Option<u64>,
}
