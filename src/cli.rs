use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_FILE;

/// Shows the meeting you are in on a two-line display.
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Credentials and tuning, one key=value per line. Created interactively
    /// when missing.
    #[arg(long, env = "CONFIG_FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Also serve the operator controls over HTTP on this address.
    #[arg(long)]
    pub http: Option<SocketAddr>,

    /// Character LCD device; overrides lcdDevice from the config file.
    #[arg(long)]
    pub lcd_device: Option<PathBuf>,
}
