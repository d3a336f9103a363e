use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "commerced", about = "Commerce core node", version)]
pub struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override `bind_addr` from the configuration.
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}
