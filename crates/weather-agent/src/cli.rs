use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "weather-agent")]
#[command(about = "Paper-trading agent for weather prediction markets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one scan-execute-monitor-observe-resolve cycle and exit.
    Scan {
        /// Restrict the cycle to a single configured city name.
        #[arg(long)]
        city: Option<String>,
    },
    /// Print open trade and bankroll state without trading.
    Status {
        #[arg(long)]
        city: Option<String>,
    },
    /// Run resolution and calibration rebuild against already-closed
    /// markets without scanning for new entries.
    Resolve,
    /// Run the coordinator loop: scheduled cycles plus the two
    /// independent fast-path loops, until a shutdown signal arrives.
    Start,
}
