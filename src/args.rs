use clap::Parser;

use crate::constants::BULK_SIMULATION_SIZE;

#[derive(Parser, Clone)]
#[command(
    display_name = "Leaderboard Service",
    long_about = "Serves paginated player rankings from an in-memory rating histogram \
                  kept consistent with the durable user store"
)]
pub struct Args {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", help = "Postgres connection string")]
    pub database_url: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "RUST_LOG",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        help = "Sets the logging verbosity"
    )]
    pub log_level: String,

    /// Run one bulk simulation round after startup
    #[arg(long, action = clap::ArgAction::SetTrue, help = "Run one bulk simulation round after startup")]
    pub simulate: bool,

    /// Users touched by the simulation round
    #[arg(
        long,
        default_value_t = BULK_SIMULATION_SIZE,
        help = "Users touched by the simulation round"
    )]
    pub simulate_count: usize
}
