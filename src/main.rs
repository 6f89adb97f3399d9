// Regenesis - Entry point
// Principle: one exported state in, one migrated genesis out, or a loud failure

mod cli;
mod document;
mod migrate;
mod profile;

#[cfg(test)]
mod tests;

use clap::Parser;
use cli::config::RunConfig;
use cli::runner::run_migration;
use cli::{Cli, Commands};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_filter = if cli.verbose {
        "debug"
    } else {
        &cli.log_level
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(log_filter)),
        )
        .init();

    // Execute command
    match cli.command {
        Commands::Migrate(cmd) => {
            // Resolve and validate the migration profile before touching any file
            let config = RunConfig::from_migrate_cmd(&cmd).map_err(|e| {
                error!("Configuration error: {}", e);
                anyhow::anyhow!("Configuration error: {}", e)
            })?;

            if let Err(e) = run_migration(&config) {
                error!("Migration error: {}", e);
                return Err(anyhow::anyhow!("Migration error: {}", e));
            }
        }

        Commands::Profiles(cmd) => {
            cli::print_profiles(&cmd)?;
        }
    }

    Ok(())
}
