// Runner - Load, migrate, write
// Principle: no output file exists unless every migration stage succeeded

use crate::cli::config::RunConfig;
use crate::document::{DocumentError, StateDocument};
use crate::migrate::{self, MigrationError, MigrationSummary};
use tracing::{info, warn};

/// Run one migration end to end.
pub fn run_migration(config: &RunConfig) -> Result<MigrationSummary, RunnerError> {
    info!(
        "🚀 Migrating {} -> {}",
        config.input.display(),
        config.output.display()
    );
    info!(
        "⛓️  Target chain: {} @ {}",
        config.profile.chain_id, config.profile.genesis_time
    );

    let mut doc = StateDocument::load(&config.input)?;
    let summary = migrate::run(&mut doc, &config.profile)?;

    info!(
        "⚖️  Removed {} coin entries from {} accounts",
        summary.coins_removed, summary.accounts_touched
    );
    for (denom, amount) in &summary.removed_by_denom {
        info!("   {}: {}", denom, amount);
    }

    if config.dry_run {
        warn!("Dry run: not writing {}", config.output.display());
        return Ok(summary);
    }

    doc.write(&config.output)?;
    info!("✅ Wrote migrated genesis to {}", config.output.display());
    Ok(summary)
}

/// Runner errors
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Migration(#[from] MigrationError),
}
