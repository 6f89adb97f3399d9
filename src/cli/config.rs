// CLI Configuration - Convert CLI args to a validated run configuration
// Principle: resolve and validate everything before the input file is opened

use crate::cli::MigrateCmd;
use crate::profile::{MigrationProfile, ProfileError};
use std::path::{Path, PathBuf};
use tracing::info;

/// Complete migration run configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Resolved and validated profile
    pub profile: MigrationProfile,
    /// Exported state to read
    pub input: PathBuf,
    /// Genesis file to write
    pub output: PathBuf,
    /// Skip the final write
    pub dry_run: bool,
}

impl RunConfig {
    /// Create configuration from the migrate command
    pub fn from_migrate_cmd(cmd: &MigrateCmd) -> Result<Self, ConfigError> {
        // Determine the profile: built-in name or profile file
        let mut profile = match cmd.profile.as_str() {
            "mainnet" => MigrationProfile::mainnet(),
            "testnet" => MigrationProfile::testnet(),
            path => {
                info!("Loading migration profile from {}", path);
                Self::load_profile(path)?
            }
        };

        // Metadata overrides
        if let Some(ref chain_id) = cmd.chain_id {
            profile.chain_id = chain_id.clone();
        }
        if let Some(ref genesis_time) = cmd.genesis_time {
            profile.genesis_time = genesis_time.clone();
        }

        profile.validate()?;

        Ok(Self {
            profile,
            input: cmd.input.clone(),
            output: cmd.output.clone(),
            dry_run: cmd.dry_run,
        })
    }

    /// Load a profile file, distinguishing a missing file from a bad one
    fn load_profile(path: &str) -> Result<MigrationProfile, ConfigError> {
        if !Path::new(path).exists() {
            return Err(ConfigError::ProfileNotFound(path.to_string()));
        }
        MigrationProfile::from_file(path).map_err(|e| ConfigError::ProfileReadError(e.to_string()))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Failed to read profile: {0}")]
    ProfileReadError(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(#[from] ProfileError),
}
