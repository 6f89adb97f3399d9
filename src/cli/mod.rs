// CLI - Command Line Interface for the migration engine
// Principle: one command that does the work, one that shows the profiles

pub mod config;
pub mod runner;

use crate::profile::MigrationProfile;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Regenesis - deterministic genesis-state migration engine
#[derive(Parser, Debug)]
#[command(name = "regenesis")]
#[command(author = "Regenesis Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Rewrites an exported chain state into a relaunch genesis")]
#[command(long_about = r#"
Regenesis takes the raw exported state of a halted chain and produces the
genesis file of its successor: non-retained denoms are swept from account
balances with the supply ledger reconciled exactly, IBC and interchain state
is reset to a clean slate, epochs are rewound, and policy floors are applied.

Migrate a mainnet export:
  regenesis migrate --input export.json --output genesis.json --profile mainnet

Migrate with a custom profile file:
  regenesis migrate --input export.json --output genesis.json --profile relaunch.json
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", env = "REGENESIS_LOG")]
    pub log_level: String,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a migration
    Migrate(MigrateCmd),

    /// Print the built-in migration profiles
    Profiles(ProfilesCmd),
}

/// Run a migration
#[derive(Parser, Debug)]
pub struct MigrateCmd {
    /// Exported state to migrate
    #[arg(short, long, env = "REGENESIS_INPUT")]
    pub input: PathBuf,

    /// Where to write the migrated genesis
    #[arg(short, long, env = "REGENESIS_OUTPUT")]
    pub output: PathBuf,

    /// Migration profile (mainnet, testnet, or path to a profile file)
    #[arg(short, long, default_value = "mainnet")]
    pub profile: String,

    /// Override the profile's chain id
    #[arg(long)]
    pub chain_id: Option<String>,

    /// Override the profile's genesis time (RFC 3339)
    #[arg(long)]
    pub genesis_time: Option<String>,

    /// Run every migration step but skip writing the output
    #[arg(long)]
    pub dry_run: bool,
}

/// Print the built-in migration profiles
#[derive(Parser, Debug)]
pub struct ProfilesCmd {
    /// Print a single profile (mainnet or testnet)
    #[arg(long)]
    pub name: Option<String>,
}

/// Dump built-in profiles as JSON, ready to copy into a profile file.
pub fn print_profiles(cmd: &ProfilesCmd) -> anyhow::Result<()> {
    let profiles: Vec<(&str, MigrationProfile)> = match cmd.name.as_deref() {
        Some("mainnet") => vec![("mainnet", MigrationProfile::mainnet())],
        Some("testnet") => vec![("testnet", MigrationProfile::testnet())],
        Some(other) => return Err(anyhow::anyhow!("Unknown profile: {}", other)),
        None => vec![
            ("mainnet", MigrationProfile::mainnet()),
            ("testnet", MigrationProfile::testnet()),
        ],
    };

    for (name, profile) in profiles {
        println!("# {}", name);
        println!("{}", serde_json::to_string_pretty(&profile)?);
    }
    Ok(())
}
