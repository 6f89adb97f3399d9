// Migration - One-shot pipeline over a loaded state export
// Stage order is load-bearing: the balance sweep feeds the supply
// reconciliation, metadata goes last, and nothing may be written unless
// every stage succeeded.

pub mod balances;
pub mod policy;
pub mod resets;

use crate::document::{DocumentError, StateDocument};
use crate::profile::{MigrationProfile, ProfileError};
use num_bigint::BigUint;
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;

/// Errors that abort a migration run
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// No supply entry equals the accumulated removed amount - the export
    /// drifted from its own balances, or was already migrated
    #[error("Supply mismatch for '{denom}': no ledger entry with amount {amount}")]
    SupplyMismatch { denom: String, amount: String },

    /// The epoch list is shorter than the profile expects
    #[error("Epoch index {index} out of range: the export has {len} epochs")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Per-run accounting, reported once the pipeline has finished
#[derive(Debug, Default)]
pub struct MigrationSummary {
    /// Accounts that lost at least one coin
    pub accounts_touched: usize,
    /// Individual coin entries swept from balances
    pub coins_removed: usize,
    /// Amount swept per denom
    pub removed_by_denom: BTreeMap<String, BigUint>,
    /// Validators whose commission rate was raised
    pub validators_adjusted: usize,
}

/// Apply `profile` to a loaded export, mutating it in place.
pub fn run(
    doc: &mut StateDocument,
    profile: &MigrationProfile,
) -> Result<MigrationSummary, MigrationError> {
    profile.validate()?;

    let removed = balances::reconcile_balances(doc, &profile.retained_denoms)?;
    balances::adjust_supply(doc, profile, &removed)?;
    resets::reset_subsystems(doc, &profile.subsystem_resets)?;
    resets::reset_epochs(doc, &profile.epoch_reset_indices)?;
    let validators_adjusted = policy::apply(doc, &profile.policy)?;
    stamp_metadata(doc, profile);

    Ok(MigrationSummary {
        accounts_touched: removed.accounts_touched,
        coins_removed: removed.coins_removed,
        removed_by_denom: removed.per_denom,
        validators_adjusted,
    })
}

/// Overwrite chain id and genesis time. Prior values are irrelevant.
fn stamp_metadata(doc: &mut StateDocument, profile: &MigrationProfile) {
    info!(
        "🆔 Stamping chain id '{}' and genesis time '{}'",
        profile.chain_id, profile.genesis_time
    );
    doc.set_top_level("chain_id", json!(profile.chain_id));
    doc.set_top_level("genesis_time", json!(profile.genesis_time));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stamp_metadata_overwrites_prior_values() {
        let mut doc = StateDocument::from_value(json!({
            "chain_id": "old-1",
            "genesis_time": "1999-12-31T23:59:59Z",
            "app_state": {}
        }))
        .unwrap();

        let mut profile = MigrationProfile::mainnet();
        profile.chain_id = "x-2".to_string();
        profile.genesis_time = "2023-01-03T17:00:00Z".to_string();

        stamp_metadata(&mut doc, &profile);

        assert_eq!(doc.root()["chain_id"], json!("x-2"));
        assert_eq!(doc.root()["genesis_time"], json!("2023-01-03T17:00:00Z"));
    }

    #[test]
    fn test_run_rejects_invalid_profile_before_mutation() {
        let mut doc = StateDocument::from_value(json!({ "app_state": {} })).unwrap();
        let mut profile = MigrationProfile::mainnet();
        profile.genesis_time = "not a time".to_string();

        let err = run(&mut doc, &profile).unwrap_err();
        assert!(matches!(err, MigrationError::Profile(_)));
        // the document was not stamped
        assert!(doc.root().get("chain_id").is_none());
    }
}
