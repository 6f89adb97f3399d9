// Balance sweep and supply reconciliation
// Every swept amount is accounted for in arbitrary precision; the supply
// ledger must agree exactly with what the sweep removed.

use crate::document::{DocumentError, StateDocument};
use crate::migrate::MigrationError;
use crate::profile::{MigrationProfile, ProfileError, RetainedDenomPolicy, SupplyStrategy};
use num_bigint::BigUint;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Amounts swept out of account balances, accumulated per denom
#[derive(Debug, Default)]
pub struct RemovedCoins {
    /// Total removed per denom
    pub per_denom: BTreeMap<String, BigUint>,
    /// Accounts that lost at least one coin
    pub accounts_touched: usize,
    /// Individual coin entries removed
    pub coins_removed: usize,
}

/// Sweep every coin failing `policy` out of `app_state.bank.balances`.
/// Accounts are never removed; their coin lists shrink, possibly to empty.
pub fn reconcile_balances(
    doc: &mut StateDocument,
    policy: &RetainedDenomPolicy,
) -> Result<RemovedCoins, MigrationError> {
    info!("⚖️  Sweeping non-retained denoms from account balances");

    let accounts = doc.expect_array_mut("app_state.bank.balances")?;
    let mut removed = RemovedCoins::default();

    for account in accounts.iter_mut() {
        let address = account
            .get("address")
            .and_then(Value::as_str)
            .unwrap_or("<no address>")
            .to_string();

        // Exports may omit the coins key entirely for empty accounts
        let Some(coins) = account.get_mut("coins").and_then(Value::as_array_mut) else {
            continue;
        };

        let mut touched = false;
        let mut kept = Vec::with_capacity(coins.len());
        for coin in std::mem::take(coins) {
            let denom = coin_denom(&coin, &address)?;
            if policy.retains(&denom) {
                kept.push(coin);
                continue;
            }

            let amount = coin_amount(&coin, &denom, &address)?;
            debug!("  removing {} {} from {}", amount, denom, address);
            *removed.per_denom.entry(denom).or_default() += amount;
            removed.coins_removed += 1;
            touched = true;
        }
        *coins = kept;

        if touched {
            removed.accounts_touched += 1;
        }
    }

    info!(
        "⚖️  Swept {} coin entries from {} accounts across {} denoms",
        removed.coins_removed,
        removed.accounts_touched,
        removed.per_denom.len()
    );
    Ok(removed)
}

/// Reconcile the supply ledger with what the sweep removed.
pub fn adjust_supply(
    doc: &mut StateDocument,
    profile: &MigrationProfile,
    removed: &RemovedCoins,
) -> Result<(), MigrationError> {
    match profile.supply_strategy {
        SupplyStrategy::ExactMatchRemoval => remove_exact_entries(doc, removed),
        SupplyStrategy::KeepSingleDenom => {
            let denom = profile
                .retained_denoms
                .single_denom()
                .ok_or(ProfileError::StrategyNeedsSingleDenom)?;
            keep_single_denom(doc, denom)
        }
    }
}

/// Remove each swept denom's ledger entry, requiring an exact amount match.
/// A near-miss means the export is internally inconsistent; the run fails
/// before anything is written.
fn remove_exact_entries(
    doc: &mut StateDocument,
    removed: &RemovedCoins,
) -> Result<(), MigrationError> {
    if removed.per_denom.is_empty() {
        return Ok(());
    }
    info!(
        "🏦 Removing {} denom(s) from the supply ledger",
        removed.per_denom.len()
    );

    let supply = doc.expect_array_mut("app_state.bank.supply")?;
    for (denom, amount) in &removed.per_denom {
        let position = supply.iter().position(|entry| {
            entry.get("denom").and_then(Value::as_str) == Some(denom.as_str())
                && entry
                    .get("amount")
                    .and_then(Value::as_str)
                    .and_then(|raw| raw.parse::<BigUint>().ok())
                    .map_or(false, |ledger| &ledger == amount)
        });

        match position {
            Some(index) => {
                supply.remove(index);
                info!("  removed {} {} from supply", amount, denom);
            }
            None => {
                return Err(MigrationError::SupplyMismatch {
                    denom: denom.clone(),
                    amount: amount.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Keep only the retained denom in supply and the community pool, discarding
/// every other entry without amount checks.
fn keep_single_denom(doc: &mut StateDocument, denom: &str) -> Result<(), MigrationError> {
    info!("🏦 Reducing supply ledger and community pool to '{}'", denom);

    let supply = doc.expect_array_mut("app_state.bank.supply")?;
    let before = supply.len();
    supply.retain(|entry| entry.get("denom").and_then(Value::as_str) == Some(denom));
    debug!("  supply: kept {} of {} entries", supply.len(), before);

    let pool = doc.expect_array_mut("app_state.distribution.fee_pool.community_pool")?;
    let before = pool.len();
    pool.retain(|entry| entry.get("denom").and_then(Value::as_str) == Some(denom));
    debug!("  community pool: kept {} of {} entries", pool.len(), before);

    Ok(())
}

fn coin_denom(coin: &Value, address: &str) -> Result<String, DocumentError> {
    coin.get("denom")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            DocumentError::MalformedInput(format!("coin without a denom on account {}", address))
        })
}

/// Parse a coin amount: decimal digits only, no sign, no fractional part.
fn coin_amount(coin: &Value, denom: &str, address: &str) -> Result<BigUint, DocumentError> {
    let raw = coin.get("amount").and_then(Value::as_str).ok_or_else(|| {
        DocumentError::MalformedInput(format!(
            "coin '{}' without a string amount on account {}",
            denom, address
        ))
    })?;

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DocumentError::MalformedInput(format!(
            "invalid amount '{}' for denom '{}' on account {}",
            raw, denom, address
        )));
    }
    raw.parse::<BigUint>().map_err(|_| {
        DocumentError::MalformedInput(format!(
            "invalid amount '{}' for denom '{}' on account {}",
            raw, denom, address
        ))
    })
}
