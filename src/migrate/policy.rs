// Policy adjustment - commission floor or voting period, never both
// Rate comparisons are exact decimal arithmetic; the floor literal is
// written verbatim so the 18-decimal-place encoding is preserved.

use crate::document::{member_mut, DocumentError, StateDocument};
use crate::migrate::MigrationError;
use crate::profile::{PolicyAdjustment, ProfileError};
use bigdecimal::BigDecimal;
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::{debug, info};

/// Apply the profile's adjustment. Returns how many validator records were
/// changed (always 0 for the voting-period variant).
pub fn apply(doc: &mut StateDocument, policy: &PolicyAdjustment) -> Result<usize, MigrationError> {
    match policy {
        PolicyAdjustment::CommissionFloor { rate } => raise_commission_floor(doc, rate),
        PolicyAdjustment::VotingPeriodFloor { duration } => {
            set_voting_period(doc, duration)?;
            Ok(0)
        }
    }
}

/// Raise every commission rate below the floor up to it. When a raised rate
/// would exceed the validator's max rate, the max rate is lifted to the
/// floor as well; max rates are never lowered. Finally pins the chain-wide
/// minimum commission param so new validators cannot undercut the floor.
fn raise_commission_floor(
    doc: &mut StateDocument,
    floor_literal: &str,
) -> Result<usize, MigrationError> {
    let floor = BigDecimal::from_str(floor_literal)
        .map_err(|_| ProfileError::InvalidCommissionFloor(floor_literal.to_string()))?;

    info!("📈 Enforcing minimum commission rate {}", floor_literal);

    let validators = doc.expect_array_mut("app_state.staking.validators")?;
    let mut adjusted = 0;
    for validator in validators.iter_mut() {
        let moniker = validator
            .pointer("/description/moniker")
            .and_then(Value::as_str)
            .unwrap_or("<no moniker>")
            .to_string();

        let rates = member_mut(
            validator,
            &["commission", "commission_rates"],
            "app_state.staking.validators[]",
        )?;

        let rate = parse_rate(rates, "rate", &moniker)?;
        if rate >= floor {
            continue;
        }

        debug!("  raising commission rate of {}", moniker);
        set_rate(rates, "rate", floor_literal, &moniker)?;
        adjusted += 1;

        let max_rate = parse_rate(rates, "max_rate", &moniker)?;
        if max_rate < floor {
            debug!("  raising max commission rate of {}", moniker);
            set_rate(rates, "max_rate", floor_literal, &moniker)?;
        }
    }

    let params = doc.expect_object_mut("app_state.staking.params")?;
    params.insert("min_commission_rate".to_string(), json!(floor_literal));

    info!("📈 Raised {} validator commission rate(s)", adjusted);
    Ok(adjusted)
}

/// Overwrite the governance voting period unconditionally.
fn set_voting_period(doc: &mut StateDocument, duration: &str) -> Result<(), MigrationError> {
    info!("🗳️  Setting voting period to {}", duration);
    let voting_params = doc.expect_object_mut("app_state.gov.voting_params")?;
    voting_params.insert("voting_period".to_string(), json!(duration));
    Ok(())
}

fn parse_rate(rates: &Value, field: &str, moniker: &str) -> Result<BigDecimal, DocumentError> {
    let raw = rates.get(field).and_then(Value::as_str).ok_or_else(|| {
        DocumentError::SchemaMismatch(format!(
            "commission_rates.{} on validator '{}'",
            field, moniker
        ))
    })?;
    BigDecimal::from_str(raw).map_err(|_| {
        DocumentError::MalformedInput(format!(
            "invalid commission {} '{}' on validator '{}'",
            field, raw, moniker
        ))
    })
}

fn set_rate(
    rates: &mut Value,
    field: &str,
    literal: &str,
    moniker: &str,
) -> Result<(), DocumentError> {
    rates
        .as_object_mut()
        .ok_or_else(|| {
            DocumentError::SchemaMismatch(format!(
                "commission_rates on validator '{}'",
                moniker
            ))
        })?
        .insert(field.to_string(), json!(literal));
    Ok(())
}
