// Profile - What one relaunch keeps, resets and stamps
// Principle: the engine is one pipeline; profiles are the only thing that varies

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which coins survive the balance sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RetainedDenomPolicy {
    /// Keep a single denom and sweep everything else
    Only { denom: String },
    /// Keep everything except the listed denoms and denom prefixes
    AllExcept {
        #[serde(default)]
        denoms: Vec<String>,
        #[serde(default)]
        prefixes: Vec<String>,
    },
}

impl RetainedDenomPolicy {
    /// Whether a coin of `denom` stays in account balances
    pub fn retains(&self, denom: &str) -> bool {
        match self {
            RetainedDenomPolicy::Only { denom: kept } => denom == kept,
            RetainedDenomPolicy::AllExcept { denoms, prefixes } => {
                !denoms.iter().any(|d| d == denom)
                    && !prefixes.iter().any(|p| denom.starts_with(p.as_str()))
            }
        }
    }

    /// The single retained denom, when the policy names exactly one
    pub fn single_denom(&self) -> Option<&str> {
        match self {
            RetainedDenomPolicy::Only { denom } => Some(denom),
            RetainedDenomPolicy::AllExcept { .. } => None,
        }
    }
}

/// How the supply ledger is reconciled against swept balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyStrategy {
    /// Remove each swept denom's ledger entry, requiring an exact amount match
    ExactMatchRemoval,
    /// Keep only the retained denom in the supply ledger and community pool
    KeepSingleDenom,
}

/// Subsystems restored to their pre-genesis initial state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubsystemReset {
    /// Capability index rewound to "1"
    Capability,
    /// IBC client, connection and channel genesis emptied
    Ibc,
    /// Transfer denom traces emptied
    Transfer,
    /// Interchain accounts controller/host back to defaults
    InterchainAccounts,
    /// Interchain query list emptied
    InterchainQuery,
    /// Interchain staking reduced to its params block
    InterchainStaking,
}

impl SubsystemReset {
    /// Every reset, in pipeline order
    pub const ALL: [SubsystemReset; 6] = [
        SubsystemReset::Capability,
        SubsystemReset::Ibc,
        SubsystemReset::Transfer,
        SubsystemReset::InterchainAccounts,
        SubsystemReset::InterchainQuery,
        SubsystemReset::InterchainStaking,
    ];

    /// Human-readable name for progress logs
    pub fn label(&self) -> &'static str {
        match self {
            SubsystemReset::Capability => "capability index",
            SubsystemReset::Ibc => "ibc clients/connections/channels",
            SubsystemReset::Transfer => "transfer denom traces",
            SubsystemReset::InterchainAccounts => "interchain accounts",
            SubsystemReset::InterchainQuery => "interchain queries",
            SubsystemReset::InterchainStaking => "interchain staking",
        }
    }
}

/// Profile-selected parameter adjustment, exactly one per relaunch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyAdjustment {
    /// Raise validator commission rates (and the chain param) to a floor
    CommissionFloor { rate: String },
    /// Overwrite the governance voting period
    VotingPeriodFloor { duration: String },
}

/// Everything one migration run needs to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationProfile {
    /// Denoms kept in account balances
    pub retained_denoms: RetainedDenomPolicy,

    /// Supply ledger reconciliation strategy
    pub supply_strategy: SupplyStrategy,

    /// Subsystems replaced with their initial state
    pub subsystem_resets: Vec<SubsystemReset>,

    /// Positions in the epoch list rewound to "not started"
    pub epoch_reset_indices: Vec<usize>,

    /// Parameter adjustment applied after the resets
    pub policy: PolicyAdjustment,

    /// Chain id stamped on the output
    pub chain_id: String,

    /// Genesis time stamped on the output (RFC 3339)
    pub genesis_time: String,
}

/// Profile validation errors
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Invalid genesis time '{0}': expected RFC 3339")]
    InvalidGenesisTime(String),

    #[error("Invalid commission floor '{0}': expected a decimal in [0, 1]")]
    InvalidCommissionFloor(String),

    #[error("Invalid voting period '{0}': expected whole seconds like '21600s'")]
    InvalidVotingPeriod(String),

    #[error("The keep_single_denom supply strategy requires an 'only' retained-denom policy")]
    StrategyNeedsSingleDenom,
}

impl MigrationProfile {
    /// Relaunch profile for the production chain: sweep everything but uqck,
    /// reconcile supply by exact-match removal, floor commissions at 5%.
    pub fn mainnet() -> Self {
        Self {
            retained_denoms: RetainedDenomPolicy::Only {
                denom: "uqck".to_string(),
            },
            supply_strategy: SupplyStrategy::ExactMatchRemoval,
            subsystem_resets: SubsystemReset::ALL.to_vec(),
            epoch_reset_indices: vec![0, 1],
            policy: PolicyAdjustment::CommissionFloor {
                rate: "0.050000000000000000".to_string(),
            },
            chain_id: "quicksilver-2".to_string(),
            genesis_time: "2023-01-03T17:00:00Z".to_string(),
        }
    }

    /// Relaunch profile for the test chain: keep only uqck across balances,
    /// supply and community pool, and stretch the voting period to six hours.
    pub fn testnet() -> Self {
        Self {
            retained_denoms: RetainedDenomPolicy::Only {
                denom: "uqck".to_string(),
            },
            supply_strategy: SupplyStrategy::KeepSingleDenom,
            subsystem_resets: SubsystemReset::ALL.to_vec(),
            epoch_reset_indices: vec![0, 1],
            policy: PolicyAdjustment::VotingPeriodFloor {
                duration: "21600s".to_string(),
            },
            chain_id: "innuendo-5".to_string(),
            genesis_time: "2023-01-17T16:05:00Z".to_string(),
        }
    }

    /// Load a profile from a JSON file
    pub fn from_file(path: &str) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save the profile to a JSON file
    pub fn to_file(&self, path: &str) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Check the profile is internally consistent before any file is touched.
    pub fn validate(&self) -> Result<(), ProfileError> {
        chrono::DateTime::parse_from_rfc3339(&self.genesis_time)
            .map_err(|_| ProfileError::InvalidGenesisTime(self.genesis_time.clone()))?;

        match &self.policy {
            PolicyAdjustment::CommissionFloor { rate } => {
                let floor = BigDecimal::from_str(rate)
                    .map_err(|_| ProfileError::InvalidCommissionFloor(rate.clone()))?;
                if floor < BigDecimal::from(0) || floor > BigDecimal::from(1) {
                    return Err(ProfileError::InvalidCommissionFloor(rate.clone()));
                }
            }
            PolicyAdjustment::VotingPeriodFloor { duration } => {
                let seconds = duration.strip_suffix('s');
                if seconds.map_or(true, |s| s.parse::<u64>().is_err()) {
                    return Err(ProfileError::InvalidVotingPeriod(duration.clone()));
                }
            }
        }

        if self.supply_strategy == SupplyStrategy::KeepSingleDenom
            && self.retained_denoms.single_denom().is_none()
        {
            return Err(ProfileError::StrategyNeedsSingleDenom);
        }

        Ok(())
    }
}
