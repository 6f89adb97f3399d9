// Subsystem and epoch resets
// Pure replacements: whatever lived at these paths is discarded, and a path
// that does not exist fails the run instead of being created.

use crate::document::{DocumentError, StateDocument};
use crate::migrate::MigrationError;
use crate::profile::SubsystemReset;
use serde_json::{json, Value};
use tracing::info;

/// Apply each configured subsystem reset in order.
pub fn reset_subsystems(
    doc: &mut StateDocument,
    resets: &[SubsystemReset],
) -> Result<(), MigrationError> {
    for reset in resets {
        info!("🧹 Resetting {}", reset.label());
        match reset {
            SubsystemReset::Capability => {
                doc.replace("app_state.capability", json!({ "index": "1" }))?;
            }
            SubsystemReset::Ibc => {
                doc.replace("app_state.ibc.channel_genesis", empty_channel_genesis())?;
                doc.replace("app_state.ibc.client_genesis", empty_client_genesis())?;
                doc.replace(
                    "app_state.ibc.connection_genesis",
                    empty_connection_genesis(),
                )?;
            }
            SubsystemReset::Transfer => {
                doc.replace("app_state.transfer.denom_traces", json!([]))?;
            }
            SubsystemReset::InterchainAccounts => {
                doc.replace(
                    "app_state.interchainaccounts.controller_genesis_state",
                    initial_ica_controller(),
                )?;
                doc.replace(
                    "app_state.interchainaccounts.host_genesis_state",
                    initial_ica_host(),
                )?;
            }
            SubsystemReset::InterchainQuery => {
                doc.replace("app_state.interchainquery.queries", json!([]))?;
            }
            SubsystemReset::InterchainStaking => {
                // Params survive; every registered zone, delegation and
                // pending query is discarded with the rest of the subtree.
                let params = doc.expect_mut("app_state.interchainstaking.params")?.take();
                doc.replace("app_state.interchainstaking", json!({ "params": params }))?;
            }
        }
    }
    Ok(())
}

/// Rewind the epoch descriptors at `indices` to their pre-genesis state,
/// leaving identifier and duration fields (and all other epochs) untouched.
pub fn reset_epochs(doc: &mut StateDocument, indices: &[usize]) -> Result<(), MigrationError> {
    if indices.is_empty() {
        return Ok(());
    }
    info!("⏪ Rewinding {} epoch descriptor(s)", indices.len());

    let epochs = doc.expect_array_mut("app_state.epochs.epochs")?;
    let len = epochs.len();
    for &index in indices {
        let descriptor = epochs
            .get_mut(index)
            .ok_or(MigrationError::IndexOutOfRange { index, len })?;
        let fields = descriptor.as_object_mut().ok_or_else(|| {
            DocumentError::SchemaMismatch(format!("app_state.epochs.epochs[{}]", index))
        })?;
        for (field, value) in epoch_initial_fields() {
            fields.insert(field.to_string(), value);
        }
    }
    Ok(())
}

/// The five fields of a "not yet started" epoch descriptor
fn epoch_initial_fields() -> [(&'static str, Value); 5] {
    [
        ("start_time", json!("0001-01-01T00:00:00Z")),
        ("current_epoch", json!("0")),
        ("current_epoch_start_time", json!("0001-01-01T00:00:00Z")),
        ("epoch_counting_started", json!(false)),
        ("current_epoch_start_height", json!("0")),
    ]
}

/// Channel state with nothing open and the sequence counter rewound
fn empty_channel_genesis() -> Value {
    json!({
        "channels": [],
        "acknowledgements": [],
        "commitments": [],
        "receipts": [],
        "send_sequences": [],
        "recv_sequences": [],
        "ack_sequences": [],
        "next_channel_sequence": "0"
    })
}

fn empty_client_genesis() -> Value {
    json!({
        "clients": [],
        "clients_consensus": [],
        "clients_metadata": [],
        "params": { "allowed_clients": ["06-solomachine", "07-tendermint"] },
        "create_localhost": false,
        "next_client_sequence": "0"
    })
}

fn empty_connection_genesis() -> Value {
    json!({
        "connections": [],
        "client_connection_paths": [],
        "next_connection_sequence": "0",
        "params": { "max_expected_time_per_block": "30000000000" }
    })
}

/// The controller side stays enabled so the relaunched chain can open
/// accounts again; the host side starts disabled.
fn initial_ica_controller() -> Value {
    json!({
        "active_channels": [],
        "interchain_accounts": [],
        "ports": [],
        "params": { "controller_enabled": true }
    })
}

fn initial_ica_host() -> Value {
    json!({
        "active_channels": [],
        "interchain_accounts": [],
        "port": "icahost",
        "params": { "host_enabled": false, "allow_messages": [] }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn live_export() -> StateDocument {
        StateDocument::from_value(json!({
            "chain_id": "test-1",
            "genesis_time": "2022-01-01T00:00:00Z",
            "app_state": {
                "capability": { "index": "99", "owners": [ { "index": "5" } ] },
                "ibc": {
                    "channel_genesis": {
                        "channels": [ { "channel_id": "channel-0" } ],
                        "next_channel_sequence": "14"
                    },
                    "client_genesis": {
                        "clients": [ { "client_id": "07-tendermint-0" } ],
                        "next_client_sequence": "3"
                    },
                    "connection_genesis": {
                        "connections": [ { "id": "connection-0" } ],
                        "next_connection_sequence": "2"
                    }
                },
                "transfer": {
                    "denom_traces": [ { "path": "transfer/channel-0", "base_denom": "uatom" } ],
                    "params": { "send_enabled": true }
                },
                "interchainaccounts": {
                    "controller_genesis_state": { "active_channels": [ { "channel_id": "channel-1" } ] },
                    "host_genesis_state": { "active_channels": [ { "channel_id": "channel-2" } ] }
                },
                "interchainquery": { "host_port": "icqhost", "queries": [ { "id": "deadbeef" } ] },
                "interchainstaking": {
                    "params": { "deposit_interval": "20", "unbonding_enabled": true },
                    "zones": [ { "chain_id": "cosmoshub-4" } ]
                },
                "epochs": {
                    "epochs": [
                        {
                            "identifier": "epoch",
                            "duration": "21600s",
                            "start_time": "2022-11-11T11:00:00Z",
                            "current_epoch": "461",
                            "current_epoch_start_time": "2022-12-28T00:00:00Z",
                            "epoch_counting_started": true,
                            "current_epoch_start_height": "114000"
                        },
                        {
                            "identifier": "day",
                            "duration": "86400s",
                            "start_time": "2022-11-11T11:00:00Z",
                            "current_epoch": "115",
                            "current_epoch_start_time": "2022-12-28T00:00:00Z",
                            "epoch_counting_started": true,
                            "current_epoch_start_height": "114000"
                        },
                        {
                            "identifier": "week",
                            "duration": "604800s",
                            "start_time": "2022-11-11T11:00:00Z",
                            "current_epoch": "16",
                            "current_epoch_start_time": "2022-12-28T00:00:00Z",
                            "epoch_counting_started": true,
                            "current_epoch_start_height": "114000"
                        }
                    ]
                }
            }
        }))
        .unwrap()
    }

    use crate::profile::SubsystemReset as R;

    #[test]
    fn test_capability_reset_discards_owners() {
        let mut doc = live_export();
        reset_subsystems(&mut doc, &[R::Capability]).unwrap();
        assert_eq!(
            doc.root()["app_state"]["capability"],
            json!({ "index": "1" })
        );
    }

    #[test]
    fn test_ibc_reset_replaces_three_sub_blocks() {
        let mut doc = live_export();
        reset_subsystems(&mut doc, &[R::Ibc]).unwrap();

        let ibc = &doc.root()["app_state"]["ibc"];
        assert_eq!(ibc["channel_genesis"]["channels"], json!([]));
        assert_eq!(ibc["channel_genesis"]["next_channel_sequence"], json!("0"));
        assert_eq!(ibc["client_genesis"]["clients"], json!([]));
        assert_eq!(
            ibc["client_genesis"]["params"]["allowed_clients"],
            json!(["06-solomachine", "07-tendermint"])
        );
        assert_eq!(ibc["connection_genesis"]["connections"], json!([]));
        assert_eq!(
            ibc["connection_genesis"]["params"]["max_expected_time_per_block"],
            json!("30000000000")
        );
    }

    #[test]
    fn test_transfer_reset_keeps_sibling_params() {
        let mut doc = live_export();
        reset_subsystems(&mut doc, &[R::Transfer]).unwrap();

        let transfer = &doc.root()["app_state"]["transfer"];
        assert_eq!(transfer["denom_traces"], json!([]));
        assert_eq!(transfer["params"], json!({ "send_enabled": true }));
    }

    #[test]
    fn test_interchain_accounts_reset_to_defaults() {
        let mut doc = live_export();
        reset_subsystems(&mut doc, &[R::InterchainAccounts]).unwrap();

        let ica = &doc.root()["app_state"]["interchainaccounts"];
        assert_eq!(ica["controller_genesis_state"]["active_channels"], json!([]));
        assert_eq!(
            ica["controller_genesis_state"]["params"]["controller_enabled"],
            json!(true)
        );
        assert_eq!(ica["host_genesis_state"]["port"], json!("icahost"));
        assert_eq!(
            ica["host_genesis_state"]["params"]["host_enabled"],
            json!(false)
        );
    }

    #[test]
    fn test_interchain_query_reset_keeps_sibling_keys() {
        let mut doc = live_export();
        reset_subsystems(&mut doc, &[R::InterchainQuery]).unwrap();

        let icq = &doc.root()["app_state"]["interchainquery"];
        assert_eq!(icq["queries"], json!([]));
        assert_eq!(icq["host_port"], json!("icqhost"));
    }

    #[test]
    fn test_interchain_staking_keeps_only_params() {
        let mut doc = live_export();
        reset_subsystems(&mut doc, &[R::InterchainStaking]).unwrap();

        assert_eq!(
            doc.root()["app_state"]["interchainstaking"],
            json!({ "params": { "deposit_interval": "20", "unbonding_enabled": true } })
        );
    }

    #[test]
    fn test_resets_are_idempotent() {
        let mut once = live_export();
        reset_subsystems(&mut once, &R::ALL).unwrap();

        let mut twice = live_export();
        reset_subsystems(&mut twice, &R::ALL).unwrap();
        reset_subsystems(&mut twice, &R::ALL).unwrap();

        assert_eq!(once.root(), twice.root());
    }

    #[test]
    fn test_missing_subsystem_is_schema_mismatch() {
        let mut doc = StateDocument::from_value(json!({ "app_state": {} })).unwrap();
        let err = reset_subsystems(&mut doc, &[R::Capability]).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Document(DocumentError::SchemaMismatch(_))
        ));
        assert!(err.to_string().contains("app_state.capability"));
        // nothing was created
        assert!(doc.root()["app_state"].get("capability").is_none());
    }

    #[test]
    fn test_epoch_reset_targets_only_listed_indices() {
        let mut doc = live_export();
        reset_epochs(&mut doc, &[0, 1]).unwrap();

        let epochs = doc.root()["app_state"]["epochs"]["epochs"]
            .as_array()
            .unwrap();

        for epoch in &epochs[..2] {
            assert_eq!(epoch["current_epoch"], json!("0"));
            assert_eq!(epoch["epoch_counting_started"], json!(false));
            assert_eq!(epoch["start_time"], json!("0001-01-01T00:00:00Z"));
            assert_eq!(epoch["current_epoch_start_height"], json!("0"));
        }
        // identifier and duration survive on reset epochs
        assert_eq!(epochs[0]["identifier"], json!("epoch"));
        assert_eq!(epochs[1]["duration"], json!("86400s"));

        // the third epoch is untouched
        assert_eq!(epochs[2]["current_epoch"], json!("16"));
        assert_eq!(epochs[2]["epoch_counting_started"], json!(true));
    }

    #[test]
    fn test_epoch_reset_out_of_range() {
        let mut doc = live_export();
        let err = reset_epochs(&mut doc, &[0, 5]).unwrap_err();
        match err {
            MigrationError::IndexOutOfRange { index, len } => {
                assert_eq!(index, 5);
                assert_eq!(len, 3);
            }
            other => panic!("expected IndexOutOfRange, got {:?}", other),
        }
    }
}
