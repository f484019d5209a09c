//! Snapshot bundle and SHA-256 reproducibility hash.

use crate::aggregate::StakeOverview;
use crate::node::contract::ReadyContract;
use crate::node::stake::{Stake, VestingContract};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("serialize: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

const BUNDLE_VERSION: u32 = 1;

/// Aggregated positions for an address at a block height, self-contained so
/// anyone can re-verify the hash offline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotBundle {
    pub version: u32,
    pub address: String,
    pub created_utc_rfc3339: String,
    pub block_height: u64,
    pub stakes: Vec<Stake>,
    pub visible_contracts: Vec<ReadyContract>,
    pub joining_contracts: Vec<ReadyContract>,
    pub hidden_contracts_with_stakes: Vec<ReadyContract>,
    pub vesting: Vec<VestingContract>,
    pub network_bls_keys: BTreeSet<String>,
    pub network_contract_ids: BTreeSet<u64>,
}

impl SnapshotBundle {
    pub fn new(address: String, overview: StakeOverview) -> Self {
        let created_utc_rfc3339 = time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| String::new());
        Self {
            version: BUNDLE_VERSION,
            address,
            created_utc_rfc3339,
            block_height: overview.block_height,
            stakes: overview.stakes,
            visible_contracts: overview.contracts.visible,
            joining_contracts: overview.contracts.joining,
            hidden_contracts_with_stakes: overview.contracts.hidden_with_stakes,
            vesting: overview.vesting,
            network_bls_keys: overview.contracts.network_bls_keys,
            network_contract_ids: overview.contracts.network_contract_ids,
        }
    }

    /// Small fixed bundle for demo reports and screenshots.
    pub fn demo() -> Self {
        use crate::node::contract::ContractStatus;
        use crate::node::events::{ArbitrumEvent, EventName};
        use crate::node::stake::Contributor;

        let me = "0x1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b".to_string();
        let stake = Stake {
            service_node_pubkey: "4f9a…demo-ed25519".to_string(),
            pubkey_bls: "8c1e…demo-bls".to_string(),
            contract_id: 42,
            operator_address: me.clone(),
            contributors: vec![Contributor {
                address: me.clone(),
                amount: 20_000_000_000_000,
                reserved: None,
                beneficiary_address: None,
            }],
            active: true,
            registration_height: Some(4_100_000),
            requested_unlock_height: None,
            deregistration_height: None,
            liquidation_height: None,
            last_reward_block_height: Some(4_490_000),
            last_uptime_proof: Some(4_499_000),
            earned_downtime_blocks: None,
            exit_type: None,
            operator_fee: Some(1000),
            staking_requirement: 20_000_000_000_000,
            total_contributed: 20_000_000_000_000,
            events: vec![ArbitrumEvent {
                name: EventName::NewServiceNodeV2,
                block: 4_100_000,
                log_index: 3,
                tx_hash: "0xdemo-registration".to_string(),
                args: None,
            }],
        };
        let contract = ReadyContract {
            address: "0xdemo-contribution-contract".to_string(),
            operator_address: me.clone(),
            pubkey_bls: "6b7d…demo-bls-2".to_string(),
            service_node_pubkey: Some("92ee…demo-ed25519-2".to_string()),
            status: ContractStatus::OpenForPublicContrib,
            fee: 500,
            manual_finalize: false,
            contributors: vec![Contributor {
                address: me.clone(),
                amount: 5_000_000_000_000,
                reserved: Some(5_000_000_000_000),
                beneficiary_address: None,
            }],
            events: vec![ArbitrumEvent {
                name: EventName::NewServiceNodeContributionContract,
                block: 4_450_000,
                log_index: 0,
                tx_hash: "0xdemo-deploy".to_string(),
                args: None,
            }],
        };
        let vesting = VestingContract {
            address: "0xdemo-vesting".to_string(),
            beneficiary: Some(me.clone()),
            initial_amount: 40_000_000_000_000,
        };
        Self {
            version: BUNDLE_VERSION,
            address: me,
            created_utc_rfc3339: "2026-01-01T00:00:00Z".to_string(),
            block_height: 4_500_000,
            stakes: vec![stake],
            visible_contracts: vec![contract],
            joining_contracts: vec![],
            hidden_contracts_with_stakes: vec![],
            vesting: vec![vesting],
            network_bls_keys: BTreeSet::from(["8c1e…demo-bls".to_string()]),
            network_contract_ids: BTreeSet::from([42]),
        }
    }
}

/// Normalize JSON for hashing: keys sorted, no whitespace.
pub fn normalize_for_hash(value: &serde_json::Value) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(&sort_json_keys(value))?)
}

fn sort_json_keys(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let sorted: std::collections::BTreeMap<String, serde_json::Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), sort_json_keys(v)))
                .collect();
            serde_json::Value::Object(sorted.into_iter().collect())
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(sort_json_keys).collect())
        }
        other => other.clone(),
    }
}

/// SHA-256 over the normalized bundle JSON.
pub fn reproducibility_hash(bundle: &SnapshotBundle) -> Result<String, SnapshotError> {
    let json = serde_json::to_value(bundle)?;
    let normalized = normalize_for_hash(&json)?;
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VerificationResult {
    pub bundle_hash: String,
    pub expected_hash: Option<String>,
    pub matches: bool,
}

/// Verify a bundle against an expected `.sha256` file content.
pub fn verify_bundle_hash(
    bundle: &SnapshotBundle,
    expected_hex: &str,
) -> Result<VerificationResult, SnapshotError> {
    let bundle_hash = reproducibility_hash(bundle)?;
    let expected = expected_hex.trim().to_lowercase();
    let matches = bundle_hash.to_lowercase() == expected;
    Ok(VerificationResult {
        bundle_hash,
        expected_hash: Some(expected),
        matches,
    })
}
