//! Stakes, contributors, and vesting contracts as returned by the backend.

use crate::amount;
use crate::node::events::ArbitrumEvent;
use serde::{Deserialize, Serialize};

/// An address with its contributed (and, for contribution contracts,
/// reserved) atomic amounts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contributor {
    pub address: String,
    #[serde(with = "amount::serde_atomic")]
    pub amount: u128,
    #[serde(default, with = "amount::serde_atomic_opt")]
    pub reserved: Option<u128>,
    #[serde(default)]
    pub beneficiary_address: Option<String>,
}

/// How a node left, or is leaving, the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitType {
    Exit,
    Deregister,
}

/// A confirmed on-chain service-node staking position. Only ever replaced by
/// a newer backend snapshot, never mutated locally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stake {
    /// Ed25519 network-layer identity key ("SN key").
    pub service_node_pubkey: String,
    /// BLS identity key used by the rewards contract.
    pub pubkey_bls: String,
    pub contract_id: u64,
    pub operator_address: String,
    #[serde(default)]
    pub contributors: Vec<Contributor>,
    pub active: bool,
    #[serde(default)]
    pub registration_height: Option<u64>,
    #[serde(default)]
    pub requested_unlock_height: Option<u64>,
    #[serde(default)]
    pub deregistration_height: Option<u64>,
    #[serde(default)]
    pub liquidation_height: Option<u64>,
    #[serde(default)]
    pub last_reward_block_height: Option<u64>,
    #[serde(default)]
    pub last_uptime_proof: Option<u64>,
    #[serde(default)]
    pub earned_downtime_blocks: Option<u64>,
    #[serde(default)]
    pub exit_type: Option<ExitType>,
    /// Operator fee in basis points.
    #[serde(default)]
    pub operator_fee: Option<u16>,
    #[serde(default, with = "amount::serde_atomic")]
    pub staking_requirement: u128,
    #[serde(default, with = "amount::serde_atomic")]
    pub total_contributed: u128,
    /// Lifecycle events, newest first once normalized by the aggregation
    /// layer.
    #[serde(default)]
    pub events: Vec<ArbitrumEvent>,
}

/// A token vesting contract tied to an address.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VestingContract {
    pub address: String,
    #[serde(default)]
    pub beneficiary: Option<String>,
    #[serde(with = "amount::serde_atomic")]
    pub initial_amount: u128,
}

/// Case-insensitive hex address comparison.
pub fn same_address(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Sum of `amount` over the contributors whose address matches, zero when
/// none do.
pub fn total_staked_for_address(contributors: &[Contributor], address: &str) -> u128 {
    contributors
        .iter()
        .filter(|c| same_address(&c.address, address))
        .map(|c| c.amount)
        .sum()
}

/// The matching contributor's reserved amount, zero when absent.
pub fn reserved_for_address(contributors: &[Contributor], address: &str) -> u128 {
    contributors
        .iter()
        .find(|c| same_address(&c.address, address))
        .and_then(|c| c.reserved)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contributor(address: &str, amount: u128, reserved: Option<u128>) -> Contributor {
        Contributor {
            address: address.to_string(),
            amount,
            reserved,
            beneficiary_address: None,
        }
    }

    #[test]
    fn total_ignores_other_addresses() {
        let contributors = vec![
            contributor("0xAbC", 100, None),
            contributor("0xdef", 50, None),
            contributor("0xabc", 25, None),
        ];
        assert_eq!(total_staked_for_address(&contributors, "0xABC"), 125);
        assert_eq!(total_staked_for_address(&contributors, "0x999"), 0);
    }

    #[test]
    fn reserved_defaults_to_zero() {
        let contributors = vec![contributor("0xabc", 10, None)];
        assert_eq!(reserved_for_address(&contributors, "0xabc"), 0);
        let contributors = vec![contributor("0xabc", 10, Some(400))];
        assert_eq!(reserved_for_address(&contributors, "0xABC"), 400);
    }

    #[test]
    fn contributor_amounts_decode_from_strings() {
        let c: Contributor = serde_json::from_str(
            r#"{"address":"0xabc","amount":"20000000000","reserved":"5000000000"}"#,
        )
        .unwrap();
        assert_eq!(c.amount, 20_000_000_000);
        assert_eq!(c.reserved, Some(5_000_000_000));
    }
}
