//! Deduplication and bucketing of contribution contracts.

use crate::node::contract::{ContractStatus, ReadyContract};
use crate::node::events::{sorted_events, EventName};
use crate::node::sort::{cmp_contracts, sorted_by_deploy_block_desc};
use crate::node::stake::total_staked_for_address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Per-address contract view: what to show, what is still joining the
/// network, and duplicates that hold the caller's funds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractBuckets {
    pub visible: Vec<ReadyContract>,
    pub joining: Vec<ReadyContract>,
    /// Duplicates of a more authoritative record that still carry a positive
    /// contribution from the caller. A warning list, never shown as open.
    pub hidden_with_stakes: Vec<ReadyContract>,
    pub network_bls_keys: BTreeSet<String>,
    pub network_contract_ids: BTreeSet<u64>,
}

/// Reconcile contribution contracts against network membership and running
/// stakes.
///
/// Contracts are visited newest-deploy-first so that, of several contracts
/// sharing a BLS key, only the most recent one is eligible to be shown. A
/// contract whose key is already live in the network (`added_bls_keys`),
/// already admitted this pass, or already represented by a running stake is a
/// duplicate: it is dropped, except that a non-finalized duplicate holding a
/// positive contribution from `address` goes to `hidden_with_stakes` so the
/// caller keeps sight of their funds.
///
/// Finalized contracts are classified by the block of their most recent
/// `Finalized` event against `node_min_lifespan_arb_blocks`: below the
/// threshold they are still `joining`; at or above it a live stake is assumed
/// to supersede them and they are dropped. A finalized contract missing its
/// `Finalized` event is kept visible and logged, never hidden on data we
/// cannot validate.
pub fn parse_contracts(
    contracts: Vec<ReadyContract>,
    address: &str,
    added_bls_keys: &BTreeMap<String, u64>,
    node_min_lifespan_arb_blocks: u64,
    running_stakes_bls_keys: &BTreeSet<String>,
) -> ContractBuckets {
    let network_bls_keys: BTreeSet<String> = added_bls_keys.keys().cloned().collect();
    let network_contract_ids: BTreeSet<u64> = added_bls_keys.values().copied().collect();

    let mut visible = Vec::new();
    let mut joining = Vec::new();
    let mut hidden_with_stakes = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for contract in sorted_by_deploy_block_desc(contracts) {
        let duplicate = network_bls_keys.contains(&contract.pubkey_bls)
            || seen.contains(&contract.pubkey_bls)
            || running_stakes_bls_keys.contains(&contract.pubkey_bls);
        if duplicate {
            if contract.status != ContractStatus::Finalized
                && total_staked_for_address(&contract.contributors, address) > 0
            {
                hidden_with_stakes.push(contract);
            }
            continue;
        }

        if contract.status == ContractStatus::Finalized {
            let finalized_block = sorted_events(&contract.events)
                .iter()
                .find(|e| e.name == EventName::Finalized)
                .map(|e| e.block);
            match finalized_block {
                Some(block) if block >= node_min_lifespan_arb_blocks => {
                    // old enough that a live stake snapshot supersedes it
                    continue;
                }
                Some(_) => {
                    seen.insert(contract.pubkey_bls.clone());
                    joining.push(contract);
                    continue;
                }
                None => {
                    warn!(
                        contract = %contract.address,
                        "finalized contract has no Finalized event, keeping it visible"
                    );
                }
            }
        }

        seen.insert(contract.pubkey_bls.clone());
        visible.push(contract);
    }

    visible.sort_by(|a, b| cmp_contracts(a, b, address));
    joining.sort_by(|a, b| cmp_contracts(a, b, address));
    hidden_with_stakes.sort_by(|a, b| cmp_contracts(a, b, address));

    ContractBuckets {
        visible,
        joining,
        hidden_with_stakes,
        network_bls_keys,
        network_contract_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::events::ArbitrumEvent;
    use crate::node::stake::Contributor;

    fn deploy_event(block: u64) -> ArbitrumEvent {
        ArbitrumEvent {
            name: EventName::NewServiceNodeContributionContract,
            block,
            log_index: 0,
            tx_hash: format!("0xdeploy{block}"),
            args: None,
        }
    }

    fn finalized_event(block: u64) -> ArbitrumEvent {
        ArbitrumEvent {
            name: EventName::Finalized,
            block,
            log_index: 0,
            tx_hash: format!("0xfin{block}"),
            args: None,
        }
    }

    fn contract(address: &str, bls: &str, status: ContractStatus) -> ReadyContract {
        ReadyContract {
            address: address.to_string(),
            operator_address: "0xop".to_string(),
            pubkey_bls: bls.to_string(),
            service_node_pubkey: None,
            status,
            fee: 100,
            manual_finalize: false,
            contributors: vec![],
            events: vec![],
        }
    }

    fn parse(
        contracts: Vec<ReadyContract>,
        added: &BTreeMap<String, u64>,
        running: &BTreeSet<String>,
    ) -> ContractBuckets {
        parse_contracts(contracts, "0xme", added, 1000, running)
    }

    #[test]
    fn newest_deploy_wins_duplicate_bls_key() {
        let mut older = contract("0xold", "dup", ContractStatus::OpenForPublicContrib);
        older.events = vec![deploy_event(60)];
        let mut newer = contract("0xnew", "dup", ContractStatus::OpenForPublicContrib);
        newer.events = vec![deploy_event(70)];
        let buckets = parse(vec![older, newer], &BTreeMap::new(), &BTreeSet::new());
        assert_eq!(buckets.visible.len(), 1);
        assert_eq!(buckets.visible[0].address, "0xnew");
        assert!(buckets.joining.is_empty());
        assert!(buckets.hidden_with_stakes.is_empty());
    }

    #[test]
    fn duplicate_with_callers_stake_is_hidden_not_dropped() {
        let mut older = contract("0xold", "dup", ContractStatus::OpenForPublicContrib);
        older.events = vec![deploy_event(60)];
        older.contributors = vec![Contributor {
            address: "0xME".to_string(),
            amount: 500,
            reserved: None,
            beneficiary_address: None,
        }];
        let mut newer = contract("0xnew", "dup", ContractStatus::OpenForPublicContrib);
        newer.events = vec![deploy_event(70)];
        let buckets = parse(vec![older, newer], &BTreeMap::new(), &BTreeSet::new());
        assert_eq!(buckets.visible.len(), 1);
        assert_eq!(buckets.hidden_with_stakes.len(), 1);
        assert_eq!(buckets.hidden_with_stakes[0].address, "0xold");
    }

    #[test]
    fn live_network_key_suppresses_contract() {
        let c = contract("0xc", "live", ContractStatus::OpenForPublicContrib);
        let added = BTreeMap::from([("live".to_string(), 5u64)]);
        let buckets = parse(vec![c], &added, &BTreeSet::new());
        assert!(buckets.visible.is_empty());
        assert!(buckets.hidden_with_stakes.is_empty());
    }

    #[test]
    fn running_stake_suppresses_contract() {
        let c = contract("0xc", "running", ContractStatus::OpenForPublicContrib);
        let running = BTreeSet::from(["running".to_string()]);
        let buckets = parse(vec![c], &BTreeMap::new(), &running);
        assert!(buckets.visible.is_empty());
    }

    #[test]
    fn finalized_lifespan_boundary() {
        let mut joining = contract("0xj", "j", ContractStatus::Finalized);
        joining.events = vec![finalized_event(999)];
        let mut stale = contract("0xs", "s", ContractStatus::Finalized);
        stale.events = vec![finalized_event(1000)];
        let buckets = parse(vec![joining, stale], &BTreeMap::new(), &BTreeSet::new());
        assert_eq!(buckets.joining.len(), 1);
        assert_eq!(buckets.joining[0].address, "0xj");
        assert!(buckets.visible.is_empty());
    }

    #[test]
    fn finalized_without_event_stays_visible() {
        let c = contract("0xc", "k", ContractStatus::Finalized);
        let buckets = parse(vec![c], &BTreeMap::new(), &BTreeSet::new());
        assert_eq!(buckets.visible.len(), 1);
        assert!(buckets.joining.is_empty());
    }

    #[test]
    fn network_sets_derive_from_added_keys() {
        let added = BTreeMap::from([("k1".to_string(), 5u64), ("k2".to_string(), 7u64)]);
        let buckets = parse(vec![], &added, &BTreeSet::new());
        assert_eq!(
            buckets.network_bls_keys,
            BTreeSet::from(["k1".to_string(), "k2".to_string()])
        );
        assert_eq!(buckets.network_contract_ids, BTreeSet::from([5, 7]));
    }

    #[test]
    fn bls_key_lands_in_one_bucket_only() {
        let mut a = contract("0xa", "k", ContractStatus::Finalized);
        a.events = vec![deploy_event(90), finalized_event(500)];
        let mut b = contract("0xb", "k", ContractStatus::OpenForPublicContrib);
        b.events = vec![deploy_event(80)];
        let buckets = parse(vec![a, b], &BTreeMap::new(), &BTreeSet::new());
        assert_eq!(buckets.joining.len(), 1);
        assert!(buckets.visible.is_empty());
    }
}
