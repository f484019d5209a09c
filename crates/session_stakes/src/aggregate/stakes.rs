//! Top-level aggregation of stakes, contracts, and vesting for an address.

use crate::aggregate::contracts::{parse_contracts, ContractBuckets};
use crate::node::contract::{ready_contracts, StakeContract};
use crate::node::events::sorted_events;
use crate::node::sort::cmp_stakes;
use crate::node::stake::{Stake, VestingContract};
use crate::node::state::{stake_event_state, StakeEventState};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::error;

/// Default `Finalized`-event block threshold below which a finalized contract
/// is still treated as joining the network.
pub const DEFAULT_NODE_MIN_LIFESPAN_ARB_BLOCKS: u64 = 1200;

/// Everything the UI needs for one address at one block height.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StakeOverview {
    pub stakes: Vec<Stake>,
    pub vesting: Vec<VestingContract>,
    pub contracts: ContractBuckets,
    pub block_height: u64,
}

/// Build the per-address view from one backend snapshot.
///
/// Stake event lists are normalized newest-first, stakes and vesting are
/// sorted, and the BLS keys of actively running stakes feed the contract
/// deduplication. Contracts whose post-deploy fields are not yet populated
/// are excluded; if that filter fails on malformed data the error is logged
/// and the view degrades to stakes and vesting only.
pub fn parse_stakes(
    stakes: Vec<Stake>,
    contracts: Vec<StakeContract>,
    vesting: Vec<VestingContract>,
    address: &str,
    block_height: u64,
    added_bls_keys: &BTreeMap<String, u64>,
    node_min_lifespan_arb_blocks: u64,
) -> StakeOverview {
    let mut stakes: Vec<Stake> = stakes
        .into_iter()
        .map(|mut stake| {
            stake.events = sorted_events(&stake.events);
            stake
        })
        .collect();
    stakes.sort_by(|a, b| cmp_stakes(a, b, address, block_height));

    let running_stakes_bls_keys: BTreeSet<String> = stakes
        .iter()
        .filter(|s| stake_event_state(s) == StakeEventState::Active)
        .map(|s| s.pubkey_bls.clone())
        .collect();

    let mut vesting = vesting;
    vesting.sort_by(|a, b| b.initial_amount.cmp(&a.initial_amount));

    let ready = match ready_contracts(&contracts) {
        Ok(ready) => ready,
        Err(e) => {
            error!(%e, "failed to filter ready contribution contracts, omitting contracts");
            Vec::new()
        }
    };

    let contracts = parse_contracts(
        ready,
        address,
        added_bls_keys,
        node_min_lifespan_arb_blocks,
        &running_stakes_bls_keys,
    );

    StakeOverview {
        stakes,
        vesting,
        contracts,
        block_height,
    }
}
