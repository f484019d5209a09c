//! Ordering policy for stakes and contribution contracts.

use crate::node::contract::{ContractStatus, ReadyContract};
use crate::node::events::{sorted_events, EventName};
use crate::node::stake::{
    reserved_for_address, same_address, total_staked_for_address, Contributor, Stake,
};
use crate::node::state::{is_stake_requesting_exit, stake_state, StakeState};
use std::cmp::Ordering;

/// Exit-requesting stakes slot between `AwaitingExit` and `Running`. The
/// fractional offset must stay strictly between adjacent integer ranks.
const EXIT_REQUESTED_OFFSET: f64 = 0.1;

fn stake_state_rank(state: StakeState) -> f64 {
    match state {
        StakeState::Decommissioned => 1.0,
        StakeState::AwaitingExit => 2.0,
        StakeState::Running => 3.0,
        StakeState::Deregistered => 4.0,
        StakeState::Exited => 5.0,
        StakeState::Unknown => 6.0,
    }
}

fn stake_priority(stake: &Stake, block_height: u64) -> f64 {
    let state = stake_state(stake, block_height);
    if is_stake_requesting_exit(stake) && state != StakeState::Deregistered {
        return stake_state_rank(StakeState::AwaitingExit) + EXIT_REQUESTED_OFFSET;
    }
    stake_state_rank(state)
}

/// Descending by the caller's total contributed amount.
pub fn cmp_total_staked_desc(a: &[Contributor], b: &[Contributor], address: &str) -> Ordering {
    total_staked_for_address(b, address).cmp(&total_staked_for_address(a, address))
}

/// Descending by the caller's reserved amount.
pub fn cmp_reserved_desc(a: &[Contributor], b: &[Contributor], address: &str) -> Ordering {
    reserved_for_address(b, address).cmp(&reserved_for_address(a, address))
}

/// Stake ordering: state priority first, then per-state urgency (downtime for
/// decommissioned nodes, unlock height for exit requests), then the caller's
/// stake size, then operator fee.
pub fn cmp_stakes(a: &Stake, b: &Stake, address: &str, block_height: u64) -> Ordering {
    let by_priority =
        stake_priority(a, block_height).total_cmp(&stake_priority(b, block_height));
    if by_priority != Ordering::Equal {
        return by_priority;
    }
    let state_a = stake_state(a, block_height);
    let state_b = stake_state(b, block_height);
    if state_a == StakeState::Decommissioned || state_b == StakeState::Decommissioned {
        return a
            .earned_downtime_blocks
            .unwrap_or(u64::MAX)
            .cmp(&b.earned_downtime_blocks.unwrap_or(u64::MAX));
    }
    if is_stake_requesting_exit(a) || is_stake_requesting_exit(b) {
        return a
            .requested_unlock_height
            .unwrap_or(u64::MAX)
            .cmp(&b.requested_unlock_height.unwrap_or(u64::MAX));
    }
    cmp_total_staked_desc(&a.contributors, &b.contributors, address)
        .then_with(|| a.operator_fee.unwrap_or(0).cmp(&b.operator_fee.unwrap_or(0)))
}

fn contract_status_rank(status: ContractStatus) -> u64 {
    match status {
        ContractStatus::WaitForFinalized => 1,
        ContractStatus::WaitForOperatorContrib => 2,
        ContractStatus::OpenForPublicContrib => 3,
        ContractStatus::Finalized => 4,
    }
}

fn contract_priority(contract: &ReadyContract, address: &str) -> u64 {
    if same_address(&contract.operator_address, address) {
        contract_status_rank(contract.status)
    } else {
        u64::MAX
    }
}

/// Contract ordering: operators see their own contracts ranked by how
/// urgently they need action; everyone else, and ties, fall back to the
/// caller's position size, then fee.
pub fn cmp_contracts(a: &ReadyContract, b: &ReadyContract, address: &str) -> Ordering {
    contract_priority(a, address)
        .cmp(&contract_priority(b, address))
        .then_with(|| cmp_reserved_desc(&a.contributors, &b.contributors, address))
        .then_with(|| cmp_total_staked_desc(&a.contributors, &b.contributors, address))
        .then_with(|| a.fee.cmp(&b.fee))
}

/// Block at which the contract's deploy event landed, zero when the event is
/// missing.
pub fn contract_deploy_block(contract: &ReadyContract) -> u64 {
    sorted_events(&contract.events)
        .iter()
        .find(|e| e.name == EventName::NewServiceNodeContributionContract)
        .map_or(0, |e| e.block)
}

/// Contracts ordered newest-deploy-first. The deploy block is computed once
/// per contract, not per comparison.
pub fn sorted_by_deploy_block_desc(contracts: Vec<ReadyContract>) -> Vec<ReadyContract> {
    let mut keyed: Vec<(u64, ReadyContract)> = contracts
        .into_iter()
        .map(|c| (contract_deploy_block(&c), c))
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0));
    keyed.into_iter().map(|(_, c)| c).collect()
}
