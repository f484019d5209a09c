//! Stake and contribution-contract display-state derivation.

use crate::node::contract::{ContractStatus, ReadyContract};
use crate::node::events::EventName;
use crate::node::stake::{ExitType, Stake};
use std::fmt;

/// State implied by a stake's most recent lifecycle event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StakeEventState {
    Active,
    ExitRequested,
    Exited,
    Unknown,
}

/// Display state of a confirmed stake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StakeState {
    Running,
    Decommissioned,
    AwaitingExit,
    Exited,
    Deregistered,
    Unknown,
}

impl fmt::Display for StakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Running => "Running",
            Self::Decommissioned => "Decommissioned",
            Self::AwaitingExit => "Awaiting Exit",
            Self::Exited => "Exited",
            Self::Deregistered => "Deregistered",
            Self::Unknown => "Unknown",
        })
    }
}

/// Display state of a contribution contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContractState {
    AwaitingOperatorContribution,
    AwaitingContributors,
    AwaitingOperatorActivation,
    Joining,
}

impl fmt::Display for ContractState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AwaitingOperatorContribution => "Awaiting Operator Contribution",
            Self::AwaitingContributors => "Awaiting Contributors",
            Self::AwaitingOperatorActivation => "Awaiting Operator Activation",
            Self::Joining => "Joining",
        })
    }
}

/// Classify a stake by its most recent event. The event list must already be
/// ordered newest-first; an empty list is `Unknown`.
pub fn stake_event_state(stake: &Stake) -> StakeEventState {
    match stake.events.first().map(|e| &e.name) {
        Some(EventName::NewServiceNodeV2) => StakeEventState::Active,
        Some(EventName::ServiceNodeExitRequest) => StakeEventState::ExitRequested,
        Some(EventName::ServiceNodeExit | EventName::ServiceNodeLiquidated) => {
            StakeEventState::Exited
        }
        _ => StakeEventState::Unknown,
    }
}

/// True when the network deregistered the node.
pub fn is_stake_deregistered(stake: &Stake) -> bool {
    stake.exit_type == Some(ExitType::Deregister)
        && stake.deregistration_height.is_some_and(|h| h > 0)
}

/// True when an exit has been requested, whether or not the unlock height has
/// passed.
pub fn is_stake_requesting_exit(stake: &Stake) -> bool {
    stake_event_state(stake) == StakeEventState::ExitRequested
}

/// True when an exit has been requested and the unlock height has passed.
pub fn is_stake_ready_to_exit(stake: &Stake, block_height: u64) -> bool {
    is_stake_requesting_exit(stake)
        && stake.requested_unlock_height.is_some_and(|h| h < block_height)
}

/// Derive the display state of a stake. Deregistration wins over everything,
/// including an event trail that already says the node exited.
pub fn stake_state(stake: &Stake, block_height: u64) -> StakeState {
    if is_stake_deregistered(stake) {
        return StakeState::Deregistered;
    }
    match stake_event_state(stake) {
        StakeEventState::Exited => StakeState::Exited,
        StakeEventState::ExitRequested => {
            if stake.requested_unlock_height.is_some_and(|h| h < block_height) {
                StakeState::AwaitingExit
            } else {
                StakeState::Running
            }
        }
        StakeEventState::Active => {
            if stake.active {
                StakeState::Running
            } else {
                StakeState::Decommissioned
            }
        }
        StakeEventState::Unknown => StakeState::Unknown,
    }
}

/// Map a contract's on-chain status to its display state.
pub fn contract_state(contract: &ReadyContract) -> ContractState {
    match contract.status {
        ContractStatus::WaitForOperatorContrib => ContractState::AwaitingOperatorContribution,
        ContractStatus::OpenForPublicContrib => ContractState::AwaitingContributors,
        ContractStatus::WaitForFinalized => ContractState::AwaitingOperatorActivation,
        ContractStatus::Finalized => ContractState::Joining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::events::ArbitrumEvent;

    fn stake_with_events(names: &[EventName]) -> Stake {
        Stake {
            service_node_pubkey: "ed25519".to_string(),
            pubkey_bls: "bls".to_string(),
            contract_id: 1,
            operator_address: "0xop".to_string(),
            contributors: vec![],
            active: true,
            registration_height: Some(100),
            requested_unlock_height: None,
            deregistration_height: None,
            liquidation_height: None,
            last_reward_block_height: None,
            last_uptime_proof: None,
            earned_downtime_blocks: None,
            exit_type: None,
            operator_fee: None,
            staking_requirement: 0,
            total_contributed: 0,
            events: names
                .iter()
                .enumerate()
                .map(|(i, name)| ArbitrumEvent {
                    name: name.clone(),
                    block: 1000 - i as u64,
                    log_index: 0,
                    tx_hash: format!("0x{i}"),
                    args: None,
                })
                .collect(),
        }
    }

    #[test]
    fn no_events_is_unknown() {
        let stake = stake_with_events(&[]);
        assert_eq!(stake_event_state(&stake), StakeEventState::Unknown);
        assert_eq!(stake_state(&stake, 2000), StakeState::Unknown);
    }

    #[test]
    fn only_latest_event_counts() {
        let stake = stake_with_events(&[
            EventName::ServiceNodeExitRequest,
            EventName::NewServiceNodeV2,
        ]);
        assert_eq!(stake_event_state(&stake), StakeEventState::ExitRequested);
    }

    #[test]
    fn deregistration_beats_exit_events() {
        let mut stake = stake_with_events(&[EventName::ServiceNodeExit]);
        stake.exit_type = Some(ExitType::Deregister);
        stake.deregistration_height = Some(900);
        assert_eq!(stake_state(&stake, 2000), StakeState::Deregistered);
        // a zero height means the deregistration never landed
        stake.deregistration_height = Some(0);
        assert_eq!(stake_state(&stake, 2000), StakeState::Exited);
    }

    #[test]
    fn liquidated_counts_as_exited() {
        let stake = stake_with_events(&[EventName::ServiceNodeLiquidated]);
        assert_eq!(stake_state(&stake, 2000), StakeState::Exited);
    }

    #[test]
    fn exit_request_waits_for_unlock_height() {
        let mut stake = stake_with_events(&[EventName::ServiceNodeExitRequest]);
        stake.requested_unlock_height = Some(1500);
        assert_eq!(stake_state(&stake, 1400), StakeState::Running);
        assert!(!is_stake_ready_to_exit(&stake, 1400));
        assert_eq!(stake_state(&stake, 1501), StakeState::AwaitingExit);
        assert!(is_stake_ready_to_exit(&stake, 1501));
        // equal heights are not yet unlockable
        assert_eq!(stake_state(&stake, 1500), StakeState::Running);
    }

    #[test]
    fn inactive_node_is_decommissioned() {
        let mut stake = stake_with_events(&[EventName::NewServiceNodeV2]);
        stake.active = false;
        assert_eq!(stake_state(&stake, 2000), StakeState::Decommissioned);
        stake.active = true;
        assert_eq!(stake_state(&stake, 2000), StakeState::Running);
    }

    #[test]
    fn contract_status_maps_to_display_state() {
        let mut contract = ReadyContract {
            address: "0xc".to_string(),
            operator_address: "0xop".to_string(),
            pubkey_bls: "bls".to_string(),
            service_node_pubkey: None,
            status: ContractStatus::WaitForOperatorContrib,
            fee: 0,
            manual_finalize: false,
            contributors: vec![],
            events: vec![],
        };
        assert_eq!(
            contract_state(&contract),
            ContractState::AwaitingOperatorContribution
        );
        contract.status = ContractStatus::Finalized;
        assert_eq!(contract_state(&contract), ContractState::Joining);
    }
}
