//! Domain model and classification for service-node staking positions.

pub mod contract;
pub mod events;
pub mod sort;
pub mod stake;
pub mod state;

pub use contract::{ready_contracts, ContractError, ContractStatus, ReadyContract, StakeContract};
pub use events::{cmp_events, sorted_events, ArbitrumEvent, EventName};
pub use stake::{
    reserved_for_address, same_address, total_staked_for_address, Contributor, ExitType, Stake,
    VestingContract,
};
pub use state::{
    contract_state, is_stake_deregistered, is_stake_ready_to_exit, is_stake_requesting_exit,
    stake_event_state, stake_state, ContractState, StakeEventState, StakeState,
};
