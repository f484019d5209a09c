//! session_stakes — local-first staking position view for Session Network.
//!
//! Reconciles on-chain stakes, contribution contracts, and live network
//! membership into a deduplicated, ordered per-address view.
//! Read-only; no keys; no transaction signing.

pub mod aggregate;
pub mod amount;
pub mod backend;
pub mod node;
pub mod report;
pub mod snapshot;

pub use aggregate::{
    parse_contracts, parse_stakes, ContractBuckets, StakeOverview,
    DEFAULT_NODE_MIN_LIFESPAN_ARB_BLOCKS,
};
pub use backend::{BackendClient, BackendConfig, ResponseCache, StakesResponse};
pub use node::{
    ArbitrumEvent, ContractStatus, Contributor, EventName, ReadyContract, Stake, StakeContract,
    VestingContract,
};
pub use report::ReportData;
pub use snapshot::{reproducibility_hash, SnapshotBundle, VerificationResult};
