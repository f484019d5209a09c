//! Reconciliation of stakes, contribution contracts, and network membership
//! into the per-address view.

mod contracts;
mod stakes;

pub use contracts::{parse_contracts, ContractBuckets};
pub use stakes::{parse_stakes, StakeOverview, DEFAULT_NODE_MIN_LIFESPAN_ARB_BLOCKS};
