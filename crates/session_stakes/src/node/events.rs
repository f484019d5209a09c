//! Arbitrum contract events attached to stakes and contribution contracts.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Event names emitted by the rewards and contribution contracts. Names this
/// crate does not classify are preserved verbatim in `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventName {
    NewServiceNodeV2,
    ServiceNodeExitRequest,
    ServiceNodeExit,
    ServiceNodeLiquidated,
    NewServiceNodeContributionContract,
    NewContribution,
    Finalized,
    Other(String),
}

impl From<String> for EventName {
    fn from(s: String) -> Self {
        match s.as_str() {
            "NewServiceNodeV2" => Self::NewServiceNodeV2,
            "ServiceNodeExitRequest" => Self::ServiceNodeExitRequest,
            "ServiceNodeExit" => Self::ServiceNodeExit,
            "ServiceNodeLiquidated" => Self::ServiceNodeLiquidated,
            "NewServiceNodeContributionContract" => Self::NewServiceNodeContributionContract,
            "NewContribution" => Self::NewContribution,
            "Finalized" => Self::Finalized,
            _ => Self::Other(s),
        }
    }
}

impl From<EventName> for String {
    fn from(name: EventName) -> Self {
        match name {
            EventName::NewServiceNodeV2 => "NewServiceNodeV2".to_string(),
            EventName::ServiceNodeExitRequest => "ServiceNodeExitRequest".to_string(),
            EventName::ServiceNodeExit => "ServiceNodeExit".to_string(),
            EventName::ServiceNodeLiquidated => "ServiceNodeLiquidated".to_string(),
            EventName::NewServiceNodeContributionContract => {
                "NewServiceNodeContributionContract".to_string()
            }
            EventName::NewContribution => "NewContribution".to_string(),
            EventName::Finalized => "Finalized".to_string(),
            EventName::Other(s) => s,
        }
    }
}

/// A contract event as emitted on Arbitrum.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArbitrumEvent {
    pub name: EventName,
    pub block: u64,
    pub log_index: u64,
    pub tx_hash: String,
    #[serde(default)]
    pub args: Option<serde_json::Value>,
}

/// Newest-first event order: block descending, then log index descending.
pub fn cmp_events(a: &ArbitrumEvent, b: &ArbitrumEvent) -> Ordering {
    b.block.cmp(&a.block).then(b.log_index.cmp(&a.log_index))
}

/// Copy of `events` sorted newest-first (see [`cmp_events`]). The input is
/// left untouched.
pub fn sorted_events(events: &[ArbitrumEvent]) -> Vec<ArbitrumEvent> {
    let mut sorted = events.to_vec();
    sorted.sort_by(cmp_events);
    sorted
}
