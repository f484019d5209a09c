//! Multi-contributor contribution contracts.

use crate::node::events::ArbitrumEvent;
use crate::node::stake::Contributor;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// On-chain lifecycle of a contribution contract. Transitions are monotonic
/// and happen on-chain only; this crate reads them, never advances them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ContractStatus {
    WaitForOperatorContrib,
    OpenForPublicContrib,
    WaitForFinalized,
    Finalized,
}

impl TryFrom<u8> for ContractStatus {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::WaitForOperatorContrib),
            1 => Ok(Self::OpenForPublicContrib),
            2 => Ok(Self::WaitForFinalized),
            3 => Ok(Self::Finalized),
            other => Err(format!("unknown contract status {other}")),
        }
    }
}

impl From<ContractStatus> for u8 {
    fn from(status: ContractStatus) -> Self {
        match status {
            ContractStatus::WaitForOperatorContrib => 0,
            ContractStatus::OpenForPublicContrib => 1,
            ContractStatus::WaitForFinalized => 2,
            ContractStatus::Finalized => 3,
        }
    }
}

/// A contribution contract as the backend returns it. `fee` and `pubkey_bls`
/// are populated asynchronously shortly after deployment and stay null until
/// then.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StakeContract {
    pub address: String,
    pub operator_address: String,
    #[serde(default)]
    pub pubkey_bls: Option<String>,
    #[serde(default)]
    pub service_node_pubkey: Option<String>,
    pub status: ContractStatus,
    /// Operator fee in basis points.
    #[serde(default)]
    pub fee: Option<u16>,
    #[serde(default)]
    pub manual_finalize: bool,
    #[serde(default)]
    pub contributors: Vec<Contributor>,
    #[serde(default)]
    pub events: Vec<ArbitrumEvent>,
}

/// A contribution contract whose post-deploy fields have been populated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadyContract {
    pub address: String,
    pub operator_address: String,
    pub pubkey_bls: String,
    #[serde(default)]
    pub service_node_pubkey: Option<String>,
    pub status: ContractStatus,
    /// Operator fee in basis points.
    pub fee: u16,
    #[serde(default)]
    pub manual_finalize: bool,
    #[serde(default)]
    pub contributors: Vec<Contributor>,
    #[serde(default)]
    pub events: Vec<ArbitrumEvent>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ContractError {
    #[error("contract {0}: fee and BLS key must be populated together")]
    PartiallyPopulated(String),
}

/// Keep the contracts whose `fee` and `pubkey_bls` have both been populated.
/// A contract with neither set is too new and is skipped; one set without the
/// other is malformed backend data and fails the whole filter.
pub fn ready_contracts(contracts: &[StakeContract]) -> Result<Vec<ReadyContract>, ContractError> {
    let mut ready = Vec::with_capacity(contracts.len());
    for contract in contracts {
        match (&contract.pubkey_bls, contract.fee) {
            (Some(pubkey_bls), Some(fee)) => ready.push(ReadyContract {
                address: contract.address.clone(),
                operator_address: contract.operator_address.clone(),
                pubkey_bls: pubkey_bls.clone(),
                service_node_pubkey: contract.service_node_pubkey.clone(),
                status: contract.status,
                fee,
                manual_finalize: contract.manual_finalize,
                contributors: contract.contributors.clone(),
                events: contract.events.clone(),
            }),
            (None, None) => {}
            _ => return Err(ContractError::PartiallyPopulated(contract.address.clone())),
        }
    }
    Ok(ready)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(address: &str, pubkey_bls: Option<&str>, fee: Option<u16>) -> StakeContract {
        StakeContract {
            address: address.to_string(),
            operator_address: "0xop".to_string(),
            pubkey_bls: pubkey_bls.map(str::to_string),
            service_node_pubkey: None,
            status: ContractStatus::OpenForPublicContrib,
            fee,
            manual_finalize: false,
            contributors: vec![],
            events: vec![],
        }
    }

    #[test]
    fn status_decodes_from_integers() {
        let status: ContractStatus = serde_json::from_str("2").unwrap();
        assert_eq!(status, ContractStatus::WaitForFinalized);
        assert!(serde_json::from_str::<ContractStatus>("7").is_err());
    }

    #[test]
    fn skips_contracts_awaiting_population() {
        let ready = ready_contracts(&[raw("0xa", None, None), raw("0xb", Some("bls-b"), Some(500))])
            .unwrap();
        assert_eq!(ready.len(), 1);
        assert_eq!(ready[0].address, "0xb");
        assert_eq!(ready[0].fee, 500);
    }

    #[test]
    fn rejects_partially_populated() {
        let err = ready_contracts(&[raw("0xa", Some("bls-a"), None)]).unwrap_err();
        assert_eq!(err, ContractError::PartiallyPopulated("0xa".to_string()));
        let err = ready_contracts(&[raw("0xb", None, Some(100))]).unwrap_err();
        assert_eq!(err, ContractError::PartiallyPopulated("0xb".to_string()));
    }
}
