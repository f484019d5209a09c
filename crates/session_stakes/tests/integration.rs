//! Integration tests using a saved backend-style fixture.

use session_stakes::aggregate::parse_stakes;
use session_stakes::backend::StakesResponse;
use session_stakes::node::{stake_state, StakeState};
use session_stakes::snapshot::{reproducibility_hash, verify_bundle_hash, SnapshotBundle};
use std::collections::BTreeSet;
use std::path::Path;

const ME: &str = "0xme00000000000000000000000000000000000001";

fn load_response() -> StakesResponse {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../testdata");
    let full = root.join("stakes_response.json");
    let s =
        std::fs::read_to_string(&full).unwrap_or_else(|e| panic!("read {}: {}", full.display(), e));
    serde_json::from_str(&s).unwrap_or_else(|e| panic!("parse stakes_response.json: {}", e))
}

#[test]
fn fixture_parses() {
    let response = load_response();
    assert_eq!(response.stakes.len(), 2);
    assert_eq!(response.contracts.len(), 3);
    assert_eq!(response.vesting.len(), 2);
    assert_eq!(response.network.block_height, 4_500_000);
    assert_eq!(response.stakes[0].contributors[0].amount, 20_000_000_000_000);
}

#[test]
fn aggregation_buckets_from_fixture() {
    let response = load_response();
    let overview = parse_stakes(
        response.stakes,
        response.contracts,
        response.vesting,
        ME,
        response.network.block_height,
        &response.added_bls_keys,
        1200,
    );

    // the unlockable exit request outranks the running node
    assert_eq!(overview.stakes[0].pubkey_bls, "bls-exiting");
    assert_eq!(
        stake_state(&overview.stakes[0], overview.block_height),
        StakeState::AwaitingExit
    );
    assert_eq!(
        stake_state(&overview.stakes[1], overview.block_height),
        StakeState::Running
    );

    // the open contract is shown; the not-ready one is skipped; the duplicate
    // of the running stake is hidden because it still holds the caller's funds
    let visible: Vec<&str> = overview
        .contracts
        .visible
        .iter()
        .map(|c| c.address.as_str())
        .collect();
    assert_eq!(visible, vec!["0xopen000000000000000000000000000000000001"]);
    assert!(overview.contracts.joining.is_empty());
    let hidden: Vec<&str> = overview
        .contracts
        .hidden_with_stakes
        .iter()
        .map(|c| c.address.as_str())
        .collect();
    assert_eq!(hidden, vec!["0xdup0000000000000000000000000000000000001"]);

    assert_eq!(
        overview.contracts.network_bls_keys,
        BTreeSet::from(["bls-live".to_string()])
    );
    assert_eq!(overview.contracts.network_contract_ids, BTreeSet::from([7]));

    // vesting sorts by initial amount descending
    assert_eq!(
        overview.vesting[0].address,
        "0xvest200000000000000000000000000000000001"
    );
}

#[test]
fn aggregation_is_deterministic() {
    let first = {
        let r = load_response();
        parse_stakes(
            r.stakes,
            r.contracts,
            r.vesting,
            ME,
            r.network.block_height,
            &r.added_bls_keys,
            1200,
        )
    };
    let second = {
        let r = load_response();
        parse_stakes(
            r.stakes,
            r.contracts,
            r.vesting,
            ME,
            r.network.block_height,
            &r.added_bls_keys,
            1200,
        )
    };
    assert_eq!(first, second);
}

#[test]
fn bundle_hash_verifies_round_trip() {
    let response = load_response();
    let overview = parse_stakes(
        response.stakes,
        response.contracts,
        response.vesting,
        ME,
        response.network.block_height,
        &response.added_bls_keys,
        1200,
    );
    let bundle = SnapshotBundle::new(ME.to_string(), overview);
    let hash = reproducibility_hash(&bundle).unwrap();
    assert_eq!(hash, reproducibility_hash(&bundle).unwrap());

    let json = serde_json::to_string(&bundle).unwrap();
    let reloaded: SnapshotBundle = serde_json::from_str(&json).unwrap();
    assert!(verify_bundle_hash(&reloaded, &hash).unwrap().matches);
}
