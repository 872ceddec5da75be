mod common;

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use minipool_collector::collector::CollectError;
use minipool_collector::rpc::Token;

use common::{
    MockCaller, POOL, collector, deposit_input, options, pubkey_hex, uint, with_pool,
};

fn minipools(count: u8) -> Vec<Address> {
    (1..=count).map(Address::repeat_byte).collect()
}

#[tokio::test]
async fn table_is_keyed_by_validator_pubkey() {
    let pools = minipools(3);
    let mock = Arc::new(with_pool(MockCaller::new(), &pools, &[0xc1, 0xc2, 0xc3]));
    let collector = collector(&mock, options(8, Duration::from_secs(5)));

    let active = collector.active_by_validator_pubkey().await.unwrap();

    assert_eq!(active.len(), 3);
    assert_eq!(active[&pubkey_hex(0xc1)], pools[0]);
    assert_eq!(active[&pubkey_hex(0xc2)], pools[1]);
    assert_eq!(active[&pubkey_hex(0xc3)], pools[2]);
    // count + 3 адреса + 3 depositInput
    assert_eq!(mock.calls(), 7);
    assert_eq!(mock.binds(), 3);
}

#[tokio::test]
async fn empty_pool_issues_only_the_count_call() {
    let mock = Arc::new(with_pool(MockCaller::new(), &[], &[]));
    let collector = collector(&mock, options(8, Duration::from_secs(5)));

    let active = collector.active_by_validator_pubkey().await.unwrap();
    assert!(active.is_empty());
    assert_eq!(mock.calls(), 1);
    assert_eq!(mock.binds(), 0);
}

#[tokio::test]
async fn deposit_input_failure_fails_the_whole_table() {
    let pools = minipools(3);
    let mock = with_pool(MockCaller::new(), &pools, &[0xc1, 0xc2, 0xc3]).fails(
        pools[1],
        "getDepositInput",
        vec![],
        "out of gas",
    );
    let mock = Arc::new(mock);
    let collector = collector(&mock, options(8, Duration::from_secs(5)));

    let err = collector.active_by_validator_pubkey().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error retrieving minipool depositInput data: call reverted: out of gas"
    );
}

#[tokio::test]
async fn address_failure_stops_before_second_phase() {
    let pools = minipools(3);
    let mock = with_pool(MockCaller::new(), &pools, &[0xc1, 0xc2, 0xc3]).fails(
        POOL,
        "getPoolAt",
        vec![uint(1)],
        "index out of bounds",
    );
    let mock = Arc::new(mock);
    let collector = collector(&mock, options(8, Duration::from_secs(5)));

    let err = collector.active_by_validator_pubkey().await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Error retrieving minipool address: call reverted: index out of bounds"
    );
    assert_eq!(mock.binds(), 0);
}

#[tokio::test]
async fn binding_failure_in_second_phase_is_reported() {
    let pools = minipools(2);
    let mock = with_pool(MockCaller::new(), &pools, &[0xc1, 0xc2]).failing_binding(pools[0]);
    let mock = Arc::new(mock);
    let collector = collector(&mock, options(8, Duration::from_secs(5)));

    let err = collector.active_by_validator_pubkey().await.unwrap_err();
    assert!(
        err.to_string()
            .starts_with("Error initialising minipool contract: invalid binding")
    );
}

#[tokio::test]
async fn count_beyond_i64_is_rejected_without_further_calls() {
    let mock = MockCaller::new().returns(POOL, "getPoolsCount", vec![], Token::Uint(U256::MAX));
    let mock = Arc::new(mock);
    let collector = collector(&mock, options(8, Duration::from_secs(5)));

    let err = collector.active_by_validator_pubkey().await.unwrap_err();
    assert!(matches!(err, CollectError::CountOverflow(value) if value == U256::MAX));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn count_above_limit_is_rejected_without_further_calls() {
    let mock = MockCaller::new().returns(POOL, "getPoolsCount", vec![], uint(1_001));
    let mock = Arc::new(mock);
    let collector = collector(&mock, options(8, Duration::from_secs(5)));

    let err = collector.active_by_validator_pubkey().await.unwrap_err();
    assert!(matches!(
        err,
        CollectError::TooManyEntities {
            count: 1_001,
            limit: 1_000
        }
    ));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn shared_pubkey_keeps_the_later_minipool() {
    let pools = minipools(2);
    let mock = Arc::new(with_pool(MockCaller::new(), &pools, &[0xdd, 0xdd]));
    let collector = collector(&mock, options(8, Duration::from_secs(5)));

    let active = collector.active_by_validator_pubkey().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[&pubkey_hex(0xdd)], pools[1]);
}

#[tokio::test]
async fn in_flight_calls_never_exceed_the_limit() {
    let pools = minipools(24);
    let mut mock = MockCaller::new().returns(POOL, "getPoolsCount", vec![], uint(24));
    for (index, minipool) in pools.iter().enumerate() {
        mock = mock
            .delayed(
                POOL,
                "getPoolAt",
                vec![uint(index as u64)],
                Duration::from_millis(15),
                Token::Address(*minipool),
            )
            .delayed(
                *minipool,
                "getDepositInput",
                vec![],
                Duration::from_millis(15),
                deposit_input(index as u8),
            );
    }
    let mock = Arc::new(mock);
    let collector = collector(&mock, options(3, Duration::from_secs(5)));

    let active = collector.active_by_validator_pubkey().await.unwrap();
    assert_eq!(active.len(), 24);
    assert!(mock.peak_in_flight() <= 3, "peak {}", mock.peak_in_flight());
    assert!(mock.peak_in_flight() >= 1);
}
