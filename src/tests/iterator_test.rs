use test_env_log::test;

use crate::poolstore::cache::CacheIterator;
use crate::tests::common;

/// Scenario: iterating [0, 9] with read_ahead 1 visits every value exactly
/// once, in ascending id order.
#[test(tokio::test)]
async fn test_iterator() {
    let server = common::memory_server(1 << 20);
    let mut cm = common::int_cache(&server, 10).await;
    for oid in 0..10 {
        cm.put(oid, oid as i32).await.unwrap();
    }

    let mut iter = CacheIterator::new(&mut cm, 1, 0, 9).unwrap();
    let mut seen = Vec::new();
    while let Some(value) = iter.next().await {
        seen.push(value.unwrap());
    }
    assert_eq!(seen, (0..10).collect::<Vec<i32>>());
}

#[test(tokio::test)]
async fn test_iterator_with_wider_read_ahead() {
    let server = common::memory_server(1 << 20);
    let mut cm = common::int_cache(&server, 10).await;
    for oid in 0..10 {
        cm.put(oid, oid as i32).await.unwrap();
    }

    let mut iter = CacheIterator::new(&mut cm, 3, 0, 9).unwrap();
    let mut seen = Vec::new();
    while let Some(value) = iter.next().await {
        seen.push(value.unwrap());
    }
    assert_eq!(seen, (0..10).collect::<Vec<i32>>());
}

#[test(tokio::test)]
async fn test_iterator_invariants() {
    let server = common::memory_server(1 << 20);
    let mut cm = common::int_cache(&server, 10).await;

    // first must not exceed last
    assert!(CacheIterator::new(&mut cm, 1, 9, 0).is_err());
    // read_ahead must fit within the range
    assert!(CacheIterator::new(&mut cm, 10, 0, 9).is_err());
    // read_ahead must be smaller than the cache capacity
    assert!(CacheIterator::new(&mut cm, 10, 0, 20).is_err());
}
