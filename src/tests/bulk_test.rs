use bytes::Bytes;
use test_env_log::test;

use crate::poolstore::Error;
use crate::tests::common;

#[test(tokio::test)]
async fn test_write_and_read_bulk() {
    let server = common::memory_server(1 << 20);
    let client = common::client(&server).await;

    let oids = vec![10, 11, 12];
    let blobs = vec![
        Bytes::from_static(b"alpha"),
        Bytes::from_static(b"beta"),
        Bytes::from_static(b"gamma"),
    ];
    assert!(client
        .write_bulk_async(oids.clone(), blobs.clone())
        .get()
        .await
        .unwrap());

    let read = client.read_bulk_async(oids).bulk_data().await.unwrap();
    assert_eq!(read, blobs);
}

/// Bulk reads are all-or-nothing: one absent id fails the whole request and
/// no partial payload comes back.
#[test(tokio::test)]
async fn test_read_bulk_missing_id() {
    let server = common::memory_server(1 << 20);
    let client = common::client(&server).await;

    assert!(client.write(1, Bytes::from_static(b"here")).await.unwrap());
    let err = client
        .read_bulk_async(vec![1, 2])
        .bulk_data()
        .await
        .unwrap_err();
    assert_eq!(err, Error::no_such_id(0));
}

/// Bulk writes stop at the first blob that does not fit; earlier blobs stand.
#[test(tokio::test)]
async fn test_write_bulk_stops_at_capacity() {
    let server = common::memory_server(128);
    let client = common::client(&server).await;

    let blob = Bytes::from(vec![1u8; 60]);
    let err = client
        .write_bulk_async(vec![1, 2, 3], vec![blob.clone(), blob.clone(), blob.clone()])
        .get()
        .await
        .unwrap_err();
    assert_eq!(err, Error::capacity_exceeded());

    // The first two fit and were kept, the third was never written
    assert_eq!(client.read(1).await.unwrap().len(), 60);
    assert_eq!(client.read(2).await.unwrap().len(), 60);
    assert_eq!(client.read(3).await.unwrap_err(), Error::no_such_id(3));
    assert_eq!(server.stats.bytes_used(), 120);
}

#[test(tokio::test)]
async fn test_facade_bulk() {
    let server = common::memory_server(1 << 20);
    let store = common::int_store(&server).await;

    let values: Vec<i32> = (0..8).map(|i| i * 100).collect();
    store.put_bulk(20, 27, &values).await.unwrap();
    assert_eq!(store.get_bulk(20, 27).await.unwrap(), values);

    // One id of the range missing fails the whole bulk get
    assert_eq!(
        store.get_bulk(20, 28).await.unwrap_err(),
        Error::no_such_id(28)
    );
}
