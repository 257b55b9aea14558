use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use test_env_log::test;

use crate::poolstore::server::StoreServer;
use crate::poolstore::Error;
use crate::tests::common;

#[test(tokio::test)]
async fn test_round_trip() {
    let server = common::memory_server(1 << 20);
    let store = common::int_store(&server).await;

    store.put(7, &1234).await.unwrap();
    assert_eq!(store.get(7).await.unwrap(), 1234);

    // Another client connected to the same server sees the value
    let other = common::int_store(&server).await;
    assert_eq!(other.get(7).await.unwrap(), 1234);
}

#[test(tokio::test)]
async fn test_overwrite() {
    let server = common::memory_server(1 << 20);
    let store = common::int_store(&server).await;

    store.put(1, &10).await.unwrap();
    let used_after_first = server.stats.bytes_used();
    store.put(1, &20).await.unwrap();
    assert_eq!(store.get(1).await.unwrap(), 20);
    // Overwriting is charged only for the size delta
    assert_eq!(server.stats.bytes_used(), used_after_first);
}

#[test(tokio::test)]
async fn test_remove() {
    let server = common::memory_server(1 << 20);
    let store = common::int_store(&server).await;

    store.put(3, &33).await.unwrap();
    assert!(store.remove(3).await.unwrap());
    assert_eq!(store.get(3).await.unwrap_err(), Error::no_such_id(3));
    // Removing again reports that nothing was there
    assert!(!store.remove(3).await.unwrap());
}

#[test(tokio::test)]
async fn test_get_nonexistent() {
    let server = common::memory_server(1 << 20);
    let store = common::int_store(&server).await;
    assert_eq!(store.get(1492).await.unwrap_err(), Error::no_such_id(1492));
}

/// Scenario: a 128 byte pool rejects the second of two 100 byte blobs and is
/// left exactly as it was before the rejected write.
#[test(tokio::test)]
async fn test_pool_exhaustion() {
    let server = common::memory_server(128);
    let client = common::client(&server).await;

    let blob = Bytes::from(vec![7u8; 100]);
    assert!(client.write(1, blob.clone()).await.unwrap());
    assert_eq!(
        client.write(2, blob.clone()).await.unwrap_err(),
        Error::capacity_exceeded()
    );
    assert_eq!(&client.read(1).await.unwrap()[..], &blob[..]);
    assert_eq!(client.read(2).await.unwrap_err(), Error::no_such_id(2));
    assert_eq!(server.stats.bytes_used(), 100);
}

#[test(tokio::test)]
async fn test_future_get_is_idempotent() {
    let server = common::memory_server(1 << 20);
    let client = common::client(&server).await;

    let write = client.write_async(5, Bytes::from_static(b"abc"));
    assert!(write.get().await.unwrap());
    assert!(write.get().await.unwrap());

    let read = client.read_async(6);
    let first = read.data().await.unwrap_err();
    let second = read.data().await.unwrap_err();
    assert_eq!(first, second);
    assert_eq!(first, Error::no_such_id(6));
}

#[test(tokio::test)]
async fn test_try_wait() {
    let server = common::memory_server(1 << 20);
    let client = common::client(&server).await;

    let future = client.write_async(1, Bytes::from_static(b"xyz"));
    // The reply arrives without us awaiting the future
    for _ in 0..100 {
        if future.try_wait() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(future.try_wait());
    assert!(future.get().await.unwrap());
}

/// With a single connection the server processes requests in enqueue order,
/// so the last of a burst of writes to one id wins.
#[test(tokio::test)]
async fn test_ordering_within_one_socket() {
    let server = common::memory_server(1 << 20);
    let client = common::client(&server).await;

    let futures: Vec<_> = (0..32u8)
        .map(|i| client.write_async(9, Bytes::from(vec![i])))
        .collect();
    for future in &futures {
        assert!(future.get().await.unwrap());
    }
    assert_eq!(&client.read(9).await.unwrap()[..], &[31u8]);
}

#[test(tokio::test)]
async fn test_shutdown_resolves_new_operations() {
    let server = common::memory_server(1 << 20);
    let client = common::client(&server).await;

    client.shutdown();
    let future = client.write_async(1, Bytes::from_static(b"zzz"));
    assert_eq!(future.get().await.unwrap_err(), Error::connection_failed());
}

/// A frame with an impossible length prefix is a protocol error and the
/// server abandons that connection without replying.
#[test(tokio::test)]
async fn test_malformed_frame_closes_connection() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let server = common::memory_server(1 << 20);
    let mut sock = tokio::net::TcpStream::connect(("127.0.0.1", server.port))
        .await
        .unwrap();

    // Claim a payload far beyond the configured maximum
    sock.write_all(&u32::MAX.to_be_bytes()).await.unwrap();
    let mut buf = [0u8; 16];
    let n = sock.read(&mut buf).await.unwrap();
    assert_eq!(n, 0, "server should close the connection, not reply");

    // The server is still healthy for well-behaved clients
    let client = common::client(&server).await;
    assert!(client.write(1, Bytes::from_static(b"ok")).await.unwrap());
}

/// Connections beyond max_clients are closed at accept time.
#[test(tokio::test)]
async fn test_max_clients_rejects_excess_connections() {
    let mut conf = common::test_settings();
    conf.max_clients = 1;
    let server = common::start_server(&conf);

    let first = common::client(&server).await;
    assert!(first.write(1, Bytes::from_static(b"one")).await.unwrap());

    let second = common::client(&server).await;
    assert_eq!(
        second.read(1).await.unwrap_err(),
        Error::connection_failed()
    );

    // Room opens up again once the first client goes away
    first.shutdown();
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let retry = common::client(&server).await;
        if retry.read(1).await.is_ok() {
            return;
        }
    }
    panic!("server never freed the client slot");
}

/// The authenticator is consulted before any frame is read; a denied
/// connection is simply closed and every operation on it fails.
#[test(tokio::test)]
async fn test_authenticator_denies_connection() {
    struct DenyAll;
    impl crate::poolstore::server::Authenticator for DenyAll {
        fn admit(&self, _remote_addr: std::net::SocketAddr) -> bool {
            false
        }
    }

    let conf = common::test_settings();
    let server = StoreServer::new(&conf)
        .unwrap()
        .with_authenticator(Arc::new(DenyAll));
    let port = server.local_addr().unwrap().port();
    let task = tokio::spawn(server.run());

    let client = crate::poolstore::client::StoreClient::connect("127.0.0.1", port, 1)
        .await
        .unwrap();
    assert_eq!(
        client.read(1).await.unwrap_err(),
        Error::connection_failed()
    );
    task.abort();
}
