use std::sync::Arc;

use rand::Rng;
use test_env_log::test;

use crate::poolstore::client::StoreClient;
use crate::poolstore::store::{BincodeCodec, ObjectStore};
use crate::tests::common;

/// Scenario: twenty clients each write and read back their own id range
/// concurrently; nobody observes anyone else's data.
#[test(tokio::test)]
#[serial_test::serial]
async fn test_many_clients() {
    const CLIENTS: u64 = 20;
    const IDS_PER_CLIENT: u64 = 10;

    let server = common::memory_server(1 << 20);
    let port = server.port;

    let mut tasks = Vec::new();
    for client_id in 0..CLIENTS {
        tasks.push(tokio::spawn(async move {
            let client = Arc::new(
                StoreClient::connect("127.0.0.1", port, 1)
                    .await
                    .expect("couldn't connect"),
            );
            let store: ObjectStore<u64, BincodeCodec<u64>> =
                ObjectStore::new(client, BincodeCodec::new());

            let base = client_id * IDS_PER_CLIENT;
            // ThreadRng is not Send, keep it out of the awaits below
            let values: Vec<u64> = {
                let mut rng = rand::thread_rng();
                (0..IDS_PER_CLIENT).map(|_| rng.gen()).collect()
            };
            for (i, value) in values.iter().enumerate() {
                store.put(base + i as u64, value).await.unwrap();
            }
            for (i, value) in values.iter().enumerate() {
                assert_eq!(store.get(base + i as u64).await.unwrap(), *value);
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
}

/// An engine spread over several sockets still resolves every future with
/// the right reply, even though completions may arrive out of order.
#[test(tokio::test)]
async fn test_multi_socket_client() {
    let server = common::memory_server(1 << 20);
    let client = StoreClient::connect("127.0.0.1", server.port, 4)
        .await
        .expect("couldn't connect");

    let writes: Vec<_> = (0..40u64)
        .map(|oid| client.write_async(oid, bytes::Bytes::from(oid.to_be_bytes().to_vec())))
        .collect();
    for write in &writes {
        assert!(write.get().await.unwrap());
    }
    for oid in 0..40u64 {
        assert_eq!(&client.read(oid).await.unwrap()[..], &oid.to_be_bytes());
    }
}

/// Many tasks sharing one engine: each future resolves with its own reply.
#[test(tokio::test)]
async fn test_concurrent_ops_on_one_engine() {
    let server = common::memory_server(1 << 20);
    let client = common::client(&server).await;
    let store: ObjectStore<u64, BincodeCodec<u64>> =
        ObjectStore::new(client, BincodeCodec::new());
    let store = Arc::new(store);

    let mut tasks = Vec::new();
    for oid in 0..50u64 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            store.put(oid, &(oid * 3)).await.unwrap();
            assert_eq!(store.get(oid).await.unwrap(), oid * 3);
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
}
