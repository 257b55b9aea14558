use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::poolstore::cache::{CacheManager, LRAddedEvictionPolicy};
use crate::poolstore::client::StoreClient;
use crate::poolstore::config::Settings;
use crate::poolstore::server::{ServerStats, StoreServer};
use crate::poolstore::store::{BincodeCodec, ObjectStore};

/// A store server running in-process on an ephemeral port.
pub struct TestServer {
    pub port: u16,
    pub stats: Arc<ServerStats>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub fn test_settings() -> Settings {
    let mut conf = Settings::default();
    conf.host = "127.0.0.1".to_string();
    conf.port = 0; // bind an ephemeral port
    conf
}

pub fn start_server(conf: &Settings) -> TestServer {
    let server = StoreServer::new(conf).expect("couldn't start test server");
    let port = server
        .local_addr()
        .expect("couldn't read listen address")
        .port();
    let stats = server.stats();
    let task = tokio::spawn(server.run());
    TestServer { port, stats, task }
}

pub fn memory_server(pool_size: u64) -> TestServer {
    let mut conf = test_settings();
    conf.pool_size = pool_size;
    start_server(&conf)
}

pub async fn client(server: &TestServer) -> Arc<StoreClient> {
    Arc::new(
        StoreClient::connect("127.0.0.1", server.port, 1)
            .await
            .expect("couldn't connect to test server"),
    )
}

pub async fn int_store(server: &TestServer) -> ObjectStore<i32, BincodeCodec<i32>> {
    ObjectStore::new(client(server).await, BincodeCodec::new())
}

pub async fn int_cache(
    server: &TestServer,
    capacity: usize,
) -> CacheManager<i32, BincodeCodec<i32>> {
    CacheManager::new(
        int_store(server).await,
        Box::new(LRAddedEvictionPolicy::new(capacity)),
        capacity,
    )
    .expect("couldn't build cache manager")
}
