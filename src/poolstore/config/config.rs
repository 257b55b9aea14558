use std::path::PathBuf;

use serde::Deserialize;

use crate::poolstore::common::{Error, Result};
use crate::poolstore::config::enums::BackendKind;

#[derive(Deserialize, Clone)]
pub struct Settings {
    /// config_path is the path of the loaded config file
    #[serde(skip)]
    pub config_path: PathBuf,
    /// host to listen on, defaults to 0.0.0.0
    #[serde(default = "default_host")]
    pub host: String,
    /// port the server listens on for client connections
    #[serde(default = "default_port")]
    pub port: u16,
    /// pool_size is the byte budget for all stored blobs combined.
    /// A put that would push the total over this limit is rejected.
    #[serde(default = "default_pool_size")]
    pub pool_size: u64,
    /// backend selects where blobs live: memory or disk
    #[serde(default)]
    pub backend: BackendKind,
    /// storage_path is the directory used by the disk backend
    #[serde(default = "default_storage_path")]
    pub storage_path: String,
    /// max_clients to allow before rejecting new connections
    #[serde(default = "default_max_clients")]
    pub max_clients: u32,
    /// max_payload is the largest frame payload accepted on the wire
    #[serde(default = "default_max_payload")]
    pub max_payload: u32,
    /// num_workers for the tokio runtime, 0 means one per CPU
    #[serde(default)]
    pub num_workers: u32,
    /// reuseport enables SO_REUSEPORT on the listening socket
    #[serde(default)]
    pub reuseport: bool,
}

fn default_host() -> String { "0.0.0.0".to_string() }
const fn default_port() -> u16 { 12345 }
const fn default_pool_size() -> u64 { 1024 * 1024 * 1024 }
fn default_storage_path() -> String { "poolstore-data".to_string() }
const fn default_max_clients() -> u32 { 1024 }
const fn default_max_payload() -> u32 { crate::poolstore::protocol::DEFAULT_MAX_PAYLOAD }

impl Settings {
    pub(crate) fn load(&mut self, path: PathBuf) -> Result<()> {
        self.config_path = path;
        if self.pool_size == 0 {
            return Err(Error::new("pool_size cannot be 0"));
        }
        if self.max_payload < 4096 {
            self.max_payload = default_max_payload();
        }
        if self.num_workers == 0 {
            self.num_workers = num_cpus::get() as u32;
        }
        if self.backend == BackendKind::Disk && self.storage_path.is_empty() {
            return Err(Error::new("storage_path is required for the disk backend"));
        }
        Ok(())
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        let mut settings = Settings {
            config_path: PathBuf::new(),
            host: default_host(),
            port: default_port(),
            pool_size: default_pool_size(),
            backend: BackendKind::default(),
            storage_path: default_storage_path(),
            max_clients: default_max_clients(),
            max_payload: default_max_payload(),
            num_workers: 0,
            reuseport: false,
        };
        settings.load(PathBuf::new()).expect("default settings are valid");
        settings
    }
}
