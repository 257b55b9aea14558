mod auth;
mod backend;
mod listener;
mod stats;
mod store_server;

pub use self::auth::{AllowAllAuthenticator, Authenticator};
pub use self::backend::{build_backend, DiskBackend, MemoryBackend, StorageBackend};
pub use self::listener::Listener;
pub use self::stats::ServerStats;
pub use self::store_server::StoreServer;
