mod store_client;
mod transaction;

pub use self::store_client::StoreClient;
pub use self::transaction::ClientFuture;
