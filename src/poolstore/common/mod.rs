mod errors;

pub use self::errors::{Error, ErrorKind, Result};

/// Application-chosen 64-bit key for a stored blob.
pub type ObjectId = u64;

/// Client-local monotonic identifier correlating a request with its reply.
pub type TxnId = u64;
