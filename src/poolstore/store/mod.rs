mod codec;
mod object_store;

pub use self::codec::{BincodeCodec, ObjectCodec};
pub use self::object_store::{GetFuture, ObjectStore, PutFuture};
