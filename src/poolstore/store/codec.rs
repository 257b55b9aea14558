use std::marker::PhantomData;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::poolstore::common::Result;

/// Serializer/deserializer pair the typed store consumes. The serializer
/// owns the bytes it returns; the store moves them onto the wire.
pub trait ObjectCodec<T>: Send + Sync {
    fn serialize(&self, value: &T) -> Result<Bytes>;
    fn deserialize(&self, data: &[u8]) -> Result<T>;
}

/// Default codec for any serde type, backed by bincode.
pub struct BincodeCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> BincodeCodec<T> {
    pub fn new() -> Self {
        BincodeCodec {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for BincodeCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for BincodeCodec<T> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<T: Serialize + DeserializeOwned> ObjectCodec<T> for BincodeCodec<T> {
    fn serialize(&self, value: &T) -> Result<Bytes> {
        Ok(Bytes::from(bincode::serialize(value)?))
    }

    fn deserialize(&self, data: &[u8]) -> Result<T> {
        Ok(bincode::deserialize(data)?)
    }
}
