use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::join_all;

use crate::poolstore::client::{ClientFuture, StoreClient};
use crate::poolstore::common::{Error, ObjectId, Result};
use crate::poolstore::store::codec::ObjectCodec;

/// Typed view over the client engine. Stateless beyond the codec value and
/// the engine handle, so it can be cloned freely and shared across tasks.
pub struct ObjectStore<T, C: ObjectCodec<T>> {
    client: Arc<StoreClient>,
    codec: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C: ObjectCodec<T> + Clone> ObjectStore<T, C> {
    pub fn new(client: Arc<StoreClient>, codec: C) -> Self {
        ObjectStore {
            client,
            codec,
            _marker: PhantomData,
        }
    }

    pub fn client(&self) -> &Arc<StoreClient> {
        &self.client
    }

    /// Store a value under oid, resolving once the server has acknowledged it.
    pub async fn put(&self, oid: ObjectId, value: &T) -> Result<()> {
        self.put_async(oid, value)?.get().await
    }

    /// Retrieve the value stored under oid.
    pub async fn get(&self, oid: ObjectId) -> Result<T> {
        self.get_async(oid).get().await
    }

    /// Remove the value stored under oid. Returns whether anything was there.
    pub async fn remove(&self, oid: ObjectId) -> Result<bool> {
        self.client.remove_async(oid).get().await
    }

    /// Serialize on the calling task and enqueue the write.
    pub fn put_async(&self, oid: ObjectId, value: &T) -> Result<PutFuture> {
        let data = self.codec.serialize(value)?;
        Ok(PutFuture {
            inner: self.client.write_async(oid, data),
        })
    }

    /// Enqueue a read whose future deserializes on the consumer's task.
    pub fn get_async(&self, oid: ObjectId) -> GetFuture<T, C> {
        GetFuture {
            inner: self.client.read_async(oid),
            codec: self.codec.clone(),
            _marker: PhantomData,
        }
    }

    /// Fetch every id in [first, last] by issuing one read per id and waiting
    /// on all of them in parallel. A failure on any element is reported only
    /// after every operation has completed.
    pub async fn get_bulk(&self, first: ObjectId, last: ObjectId) -> Result<Vec<T>> {
        if first > last {
            return Err(Error::bounds(format!("invalid id range [{}, {}]", first, last)));
        }
        let futures: Vec<GetFuture<T, C>> = (first..=last).map(|oid| self.get_async(oid)).collect();
        let results = join_all(futures.iter().map(|f| f.get())).await;
        let mut values = Vec::with_capacity(results.len());
        let mut failure = None;
        for result in results {
            match result {
                Ok(value) => values.push(value),
                Err(e) => failure = failure.or(Some(e)),
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(values),
        }
    }

    /// Store values under [first, last] in parallel, one write per id.
    pub async fn put_bulk(&self, first: ObjectId, last: ObjectId, values: &[T]) -> Result<()> {
        if first > last || values.len() as u64 != last - first + 1 {
            return Err(Error::bounds(format!(
                "{} values do not cover the id range [{}, {}]",
                values.len(),
                first,
                last
            )));
        }
        let mut futures = Vec::with_capacity(values.len());
        for (i, value) in values.iter().enumerate() {
            futures.push(self.put_async(first + i as ObjectId, value)?);
        }
        let results = join_all(futures.iter().map(|f| f.get())).await;
        let mut failure = None;
        for result in results {
            if let Err(e) = result {
                failure = failure.or(Some(e));
            }
        }
        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<T, C: ObjectCodec<T> + Clone> Clone for ObjectStore<T, C> {
    fn clone(&self) -> Self {
        ObjectStore {
            client: self.client.clone(),
            codec: self.codec.clone(),
            _marker: PhantomData,
        }
    }
}

/// Pending write. get() resolves to () or the error the server reported.
pub struct PutFuture {
    inner: ClientFuture,
}

impl PutFuture {
    pub async fn wait(&self) {
        self.inner.wait().await
    }

    pub fn try_wait(&self) -> bool {
        self.inner.try_wait()
    }

    pub async fn get(&self) -> Result<()> {
        if self.inner.get().await? {
            Ok(())
        } else {
            // The server rejects writes only for capacity
            Err(Error::capacity_exceeded())
        }
    }
}

/// Pending read. get() deserializes the payload on the calling task.
pub struct GetFuture<T, C> {
    inner: ClientFuture,
    codec: C,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C: ObjectCodec<T>> GetFuture<T, C> {
    pub async fn wait(&self) {
        self.inner.wait().await
    }

    pub fn try_wait(&self) -> bool {
        self.inner.try_wait()
    }

    pub async fn get(&self) -> Result<T> {
        let data = self.inner.data().await?;
        self.codec.deserialize(&data)
    }
}
