use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tokio::sync::Notify;

use crate::poolstore::common::{Error, ObjectId, Result};
use crate::poolstore::protocol::{ErrorCode, Reply};

/// Completion slots for one in-flight request. Shared between the enqueuing
/// task (through a ClientFuture) and the receiver task; whichever side drops
/// its Arc last releases the record.
pub(crate) struct Transaction {
    state: Mutex<TransactionState>,
    done: Notify,
}

struct TransactionState {
    /// The oid the request addressed, reported back in NoSuchId errors
    oid: ObjectId,
    ready: bool,
    success: bool,
    error: ErrorCode,
    data: Bytes,
    bulk: Vec<Bytes>,
}

impl Transaction {
    pub(crate) fn new(oid: ObjectId) -> Self {
        Transaction {
            state: Mutex::new(TransactionState {
                oid,
                ready: false,
                success: false,
                error: ErrorCode::Ok,
                data: Bytes::new(),
                bulk: Vec::new(),
            }),
            done: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<TransactionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_ready(&self) -> bool {
        self.lock().ready
    }

    /// Record the server's reply and wake every waiter. A transaction
    /// completes at most once; later calls are ignored.
    pub(crate) fn complete(&self, error: ErrorCode, reply: Reply) {
        {
            let mut state = self.lock();
            if state.ready {
                return;
            }
            state.error = error;
            match reply {
                Reply::WriteAck { success, .. } => state.success = success,
                Reply::RemoveAck { success, .. } => state.success = success,
                Reply::WriteBulkAck { success } => state.success = success,
                Reply::ReadAck { success, data, .. } => {
                    state.success = success;
                    state.data = data;
                }
                Reply::ReadBulkAck { success, data } => {
                    state.success = success;
                    state.bulk = data;
                }
            }
            state.ready = true;
        }
        self.done.notify_waiters();
    }

    /// Resolve the transaction with an error instead of a reply.
    pub(crate) fn fail(&self, error: ErrorCode) {
        {
            let mut state = self.lock();
            if state.ready {
                return;
            }
            state.error = error;
            state.success = false;
            state.ready = true;
        }
        self.done.notify_waiters();
    }
}

/// Handle to a pending operation. Results are held in the shared transaction
/// record, so get() may be called any number of times and reports the same
/// outcome each time.
pub struct ClientFuture {
    txn: Arc<Transaction>,
}

impl ClientFuture {
    pub(crate) fn new(txn: Arc<Transaction>) -> Self {
        ClientFuture { txn }
    }

    /// Resolves once the reply (or a failure) has been recorded.
    pub async fn wait(&self) {
        loop {
            // Register interest before re-checking the flag so a completion
            // between the check and the await cannot be missed.
            let notified = self.txn.done.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.txn.is_ready() {
                return;
            }
            notified.await;
        }
    }

    /// Non-blocking readiness probe.
    pub fn try_wait(&self) -> bool {
        self.txn.is_ready()
    }

    /// Wait for the reply and return its success flag, or the typed error the
    /// server (or the connection) reported.
    pub async fn get(&self) -> Result<bool> {
        self.wait().await;
        let state = self.txn.lock();
        state.error.check(state.oid)?;
        Ok(state.success)
    }

    /// Wait for a read reply and return the retrieved bytes.
    pub async fn data(&self) -> Result<Bytes> {
        self.wait().await;
        let state = self.txn.lock();
        state.error.check(state.oid)?;
        if !state.success {
            return Err(Error::no_such_id(state.oid));
        }
        Ok(state.data.clone())
    }

    /// Wait for a bulk read reply and return the blobs in request order.
    pub async fn bulk_data(&self) -> Result<Vec<Bytes>> {
        self.wait().await;
        let state = self.txn.lock();
        state.error.check(state.oid)?;
        if !state.success {
            return Err(Error::no_such_id(state.oid));
        }
        Ok(state.bulk.clone())
    }
}
