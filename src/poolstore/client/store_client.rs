use std::sync::atomic::{AtomicBool, AtomicU64, Ordering::{AcqRel, Acquire, Relaxed}};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use fnv::FnvHashMap;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::poolstore::client::transaction::{ClientFuture, Transaction};
use crate::poolstore::common::{Error, ObjectId, Result, TxnId};
use crate::poolstore::protocol::{ErrorCode, FrameStream, Message, Reply, Request, DEFAULT_MAX_PAYLOAD};

/// The asynchronous client engine. One sender task drains a FIFO send queue
/// over a round-robin pool of sockets; one receiver task per socket
/// demultiplexes replies into the pending transaction map. Any number of
/// user tasks may issue operations concurrently; each gets its own future.
///
/// Completions are not ordered across sockets. With a single connection the
/// server processes requests in enqueue order; callers that need ordering
/// over multiple connections must await one future before enqueuing the next.
pub struct StoreClient {
    shared: Arc<Shared>,
    tasks: Vec<JoinHandle<()>>,
}

struct Shared {
    /// Pending transactions keyed by txn id, owned here until the reply lands
    txns: Mutex<FnvHashMap<TxnId, Arc<Transaction>>>,
    next_txn_id: AtomicU64,
    send_queue: mpsc::UnboundedSender<Message>,
    terminated: AtomicBool,
    shutdown: Notify,
}

impl Shared {
    /// Tear the engine down once: stop both task kinds and resolve every
    /// outstanding future with the given error.
    fn terminate(&self, error: ErrorCode) {
        if self.terminated.swap(true, AcqRel) {
            return;
        }
        self.shutdown.notify_waiters();
        self.fail_all(error);
    }

    fn fail_all(&self, error: ErrorCode) {
        let pending: Vec<Arc<Transaction>> = {
            let mut txns = self.txns.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            txns.drain().map(|(_, txn)| txn).collect()
        };
        for txn in pending {
            txn.fail(error);
        }
    }
}

impl StoreClient {
    /// Open `connections` sockets to the server and start the worker tasks.
    pub async fn connect(host: &str, port: u16, connections: usize) -> Result<StoreClient> {
        let connections = connections.max(1);
        let mut readers = Vec::with_capacity(connections);
        let mut writers = Vec::with_capacity(connections);
        for _ in 0..connections {
            let sock = TcpStream::connect((host, port))
                .await
                .map_err(|e| {
                    error!(%e, host, port, "could not connect to server");
                    Error::connection_failed()
                })?;
            sock.set_nodelay(true)?;
            let (read, write) = sock.into_split();
            readers.push(read);
            writers.push(write);
        }
        debug!(host, port, connections, "client connected");

        let (send_queue, send_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            txns: Mutex::new(FnvHashMap::default()),
            next_txn_id: AtomicU64::new(0),
            send_queue,
            terminated: AtomicBool::new(false),
            shutdown: Notify::new(),
        });

        let mut tasks = Vec::with_capacity(connections + 1);
        tasks.push(tokio::spawn(sender_loop(shared.clone(), send_rx, writers)));
        for read in readers {
            let frames = FrameStream::new(read, DEFAULT_MAX_PAYLOAD);
            tasks.push(tokio::spawn(receiver_loop(shared.clone(), frames)));
        }

        Ok(StoreClient { shared, tasks })
    }

    pub fn write_async(&self, oid: ObjectId, data: Bytes) -> ClientFuture {
        self.enqueue(oid, Request::Write { oid, data })
    }

    pub fn read_async(&self, oid: ObjectId) -> ClientFuture {
        self.enqueue(oid, Request::Read { oid })
    }

    pub fn remove_async(&self, oid: ObjectId) -> ClientFuture {
        self.enqueue(oid, Request::Remove { oid })
    }

    /// Store several blobs in one round trip. Blobs apply in order on the
    /// server; the first one that does not fit fails the request and leaves
    /// the earlier ones in place.
    pub fn write_bulk_async(&self, oids: Vec<ObjectId>, data: Vec<Bytes>) -> ClientFuture {
        self.enqueue(0, Request::WriteBulk { oids, data })
    }

    /// Fetch several blobs in one round trip, all of them or none.
    pub fn read_bulk_async(&self, oids: Vec<ObjectId>) -> ClientFuture {
        self.enqueue(0, Request::ReadBulk { oids })
    }

    pub async fn write(&self, oid: ObjectId, data: Bytes) -> Result<bool> {
        self.write_async(oid, data).get().await
    }

    pub async fn read(&self, oid: ObjectId) -> Result<Bytes> {
        self.read_async(oid).data().await
    }

    pub async fn remove(&self, oid: ObjectId) -> Result<bool> {
        self.remove_async(oid).get().await
    }

    /// Allocate a txn id, register the pending transaction, and hand the
    /// encoded frame to the sender. Never blocks the caller.
    fn enqueue(&self, oid: ObjectId, req: Request) -> ClientFuture {
        let txn_id = self.shared.next_txn_id.fetch_add(1, Relaxed);
        let txn = Arc::new(Transaction::new(oid));
        {
            let mut txns = self
                .shared
                .txns
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            txns.insert(txn_id, txn.clone());
        }
        let msg = req.encode(txn_id);
        if self.shared.terminated.load(Acquire) || self.shared.send_queue.send(msg).is_err() {
            let mut txns = self
                .shared
                .txns
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            txns.remove(&txn_id);
            txn.fail(ErrorCode::ConnectionFailed);
        }
        ClientFuture::new(txn)
    }

    /// Stop both worker task kinds and resolve all outstanding futures with a
    /// connection-closed error. Called automatically on drop.
    pub fn shutdown(&self) {
        self.shared.terminate(ErrorCode::ConnectionFailed);
        for task in &self.tasks {
            task.abort();
        }
    }
}

impl Drop for StoreClient {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn sender_loop(
    shared: Arc<Shared>,
    mut send_rx: mpsc::UnboundedReceiver<Message>,
    mut writers: Vec<OwnedWriteHalf>,
) {
    let mut socket_index = 0;
    loop {
        tokio::select! {
            _ = shared.shutdown.notified() => return,
            maybe_msg = send_rx.recv() => {
                let msg = match maybe_msg {
                    Some(msg) => msg,
                    None => return,
                };
                // Select the socket this request will be sent on
                let writers_len = writers.len();
                let writer = &mut writers[socket_index];
                socket_index = (socket_index + 1) % writers_len;
                if let Err(e) = writer.write_all(msg.as_slice()).await {
                    if !shared.terminated.load(Acquire) {
                        error!(%e, "error sending to server");
                        shared.terminate(ErrorCode::ConnectionFailed);
                    }
                    return;
                }
            }
        }
    }
}

async fn receiver_loop(shared: Arc<Shared>, mut frames: FrameStream) {
    loop {
        tokio::select! {
            _ = shared.shutdown.notified() => return,
            next = frames.next() => match next {
                Ok(Some(msg)) => {
                    if let Err(e) = process_reply(&shared, msg) {
                        error!(%e, "protocol error, closing connection");
                        shared.terminate(ErrorCode::ConnectionFailed);
                        return;
                    }
                }
                Ok(None) => {
                    if !shared.terminated.load(Acquire) {
                        debug!("connection was closed by server");
                        shared.terminate(ErrorCode::ConnectionFailed);
                    }
                    return;
                }
                Err(e) => {
                    if !shared.terminated.load(Acquire) {
                        error!(%e, "error receiving from server");
                        shared.terminate(ErrorCode::ConnectionFailed);
                    }
                    return;
                }
            }
        }
    }
}

/// Match a reply to its pending transaction and record the outcome.
fn process_reply(shared: &Shared, msg: Message) -> Result<()> {
    let txn_id = msg.txn_id();
    let (error, reply) = Reply::decode(&msg)?;
    let txn = {
        let mut txns = shared
            .txns
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        txns.remove(&txn_id)
    }
    .ok_or_else(|| Error::protocol_error(format!("received unknown txn_id {}", txn_id)))?;
    txn.complete(error, reply);
    Ok(())
}
