use std::sync::atomic::{AtomicU32, Ordering::Relaxed};
use std::sync::Arc;

use bytes::Bytes;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::poolstore::common::{Error, ObjectId, Result};
use crate::poolstore::config::Settings;
use crate::poolstore::protocol::{ErrorCode, FrameStream, Message, Reply, Request};
use crate::poolstore::server::backend::{build_backend, StorageBackend};
use crate::poolstore::server::{AllowAllAuthenticator, Authenticator, Listener, ServerStats};

/// How many requests may sit between the connection tasks and the dispatch
/// loop before readers are back-pressured.
const DISPATCH_QUEUE_DEPTH: usize = 256;

/// A single-port blob server. Connection tasks read frames concurrently but
/// every decoded request funnels through one dispatch loop that owns the
/// backend, so request handling is strictly serial per server instance and
/// the backend needs no locking. Deployments that want more throughput run
/// several servers on distinct ports.
pub struct StoreServer {
    listener: Listener,
    backend: Box<dyn StorageBackend>,
    pool_size: u64,
    max_clients: u32,
    max_payload: u32,
    auth: Arc<dyn Authenticator>,
    stats: Arc<ServerStats>,
}

struct Dispatch {
    msg: Message,
    reply: oneshot::Sender<Message>,
}

impl StoreServer {
    pub fn new(conf: &Settings) -> Result<Self> {
        let mut backend = build_backend(conf);
        backend.init()?;
        let listener = Listener::new(conf.listen_address(), conf.reuseport)?;
        Ok(StoreServer {
            listener,
            backend,
            pool_size: conf.pool_size,
            max_clients: conf.max_clients,
            max_payload: conf.max_payload,
            auth: Arc::new(AllowAllAuthenticator),
            stats: Arc::new(ServerStats::new()),
        })
    }

    pub fn with_authenticator(mut self, auth: Arc<dyn Authenticator>) -> Self {
        self.auth = auth;
        self
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    pub fn stats(&self) -> Arc<ServerStats> {
        self.stats.clone()
    }

    pub async fn run(self) {
        info!(server = %self.listener.address.as_str(), pool_size = self.pool_size, "server running");

        let (dispatch_tx, dispatch_rx) = mpsc::channel(DISPATCH_QUEUE_DEPTH);
        let dispatcher = DispatchLoop {
            backend: self.backend,
            pool_size: self.pool_size,
            used: 0,
            stats: self.stats.clone(),
        };
        tokio::spawn(dispatcher.run(dispatch_rx));

        let active = Arc::new(AtomicU32::new(0));
        while let Some(sock) = self.listener.accept().await {
            let remote_addr = match sock.peer_addr() {
                Ok(addr) => addr,
                Err(e) => {
                    error!(%e, "could not read peer address");
                    continue;
                }
            };
            // If at capacity, reject the connection by dropping the socket
            if active.load(Relaxed) >= self.max_clients {
                warn!(%remote_addr, max_clients = self.max_clients, "too many clients, closing connection");
                continue;
            }
            if !self.auth.admit(remote_addr) {
                debug!(%remote_addr, "connection refused by authenticator");
                continue;
            }
            if let Err(e) = sock.set_nodelay(true) {
                error!(%e, "could not set TCP_NODELAY");
                continue;
            }

            active.fetch_add(1, Relaxed);
            let dispatch_tx = dispatch_tx.clone();
            let active = active.clone();
            let max_payload = self.max_payload;
            tokio::spawn(async move {
                if let Err(e) = serve_connection(sock, dispatch_tx, max_payload).await {
                    debug!(%e, %remote_addr, "connection closed");
                }
                active.fetch_sub(1, Relaxed);
            });
        }
    }
}

/// Shuttle frames between one client socket and the dispatch loop. Requests
/// on the same socket are handled strictly in arrival order and their replies
/// are never interleaved.
async fn serve_connection(
    sock: TcpStream,
    dispatch: mpsc::Sender<Dispatch>,
    max_payload: u32,
) -> Result<()> {
    let (read, mut write) = sock.into_split();
    let mut frames = FrameStream::new(read, max_payload);
    while let Some(msg) = frames.next().await? {
        let (reply_tx, reply_rx) = oneshot::channel();
        if dispatch
            .send(Dispatch {
                msg,
                reply: reply_tx,
            })
            .await
            .is_err()
        {
            return Err(Error::closed());
        }
        // The dispatch loop drops the reply sender for requests it cannot
        // decode, which abandons this connection.
        let reply = reply_rx
            .await
            .map_err(|_| Error::protocol_error("request abandoned by the server"))?;
        write.write_all(reply.as_slice()).await?;
    }
    Ok(())
}

struct DispatchLoop {
    backend: Box<dyn StorageBackend>,
    pool_size: u64,
    /// Sum of stored blob sizes. Blobs already on disk when a disk backend
    /// restarts are served but not counted, as in the original deployment.
    used: u64,
    stats: Arc<ServerStats>,
}

impl DispatchLoop {
    async fn run(mut self, mut rx: mpsc::Receiver<Dispatch>) {
        while let Some(dispatch) = rx.recv().await {
            let txn_id = dispatch.msg.txn_id();
            match Request::decode(&dispatch.msg) {
                Ok(req) => {
                    let (code, reply) = self.handle(req);
                    self.stats.bytes_used.store(self.used, Relaxed);
                    // The connection may have gone away while we worked
                    let _ = dispatch.reply.send(reply.encode(txn_id, code));
                }
                Err(e) => {
                    error!(%e, txn_id, "could not decode request");
                }
            }
        }
    }

    fn handle(&mut self, req: Request) -> (ErrorCode, Reply) {
        match req {
            Request::Write { oid, data } => {
                self.stats.writes.fetch_add(1, Relaxed);
                debug!(oid, size = data.len(), "write");
                if self.write_one(oid, &data) {
                    (ErrorCode::Ok, Reply::WriteAck { oid, success: true })
                } else {
                    (
                        ErrorCode::CapacityExceeded,
                        Reply::WriteAck {
                            oid,
                            success: false,
                        },
                    )
                }
            }
            Request::Read { oid } => {
                self.stats.reads.fetch_add(1, Relaxed);
                debug!(oid, "read");
                match self.read_one(oid) {
                    Some(data) => (
                        ErrorCode::Ok,
                        Reply::ReadAck {
                            oid,
                            success: true,
                            data,
                        },
                    ),
                    None => (
                        ErrorCode::NoSuchId,
                        Reply::ReadAck {
                            oid,
                            success: false,
                            data: Bytes::new(),
                        },
                    ),
                }
            }
            Request::Remove { oid } => {
                self.stats.removes.fetch_add(1, Relaxed);
                debug!(oid, "remove");
                let success = self.remove_one(oid);
                (ErrorCode::Ok, Reply::RemoveAck { oid, success })
            }
            Request::WriteBulk { oids, data } => {
                self.stats.bulk_writes.fetch_add(1, Relaxed);
                debug!(count = oids.len(), "write bulk");
                // Writes apply in request order and stop at the first blob
                // that does not fit. Earlier writes stand.
                for (oid, blob) in oids.iter().zip(data.iter()) {
                    if !self.write_one(*oid, blob) {
                        return (
                            ErrorCode::CapacityExceeded,
                            Reply::WriteBulkAck { success: false },
                        );
                    }
                }
                (ErrorCode::Ok, Reply::WriteBulkAck { success: true })
            }
            Request::ReadBulk { oids } => {
                self.stats.bulk_reads.fetch_add(1, Relaxed);
                debug!(count = oids.len(), "read bulk");
                // All-or-nothing: any absent id fails the whole request
                let mut blobs = Vec::with_capacity(oids.len());
                for oid in &oids {
                    match self.read_one(*oid) {
                        Some(data) => blobs.push(data),
                        None => {
                            return (
                                ErrorCode::NoSuchId,
                                Reply::ReadBulkAck {
                                    success: false,
                                    data: vec![],
                                },
                            )
                        }
                    }
                }
                (
                    ErrorCode::Ok,
                    Reply::ReadBulkAck {
                        success: true,
                        data: blobs,
                    },
                )
            }
        }
    }

    /// Admit and store one blob. An overwrite is charged only for the size
    /// delta. On rejection the accounting and the backend are untouched.
    fn write_one(&mut self, oid: ObjectId, data: &[u8]) -> bool {
        let old_size = if self.backend.exists(oid) {
            self.backend.size(oid).unwrap_or(0)
        } else {
            0
        };
        let remaining = self.used.saturating_sub(old_size);
        let new_size = data.len() as u64;
        if remaining + new_size > self.pool_size {
            warn!(
                oid,
                used = self.used,
                incoming = new_size,
                pool_size = self.pool_size,
                "put would go over pool capacity"
            );
            return false;
        }
        match self.backend.put(oid, data) {
            Ok(()) => {
                self.used = remaining + new_size;
                true
            }
            Err(e) => {
                error!(%e, oid, "backend write failed");
                false
            }
        }
    }

    fn read_one(&mut self, oid: ObjectId) -> Option<Bytes> {
        if !self.backend.exists(oid) {
            return None;
        }
        match self.backend.get(oid) {
            Ok(data) => Some(data),
            Err(e) => {
                error!(%e, oid, "backend read failed");
                None
            }
        }
    }

    fn remove_one(&mut self, oid: ObjectId) -> bool {
        if !self.backend.exists(oid) {
            return false;
        }
        let size = self.backend.size(oid).unwrap_or(0);
        match self.backend.remove(oid) {
            Ok(removed) => {
                if removed {
                    self.used = self.used.saturating_sub(size);
                }
                removed
            }
            Err(e) => {
                error!(%e, oid, "backend remove failed");
                false
            }
        }
    }
}
