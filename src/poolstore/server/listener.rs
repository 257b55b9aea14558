use std::io;

use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tracing::{debug, error};

use crate::poolstore::config::LISTEN_BACKLOG;
use crate::poolstore::Result;

pub struct Listener {
    pub address: String,
    listener: TcpListener,
}

impl Listener {
    pub fn new(address: String, reuseport: bool) -> Result<Self> {
        let addr = address.parse()?;
        let sock = TcpSocket::new_v4()?;
        sock.set_reuseaddr(true)?;
        #[cfg(unix)]
        {
            if reuseport {
                sock.set_reuseport(true)?;
            }
        }
        #[cfg(not(unix))]
        let _ = reuseport;
        sock.bind(addr)?;
        let listener = sock.listen(LISTEN_BACKLOG)?;
        Ok(Self { address, listener })
    }

    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn accept(&self) -> Option<TcpStream> {
        loop {
            match self.listener.accept().await {
                Ok((sock, remote_addr)) => {
                    debug!(%remote_addr, server = %self.address.as_str(), "accept connection");
                    return Some(sock);
                }
                Err(e) => {
                    // Retry on the transient errors accept is known to report,
                    // give up if the listening socket itself is gone.
                    match e.kind() {
                        io::ErrorKind::ConnectionAborted
                        | io::ErrorKind::ConnectionReset
                        | io::ErrorKind::Interrupted
                        | io::ErrorKind::WouldBlock => {
                            error!(%e, "accept error");
                            continue;
                        }
                        _ => {
                            error!(%e, server = %self.address.as_str(), "unrecoverable accept error");
                            return None;
                        }
                    }
                }
            }
        }
    }
}
