/// Admission decision consulted once per accepted connection, before any
/// frame is read. Deployment-specific implementations can check source
/// address allowlists, shared secrets delivered out of band, etc.
pub trait Authenticator: Send + Sync {
    fn admit(&self, remote_addr: std::net::SocketAddr) -> bool;
}

/// Admits every connection.
pub struct AllowAllAuthenticator;

impl Authenticator for AllowAllAuthenticator {
    fn admit(&self, _remote_addr: std::net::SocketAddr) -> bool {
        true
    }
}
