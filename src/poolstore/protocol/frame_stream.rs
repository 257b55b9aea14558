use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;

use crate::poolstore::common::{Error, Result};
use crate::poolstore::protocol::{Message, MessageParser};

/// Reads complete frames off one half of a socket.
/// Shared by the server's per-connection loop and the client's receiver task.
pub struct FrameStream {
    read: OwnedReadHalf,
    parser: MessageParser,
}

impl FrameStream {
    pub fn new(read: OwnedReadHalf, max_payload: u32) -> Self {
        Self {
            read,
            parser: MessageParser::new(max_payload),
        }
    }

    /// Returns the next frame, or None when the peer closed the connection
    /// cleanly on a frame boundary. A close mid-frame is a protocol error.
    pub async fn next(&mut self) -> Result<Option<Message>> {
        loop {
            if let Some(result) = self.parser.next() {
                return result.map(Some);
            }
            let bytes_read = self.read.read_buf(self.parser.bytes_mut()).await?;
            if bytes_read == 0 {
                return if self.parser.is_empty() {
                    Ok(None)
                } else {
                    Err(Error::protocol_error("peer closed the connection mid-frame"))
                };
            }
        }
    }
}
