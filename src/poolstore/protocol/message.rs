use std::convert::TryInto;
use std::fmt::{Debug, Formatter};

use bytes::Bytes;

use crate::poolstore::common::TxnId;
use crate::poolstore::protocol::Tag;

/// Number of bytes in the frame length prefix.
pub const LENGTH_PREFIX_LEN: usize = 4;
/// Byte offset of the transaction id within a frame.
pub const TXN_ID_OFFSET: usize = LENGTH_PREFIX_LEN + 1;
/// Byte offset of the message body (everything after tag and transaction id).
pub const BODY_OFFSET: usize = TXN_ID_OFFSET + 8;
/// Smallest payload the peer may send: tag plus transaction id.
pub const MIN_PAYLOAD_LEN: u32 = (BODY_OFFSET - LENGTH_PREFIX_LEN) as u32;

/// A single complete wire frame, length prefix included, ready to be written
/// to a socket in one send_all call.
#[derive(Clone)]
pub struct Message {
    data: Bytes,
}

impl Message {
    pub fn new(buf: Bytes) -> Self {
        Message { data: buf }
    }

    /// tag returns the message Tag or panics if the Message is truncated
    pub fn tag(&self) -> Tag {
        Tag::new_unchecked(*self.data.get(LENGTH_PREFIX_LEN).expect("empty Message"))
    }

    /// txn_id returns the transaction id echoed between client and server
    pub fn txn_id(&self) -> TxnId {
        u64::from_be_bytes(
            self.data[TXN_ID_OFFSET..BODY_OFFSET]
                .try_into()
                .expect("truncated Message"),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// len returns the total length of the frame including the length prefix
    pub fn len(&self) -> u32 {
        self.data.len() as u32
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Share a sub-range of the underlying buffer without copying
    pub fn slice(&self, start: usize, end: usize) -> Bytes {
        self.data.slice(start..end)
    }

    /// into_bytes consumes Message and returns the underlying Bytes buffer
    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl Debug for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Message")
            .field("tag", &self.tag())
            .field("txn_id", &self.txn_id())
            .field("len", &self.len())
            .finish()
    }
}
