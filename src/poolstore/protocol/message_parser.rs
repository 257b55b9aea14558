use std::convert::TryInto;

use bytes::{Buf, BytesMut};

use crate::poolstore::common::{Error, Result};
use crate::poolstore::protocol::message::{LENGTH_PREFIX_LEN, MIN_PAYLOAD_LEN};
use crate::poolstore::protocol::Message;

const RECV_BUFFER_SIZE: usize = 8 * 1024;

pub struct MessageParser {
    data: BytesMut,
    max_payload: u32,
}

impl MessageParser {
    pub fn new(max_payload: u32) -> Self {
        Self {
            data: BytesMut::with_capacity(RECV_BUFFER_SIZE),
            max_payload,
        }
    }

    /// Returns the next complete frame buffered so far, None if more bytes are
    /// needed, or a protocol error for an impossible length prefix.
    pub fn next(&mut self) -> Option<Result<Message>> {
        let chunk = self.data.chunk();
        if chunk.len() < LENGTH_PREFIX_LEN {
            return None;
        }
        let payload_len = u32::from_be_bytes(chunk[..LENGTH_PREFIX_LEN].try_into().unwrap());
        if payload_len < MIN_PAYLOAD_LEN {
            return Some(Err(Error::protocol_error(format!(
                "frame payload of {} bytes is too short",
                payload_len
            ))));
        }
        if payload_len > self.max_payload {
            return Some(Err(Error::protocol_error(format!(
                "frame payload of {} bytes exceeds the {} byte limit",
                payload_len, self.max_payload
            ))));
        }
        let frame_len = LENGTH_PREFIX_LEN + payload_len as usize;
        if frame_len <= self.data.len() {
            // We have the full frame, split it off and return it
            Some(Ok(Message::new(self.data.split_to(frame_len).freeze())))
        } else {
            // We don't have the frame yet, make sure the buffer can hold it
            self.data.reserve(frame_len - self.data.len());
            None
        }
    }

    /// True when no partially buffered frame remains
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn bytes_mut(&mut self) -> &mut BytesMut {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poolstore::common::TxnId;
    use crate::poolstore::protocol::{MessageBuilder, Tag};

    fn frame(txn_id: TxnId) -> Message {
        let mut b = MessageBuilder::new(Tag::READ, txn_id);
        b.write_u64(7);
        b.finish()
    }

    #[test]
    fn test_incremental_parse() {
        let msg = frame(42);
        let wire = msg.as_slice();

        let mut parser = MessageParser::new(1024);
        // Feed one byte at a time; the parser must not emit a frame early
        for b in wire.iter() {
            assert!(parser.next().is_none());
            parser.bytes_mut().extend_from_slice(&[*b]);
        }
        let parsed = parser.next().unwrap().unwrap();
        assert_eq!(parsed.tag(), Tag::READ);
        assert_eq!(parsed.txn_id(), 42);
        assert!(parser.is_empty());
    }

    #[test]
    fn test_two_frames_in_one_buffer() {
        let mut parser = MessageParser::new(1024);
        parser.bytes_mut().extend_from_slice(frame(1).as_slice());
        parser.bytes_mut().extend_from_slice(frame(2).as_slice());
        assert_eq!(parser.next().unwrap().unwrap().txn_id(), 1);
        assert_eq!(parser.next().unwrap().unwrap().txn_id(), 2);
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_oversize_frame_rejected() {
        let mut parser = MessageParser::new(16);
        parser
            .bytes_mut()
            .extend_from_slice(&1024u32.to_be_bytes());
        assert!(parser.next().unwrap().is_err());
    }

    #[test]
    fn test_undersize_frame_rejected() {
        let mut parser = MessageParser::new(1024);
        parser.bytes_mut().extend_from_slice(&4u32.to_be_bytes());
        assert!(parser.next().unwrap().is_err());
    }
}
