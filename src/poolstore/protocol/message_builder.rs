use bytes::{BufMut, BytesMut};

use crate::poolstore::common::TxnId;
use crate::poolstore::protocol::message::LENGTH_PREFIX_LEN;
use crate::poolstore::protocol::{Message, Tag};

pub struct MessageBuilder {
    data: BytesMut,
}

impl MessageBuilder {
    pub fn new(tag: Tag, txn_id: TxnId) -> Self {
        let mut builder = MessageBuilder {
            data: BytesMut::with_capacity(256), // typically we build short messages
        };
        builder.data.put_u32(0); // length placeholder, patched in finish()
        builder.data.put_u8(tag.as_u8());
        builder.data.put_u64(txn_id);
        builder
    }

    pub fn reserve(&mut self, additional_size: usize) {
        self.data.reserve(additional_size)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn finish(mut self) -> Message {
        let payload_len = (self.data.len() - LENGTH_PREFIX_LEN) as u32;
        self.data[..LENGTH_PREFIX_LEN].copy_from_slice(&payload_len.to_be_bytes());
        Message::new(self.data.freeze())
    }

    pub fn write_byte(&mut self, b: u8) {
        self.data.put_u8(b);
    }

    pub fn write_bool(&mut self, b: bool) {
        self.data.put_u8(b as u8);
    }

    pub fn write_u32(&mut self, i: u32) {
        self.data.put_u32(i);
    }

    pub fn write_u64(&mut self, i: u64) {
        self.data.put_u64(i);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Write a length-framed blob: a u32 big-endian length followed by the bytes.
    pub fn write_framed(&mut self, bytes: &[u8]) {
        self.data.put_u32(bytes.len() as u32);
        self.data.extend_from_slice(bytes);
    }
}
