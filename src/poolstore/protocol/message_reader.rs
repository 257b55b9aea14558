use std::convert::TryInto;

use bytes::Bytes;

use crate::poolstore::common::{Error, Result};
use crate::poolstore::protocol::message::BODY_OFFSET;
use crate::poolstore::protocol::Message;

/// A reader for decoding the body of a wire message sequentially.
pub struct MessageReader<'a> {
    pub msg: &'a Message,
    pos: u32,            // track position for read_xxx methods
    read_past_end: bool, // true if we tried to read past the end of the message
}

impl<'a> MessageReader<'a> {
    /// Create a new Reader positioned at the start of the message body
    pub fn new(msg: &'a Message) -> Self {
        MessageReader {
            msg,
            pos: BODY_OFFSET as u32,
            read_past_end: false,
        }
    }

    /// Return the length of the underlying message, see Message::len
    pub fn len(&self) -> u32 {
        self.msg.len()
    }

    /// Returns an Error if has_error() is true
    pub fn error(&self) -> Result<()> {
        if self.has_error() {
            Err(Error::protocol_error(format!(
                "attempted to read past end of {:?}",
                self.msg
            )))
        } else {
            Ok(())
        }
    }

    /// Returns true if any of the read_* methods attempted to read beyond the end of the Message
    pub fn has_error(&self) -> bool {
        self.read_past_end
    }

    /// Reads a single byte and returns it.
    /// Returns 0 if no bytes left, use error() or has_error() to distinguish between that and an actual 0.
    pub fn read_byte(&mut self) -> u8 {
        let pos = self.pos;
        let new_pos = pos + 1;
        if new_pos > self.msg.len() {
            self.read_past_end = true;
            return 0;
        }

        let b = self.msg.as_slice()[pos as usize];
        self.pos = new_pos;
        b
    }

    /// Reads a boolean encoded as a single byte, false if no bytes left.
    pub fn read_bool(&mut self) -> bool {
        self.read_byte() != 0
    }

    /// Reads a u32 and returns it.
    /// Returns 0 if no bytes left, use error() or has_error() to distinguish between that and an actual 0.
    pub fn read_u32(&mut self) -> u32 {
        let pos = self.pos;
        let new_pos = pos + 4;
        if new_pos > self.msg.len() {
            self.read_past_end = true;
            return 0;
        }

        let bytes = &self.msg.as_slice()[pos as usize..new_pos as usize];
        self.pos = new_pos;
        u32::from_be_bytes(bytes.try_into().unwrap())
    }

    /// Reads a u64 and returns it.
    /// Returns 0 if no bytes left, use error() or has_error() to distinguish between that and an actual 0.
    pub fn read_u64(&mut self) -> u64 {
        let pos = self.pos;
        let new_pos = pos + 8;
        if new_pos > self.msg.len() {
            self.read_past_end = true;
            return 0;
        }

        let bytes = &self.msg.as_slice()[pos as usize..new_pos as usize];
        self.pos = new_pos;
        u64::from_be_bytes(bytes.try_into().unwrap())
    }

    /// Reads and returns a slice of bytes of the specified length
    pub fn read_bytes(&mut self, len: u32) -> Result<&'a [u8]> {
        let pos = self.pos;
        let new_pos = pos
            .checked_add(len)
            .ok_or_else(|| Error::protocol_error("frame length overflow"))?;
        self.seek(new_pos)?;

        let bytes = &self.msg.as_slice()[pos as usize..new_pos as usize];
        Ok(bytes)
    }

    /// Reads a length-framed blob: u32 big-endian length, then that many bytes.
    /// The returned Bytes shares the message allocation, no copy.
    pub fn read_framed(&mut self) -> Result<Bytes> {
        let len = self.read_u32();
        self.error()?;
        let pos = self.pos;
        self.read_bytes(len)?;
        Ok(self.msg.slice(pos as usize, (pos + len) as usize))
    }

    /// Seek to pos, and returns the old position.
    /// Returns an error if out of range without changing the position.
    pub fn seek(&mut self, pos: u32) -> Result<u32> {
        if pos > self.len() {
            self.read_past_end = true;
            return Err(self.error().unwrap_err());
        }
        Ok(std::mem::replace(&mut self.pos, pos))
    }

    /// Return the current position.
    pub fn tell(&self) -> u32 {
        self.pos
    }
}
