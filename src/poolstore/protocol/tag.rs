use std::fmt::{Debug, Display, Formatter};

use crate::poolstore::common::{Error, Result};

// Tag defines the message type byte carried at the start of every frame payload
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct Tag(u8);

impl Tag {
    // Requests
    pub const WRITE: Tag = Tag::new_unchecked(b'W');
    pub const READ: Tag = Tag::new_unchecked(b'R');
    pub const REMOVE: Tag = Tag::new_unchecked(b'D');
    pub const WRITE_BULK: Tag = Tag::new_unchecked(b'B');
    pub const READ_BULK: Tag = Tag::new_unchecked(b'G');
    // Replies
    pub const WRITE_ACK: Tag = Tag::new_unchecked(b'w');
    pub const READ_ACK: Tag = Tag::new_unchecked(b'r');
    pub const REMOVE_ACK: Tag = Tag::new_unchecked(b'd');
    pub const WRITE_BULK_ACK: Tag = Tag::new_unchecked(b'b');
    pub const READ_BULK_ACK: Tag = Tag::new_unchecked(b'g');

    pub fn new(b: u8) -> Result<Self> {
        let tag = Tag(b);
        if tag.name().is_empty() {
            return Err(Error::protocol_error(format!(
                "Unknown message tag '{}'",
                b as char
            )));
        }
        Ok(tag)
    }

    pub const fn new_unchecked(b: u8) -> Self {
        Tag(b)
    }

    pub fn as_u8(&self) -> u8 {
        self.0
    }

    pub fn is_reply(&self) -> bool {
        self.0.is_ascii_lowercase()
    }

    pub fn name(&self) -> &'static str {
        match *self {
            Tag::WRITE => "Write",
            Tag::READ => "Read",
            Tag::REMOVE => "Remove",
            Tag::WRITE_BULK => "WriteBulk",
            Tag::READ_BULK => "ReadBulk",
            Tag::WRITE_ACK => "WriteAck",
            Tag::READ_ACK => "ReadAck",
            Tag::REMOVE_ACK => "RemoveAck",
            Tag::WRITE_BULK_ACK => "WriteBulkAck",
            Tag::READ_BULK_ACK => "ReadBulkAck",
            _ => "",
        }
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = self.name();
        if !name.is_empty() {
            return f.write_str(name);
        }
        f.write_fmt(format_args!("Unknown message tag '{}'", self.0))
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
