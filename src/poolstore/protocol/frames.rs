use bytes::Bytes;

use crate::poolstore::common::{Error, ObjectId, Result, TxnId};
use crate::poolstore::protocol::{ErrorCode, Message, MessageBuilder, MessageReader, Tag};

/// Typed request variants, one per request tag.
#[derive(Debug)]
pub enum Request {
    Write { oid: ObjectId, data: Bytes },
    Read { oid: ObjectId },
    Remove { oid: ObjectId },
    WriteBulk { oids: Vec<ObjectId>, data: Vec<Bytes> },
    ReadBulk { oids: Vec<ObjectId> },
}

/// Typed reply variants, one per reply tag. The error code travels beside the
/// variant, not inside it, because every reply carries one.
#[derive(Debug)]
pub enum Reply {
    WriteAck { oid: ObjectId, success: bool },
    ReadAck { oid: ObjectId, success: bool, data: Bytes },
    RemoveAck { oid: ObjectId, success: bool },
    WriteBulkAck { success: bool },
    ReadBulkAck { success: bool, data: Vec<Bytes> },
}

impl Request {
    pub fn encode(&self, txn_id: TxnId) -> Message {
        match self {
            Request::Write { oid, data } => {
                let mut b = MessageBuilder::new(Tag::WRITE, txn_id);
                b.reserve(data.len() + 12);
                b.write_u64(*oid);
                b.write_framed(data);
                b.finish()
            }
            Request::Read { oid } => {
                let mut b = MessageBuilder::new(Tag::READ, txn_id);
                b.write_u64(*oid);
                b.finish()
            }
            Request::Remove { oid } => {
                let mut b = MessageBuilder::new(Tag::REMOVE, txn_id);
                b.write_u64(*oid);
                b.finish()
            }
            Request::WriteBulk { oids, data } => {
                let mut b = MessageBuilder::new(Tag::WRITE_BULK, txn_id);
                b.write_u32(oids.len() as u32);
                for oid in oids {
                    b.write_u64(*oid);
                }
                b.write_u32(data.len() as u32);
                for blob in data {
                    b.write_framed(blob);
                }
                b.finish()
            }
            Request::ReadBulk { oids } => {
                let mut b = MessageBuilder::new(Tag::READ_BULK, txn_id);
                b.write_u32(oids.len() as u32);
                for oid in oids {
                    b.write_u64(*oid);
                }
                b.finish()
            }
        }
    }

    pub fn decode(msg: &Message) -> Result<Request> {
        let tag = msg.tag();
        let mut r = MessageReader::new(msg);
        let req = match tag {
            Tag::WRITE => {
                let oid = r.read_u64();
                let data = r.read_framed()?;
                Request::Write { oid, data }
            }
            Tag::READ => Request::Read { oid: r.read_u64() },
            Tag::REMOVE => Request::Remove { oid: r.read_u64() },
            Tag::WRITE_BULK => {
                let oids = read_oids(&mut r)?;
                let count = r.read_u32();
                r.error()?;
                if count as usize != oids.len() {
                    return Err(Error::protocol_error(
                        "bulk write id and blob counts disagree",
                    ));
                }
                let mut data = Vec::with_capacity(oids.len());
                for _ in 0..count {
                    data.push(r.read_framed()?);
                }
                Request::WriteBulk { oids, data }
            }
            Tag::READ_BULK => Request::ReadBulk {
                oids: read_oids(&mut r)?,
            },
            _ => {
                return Err(Error::protocol_error(format!(
                    "unexpected request {}",
                    tag
                )))
            }
        };
        r.error()?;
        Ok(req)
    }
}

impl Reply {
    pub fn encode(&self, txn_id: TxnId, error: ErrorCode) -> Message {
        match self {
            Reply::WriteAck { oid, success } => {
                let mut b = MessageBuilder::new(Tag::WRITE_ACK, txn_id);
                b.write_byte(error.as_u8());
                b.write_u64(*oid);
                b.write_bool(*success);
                b.finish()
            }
            Reply::ReadAck { oid, success, data } => {
                let mut b = MessageBuilder::new(Tag::READ_ACK, txn_id);
                b.reserve(data.len() + 20);
                b.write_byte(error.as_u8());
                b.write_u64(*oid);
                b.write_bool(*success);
                b.write_framed(data);
                b.finish()
            }
            Reply::RemoveAck { oid, success } => {
                let mut b = MessageBuilder::new(Tag::REMOVE_ACK, txn_id);
                b.write_byte(error.as_u8());
                b.write_u64(*oid);
                b.write_bool(*success);
                b.finish()
            }
            Reply::WriteBulkAck { success } => {
                let mut b = MessageBuilder::new(Tag::WRITE_BULK_ACK, txn_id);
                b.write_byte(error.as_u8());
                b.write_bool(*success);
                b.finish()
            }
            Reply::ReadBulkAck { success, data } => {
                let mut b = MessageBuilder::new(Tag::READ_BULK_ACK, txn_id);
                b.write_byte(error.as_u8());
                b.write_bool(*success);
                b.write_u32(data.len() as u32);
                for blob in data {
                    b.write_framed(blob);
                }
                b.finish()
            }
        }
    }

    pub fn decode(msg: &Message) -> Result<(ErrorCode, Reply)> {
        let tag = msg.tag();
        let mut r = MessageReader::new(msg);
        let error = ErrorCode::from_u8(r.read_byte())?;
        let reply = match tag {
            Tag::WRITE_ACK => Reply::WriteAck {
                oid: r.read_u64(),
                success: r.read_bool(),
            },
            Tag::READ_ACK => {
                let oid = r.read_u64();
                let success = r.read_bool();
                let data = r.read_framed()?;
                Reply::ReadAck { oid, success, data }
            }
            Tag::REMOVE_ACK => Reply::RemoveAck {
                oid: r.read_u64(),
                success: r.read_bool(),
            },
            Tag::WRITE_BULK_ACK => Reply::WriteBulkAck {
                success: r.read_bool(),
            },
            Tag::READ_BULK_ACK => {
                let success = r.read_bool();
                let count = r.read_u32();
                r.error()?;
                let mut data = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    data.push(r.read_framed()?);
                }
                Reply::ReadBulkAck { success, data }
            }
            _ => {
                return Err(Error::protocol_error(format!(
                    "unexpected reply {}",
                    tag
                )))
            }
        };
        r.error()?;
        Ok((error, reply))
    }
}

fn read_oids(r: &mut MessageReader) -> Result<Vec<ObjectId>> {
    let count = r.read_u32();
    r.error()?;
    let mut oids = Vec::with_capacity(count as usize);
    for _ in 0..count {
        oids.push(r.read_u64());
    }
    r.error()?;
    Ok(oids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_request_layout() {
        let msg = Request::Write {
            oid: 0xABCD,
            data: Bytes::from_static(b"hello"),
        }
        .encode(9);
        assert_eq!(msg.tag(), Tag::WRITE);
        assert_eq!(msg.txn_id(), 9);
        match Request::decode(&msg).unwrap() {
            Request::Write { oid, data } => {
                assert_eq!(oid, 0xABCD);
                assert_eq!(&data[..], b"hello");
            }
            other => panic!("decoded {:?}", other),
        }
    }

    #[test]
    fn test_bulk_count_mismatch_rejected() {
        // A WriteBulk whose blob count disagrees with its id count is malformed
        let mut b = MessageBuilder::new(Tag::WRITE_BULK, 1);
        b.write_u32(2);
        b.write_u64(1);
        b.write_u64(2);
        b.write_u32(1);
        b.write_framed(b"x");
        assert!(Request::decode(&b.finish()).is_err());
    }

    #[test]
    fn test_read_bulk_ack_failure_is_empty() {
        let msg = Reply::ReadBulkAck {
            success: false,
            data: vec![],
        }
        .encode(3, ErrorCode::NoSuchId);
        let (error, reply) = Reply::decode(&msg).unwrap();
        assert_eq!(error, ErrorCode::NoSuchId);
        match reply {
            Reply::ReadBulkAck { success, data } => {
                assert!(!success);
                assert!(data.is_empty());
            }
            other => panic!("decoded {:?}", other),
        }
    }

    #[test]
    fn test_truncated_reply_rejected() {
        let full = Reply::ReadAck {
            oid: 1,
            success: true,
            data: Bytes::from_static(b"abcdef"),
        }
        .encode(1, ErrorCode::Ok);
        // Clip the final three bytes and fix up the length prefix
        let clipped = &full.as_slice()[..full.as_slice().len() - 3];
        let mut raw = clipped.to_vec();
        let payload_len = (raw.len() - 4) as u32;
        raw[..4].copy_from_slice(&payload_len.to_be_bytes());
        assert!(Reply::decode(&Message::new(Bytes::from(raw))).is_err());
    }
}
