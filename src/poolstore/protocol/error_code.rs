use std::fmt::{Debug, Display, Formatter};

use crate::poolstore::common::{Error, ObjectId, Result};

/// Wire-level error byte carried in every reply.
#[derive(Copy, Clone, Eq, PartialEq)]
#[repr(u8)]
pub enum ErrorCode {
    Ok = 0,
    NoSuchId = 1,
    CapacityExceeded = 2,
    ConnectionFailed = 3,
    Protocol = 4,
}

impl ErrorCode {
    pub fn from_u8(b: u8) -> Result<Self> {
        match b {
            0 => Ok(ErrorCode::Ok),
            1 => Ok(ErrorCode::NoSuchId),
            2 => Ok(ErrorCode::CapacityExceeded),
            3 => Ok(ErrorCode::ConnectionFailed),
            4 => Ok(ErrorCode::Protocol),
            _ => Err(Error::protocol_error(format!("unknown error code {}", b))),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Map the code to the crate error type, Ok(()) for the success path.
    /// The oid gives NoSuchId something to report.
    pub fn check(&self, oid: ObjectId) -> Result<()> {
        match *self {
            ErrorCode::Ok => Ok(()),
            ErrorCode::NoSuchId => Err(Error::no_such_id(oid)),
            ErrorCode::CapacityExceeded => Err(Error::capacity_exceeded()),
            ErrorCode::ConnectionFailed => Err(Error::connection_failed()),
            ErrorCode::Protocol => Err(Error::protocol_error("server reported a protocol error")),
        }
    }

    pub fn name(&self) -> &'static str {
        match *self {
            ErrorCode::Ok => "Ok",
            ErrorCode::NoSuchId => "NoSuchId",
            ErrorCode::CapacityExceeded => "CapacityExceeded",
            ErrorCode::ConnectionFailed => "ConnectionFailed",
            ErrorCode::Protocol => "Protocol",
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Debug for ErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
