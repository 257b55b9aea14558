use std::fmt::{Debug, Display};
use std::{fmt, io, result};
use std::net::AddrParseError;
use std::sync::PoisonError;

#[derive(Debug, PartialEq, Eq)]
pub struct Error {
    err: Box<ErrorKind>, // use a Box to keep the Result type smaller
}

#[derive(Debug)]
pub enum ErrorKind {
    /// Read or remove of an id that is not present on the server
    NoSuchId(u64),
    /// A put was rejected because it would overflow the server pool
    CapacityExceeded,
    /// The connection failed or was torn down with operations outstanding
    ConnectionFailed,
    /// Cache manager constructed with a zero capacity
    CacheCapacity,
    /// Ordered prefetch consulted with an id outside its configured range
    Bounds(String),
    /// Malformed frame or unexpected message variant
    ProtocolError(String),
    PoisonError,
    ClosedError,
    StringError(String),
    IOError(io::Error),
    YamlError(serde_yaml::Error),
    CodecError(bincode::Error),
    ArrayFromSliceError(std::array::TryFromSliceError),
}

pub type Result<T> = result::Result<T, Error>;

impl Error {
    pub fn new<S: ToString>(s: S) -> Self {
        Error {
            err: Box::new(ErrorKind::StringError(s.to_string())),
        }
    }

    pub fn no_such_id(oid: u64) -> Self {
        Error {
            err: Box::new(ErrorKind::NoSuchId(oid)),
        }
    }

    pub fn capacity_exceeded() -> Self {
        Error {
            err: Box::new(ErrorKind::CapacityExceeded),
        }
    }

    pub fn connection_failed() -> Self {
        Error {
            err: Box::new(ErrorKind::ConnectionFailed),
        }
    }

    pub fn cache_capacity() -> Self {
        Error {
            err: Box::new(ErrorKind::CacheCapacity),
        }
    }

    pub fn bounds<S: ToString>(s: S) -> Self {
        Error {
            err: Box::new(ErrorKind::Bounds(s.to_string())),
        }
    }

    pub fn protocol_error<S: ToString>(s: S) -> Self {
        Error {
            err: Box::new(ErrorKind::ProtocolError(s.to_string())),
        }
    }

    pub fn closed() -> Self {
        Error {
            err: Box::new(ErrorKind::ClosedError),
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.err
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error {
            err: Box::new(ErrorKind::StringError(String::from(err))),
        }
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error {
            err: Box::new(ErrorKind::StringError(err)),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error {
            err: Box::new(ErrorKind::IOError(err)),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error {
            err: Box::new(ErrorKind::YamlError(err)),
        }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error {
            err: Box::new(ErrorKind::CodecError(err)),
        }
    }
}

impl From<std::array::TryFromSliceError> for Error {
    fn from(err: std::array::TryFromSliceError) -> Self {
        Error {
            err: Box::new(ErrorKind::ArrayFromSliceError(err)),
        }
    }
}

impl From<AddrParseError> for Error {
    fn from(err: AddrParseError) -> Self {
        Error::new(err)
    }
}

impl<Guard> From<PoisonError<Guard>> for Error {
    fn from(_err: PoisonError<Guard>) -> Self {
        Error {
            err: Box::new(ErrorKind::PoisonError),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        std::fmt::Display::fmt(&self.err, f)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::NoSuchId(oid) => write!(f, "object id {} does not exist on the server", oid),
            ErrorKind::CapacityExceeded => f.write_str("put would exceed the server memory pool"),
            ErrorKind::ConnectionFailed => f.write_str("connection to the server failed"),
            ErrorKind::CacheCapacity => f.write_str("cache capacity must be at least one"),
            ErrorKind::Bounds(s) => f.write_str(s),
            ErrorKind::ProtocolError(s) => f.write_str(s),
            ErrorKind::PoisonError => f.write_str("another thread panicked while holding the mutex"),
            ErrorKind::ClosedError => f.write_str("socket/file is closed"),
            ErrorKind::StringError(s) => f.write_str(s),
            ErrorKind::IOError(e) => std::fmt::Display::fmt(&e, f),
            ErrorKind::YamlError(e) => std::fmt::Display::fmt(&e, f),
            ErrorKind::CodecError(e) => std::fmt::Display::fmt(&e, f),
            ErrorKind::ArrayFromSliceError(e) => std::fmt::Display::fmt(&e, f),
        }
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl Eq for ErrorKind {}
