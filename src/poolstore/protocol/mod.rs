mod error_code;
mod frame_stream;
mod frames;
mod message;
mod message_builder;
mod message_parser;
mod message_reader;
mod tag;

pub use self::error_code::ErrorCode;
pub use self::frame_stream::FrameStream;
pub use self::frames::{Reply, Request};
pub use self::message::Message;
pub use self::message_builder::MessageBuilder;
pub use self::message_parser::MessageParser;
pub use self::message_reader::MessageReader;
pub use self::tag::Tag;

/// Largest frame payload accepted when no configured limit applies.
pub const DEFAULT_MAX_PAYLOAD: u32 = 256 * 1024 * 1024;
