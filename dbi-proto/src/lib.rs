//! Wire format of the DBI0 USB install protocol.
//!
//! Every exchange starts with a fixed 16-byte little-endian [`Frame`]
//! header carrying the `DBI0` signature. A `FILE_RANGE` request is followed
//! by a [`FileRangeRequest`] payload naming the file and byte range the
//! device wants. This crate does no I/O; callers read and write the raw
//! bytes over whatever bulk link they own.

mod error;
mod frame;
mod range;

pub use error::ProtoError;
pub use frame::{CommandId, CommandType, FRAME_LEN, Frame, MAGIC, decode, encode};
pub use range::{FileRangeRequest, RANGE_HEADER_LEN};
