//! Fixed 16-byte command header.
//!
//! Layout (all integers little-endian):
//!
//! | offset | size | field            |
//! |--------|------|------------------|
//! | 0      | 4    | magic (`DBI0`)   |
//! | 4      | 4    | command type     |
//! | 8      | 4    | command id       |
//! | 12     | 4    | payload length   |

use std::fmt;

use crate::ProtoError;

/// Protocol signature carried in the first four bytes of every frame.
pub const MAGIC: [u8; 4] = *b"DBI0";

/// Encoded size of a [`Frame`].
pub const FRAME_LEN: usize = 16;

/// Direction/role of a frame within a handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CommandType {
    /// Device → host command.
    Request,
    /// Host → device answer announcing a payload length.
    Response,
    /// Readiness acknowledgement, sent by either side before a bulk payload.
    Ack,
    /// Any value outside the known set, preserved as received.
    Unknown(u32),
}

impl From<u32> for CommandType {
    fn from(raw: u32) -> Self {
        match raw {
            0 => Self::Request,
            1 => Self::Response,
            2 => Self::Ack,
            other => Self::Unknown(other),
        }
    }
}

impl From<CommandType> for u32 {
    fn from(kind: CommandType) -> Self {
        match kind {
            CommandType::Request => 0,
            CommandType::Response => 1,
            CommandType::Ack => 2,
            CommandType::Unknown(raw) => raw,
        }
    }
}

/// Command selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CommandId {
    /// End the session.
    Exit,
    /// Old list command; no longer served.
    ListDeprecated,
    /// Read a byte range of a named file.
    FileRange,
    /// List installable titles.
    List,
    /// Any value outside the known set, preserved as received.
    Unknown(u32),
}

impl From<u32> for CommandId {
    fn from(raw: u32) -> Self {
        match raw {
            0 => Self::Exit,
            1 => Self::ListDeprecated,
            2 => Self::FileRange,
            3 => Self::List,
            other => Self::Unknown(other),
        }
    }
}

impl From<CommandId> for u32 {
    fn from(id: CommandId) -> Self {
        match id {
            CommandId::Exit => 0,
            CommandId::ListDeprecated => 1,
            CommandId::FileRange => 2,
            CommandId::List => 3,
            CommandId::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exit => f.write_str("EXIT"),
            Self::ListDeprecated => f.write_str("LIST_DEPRECATED"),
            Self::FileRange => f.write_str("FILE_RANGE"),
            Self::List => f.write_str("LIST"),
            Self::Unknown(raw) => write!(f, "UNKNOWN({raw})"),
        }
    }
}

/// Decoded command header.
///
/// Decoding never fails: the numeric fields are fixed-width and unknown
/// values are kept verbatim. Check [`Frame::has_valid_magic`] before acting
/// on `kind` or `command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Signature bytes as received.
    pub magic: [u8; 4],
    /// Frame role.
    pub kind: CommandType,
    /// Command selector.
    pub command: CommandId,
    /// Number of payload bytes announced by this frame.
    pub payload_len: u32,
}

impl Frame {
    /// Creates a frame carrying the protocol signature.
    pub const fn new(kind: CommandType, command: CommandId, payload_len: u32) -> Self {
        Self {
            magic: MAGIC,
            kind,
            command,
            payload_len,
        }
    }

    /// Shorthand for a [`CommandType::Request`] frame.
    pub const fn request(command: CommandId, payload_len: u32) -> Self {
        Self::new(CommandType::Request, command, payload_len)
    }

    /// Shorthand for a [`CommandType::Response`] frame.
    pub const fn response(command: CommandId, payload_len: u32) -> Self {
        Self::new(CommandType::Response, command, payload_len)
    }

    /// Shorthand for a [`CommandType::Ack`] frame.
    pub const fn ack(command: CommandId, payload_len: u32) -> Self {
        Self::new(CommandType::Ack, command, payload_len)
    }

    /// Returns `true` if the signature matches [`MAGIC`].
    pub fn has_valid_magic(&self) -> bool {
        self.magic == MAGIC
    }

    /// Serializes the frame into its 16-byte wire form.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        buf[0..4].copy_from_slice(&self.magic);
        buf[4..8].copy_from_slice(&u32::from(self.kind).to_le_bytes());
        buf[8..12].copy_from_slice(&u32::from(self.command).to_le_bytes());
        buf[12..16].copy_from_slice(&self.payload_len.to_le_bytes());
        buf
    }

    /// Parses a 16-byte header.
    pub fn decode(buf: &[u8; FRAME_LEN]) -> Self {
        let field = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        Self {
            magic: [buf[0], buf[1], buf[2], buf[3]],
            kind: CommandType::from(field(4)),
            command: CommandId::from(field(8)),
            payload_len: field(12),
        }
    }

    /// Parses the first 16 bytes of `buf`.
    ///
    /// Bytes past the header are ignored.
    pub fn decode_slice(buf: &[u8]) -> Result<Self, ProtoError> {
        let header: &[u8; FRAME_LEN] = buf
            .get(..FRAME_LEN)
            .and_then(|b| b.try_into().ok())
            .ok_or(ProtoError::Truncated {
                what: "frame header",
                expected: FRAME_LEN,
                actual: buf.len(),
            })?;
        Ok(Self::decode(header))
    }
}

/// Encodes a signed frame header.
pub fn encode(kind: CommandType, command: CommandId, payload_len: u32) -> [u8; FRAME_LEN] {
    Frame::new(kind, command, payload_len).encode()
}

/// Decodes a frame header. See [`Frame::decode`].
pub fn decode(buf: &[u8; FRAME_LEN]) -> Frame {
    Frame::decode(buf)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_known_and_unknown_fields() {
        let frames = [
            Frame::request(CommandId::FileRange, 37),
            Frame::response(CommandId::List, u32::MAX),
            Frame::ack(CommandId::Exit, 0),
            Frame::new(CommandType::Unknown(9), CommandId::Unknown(0xdead_beef), 5),
        ];
        for f in frames {
            assert_eq!(decode(&f.encode()), f);
        }
    }

    #[test]
    fn layout_is_little_endian() {
        let bytes = encode(CommandType::Ack, CommandId::FileRange, 0x0102_0304);
        assert_eq!(&bytes[0..4], b"DBI0");
        assert_eq!(&bytes[4..8], &[2, 0, 0, 0]);
        assert_eq!(&bytes[8..12], &[2, 0, 0, 0]);
        assert_eq!(&bytes[12..16], &[4, 3, 2, 1]);
    }

    #[test]
    fn bad_magic_still_decodes() {
        let mut bytes = Frame::request(CommandId::List, 0).encode();
        bytes[..4].copy_from_slice(b"XXXX");
        let frame = decode(&bytes);
        assert!(!frame.has_valid_magic());
        assert_eq!(frame.command, CommandId::List);
    }

    #[test]
    fn decode_slice_rejects_short_buffer() {
        let err = Frame::decode_slice(&[0u8; 10]).unwrap_err();
        assert!(matches!(
            err,
            ProtoError::Truncated {
                expected: 16,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn decode_slice_ignores_trailing_bytes() {
        let mut bytes = Frame::response(CommandId::Exit, 0).encode().to_vec();
        bytes.extend_from_slice(b"trailing");
        let frame = Frame::decode_slice(&bytes).unwrap();
        assert_eq!(frame, Frame::response(CommandId::Exit, 0));
    }

    #[test]
    fn command_id_display() {
        assert_eq!(CommandId::FileRange.to_string(), "FILE_RANGE");
        assert_eq!(CommandId::from(7).to_string(), "UNKNOWN(7)");
    }
}
