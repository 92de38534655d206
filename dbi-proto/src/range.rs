//! `FILE_RANGE` request payload.
//!
//! Layout (little-endian): `range_size: u32`, `range_offset: u64`,
//! `name_len: u32`, then the file name bytes.

use crate::ProtoError;

/// Size of the fixed fields preceding the file name.
pub const RANGE_HEADER_LEN: usize = 16;

/// A request for `size` bytes of `name` starting at `offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRangeRequest {
    /// Number of bytes requested.
    pub size: u32,
    /// Byte offset into the file.
    pub offset: u64,
    /// Name length declared by the device.
    pub name_len: u32,
    /// Requested file name (a catalog base-name or a path).
    pub name: String,
}

impl FileRangeRequest {
    /// Builds a request whose declared name length matches `name`.
    pub fn new(size: u32, offset: u64, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            size,
            offset,
            name_len: u32::try_from(name.len()).unwrap_or(u32::MAX),
            name,
        }
    }

    /// Parses a request payload.
    ///
    /// The name is the first `name_len` bytes after the fixed fields, or
    /// everything remaining if the payload is shorter. Trailing NUL padding
    /// is stripped.
    pub fn parse(buf: &[u8]) -> Result<Self, ProtoError> {
        if buf.len() < RANGE_HEADER_LEN {
            return Err(ProtoError::Truncated {
                what: "file range request",
                expected: RANGE_HEADER_LEN,
                actual: buf.len(),
            });
        }
        let size = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let offset = u64::from_le_bytes([
            buf[4], buf[5], buf[6], buf[7], buf[8], buf[9], buf[10], buf[11],
        ]);
        let name_len = u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);

        let rest = &buf[RANGE_HEADER_LEN..];
        let take = usize::try_from(name_len).map_or(rest.len(), |n| n.min(rest.len()));
        let raw = &rest[..take];
        let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        let name = String::from_utf8(raw[..end].to_vec())?;

        Ok(Self {
            size,
            offset,
            name_len,
            name,
        })
    }

    /// Serializes the request as a device would send it.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(RANGE_HEADER_LEN + self.name.len());
        buf.extend_from_slice(&self.size.to_le_bytes());
        buf.extend_from_slice(&self.offset.to_le_bytes());
        buf.extend_from_slice(&self.name_len.to_le_bytes());
        buf.extend_from_slice(self.name.as_bytes());
        buf
    }
}
