//! Error types for dbi operations.

use std::path::PathBuf;
use std::time::Duration;

use dbi_proto::ProtoError;
use nusb::transfer::TransferError;

/// Alias for `Result<T, dbi::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by connection, session and streaming operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No USB device with the requested ids is attached.
    #[error("device {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound {
        /// USB vendor id searched for.
        vendor_id: u16,
        /// USB product id searched for.
        product_id: u16,
    },

    /// The device is present but lacks a required bulk endpoint.
    #[error("device has no {0} endpoint on interface 0")]
    EndpointNotFound(&'static str),

    /// The device configuration could not be read.
    #[error("reading device configuration: {0}")]
    Configuration(String),

    /// A bulk transfer failed.
    #[error("USB transfer failed: {0}")]
    Usb(#[from] TransferError),

    /// A bulk transfer did not complete within its timeout.
    #[error("USB transfer timed out after {0:?}")]
    Timeout(Duration),

    /// The device stopped sending before a fixed-size read completed.
    #[error("short read: expected {expected} bytes, got {actual}")]
    ShortRead {
        /// Bytes required.
        expected: usize,
        /// Bytes received.
        actual: usize,
    },

    /// The device accepted fewer bytes than were written.
    #[error("short write: sent {actual} of {expected} bytes")]
    ShortWrite {
        /// Bytes submitted.
        expected: usize,
        /// Bytes accepted.
        actual: usize,
    },

    /// A request payload could not be parsed.
    #[error("malformed request: {0}")]
    Protocol(#[from] ProtoError),

    /// A payload does not fit the 32-bit length field of a frame.
    #[error("payload of {0} bytes exceeds the frame length field")]
    PayloadTooLarge(usize),

    /// The device asked for a name missing from the current catalog.
    #[error("title not in catalog: {0}")]
    UnknownTitle(String),

    /// The configured working directory is not a directory.
    #[error("not a directory: {}", .0.display())]
    InvalidWorkDir(PathBuf),

    /// File system or device I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` for failures of the USB link itself.
    ///
    /// These end the current session; the device is expected to come back
    /// and a new session starts from scratch.
    pub const fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            Self::Usb(_) | Self::Timeout(_) | Self::ShortRead { .. } | Self::ShortWrite { .. }
        )
    }
}
