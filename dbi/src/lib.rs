//! Host backend for the DBI0 USB install protocol.
//!
//! A console connected over USB drives the exchange: it asks for the list
//! of installable packages in a directory, then pulls byte ranges of the
//! files it wants. The host only answers.
//!
//! # Quick start
//!
//! ```no_run
//! use dbi::{HostConfig, SessionConfig};
//!
//! let config = HostConfig::new(SessionConfig::new("/srv/titles"));
//!
//! // Waits for the device, serves commands, returns once it sends EXIT.
//! dbi::serve(&config).expect("session failed");
//! ```
//!
//! [`Session`] can also be driven directly over any [`Transport`].

mod catalog;
mod config;
mod error;
mod serve;
mod session;
mod stream;
mod transport;
mod usb;

pub use catalog::{Catalog, TITLE_EXTENSIONS, TitleCatalog, is_title};
pub use config::{
    DEFAULT_PRODUCT_ID, DEFAULT_RECONNECT_DELAY, DEFAULT_VENDOR_ID, HostConfig, MissPolicy,
    SessionConfig,
};
pub use dbi_proto as proto;
pub use error::{Error, Result};
pub use serve::{connect_with_retry, serve, serve_with};
pub use session::{Exit, Session, Step};
pub use stream::{CHUNK_SIZE, stream_range, stream_reader};
pub use transport::{NO_TIMEOUT, Transport};
pub use usb::UsbTransport;
