//! Connection acquisition and the reconnect loop.

use std::thread;
use std::time::Duration;

use tracing::{info, warn};

use crate::{Error, Exit, HostConfig, Result, Session, Transport, UsbTransport};

/// Calls `connect` until it succeeds, sleeping `delay` after each
/// [`Error::DeviceNotFound`]. Any other error is returned immediately.
pub fn connect_with_retry<T>(mut connect: impl FnMut() -> Result<T>, delay: Duration) -> Result<T> {
    loop {
        match connect() {
            Ok(transport) => return Ok(transport),
            Err(e @ Error::DeviceNotFound { .. }) => {
                info!(error = %e, "waiting for device");
                thread::sleep(delay);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Serves sessions over transports produced by `connect` until one ends
/// with `EXIT`.
///
/// A session that fails with a connection-loss error is dropped along with
/// its catalog, and a fresh connection is awaited.
pub fn serve_with<T: Transport>(
    mut connect: impl FnMut() -> Result<T>,
    config: &HostConfig,
) -> Result<Exit> {
    loop {
        let transport = connect_with_retry(&mut connect, config.reconnect_delay)?;
        info!(
            vendor_id = config.vendor_id,
            product_id = config.product_id,
            "device connected"
        );

        let mut session = Session::new(transport, config.session.clone());
        match session.run() {
            Ok(exit) => return Ok(exit),
            Err(e) if e.is_connection_loss() => warn!(error = %e, "connection lost"),
            Err(e) => return Err(e),
        }
    }
}

/// Validates the working directory, then serves the USB device named in
/// `config`.
pub fn serve(config: &HostConfig) -> Result<Exit> {
    config.session.validate()?;
    serve_with(
        || UsbTransport::connect(config.vendor_id, config.product_id),
        config,
    )
}
