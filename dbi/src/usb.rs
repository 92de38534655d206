//! [`Transport`] over USB bulk endpoints, backed by [`nusb`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use futures_lite::future;
use nusb::transfer::{Completion, Direction, EndpointType, RequestBuffer};
use tracing::debug;

use crate::{Error, Result, Transport};

/// Interface carrying the bulk endpoint pair.
const INTERFACE: u8 = 0;

/// Bulk IN/OUT endpoint pair on a claimed interface.
pub struct UsbTransport {
    /// Claimed interface 0.
    interface: nusb::Interface,
    /// Device → host endpoint address.
    ep_in: u8,
    /// Host → device endpoint address.
    ep_out: u8,
}

impl fmt::Debug for UsbTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UsbTransport")
            .field("ep_in", &format_args!("{:#04x}", self.ep_in))
            .field("ep_out", &format_args!("{:#04x}", self.ep_out))
            .finish_non_exhaustive()
    }
}

impl UsbTransport {
    /// Opens the first attached device matching `vendor_id:product_id`.
    ///
    /// Uses the first bulk IN and bulk OUT endpoints of interface 0 in the
    /// active configuration.
    pub fn connect(vendor_id: u16, product_id: u16) -> Result<Self> {
        let info = nusb::list_devices()?
            .find(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
            .ok_or(Error::DeviceNotFound {
                vendor_id,
                product_id,
            })?;
        let device = info.open()?;

        let (ep_in, ep_out) = {
            let config = device
                .active_configuration()
                .map_err(|e| Error::Configuration(e.to_string()))?;
            let alt = config
                .interface_alt_settings()
                .find(|alt| alt.interface_number() == INTERFACE && alt.alternate_setting() == 0)
                .ok_or(Error::EndpointNotFound("bulk"))?;
            let bulk = |dir: Direction| {
                alt.endpoints()
                    .find(|ep| ep.direction() == dir && ep.transfer_type() == EndpointType::Bulk)
                    .map(|ep| ep.address())
            };
            (
                bulk(Direction::In).ok_or(Error::EndpointNotFound("bulk IN"))?,
                bulk(Direction::Out).ok_or(Error::EndpointNotFound("bulk OUT"))?,
            )
        };

        let interface = device.claim_interface(INTERFACE)?;
        debug!(vendor_id, product_id, ep_in, ep_out, "interface claimed");
        Ok(Self {
            interface,
            ep_in,
            ep_out,
        })
    }
}

impl Transport for UsbTransport {
    fn read(&mut self, max_len: usize, timeout: Duration) -> Result<Vec<u8>> {
        let transfer = self
            .interface
            .bulk_in(self.ep_in, RequestBuffer::new(max_len));
        wait(transfer, timeout)
    }

    fn write(&mut self, data: &[u8], timeout: Duration) -> Result<()> {
        let transfer = self.interface.bulk_out(self.ep_out, data.to_vec());
        let sent = wait(transfer, timeout)?.actual_length();
        if sent < data.len() {
            return Err(Error::ShortWrite {
                expected: data.len(),
                actual: sent,
            });
        }
        Ok(())
    }
}

/// Blocks on a transfer. A non-zero `timeout` races it against a timer;
/// losing the race drops, and thereby cancels, the transfer.
fn wait<T>(transfer: impl Future<Output = Completion<T>>, timeout: Duration) -> Result<T> {
    let completion = if timeout.is_zero() {
        future::block_on(transfer)
    } else {
        future::block_on(future::or(async { Some(transfer.await) }, async {
            async_io::Timer::after(timeout).await;
            None
        }))
        .ok_or(Error::Timeout(timeout))?
    };
    Ok(completion.into_result()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nusb::transfer::TransferError;

    use super::*;

    #[test]
    fn stalled_transfer_times_out() {
        let never = future::pending::<Completion<Vec<u8>>>();
        let err = wait(never, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_millis(10)));
        assert!(err.is_connection_loss());
    }

    #[test]
    fn completed_transfer_beats_timer() {
        let done = future::ready(Completion {
            data: b"DBI0".to_vec(),
            status: Ok(()),
        });
        assert_eq!(wait(done, Duration::from_secs(5)).unwrap(), b"DBI0");
    }

    #[test]
    fn failed_transfer_maps_to_usb_error() {
        let failed = future::ready(Completion {
            data: Vec::<u8>::new(),
            status: Err(TransferError::Stall),
        });
        assert!(matches!(
            wait(failed, crate::NO_TIMEOUT).unwrap_err(),
            Error::Usb(TransferError::Stall)
        ));
    }
}
