//! Blocking byte transport between host and device.

use std::time::Duration;

use crate::{Error, Result};

/// Timeout value meaning "block until the transfer completes".
pub const NO_TIMEOUT: Duration = Duration::ZERO;

/// Upper bound on the buffer preallocated by [`Transport::read_exact`].
const READ_PREALLOC: usize = 64 * 1024;

/// A half-duplex bulk link to the device.
///
/// Calls block the current thread. A timeout of [`NO_TIMEOUT`] waits
/// indefinitely.
pub trait Transport {
    /// Reads at most `max_len` bytes in a single transfer.
    ///
    /// An empty result means the device sent a zero-length packet. Callers
    /// may pass a non-zero `timeout` to bound the wait, which fails with
    /// [`Error::Timeout`].
    fn read(&mut self, max_len: usize, timeout: Duration) -> Result<Vec<u8>>;

    /// Writes `data` in a single transfer.
    fn write(&mut self, data: &[u8], timeout: Duration) -> Result<()>;

    /// Reads exactly `len` bytes, issuing as many transfers as needed.
    fn read_exact(&mut self, len: usize, timeout: Duration) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(len.min(READ_PREALLOC));
        while buf.len() < len {
            let chunk = self.read(len - buf.len(), timeout)?;
            if chunk.is_empty() {
                return Err(Error::ShortRead {
                    expected: len,
                    actual: buf.len(),
                });
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }
}

/// Scripted in-memory transport for tests.
#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::time::Duration;

    use dbi_proto::{FRAME_LEN, Frame};
    use nusb::transfer::TransferError;

    use super::Transport;
    use crate::{Error, Result};

    /// Replays queued inbound transfers and records outbound ones.
    ///
    /// Once the queue is empty every read fails as if the device had been
    /// unplugged.
    #[derive(Debug, Default)]
    pub(crate) struct MockTransport {
        inbound: VecDeque<Vec<u8>>,
        pub(crate) writes: Vec<Vec<u8>>,
        pub(crate) reads: usize,
        /// Fail every write after this many succeeded.
        pub(crate) fail_writes_after: Option<usize>,
    }

    impl MockTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Queues one inbound transfer.
        pub(crate) fn push(&mut self, bytes: impl Into<Vec<u8>>) -> &mut Self {
            self.inbound.push_back(bytes.into());
            self
        }

        pub(crate) fn push_frame(&mut self, frame: Frame) -> &mut Self {
            self.push(frame.encode().to_vec())
        }

        /// Inbound transfers not yet consumed.
        pub(crate) fn pending(&self) -> usize {
            self.inbound.len()
        }

        /// Decodes the `i`-th write as a frame header.
        pub(crate) fn frame_at(&self, i: usize) -> Frame {
            let bytes: &[u8; FRAME_LEN] = self.writes[i]
                .as_slice()
                .try_into()
                .unwrap_or_else(|_| panic!("write {i} is not a frame"));
            Frame::decode(bytes)
        }
    }

    impl Transport for MockTransport {
        fn read(&mut self, max_len: usize, _timeout: Duration) -> Result<Vec<u8>> {
            self.reads += 1;
            let Some(front) = self.inbound.front_mut() else {
                return Err(Error::Usb(TransferError::Disconnected));
            };
            if front.len() <= max_len {
                Ok(self.inbound.pop_front().unwrap_or_default())
            } else {
                let rest = front.split_off(max_len);
                Ok(std::mem::replace(front, rest))
            }
        }

        fn write(&mut self, data: &[u8], _timeout: Duration) -> Result<()> {
            if self.fail_writes_after.is_some_and(|n| self.writes.len() >= n) {
                return Err(Error::Usb(TransferError::Disconnected));
            }
            self.writes.push(data.to_vec());
            Ok(())
        }
    }
}
