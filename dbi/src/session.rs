//! Command loop for one device connection.
//!
//! The device drives every exchange. For `LIST` and `FILE_RANGE` the host
//! announces the payload length in a RESPONSE frame, waits for the
//! device's ACK, and only then sends the payload.

use dbi_proto::{CommandId, FRAME_LEN, FileRangeRequest, Frame};
use tracing::{debug, info, warn};

use crate::{Catalog, Error, NO_TIMEOUT, Result, SessionConfig, TitleCatalog, Transport, stream};

/// Outcome of processing one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Step {
    /// The transfer was not a frame with the protocol signature and was
    /// dropped.
    Ignored,
    /// A command completed; the session awaits the next one.
    Continue,
    /// The device ended the session.
    Exit,
}

/// Marker returned when a session ends through the `EXIT` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit;

/// State of one connection: the transport, its settings and the catalog
/// produced by the most recent `LIST`.
#[derive(Debug)]
pub struct Session<T> {
    /// Link to the device.
    transport: T,
    /// Session settings.
    config: SessionConfig,
    /// Result of the last `LIST`.
    catalog: Catalog,
}

impl<T: Transport> Session<T> {
    /// Starts a session with no catalog.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        Self {
            transport,
            config,
            catalog: Catalog::NoCatalog,
        }
    }

    /// Current catalog.
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Borrows the transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Consumes the session, returning the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Serves commands until the device sends `EXIT`.
    pub fn run(&mut self) -> Result<Exit> {
        info!(dir = %self.config.work_dir.display(), "entering command loop");
        loop {
            if self.poll()? == Step::Exit {
                return Ok(Exit);
            }
        }
    }

    /// Reads one inbound transfer and handles it as a command frame.
    pub fn poll(&mut self) -> Result<Step> {
        let Some(frame) = self.read_frame()? else {
            return Ok(Step::Ignored);
        };
        if !frame.has_valid_magic() {
            debug!(magic = ?frame.magic, "dropping frame without signature");
            return Ok(Step::Ignored);
        }
        debug!(
            kind = ?frame.kind,
            command = %frame.command,
            payload_len = frame.payload_len,
            "command"
        );

        match frame.command {
            CommandId::Exit => self.exit(),
            CommandId::List => {
                self.list()?;
                Ok(Step::Continue)
            }
            CommandId::FileRange => {
                self.file_range(frame.payload_len)?;
                Ok(Step::Continue)
            }
            other => {
                warn!(command = %other, "unsupported command, ending session");
                self.exit()
            }
        }
    }

    fn exit(&mut self) -> Result<Step> {
        info!("exit");
        self.send(Frame::response(CommandId::Exit, 0))?;
        Ok(Step::Exit)
    }

    fn list(&mut self) -> Result<()> {
        let titles = TitleCatalog::scan(&self.config.work_dir)?;
        let payload = titles.name_list_bytes();
        let len = u32::try_from(payload.len()).map_err(|_| Error::PayloadTooLarge(payload.len()))?;

        self.send(Frame::response(CommandId::List, len))?;
        self.recv_ack()?;
        self.transport.write(&payload, NO_TIMEOUT)?;

        info!(titles = titles.len(), bytes = len, "title list sent");
        self.catalog = Catalog::from(titles);
        Ok(())
    }

    fn file_range(&mut self, payload_len: u32) -> Result<()> {
        self.send(Frame::ack(CommandId::FileRange, payload_len))?;

        let payload = self.transport.read_exact(payload_len as usize, NO_TIMEOUT)?;
        let req = FileRangeRequest::parse(&payload)?;
        let path = self.catalog.resolve(&req.name, self.config.miss_policy)?;
        info!(
            name = %req.name,
            path = %path.display(),
            offset = req.offset,
            size = req.size,
            "file range"
        );

        self.send(Frame::response(CommandId::FileRange, req.size))?;
        self.recv_ack()?;
        stream::stream_range(&path, req.offset, u64::from(req.size), &mut self.transport)?;
        Ok(())
    }

    /// Reads one transfer as a header. Each transfer is a candidate frame on
    /// its own; anything but exactly [`FRAME_LEN`] bytes yields `None`.
    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let buf = self.transport.read(FRAME_LEN, NO_TIMEOUT)?;
        match Frame::decode_slice(&buf) {
            Ok(frame) => Ok(Some(frame)),
            Err(_) => {
                debug!(len = buf.len(), "dropping transfer that is not a frame");
                Ok(None)
            }
        }
    }

    /// Waits for the device's go-ahead. The transfer is logged, not checked.
    fn recv_ack(&mut self) -> Result<()> {
        if let Some(ack) = self.read_frame()? {
            debug!(
                kind = ?ack.kind,
                command = %ack.command,
                payload_len = ack.payload_len,
                "ack"
            );
        }
        Ok(())
    }

    fn send(&mut self, frame: Frame) -> Result<()> {
        self.transport.write(&frame.encode(), NO_TIMEOUT)
    }
}
