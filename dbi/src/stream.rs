//! Chunked streaming of a file byte range to the device.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, info};

use crate::{NO_TIMEOUT, Result, Transport};

/// Largest single bulk write issued while streaming (1 MiB).
pub const CHUNK_SIZE: usize = 0x10_0000;

/// Writes `total` bytes of `path`, starting at `offset`, to `transport`.
///
/// Returns the number of bytes written, which always equals `total` on
/// success. A file that ends inside the range fails with
/// [`std::io::ErrorKind::UnexpectedEof`]. The file is closed on return.
pub fn stream_range<T: Transport + ?Sized>(
    path: &Path,
    offset: u64,
    total: u64,
    transport: &mut T,
) -> Result<u64> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let sent = stream_reader(&mut file, total, transport)?;
    info!(path = %path.display(), offset, bytes = sent, "range sent");
    Ok(sent)
}

/// Copies exactly `total` bytes from `reader` to `transport` in chunks of
/// at most [`CHUNK_SIZE`].
pub fn stream_reader<R: Read + ?Sized, T: Transport + ?Sized>(
    reader: &mut R,
    total: u64,
    transport: &mut T,
) -> Result<u64> {
    let mut buf = vec![0u8; chunk_len(total)];
    let mut sent = 0u64;
    while sent < total {
        let chunk = &mut buf[..chunk_len(total - sent)];
        reader.read_exact(chunk)?;
        transport.write(chunk, NO_TIMEOUT)?;
        sent += chunk.len() as u64;
        debug!(sent, total, "chunk written");
    }
    Ok(sent)
}

/// Size of the next chunk when `remaining` bytes are left.
fn chunk_len(remaining: u64) -> usize {
    usize::try_from(remaining).map_or(CHUNK_SIZE, |r| r.min(CHUNK_SIZE))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::{Cursor, ErrorKind};

    use super::*;
    use crate::Error;
    use crate::transport::mock::MockTransport;

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn splits_into_bounded_chunks() {
        let total = 2 * CHUNK_SIZE + 1234;
        let data = pattern(total);
        let mut t = MockTransport::new();

        let sent = stream_reader(&mut Cursor::new(&data), total as u64, &mut t).unwrap();

        assert_eq!(sent, total as u64);
        let sizes: Vec<usize> = t.writes.iter().map(Vec::len).collect();
        assert_eq!(sizes, [CHUNK_SIZE, CHUNK_SIZE, 1234]);
        assert_eq!(t.writes.concat(), data);
    }

    #[test]
    fn exact_multiple_ends_with_full_chunk() {
        let data = pattern(2 * CHUNK_SIZE);
        let mut t = MockTransport::new();
        stream_reader(&mut Cursor::new(&data), data.len() as u64, &mut t).unwrap();
        assert_eq!(t.writes.len(), 2);
        assert!(t.writes.iter().all(|w| w.len() == CHUNK_SIZE));
    }

    #[test]
    fn zero_total_writes_nothing() {
        let mut t = MockTransport::new();
        let sent = stream_reader(&mut Cursor::new(b"abc"), 0, &mut t).unwrap();
        assert_eq!(sent, 0);
        assert!(t.writes.is_empty());
    }

    #[test]
    fn range_starts_at_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("game.nsp");
        let data = pattern(5000);
        std::fs::write(&path, &data).unwrap();

        let mut t = MockTransport::new();
        let sent = stream_range(&path, 1000, 3000, &mut t).unwrap();

        assert_eq!(sent, 3000);
        assert_eq!(t.writes.concat(), &data[1000..4000]);
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut t = MockTransport::new();
        let err = stream_range(&dir.path().join("absent.nsp"), 0, 10, &mut t).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == ErrorKind::NotFound));
        assert!(t.writes.is_empty());
    }

    #[test]
    fn range_past_end_of_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.nsp");
        std::fs::write(&path, pattern(100)).unwrap();

        let mut t = MockTransport::new();
        let err = stream_range(&path, 50, 100, &mut t).unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == ErrorKind::UnexpectedEof));
    }

    #[test]
    fn write_failure_aborts_without_retry() {
        let data = pattern(3 * CHUNK_SIZE);
        let mut t = MockTransport::new();
        t.fail_writes_after = Some(1);
        let err = stream_reader(&mut Cursor::new(&data), data.len() as u64, &mut t).unwrap_err();
        assert!(err.is_connection_loss());
        assert_eq!(t.writes.len(), 1);
    }
}
