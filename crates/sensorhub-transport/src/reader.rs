use std::io::{ErrorKind, Read};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::codec::{decode_transfer, TransferConfig};
use crate::error::{Result, TransportError};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete hub transfers from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete transfers.
pub struct TransferReader<T> {
    inner: T,
    buf: BytesMut,
    config: TransferConfig,
    transfers: u64,
}

impl<T: Read> TransferReader<T> {
    /// Create a new transfer reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, TransferConfig::default())
    }

    /// Create a new transfer reader with explicit configuration.
    pub fn with_config(inner: T, config: TransferConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            transfers: 0,
        }
    }

    /// Read the next complete transfer (blocking).
    ///
    /// Returns `Ok(None)` when the stream ends cleanly on a transfer boundary
    /// and `Err(TransportError::ConnectionClosed)` when it ends mid-transfer.
    /// Read timeouts on the underlying stream surface as
    /// `Err(TransportError::Timeout)`; buffered bytes are kept for the next call.
    pub fn read_transfer(&mut self) -> Result<Option<Bytes>> {
        loop {
            if let Some(transfer) = decode_transfer(&mut self.buf, self.config.max_transfer_size)? {
                self.transfers += 1;
                trace!(len = transfer.len(), index = self.transfers, "hub transfer");
                return Ok(Some(transfer));
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    return Err(TransportError::Timeout)
                }
                Err(err) => return Err(TransportError::Io(err)),
            };

            if read == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(TransportError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Number of complete transfers returned so far.
    pub fn transfers_read(&self) -> u64 {
        self.transfers
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current transfer reader configuration.
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }
}

impl<T: Read> Iterator for TransferReader<T> {
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_transfer().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::encode_transfer;

    fn capture(transfers: &[&[u8]]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        for transfer in transfers {
            encode_transfer(transfer, &mut wire).unwrap();
        }
        wire.to_vec()
    }

    #[test]
    fn read_single_transfer() {
        let mut reader = TransferReader::new(Cursor::new(capture(&[&[0x06]])));
        let transfer = reader.read_transfer().unwrap().unwrap();
        assert_eq!(transfer.as_ref(), &[0x06]);
        assert!(reader.read_transfer().unwrap().is_none());
        assert_eq!(reader.transfers_read(), 1);
    }

    #[test]
    fn iterates_all_transfers() {
        let wire = capture(&[&[0x06], &[0xFF, 0x06], &[0x03, 0x02, b'o', b'k']]);
        let reader = TransferReader::new(Cursor::new(wire));
        let lens: Vec<usize> = reader.map(|t| t.unwrap().len()).collect();
        assert_eq!(lens, vec![1, 2, 4]);
    }

    #[test]
    fn empty_stream_is_clean_end() {
        let mut reader = TransferReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(reader.read_transfer().unwrap().is_none());
    }

    #[test]
    fn eof_mid_transfer_is_connection_closed() {
        let mut wire = capture(&[&[0x37, 0x00, 1, 2, 3]]);
        wire.truncate(4);
        let mut reader = TransferReader::new(Cursor::new(wire));
        let err = reader.read_transfer().unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed));
    }

    #[test]
    fn byte_by_byte_stream() {
        let reader = ByteByByteReader {
            bytes: capture(&[&[0x01, 0x02, 0x00, 0xAA, 0xBB]]),
            pos: 0,
        };
        let mut reader = TransferReader::new(reader);
        let transfer = reader.read_transfer().unwrap().unwrap();
        assert_eq!(transfer.as_ref(), &[0x01, 0x02, 0x00, 0xAA, 0xBB]);
    }

    #[test]
    fn oversized_transfer_in_stream() {
        let cfg = TransferConfig {
            max_transfer_size: 4,
        };
        let mut reader =
            TransferReader::with_config(Cursor::new(capture(&[&[0u8; 8]])), cfg);
        let err = reader.read_transfer().unwrap_err();
        assert!(matches!(err, TransportError::TransferTooLarge { size: 8, max: 4 }));
    }

    #[test]
    fn would_block_maps_to_timeout_and_keeps_buffer() {
        let wire = capture(&[&[0x06, 0x06]]);
        let reader = StallingReader {
            bytes: wire,
            pos: 0,
            stalled: false,
        };
        let mut reader = TransferReader::new(reader);

        let err = reader.read_transfer().unwrap_err();
        assert!(err.is_timeout());

        let transfer = reader.read_transfer().unwrap().unwrap();
        assert_eq!(transfer.as_ref(), &[0x06, 0x06]);
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(capture(&[&[0x06]])),
        };
        let mut reader = TransferReader::new(reader);
        assert_eq!(reader.read_transfer().unwrap().unwrap().as_ref(), &[0x06]);
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    /// Delivers the first byte, then stalls once with `WouldBlock`.
    struct StallingReader {
        bytes: Vec<u8>,
        pos: usize,
        stalled: bool,
    }

    impl Read for StallingReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos == 1 && !self.stalled {
                self.stalled = true;
                return Err(std::io::Error::from(ErrorKind::WouldBlock));
            }
            if self.pos >= self.bytes.len() {
                return Ok(0);
            }
            let n = if self.pos == 0 {
                1
            } else {
                (self.bytes.len() - self.pos).min(buf.len())
            };
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
