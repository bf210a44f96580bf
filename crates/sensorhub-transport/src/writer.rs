use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::codec::encode_transfer;
use crate::error::{Result, TransportError};

/// Writes hub transfers in capture format to any `Write` stream.
///
/// Used to record captures for later replay.
pub struct TransferWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> TransferWriter<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(1024),
        }
    }

    /// Encode and write one transfer (blocking).
    pub fn write_transfer(&mut self, transfer: &[u8]) -> Result<()> {
        self.buf.clear();
        encode_transfer(transfer, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(TransportError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        self.inner.flush().map_err(TransportError::Io)
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::reader::TransferReader;

    #[test]
    fn recorded_capture_replays() {
        let mut writer = TransferWriter::new(Vec::new());
        writer.write_transfer(&[0x06]).unwrap();
        writer.write_transfer(&[0x04, 0, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let wire = writer.into_inner();
        assert_eq!(wire.len(), 2 + 1 + 2 + 10);

        let mut reader = TransferReader::new(Cursor::new(wire));
        assert_eq!(reader.read_transfer().unwrap().unwrap().len(), 1);
        assert_eq!(reader.read_transfer().unwrap().unwrap().len(), 10);
        assert!(reader.read_transfer().unwrap().is_none());
    }

    #[test]
    fn zero_length_write_is_connection_closed() {
        struct Full;
        impl Write for Full {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Ok(0)
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let mut writer = TransferWriter::new(Full);
        let err = writer.write_transfer(&[0x06]).unwrap_err();
        assert!(matches!(err, TransportError::ConnectionClosed));
    }
}
