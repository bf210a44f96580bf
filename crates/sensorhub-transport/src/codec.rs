use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, TransportError};

/// Transfer header: a single little-endian `u16` length.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Largest transfer the length prefix can describe.
pub const MAX_TRANSFER: usize = u16::MAX as usize;

/// Encode one transfer into the capture format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬─────────────────────┐
/// │ Length       │ Transfer bytes      │
/// │ (2B LE)      │ (Length bytes)      │
/// └──────────────┴─────────────────────┘
/// ```
pub fn encode_transfer(transfer: &[u8], dst: &mut BytesMut) -> Result<()> {
    if transfer.len() > MAX_TRANSFER {
        return Err(TransportError::TransferTooLarge {
            size: transfer.len(),
            max: MAX_TRANSFER,
        });
    }
    dst.reserve(LENGTH_PREFIX_SIZE + transfer.len());
    dst.put_u16_le(transfer.len() as u16);
    dst.put_slice(transfer);
    Ok(())
}

/// Decode one transfer from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete transfer yet.
/// On success, consumes the transfer bytes from the buffer.
pub fn decode_transfer(src: &mut BytesMut, max_transfer: usize) -> Result<Option<Bytes>> {
    if src.len() < LENGTH_PREFIX_SIZE {
        return Ok(None);
    }

    let len = u16::from_le_bytes([src[0], src[1]]) as usize;
    if len > max_transfer {
        return Err(TransportError::TransferTooLarge {
            size: len,
            max: max_transfer,
        });
    }

    if src.len() < LENGTH_PREFIX_SIZE + len {
        return Ok(None);
    }

    src.advance(LENGTH_PREFIX_SIZE);
    Ok(Some(src.split_to(len).freeze()))
}

/// Configuration for transfer reading.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Maximum accepted transfer size in bytes. Default: [`MAX_TRANSFER`].
    pub max_transfer_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_transfer_size: MAX_TRANSFER,
        }
    }
}
