//! Transfer framing for sensor hub captures and bridge streams.
//!
//! The hub hands the host one transfer at a time. On the wire of a capture
//! file or a bridge socket each transfer is stored as:
//! - A 2-byte little-endian transfer length
//! - The transfer bytes themselves
//!
//! This is the lowest layer of sensorhub. The frame dispatcher consumes the
//! `(buffer, length)` units produced here.

pub mod capture;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use capture::{create_capture, open_capture};
pub use codec::{decode_transfer, encode_transfer, TransferConfig, LENGTH_PREFIX_SIZE, MAX_TRANSFER};
pub use error::{Result, TransportError};
pub use reader::TransferReader;
pub use writer::TransferWriter;
