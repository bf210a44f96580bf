use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::debug;

use crate::codec::TransferConfig;
use crate::error::{Result, TransportError};
use crate::reader::TransferReader;
use crate::writer::TransferWriter;

/// Open a recorded capture for replay.
pub fn open_capture(
    path: impl AsRef<Path>,
    config: TransferConfig,
) -> Result<TransferReader<BufReader<File>>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TransportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "opened capture");
    Ok(TransferReader::with_config(BufReader::new(file), config))
}

/// Create (or truncate) a capture file for recording.
pub fn create_capture(path: impl AsRef<Path>) -> Result<TransferWriter<BufWriter<File>>> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| TransportError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "created capture");
    Ok(TransferWriter::new(BufWriter::new(file)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_capture_names_the_path() {
        let err = open_capture("/nonexistent/hub.cap", TransferConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, TransportError::Open { .. }));
        assert!(err.to_string().contains("/nonexistent/hub.cap"));
    }

    #[test]
    fn recorded_file_replays() {
        let path = std::env::temp_dir().join(format!("sensorhub-capture-{}.cap", std::process::id()));
        {
            let mut writer = create_capture(&path).unwrap();
            writer.write_transfer(&[0x06]).unwrap();
            writer.write_transfer(&[0xFF, 0xFF]).unwrap();
        }

        let mut reader = open_capture(&path, TransferConfig::default()).unwrap();
        assert_eq!(reader.read_transfer().unwrap().unwrap().as_ref(), &[0x06]);
        assert_eq!(reader.read_transfer().unwrap().unwrap().as_ref(), &[0xFF, 0xFF]);
        assert!(reader.read_transfer().unwrap().is_none());

        std::fs::remove_file(&path).unwrap();
    }
}
