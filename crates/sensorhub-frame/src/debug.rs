use tracing::debug;

use crate::hooks::DebugExtractor;

/// Debug text as emitted by the hub firmware: `[len: u8][len bytes of text]`.
///
/// The text is logged under the `sensorhub::mcu` target at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct McuDebugText;

impl DebugExtractor for McuDebugText {
    fn extract(&self, rest: &[u8]) -> Result<usize, String> {
        let Some((&len, text)) = rest.split_first() else {
            return Err("missing length byte".to_string());
        };
        let len = len as usize;
        if len == 0 {
            return Err("zero-length debug text".to_string());
        }
        if len > text.len() {
            return Err(format!(
                "debug text length {len} exceeds {} remaining bytes",
                text.len()
            ));
        }

        let text = String::from_utf8_lossy(&text[..len]);
        debug!(target: "sensorhub::mcu", "{}", text.trim_end_matches('\0'));
        Ok(1 + len)
    }
}
