//! Write a small demo capture for the `replay` command.
//!
//! Run with:
//!   cargo run --example record-capture -- /tmp/hub.cap
//!
//! Then:
//!   cargo run --features cli -- replay /tmp/hub.cap --format pretty

use sensorhub::transport::create_capture;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/tmp/sensorhub-demo.cap".to_string());
    let mut writer = create_capture(&path)?;

    writer.write_transfer(&[0x06])?;
    for step in 0..10i16 {
        let mut transfer = vec![0x37, 0x00];
        for axis in [step, -step, 1000] {
            transfer.extend_from_slice(&axis.to_le_bytes());
        }
        transfer.extend_from_slice(&(i32::from(step) * 20_000).to_le_bytes());

        let text = format!("tick {step}");
        transfer.push(0x03);
        transfer.push(text.len() as u8);
        transfer.extend_from_slice(text.as_bytes());

        writer.write_transfer(&transfer)?;
    }

    eprintln!("wrote {path}");
    Ok(())
}
