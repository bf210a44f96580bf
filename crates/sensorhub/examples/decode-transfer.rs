//! Decode one hand-built transfer and print what the session saw.
//!
//! Run with:
//!   cargo run --example decode-transfer

use std::sync::Arc;

use sensorhub::frame::{BulkJob, HubConfig, HubSession, JobService, ReportSink, SensorSample};

struct PrintSink;

impl ReportSink for PrintSink {
    fn report(&self, sample: &SensorSample) {
        println!(
            "{:<14} ts={} {:?}",
            sample.kind.name(),
            sample.timestamp_ns,
            sample.payload
        );
    }
}

struct PrintJobs;

impl JobService for PrintJobs {
    fn submit(&self, job: BulkJob) {
        println!(
            "bulk job {} ({} bytes at {:#010x})",
            job.kind.name(),
            job.length,
            job.address
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut session = HubSession::new(&HubConfig::default(), Arc::new(PrintSink), Arc::new(PrintJobs));

    let mut transfer = vec![0x37, 0x00, 0x10, 0x00, 0xF0, 0xFF, 0x00, 0x04];
    transfer.extend_from_slice(&500i32.to_le_bytes());
    transfer.extend_from_slice(&[0x37, 0x01, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00]);
    transfer.extend_from_slice(&(-250i32).to_le_bytes());
    transfer.extend_from_slice(&[0x04, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x30]);
    transfer.push(0x06);

    let summary = session.parse(&transfer)?;
    println!("{summary:?}");
    println!("time base now {}", session.time_base().as_nanos());

    Ok(())
}
