use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use sensorhub_frame::{FrameError, HubNotice, SamplePayload, SessionStats};
use sensorhub_runtime::HubEvent;
use serde::Serialize;

const PREVIEW_BYTES: usize = 16;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// Totals printed once a replay ends.
#[derive(Debug, Default, Serialize)]
pub struct ReplaySummary {
    pub transfers: u64,
    pub rejected: u64,
    pub events: u64,
    pub events_dropped: u64,
    pub jobs_completed: u64,
    pub jobs_failed: u64,
    pub session: SessionStats,
}

#[derive(Serialize)]
struct EventOutput<'a> {
    transfer: u64,
    #[serde(flatten)]
    event: &'a HubEvent,
}

#[derive(Serialize)]
struct RejectedOutput<'a> {
    event: &'static str,
    transfer: u64,
    offset: usize,
    error: &'a str,
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    event: &'static str,
    #[serde(flatten)]
    summary: &'a ReplaySummary,
}

/// Streams decoded events to stdout. Table output is collected and printed
/// as one table by [`EventPrinter::finish`].
pub struct EventPrinter {
    format: OutputFormat,
    rows: Vec<[String; 4]>,
}

impl EventPrinter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            rows: Vec::new(),
        }
    }

    pub fn event(&mut self, transfer: u64, event: &HubEvent) {
        let (kind, timestamp, detail) = describe(event);
        match self.format {
            OutputFormat::Json => print_json(&EventOutput { transfer, event }),
            OutputFormat::Table => self.rows.push([transfer.to_string(), kind, timestamp, detail]),
            OutputFormat::Pretty => {
                println!("transfer={transfer} {kind} ts={timestamp} {detail}");
            }
        }
    }

    pub fn rejected(&mut self, transfer: u64, err: &FrameError) {
        let message = err.to_string();
        match self.format {
            OutputFormat::Json => print_json(&RejectedOutput {
                event: "rejected",
                transfer,
                offset: err.offset(),
                error: &message,
            }),
            OutputFormat::Table => self.rows.push([
                transfer.to_string(),
                "rejected".to_string(),
                "-".to_string(),
                message,
            ]),
            OutputFormat::Pretty => println!("transfer={transfer} rejected {message}"),
        }
    }

    /// Flush collected table rows.
    pub fn finish(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["TRANSFER", "EVENT", "TIMESTAMP_NS", "DETAIL"]);
        for row in self.rows.drain(..) {
            table.add_row(row.to_vec());
        }
        println!("{table}");
    }

    pub fn summary(&self, summary: &ReplaySummary) {
        match self.format {
            OutputFormat::Json => print_json(&SummaryOutput {
                event: "summary",
                summary,
            }),
            OutputFormat::Table => {
                let mut table = Table::new();
                table
                    .load_preset(UTF8_FULL)
                    .set_content_arrangement(ContentArrangement::Dynamic)
                    .set_header(vec!["METRIC", "VALUE"]);
                for (name, value) in summary_rows(summary) {
                    table.add_row(vec![name.to_string(), value.to_string()]);
                }
                println!("{table}");
            }
            OutputFormat::Pretty => {
                let line = summary_rows(summary)
                    .iter()
                    .map(|(name, value)| format!("{name}={value}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("summary {line}");
            }
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn summary_rows(summary: &ReplaySummary) -> [(&'static str, u64); 10] {
    [
        ("transfers", summary.transfers),
        ("rejected", summary.rejected),
        ("events", summary.events),
        ("events_dropped", summary.events_dropped),
        ("samples", summary.session.samples),
        ("library_payloads", summary.session.library_payloads),
        ("bulk_submitted", summary.session.bulk_submitted),
        ("bulk_rejected", summary.session.bulk_rejected),
        ("unknown_tags", summary.session.unknown_tags),
        ("time_syncs", summary.session.time_syncs),
    ]
}

fn describe(event: &HubEvent) -> (String, String, String) {
    match event {
        HubEvent::Sample(sample) => (
            sample.kind.name().to_string(),
            sample.timestamp_ns.to_string(),
            payload_values(&sample.payload),
        ),
        HubEvent::Library { payload } => (
            "library".to_string(),
            "-".to_string(),
            format!("{} bytes {}", payload.len(), hex_preview(payload)),
        ),
        HubEvent::Notice { notice } => (
            "notice".to_string(),
            "-".to_string(),
            match notice {
                HubNotice::Reset => "reset".to_string(),
            },
        ),
    }
}

pub fn payload_values(payload: &SamplePayload) -> String {
    match payload {
        SamplePayload::Motion { x, y, z } => format!("x={x} y={y} z={z}"),
        SamplePayload::HeartRateRaw { ch_a, ch_b } => format!("ch_a={ch_a} ch_b={ch_b}"),
        SamplePayload::HeartRateRawFactory { values } => format!("values={values:?}"),
        SamplePayload::HeartRateLibrary {
            heart_rate,
            rr_interval,
            snr,
        } => format!("hr={heart_rate} rr={rr_interval} snr={snr}"),
    }
}

fn hex_preview(bytes: &[u8]) -> String {
    let mut out: String = bytes
        .iter()
        .take(PREVIEW_BYTES)
        .map(|b| format!("{b:02x}"))
        .collect();
    if bytes.len() > PREVIEW_BYTES {
        out.push_str("..");
    }
    out
}
