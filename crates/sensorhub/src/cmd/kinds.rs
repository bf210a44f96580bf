use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use sensorhub_frame::{BulkDispatcher, BulkType, DecoderRegistry, SensorKind};
use serde::Serialize;

use crate::cmd::KindsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct SensorRow {
    index: u8,
    name: &'static str,
    payload_size: Option<usize>,
}

#[derive(Serialize)]
struct BulkRow {
    index: u8,
    name: &'static str,
    job: Option<&'static str>,
}

#[derive(Serialize)]
struct KindsOutput {
    sensors: Vec<SensorRow>,
    bulk_types: Vec<BulkRow>,
}

pub fn run(args: KindsArgs, format: OutputFormat) -> CliResult<i32> {
    let out = collect(&args);

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut sensors = Table::new();
            sensors
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "SENSOR", "PAYLOAD"]);
            for row in &out.sensors {
                sensors.add_row(vec![
                    row.index.to_string(),
                    row.name.to_string(),
                    size_label(row.payload_size),
                ]);
            }
            println!("{sensors}");

            let mut bulk = Table::new();
            bulk.load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INDEX", "BULK TYPE", "JOB"]);
            for row in &out.bulk_types {
                bulk.add_row(vec![
                    row.index.to_string(),
                    row.name.to_string(),
                    row.job.unwrap_or("rejected").to_string(),
                ]);
            }
            println!("{bulk}");
        }
        OutputFormat::Pretty => {
            for row in &out.sensors {
                println!(
                    "sensor {:>2} {} payload={}",
                    row.index,
                    row.name,
                    size_label(row.payload_size)
                );
            }
            for row in &out.bulk_types {
                println!(
                    "bulk {} {} job={}",
                    row.index,
                    row.name,
                    row.job.unwrap_or("rejected")
                );
            }
        }
    }

    Ok(SUCCESS)
}

fn collect(args: &KindsArgs) -> KindsOutput {
    let registry = DecoderRegistry::new(!args.no_heart_rate);
    let dispatcher = BulkDispatcher::new(!args.no_voice);

    let sensors = SensorKind::ALL
        .iter()
        .map(|&kind| SensorRow {
            index: kind.index(),
            name: kind.name(),
            payload_size: registry.decoder(kind).payload_size(),
        })
        .collect();
    let bulk_types = BulkType::ALL
        .iter()
        .map(|&bulk_type| BulkRow {
            index: bulk_type.index(),
            name: bulk_type.name(),
            job: dispatcher.job_kind(bulk_type.index()).map(|kind| kind.name()),
        })
        .collect();

    KindsOutput {
        sensors,
        bulk_types,
    }
}

fn size_label(size: Option<usize>) -> String {
    size.map_or_else(|| "unsupported".to_string(), |size| format!("{size} bytes"))
}
