use std::io::Read;
use std::sync::Arc;

use sensorhub_frame::HubSession;
use sensorhub_runtime::{
    ChannelSink, HubDriver, HubEvent, LoggingBulkHandler, SessionConfig, Step, TaskPool,
};
use sensorhub_transport::{open_capture, TransferConfig};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cmd::ReplayArgs;
use crate::exit::{
    frame_error, runtime_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS,
};
use crate::output::{EventPrinter, OutputFormat, ReplaySummary};

// Events are drained after every transfer; one transfer holds at most
// u16::MAX / 3 library frames.
const EVENT_CAPACITY: usize = 32 * 1024;

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path).map_err(|err| runtime_error("config", err))?,
        None => SessionConfig::default(),
    };
    if args.low_power {
        config.hub.low_power_mode = true;
    }
    if let Some(name) = &args.session {
        config.hub.session_name = name.clone();
    }

    let reader = open_capture(
        &args.capture,
        TransferConfig {
            max_transfer_size: config.hub.max_transfer_size,
        },
    )
    .map_err(|err| transport_error("open capture failed", err))?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|err| CliError::new(INTERNAL, format!("runtime setup failed: {err}")))?;

    let (sink, events) = ChannelSink::new(EVENT_CAPACITY);
    let sink = Arc::new(sink);
    let pool = TaskPool::new(runtime.handle().clone(), Arc::new(LoggingBulkHandler));
    let session = HubSession::new(&config.hub, sink.clone(), Arc::new(pool.clone()))
        .with_library_handler(sink.clone());
    let mut driver = HubDriver::new(reader, session);
    let mut printer = EventPrinter::new(format);

    info!(capture = %args.capture.display(), session = %config.hub.session_name, "replaying capture");
    let (mut summary, failure) = runtime.block_on(async {
        let outcome = replay(&mut driver, events, &mut printer, &args).await;
        pool.wait_idle().await;
        outcome
    });
    printer.finish();

    if let Some(err) = failure {
        return Err(err);
    }

    summary.events_dropped = sink.dropped();
    summary.jobs_completed = pool.completed();
    summary.jobs_failed = pool.failed();
    summary.session = driver.session().stats();
    printer.summary(&summary);

    Ok(SUCCESS)
}

async fn replay<R: Read>(
    driver: &mut HubDriver<R>,
    mut events: mpsc::Receiver<HubEvent>,
    printer: &mut EventPrinter,
    args: &ReplayArgs,
) -> (ReplaySummary, Option<CliError>) {
    let mut summary = ReplaySummary::default();

    loop {
        let step = match driver.step().await {
            Ok(step) => step,
            Err(err) => return (summary, Some(runtime_error("replay failed", err))),
        };

        match step {
            Step::Parsed(parsed) => {
                summary.transfers += 1;
                debug!(transfer = summary.transfers, consumed = parsed.consumed, "transfer parsed");
            }
            Step::Rejected(err) => {
                summary.transfers += 1;
                summary.rejected += 1;
                let transfer = summary.transfers;
                if drain(&mut events, printer, &mut summary, args.count, transfer) {
                    return (summary, None);
                }
                if !args.keep_going {
                    let context = format!("transfer {transfer}");
                    return (summary, Some(frame_error(&context, err)));
                }
                printer.rejected(transfer, &err);
                continue;
            }
            Step::TimedOut { .. } => continue,
            Step::End => break,
        }

        let transfer = summary.transfers;
        if drain(&mut events, printer, &mut summary, args.count, transfer) {
            break;
        }
    }

    (summary, None)
}

// Print queued events. Returns true once `count` events have been printed.
fn drain(
    events: &mut mpsc::Receiver<HubEvent>,
    printer: &mut EventPrinter,
    summary: &mut ReplaySummary,
    count: Option<u64>,
    transfer: u64,
) -> bool {
    while let Ok(event) = events.try_recv() {
        printer.event(transfer, &event);
        summary.events += 1;
        if count.is_some_and(|count| summary.events >= count) {
            return true;
        }
    }
    false
}
