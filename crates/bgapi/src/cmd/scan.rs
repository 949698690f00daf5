use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bgapi_event::{ChannelObserver, Event};
use tracing::{debug, warn};

use crate::cmd::{install_ctrlc_handler, open_device, parse_duration, ScanArgs};
use crate::exit::{driver_error, CliResult, SUCCESS};
use crate::output::{print_event, print_event_table, OutputFormat};

const POLL: Duration = Duration::from_millis(100);

pub fn run(args: ScanArgs, format: OutputFormat) -> CliResult<i32> {
    let duration = parse_duration(&args.duration)?;
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let (tx, rx) = mpsc::channel();
    let driver = open_device(&args.device, ChannelObserver::new(tx))?;

    driver
        .gap_set_scan_parameters(args.interval, args.window, args.active)
        .map_err(|err| driver_error("set_scan_parameters failed", err))?;
    driver
        .gap_discover(args.mode)
        .map_err(|err| driver_error("discover failed", err))?;

    let deadline = Instant::now().checked_add(duration);
    let mut seen = HashSet::new();
    let mut collected = Vec::new();

    while running.load(Ordering::SeqCst) {
        let wait = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                POLL.min(deadline - now)
            }
            None => POLL,
        };
        let event = match rx.recv_timeout(wait) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let Event::GapScanResponse(response) = &event else {
            debug!(name = event.name(), "non-scan event during discovery");
            continue;
        };
        if args.unique && !seen.insert(response.sender) {
            continue;
        }
        match format {
            OutputFormat::Table => collected.push(event),
            _ => print_event(&event, format),
        }
    }

    if let Err(err) = driver.gap_end_procedure() {
        warn!(error = %err, "failed to stop discovery");
    }
    driver.shutdown();

    if matches!(format, OutputFormat::Table) {
        print_event_table(&collected);
    }
    Ok(SUCCESS)
}
