use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bgapi_event::ChannelObserver;
use tracing::info;

use crate::cmd::{install_ctrlc_handler, open_device, parse_duration, MonitorArgs};
use crate::exit::{driver_error, CliResult, SUCCESS};
use crate::output::{print_event, OutputFormat};

const POLL: Duration = Duration::from_millis(100);

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let deadline = match &args.duration {
        // past the representable range: run until interrupted
        Some(input) => Instant::now().checked_add(parse_duration(input)?),
        None => None,
    };
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let (tx, rx) = mpsc::channel();
    let driver = open_device(&args.device, ChannelObserver::new(tx))?;

    if args.reset {
        driver
            .system_reset(false)
            .map_err(|err| driver_error("reset failed", err))?;
    }

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        let event = match rx.recv_timeout(POLL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        print_event(&event, format);
        printed = printed.saturating_add(1);
        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    let stats = driver.stats();
    info!(
        events = printed,
        frames = stats.frames,
        ignored = stats.events_ignored,
        read_errors = stats.read_errors,
        "monitor finished"
    );
    driver.shutdown();
    Ok(SUCCESS)
}
