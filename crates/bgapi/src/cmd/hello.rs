use std::time::Instant;

use bgapi_event::NoopObserver;
use serde::Serialize;
use tracing::debug;

use crate::cmd::{open_device, HelloArgs};
use crate::exit::{driver_error, CliResult, SUCCESS};
use crate::output::{print_json, print_kv_pretty, print_kv_table, OutputFormat};

#[derive(Serialize)]
struct HelloOutput {
    round_trips: u32,
    min_ms: f64,
    avg_ms: f64,
    max_ms: f64,
}

pub fn run(args: HelloArgs, format: OutputFormat) -> CliResult<i32> {
    let driver = open_device(&args.device, NoopObserver)?;

    let count = args.count.max(1);
    let mut samples = Vec::with_capacity(count as usize);
    for seq in 0..count {
        let start = Instant::now();
        driver
            .system_hello()
            .map_err(|err| driver_error("hello failed", err))?;
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(seq, ms, "hello answered");
        samples.push(ms);
    }
    driver.shutdown();

    let out = summarize(&samples);
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_kv_table(&rows(&out)),
        OutputFormat::Pretty => print_kv_pretty("Hello", &rows(&out)),
    }
    Ok(SUCCESS)
}

fn summarize(samples: &[f64]) -> HelloOutput {
    let round = |v: f64| (v * 100.0).round() / 100.0;
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(0.0, f64::max);
    let avg = samples.iter().sum::<f64>() / samples.len().max(1) as f64;
    HelloOutput {
        round_trips: samples.len() as u32,
        min_ms: round(if min.is_finite() { min } else { 0.0 }),
        avg_ms: round(avg),
        max_ms: round(max),
    }
}

fn rows(out: &HelloOutput) -> Vec<(&'static str, String)> {
    vec![
        ("round trips", out.round_trips.to_string()),
        ("min", format!("{:.2}ms", out.min_ms)),
        ("avg", format!("{:.2}ms", out.avg_ms)),
        ("max", format!("{:.2}ms", out.max_ms)),
    ]
}
