use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use bgapi_event::Event;
use bgapi_frame::category_name;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;

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

#[derive(Serialize)]
struct EventOutput<'a> {
    category: &'static str,
    timestamp: String,
    #[serde(flatten)]
    event: &'a Event,
}

/// Streaming commands print one line per event in every format; `table`
/// falls back to `pretty` so rows appear as they arrive.
pub fn print_event(event: &Event, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = EventOutput {
                category: category_name(event.key().0),
                timestamp: now_unix_seconds(),
                event,
            };
            print_json(&out);
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{} {}", event.name(), event_fields(event));
        }
    }
}

/// Render events collected up front as one table.
pub fn print_event_table(events: &[Event]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["EVENT", "CATEGORY", "FIELDS"]);
    for event in events {
        table.add_row(vec![
            event.name().to_string(),
            category_name(event.key().0).to_string(),
            event_fields(event),
        ]);
    }
    println!("{table}");
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

/// Two-column key/value table.
pub fn print_kv_table(rows: &[(&str, String)]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["FIELD", "VALUE"]);
    for (key, value) in rows {
        table.add_row(vec![key.to_string(), value.clone()]);
    }
    println!("{table}");
}

pub fn print_kv_pretty(title: &str, rows: &[(&str, String)]) {
    println!("{title}:");
    let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in rows {
        println!("  {key:<width$}  {value}");
    }
}

/// `key=value` pairs for every field of an event, sorted by key.
pub fn event_fields(event: &Event) -> String {
    let Ok(Value::Object(map)) = serde_json::to_value(event) else {
        return String::new();
    };
    map.iter()
        .filter(|(key, _)| key.as_str() != "event")
        .map(|(key, value)| format!("{key}={}", flat_value(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn flat_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}:{}", flat_value(v)))
            .collect::<Vec<_>>()
            .join(","),
        other => other.to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
