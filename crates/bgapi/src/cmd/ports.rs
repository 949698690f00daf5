use bgapi_transport::available_ports;
use serde::Serialize;

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct PortOutput {
    name: String,
    kind: &'static str,
}

pub fn run(_args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = available_ports().map_err(|err| transport_error("port enumeration failed", err))?;
    let out: Vec<PortOutput> = ports
        .into_iter()
        .map(|port| PortOutput {
            name: port.name,
            kind: port.kind.as_str(),
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = comfy_table::Table::new();
            table
                .load_preset(comfy_table::presets::UTF8_FULL)
                .set_header(vec!["PORT", "KIND"]);
            for port in &out {
                table.add_row(vec![port.name.clone(), port.kind.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if out.is_empty() {
                println!("no serial ports found");
            }
            for port in &out {
                println!("{} [{}]", port.name, port.kind);
            }
        }
    }
    Ok(SUCCESS)
}
