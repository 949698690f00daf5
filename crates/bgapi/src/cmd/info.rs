use bgapi_event::{NoopObserver, SystemInfo};
use serde::Serialize;

use crate::cmd::{open_device, InfoArgs};
use crate::exit::{driver_error, CliResult, SUCCESS};
use crate::output::{print_json, print_kv_pretty, print_kv_table, OutputFormat};

#[derive(Serialize)]
struct InfoOutput {
    address: String,
    firmware: String,
    #[serde(flatten)]
    info: SystemInfo,
    max_connections: u8,
}

pub fn run(args: InfoArgs, format: OutputFormat) -> CliResult<i32> {
    let driver = open_device(&args.device, NoopObserver)?;

    let info = driver
        .system_info_get()
        .map_err(|err| driver_error("info_get failed", err))?;
    let address = driver
        .system_address_get()
        .map_err(|err| driver_error("address_get failed", err))?;
    let max_connections = driver
        .system_connections_get()
        .map_err(|err| driver_error("connections_get failed", err))?;
    driver.shutdown();

    let out = InfoOutput {
        address: address.to_string(),
        firmware: format!(
            "{}.{}.{} build {}",
            info.major, info.minor, info.patch, info.build
        ),
        info,
        max_connections,
    };

    let rows = [
        ("address", out.address.clone()),
        ("firmware", out.firmware.clone()),
        ("link layer", out.info.ll_version.to_string()),
        ("protocol", out.info.protocol_version.to_string()),
        ("hardware", out.info.hw.to_string()),
        ("max connections", out.max_connections.to_string()),
    ];
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_kv_table(&rows),
        OutputFormat::Pretty => print_kv_pretty("Module Info", &rows),
    }
    Ok(SUCCESS)
}
