mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "bgapi", version, about = "BGAPI radio module CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hello_with_port() {
        let cli = Cli::try_parse_from(["bgapi", "hello", "--port", "/dev/ttyACM0"])
            .expect("hello args should parse");
        assert!(matches!(cli.command, Command::Hello(_)));
    }

    #[test]
    fn port_and_socket_conflict() {
        let err = Cli::try_parse_from([
            "bgapi",
            "info",
            "--port",
            "/dev/ttyACM0",
            "--socket",
            "/tmp/bled.sock",
        ])
        .expect_err("conflicting args should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_scan_options() {
        let cli = Cli::try_parse_from([
            "bgapi",
            "--format",
            "json",
            "scan",
            "--socket",
            "/tmp/bled.sock",
            "--duration",
            "3s",
            "--active",
        ])
        .expect("scan args should parse");
        match cli.command {
            Command::Scan(args) => {
                assert!(args.active);
                assert_eq!(args.duration, "3s");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn decode_requires_input() {
        let err = Cli::try_parse_from(["bgapi", "decode"]).expect_err("decode needs input");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
