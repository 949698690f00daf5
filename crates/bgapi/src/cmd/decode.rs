use bgapi_event::{decode_event, to_hex, Event};
use bgapi_frame::{category_name, Frame, FrameReader, MessageKind};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{event_fields, print_json, OutputFormat};

#[derive(Serialize)]
struct DecodedFrame {
    kind: &'static str,
    category: u8,
    category_name: &'static str,
    subtype: u8,
    length: usize,
    payload: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    decoded: Option<Event>,
}

impl DecodedFrame {
    fn from_frame(frame: &Frame) -> Self {
        let kind = frame.header.message_kind();
        let decoded = match kind {
            MessageKind::Event => decode_event(
                frame.header.category,
                frame.header.subtype,
                frame.payload.clone(),
            ),
            MessageKind::Response => None,
        };
        Self {
            kind: kind.as_str(),
            category: frame.header.category,
            category_name: category_name(frame.header.category),
            subtype: frame.header.subtype,
            length: frame.payload.len(),
            payload: to_hex(&frame.payload),
            decoded,
        }
    }

    fn summary(&self) -> String {
        match &self.decoded {
            Some(event) => format!("{} {}", event.name(), event_fields(event)),
            None => format!("payload={}", self.payload),
        }
    }
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = match (&args.hex, &args.file) {
        (Some(hex), _) => parse_hex(hex)?,
        (None, Some(path)) => std::fs::read(path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err))?,
        (None, None) => return Err(CliError::new(USAGE, "nothing to decode")),
    };

    let (frames, trailing) = split_frames(&bytes);
    let decoded: Vec<DecodedFrame> = frames.iter().map(DecodedFrame::from_frame).collect();

    match format {
        OutputFormat::Json => {
            for frame in &decoded {
                print_json(frame);
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "CATEGORY", "ID", "LEN", "DETAIL"]);
            for frame in &decoded {
                table.add_row(vec![
                    frame.kind.to_string(),
                    frame.category_name.to_string(),
                    frame.subtype.to_string(),
                    frame.length.to_string(),
                    frame.summary(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for frame in &decoded {
                println!(
                    "{} {}/{} len={} {}",
                    frame.kind,
                    frame.category_name,
                    frame.subtype,
                    frame.length,
                    frame.summary()
                );
            }
        }
    }

    if trailing > 0 {
        return Err(CliError::new(
            DATA_INVALID,
            format!("{trailing} trailing bytes do not form a complete frame"),
        ));
    }
    Ok(SUCCESS)
}

/// Split a capture into whole frames plus the count of leftover bytes.
fn split_frames(bytes: &[u8]) -> (Vec<Frame>, usize) {
    let mut reader = FrameReader::new(bytes);
    let frames = reader.by_ref().map_while(|frame| frame.ok()).collect();
    (frames, reader.buffered())
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .split_whitespace()
        .flat_map(|word| word.split(':'))
        .map(|word| {
            word.strip_prefix("0x")
                .or_else(|| word.strip_prefix("0X"))
                .unwrap_or(word)
        })
        .collect();

    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(CliError::new(
            DATA_INVALID,
            format!("invalid hex digit: {bad:?}"),
        ));
    }
    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            DATA_INVALID,
            "hex input has an odd number of digits",
        ));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| {
                CliError::new(
                    DATA_INVALID,
                    format!("invalid hex byte: {:?}", &digits[i..i + 2]),
                )
            })
        })
        .collect()
}
