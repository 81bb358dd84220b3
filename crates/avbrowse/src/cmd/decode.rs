use avbrowse_packet::Packet;
use avbrowse_pdu::{BrowseCommand, BrowseResponse};
use serde::Serialize;
use tracing::debug;

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{packet_error, pdu_error, CliResult, SUCCESS};
use crate::output::{print_fields, print_json, print_json_pretty, print_raw, OutputFormat};

#[derive(Serialize)]
struct DecodeOutput<'a, T> {
    kind: &'static str,
    size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    character_set_mismatch: Option<bool>,
    #[serde(flatten)]
    frame: &'a T,
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = parse_hex(&args.hex)?;
    let mut packet = Packet::from_slice(&frame).map_err(|err| packet_error("decode failed", err))?;

    if args.command {
        let command =
            BrowseCommand::disassemble(&mut packet).map_err(|err| pdu_error("decode failed", err))?;
        debug!(pdu = %command.pdu_id(), "decoded command");
        let output = DecodeOutput {
            kind: "command",
            size: frame.len(),
            character_set_mismatch: None,
            frame: &command,
        };
        print_decoded(&output, &frame, format);
    } else {
        let response = BrowseResponse::disassemble(&mut packet)
            .map_err(|err| pdu_error("decode failed", err))?;
        debug!(pdu = %response.pdu_id(), status = response.status(), "decoded response");
        let output = DecodeOutput {
            kind: "response",
            size: frame.len(),
            character_set_mismatch: Some(response.character_set_mismatch()),
            frame: &response,
        };
        print_decoded(&output, &frame, format);
    }

    Ok(SUCCESS)
}

fn print_decoded<T: Serialize>(output: &DecodeOutput<'_, T>, frame: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table => print_fields(output),
        OutputFormat::Pretty => print_json_pretty(output),
        OutputFormat::Raw => print_raw(frame),
    }
}
