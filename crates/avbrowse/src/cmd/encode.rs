use avbrowse_pdu::{
    BrowseCommand, ChangePathCommand, GetFolderItemsCommand, GetItemAttributesCommand,
    GetTotalNumberOfItemsCommand, SetBrowsedPlayerCommand,
};
use serde::Serialize;
use tracing::debug;

use crate::cmd::{EncodeArgs, EncodeOp};
use crate::exit::{packet_error, pdu_error, CliResult, SUCCESS};
use crate::output::{print_json, print_raw, print_table, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput<'a> {
    pdu: &'static str,
    size: usize,
    hex: String,
    command: &'a BrowseCommand,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let command = build_command(args.op);
    let packet = command
        .assemble()
        .map_err(|err| pdu_error("encode failed", err))?;
    let frame = packet
        .to_vec()
        .map_err(|err| packet_error("encode failed", err))?;
    debug!(pdu = %command.pdu_id(), size = frame.len(), "assembled command");

    match format {
        OutputFormat::Json => print_json(&EncodeOutput {
            pdu: command.pdu_id().name(),
            size: frame.len(),
            hex: hex::encode(&frame),
            command: &command,
        }),
        OutputFormat::Table => print_table(
            &["PDU", "SIZE", "FRAME"],
            vec![vec![
                command.pdu_id().name().to_string(),
                frame.len().to_string(),
                hex::encode(&frame),
            ]],
        ),
        OutputFormat::Pretty => println!("{}", hex::encode(&frame)),
        OutputFormat::Raw => print_raw(&frame),
    }

    Ok(SUCCESS)
}

fn build_command(op: EncodeOp) -> BrowseCommand {
    match op {
        EncodeOp::SetBrowsedPlayer { player_id } => SetBrowsedPlayerCommand::new(player_id).into(),
        EncodeOp::ChangePath {
            uid_counter,
            direction,
            folder_uid,
        } => ChangePathCommand {
            uid_counter,
            direction: direction.into(),
            folder_uid,
        }
        .into(),
        EncodeOp::GetFolderItems {
            scope,
            start,
            end,
            attributes,
        } => GetFolderItemsCommand {
            scope: scope.into(),
            start_item: start,
            end_item: end,
            attributes,
        }
        .into(),
        EncodeOp::GetItemAttributes {
            scope,
            uid,
            uid_counter,
            attributes,
        } => GetItemAttributesCommand {
            scope: scope.into(),
            uid,
            uid_counter,
            attributes,
        }
        .into(),
        EncodeOp::GetTotalNumberOfItems { scope } => GetTotalNumberOfItemsCommand {
            scope: scope.into(),
        }
        .into(),
    }
}
