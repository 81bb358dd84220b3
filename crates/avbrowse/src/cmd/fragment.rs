use std::path::Path;

use avbrowse_link::fragmenting::{FCS_SIZE, SEGMENT_HEADER_SIZE};
use avbrowse_link::{Datagram, FragmentingLink, LinkConfig, MemoryDatagram, SegmentKind, Transport};
use avbrowse_packet::Packet;
use serde::Serialize;
use tracing::debug;

use crate::cmd::{parse_hex, FragmentArgs};
use crate::exit::{io_error, link_error, packet_error, CliError, CliResult, FAILURE, SUCCESS};

/// How long either end of a socket replay waits before giving up.
#[cfg(unix)]
const SOCKET_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);
use crate::output::{print_json, print_json_pretty, print_raw, print_table, OutputFormat};

#[derive(Debug, Serialize)]
struct UnitOutput {
    index: usize,
    kind: String,
    size: usize,
    fragment_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    fcs: Option<String>,
    hex: String,
}

#[derive(Debug, Serialize)]
struct FragmentOutput {
    mtu: usize,
    frame_check: bool,
    frame_size: usize,
    units: Vec<UnitOutput>,
    reassembled: bool,
}

pub fn run(args: FragmentArgs, format: OutputFormat) -> CliResult<i32> {
    let frame = parse_hex(&args.hex)?;
    let config = LinkConfig {
        mtu: args.mtu,
        max_fragments: args.max_fragments,
        frame_check: !args.no_fcs,
    };

    let units = split(&frame, &config)?;
    let rebuilt = match &args.socket {
        Some(path) => rebuild_over_socket(&units, &config, path)?,
        None => rebuild(&units, &config)?,
    };
    let reassembled = rebuilt == frame;
    debug!(units = units.len(), reassembled, "fragmented frame");

    let output = FragmentOutput {
        mtu: config.mtu,
        frame_check: config.frame_check,
        frame_size: frame.len(),
        units: units
            .iter()
            .enumerate()
            .map(|(index, unit)| describe(index, unit, config.frame_check))
            .collect(),
        reassembled,
    };

    match format {
        OutputFormat::Json => print_json(&output),
        OutputFormat::Pretty => print_json_pretty(&output),
        OutputFormat::Table => print_table(
            &["#", "KIND", "SIZE", "FCS", "UNIT"],
            output
                .units
                .iter()
                .map(|unit| {
                    vec![
                        unit.index.to_string(),
                        unit.kind.clone(),
                        unit.size.to_string(),
                        unit.fcs.clone().unwrap_or_else(|| "-".to_string()),
                        unit.hex.clone(),
                    ]
                })
                .collect(),
        ),
        OutputFormat::Raw => {
            for unit in &units {
                print_raw(unit);
            }
        }
    }

    if !reassembled {
        return Err(CliError::new(
            FAILURE,
            "reassembled frame differs from the input",
        ));
    }
    Ok(SUCCESS)
}

/// Send `frame` through a fragmenting link and capture the units it emits.
fn split(frame: &[u8], config: &LinkConfig) -> CliResult<Vec<Vec<u8>>> {
    let (near, mut far) = MemoryDatagram::pair();
    let mut link = FragmentingLink::with_config(near, config.clone())
        .map_err(|err| link_error("invalid link configuration", err))?;
    let packet = Packet::from_slice(frame).map_err(|err| packet_error("fragment failed", err))?;
    link.send(packet)
        .map_err(|err| link_error("fragment failed", err))?;

    let mut units = Vec::with_capacity(far.pending());
    while far.pending() > 0 {
        let unit = far
            .recv_unit(config.mtu)
            .map_err(|err| io_error("fragment failed", err))?;
        units.push(unit.to_vec());
    }
    Ok(units)
}

/// Replay captured units into a receiving link and return the rebuilt frame.
fn rebuild(units: &[Vec<u8>], config: &LinkConfig) -> CliResult<Vec<u8>> {
    let (mut near, far) = MemoryDatagram::pair();
    for unit in units {
        near.send_unit(unit)
            .map_err(|err| io_error("reassembly failed", err))?;
    }
    receive_frame(far, config)
}

/// Replay captured units through a Unix datagram socket bound at `path`.
#[cfg(unix)]
fn rebuild_over_socket(units: &[Vec<u8>], config: &LinkConfig, path: &Path) -> CliResult<Vec<u8>> {
    use avbrowse_link::UnixDatagramChannel;

    let setup = |err| link_error("socket setup failed", err);
    let far = UnixDatagramChannel::bind(path).map_err(setup)?;
    far.set_read_timeout(Some(SOCKET_TIMEOUT)).map_err(setup)?;
    let mut near = UnixDatagramChannel::unbound().map_err(setup)?;
    near.set_write_timeout(Some(SOCKET_TIMEOUT)).map_err(setup)?;
    near.connect(path).map_err(setup)?;

    // The socket queue is bounded, so units go out while the link drains them.
    std::thread::scope(|scope| {
        let sender = scope.spawn(move || {
            units
                .iter()
                .try_for_each(|unit| near.send_unit(unit))
        });
        let received = receive_frame(far, config);
        let sent = sender
            .join()
            .map_err(|_| CliError::new(crate::exit::INTERNAL, "socket sender panicked"))?;
        let frame = received?;
        sent.map_err(|err| io_error("reassembly failed", err))?;
        Ok(frame)
    })
}

#[cfg(not(unix))]
fn rebuild_over_socket(_: &[Vec<u8>], _: &LinkConfig, _: &Path) -> CliResult<Vec<u8>> {
    Err(CliError::new(
        crate::exit::USAGE,
        "--socket needs Unix datagram sockets",
    ))
}

fn receive_frame<D: Datagram>(datagram: D, config: &LinkConfig) -> CliResult<Vec<u8>> {
    let mut link = FragmentingLink::with_config(datagram, config.clone())
        .map_err(|err| link_error("invalid link configuration", err))?;
    let packet = link
        .receive()
        .map_err(|err| link_error("reassembly failed", err))?;
    packet
        .to_vec()
        .map_err(|err| packet_error("reassembly failed", err))
}

fn describe(index: usize, unit: &[u8], frame_check: bool) -> UnitOutput {
    let kind = unit
        .first()
        .map(|byte| match SegmentKind::try_from(*byte) {
            Ok(kind) => format!("{kind:?}"),
            Err(_) => format!("{byte:#04x}"),
        })
        .unwrap_or_default();
    let trailer = if frame_check { FCS_SIZE } else { 0 };
    let fcs = (frame_check && unit.len() >= SEGMENT_HEADER_SIZE + FCS_SIZE)
        .then(|| hex::encode(&unit[unit.len() - FCS_SIZE..]));

    UnitOutput {
        index,
        kind,
        size: unit.len(),
        fragment_size: unit.len().saturating_sub(SEGMENT_HEADER_SIZE + trailer),
        fcs,
        hex: hex::encode(unit),
    }
}
