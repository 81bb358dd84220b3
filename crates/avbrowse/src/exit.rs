use std::fmt;
use std::io;

use avbrowse_link::LinkError;
use avbrowse_packet::PacketError;
use avbrowse_pdu::PduError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionRefused => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn packet_error(context: &str, err: PacketError) -> CliError {
    match err {
        PacketError::CrcMismatch { .. } => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

pub fn pdu_error(context: &str, err: PduError) -> CliError {
    match err {
        PduError::Packet(err) => packet_error(context, err),
        // Encoding side: values the operator supplied do not fit the wire format.
        PduError::TooManyAttributes { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn link_error(context: &str, err: LinkError) -> CliError {
    match err {
        LinkError::Packet(err) => packet_error(context, err),
        LinkError::Io(source) | LinkError::Bind { source, .. } | LinkError::Connect { source, .. } => {
            io_error(context, source)
        }
        LinkError::MtuTooSmall { .. } | LinkError::PathTooLong { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        LinkError::TooManyFragments { .. }
        | LinkError::TruncatedUnit { .. }
        | LinkError::UnexpectedSegment { .. }
        | LinkError::InvalidSegmentHeader(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        LinkError::Closed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use avbrowse_pdu::PduId;

    #[test]
    fn short_frame_maps_to_data_invalid() {
        let err = pdu_error(
            "decode failed",
            PduError::ShortFrame {
                pdu: PduId::ChangePath,
                size: 4,
                min: 8,
            },
        );
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("decode failed: "));
    }

    #[test]
    fn link_errors_map_by_cause() {
        assert_eq!(
            link_error("x", LinkError::MtuTooSmall { mtu: 3, overhead: 3 }).code,
            USAGE
        );
        assert_eq!(
            link_error(
                "x",
                LinkError::Io(io::Error::new(io::ErrorKind::WouldBlock, "empty"))
            )
            .code,
            TIMEOUT
        );
        assert_eq!(link_error("x", LinkError::Closed).code, TRANSPORT_ERROR);
        assert_eq!(
            link_error("x", LinkError::TruncatedUnit { size: 2, min: 3 }).code,
            DATA_INVALID
        );
        assert_eq!(
            link_error(
                "x",
                LinkError::Packet(PacketError::CrcMismatch {
                    expected: 1,
                    computed: 2
                })
            )
            .code,
            DATA_INVALID
        );
    }
}
