use std::path::PathBuf;

use avbrowse_link::fragmenting::{DEFAULT_MAX_FRAGMENTS, DEFAULT_MTU};
use avbrowse_pdu::{Direction, Scope};
use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod fragment;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assemble a browsing command frame and print it.
    Encode(EncodeArgs),
    /// Disassemble a browsing frame given as hex.
    Decode(DecodeArgs),
    /// Split a frame into link units and reassemble it.
    Fragment(FragmentArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Fragment(args) => fragment::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(subcommand)]
    pub op: EncodeOp,
}

#[derive(Subcommand, Debug)]
pub enum EncodeOp {
    /// Select the player to browse.
    SetBrowsedPlayer {
        #[arg(long, value_parser = parse_int::<u16>)]
        player_id: u16,
    },
    /// Move up, or down into a folder.
    ChangePath {
        #[arg(long, value_parser = parse_int::<u16>)]
        uid_counter: u16,
        #[arg(long, value_enum)]
        direction: DirectionArg,
        /// Folder to enter; ignored when moving up.
        #[arg(long, value_parser = parse_int::<u64>, default_value = "0")]
        folder_uid: u64,
    },
    /// List a range of items in a scope.
    GetFolderItems {
        #[arg(long, value_enum)]
        scope: ScopeArg,
        #[arg(long, value_parser = parse_int::<u32>, default_value = "0")]
        start: u32,
        #[arg(long, value_parser = parse_int::<u32>)]
        end: u32,
        /// Attribute ids (comma-separated). Default: none.
        #[arg(long, value_delimiter = ',', value_parser = parse_int::<u32>)]
        attributes: Vec<u32>,
    },
    /// Fetch attributes of one item.
    GetItemAttributes {
        #[arg(long, value_enum)]
        scope: ScopeArg,
        #[arg(long, value_parser = parse_int::<u64>)]
        uid: u64,
        #[arg(long, value_parser = parse_int::<u16>)]
        uid_counter: u16,
        /// Attribute ids (comma-separated). Default: all.
        #[arg(long, value_delimiter = ',', value_parser = parse_int::<u32>)]
        attributes: Vec<u32>,
    },
    /// Count the items in a scope.
    GetTotalNumberOfItems {
        #[arg(long, value_enum)]
        scope: ScopeArg,
    },
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame bytes as hex; spaces and colons are ignored.
    pub hex: String,
    /// Decode as a command instead of a response.
    #[arg(long)]
    pub command: bool,
}

#[derive(Args, Debug)]
pub struct FragmentArgs {
    /// Frame bytes as hex; spaces and colons are ignored.
    pub hex: String,
    /// Unit size in bytes, header and frame check included.
    #[arg(long, default_value_t = DEFAULT_MTU)]
    pub mtu: usize,
    /// Most units one frame may span.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAGMENTS)]
    pub max_fragments: usize,
    /// Omit the per-unit CRC-16 frame check.
    #[arg(long)]
    pub no_fcs: bool,
    /// Reassemble over a Unix datagram socket bound at this path.
    #[arg(long, value_name = "PATH")]
    pub socket: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum ScopeArg {
    PlayerList,
    #[value(alias = "vfs")]
    VirtualFileSystem,
    Search,
    NowPlaying,
}

impl From<ScopeArg> for Scope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::PlayerList => Scope::PlayerList,
            ScopeArg::VirtualFileSystem => Scope::VirtualFileSystem,
            ScopeArg::Search => Scope::Search,
            ScopeArg::NowPlaying => Scope::NowPlaying,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(direction: DirectionArg) -> Self {
        match direction {
            DirectionArg::Up => Direction::Up,
            DirectionArg::Down => Direction::Down,
        }
    }
}

/// Decimal or `0x`-prefixed hex integer that fits `T`.
fn parse_int<T: TryFrom<u64>>(input: &str) -> Result<T, String> {
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => input.parse::<u64>(),
    };
    let value = parsed.map_err(|err| format!("invalid number {input:?}: {err}"))?;
    T::try_from(value).map_err(|_| format!("{input} is out of range"))
}

/// Frame bytes from a hex string, ignoring separators and a `0x` prefix.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let input = input.trim();
    let input = input.strip_prefix("0x").unwrap_or(input);
    let digits: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':')
        .collect();
    if digits.is_empty() {
        return Err(CliError::new(USAGE, "frame must not be empty"));
    }
    hex::decode(&digits).map_err(|err| CliError::new(USAGE, format!("invalid hex frame: {err}")))
}
