use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Crates whose events follow `--log-level`.
const AVBROWSE_TARGETS: [&str; 5] = [
    "avbrowse",
    "avbrowse_packet",
    "avbrowse_link",
    "avbrowse_pdu",
    "avbrowse_session",
];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Codec, link and session events at `level`; anything else capped at warn.
fn targets(level: LogLevel) -> Targets {
    let level = level.as_filter();
    AVBROWSE_TARGETS.iter().fold(
        Targets::new().with_default(level.min(LevelFilter::WARN)),
        |targets, target| targets.with_target(*target, level),
    )
}

/// Send diagnostics to stderr; stdout carries only frames and reports.
///
/// At debug and trace the emitting crate is printed with each line, so unit
/// and reassembly traces from the link can be told apart from codec ones.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(matches!(level, LogLevel::Debug | LogLevel::Trace));
    let registry = tracing_subscriber::registry().with(targets(level));

    let _ = match format {
        LogFormat::Text => registry.with(layer).try_init(),
        LogFormat::Json => registry.with(layer.json()).try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn avbrowse_crates_follow_the_requested_level() {
        let filter = targets(LogLevel::Debug);
        assert!(filter.would_enable("avbrowse_link::fragmenting", &Level::DEBUG));
        assert!(filter.would_enable("avbrowse_pdu::pdu", &Level::DEBUG));
        assert!(!filter.would_enable("avbrowse_session::session", &Level::TRACE));
    }

    #[test]
    fn other_crates_stay_at_warn_or_quieter() {
        let filter = targets(LogLevel::Trace);
        assert!(filter.would_enable("clap_builder", &Level::WARN));
        assert!(!filter.would_enable("clap_builder", &Level::INFO));

        let quiet = targets(LogLevel::Error);
        assert!(!quiet.would_enable("clap_builder", &Level::WARN));
        assert!(!quiet.would_enable("avbrowse_link", &Level::WARN));
        assert!(quiet.would_enable("avbrowse_link", &Level::ERROR));
    }
}
