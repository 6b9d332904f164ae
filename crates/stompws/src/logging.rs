use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing::Level;

/// Target the engine reports wire traffic and version fallbacks under.
pub const ENGINE_TARGET: &str = "stompws::client";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// `--log-level` values. `debug` and `trace` include every frame exchanged
/// with the broker.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Whether frames on the wire are logged at this level.
    pub fn shows_frames(self) -> bool {
        matches!(self, LogLevel::Debug | LogLevel::Trace)
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Install the stderr subscriber.
///
/// Targets are printed only when frames are, to tell engine traffic apart
/// from the CLI's own messages.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::from(level))
        .with_ansi(false)
        .with_target(level.shows_frames());

    // A subscriber installed earlier (tests) wins.
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}

/// Whether the installed subscriber keeps anything logged under
/// [`ENGINE_TARGET`]. When it does not, the client runs with a silent sink
/// and skips formatting frames.
pub fn engine_output_enabled() -> bool {
    tracing::enabled!(target: ENGINE_TARGET, Level::WARN)
}
