use std::fmt;

/// Log verbosity level — ordered from least to most detailed.
///
/// | Level   | Flag needed |
/// |---------|-------------|
/// | Warn    | always      |
/// | Info    | always      |
/// | Verbose | `-v`        |
/// | Debug   | `-vv`       |
/// | Trace   | `-vvv`      |
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Warn,
    Info,
    Verbose,
    Debug,
    Trace,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Verbose => "VERB",
            Level::Debug => "DEBG",
            Level::Trace => "TRCE",
        };
        write!(f, "{tag}")
    }
}

impl Level {
    /// Maps a repeated `-v` count (as produced by the CLI) to a level floor.
    pub fn from_verbosity(v: u8) -> Self {
        match v {
            0 => Level::Info,
            1 => Level::Verbose,
            2 => Level::Debug,
            _ => Level::Trace,
        }
    }

    /// Translates our five-level scheme into the `tracing` filter directive
    /// installed by `tracing_subscriber::EnvFilter`.
    pub fn as_env_filter(self) -> &'static str {
        match self {
            Level::Warn => "warn",
            Level::Info => "info",
            Level::Verbose => "info,ludo_arena=debug",
            Level::Debug => "debug",
            Level::Trace => "trace",
        }
    }
}

/// Installs the process-wide `tracing` subscriber. Called once from `main`.
///
/// Kept as a free function rather than a `Logger` value: every module below
/// logs directly through the `tracing::{warn,info,debug,trace}!` macros, so
/// the only state this crate needs is the one-time subscriber installation.
pub fn init(verbosity: u8) {
    let level = Level::from_verbosity(verbosity);
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| level.as_env_filter().to_string());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_target(false)
        .init();
}
