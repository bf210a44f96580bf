use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// Target the hub's own debug text is logged under.
pub const MCU_TARGET: &str = "sensorhub::mcu";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Host logs at `level`; hub debug text at `mcu_level`, or `level` when unset.
pub fn log_filter(level: LogLevel, mcu_level: Option<LogLevel>) -> Targets {
    let mcu = mcu_level.unwrap_or(level);
    Targets::new()
        .with_default(level.as_filter())
        .with_target(MCU_TARGET, mcu.as_filter())
}

/// Logs go to stderr; stdout is reserved for decoded output.
pub fn init_logging(format: LogFormat, level: LogLevel, mcu_level: Option<LogLevel>) {
    let filter = log_filter(level, mcu_level);
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    let _ = match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(layer.with_filter(filter))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(layer.json().with_filter(filter))
            .try_init(),
    };
}
