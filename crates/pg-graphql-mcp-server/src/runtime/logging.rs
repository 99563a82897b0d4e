//! Logging config and utilities
//!
//! This module is only used by the main binary and provides logging config structures and setup
//! helper functions. Logs never go to stdout, which belongs to the stdio transport.

mod defaults;
mod format_style;
mod log_rotation_kind;

use std::path::PathBuf;

use format_style::FormatStyle;
use log_rotation_kind::LogRotationKind;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, Layer as LayerTrait, Registry};

/// Prefix of log file names
const LOG_FILE_PREFIX: &str = "pg_graphql_mcp";

/// Logging related options
#[derive(Debug, Deserialize, JsonSchema)]
pub struct Logging {
    /// The log level to use for tracing
    #[serde(
        default = "defaults::log_level",
        deserialize_with = "super::parsers::from_str"
    )]
    #[schemars(schema_with = "super::schemas::level")]
    pub level: Level,

    /// A directory to write rotating log files to, instead of stderr
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Log file rotation period to use when log file path provided
    /// [default: Hourly]
    #[serde(default = "defaults::default_rotation")]
    pub rotation: LogRotationKind,

    /// The style of log lines
    #[serde(default = "defaults::default_format")]
    pub format: FormatStyle,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            path: None,
            rotation: defaults::default_rotation(),
            format: defaults::default_format(),
        }
    }
}

type LoggingLayerResult = (
    Box<dyn LayerTrait<Registry> + Send + Sync>,
    Option<WorkerGuard>,
);

pub struct LoggingLayerBuilder {
    writer: Option<BoxMakeWriter>,
}

impl LoggingLayerBuilder {
    pub fn new() -> Self {
        Self { writer: None }
    }

    // Lets tests capture output. Without a writer, build() picks one from the logging config.
    #[allow(dead_code)]
    pub fn with_writer<W>(mut self, mw: W) -> Self
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        self.writer = Some(BoxMakeWriter::new(mw));
        self
    }

    /// Build the formatting layer. Keep the returned guard alive to flush file logs on exit.
    pub fn build(self, logging: &Logging) -> LoggingLayerResult {
        let (writer, worker_guard, ansi_enabled) = match self.writer {
            Some(writer) => (writer, None, false),
            None => build_writer(logging),
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(ansi_enabled)
            .with_target(false);
        let formatted_layer = match logging.format {
            FormatStyle::Full => layer.boxed(),
            FormatStyle::Compact => layer.compact().boxed(),
            FormatStyle::Json => layer.json().boxed(),
            FormatStyle::Pretty => layer.pretty().boxed(),
        };

        (formatted_layer, worker_guard)
    }
}

/// A rolling file writer when a path is configured, falling back to stderr
fn build_writer(logging: &Logging) -> (BoxMakeWriter, Option<WorkerGuard>, bool) {
    macro_rules! log_error {
        () => {
            |e| eprintln!("Failed to setup logging: {e:?}")
        };
    }

    match logging.path.clone() {
        Some(path) => std::fs::create_dir_all(&path)
            .map(|_| path)
            .inspect_err(log_error!())
            .ok()
            .and_then(|path| {
                RollingFileAppender::builder()
                    .rotation(logging.rotation.clone().into())
                    .filename_prefix(LOG_FILE_PREFIX)
                    .filename_suffix("log")
                    .build(path)
                    .inspect_err(log_error!())
                    .ok()
            })
            .map(|appender| {
                let (non_blocking_appender, guard) = tracing_appender::non_blocking(appender);
                (
                    BoxMakeWriter::new(non_blocking_appender),
                    Some(guard),
                    false,
                )
            })
            .unwrap_or_else(|| {
                eprintln!("Log file setup failed - falling back to stderr");
                (BoxMakeWriter::new(std::io::stderr), None, true)
            }),
        None => (BoxMakeWriter::new(std::io::stderr), None, true),
    }
}

impl Logging {
    pub fn env_filter(logging: &Logging) -> Result<EnvFilter, anyhow::Error> {
        let mut env_filter = EnvFilter::from_default_env().add_directive(logging.level.into());

        if logging.level == Level::INFO {
            env_filter = env_filter.add_directive("rmcp=warn".parse()?);
        }
        Ok(env_filter)
    }
}
