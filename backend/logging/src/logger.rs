//! Structured Logger
//!
//! Wraps `tracing` to provide console output, file rotation (NDJSON),
//! and environment-based level control.

use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name stem of the rolling log; the appender adds a `.YYYY-MM-DD` suffix.
pub const LOG_FILE_NAME: &str = "parley.log";

/// Initialize the global structured logger.
///
/// Installs a console layer (human readable, or JSON when `json` is set) and a
/// daily rolling NDJSON file layer under `log_dir`. `RUST_LOG` overrides
/// `level`. Calling it twice is harmless: the second call is ignored.
pub fn init_logger<P: AsRef<Path>>(log_dir: P, level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Rolling file appender: writes NDJSON to `<log_dir>/parley.log.YYYY-MM-DD`
    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, LOG_FILE_NAME);

    let file_layer = fmt::layer().json().with_writer(file_appender).with_ansi(false);

    let console_json = json.then(|| fmt::layer().json().with_writer(std::io::stdout));
    let console_plain = (!json).then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_ansi(true)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_json)
        .with(console_plain)
        .with(file_layer)
        .try_init();
}
