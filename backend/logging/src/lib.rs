//! Structured logging for parley.
//!
//! Console and rolling NDJSON file output, plus per-command event records.

pub mod event_logger;
pub mod logger;

pub use event_logger::{CommandEvent, CommandEventEntry, EventLogger};
pub use logger::{init_logger, LOG_FILE_NAME};
