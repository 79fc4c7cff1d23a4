//! Non-blocking append-only file logging, plus the keyword block-list and
//! scripted event replay that feed it.

pub mod blocklist;
pub mod logger;
pub mod model;
pub mod replay;

pub use logger::{AsyncLogger, LoggerConfig};
