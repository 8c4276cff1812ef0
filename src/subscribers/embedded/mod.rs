//! # Built-in subscribers
//!
//! - [`LogWriter`]: forwards events to `tracing` (requires the `logging` feature).

mod log;

pub use log::LogWriter;
