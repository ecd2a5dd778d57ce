//! # Built-in subscribers
//!
//! - [`LogWriter`]: renders events through `tracing` (demo/debug).

mod log;

pub use log::LogWriter;
