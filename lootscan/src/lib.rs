//! Loot scanning: screenshot of an opened container in, itemized value report out.
//!
//! [`Engine`] runs one scan synchronously; [`Scanner`] adds per-user
//! admission and runs each accepted scan on a worker thread.

pub mod archive;
pub mod assets;
pub mod config;
mod error;
pub mod matcher;
pub mod metadata;
pub mod progress;
pub mod report;
pub mod scan;
pub mod service;
pub mod session;

pub use error::ScanError;
pub use report::LootReport;
pub use scan::{Engine, ScanOptions};
pub use service::{ScanHandle, Scanner};
