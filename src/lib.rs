//! Poll a web page, detect meaningful changes to its visible text, and
//! report only what changed.

pub mod cli;
pub mod config;
pub mod diff;
pub mod models;
pub mod notify;
pub mod parsers;
pub mod storage;
pub mod utils;
pub mod watcher;

pub use crate::config::Config;
pub use crate::watcher::{cancellation, CancelHandle, CancelToken, CheckOutcome, WatchExit, Watcher};
