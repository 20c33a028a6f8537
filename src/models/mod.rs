pub mod snapshot;

pub use snapshot::*;

// Field names of a state file entry, shared with state files written by
// earlier releases of the watcher.
pub const FIELD_HASH: &str = "hash";
pub const FIELD_TEXT: &str = "text";
pub const FIELD_UPDATED: &str = "updated";
