use std::path::PathBuf;

/// A produced screenshot held in [`HistoryStore`](crate::HistoryStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRecord {
    /// Location of the PNG on disk.
    pub path: PathBuf,
    /// Monotonically increasing identity assigned at append time.
    ///
    /// Unlike the position in the history, this never changes.
    pub sequence: u64,
}
