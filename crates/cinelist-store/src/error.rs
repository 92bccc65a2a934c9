use std::path::Path;

/// Failures of the persisted watchlist slot.
///
/// Both variants are recovered by the store; they only surface through
/// direct use of a [`WatchlistStorage`](crate::WatchlistStorage).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Corrupt watchlist data: {0}")]
    CorruptData(String),

    #[error("Watchlist storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    pub fn corrupt(reason: impl Into<String>) -> Self {
        StorageError::CorruptData(reason.into())
    }

    pub fn unavailable_at(path: &Path, err: std::io::Error) -> Self {
        StorageError::Unavailable(format!("{}: {}", path.display(), err))
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, StorageError::CorruptData(_))
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
