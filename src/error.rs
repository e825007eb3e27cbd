use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop processing of an item.
///
/// Everything here except `MetadataParse` is fatal for the item and is
/// surfaced to the caller; `MetadataParse` only aborts one timestamp
/// reconciliation pass and is downgraded to a provenance note.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("{0} looks like it has already been repackaged")]
    AlreadyRepackaged(PathBuf),
    #[error("{0} looks like a bag")]
    AlreadyBagged(PathBuf),
    #[error("found {found} disk images in {dir}, expected exactly one")]
    DiskImageCount { dir: PathBuf, found: usize },
    #[error("files already exist in {0}")]
    DestinationPopulated(PathBuf),
    #[error("unable to parse forensic metadata document {path}: {reason}")]
    MetadataParse { path: PathBuf, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = ProcessingError::DiskImageCount { dir: PathBuf::from("/items/a"), found: 2 };
        assert_eq!(err.to_string(), "found 2 disk images in /items/a, expected exactly one");
    }
}
