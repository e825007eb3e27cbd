use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::PipelineConfig;
use crate::constants::{crate_agent, EVENT_DELETION, REMOVED_SYSTEM_FILES_LOG};
use crate::provenance::{now_timestamp, ProvenanceLog};

/// Junk found under an object tree
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SystemFiles {
    pub files: Vec<PathBuf>,
    pub directories: Vec<PathBuf>,
}

impl SystemFiles {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }
}

/// Find operating-system junk by exact name below `objects_dir`.
///
/// Junk directories are not descended into.
pub fn find_system_files(objects_dir: &Path, config: &PipelineConfig) -> SystemFiles {
    let mut found = SystemFiles::default();
    let mut walker = WalkDir::new(objects_dir)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Error while searching for system files: {}", e);
                continue;
            }
        };
        let name = entry.file_name().to_string_lossy();

        if entry.file_type().is_dir() {
            if config.junk_directories.iter().any(|junk| *junk == name) {
                found.directories.push(entry.path().to_path_buf());
                walker.skip_current_dir();
            }
        } else if entry.file_type().is_file() && config.junk_files.iter().any(|junk| *junk == name) {
            found.files.push(entry.path().to_path_buf());
        }
    }

    found
}

/// Delete system junk from `objects_dir`.
///
/// When anything was deleted, the removed paths are listed in
/// `removed_system_files.txt` and a deletion event is recorded. Failures to
/// delete individual entries are logged and skipped.
pub fn remove_system_files(
    objects_dir: &Path,
    subdoc_dir: &Path,
    config: &PipelineConfig,
    log: &mut ProvenanceLog,
) -> Result<Vec<PathBuf>> {
    info!("Removing system files from {}", objects_dir.display());

    let targets = find_system_files(objects_dir, config);
    if targets.is_empty() {
        debug!("No system files found");
        return Ok(Vec::new());
    }

    let mut deleted = Vec::new();
    for path in targets.files {
        match fs::remove_file(&path) {
            Ok(()) => deleted.push(path),
            Err(e) => warn!("Failed to delete file {}: {}", path.display(), e),
        }
    }
    for path in targets.directories {
        match fs::remove_dir_all(&path) {
            Ok(()) => deleted.push(path),
            Err(e) => warn!("Failed to delete directory {}: {}", path.display(), e),
        }
    }

    if deleted.is_empty() {
        return Ok(deleted);
    }

    let listing = deleted
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("\n");
    let log_path = subdoc_dir.join(REMOVED_SYSTEM_FILES_LOG);
    fs::write(&log_path, listing)
        .context(format!("Failed to write {}", log_path.display()))?;

    log.record(
        now_timestamp(),
        EVENT_DELETION,
        0,
        &format!("remove {} system files and folders", deleted.len()),
        "Deleted system files and folders",
        &crate_agent(),
    );

    info!("Removed {} system files and folders", deleted.len());
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_temp_dir;

    fn junk_tree(objects: &Path) {
        fs::create_dir_all(objects.join("photos").join(".Trashes").join("501")).unwrap();
        fs::write(objects.join("photos").join(".Trashes").join("501").join("Thumbs.db"), "x").unwrap();
        fs::write(objects.join("photos").join("Thumbs.db"), "x").unwrap();
        fs::write(objects.join("photos").join("cat.jpg"), "jpg").unwrap();
        fs::write(objects.join(".DS_Store"), "x").unwrap();
        fs::write(objects.join("Desktop DB"), "x").unwrap();
        fs::create_dir_all(objects.join(".fseventsd")).unwrap();
    }

    #[test]
    fn test_find_does_not_descend_into_junk_directories() {
        let temp_dir = create_temp_dir().unwrap();
        let objects = temp_dir.path().join("objects");
        junk_tree(&objects);

        let found = find_system_files(&objects, &PipelineConfig::default());
        assert_eq!(found.directories.len(), 2);
        assert_eq!(
            found.files,
            vec![
                objects.join(".DS_Store"),
                objects.join("Desktop DB"),
                objects.join("photos").join("Thumbs.db"),
            ]
        );
    }

    #[test]
    fn test_remove_records_one_deletion_event() {
        let temp_dir = create_temp_dir().unwrap();
        let objects = temp_dir.path().join("objects");
        let subdoc = temp_dir.path().join("subdoc");
        fs::create_dir(&subdoc).unwrap();
        junk_tree(&objects);

        let mut log = ProvenanceLog::new();
        let deleted = remove_system_files(&objects, &subdoc, &PipelineConfig::default(), &mut log).unwrap();

        assert_eq!(deleted.len(), 5);
        assert!(objects.join("photos").join("cat.jpg").exists());
        assert!(!objects.join("photos").join(".Trashes").exists());
        assert_eq!(log.count_of(EVENT_DELETION), 1);

        let listing = fs::read_to_string(subdoc.join(REMOVED_SYSTEM_FILES_LOG)).unwrap();
        assert_eq!(listing.lines().count(), 5);
    }

    #[test]
    fn test_clean_tree_records_nothing() {
        let temp_dir = create_temp_dir().unwrap();
        let objects = temp_dir.path().join("objects");
        fs::create_dir_all(&objects).unwrap();
        fs::write(objects.join("letter.txt"), "hi").unwrap();

        let mut log = ProvenanceLog::new();
        let deleted = remove_system_files(&objects, temp_dir.path(), &PipelineConfig::default(), &mut log).unwrap();

        assert!(deleted.is_empty());
        assert!(log.is_empty());
        assert!(!temp_dir.path().join(REMOVED_SYSTEM_FILES_LOG).exists());
    }
}
