//! Timestamp Reconciler.
//!
//! Carving tools write extracted files with the time of extraction. The
//! forensic metadata document still knows each entry's original times, so
//! after a carve every eligible record's preferred timestamp is written back
//! onto the matching file or directory as both its access and modification
//! time.

use std::path::Path;

use chrono::{Local, NaiveDateTime, TimeZone};
use filetime::FileTime;
use log::{debug, info, warn};

use crate::constants::{crate_agent, EVENT_METADATA_MODIFICATION, TIMESTAMP_PREFIX_LEN};
use crate::dfxml::visit_file;
use crate::models::{EntryKind, ForensicMetadataRecord};
use crate::provenance::{now_timestamp, ProvenanceLog};

/// Placeholder some metadata producers write for a missing time
const ABSENT_TIMESTAMP: &str = "None";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Counters for one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    /// Records whose timestamp was written to disk
    pub applied: usize,
    /// Records ineligible or without a usable timestamp
    pub skipped: usize,
    /// Eligible records with no matching path under the output directory
    pub missing: usize,
    /// Records whose timestamp could not be written
    pub failed: usize,
    /// Whether the document was read to the end
    pub complete: bool,
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ABSENT_TIMESTAMP)
}

/// Pick the modified time, falling back to the created time
pub fn preferred_timestamp(record: &ForensicMetadataRecord) -> Option<&str> {
    present(&record.modified).or_else(|| present(&record.created))
}

/// Regular files and directories are eligible, as are records with no kind
pub fn is_eligible(record: &ForensicMetadataRecord) -> bool {
    let kind_ok = matches!(record.kind, None | Some(EntryKind::Regular) | Some(EntryKind::Directory));
    let last = record.filename.rsplit('/').next().unwrap_or("");
    kind_ok && !record.filename.is_empty() && last != "." && last != ".."
}

/// Interpret the `YYYY-MM-DDTHH:MM:SS` prefix of a timestamp as local time
/// and return seconds since the epoch
pub fn normalize_timestamp(raw: &str) -> Option<i64> {
    let prefix = raw.trim().get(..TIMESTAMP_PREFIX_LEN)?;
    let parsed = NaiveDateTime::parse_from_str(prefix, TIMESTAMP_FORMAT).ok()?;
    let local = Local
        .from_local_datetime(&parsed)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&parsed));
    Some(local.timestamp())
}

fn apply_record(record: &ForensicMetadataRecord, output_dir: &Path, summary: &mut ReconcileSummary) {
    if !is_eligible(record) {
        summary.skipped += 1;
        return;
    }

    let epoch = match preferred_timestamp(record).and_then(normalize_timestamp) {
        Some(epoch) => epoch,
        None => {
            summary.skipped += 1;
            return;
        }
    };

    let path = output_dir.join(record.filename.trim_start_matches('/'));
    if !(path.is_file() || path.is_dir()) {
        summary.missing += 1;
        return;
    }

    let time = FileTime::from_unix_time(epoch, 0);
    match filetime::set_file_times(&path, time, time) {
        Ok(()) => summary.applied += 1,
        Err(e) => {
            warn!("Failed to set timestamps on {}: {}", path.display(), e);
            summary.failed += 1;
        }
    }
}

/// Correct timestamps under `output_dir` from the document at `dfxml_path`.
///
/// A malformed document stops the pass where the error is found; corrections
/// already made stay in place and the failure is recorded as the event note.
pub fn reconcile_timestamps(dfxml_path: &Path, output_dir: &Path, log: &mut ProvenanceLog) -> ReconcileSummary {
    info!("Fixing dates from DFXML for {}", output_dir.display());

    let timestamp = now_timestamp();
    let mut summary = ReconcileSummary::default();
    let result = visit_file(dfxml_path, |record| apply_record(&record, output_dir, &mut summary));

    let (outcome, note) = match result {
        Ok(_) => {
            summary.complete = true;
            (0, "Corrected file timestamps to match information extracted from disk image".to_string())
        }
        Err(e) => {
            warn!("Timestamp correction stopped early: {}", e);
            (1, format!("Timestamp correction incomplete: {}", e))
        }
    };

    debug!(
        "Timestamps applied: {}, skipped: {}, missing: {}, failed: {}",
        summary.applied, summary.skipped, summary.missing, summary.failed
    );

    log.record(
        timestamp,
        EVENT_METADATA_MODIFICATION,
        outcome,
        &format!("reconcile {} {}", dfxml_path.display(), output_dir.display()),
        &note,
        &crate_agent(),
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn record(name: &str, kind: Option<EntryKind>, modified: Option<&str>, created: Option<&str>) -> ForensicMetadataRecord {
        ForensicMetadataRecord {
            filename: name.to_string(),
            kind,
            modified: modified.map(str::to_string),
            created: created.map(str::to_string),
        }
    }

    fn local_epoch(text: &str) -> i64 {
        let naive = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT).unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap().timestamp()
    }

    fn mtime_of(path: &Path) -> i64 {
        FileTime::from_last_modification_time(&fs::metadata(path).unwrap()).unix_seconds()
    }

    #[test]
    fn test_preferred_timestamp_fallback() {
        let r = record("a", None, Some("2001-01-01T00:00:00"), Some("1999-01-01T00:00:00"));
        assert_eq!(preferred_timestamp(&r), Some("2001-01-01T00:00:00"));

        let r = record("a", None, Some("None"), Some("1999-01-01T00:00:00"));
        assert_eq!(preferred_timestamp(&r), Some("1999-01-01T00:00:00"));

        let r = record("a", None, None, None);
        assert_eq!(preferred_timestamp(&r), None);
    }

    #[test]
    fn test_eligibility() {
        assert!(is_eligible(&record("a.txt", Some(EntryKind::Regular), None, None)));
        assert!(is_eligible(&record("dir", Some(EntryKind::Directory), None, None)));
        assert!(is_eligible(&record("a.txt", None, None, None)));
        assert!(!is_eligible(&record("link", Some(EntryKind::Other("l".to_string())), None, None)));
        assert!(!is_eligible(&record(".", Some(EntryKind::Directory), None, None)));
        assert!(!is_eligible(&record("docs/..", Some(EntryKind::Directory), None, None)));
    }

    #[test]
    fn test_normalize_discards_fraction_and_zone() {
        let expected = local_epoch("2001-05-03T10:15:00");
        assert_eq!(normalize_timestamp("2001-05-03T10:15:00"), Some(expected));
        assert_eq!(normalize_timestamp("2001-05-03T10:15:00.25Z"), Some(expected));
        assert_eq!(normalize_timestamp("2001-05-03"), None);
        assert_eq!(normalize_timestamp("not a timestamp at all"), None);
    }

    #[test]
    fn test_readme_scenario_and_idempotence() {
        let temp_dir = TempDir::new().unwrap();
        let objects = temp_dir.path().join("objects");
        fs::create_dir(&objects).unwrap();
        let readme = objects.join("readme.txt");
        fs::write(&readme, "hello").unwrap();

        let dfxml = temp_dir.path().join("dfxml.xml");
        fs::write(
            &dfxml,
            "<dfxml><fileobject><filename>readme.txt</filename><name_type>r</name_type><mtime>2001-05-03T10:15:00</mtime></fileobject>\
             <fileobject><filename>gone.txt</filename><mtime>2001-05-03T10:15:00</mtime></fileobject></dfxml>",
        )
        .unwrap();

        let mut log = ProvenanceLog::new();
        let first = reconcile_timestamps(&dfxml, &objects, &mut log);
        assert_eq!(first.applied, 1);
        assert_eq!(first.missing, 1);
        assert!(first.complete);

        let expected = local_epoch("2001-05-03T10:15:00");
        let meta = fs::metadata(&readme).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&meta).unix_seconds(), expected);
        assert_eq!(FileTime::from_last_access_time(&meta).unix_seconds(), expected);

        let second = reconcile_timestamps(&dfxml, &objects, &mut log);
        assert_eq!(second, first);
        assert_eq!(mtime_of(&readme), expected);

        assert_eq!(log.count_of(EVENT_METADATA_MODIFICATION), 2);
        assert!(log.events().iter().all(|e| e.outcome_code == 0));
    }

    #[test]
    fn test_malformed_document_keeps_partial_corrections() {
        let temp_dir = TempDir::new().unwrap();
        let objects = temp_dir.path().join("objects");
        fs::create_dir(&objects).unwrap();
        fs::write(objects.join("first.txt"), "1").unwrap();

        let dfxml = temp_dir.path().join("dfxml.xml");
        fs::write(
            &dfxml,
            "<dfxml><fileobject><filename>first.txt</filename><mtime>1995-06-07T08:09:10</mtime></fileobject><fileobject><filename>",
        )
        .unwrap();

        let mut log = ProvenanceLog::new();
        let summary = reconcile_timestamps(&dfxml, &objects, &mut log);

        assert!(!summary.complete);
        assert_eq!(summary.applied, 1);
        assert_eq!(mtime_of(&objects.join("first.txt")), local_epoch("1995-06-07T08:09:10"));
        assert_eq!(log.events()[0].outcome_code, 1);
        assert!(log.events()[0].note.contains("incomplete"));
    }

    #[test]
    fn test_directories_are_corrected() {
        let temp_dir = TempDir::new().unwrap();
        let objects = temp_dir.path().join("objects");
        fs::create_dir_all(objects.join("docs")).unwrap();

        let dfxml = temp_dir.path().join("dfxml.xml");
        fs::write(
            &dfxml,
            "<dfxml><fileobject><filename>docs</filename><name_type>d</name_type><crtime>1990-01-02T03:04:05Z</crtime></fileobject></dfxml>",
        )
        .unwrap();

        let mut log = ProvenanceLog::new();
        let summary = reconcile_timestamps(&dfxml, &objects, &mut log);
        assert_eq!(summary.applied, 1);
        assert_eq!(mtime_of(&objects.join("docs")), local_epoch("1990-01-02T03:04:05"));
    }
}
