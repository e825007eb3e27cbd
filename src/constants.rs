//! Global constants for the accessioning pipeline.
//!
//! This module centralizes the fixed names of the item layout, the report
//! files written into submission documentation, and the provenance table
//! format so every stage agrees on them.

// Item layout
/// Directory holding extracted or relocated content
pub const OBJECTS_DIR: &str = "objects";

/// Directory holding all metadata for an item
pub const METADATA_DIR: &str = "metadata";

/// Subdirectory of `metadata/` holding raw tool reports and provenance
pub const SUBMISSION_DOCUMENTATION_DIR: &str = "submissionDocumentation";

/// Marker file whose presence means the item is already a bag
pub const BAG_MARKER: &str = "bagit.txt";

/// Subdirectory of `objects/` receiving extracted files when the image is kept
pub const RETAINED_FILES_DIR: &str = "files";

/// Subdirectory of `objects/` receiving the disk image when it is kept
pub const RETAINED_IMAGE_DIR: &str = "disk-image";

/// Prefix for per-partition output directories under `objects/`
pub const PARTITION_DIR_PREFIX: &str = "partition_";

// Submission documentation file names
pub const DISKTYPE_REPORT: &str = "disktype.txt";
pub const MMLS_REPORT: &str = "mmls_output.txt";
pub const DFXML_DOCUMENT: &str = "dfxml.xml";
pub const PREMIS_TABLE: &str = "premis.csv";
pub const REMOVED_SYSTEM_FILES_LOG: &str = "removed_system_files.txt";
pub const BRUNNHILDE_DIR: &str = "brunnhilde";
pub const BULK_EXTRACTOR_DIR: &str = "bulk_extractor";

// Batch logs
pub const BATCH_LOGS_DIR: &str = "batch_processor_logs";
pub const BATCH_SUMMARY_NAME: &str = "batch_summary.json";

/// Column headers of the flushed provenance table, in order
pub const PREMIS_HEADERS: [&str; 6] = [
    "eventType",
    "eventOutcomeDetail",
    "timestamp",
    "eventDetailInfo",
    "eventDetailInfo_additional",
    "linkingAgentIDvalue",
];

// Provenance event types
pub const EVENT_FEATURE_ANALYSIS: &str = "forensic feature analysis";
pub const EVENT_REPLICATION: &str = "replication";
pub const EVENT_DIGEST_CALCULATION: &str = "message digest calculation";
pub const EVENT_METADATA_MODIFICATION: &str = "metadata modification";
pub const EVENT_METADATA_EXTRACTION: &str = "metadata extraction";
pub const EVENT_DELETION: &str = "deletion";

/// Outcome code recorded when a tool was killed, timed out or never started
pub const OUTCOME_NOT_COMPLETED: i32 = -1;

/// Number of header lines preceding partition rows in `mmls` output
pub const MMLS_HEADER_LINES: usize = 5;

/// Length of the `YYYY-MM-DDTHH:MM:SS` prefix used for timestamp correction
pub const TIMESTAMP_PREFIX_LEN: usize = 19;

/// Filesystem set reported for hybrid optical discs, sorted
pub const HYBRID_DISC_FILESYSTEMS: [&str; 3] = ["hfs plus", "iso9660", "udf"];

/// Filesystem a hybrid optical disc resolves to
pub const HYBRID_DISC_RESOLUTION: &str = "iso9660";

/// Agent string for steps performed by this crate itself
pub fn crate_agent() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
