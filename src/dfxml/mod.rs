//! Forensic metadata (DFXML) documents.
//!
//! Disk images get their document from `fiwalk`; folder transfers and
//! mounted volumes get one from a local directory walk. Either way the
//! document lives at `metadata/submissionDocumentation/dfxml.xml` and is
//! produced at most once per item.

/// Streaming `fileobject` reader
pub mod reader;

/// Directory-walk document writer
pub mod walk;

use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::config::ToolPaths;
use crate::constants::{crate_agent, EVENT_DIGEST_CALCULATION};
use crate::provenance::{now_timestamp, ProvenanceLog};
use crate::tools::{tool_version, Invocation, ToolRunner, VersionStream};

pub use reader::{visit_file, visit_records};
pub use walk::write_walk_document;

/// Generate the document for a disk image with fiwalk.
///
/// Does nothing when the document already exists. Returns whether fiwalk
/// was run.
pub fn generate_with_fiwalk(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    image_path: &Path,
    dfxml_path: &Path,
    log: &mut ProvenanceLog,
) -> bool {
    if dfxml_path.exists() {
        debug!("DFXML already present at {}, not regenerating", dfxml_path.display());
        return false;
    }

    let version = tool_version(runner, &tools.fiwalk, &["-V"], VersionStream::Stdout);
    let invocation = Invocation::new(tools.fiwalk.as_str())
        .arg("-X")
        .path_arg(dfxml_path)
        .path_arg(image_path);

    let timestamp = now_timestamp();
    let output = runner.run(&invocation);
    log.record(
        timestamp,
        EVENT_DIGEST_CALCULATION,
        output.outcome_code(),
        &invocation.command_line(),
        "Extracted information about the structure and characteristics of content on disk image",
        &format!("fiwalk: {}", version),
    );

    true
}

/// Generate the document for a directory tree by walking it.
///
/// Does nothing when the document already exists. A walk failure is recorded
/// with a nonzero outcome rather than returned. Returns whether a walk was
/// attempted.
pub fn generate_with_walk(root: &Path, dfxml_path: &Path, log: &mut ProvenanceLog) -> bool {
    if dfxml_path.exists() {
        debug!("DFXML already present at {}, not regenerating", dfxml_path.display());
        return false;
    }

    let timestamp = now_timestamp();
    let (outcome, note) = match write_walk_document(root, dfxml_path) {
        Ok(count) => {
            debug!("Walk described {} entries", count);
            (0, "Extracted information about the structure and characteristics of content on file system".to_string())
        }
        Err(e) => {
            warn!("Failed to generate DFXML for {}: {:#}", root.display(), e);
            // A partial document must not satisfy later existence checks
            let _ = fs::remove_file(dfxml_path);
            (1, format!("Failed to extract file system metadata: {:#}", e))
        }
    };

    log.record(
        timestamp,
        EVENT_DIGEST_CALCULATION,
        outcome,
        &format!("walk {}", root.display()),
        &note,
        &crate_agent(),
    );

    true
}
