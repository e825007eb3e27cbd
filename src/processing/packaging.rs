use std::fs;
use std::path::Path;

use log::{debug, info, warn};

use crate::config::ToolPaths;
use crate::constants::{BRUNNHILDE_DIR, BULK_EXTRACTOR_DIR, EVENT_METADATA_EXTRACTION};
use crate::provenance::{now_timestamp, ProvenanceLog};
use crate::tools::{tool_version, Invocation, ToolOutput, ToolRunner, VersionStream};

/// Run brunnhilde over the object tree, writing its reports into
/// submission documentation, then drop empty bulk_extractor reports
pub fn run_format_scan(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    objects_dir: &Path,
    subdoc_dir: &Path,
    log: &mut ProvenanceLog,
) -> ToolOutput {
    info!("Running brunnhilde");

    let version = tool_version(runner, &tools.brunnhilde, &["-V"], VersionStream::Stdout);
    let report_dir = subdoc_dir.join(BRUNNHILDE_DIR);
    let invocation = Invocation::new(tools.brunnhilde.as_str())
        .arg("-zbn")
        .path_arg(objects_dir)
        .path_arg(&report_dir);

    let timestamp = now_timestamp();
    let output = runner.run(&invocation);
    log.record(
        timestamp,
        EVENT_METADATA_EXTRACTION,
        output.outcome_code(),
        &invocation.command_line(),
        "Determined file formats and scanned for potentially sensitive information",
        &version,
    );

    prune_empty_reports(&report_dir.join(BULK_EXTRACTOR_DIR));
    output
}

/// Delete zero-length files directly inside `dir`. A missing directory is
/// not an error. Returns how many files were removed.
pub fn prune_empty_reports(dir: &Path) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("No bulk_extractor reports at {}: {}", dir.display(), e);
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let is_empty_file = entry
            .metadata()
            .map(|m| m.is_file() && m.len() == 0)
            .unwrap_or(false);
        if !is_empty_file {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove empty report {}: {}", path.display(), e),
        }
    }

    debug!("Removed {} empty bulk_extractor reports", removed);
    removed
}

/// Hand the item to bagit.py. The outcome is logged only; the provenance
/// table is already written by the time the bag is made.
pub fn bag_item(runner: &dyn ToolRunner, tools: &ToolPaths, item_dir: &Path) -> ToolOutput {
    info!("Bagging {}", item_dir.display());

    let invocation = Invocation::new(tools.bagit.as_str())
        .args(["--quiet", "--md5"])
        .path_arg(item_dir);
    let output = runner.run(&invocation);
    if !output.success() {
        warn!("Bagging {} finished with outcome {}", item_dir.display(), output.outcome_code());
    }
    output
}
