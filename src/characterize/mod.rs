//! Filesystem & Partition Parser.
//!
//! Turns the free-text reports of `disktype` (and, for truly partitioned
//! disks, `mmls`) into [`VolumeDescriptor`]s. The tools have no
//! machine-readable output, so all matching is done against their literal
//! text conventions:
//!
//! ```text
//! disktype report ──► DisktypeReport::layout()
//!                        │
//!        ┌───────────────┴───────────────┐
//!  Unpartitioned                    Partitioned
//!  (one whole-disk volume)          mmls rows ──► block_for(start, length)
//!                                                   │
//!                                   one volume per row with a matching block
//! ```

/// disktype report splitting and filesystem-line extraction
pub mod disktype;

/// mmls partition table rows
pub mod mmls;

/// Filesystem name resolution rule
pub mod resolve;

use std::path::Path;

use log::{debug, info, warn};

use crate::config::ToolPaths;
use crate::constants::{DISKTYPE_REPORT, EVENT_FEATURE_ANALYSIS, MMLS_REPORT};
use crate::models::VolumeDescriptor;
use crate::provenance::{now_timestamp, ProvenanceLog};
use crate::tools::{tool_version, Invocation, ToolRunner, VersionStream};

pub use disktype::{filesystem_names, DiskLayout, DisktypeReport};
pub use mmls::{parse_partition_rows, PartitionRow};
pub use resolve::resolve_filesystem;

/// Build the volume list for a disk from its characterization report.
///
/// `partition_table` is only called for truly partitioned disks and should
/// return the raw `mmls` report. Partition rows that match no report block
/// produce no volume.
pub fn discover_volumes<F>(report: &str, partition_table: F) -> Vec<VolumeDescriptor>
where
    F: FnOnce() -> Option<String>,
{
    let parsed = DisktypeReport::parse(report);

    let table = match parsed.layout() {
        DiskLayout::Unpartitioned { filesystems } => {
            return vec![VolumeDescriptor::whole_disk(filesystems)];
        }
        DiskLayout::Partitioned => partition_table(),
    };

    let table = match table {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            warn!("Partition table is empty, no partitions can be addressed");
            return Vec::new();
        }
    };

    let mut volumes = Vec::new();
    for row in parse_partition_rows(&table) {
        let block = match parsed.block_for(&row.start, &row.length) {
            Some(block) => block,
            None => {
                debug!("No filesystem block matches partition row {} (start {}, length {})", row.slot, row.start, row.length);
                continue;
            }
        };
        let start = match row.start_sector() {
            Some(start) => start,
            None => {
                warn!("Partition row {} has a non-numeric start sector {}", row.slot, row.start);
                continue;
            }
        };
        volumes.push(VolumeDescriptor::partition(&row.slot, start, filesystem_names(block)));
    }

    info!("Found {} partition(s) with identifiable filesystems", volumes.len());
    volumes
}

/// Run disktype against the image, saving its report into submission
/// documentation, and return the report text
pub fn run_disktype(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    image_path: &Path,
    subdoc_dir: &Path,
    log: &mut ProvenanceLog,
) -> String {
    info!("Characterizing disk image {}", image_path.display());

    let report_path = subdoc_dir.join(DISKTYPE_REPORT);
    let invocation = Invocation::new(tools.disktype.as_str())
        .path_arg(image_path)
        .stdout_to(&report_path);

    let timestamp = now_timestamp();
    let output = runner.run(&invocation);
    log.record(
        timestamp,
        EVENT_FEATURE_ANALYSIS,
        output.outcome_code(),
        &invocation.command_line(),
        "Determined disk image file system information",
        "disktype",
    );

    output.stdout
}

/// Run mmls against the image, saving its report, and return the report text
pub fn run_mmls(
    runner: &dyn ToolRunner,
    tools: &ToolPaths,
    image_path: &Path,
    subdoc_dir: &Path,
    log: &mut ProvenanceLog,
) -> String {
    info!("Reading partition layout with mmls");

    let version = tool_version(runner, &tools.mmls, &["-V"], VersionStream::Stdout);
    let report_path = subdoc_dir.join(MMLS_REPORT);
    let invocation = Invocation::new(tools.mmls.as_str())
        .path_arg(image_path)
        .stdout_to(&report_path);

    let timestamp = now_timestamp();
    let output = runner.run(&invocation);
    log.record(
        timestamp,
        EVENT_FEATURE_ANALYSIS,
        output.outcome_code(),
        &invocation.command_line(),
        "Determined the layout of partitions",
        &format!("mmls: {}", version),
    );

    output.stdout
}
