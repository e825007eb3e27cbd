//! Extraction Dispatcher.
//!
//! A volume's resolved filesystem name selects one of three ways of getting
//! files off the image:
//!
//! - **tool carve**: `tsk_recover`, followed by timestamp reconciliation
//! - **driver carve**: HFSExplorer's `unhfs`, keeping resource forks
//! - **mount copy**: loop-mount read-only and copy the tree
//!
//! Anything else is skipped. Tool failures are recorded, never raised; the
//! only error this module returns is the populated-destination guard of the
//! mount copy.

/// tsk_recover and unhfs extraction
pub mod carve;

/// Loop-mount and copy extraction
pub mod mount;

use std::path::{Path, PathBuf};

use anyhow::Result;
use log::{info, warn};

use crate::characterize::resolve_filesystem;
use crate::config::PipelineConfig;
use crate::constants::DFXML_DOCUMENT;
use crate::models::VolumeDescriptor;
use crate::provenance::ProvenanceLog;
use crate::tools::ToolRunner;

const TOOL_CARVE_FILESYSTEMS: [&str; 10] = [
    "ntfs", "fat", "exfat", "ext", "iso9660", "hfs+", "ufs", "raw", "swap", "yaffs2",
];

const DRIVER_CARVE_FILESYSTEMS: [&str; 6] = ["osx", "hfs", "apple", "apple_hfs", "mfs", "hfs plus"];

const MOUNT_COPY_FILESYSTEMS: [&str; 1] = ["udf"];

pub const UNIDENTIFIED_FILESYSTEM: &str = "Unable to identify filesystem";
pub const UNSUPPORTED_FILESYSTEM: &str = "Filesystem not supported";

/// How files are taken off a volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStrategy {
    ToolCarve,
    DriverCarve,
    MountCopy,
    Unsupported,
}

/// Pick the extraction strategy for a resolved filesystem name
pub fn strategy_for(filesystem: &str) -> ExtractionStrategy {
    if TOOL_CARVE_FILESYSTEMS.contains(&filesystem) {
        ExtractionStrategy::ToolCarve
    } else if DRIVER_CARVE_FILESYSTEMS.contains(&filesystem) {
        ExtractionStrategy::DriverCarve
    } else if MOUNT_COPY_FILESYSTEMS.contains(&filesystem) {
        ExtractionStrategy::MountCopy
    } else {
        ExtractionStrategy::Unsupported
    }
}

/// Result of extracting one volume
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeOutcome {
    Extracted { filesystem: String, strategy: ExtractionStrategy },
    Skipped { reason: String },
}

impl VolumeOutcome {
    pub fn is_extracted(&self) -> bool {
        matches!(self, VolumeOutcome::Extracted { .. })
    }
}

/// Everything about the disk image that extraction needs
pub struct ExtractionContext<'a> {
    pub runner: &'a dyn ToolRunner,
    pub config: &'a PipelineConfig,
    pub image_path: &'a Path,
    pub subdoc_dir: &'a Path,
}

impl<'a> ExtractionContext<'a> {
    pub fn dfxml_path(&self) -> PathBuf {
        self.subdoc_dir.join(DFXML_DOCUMENT)
    }
}

/// Extract one volume into `output_dir`.
///
/// Unresolvable and unsupported filesystems are skipped without touching
/// `output_dir`.
pub fn extract_volume(
    ctx: &ExtractionContext<'_>,
    volume: &VolumeDescriptor,
    output_dir: &Path,
    log: &mut ProvenanceLog,
) -> Result<VolumeOutcome> {
    let filesystem = match resolve_filesystem(&volume.filesystems) {
        Some(filesystem) => filesystem,
        None => {
            warn!("Unable to identify filesystem from {:?}", volume.filesystems);
            return Ok(VolumeOutcome::Skipped { reason: UNIDENTIFIED_FILESYSTEM.to_string() });
        }
    };

    let strategy = strategy_for(&filesystem);
    info!("Extracting {} volume into {} ({:?})", filesystem, output_dir.display(), strategy);

    match strategy {
        ExtractionStrategy::ToolCarve => carve::tool_carve(ctx, volume, output_dir, log)?,
        ExtractionStrategy::DriverCarve => carve::driver_carve(ctx, volume, output_dir, log)?,
        ExtractionStrategy::MountCopy => mount::mount_copy(ctx, output_dir, log)?,
        ExtractionStrategy::Unsupported => {
            warn!("No extraction method for {} filesystem", filesystem);
            return Ok(VolumeOutcome::Skipped { reason: UNSUPPORTED_FILESYSTEM.to_string() });
        }
    }

    Ok(VolumeOutcome::Extracted { filesystem, strategy })
}
