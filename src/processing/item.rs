use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{info, warn};

use crate::characterize::{discover_volumes, run_disktype, run_mmls};
use crate::config::PipelineConfig;
use crate::constants::{
    BAG_MARKER, DFXML_DOCUMENT, METADATA_DIR, OBJECTS_DIR, PARTITION_DIR_PREFIX, PREMIS_TABLE,
    SUBMISSION_DOCUMENTATION_DIR,
};
use crate::dfxml::generate_with_walk;
use crate::error::ProcessingError;
use crate::extract::{extract_volume, ExtractionContext, VolumeOutcome};
use crate::models::{ItemKind, ItemStatus, VolumeDescriptor};
use crate::processing::cleanup::remove_system_files;
use crate::processing::packaging::{bag_item, run_format_scan};
use crate::processing::retention::dispose_image;
use crate::provenance::ProvenanceLog;
use crate::tools::ToolRunner;

/// Fixed directory layout of an item being accessioned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLayout {
    pub root: PathBuf,
    pub objects: PathBuf,
    pub metadata: PathBuf,
    pub subdoc: PathBuf,
}

impl ItemLayout {
    pub fn new(root: &Path) -> Self {
        let metadata = root.join(METADATA_DIR);
        Self {
            root: root.to_path_buf(),
            objects: root.join(OBJECTS_DIR),
            subdoc: metadata.join(SUBMISSION_DOCUMENTATION_DIR),
            metadata,
        }
    }

    pub fn create(&self) -> Result<()> {
        for dir in [&self.objects, &self.metadata, &self.subdoc] {
            fs::create_dir_all(dir).context(format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn dfxml_path(&self) -> PathBuf {
        self.subdoc.join(DFXML_DOCUMENT)
    }

    pub fn premis_path(&self) -> PathBuf {
        self.subdoc.join(PREMIS_TABLE)
    }
}

/// Terminal result of one item run
#[derive(Debug)]
pub struct ItemOutcome {
    pub item_dir: PathBuf,
    pub kind: ItemKind,
    pub status: ItemStatus,
    pub message: Option<String>,
    pub provenance: ProvenanceLog,
}

/// Refuse items that were already repackaged or bagged
pub fn check_preconditions(item_dir: &Path) -> Result<()> {
    let mut names: Vec<String> = fs::read_dir(item_dir)
        .context(format!("Failed to read item directory {}", item_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();

    if names == [METADATA_DIR, OBJECTS_DIR] {
        return Err(ProcessingError::AlreadyRepackaged(item_dir.to_path_buf()).into());
    }
    if names.iter().any(|name| name == BAG_MARKER) {
        return Err(ProcessingError::AlreadyBagged(item_dir.to_path_buf()).into());
    }
    Ok(())
}

/// Locate the single disk image at the top of an item directory
pub fn find_disk_image(item_dir: &Path, config: &PipelineConfig) -> Result<PathBuf> {
    let mut images: Vec<PathBuf> = fs::read_dir(item_dir)
        .context(format!("Failed to read item directory {}", item_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter(|entry| config.is_disk_image_name(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path())
        .collect();

    if images.len() != 1 {
        return Err(ProcessingError::DiskImageCount {
            dir: item_dir.to_path_buf(),
            found: images.len(),
        }
        .into());
    }
    Ok(images.remove(0))
}

/// Top-level names of the object tree that mark optical video content
pub fn video_markers_present(objects_dir: &Path, config: &PipelineConfig) -> Vec<String> {
    let names: Vec<String> = match fs::read_dir(objects_dir) {
        Ok(entries) => entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => return Vec::new(),
    };

    config
        .video_markers
        .iter()
        .filter(|marker| names.contains(marker))
        .cloned()
        .collect()
}

fn video_message(config: &PipelineConfig) -> String {
    format!("Image contains {} directories", config.video_markers.join(" or "))
}

/// Output directory for a volume: the object tree itself for a single
/// volume, `partition_<slot>` below it otherwise
fn volume_output_dir(objects_dir: &Path, volume: &VolumeDescriptor, multiple: bool) -> PathBuf {
    match (&volume.slot, multiple) {
        (Some(slot), true) => objects_dir.join(format!("{}{}", PARTITION_DIR_PREFIX, slot)),
        _ => objects_dir.to_path_buf(),
    }
}

/// Decide the item status from per-volume outcomes
fn summarize_extraction(outcomes: &[(VolumeDescriptor, VolumeOutcome)]) -> (ItemStatus, Option<String>) {
    let skipped: Vec<(&VolumeDescriptor, &str)> = outcomes
        .iter()
        .filter_map(|(volume, outcome)| match outcome {
            VolumeOutcome::Skipped { reason } => Some((volume, reason.as_str())),
            VolumeOutcome::Extracted { .. } => None,
        })
        .collect();

    if skipped.is_empty() {
        return (ItemStatus::Success, None);
    }

    if skipped.len() == outcomes.len() {
        let mut reasons: Vec<&str> = skipped.iter().map(|(_, reason)| *reason).collect();
        reasons.dedup();
        return (ItemStatus::Skipped, Some(reasons.join("; ")));
    }

    let detail = skipped
        .iter()
        .map(|(volume, reason)| format!("{} ({})", volume.slot.as_deref().unwrap_or("whole disk"), reason))
        .collect::<Vec<_>>()
        .join(", ");
    (ItemStatus::Success, Some(format!("Skipped partitions: {}", detail)))
}

fn finish(
    layout: &ItemLayout,
    kind: ItemKind,
    status: ItemStatus,
    message: Option<String>,
    mut provenance: ProvenanceLog,
) -> Result<ItemOutcome> {
    provenance.flush(&layout.premis_path())?;
    match &message {
        Some(message) => info!("{} finished as {}: {}", layout.root.display(), status, message),
        None => info!("{} finished as {}", layout.root.display(), status),
    }
    Ok(ItemOutcome {
        item_dir: layout.root.clone(),
        kind,
        status,
        message,
        provenance,
    })
}

/// Accession a directory holding one disk image
pub fn process_disk_image_item(
    item_dir: &Path,
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
) -> Result<ItemOutcome> {
    info!("Processing disk image item {}", item_dir.display());

    check_preconditions(item_dir)?;
    let image_path = find_disk_image(item_dir, config)?;
    let layout = ItemLayout::new(item_dir);
    layout.create()?;

    let mut provenance = ProvenanceLog::new();
    let tools = &config.tools;

    let report = run_disktype(runner, tools, &image_path, &layout.subdoc, &mut provenance);
    let volumes = discover_volumes(&report, || {
        Some(run_mmls(runner, tools, &image_path, &layout.subdoc, &mut provenance))
    });

    // With no addressable volume the whole disk goes through resolution, which skips it
    let volumes = if volumes.is_empty() {
        vec![VolumeDescriptor::whole_disk(Vec::new())]
    } else {
        volumes
    };
    let multiple = volumes.len() > 1;

    let ctx = ExtractionContext {
        runner,
        config,
        image_path: &image_path,
        subdoc_dir: &layout.subdoc,
    };
    let mut outcomes = Vec::with_capacity(volumes.len());
    for volume in volumes {
        let output_dir = volume_output_dir(&layout.objects, &volume, multiple);
        let outcome = extract_volume(&ctx, &volume, &output_dir, &mut provenance)?;
        if let VolumeOutcome::Skipped { reason } = &outcome {
            warn!("Skipping volume {}: {}", volume.slot.as_deref().unwrap_or("(whole disk)"), reason);
        }
        outcomes.push((volume, outcome));
    }

    let (status, message) = match summarize_extraction(&outcomes) {
        (ItemStatus::Success, message) => {
            let markers = video_markers_present(&layout.objects, config);
            if markers.is_empty() {
                (ItemStatus::Success, message)
            } else {
                warn!("Found {} in {}", markers.join(", "), layout.objects.display());
                (ItemStatus::Flagged, Some(video_message(config)))
            }
        }
        other => other,
    };
    if status.is_terminal_early() {
        return finish(&layout, ItemKind::DiskImage, status, message, provenance);
    }

    remove_system_files(&layout.objects, &layout.subdoc, config, &mut provenance)?;
    run_format_scan(runner, tools, &layout.objects, &layout.subdoc, &mut provenance);
    dispose_image(&image_path, &layout.objects, config.keep_image)?;

    let outcome = finish(&layout, ItemKind::DiskImage, status, message, provenance)?;
    bag_item(runner, tools, item_dir);
    Ok(outcome)
}

/// Move everything at the top of the item except the layout directories
/// into `objects/`
fn move_contents(layout: &ItemLayout) -> Result<usize> {
    let mut moved = 0;
    for entry in fs::read_dir(&layout.root).context(format!("Failed to read {}", layout.root.display()))? {
        let entry = entry?;
        let name = entry.file_name();
        if name == OBJECTS_DIR || name == METADATA_DIR {
            continue;
        }
        let target = layout.objects.join(&name);
        fs::rename(entry.path(), &target)
            .context(format!("Failed to move {} into {}", entry.path().display(), layout.objects.display()))?;
        moved += 1;
    }
    Ok(moved)
}

/// Accession a loose folder transfer
pub fn process_folder_item(
    item_dir: &Path,
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
) -> Result<ItemOutcome> {
    info!("Processing folder item {}", item_dir.display());

    check_preconditions(item_dir)?;
    let layout = ItemLayout::new(item_dir);
    layout.create()?;

    let moved = move_contents(&layout)?;
    info!("Moved {} entries into {}", moved, layout.objects.display());

    let mut provenance = ProvenanceLog::new();
    remove_system_files(&layout.objects, &layout.subdoc, config, &mut provenance)?;
    generate_with_walk(&layout.objects, &layout.dfxml_path(), &mut provenance);
    run_format_scan(runner, &config.tools, &layout.objects, &layout.subdoc, &mut provenance);

    let outcome = finish(&layout, ItemKind::Folder, ItemStatus::Success, None, provenance)?;
    bag_item(runner, &config.tools, item_dir);
    Ok(outcome)
}

/// Accession one item of the given kind
pub fn process_item(
    item_dir: &Path,
    kind: ItemKind,
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
) -> Result<ItemOutcome> {
    match kind {
        ItemKind::DiskImage => process_disk_image_item(item_dir, config, runner),
        ItemKind::Folder => process_folder_item(item_dir, config, runner),
    }
}
