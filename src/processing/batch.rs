use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use log::{info, warn};
use serde_json::json;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::constants::{BATCH_LOGS_DIR, BATCH_SUMMARY_NAME};
use crate::models::{ItemKind, ItemStatus};
use crate::processing::item::{process_item, ItemOutcome};
use crate::tools::ToolRunner;

/// Per-item results of a batch run
#[derive(Debug)]
pub struct BatchReport {
    pub batch_id: String,
    pub source_dir: PathBuf,
    pub kind: ItemKind,
    pub started: DateTime<Local>,
    pub finished: DateTime<Local>,
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    /// Item directories grouped by terminal status
    pub fn items_by_status(&self) -> BTreeMap<ItemStatus, Vec<&Path>> {
        let mut grouped: BTreeMap<ItemStatus, Vec<&Path>> = BTreeMap::new();
        for status in [ItemStatus::Success, ItemStatus::Skipped, ItemStatus::Flagged] {
            grouped.insert(status, Vec::new());
        }
        for item in &self.items {
            grouped.entry(item.status).or_default().push(item.item_dir.as_path());
        }
        grouped
    }

    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|item| item.status == status).count()
    }
}

/// Item directories of a batch, sorted by name. The batch log directory is
/// not an item.
pub fn list_items(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut items: Vec<PathBuf> = fs::read_dir(source_dir)
        .context(format!("Failed to read batch directory {}", source_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|entry| entry.file_name() != BATCH_LOGS_DIR)
        .map(|entry| entry.path())
        .collect();
    items.sort();
    Ok(items)
}

/// Render the JSON summary of a finished batch
pub fn create_batch_summary(hostname: &str, report: &BatchReport) -> Result<String> {
    let items: Vec<_> = report
        .items
        .iter()
        .map(|item| {
            json!({
                "path": item.item_dir,
                "status": item.status,
                "message": item.message,
                "provenance_events": item.provenance.len(),
            })
        })
        .collect();

    let summary = json!({
        "batch_id": report.batch_id,
        "hostname": hostname,
        "source": report.source_dir,
        "transfer_type": report.kind.to_string(),
        "started": report.started.to_rfc3339(),
        "finished": report.finished.to_rfc3339(),
        "accessioner_version": env!("CARGO_PKG_VERSION"),
        "counts": {
            "success": report.count(ItemStatus::Success),
            "skipped": report.count(ItemStatus::Skipped),
            "flagged": report.count(ItemStatus::Flagged),
        },
        "items": items,
    });

    serde_json::to_string_pretty(&summary).context("Failed to serialize batch summary to JSON")
}

/// Write `<status>.txt` lists and the JSON summary into the batch log
/// directory
pub fn write_batch_logs(report: &BatchReport) -> Result<PathBuf> {
    let logs_dir = report.source_dir.join(BATCH_LOGS_DIR);
    fs::create_dir_all(&logs_dir)
        .context(format!("Failed to create {}", logs_dir.display()))?;

    for (status, items) in report.items_by_status() {
        let listing = items
            .iter()
            .map(|p| p.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("\n");
        let path = logs_dir.join(format!("{}.txt", status.as_str()));
        fs::write(&path, listing).context(format!("Failed to write {}", path.display()))?;
    }

    let hostname = match hostname::get() {
        Ok(name) => name.to_string_lossy().to_string(),
        Err(e) => {
            warn!("Failed to get hostname: {}", e);
            "unknown".to_string()
        }
    };
    let summary_path = logs_dir.join(BATCH_SUMMARY_NAME);
    fs::write(&summary_path, create_batch_summary(&hostname, report)?)
        .context(format!("Failed to write {}", summary_path.display()))?;

    info!("Batch logs written to {}", logs_dir.display());
    Ok(logs_dir)
}

/// Accession every item directory in `source_dir`, one after another.
///
/// A fatal error on any item stops the batch; logs are only written for a
/// batch that ran to the end.
pub fn process_batch(
    source_dir: &Path,
    kind: ItemKind,
    config: &PipelineConfig,
    runner: &dyn ToolRunner,
) -> Result<BatchReport> {
    let batch_id = Uuid::new_v4().to_string();
    let started = Local::now();
    let item_dirs = list_items(source_dir)?;
    info!("Batch {}: {} {} item(s) in {}", batch_id, item_dirs.len(), kind, source_dir.display());

    let mut items = Vec::with_capacity(item_dirs.len());
    for (index, item_dir) in item_dirs.iter().enumerate() {
        info!("Item {}/{}: {}", index + 1, item_dirs.len(), item_dir.display());
        let outcome = process_item(item_dir, kind, config, runner)
            .with_context(|| format!("Batch stopped at {}", item_dir.display()))?;
        items.push(outcome);
    }

    let report = BatchReport {
        batch_id,
        source_dir: source_dir.to_path_buf(),
        kind,
        started,
        finished: Local::now(),
        items,
    };
    write_batch_logs(&report)?;

    info!(
        "Batch finished: {} success, {} skipped, {} flagged",
        report.count(ItemStatus::Success),
        report.count(ItemStatus::Skipped),
        report.count(ItemStatus::Flagged)
    );
    Ok(report)
}
