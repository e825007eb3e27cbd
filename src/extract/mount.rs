use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use filetime::FileTime;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ToolPaths;
use crate::constants::{crate_agent, EVENT_REPLICATION};
use crate::dfxml::generate_with_walk;
use crate::error::ProcessingError;
use crate::extract::ExtractionContext;
use crate::provenance::{now_timestamp, ProvenanceLog};
use crate::tools::{Invocation, ToolRunner};

lazy_static! {
    /// The mount point is fixed, so only one mount copy may run at a time
    static ref MOUNT_LOCK: Mutex<()> = Mutex::new(());
}

const MOUNT_OPTIONS: &str = "loop,ro,noexec";

fn privileged(tools: &ToolPaths, program: &str) -> Invocation {
    match tools.privilege_prefix.as_deref() {
        Some(prefix) if !prefix.trim().is_empty() => Invocation::new(prefix).arg(program),
        _ => Invocation::new(program),
    }
}

/// Unmounts on drop, so the mount point is released on every exit path
struct MountGuard<'a> {
    runner: &'a dyn ToolRunner,
    tools: &'a ToolPaths,
    mount_point: PathBuf,
}

impl Drop for MountGuard<'_> {
    fn drop(&mut self) {
        let invocation = privileged(self.tools, &self.tools.umount).path_arg(&self.mount_point);
        let output = self.runner.run(&invocation);
        if output.success() {
            debug!("Unmounted {}", self.mount_point.display());
        } else {
            warn!("Failed to unmount {} (outcome {})", self.mount_point.display(), output.outcome_code());
        }
    }
}

/// Whether `dir` holds at least one regular file anywhere below it
pub fn destination_has_files(dir: &Path) -> bool {
    WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .any(|entry| entry.file_type().is_file())
}

fn copy_times(source: &fs::Metadata, target: &Path) -> Result<()> {
    let atime = FileTime::from_last_access_time(source);
    let mtime = FileTime::from_last_modification_time(source);
    filetime::set_file_times(target, atime, mtime)
        .context(format!("Failed to set times on {}", target.display()))
}

#[cfg(unix)]
fn copy_link(source: &Path, target: &Path) -> Result<()> {
    let link = fs::read_link(source).context(format!("Failed to read link {}", source.display()))?;
    std::os::unix::fs::symlink(&link, target).context(format!("Failed to create link {}", target.display()))
}

#[cfg(not(unix))]
fn copy_link(source: &Path, _target: &Path) -> Result<()> {
    warn!("Not copying link {}", source.display());
    Ok(())
}

/// Copy the tree under `source` into `destination`.
///
/// Links are recreated rather than followed. File and directory times are
/// carried over. Sockets, FIFOs and device nodes are skipped. Returns the
/// number of entries copied.
pub fn copy_tree(source: &Path, destination: &Path) -> Result<usize> {
    fs::create_dir_all(destination)
        .context(format!("Failed to create {}", destination.display()))?;

    let mut copied = 0usize;
    // Children before parents, so directory times survive their contents being written
    for entry in WalkDir::new(source).follow_links(false).min_depth(1).contents_first(true) {
        let entry = entry.context(format!("Failed to walk {}", source.display()))?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).context(format!("Failed to create {}", parent.display()))?;
        }

        if file_type.is_symlink() {
            copy_link(entry.path(), &target)?;
        } else if file_type.is_dir() {
            fs::create_dir_all(&target).context(format!("Failed to create {}", target.display()))?;
            copy_times(&entry.metadata()?, &target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)
                .context(format!("Failed to copy {} to {}", entry.path().display(), target.display()))?;
            copy_times(&entry.metadata()?, &target)?;
        } else {
            warn!("Skipping special file {}", entry.path().display());
            continue;
        }
        copied += 1;
    }

    Ok(copied)
}

/// Mount the image read-only and copy its whole tree into `output_dir`.
///
/// Fails with [`ProcessingError::DestinationPopulated`] when `output_dir`
/// already holds files. An absent or empty destination is cleared and
/// recreated. The DFXML document is produced by walking the mounted tree.
pub fn mount_copy(ctx: &ExtractionContext<'_>, output_dir: &Path, log: &mut ProvenanceLog) -> Result<()> {
    info!("Mounting image and copying files");

    if destination_has_files(output_dir) {
        return Err(ProcessingError::DestinationPopulated(output_dir.to_path_buf()).into());
    }
    if output_dir.exists() {
        fs::remove_dir_all(output_dir)
            .context(format!("Failed to clear {}", output_dir.display()))?;
    }

    let _lock = MOUNT_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    let tools = &ctx.config.tools;
    let mount_point = &ctx.config.mount_point;
    let mount = privileged(tools, &tools.mount)
        .args(["-o", MOUNT_OPTIONS])
        .path_arg(ctx.image_path)
        .path_arg(mount_point);
    let timestamp = now_timestamp();
    let output = ctx.runner.run(&mount);
    let _guard = MountGuard {
        runner: ctx.runner,
        tools,
        mount_point: mount_point.clone(),
    };
    let detail = format!("copy {} {}", mount_point.display(), output_dir.display());

    if !output.success() {
        warn!("Mounting {} returned outcome {}", ctx.image_path.display(), output.outcome_code());
        log.record(
            timestamp,
            EVENT_REPLICATION,
            output.outcome_code(),
            &detail,
            &format!("Mounting disk image failed: {}", mount.command_line()),
            &crate_agent(),
        );
        return Ok(());
    }

    generate_with_walk(mount_point, &ctx.dfxml_path(), log);

    let timestamp = now_timestamp();
    let (outcome, note) = match copy_tree(mount_point, output_dir) {
        Ok(count) => {
            debug!("Copied {} entries from {}", count, mount_point.display());
            (0, "Created a bit-wise identical copy of contents on disk image".to_string())
        }
        Err(e) => {
            warn!("Copy from {} failed: {:#}", mount_point.display(), e);
            (1, format!("Copy from mounted image failed: {:#}", e))
        }
    };
    log.record(
        timestamp,
        EVENT_REPLICATION,
        outcome,
        &detail,
        &note,
        &crate_agent(),
    );

    Ok(())
}
