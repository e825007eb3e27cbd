use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::info;

use crate::constants::EVENT_REPLICATION;
use crate::dfxml::generate_with_fiwalk;
use crate::extract::ExtractionContext;
use crate::models::VolumeDescriptor;
use crate::provenance::{now_timestamp, ProvenanceLog};
use crate::reconcile::reconcile_timestamps;
use crate::tools::{tool_version, Invocation, VersionStream};

/// Carve a volume with tsk_recover and restore original timestamps
pub fn tool_carve(
    ctx: &ExtractionContext<'_>,
    volume: &VolumeDescriptor,
    output_dir: &Path,
    log: &mut ProvenanceLog,
) -> Result<()> {
    let dfxml_path = ctx.dfxml_path();
    let tools = &ctx.config.tools;
    generate_with_fiwalk(ctx.runner, tools, ctx.image_path, &dfxml_path, log);

    info!("Carving files using tsk_recover");
    let version = tool_version(ctx.runner, &tools.tsk_recover, &["-V"], VersionStream::Stdout);

    fs::create_dir_all(output_dir)
        .context(format!("Failed to create output directory {}", output_dir.display()))?;

    let mut invocation = Invocation::new(tools.tsk_recover.as_str()).arg("-a");
    if let Some(start) = volume.start_sector {
        invocation = invocation.arg("-o").arg(start.to_string());
    }
    let invocation = invocation.path_arg(ctx.image_path).path_arg(output_dir);

    let timestamp = now_timestamp();
    let output = ctx.runner.run(&invocation);
    log.record(
        timestamp,
        EVENT_REPLICATION,
        output.outcome_code(),
        &invocation.command_line(),
        "Created a bit-wise identical copy of contents on disk image",
        &format!("tsk_recover: {}", version),
    );

    reconcile_timestamps(&dfxml_path, output_dir, log);
    Ok(())
}

/// Extract an HFS-family volume with unhfs, keeping resource forks as
/// AppleDouble sidecars. unhfs sets native timestamps itself, so no
/// reconciliation pass follows.
pub fn driver_carve(
    ctx: &ExtractionContext<'_>,
    volume: &VolumeDescriptor,
    output_dir: &Path,
    log: &mut ProvenanceLog,
) -> Result<()> {
    let tools = &ctx.config.tools;
    generate_with_fiwalk(ctx.runner, tools, ctx.image_path, &ctx.dfxml_path(), log);

    info!("Carving files using unhfs");
    // unhfs prints its banner on stderr when run without arguments
    let version = tool_version(ctx.runner, &tools.unhfs, &[], VersionStream::Stderr);

    let mut invocation = Invocation::new(tools.unhfs.as_str());
    if let Some(slot) = &volume.slot {
        invocation = invocation.arg("-partition").arg(slot.as_str());
    }
    let invocation = invocation
        .args(["-resforks", "APPLEDOUBLE", "-o"])
        .path_arg(output_dir)
        .path_arg(ctx.image_path);

    let timestamp = now_timestamp();
    let output = ctx.runner.run(&invocation);
    log.record(
        timestamp,
        EVENT_REPLICATION,
        output.outcome_code(),
        &invocation.command_line(),
        "Created a bit-wise identical copy of disk image",
        &version,
    );

    Ok(())
}
