//! Test utilities for bd_accessioner
//!
//! A scripted stand-in for the external tools plus helpers that lay out
//! item directories the way accessioning staff hand them over.

#![cfg(test)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

use crate::config::{PipelineConfig, ToolPaths};
use crate::tools::{Invocation, ToolOutput, ToolRunner};

type SideEffect = Box<dyn Fn(&Invocation)>;

struct Script {
    output: ToolOutput,
    effect: Option<SideEffect>,
}

/// Replays canned output per program and records every invocation.
///
/// Version queries (no arguments, or just `-V`) answer with the registered
/// version banner on both streams; other calls answer with the registered
/// script and run its side effect. Unknown programs exit 0 silently.
#[derive(Default)]
pub struct ScriptedRunner {
    scripts: HashMap<String, Script>,
    versions: HashMap<String, String>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, program: &str, output: ToolOutput) -> Self {
        self.scripts.insert(program.to_string(), Script { output, effect: None });
        self
    }

    pub fn on_with<F>(mut self, program: &str, output: ToolOutput, effect: F) -> Self
    where
        F: Fn(&Invocation) + 'static,
    {
        self.scripts.insert(
            program.to_string(),
            Script { output, effect: Some(Box::new(effect)) },
        );
        self
    }

    pub fn version(mut self, program: &str, banner: &str) -> Self {
        self.versions.insert(program.to_string(), banner.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    /// Invocations other than version queries of `program`, in call order
    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls
            .borrow()
            .iter()
            .filter(|inv| inv.program == program && !is_version_query(inv))
            .cloned()
            .collect()
    }
}

fn is_version_query(inv: &Invocation) -> bool {
    inv.args.is_empty() || inv.args == ["-V"]
}

impl ToolRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> ToolOutput {
        self.calls.borrow_mut().push(invocation.clone());

        if is_version_query(invocation) {
            let banner = self.versions.get(&invocation.program).cloned().unwrap_or_default();
            return ToolOutput::exited(0, &banner, &banner);
        }

        match self.scripts.get(&invocation.program) {
            Some(script) => {
                if let Some(effect) = &script.effect {
                    effect(invocation);
                }
                if let Some(path) = &invocation.stdout_path {
                    let _ = fs::write(path, &script.output.stdout);
                }
                script.output.clone()
            }
            None => ToolOutput::exited(0, "", ""),
        }
    }
}

/// Side effect for a carving tool: write `files` under the invocation's
/// output directory (its last argument for tsk_recover)
pub fn write_into_last_arg(files: &'static [(&'static str, &'static str)]) -> impl Fn(&Invocation) {
    move |inv: &Invocation| {
        if let Some(out) = inv.args.last() {
            for (name, content) in files {
                let path = Path::new(out).join(name);
                if let Some(parent) = path.parent() {
                    let _ = fs::create_dir_all(parent);
                }
                let _ = fs::write(path, content);
            }
        }
    }
}

/// Configuration pointing at bare program names with no privilege prefix
pub fn test_config(mount_point: &Path) -> PipelineConfig {
    PipelineConfig {
        tools: ToolPaths {
            unhfs: "unhfs".to_string(),
            privilege_prefix: None,
            ..ToolPaths::default()
        },
        mount_point: mount_point.to_path_buf(),
        ..PipelineConfig::default()
    }
}

/// Creates a batch directory holding one disk-image item named `name`
pub fn create_disk_image_item(batch: &Path, name: &str) -> Result<PathBuf> {
    let item = batch.join(name);
    fs::create_dir_all(&item)?;
    fs::write(item.join(format!("{}.iso", name)), b"not really a disk image")?;
    Ok(item)
}

/// Creates a folder item with a few files, including system junk
pub fn create_folder_item(batch: &Path, name: &str) -> Result<PathBuf> {
    let item = batch.join(name);
    fs::create_dir_all(item.join("letters"))?;
    fs::write(item.join("letters").join("1998-01.txt"), b"Dear board")?;
    fs::write(item.join("letters").join(".DS_Store"), b"junk")?;
    fs::write(item.join("notes.txt"), b"notes")?;
    Ok(item)
}

pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}
