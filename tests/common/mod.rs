//! Shared fixtures for the integration tests.
//!
//! The real forensic tools are replaced by a runner that replays canned
//! output per program and can drop files where a tool would have written
//! them.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use bd_accessioner::config::{PipelineConfig, ToolPaths};
use bd_accessioner::tools::{Invocation, ToolOutput, ToolRunner};

type Handler = Box<dyn Fn(&Invocation) -> ToolOutput>;

#[derive(Default)]
pub struct FakeTools {
    handlers: HashMap<String, Handler>,
    calls: RefCell<Vec<Invocation>>,
}

impl FakeTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, program: &str, code: i32, stdout: &str) -> Self {
        let stdout = stdout.to_string();
        self.respond_by(program, move |_| ToolOutput::exited(code, &stdout, ""))
    }

    /// Exit with `code` after running `effect`, e.g. to drop carved files
    pub fn respond_with<F>(self, program: &str, code: i32, effect: F) -> Self
    where
        F: Fn(&Invocation) + 'static,
    {
        self.respond_by(program, move |inv| {
            effect(inv);
            ToolOutput::exited(code, "", "")
        })
    }

    pub fn respond_by<F>(mut self, program: &str, handler: F) -> Self
    where
        F: Fn(&Invocation) -> ToolOutput + 'static,
    {
        self.handlers.insert(program.to_string(), Box::new(handler));
        self
    }

    /// Real invocations of `program`; version queries are left out
    pub fn invocations_of(&self, program: &str) -> Vec<Invocation> {
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

impl ToolRunner for FakeTools {
    fn run(&self, invocation: &Invocation) -> ToolOutput {
        self.calls.borrow_mut().push(invocation.clone());
        if is_version_query(invocation) {
            return ToolOutput::exited(0, "fake 1.0", "fake 1.0");
        }

        let output = match self.handlers.get(&invocation.program) {
            Some(handler) => handler(invocation),
            None => ToolOutput::exited(0, "", ""),
        };
        if let Some(path) = &invocation.stdout_path {
            let _ = fs::write(path, &output.stdout);
        }
        output
    }
}

/// Writes `files` below the directory named by the invocation's last argument
pub fn populate_last_arg(files: &'static [(&'static str, &'static str)]) -> impl Fn(&Invocation) {
    move |inv: &Invocation| {
        let out = Path::new(inv.args.last().map(String::as_str).unwrap_or_default()).to_path_buf();
        for (name, content) in files {
            let path = out.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }
}

/// Writes a small DFXML document to the path following `-X`
pub fn write_dfxml(inv: &Invocation) {
    let position = inv.args.iter().position(|a| a == "-X").unwrap();
    let path = PathBuf::from(&inv.args[position + 1]);
    fs::write(
        path,
        "<?xml version=\"1.0\"?>\n<dfxml version=\"1.0\">\n  <volume>\n    <fileobject>\n      \
         <filename>PHOTOS/001.JPG</filename>\n      <name_type>r</name_type>\n      \
         <mtime>1999-03-14T09:26:53Z</mtime>\n    </fileobject>\n  </volume>\n</dfxml>\n",
    )
    .unwrap();
}

pub fn config_for(mount_point: &Path) -> PipelineConfig {
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

pub fn disk_image_item(batch: &Path, name: &str) -> Result<PathBuf> {
    let item = batch.join(name);
    fs::create_dir_all(&item)?;
    fs::write(item.join(format!("{}.iso", name)), b"image bytes")?;
    Ok(item)
}

pub fn folder_item(batch: &Path, name: &str) -> Result<PathBuf> {
    let item = batch.join(name);
    fs::create_dir_all(item.join("correspondence"))?;
    fs::write(item.join("correspondence").join("letter.txt"), b"Dear board")?;
    fs::write(item.join("correspondence").join("Thumbs.db"), b"junk")?;
    fs::create_dir_all(item.join(".Trashes"))?;
    fs::write(item.join(".Trashes").join("501"), b"trash")?;
    Ok(item)
}

/// Rows of the provenance table, header excluded
pub fn premis_rows(item: &Path) -> Result<Vec<csv::StringRecord>> {
    let mut reader = csv::Reader::from_path(item.join("metadata/submissionDocumentation/premis.csv"))?;
    Ok(reader.records().collect::<std::result::Result<Vec<_>, _>>()?)
}
