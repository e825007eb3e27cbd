use clap::{Parser, Subcommand};
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::models::ItemKind;

/// Command-line arguments for bd-accessioner.
///
/// The transfer type (`-d` or `-f`) and the scope (`-b` or `-i`) are each
/// required exactly once. Clap accepts any combination; the checks happen in
/// [`Args::item_kind`] and [`Args::batch_mode`] so the `init-config`
/// subcommand can run without a source.
#[derive(Parser, Debug)]
#[clap(
    name = "bd-accessioner",
    version,
    about = "Accession born-digital disk images and folder transfers"
)]
pub struct Args {
    /// Item directory, or a directory of item directories with --batch
    pub source: Option<PathBuf>,

    /// Items contain a single disk image
    #[clap(short, long)]
    pub disk_images: bool,

    /// Items are loose folder trees
    #[clap(short, long)]
    pub file_transfer: bool,

    /// Process every subdirectory of SOURCE as an item
    #[clap(short, long)]
    pub batch: bool,

    /// Process SOURCE as a single item
    #[clap(short, long)]
    pub item: bool,

    /// Keep disk images next to the extracted files
    #[clap(short, long)]
    pub keep_image: bool,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Path to configuration YAML file
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Subcommands
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a default configuration file
    InitConfig {
        /// Path to output configuration file
        #[clap(default_value = "accession.yaml")]
        path: PathBuf,
    },
}

impl Args {
    /// Transfer type selected by `-d` or `-f`
    pub fn item_kind(&self) -> Result<ItemKind> {
        match (self.disk_images, self.file_transfer) {
            (true, false) => Ok(ItemKind::DiskImage),
            (false, true) => Ok(ItemKind::Folder),
            (true, true) => Err(anyhow!("Choose only one of --disk-images or --file-transfer")),
            (false, false) => Err(anyhow!("A transfer type is required: --disk-images or --file-transfer")),
        }
    }

    /// `true` for `-b`, `false` for `-i`
    pub fn batch_mode(&self) -> Result<bool> {
        match (self.batch, self.item) {
            (true, false) => Ok(true),
            (false, true) => Ok(false),
            (true, true) => Err(anyhow!("Choose only one of --batch or --item")),
            (false, false) => Err(anyhow!("A scope is required: --batch or --item")),
        }
    }

    pub fn source_dir(&self) -> Result<&PathBuf> {
        self.source
            .as_ref()
            .ok_or_else(|| anyhow!("A source directory is required"))
    }
}
