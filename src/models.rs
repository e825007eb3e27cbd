use std::fmt;

use serde::{Serialize, Deserialize};

/// Kind of transfer unit an item directory holds
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A directory containing exactly one disk image
    DiskImage,
    /// A loose folder tree
    Folder,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::DiskImage => write!(f, "disk_images"),
            ItemKind::Folder => write!(f, "folders"),
        }
    }
}

/// Terminal disposition of an item
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Success,
    Skipped,
    Flagged,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Success => "success",
            ItemStatus::Skipped => "skipped",
            ItemStatus::Flagged => "flagged",
        }
    }

    /// Skipped and flagged items stop before cleanup and packaging
    pub fn is_terminal_early(&self) -> bool {
        matches!(self, ItemStatus::Skipped | ItemStatus::Flagged)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One addressable filesystem region of a disk image.
///
/// `slot` and `start_sector` are both absent for the whole-disk case.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VolumeDescriptor {
    pub slot: Option<String>,
    pub start_sector: Option<u64>,
    pub filesystems: Vec<String>,
}

impl VolumeDescriptor {
    pub fn whole_disk(filesystems: Vec<String>) -> Self {
        Self { slot: None, start_sector: None, filesystems }
    }

    pub fn partition(slot: &str, start_sector: u64, filesystems: Vec<String>) -> Self {
        Self {
            slot: Some(slot.to_string()),
            start_sector: Some(start_sector),
            filesystems,
        }
    }
}

/// Entry kind as reported by the forensic metadata document
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Regular,
    Directory,
    Other(String),
}

impl EntryKind {
    /// Map a DFXML `name_type` code
    pub fn from_name_type(code: &str) -> Self {
        match code.trim() {
            "r" => EntryKind::Regular,
            "d" => EntryKind::Directory,
            other => EntryKind::Other(other.to_string()),
        }
    }
}

/// One file or directory entry of the forensic metadata document
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ForensicMetadataRecord {
    pub filename: String,
    /// `None` when the document gave no entry kind
    pub kind: Option<EntryKind>,
    pub modified: Option<String>,
    pub created: Option<String>,
}
