use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Start of a partition block, e.g. `Partition 2: 650 MiB (..., 1331200 sectors from 64)`
    static ref PARTITION_MARKER: Regex = Regex::new(r"(?m)^[ \t]*Partition \d+:").unwrap();
}

/// Entry name identifying the structural Apple partition map
const APPLE_PARTITION_MAP: &str = "Apple_partition_map";

const FILE_SYSTEM_MARKER: &str = "file system";

/// How the characterization report says the disk is laid out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskLayout {
    /// One volume spanning the disk, with the filesystem names reported for it
    Unpartitioned { filesystems: Vec<String> },
    /// Data partitions at offsets; needs the partition table to address them
    Partitioned,
}

/// A disktype report split into its preamble and partition blocks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisktypeReport {
    preamble: String,
    blocks: Vec<String>,
}

impl DisktypeReport {
    pub fn parse(text: &str) -> Self {
        let starts: Vec<usize> = PARTITION_MARKER.find_iter(text).map(|m| m.start()).collect();

        let preamble = match starts.first() {
            Some(&first) => text[..first].to_string(),
            None => text.to_string(),
        };

        let blocks = starts
            .iter()
            .enumerate()
            .map(|(i, &start)| {
                let end = starts.get(i + 1).copied().unwrap_or(text.len());
                text[start..end].to_string()
            })
            .collect();

        Self { preamble, blocks }
    }

    /// Decide between the single-volume and the partition-table paths.
    ///
    /// A disk with two blocks whose first is the Apple partition map only has
    /// one data region, so it is read as unpartitioned using everything but
    /// the map block. Any other partition block, even a lone one, sits at an
    /// offset that only the partition table can supply.
    pub fn layout(&self) -> DiskLayout {
        match self.blocks.len() {
            0 => DiskLayout::Unpartitioned {
                filesystems: filesystem_names(&self.full_text()),
            },
            2 if self.blocks[0].contains(APPLE_PARTITION_MAP) => {
                let remaining = format!("{}{}", self.preamble, self.blocks[1]);
                DiskLayout::Unpartitioned {
                    filesystems: filesystem_names(&remaining),
                }
            }
            _ => DiskLayout::Partitioned,
        }
    }

    /// Find the block describing a partition of `length` sectors starting at
    /// `start`. Both values are compared as decimal text without leading zeros.
    pub fn block_for(&self, start: &str, length: &str) -> Option<&str> {
        let start = strip_leading_zeros(start);
        let length = strip_leading_zeros(length);
        let closed = format!(", {} sectors from {})", length, start);
        let continued = format!(", {} sectors from {},", length, start);

        self.blocks
            .iter()
            .find(|block| {
                block.contains(FILE_SYSTEM_MARKER) && (block.contains(&closed) || block.contains(&continued))
            })
            .map(String::as_str)
    }

    fn full_text(&self) -> String {
        let mut text = self.preamble.clone();
        for block in &self.blocks {
            text.push_str(block);
        }
        text
    }
}

/// Collect the lowercased filesystem name of every "file system" line
pub fn filesystem_names(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            line.find(FILE_SYSTEM_MARKER)
                .map(|idx| line[..idx].trim().to_lowercase())
        })
        .filter(|name| !name.is_empty())
        .collect()
}

fn strip_leading_zeros(value: &str) -> &str {
    let stripped = value.trim().trim_start_matches('0');
    if stripped.is_empty() && !value.trim().is_empty() {
        "0"
    } else {
        stripped
    }
}
