use crate::constants::MMLS_HEADER_LINES;

/// One row of `mmls` output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRow {
    pub slot: String,
    /// Start sector as printed, zero padded
    pub start: String,
    /// Length in sectors as printed, zero padded
    pub length: String,
}

impl PartitionRow {
    pub fn start_sector(&self) -> Option<u64> {
        self.start.parse().ok()
    }
}

/// Parse the partition rows of an `mmls` report.
///
/// The fixed header is skipped; each remaining row reads
/// `<index>: <slot> <start> <end> <length> <description...>`. Rows with fewer
/// columns are ignored.
pub fn parse_partition_rows(text: &str) -> Vec<PartitionRow> {
    text.lines()
        .skip(MMLS_HEADER_LINES)
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            if columns.len() < 5 {
                return None;
            }
            Some(PartitionRow {
                slot: columns[1].to_string(),
                start: columns[2].to_string(),
                length: columns[4].to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOS_TABLE: &str = "DOS Partition Table\nOffset Sector: 0\nUnits are in 512-byte sectors\n\n      Slot      Start        End          Length       Description\n000:  Meta      0000000000   0000000000   0000000001   Primary Table (#0)\n001:  -------   0000000000   0000000031   0000000032   Unallocated\n002:  000:000   0000000032   0000097983   0000097952   DOS FAT16 (0x06)\n003:  000:001   0000097984   0000195903   0000097920   Linux (0x83)\n";

    #[test]
    fn test_parse_rows_skips_header() {
        let rows = parse_partition_rows(DOS_TABLE);
        assert_eq!(rows.len(), 4);
        assert_eq!(
            rows[2],
            PartitionRow {
                slot: "000:000".to_string(),
                start: "0000000032".to_string(),
                length: "0000097952".to_string(),
            }
        );
        assert_eq!(rows[3].start_sector(), Some(97984));
    }

    #[test]
    fn test_short_rows_are_ignored() {
        let text = "h1\nh2\nh3\nh4\nh5\n\n002:  000:000   0000000032\n";
        assert!(parse_partition_rows(text).is_empty());
    }

    #[test]
    fn test_empty_report() {
        assert!(parse_partition_rows("").is_empty());
    }
}
