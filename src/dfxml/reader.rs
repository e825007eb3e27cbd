use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::ProcessingError;
use crate::models::{EntryKind, ForensicMetadataRecord};

/// `fileobject` children the reconciler cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Filename,
    NameType,
    Mtime,
    Crtime,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"filename" => Some(Field::Filename),
            b"name_type" => Some(Field::NameType),
            b"mtime" => Some(Field::Mtime),
            b"crtime" => Some(Field::Crtime),
            _ => None,
        }
    }
}

/// Stream every `fileobject` of a DFXML document to `visit`, in document order.
///
/// Records are handed over as soon as their element closes, so work done for
/// earlier records stands even if the document turns out to be malformed
/// further on. Returns the number of records visited.
pub fn visit_records<R, F>(source: R, mut visit: F) -> Result<usize, String>
where
    R: BufRead,
    F: FnMut(ForensicMetadataRecord),
{
    let mut reader = Reader::from_reader(source);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut saw_root = false;
    let mut current: Option<ForensicMetadataRecord> = None;
    // Nesting depth below the open fileobject element
    let mut depth = 0usize;
    let mut field: Option<Field> = None;
    let mut visited = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                saw_root = true;
                let name = e.local_name();
                if current.is_none() {
                    if name.as_ref() == b"fileobject" {
                        current = Some(ForensicMetadataRecord::default());
                        depth = 0;
                    }
                } else {
                    depth += 1;
                    if depth == 1 {
                        field = Field::from_tag(name.as_ref());
                    }
                }
            }
            Ok(Event::Empty(_)) => {
                saw_root = true;
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(record), Some(f)) = (current.as_mut(), field) {
                    let text = e.unescape().map_err(|err| err.to_string())?;
                    let text = text.trim();
                    match f {
                        Field::Filename => record.filename.push_str(text),
                        Field::NameType => record.kind = Some(EntryKind::from_name_type(text)),
                        Field::Mtime => record.modified = Some(text.to_string()),
                        Field::Crtime => record.created = Some(text.to_string()),
                    }
                }
            }
            Ok(Event::End(_)) => {
                if current.is_some() {
                    if depth == 0 {
                        if let Some(record) = current.take() {
                            visit(record);
                            visited += 1;
                        }
                    } else {
                        if depth == 1 {
                            field = None;
                        }
                        depth -= 1;
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(format!("error at position {}: {}", reader.buffer_position(), e));
            }
        }
        buf.clear();
    }

    if !saw_root {
        return Err("document has no root element".to_string());
    }
    if current.is_some() {
        return Err("document ends inside a fileobject".to_string());
    }

    Ok(visited)
}

/// Open a DFXML file and stream its records to `visit`
pub fn visit_file<F>(path: &Path, visit: F) -> Result<usize, ProcessingError>
where
    F: FnMut(ForensicMetadataRecord),
{
    let parse_error = |reason: String| ProcessingError::MetadataParse {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| parse_error(e.to_string()))?;
    visit_records(BufReader::new(file), visit).map_err(parse_error)
}

/// Read every record of a DFXML file into memory
#[cfg(test)]
pub(crate) fn read_records(path: &Path) -> Result<Vec<ForensicMetadataRecord>, ProcessingError> {
    let mut records = Vec::new();
    visit_file(path, |record| records.push(record))?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIWALK_SAMPLE: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<dfxml xmlns='http://www.forensicswiki.org/wiki/Category:Digital_Forensics_XML' version='1.0'>
  <metadata/>
  <creator version='1.0'><program>fiwalk</program></creator>
  <volume offset='0'>
    <fileobject>
      <filename>readme.txt</filename>
      <partition>1</partition>
      <name_type>r</name_type>
      <filesize>42</filesize>
      <mtime prec='100'>2001-05-03T10:15:00Z</mtime>
      <byte_runs><byte_run file_offset='0' len='42'/></byte_runs>
      <hashdigest type='md5'>abc</hashdigest>
    </fileobject>
    <fileobject>
      <filename>docs</filename>
      <name_type>d</name_type>
      <crtime>1999-12-31T23:59:59.5Z</crtime>
    </fileobject>
    <fileobject>
      <filename>docs/link</filename>
      <name_type>l</name_type>
    </fileobject>
    <fileobject>
      <filename>R&amp;D notes.doc</filename>
      <mtime>2003-01-02T03:04:05</mtime>
    </fileobject>
  </volume>
</dfxml>
"#;

    fn parse(text: &str) -> Result<Vec<ForensicMetadataRecord>, String> {
        let mut records = Vec::new();
        visit_records(text.as_bytes(), |r| records.push(r))?;
        Ok(records)
    }

    #[test]
    fn test_reads_fiwalk_fileobjects() {
        let records = parse(FIWALK_SAMPLE).unwrap();
        assert_eq!(records.len(), 4);

        assert_eq!(records[0].filename, "readme.txt");
        assert_eq!(records[0].kind, Some(EntryKind::Regular));
        assert_eq!(records[0].modified.as_deref(), Some("2001-05-03T10:15:00Z"));
        assert_eq!(records[0].created, None);

        assert_eq!(records[1].kind, Some(EntryKind::Directory));
        assert_eq!(records[1].created.as_deref(), Some("1999-12-31T23:59:59.5Z"));

        assert_eq!(records[2].kind, Some(EntryKind::Other("l".to_string())));

        assert_eq!(records[3].filename, "R&D notes.doc");
        assert_eq!(records[3].kind, None);
    }

    #[test]
    fn test_nested_elements_do_not_leak_into_fields() {
        let text = "<dfxml><fileobject><filename>a</filename><byte_runs><byte_run><filename>inner</filename></byte_run></byte_runs></fileobject></dfxml>";
        let records = parse(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filename, "a");
    }

    #[test]
    fn test_mismatched_tags_fail_after_earlier_records() {
        let text = "<dfxml><fileobject><filename>first</filename></fileobject><fileobject><filename>second</name_type></fileobject></dfxml>";
        let mut seen = Vec::new();
        let result = visit_records(text.as_bytes(), |r| seen.push(r.filename));
        assert!(result.is_err());
        assert_eq!(seen, vec!["first".to_string()]);
    }

    #[test]
    fn test_empty_and_truncated_documents_fail() {
        assert!(parse("").is_err());
        assert!(parse("<dfxml><fileobject><filename>a</filename>").is_err());
    }

    #[test]
    fn test_missing_file_is_parse_error() {
        let err = read_records(Path::new("/nonexistent/dfxml.xml")).unwrap_err();
        assert!(matches!(err, ProcessingError::MetadataParse { .. }));
    }
}
