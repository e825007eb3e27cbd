use std::fs::{File, Metadata};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use walkdir::WalkDir;

/// Render a filesystem time as DFXML's UTC timestamp form
fn to_dfxml_time(time: SystemTime) -> String {
    let dt: DateTime<Utc> = time.into();
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn name_type(metadata: &Metadata) -> &'static str {
    let file_type = metadata.file_type();
    if file_type.is_symlink() {
        "l"
    } else if file_type.is_dir() {
        "d"
    } else if file_type.is_file() {
        "r"
    } else {
        "-"
    }
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, value: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Describe every entry below `root` as a DFXML `fileobject`.
///
/// Filenames are relative to `root` with `/` separators. Links are recorded
/// but not followed. Returns the number of file objects written.
pub fn write_walk_document(root: &Path, output_path: &Path) -> Result<usize> {
    info!("Generating DFXML for {} at {}", root.display(), output_path.display());

    let file = File::create(output_path)
        .context(format!("Failed to create DFXML document at {}", output_path.display()))?;
    let mut writer = Writer::new_with_indent(BufWriter::new(file), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut dfxml = BytesStart::new("dfxml");
    dfxml.push_attribute(("version", "1.0"));
    writer.write_event(Event::Start(dfxml))?;

    writer.write_event(Event::Start(BytesStart::new("creator")))?;
    text_element(&mut writer, "program", env!("CARGO_PKG_NAME"))?;
    text_element(&mut writer, "version", env!("CARGO_PKG_VERSION"))?;
    writer.write_event(Event::End(BytesEnd::new("creator")))?;

    writer.write_event(Event::Start(BytesStart::new("source")))?;
    text_element(&mut writer, "image_filename", &root.to_string_lossy())?;
    writer.write_event(Event::End(BytesEnd::new("source")))?;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .sort_by_file_name();

    let mut count = 0usize;
    for entry in walker {
        let entry = entry.context(format!("Failed to walk {}", root.display()))?;
        let metadata = entry
            .metadata()
            .context(format!("Failed to read metadata of {}", entry.path().display()))?;

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let filename = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join("/");

        writer.write_event(Event::Start(BytesStart::new("fileobject")))?;
        text_element(&mut writer, "filename", &filename)?;
        text_element(&mut writer, "name_type", name_type(&metadata))?;
        text_element(&mut writer, "filesize", &metadata.len().to_string())?;
        if let Ok(modified) = metadata.modified() {
            text_element(&mut writer, "mtime", &to_dfxml_time(modified))?;
        }
        if let Ok(accessed) = metadata.accessed() {
            text_element(&mut writer, "atime", &to_dfxml_time(accessed))?;
        }
        if let Ok(created) = metadata.created() {
            text_element(&mut writer, "crtime", &to_dfxml_time(created))?;
        }
        writer.write_event(Event::End(BytesEnd::new("fileobject")))?;

        count += 1;
    }

    writer.write_event(Event::End(BytesEnd::new("dfxml")))?;
    let mut inner = writer.into_inner();
    inner.write_all(b"\n")?;
    inner.flush().context("Failed to flush DFXML document")?;

    debug!("Described {} entries of {}", count, root.display());
    Ok(count)
}
