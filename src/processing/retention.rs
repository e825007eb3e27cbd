use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::constants::{RETAINED_FILES_DIR, RETAINED_IMAGE_DIR};

/// Dispose of the disk image once its files are extracted.
///
/// Without retention the image is deleted. With retention the extracted
/// tree moves into `objects/files/` and the image into
/// `objects/disk-image/`. Returns the image's final location, if kept.
pub fn dispose_image(image_path: &Path, objects_dir: &Path, keep_image: bool) -> Result<Option<PathBuf>> {
    if !keep_image {
        info!("Deleting disk image {}", image_path.display());
        fs::remove_file(image_path)
            .context(format!("Failed to delete disk image {}", image_path.display()))?;
        return Ok(None);
    }

    info!("Repackaging extracted files and disk image");
    let files_dir = objects_dir.join(RETAINED_FILES_DIR);
    let image_dir = objects_dir.join(RETAINED_IMAGE_DIR);

    let contents: Vec<PathBuf> = fs::read_dir(objects_dir)
        .context(format!("Failed to read {}", objects_dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();

    fs::create_dir_all(&files_dir)
        .context(format!("Failed to create {}", files_dir.display()))?;
    for path in contents {
        let name = match path.file_name() {
            Some(name) => name.to_owned(),
            None => continue,
        };
        if name == RETAINED_FILES_DIR || name == RETAINED_IMAGE_DIR {
            continue;
        }
        let target = files_dir.join(&name);
        fs::rename(&path, &target)
            .context(format!("Failed to move {} to {}", path.display(), target.display()))?;
    }

    fs::create_dir_all(&image_dir)
        .context(format!("Failed to create {}", image_dir.display()))?;
    let image_name = image_path
        .file_name()
        .context(format!("Disk image path {} has no file name", image_path.display()))?;
    let retained = image_dir.join(image_name);
    fs::rename(image_path, &retained)
        .context(format!("Failed to move disk image to {}", retained.display()))?;

    Ok(Some(retained))
}
