//! Item Pipeline and batch driver.
//!
//! A disk-image item moves through
//!
//! ```text
//! preconditions → disktype (+ mmls) → extraction per volume
//!     ├─ all volumes skipped ─────────────► Skipped ─┐
//!     ├─ VIDEO_TS / AUDIO_TS present ─────► Flagged ─┤
//!     └─ cleanup → format scan → dispose image ──────┴─► premis.csv → (bag, success only)
//! ```
//!
//! Folder items skip characterization and extraction: their contents are
//! moved into `objects/` and always finish as success.

/// Operating-system junk removal
pub mod cleanup;

/// brunnhilde format scan and bagit packaging
pub mod packaging;

/// Disk image deletion or retention layout
pub mod retention;

/// Per-item state machine
pub mod item;

/// Sequential batch driver and batch logs
pub mod batch;

pub use batch::{process_batch, BatchReport};
pub use item::{
    check_preconditions,
    find_disk_image,
    process_disk_image_item,
    process_folder_item,
    process_item,
    ItemLayout,
    ItemOutcome,
};
