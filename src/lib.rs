//! # bd_accessioner
//!
//! Accessioning for born-digital transfers: legacy disk images (CD-ROMs,
//! floppies, Zip disks) and loose folder trees.
//!
//! ## Overview
//!
//! Each transfer unit ("item") is a directory. A disk-image item holds one
//! image; the pipeline characterizes it with `disktype` and `mmls`, extracts
//! every recognizable volume with the right strategy, corrects extracted
//! timestamps from the image's DFXML, removes operating-system junk, runs a
//! format scan and bags the result. Folder items skip straight to cleanup and
//! packaging. Every preservation action is written to a PREMIS-style
//! `premis.csv` provenance table.
//!
//! ## Features
//!
//! - **Volume discovery**: partitioned and unpartitioned images, Apple partition maps
//! - **Three extraction strategies**: `tsk_recover`, `unhfs`, and loop-mount copy
//! - **Timestamp reconciliation**: modified/created times restored from DFXML
//! - **Content policy**: optical video discs are flagged for manual review
//! - **Batch logs**: success/skipped/flagged lists and a JSON batch summary
//! - **Flexible configuration**: YAML tool paths, junk lists and image extensions
//!
//! ## Usage
//!
//! ```no_run
//! use bd_accessioner::config::PipelineConfig;
//! use bd_accessioner::models::ItemKind;
//! use bd_accessioner::processing::process_batch;
//! use bd_accessioner::tools::SystemRunner;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = PipelineConfig::default();
//! let runner = SystemRunner::new(config.tool_timeout());
//!
//! let report = process_batch(Path::new("/transfers/2024-001"), ItemKind::DiskImage, &config, &runner)?;
//! println!("Accessioned {} items", report.items.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions and argument parsing
//! - [`config`]: YAML pipeline configuration and tool paths
//! - [`tools`]: External tool invocation
//! - [`characterize`]: disktype/mmls report parsing and volume discovery
//! - [`dfxml`]: DFXML generation and streaming reads
//! - [`extract`]: Per-volume extraction strategies
//! - [`reconcile`]: Timestamp reconciliation
//! - [`provenance`]: PREMIS event log
//! - [`processing`]: Item pipeline and batch driver

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Core data models shared across the pipeline
pub mod models;

/// Configuration management
pub mod config;

/// Application constants
pub mod constants;

/// Item-level error taxonomy
pub mod error;

/// External tool gateway
pub mod tools;

/// disktype and mmls report parsing
pub mod characterize;

/// DFXML documents
pub mod dfxml;

/// Extraction strategies
pub mod extract;

/// Timestamp reconciliation against DFXML
pub mod reconcile;

/// PREMIS provenance log
pub mod provenance;

/// Item pipeline and batch processing
pub mod processing;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
