//! Provenance Recorder.
//!
//! Every preservation action taken on an item (tool runs, timestamp
//! corrections, deletions) is appended to an ordered in-memory log and
//! written once, at the end of the item, as a PREMIS-style CSV table in
//! submission documentation.

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, warn};
use serde::Serialize;

use crate::constants::PREMIS_HEADERS;

/// One immutable audit-trail entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvenanceEvent {
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(rename = "eventOutcomeDetail")]
    pub outcome_code: i32,
    pub timestamp: String,
    #[serde(rename = "eventDetailInfo")]
    pub invocation_detail: String,
    #[serde(rename = "eventDetailInfo_additional")]
    pub note: String,
    #[serde(rename = "linkingAgentIDvalue")]
    pub agent: String,
}

/// Current local time in the table's timestamp format
pub fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Append-only event log owned by one item
#[derive(Debug, Default)]
pub struct ProvenanceLog {
    events: Vec<ProvenanceEvent>,
    flushed: bool,
}

impl ProvenanceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        timestamp: String,
        event_type: &str,
        outcome_code: i32,
        invocation_detail: &str,
        note: &str,
        agent: &str,
    ) {
        debug!("Recording {} event (outcome {})", event_type, outcome_code);
        self.events.push(ProvenanceEvent {
            event_type: event_type.to_string(),
            outcome_code,
            timestamp,
            invocation_detail: invocation_detail.to_string(),
            note: note.to_string(),
            agent: agent.to_string(),
        });
    }

    pub fn events(&self) -> &[ProvenanceEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of recorded events of the given type
    pub fn count_of(&self, event_type: &str) -> usize {
        self.events.iter().filter(|e| e.event_type == event_type).count()
    }

    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    /// Write the header and every accumulated event to `path`.
    ///
    /// Only the first call writes; later calls return `Ok(false)` so the
    /// table never receives a duplicated header or rows.
    pub fn flush(&mut self, path: &Path) -> Result<bool> {
        if self.flushed {
            warn!("Provenance for {} was already written, not writing again", path.display());
            return Ok(false);
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context(format!("Failed to open provenance table {}", path.display()))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer.write_record(PREMIS_HEADERS)?;
        for event in &self.events {
            writer.serialize(event)?;
        }
        writer.flush().context("Failed to flush provenance table")?;

        self.flushed = true;
        debug!("Wrote {} provenance events to {}", self.events.len(), path.display());
        Ok(true)
    }
}
