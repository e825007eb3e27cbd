//! External Tool Gateway.
//!
//! Every forensic tool the pipeline relies on (disktype, mmls, fiwalk,
//! tsk_recover, unhfs, mount, brunnhilde, bagit) is driven through the
//! [`ToolRunner`] trait. Callers build an [`Invocation`], receive a
//! [`ToolOutput`], and decide for themselves whether a nonzero exit matters.
//! Tests substitute a scripted runner so no real tool is needed.

/// Invocation, output capture and the process-backed runner
pub mod runner;

pub use runner::{
    Invocation,
    SystemRunner,
    ToolOutput,
    ToolRunner,
    VersionStream,
    tool_version,
};
