//! Build progress events.
//!
//! The builder reports progress as [`BuildEvent`] values through an
//! [`EventSink`]. The shell renders them as status lines or, with
//! `--message-format json`, as one JSON object per line.
//!
//! # Stability
//!
//! The JSON schema should remain backwards compatible. New fields may be
//! added, but existing fields should not be removed or renamed.

use std::path::PathBuf;

use serde::Serialize;

/// A build event emitted during the build process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    /// A compile task started on a worker.
    #[serde(rename = "compile-started")]
    CompileStarted {
        project: String,
        source: PathBuf,
        /// Number of sources compiled for this project
        total: usize,
    },

    /// A compile task finished.
    #[serde(rename = "compile-finished")]
    CompileFinished {
        project: String,
        source: PathBuf,
        object: PathBuf,
        success: bool,
    },

    /// The link or archive step started.
    #[serde(rename = "link-started")]
    LinkStarted { project: String, artifact: PathBuf },

    /// The link or archive step finished.
    #[serde(rename = "link-finished")]
    LinkFinished {
        project: String,
        artifact: PathBuf,
        success: bool,
    },

    /// A project had nothing to compile or link.
    #[serde(rename = "project-skipped")]
    ProjectSkipped { project: String, detail: String },

    /// The whole invocation completed (success or failure).
    #[serde(rename = "build-finished")]
    BuildFinished {
        success: bool,
        duration_ms: u64,
        projects_built: usize,
    },
}

impl BuildEvent {
    /// Create a build finished event.
    pub fn finished(success: bool, duration_ms: u64, projects_built: usize) -> Self {
        BuildEvent::BuildFinished {
            success,
            duration_ms,
            projects_built,
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receives build events. Called from worker threads.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BuildEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: BuildEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_finished_serialization() {
        let event = BuildEvent::CompileFinished {
            project: "app".to_string(),
            source: PathBuf::from("src/main.c"),
            object: PathBuf::from("bin/genobjs/main.o"),
            success: true,
        };
        let json = event.to_json();
        assert!(json.contains("\"reason\":\"compile-finished\""));
        assert!(json.contains("\"project\":\"app\""));
        assert!(json.contains("main.o"));
        assert!(json.contains("\"success\":true"));
    }

    #[test]
    fn test_finished_serialization() {
        let json = BuildEvent::finished(false, 2340, 3).to_json();
        assert!(json.contains("\"reason\":\"build-finished\""));
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("\"duration_ms\":2340"));
        assert!(json.contains("\"projects_built\":3"));
    }

    #[test]
    fn test_skipped_serialization() {
        let event = BuildEvent::ProjectSkipped {
            project: "headers".to_string(),
            detail: "utility project".to_string(),
        };
        let json = event.to_json();
        assert!(json.contains("\"reason\":\"project-skipped\""));
        assert!(json.contains("\"detail\":\"utility project\""));
    }
}
