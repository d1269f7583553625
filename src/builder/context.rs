//! Build context - everything the builder needs from its environment.
//!
//! No builder code reads the process current directory or `PATH` itself;
//! the binary assembles a [`BuildContext`] from configuration and hands it in.

use std::fmt;
use std::sync::Arc;

use crate::builder::events::{EventSink, NullSink};
use crate::builder::pool::default_parallelism;
use crate::builder::toolchain::{ToolSearchPath, DEFAULT_ARCHIVER};
use crate::util::process::{CommandRunner, SystemRunner};

/// Build context shared by every project built in one invocation.
#[derive(Clone)]
pub struct BuildContext {
    /// Directories searched for the compiler and archiver
    pub search_path: ToolSearchPath,

    /// Archiver used for static libraries
    pub archiver: String,

    /// Executes compile, link and archive commands
    pub runner: Arc<dyn CommandRunner>,

    /// Receives progress events
    pub events: Arc<dyn EventSink>,

    /// Worker pool size
    pub jobs: usize,
}

impl fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildContext")
            .field("search_path", &self.search_path)
            .field("archiver", &self.archiver)
            .field("jobs", &self.jobs)
            .finish_non_exhaustive()
    }
}

impl BuildContext {
    /// A context that runs real processes and discards events.
    pub fn new(search_path: ToolSearchPath) -> Self {
        BuildContext {
            search_path,
            archiver: DEFAULT_ARCHIVER.to_string(),
            runner: Arc::new(SystemRunner),
            events: Arc::new(NullSink),
            jobs: default_parallelism(),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Override the worker count; zero keeps the current value.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        if jobs > 0 {
            self.jobs = jobs;
        }
        self
    }

    pub fn with_archiver(mut self, archiver: impl Into<String>) -> Self {
        self.archiver = archiver.into();
        self
    }
}
