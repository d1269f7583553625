//! C/C++ build engine.
//!
//! This module turns resolved projects into compile, link and archive
//! commands and runs them, compiling each project's sources in parallel on a
//! shared worker pool.

pub mod context;
pub mod discovery;
pub mod errors;
pub mod events;
pub mod flags;
pub mod pool;
pub mod project;
pub mod toolchain;
pub mod workspace;

pub use context::BuildContext;
pub use errors::BuildError;
pub use events::{BuildEvent, EventSink};
pub use flags::{Flag, FlagSet};
pub use pool::{PoolError, TaskHandle, WorkerPool};
pub use project::{BuildOutput, ProjectBuilder};
pub use toolchain::{CommandSpec, GnuToolchain, ToolSearchPath, Toolset, ToolsetError};
pub use workspace::build_workspace;
