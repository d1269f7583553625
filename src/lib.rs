//! Weld - a parallel build orchestrator for C and C++ projects
//!
//! This crate provides the library behind the `weld` binary: manifest
//! decoding, dependency resolution, parallel compilation and linking of
//! projects and workspaces.

pub mod builder;
pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities for weld unit tests.
///
/// Only compiled for tests. Provides manifest fixtures, a fake toolchain
/// directory and a recording command runner.
#[cfg(test)]
pub mod test_support;

pub use builder::{BuildContext, BuildError, BuildEvent, ProjectBuilder, WorkerPool};
pub use core::{manifest::Manifest, workspace::WorkspaceInfo};
pub use resolver::DependencyGraph;
pub use util::context::GlobalContext;
