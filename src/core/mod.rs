//! Core data structures for weld.
//!
//! This module contains the decoded manifest model and workspace context:
//! - Project and workspace manifests
//! - Project kinds and dependency edges
//! - Manifest discovery

pub mod manifest;
pub mod workspace;

pub use manifest::{
    DependencyEdge, Manifest, ManifestError, ProjectKind, ProjectManifest, WorkspaceManifest,
};
pub use workspace::{find_manifest, WorkspaceInfo, MANIFEST_NAME};
