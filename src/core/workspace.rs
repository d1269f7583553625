//! Workspace context and manifest discovery.
//!
//! Workspace members build into a shared output tree rather than their own
//! standalone output directories. [`WorkspaceInfo`] carries what dependency
//! resolution needs to point links at that shared tree.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::manifest::ManifestError;

/// Canonical manifest file name.
pub const MANIFEST_NAME: &str = "weld.toml";

/// Find the directory holding a manifest, starting at `start` and searching upward.
pub fn find_manifest(start: &Path) -> Result<PathBuf, ManifestError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(MANIFEST_NAME).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ManifestError::NotFound {
                dir: start.to_path_buf(),
            });
        }
    }
}

/// Workspace state visible to dependency resolution while a member builds.
#[derive(Debug, Clone)]
pub struct WorkspaceInfo {
    /// Shared output directory of the workspace
    output_dir: PathBuf,
    /// Project names of all members, in declaration order
    members: Vec<String>,
    /// Members whose build already completed
    built: HashSet<String>,
}

impl WorkspaceInfo {
    pub fn new(output_dir: PathBuf, members: Vec<String>) -> Self {
        WorkspaceInfo {
            output_dir,
            members,
            built: HashSet::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    /// Whether a project name belongs to a workspace member.
    pub fn is_member(&self, name: &str) -> bool {
        self.members.iter().any(|m| m == name)
    }

    /// Output directory of a member inside the shared tree.
    pub fn member_output_dir(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }

    pub fn mark_built(&mut self, name: &str) {
        self.built.insert(name.to_string());
    }

    pub fn is_built(&self, name: &str) -> bool {
        self.built.contains(name)
    }
}
