//! Command implementations

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use weld::util::{GlobalContext, Shell};

pub mod build;
pub mod clean;
pub mod new;
pub mod tree;

/// Global options shared by every command.
pub struct Session {
    pub shell: Arc<Shell>,
    pub manifest_path: Option<PathBuf>,
    pub jobs: Option<usize>,
}

impl Session {
    /// The directory holding the manifest this invocation works on.
    pub fn manifest_root(&self, ctx: &GlobalContext) -> Result<PathBuf> {
        ctx.manifest_root(self.manifest_path.as_deref())
    }
}
