//! Global context for weld operations.
//!
//! The one place that reads the process environment: current directory,
//! home directory and `PATH`. Everything below `ops` receives these values
//! explicitly.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::context::BuildContext;
use crate::builder::toolchain::ToolSearchPath;
use crate::core::manifest::ManifestError;
use crate::core::workspace::{find_manifest, MANIFEST_NAME};
use crate::util::config::{self, Config};

/// Global context containing paths and environment.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory for global weld data (~/.weld/)
    home: Option<PathBuf>,

    /// Value of `PATH` when the context was created
    path_var: OsString,
}

impl GlobalContext {
    /// Create a new GlobalContext from the process environment.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(GlobalContext {
            cwd,
            home: config::global_config_dir(),
            path_var: std::env::var_os("PATH").unwrap_or_default(),
        })
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        let mut ctx = Self::new()?;
        ctx.cwd = cwd;
        Ok(ctx)
    }

    /// Replace the home directory (`None` disables the global config).
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    pub fn with_path_var(mut self, value: impl Into<OsString>) -> Self {
        self.path_var = value.into();
        self
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the weld home directory (~/.weld/).
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// Get the global configuration file path.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join("config.toml"))
    }

    /// Find the directory holding `weld.toml`, searching upward from cwd.
    pub fn find_manifest(&self) -> Result<PathBuf, ManifestError> {
        find_manifest(&self.cwd)
    }

    /// Resolve an explicit `--manifest-path`, or search upward from cwd.
    ///
    /// Accepts either the manifest file itself or the directory holding it.
    pub fn manifest_root(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        let root = match explicit {
            Some(path) => {
                let path = self.cwd.join(path);
                let dir = if path.file_name().is_some_and(|n| n == MANIFEST_NAME) {
                    path.parent().map(Path::to_path_buf).unwrap_or(path)
                } else {
                    path
                };
                if !dir.join(MANIFEST_NAME).is_file() {
                    return Err(ManifestError::NotFound { dir }.into());
                }
                dir
            }
            None => self.find_manifest()?,
        };

        root.canonicalize()
            .with_context(|| format!("failed to canonicalize {}", root.display()))
    }

    /// Load global and project configuration for the project at `root`.
    pub fn load_config(&self, root: &Path) -> Config {
        let global = self.config_path();
        config::load_config(global.as_deref(), &config::project_config_path(root))
    }

    /// Tool search path: configured directories first, then `PATH`.
    ///
    /// Relative configured directories are taken relative to `root`.
    pub fn tool_search_path(&self, config: &Config, root: &Path) -> ToolSearchPath {
        let preferred = config.toolchain.search_paths.iter().map(|p| root.join(p));
        ToolSearchPath::from_path_var(self.path_var.clone()).with_preferred(preferred)
    }

    /// Assemble the build context for the project at `root`.
    ///
    /// `jobs` from the command line wins over the configured job count.
    pub fn build_context(&self, root: &Path, jobs: Option<usize>) -> BuildContext {
        let config = self.load_config(root);
        let mut ctx = BuildContext::new(self.tool_search_path(&config, root));

        if let Some(jobs) = jobs.or(config.build.jobs) {
            ctx = ctx.with_jobs(jobs);
        }
        if let Some(ar) = config.toolchain.ar {
            ctx = ctx.with_archiver(ar);
        }
        ctx
    }
}
