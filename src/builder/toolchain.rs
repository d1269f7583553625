//! GNU toolchain resolution and command generation.
//!
//! The only supported toolsets are the GNU C and C++ drivers (`gcc`, `g++`)
//! plus `ar` for static archives. Executables are looked up in an explicit
//! [`ToolSearchPath`] instead of the ambient process environment.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::builder::flags::{render_gnu, Flag};

/// Default archiver used for static libraries.
pub const DEFAULT_ARCHIVER: &str = "ar";

/// Errors raised while selecting or locating a toolset.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ToolsetError {
    #[error("unrecognized toolset `{toolset}` in project `{project}`")]
    #[diagnostic(
        code(weld::toolset::unrecognized),
        help("supported toolsets are \"gcc\" and \"g++\"")
    )]
    Unrecognized { project: String, toolset: String },

    #[error("could not find executable `{name}` in any search directory")]
    #[diagnostic(
        code(weld::toolset::not_found),
        help("install it or add its directory to [toolchain] search_paths")
    )]
    NotFound {
        name: String,
        searched: Vec<PathBuf>,
    },
}

/// A recognized GNU-family compiler driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Toolset {
    /// GNU C compiler driver
    Gcc,
    /// GNU C++ compiler driver
    Gxx,
}

impl Toolset {
    /// The executable name of this driver.
    pub fn executable(&self) -> &'static str {
        match self {
            Toolset::Gcc => "gcc",
            Toolset::Gxx => "g++",
        }
    }

    /// Parse a manifest toolset string for the named project.
    pub fn for_project(toolset: &str, project: &str) -> Result<Self, ToolsetError> {
        toolset.parse().map_err(|_| ToolsetError::Unrecognized {
            project: project.to_string(),
            toolset: toolset.to_string(),
        })
    }

    /// Whether a manifest toolset string names a GNU driver.
    pub fn is_gnu(toolset: &str) -> bool {
        toolset.parse::<Toolset>().is_ok()
    }
}

impl FromStr for Toolset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gcc" => Ok(Toolset::Gcc),
            "g++" => Ok(Toolset::Gxx),
            other => Err(format!("unrecognized toolset `{}`", other)),
        }
    }
}

impl fmt::Display for Toolset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable())
    }
}

/// An executable that was found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutablePath(PathBuf);

impl ExecutablePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for ExecutablePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Ordered list of directories searched for tool executables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSearchPath {
    dirs: Vec<PathBuf>,
}

impl ToolSearchPath {
    /// Search exactly the given directories, in order.
    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        ToolSearchPath {
            dirs: dirs.into_iter().collect(),
        }
    }

    /// Build a search path from a `PATH`-style value.
    pub fn from_path_var(value: impl Into<OsString>) -> Self {
        let value = value.into();
        ToolSearchPath::new(std::env::split_paths(&value))
    }

    /// Put extra directories ahead of the existing ones.
    pub fn with_preferred(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut preferred: Vec<PathBuf> = dirs.into_iter().collect();
        preferred.append(&mut self.dirs);
        self.dirs = preferred;
        self
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Locate an executable by name.
    ///
    /// A name that already contains a path separator is checked as given,
    /// relative names being resolved against `base`.
    pub fn resolve(&self, name: &str, base: &Path) -> Result<ExecutablePath, ToolsetError> {
        let not_found = || ToolsetError::NotFound {
            name: name.to_string(),
            searched: self.dirs.clone(),
        };

        let joined = std::env::join_paths(&self.dirs).map_err(|_| not_found())?;

        which::which_in(name, Some(joined), base)
            .map(ExecutablePath)
            .map_err(|_| not_found())
    }
}

/// A command to execute: program and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// The program to run
    pub program: PathBuf,
    /// Command arguments, passed to the program byte for byte
    pub args: Vec<OsString>,
    /// Working directory (inherit when `None`)
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a new command spec.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandSpec {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.args.extend(args.into_iter().map(|a| a.into()));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Value following the first `-o`, if any.
    pub fn output_arg(&self) -> Option<&OsStr> {
        self.args
            .iter()
            .position(|a| a == "-o")
            .and_then(|i| self.args.get(i + 1))
            .map(OsString::as_os_str)
    }

    /// Render as a single shell-like line for logs and error messages.
    pub fn display(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().map(|a| a.to_string_lossy().into_owned()));
        parts.join(" ")
    }
}

/// A resolved GNU toolchain for one project.
#[derive(Debug, Clone)]
pub struct GnuToolchain {
    pub toolset: Toolset,
    compiler: ExecutablePath,
    archiver: Option<ExecutablePath>,
}

impl GnuToolchain {
    /// Resolve the compiler driver and, when needed, the archiver.
    pub fn resolve(
        toolset: Toolset,
        archiver: Option<&str>,
        search: &ToolSearchPath,
        base: &Path,
    ) -> Result<Self, ToolsetError> {
        let compiler = search.resolve(toolset.executable(), base)?;
        let archiver = archiver
            .map(|name| search.resolve(name, base))
            .transpose()?;

        tracing::debug!("using {} at {}", toolset, compiler.as_path().display());

        Ok(GnuToolchain {
            toolset,
            compiler,
            archiver,
        })
    }

    pub fn compiler(&self) -> &Path {
        self.compiler.as_path()
    }

    /// `toolset <compile flags> -c <source> -o <object>`
    pub fn compile_command(&self, source: &Path, object: &Path, flags: &[Flag]) -> CommandSpec {
        CommandSpec::new(self.compiler.as_path())
            .args(render_gnu(flags))
            .arg("-c")
            .arg(source)
            .arg("-o")
            .arg(object)
    }

    /// `toolset <objects...> <link flags> -o <artifact>`
    pub fn link_command(&self, objects: &[PathBuf], flags: &[Flag], output: &Path) -> CommandSpec {
        CommandSpec::new(self.compiler.as_path())
            .args(objects)
            .args(render_gnu(flags))
            .arg("-o")
            .arg(output)
    }

    /// `ar rcs <artifact> <objects...>`
    ///
    /// Returns `None` when the toolchain was resolved without an archiver.
    pub fn archive_command(&self, objects: &[PathBuf], output: &Path) -> Option<CommandSpec> {
        let archiver = self.archiver.as_ref()?;
        Some(
            CommandSpec::new(archiver.as_path())
                .arg("rcs")
                .arg(output)
                .args(objects),
        )
    }
}
