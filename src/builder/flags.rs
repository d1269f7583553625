//! Structured compiler and linker flags.
//!
//! Dependency resolution produces [`Flag`] values rather than strings, so it
//! stays independent of the command-line syntax of any particular toolchain.
//! Rendering to GNU driver syntax happens only when a command is generated.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// One compiler or linker flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Flag {
    /// `-I<dir>`
    IncludePath(PathBuf),
    /// `-L<dir>`
    LibrarySearchPath(PathBuf),
    /// `-Wl,-rpath,<dir>`
    RuntimeSearchPath(PathBuf),
    /// `-l<name>`
    LinkLibrary(String),
    /// `-fPIC`
    PositionIndependent,
    /// `-shared`
    Shared,
    /// A flag written verbatim in the manifest.
    Raw(String),
}

impl Flag {
    /// Render in GNU (`gcc`/`g++`) syntax.
    ///
    /// Directory flags keep the exact bytes of their path.
    pub fn to_gnu(&self) -> OsString {
        match self {
            Flag::IncludePath(dir) => prefixed("-I", dir),
            Flag::LibrarySearchPath(dir) => prefixed("-L", dir),
            Flag::RuntimeSearchPath(dir) => prefixed("-Wl,-rpath,", dir),
            Flag::LinkLibrary(name) => format!("-l{}", name).into(),
            Flag::PositionIndependent => "-fPIC".into(),
            Flag::Shared => "-shared".into(),
            Flag::Raw(flag) => flag.into(),
        }
    }

    pub fn is_include_path(&self) -> bool {
        matches!(self, Flag::IncludePath(_))
    }

    /// Whether this flag only makes sense at link time.
    pub fn is_link_only(&self) -> bool {
        matches!(
            self,
            Flag::LibrarySearchPath(_)
                | Flag::RuntimeSearchPath(_)
                | Flag::LinkLibrary(_)
                | Flag::Shared
        )
    }
}

/// Render a flag list in GNU syntax.
pub fn render_gnu(flags: &[Flag]) -> Vec<OsString> {
    flags.iter().map(Flag::to_gnu).collect()
}

fn prefixed(prefix: &str, dir: &Path) -> OsString {
    let mut flag = OsString::from(prefix);
    flag.push(dir);
    flag
}

/// Compile and link flag sequences for one project build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    pub compile: Vec<Flag>,
    pub link: Vec<Flag>,
}

impl FlagSet {
    /// Start from the flags declared in a manifest.
    pub fn from_declared(compile: &[String], link: &[String]) -> Self {
        FlagSet {
            compile: compile.iter().cloned().map(Flag::Raw).collect(),
            link: link.iter().cloned().map(Flag::Raw).collect(),
        }
    }

    /// Add an include path to both compile and link flags.
    pub fn push_include(&mut self, dir: PathBuf) {
        self.compile.push(Flag::IncludePath(dir.clone()));
        self.link.push(Flag::IncludePath(dir));
    }

    pub fn push_link(&mut self, flag: Flag) {
        self.link.push(flag);
    }

    /// Number of include-path entries in the compile flags pointing at `dir`.
    pub fn include_count(&self, dir: &Path) -> usize {
        self.compile
            .iter()
            .filter(|f| matches!(f, Flag::IncludePath(d) if d == dir))
            .count()
    }
}
