//! Build error types and diagnostics.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::builder::pool::PoolError;
use crate::builder::toolchain::ToolsetError;
use crate::core::manifest::ManifestError;
use crate::resolver::errors::ResolveError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Any failure that aborts a build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Toolset(#[from] ToolsetError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("failed to build dependency `{dependency}` of `{consumer}`")]
    Dependency {
        consumer: String,
        dependency: String,
        #[source]
        source: Box<BuildError>,
    },

    #[error("failed to compile `{}` in project `{project}`", source_file.display())]
    Compile {
        project: String,
        source_file: PathBuf,
        /// Exit code, `None` when the compiler was killed by a signal
        code: Option<i32>,
    },

    #[error("failed to link `{}` for project `{project}`", artifact.display())]
    Link {
        project: String,
        artifact: PathBuf,
        code: Option<i32>,
    },

    #[error("failed to run `{}`", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("sources `{}` and `{}` in project `{project}` both compile to `{object}`", first.display(), second.display())]
    ObjectCollision {
        project: String,
        object: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("source directory `{}` of project `{project}` does not exist", path.display())]
    SourceDirMissing { project: String, path: PathBuf },

    #[error("compile task for `{}` failed", source_file.display())]
    Pool {
        source_file: PathBuf,
        #[source]
        source: PoolError,
    },
}

impl BuildError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        BuildError::Io {
            path: path.into(),
            source,
        }
    }

    /// The innermost error, following dependency build failures.
    pub fn root_cause(&self) -> &BuildError {
        match self {
            BuildError::Dependency { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BuildError::Resolve(err) => err.to_diagnostic(),

            BuildError::Manifest(err) => {
                let mut diag = Diagnostic::error(err.to_string());
                if matches!(err, ManifestError::NotFound { .. }) {
                    diag = diag.with_suggestion(suggestions::NO_MANIFEST);
                }
                diag
            }

            BuildError::Toolset(err) => {
                let mut diag = Diagnostic::error(err.to_string());
                match err {
                    ToolsetError::NotFound { searched, .. } => {
                        let dirs: Vec<_> = searched.iter().map(|d| d.display().to_string()).collect();
                        diag = diag
                            .with_context(format!("searched: {}", dirs.join(", ")))
                            .with_suggestion(suggestions::TOOL_NOT_FOUND);
                    }
                    ToolsetError::Unrecognized { .. } => {
                        diag = diag.with_suggestion("Set [settings] toolset to \"gcc\" or \"g++\"");
                    }
                }
                diag
            }

            BuildError::Dependency {
                consumer,
                dependency,
                source,
            } => {
                let mut diag = source.to_diagnostic();
                diag = diag.with_context(format!(
                    "while building dependency `{}` of `{}`",
                    dependency, consumer
                ));
                diag
            }

            BuildError::Compile {
                source_file, code, ..
            } => Diagnostic::error(self.to_string())
                .with_location(source_file.clone())
                .with_context(exit_context("compiler", *code))
                .with_suggestion(suggestions::BUILD_FAILED),

            BuildError::Link { code, .. } => Diagnostic::error(self.to_string())
                .with_context(exit_context("linker", *code))
                .with_suggestion(suggestions::BUILD_FAILED),

            BuildError::Spawn { source, .. } | BuildError::Io { source, .. } => {
                Diagnostic::error(self.to_string()).with_context(source.to_string())
            }

            BuildError::ObjectCollision { .. } => Diagnostic::error(self.to_string())
                .with_context("object files are named after the source file stem")
                .with_suggestion("Rename one of the sources or exclude it under [files] exclude"),

            BuildError::SourceDirMissing { path, .. } => Diagnostic::error(self.to_string())
                .with_location(path.clone())
                .with_suggestion("Create the directory or set [settings] src_dir"),

            BuildError::Pool { source, .. } => {
                Diagnostic::error(self.to_string()).with_context(source.to_string())
            }
        }
    }
}

fn exit_context(tool: &str, code: Option<i32>) -> String {
    match code {
        Some(code) => format!("{} exited with status {}", tool, code),
        None => format!("{} was terminated by a signal", tool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_diagnostic() {
        let err = BuildError::Compile {
            project: "app".to_string(),
            source_file: PathBuf::from("/w/app/src/main.c"),
            code: Some(1),
        };
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("failed to compile `/w/app/src/main.c` in project `app`"));
        assert!(output.contains("compiler exited with status 1"));
    }

    #[test]
    fn test_dependency_error_keeps_root_cause() {
        let inner = BuildError::Link {
            project: "zlib".to_string(),
            artifact: PathBuf::from("/w/zlib/bin/libzlib.so"),
            code: None,
        };
        let err = BuildError::Dependency {
            consumer: "app".to_string(),
            dependency: "zlib".to_string(),
            source: Box::new(inner),
        };

        assert!(matches!(err.root_cause(), BuildError::Link { .. }));

        let output = err.to_diagnostic().format(false);
        assert!(output.contains("failed to link"));
        assert!(output.contains("terminated by a signal"));
        assert!(output.contains("while building dependency `zlib` of `app`"));
    }

    #[test]
    fn test_tool_not_found_lists_search_dirs() {
        let err = BuildError::from(ToolsetError::NotFound {
            name: "gcc".to_string(),
            searched: vec![PathBuf::from("/opt/bin"), PathBuf::from("/usr/bin")],
        });
        let output = err.to_diagnostic().format(false);
        assert!(output.contains("searched: /opt/bin, /usr/bin"));
    }
}
