//! Resolution error types and diagnostics.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::manifest::ManifestError;
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error while loading the dependency graph or ordering workspace members.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cycle detected in dependency graph: {}", chain.join(" -> "))]
    Cycle {
        /// Project names along the cycle, first and last equal
        chain: Vec<String>,
    },

    #[error("failed to load dependency `{dependency}` of `{consumer}` at `{}`", path.display())]
    LoadFailed {
        consumer: String,
        dependency: String,
        path: PathBuf,
        #[source]
        source: ManifestError,
    },

    #[error("workspace member `{member}` depends on `{dependency}`, which is declared after it")]
    MemberOrder { member: String, dependency: String },
}

impl ResolveError {
    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolveError::Cycle { chain } => Diagnostic::error("cycle detected in dependency graph")
                .with_context(format!("cycle: {}", chain.join(" -> ")))
                .with_suggestion(suggestions::BREAK_CYCLE),

            ResolveError::LoadFailed {
                consumer,
                dependency,
                path,
                source,
            } => Diagnostic::error(format!(
                "failed to load dependency `{}` of `{}`",
                dependency, consumer
            ))
            .with_location(path.clone())
            .with_context(source.to_string())
            .with_suggestion(format!(
                "Check the `path` of [dependencies.{}] in `{}`'s weld.toml",
                dependency, consumer
            )),

            ResolveError::MemberOrder { member, dependency } => Diagnostic::error(format!(
                "workspace member `{}` is built before its dependency `{}`",
                member, dependency
            ))
            .with_context("members are built in the order they are listed")
            .with_suggestion(format!(
                "Move `{}` ahead of `{}` in [workspace] members",
                dependency, member
            )),
        }
    }
}
