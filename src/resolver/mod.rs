//! Dependency resolution.
//!
//! The resolver walks a project's declared dependencies in declaration order,
//! has every non-utility dependency built before the consumer compiles, and
//! turns each edge into structured compile and link flags. Inside a workspace,
//! dependencies that are themselves members link against the workspace's
//! shared output tree.

pub mod errors;
pub mod graph;

pub use errors::ResolveError;
pub use graph::DependencyGraph;

use petgraph::graph::NodeIndex;

use crate::builder::errors::BuildError;
use crate::builder::flags::{Flag, FlagSet};
use crate::builder::toolchain::Toolset;
use crate::core::manifest::ProjectKind;
use crate::core::workspace::WorkspaceInfo;

/// Builds a dependency to completion on behalf of the resolver.
pub trait DependencyBuilder {
    /// Fully build the project at `node` (compile and link) before returning.
    fn build_dependency(
        &mut self,
        graph: &DependencyGraph,
        node: NodeIndex,
    ) -> Result<(), BuildError>;
}

/// Resolve the dependencies of `node` into its final flag set.
///
/// The result starts from the manifest's declared flags and appends, per
/// dependency edge:
/// - `SharedLib`: include path (if exposed), `-L`, rpath and `-l`
/// - `StaticLib`: include path (if exposed), `-L` and `-l`
/// - `Utility`: include path (if exposed) only
///
/// Kind-derived flags of the consumer itself are added by the project builder.
pub fn resolve(
    graph: &DependencyGraph,
    node: NodeIndex,
    workspace: Option<&WorkspaceInfo>,
    builder: &mut dyn DependencyBuilder,
) -> Result<FlagSet, BuildError> {
    let consumer = graph.manifest(node);
    let mut flags = FlagSet::from_declared(&consumer.compile_flags, &consumer.link_flags);

    for (dep_node, edge) in graph.dependencies(node) {
        let dep = graph.manifest(dep_node);
        let member = workspace.filter(|ws| ws.is_member(&dep.name));

        if !dep.kind.is_utility() {
            match member {
                Some(ws) if ws.is_built(&dep.name) => {
                    tracing::debug!("`{}` uses workspace member `{}`", consumer.name, dep.name);
                }
                Some(_) => {
                    return Err(ResolveError::MemberOrder {
                        member: consumer.name.clone(),
                        dependency: dep.name.clone(),
                    }
                    .into());
                }
                None => {
                    let wrap = |source: BuildError| BuildError::Dependency {
                        consumer: consumer.name.clone(),
                        dependency: edge.name.clone(),
                        source: Box::new(source),
                    };
                    Toolset::for_project(&dep.toolset, &dep.name)
                        .map_err(|e| wrap(e.into()))?;
                    builder.build_dependency(graph, dep_node).map_err(wrap)?;
                }
            }
        }

        if edge.exposes_include {
            flags.push_include(dep.include_dir()?.to_path_buf());
        }

        let lib_dir = match member {
            Some(ws) => ws.member_output_dir(&dep.name),
            None => dep.output_dir.clone(),
        };

        match &dep.kind {
            ProjectKind::SharedLib { .. } => {
                flags.push_link(Flag::LibrarySearchPath(lib_dir.clone()));
                flags.push_link(Flag::RuntimeSearchPath(lib_dir));
                flags.push_link(Flag::LinkLibrary(dep.name.clone()));
            }
            ProjectKind::StaticLib { .. } => {
                flags.push_link(Flag::LibrarySearchPath(lib_dir));
                flags.push_link(Flag::LinkLibrary(dep.name.clone()));
            }
            ProjectKind::Utility { .. } => {}
            ProjectKind::ConsoleApp => {
                tracing::warn!(
                    "`{}` depends on console application `{}`; nothing to link",
                    consumer.name,
                    dep.name
                );
            }
        }
    }

    Ok(flags)
}
