//! Workspace build: members one after another into a shared output tree.

use crate::builder::errors::BuildError;
use crate::builder::project::{BuildOutput, ProjectBuilder};
use crate::core::manifest::{ProjectManifest, WorkspaceManifest};
use crate::core::workspace::WorkspaceInfo;
use crate::resolver::DependencyGraph;
use crate::util::fs::ensure_dir;

/// Build every member of a workspace, in declaration order.
///
/// Members build sequentially; parallelism exists only within the compile
/// stage of one member. Member `m` builds into `<out_dir>/<m>`, and members
/// depending on earlier members link against that shared tree.
pub fn build_workspace(
    builder: &mut ProjectBuilder<'_>,
    manifest: &WorkspaceManifest,
) -> Result<Vec<BuildOutput>, BuildError> {
    ensure_dir(&manifest.output_dir).map_err(|e| BuildError::io(&manifest.output_dir, e))?;

    let members = manifest
        .member_roots()
        .iter()
        .map(|root| ProjectManifest::load(root))
        .collect::<Result<Vec<_>, _>>()?;

    let mut info = WorkspaceInfo::new(
        manifest.output_dir.clone(),
        members.iter().map(|m| m.name.clone()).collect(),
    );

    tracing::debug!(
        "building workspace {} ({} members)",
        manifest.root_path.display(),
        members.len()
    );

    let mut outputs = Vec::with_capacity(members.len());
    for member in members {
        let name = member.name.clone();
        let graph = DependencyGraph::load(member)?;
        let out_dir = info.member_output_dir(&name);

        let output = builder.build_node(&graph, graph.root(), Some(&info), Some(out_dir))?;
        info.mark_built(&name);
        outputs.push(output);
    }

    Ok(outputs)
}
