//! Implementation of `weld tree`.

use std::path::Path;

use anyhow::Result;

use crate::core::manifest::{Manifest, ProjectManifest};
use crate::resolver::DependencyGraph;

/// Render the dependency tree of the project at `root`, or of every
/// workspace member in declaration order.
pub fn tree(root: &Path, max_depth: usize) -> Result<String> {
    match Manifest::load(root)? {
        Manifest::Project(project) => Ok(DependencyGraph::load(project)?.render_tree(max_depth)),
        Manifest::Workspace(workspace) => {
            let mut out = String::new();
            for member_root in workspace.member_roots() {
                let member = ProjectManifest::load(&member_root)?;
                out.push_str(&DependencyGraph::load(member)?.render_tree(max_depth));
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::{write_project, write_workspace, ProjectSpec};
    use tempfile::TempDir;

    #[test]
    fn test_tree_project() {
        let tmp = TempDir::new().unwrap();
        write_project(tmp.path(), &ProjectSpec::utility("headers"));
        let app = write_project(tmp.path(), &ProjectSpec::console("app").dep("headers", true));

        assert_eq!(
            tree(&app, usize::MAX).unwrap(),
            "app (ConsoleApp)\n├── headers (Utility)\n"
        );
        assert_eq!(tree(&app, 0).unwrap(), "app (ConsoleApp)\n");
    }

    #[test]
    fn test_tree_workspace_members() {
        let tmp = TempDir::new().unwrap();
        let ws = write_workspace(tmp.path(), "ws", &["a", "b"]);
        write_project(&ws, &ProjectSpec::static_lib("a"));
        write_project(&ws, &ProjectSpec::console("b").dep("a", false));

        assert_eq!(
            tree(&ws, usize::MAX).unwrap(),
            "a (StaticLib)\nb (ConsoleApp)\n├── a (StaticLib)\n"
        );
    }
}
