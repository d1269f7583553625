//! Implementation of `weld clean`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;

use crate::core::manifest::Manifest;
use crate::util::fs::{normalize_path, remove_dir_all_if_exists};

/// Refusals raised before anything is deleted.
#[derive(Debug, Error)]
pub enum CleanError {
    #[error(
        "refusing to remove output directory `{}`: it contains `{}`",
        output_dir.display(),
        protected.display()
    )]
    UnsafeOutputDir {
        output_dir: PathBuf,
        protected: PathBuf,
    },
}

/// Remove the output directory of the project or workspace at `root`.
///
/// Returns the directory if something was removed. Dependencies outside a
/// workspace keep their own output directories. An output directory that
/// is, or contains, the project root, a source directory, an include
/// directory or a workspace member is never removed.
pub fn clean(root: &Path) -> Result<Option<PathBuf>> {
    let (output_dir, protected) = match Manifest::load(root)? {
        Manifest::Project(project) => {
            let mut protected = vec![project.root_path.clone(), project.source_dir.clone()];
            protected.extend(project.kind.include_dir().map(Path::to_path_buf));
            (project.output_dir, protected)
        }
        Manifest::Workspace(workspace) => {
            let mut protected = vec![workspace.root_path.clone()];
            protected.extend(workspace.member_roots());
            (workspace.output_dir, protected)
        }
    };

    check_removable(&output_dir, &protected)?;

    if remove_dir_all_if_exists(&output_dir)? {
        tracing::debug!("removed {}", output_dir.display());
        Ok(Some(output_dir))
    } else {
        Ok(None)
    }
}

fn check_removable(output_dir: &Path, protected: &[PathBuf]) -> Result<(), CleanError> {
    let out = normalize_path(output_dir);
    match protected.iter().find(|p| normalize_path(p).starts_with(&out)) {
        Some(p) => Err(CleanError::UnsafeOutputDir {
            output_dir: output_dir.to_path_buf(),
            protected: p.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::{write_project, write_workspace, ProjectSpec};
    use tempfile::TempDir;

    fn project_with_out_dir(tmp: &TempDir, out_dir: &str) -> PathBuf {
        let app = write_project(
            tmp.path(),
            &ProjectSpec::console("app").source("src/main.c", "int main(void) { return 0; }\n"),
        );
        std::fs::write(
            app.join("weld.toml"),
            format!(
                "[project]\nname = \"app\"\ntype = \"ConsoleApp\"\n\n[settings]\nout_dir = {:?}\n",
                out_dir
            ),
        )
        .unwrap();
        app
    }

    #[test]
    fn test_clean_project() {
        let tmp = TempDir::new().unwrap();
        let app = write_project(tmp.path(), &ProjectSpec::console("app"));
        std::fs::create_dir_all(app.join("bin/genobjs")).unwrap();
        std::fs::write(app.join("bin/genobjs/main.o"), b"").unwrap();

        assert_eq!(clean(&app).unwrap(), Some(app.join("bin")));
        assert!(!app.join("bin").exists());
        assert!(app.join("src").exists());

        // Nothing left to remove
        assert_eq!(clean(&app).unwrap(), None);
    }

    #[test]
    fn test_clean_refuses_output_dir_covering_project() {
        for out_dir in [".", "..", "src", "src/.."] {
            let tmp = TempDir::new().unwrap();
            let app = project_with_out_dir(&tmp, out_dir);

            let err = clean(&app).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<CleanError>(),
                    Some(CleanError::UnsafeOutputDir { .. })
                ),
                "out_dir = {:?}",
                out_dir
            );
            assert!(app.join("weld.toml").is_file());
            assert!(app.join("src/main.c").is_file());
        }
    }

    #[test]
    fn test_clean_allows_output_dir_under_project() {
        let tmp = TempDir::new().unwrap();
        let app = project_with_out_dir(&tmp, "build/out");
        std::fs::create_dir_all(app.join("build/out/genobjs")).unwrap();

        assert_eq!(clean(&app).unwrap(), Some(app.join("build/out")));
        assert!(app.join("src/main.c").is_file());
    }

    #[test]
    fn test_clean_workspace() {
        let tmp = TempDir::new().unwrap();
        let ws = write_workspace(tmp.path(), "ws", &["a"]);
        std::fs::create_dir_all(ws.join("bin/a")).unwrap();

        assert_eq!(clean(&ws).unwrap(), Some(ws.join("bin")));
    }

    #[test]
    fn test_clean_refuses_workspace_output_dir_covering_member() {
        let tmp = TempDir::new().unwrap();
        let ws = write_workspace(tmp.path(), "ws", &["a"]);
        write_project(&ws, &ProjectSpec::static_lib("a"));
        std::fs::write(
            ws.join("weld.toml"),
            "[workspace]\nmembers = [\"a\"]\nout_dir = \"a\"\n",
        )
        .unwrap();

        let err = clean(&ws).unwrap_err();
        assert!(err.downcast_ref::<CleanError>().is_some());
        assert!(ws.join("a/weld.toml").is_file());
    }
}
