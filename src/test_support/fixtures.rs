//! Test fixtures: project and workspace trees written to disk.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Fixture for one project directory.
#[derive(Debug, Clone)]
pub struct ProjectSpec {
    pub name: String,
    pub kind: &'static str,
    pub toolset: Option<String>,
    pub include_dir: Option<String>,
    pub cflags: Vec<String>,
    pub lflags: Vec<String>,
    pub exclude: Vec<String>,
    /// (name, path, include)
    pub deps: Vec<(String, String, bool)>,
    /// (path relative to the project root, content)
    pub sources: Vec<(String, String)>,
    pub create_source_dir: bool,
}

impl ProjectSpec {
    fn new(name: &str, kind: &'static str) -> Self {
        ProjectSpec {
            name: name.to_string(),
            kind,
            toolset: None,
            include_dir: None,
            cflags: Vec::new(),
            lflags: Vec::new(),
            exclude: Vec::new(),
            deps: Vec::new(),
            sources: Vec::new(),
            create_source_dir: true,
        }
    }

    pub fn console(name: &str) -> Self {
        Self::new(name, "ConsoleApp")
    }

    pub fn shared_lib(name: &str) -> Self {
        Self::new(name, "SharedLib")
    }

    pub fn static_lib(name: &str) -> Self {
        Self::new(name, "StaticLib")
    }

    pub fn utility(name: &str) -> Self {
        Self::new(name, "Utility")
    }

    pub fn toolset(mut self, toolset: &str) -> Self {
        self.toolset = Some(toolset.to_string());
        self
    }

    pub fn include_dir(mut self, dir: &str) -> Self {
        self.include_dir = Some(dir.to_string());
        self
    }

    pub fn cflags(mut self, flags: &[&str]) -> Self {
        self.cflags.extend(flags.iter().map(|f| f.to_string()));
        self
    }

    pub fn lflags(mut self, flags: &[&str]) -> Self {
        self.lflags.extend(flags.iter().map(|f| f.to_string()));
        self
    }

    pub fn exclude(mut self, fragment: &str) -> Self {
        self.exclude.push(fragment.to_string());
        self
    }

    /// Depend on the sibling project `../<name>`.
    pub fn dep(self, name: &str, include: bool) -> Self {
        let path = format!("../{}", name);
        self.dep_path(name, &path, include)
    }

    pub fn dep_path(mut self, name: &str, path: &str, include: bool) -> Self {
        self.deps
            .push((name.to_string(), path.to_string(), include));
        self
    }

    pub fn source(mut self, path: &str, content: &str) -> Self {
        self.sources.push((path.to_string(), content.to_string()));
        self
    }

    pub fn no_source_dir(mut self) -> Self {
        self.create_source_dir = false;
        self
    }

    /// Render the `weld.toml` content.
    pub fn manifest(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "[project]\nname = {:?}\ntype = {:?}\n", self.name, self.kind);

        if let Some(ref toolset) = self.toolset {
            let _ = writeln!(out, "[settings]\ntoolset = {:?}\n", toolset);
        }
        if let Some(ref dir) = self.include_dir {
            let _ = writeln!(out, "[lib]\ninclude_dir = {:?}\n", dir);
        }
        if !self.exclude.is_empty() {
            let _ = writeln!(out, "[files]\nexclude = {:?}\n", self.exclude);
        }
        if !self.cflags.is_empty() || !self.lflags.is_empty() {
            let _ = writeln!(
                out,
                "[gnuc]\ncflags = {:?}\nlflags = {:?}\n",
                self.cflags, self.lflags
            );
        }
        for (name, path, include) in &self.deps {
            let _ = writeln!(
                out,
                "[dependencies.{}]\npath = {:?}\ninclude = {}\n",
                name, path, include
            );
        }
        out
    }
}

/// Write `spec` into `<parent>/<name>` and return the canonical project root.
pub fn write_project(parent: &Path, spec: &ProjectSpec) -> PathBuf {
    let dir = parent.join(&spec.name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("weld.toml"), spec.manifest()).unwrap();

    if spec.create_source_dir {
        std::fs::create_dir_all(dir.join("src")).unwrap();
    }
    for (rel, content) in &spec.sources {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    dir.canonicalize().unwrap()
}

/// Write a workspace manifest into `<parent>/<name>` and return its canonical root.
pub fn write_workspace(parent: &Path, name: &str, members: &[&str]) -> PathBuf {
    let dir = parent.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("weld.toml"),
        format!("[workspace]\nmembers = {:?}\n", members),
    )
    .unwrap();
    dir.canonicalize().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::{Manifest, ProjectKind};
    use tempfile::TempDir;

    #[test]
    fn test_fixture_manifest_parses() {
        let tmp = TempDir::new().unwrap();
        let dir = write_project(
            tmp.path(),
            &ProjectSpec::static_lib("m")
                .include_dir("include")
                .cflags(&["-Wall"])
                .exclude("gen/")
                .dep("other", true),
        );

        let Manifest::Project(p) = Manifest::load(&dir).unwrap() else {
            panic!("expected a project");
        };
        assert_eq!(
            p.kind,
            ProjectKind::StaticLib {
                include_dir: dir.join("include")
            }
        );
        assert_eq!(p.compile_flags, vec!["-Wall"]);
        assert_eq!(p.excluded_paths, vec!["gen/"]);
        assert_eq!(p.dependencies[0].path, PathBuf::from("../other"));
    }
}
