//! weld.toml manifest parsing and schema.
//!
//! A manifest declares either one project (`[project]`) or a workspace of
//! member projects (`[workspace]`). Decoding resolves every relative path
//! against the directory holding the manifest, so downstream code only ever
//! sees absolute paths.

use std::io;
use std::path::{Path, PathBuf};

use miette::Diagnostic as MietteDiagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::builder::toolchain::Toolset;
use crate::core::workspace::MANIFEST_NAME;
use crate::util::fs::{lexically_normal, normalize_path};

const DEFAULT_TOOLSET: &str = "gcc";
const DEFAULT_SRC_DIR: &str = "src";
const DEFAULT_OUT_DIR: &str = "bin";
const DEFAULT_EXTENSIONS: [&str; 2] = [".c", ".cpp"];

/// Errors raised while reading or decoding a manifest.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ManifestError {
    #[error("could not find `weld.toml` in `{}` or any parent directory", dir.display())]
    #[diagnostic(
        code(weld::manifest::not_found),
        help("run `weld new <name>` to create a project")
    )]
    NotFound { dir: PathBuf },

    #[error("failed to read manifest `{}`", path.display())]
    #[diagnostic(code(weld::manifest::read))]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse manifest `{}`: {message}", path.display())]
    #[diagnostic(code(weld::manifest::parse))]
    Parse { path: PathBuf, message: String },

    #[error("manifest `{}` has neither a [project] nor a [workspace] section", path.display())]
    #[diagnostic(code(weld::manifest::no_section))]
    NoSection { path: PathBuf },

    #[error("manifest `{}` declares both [project] and [workspace]", path.display())]
    #[diagnostic(
        code(weld::manifest::ambiguous),
        help("move the project into its own directory and list it in [workspace] members")
    )]
    ProjectAndWorkspace { path: PathBuf },

    #[error("manifest `{}` is missing required field `{field}`", path.display())]
    #[diagnostic(code(weld::manifest::missing_field))]
    MissingField { path: PathBuf, field: String },

    #[error("field `{field}` in manifest `{}` must be a {expected}", path.display())]
    #[diagnostic(code(weld::manifest::invalid_field))]
    InvalidField {
        path: PathBuf,
        field: String,
        expected: &'static str,
    },

    #[error("unknown project type `{kind}` in manifest `{}`", path.display())]
    #[diagnostic(
        code(weld::manifest::unknown_kind),
        help("expected one of \"ConsoleApp\", \"SharedLib\", \"StaticLib\" or \"Utility\"")
    )]
    UnknownKind { path: PathBuf, kind: String },

    #[error("project `{project}` is a ConsoleApp and cannot declare an include directory")]
    #[diagnostic(
        code(weld::manifest::include_dir),
        help("[lib] include_dir is only valid for SharedLib, StaticLib and Utility projects")
    )]
    IncludeDirNotAllowed { project: String },

    #[error("[gnuc] in manifest `{}` requires toolset \"gcc\" or \"g++\", found `{toolset}`", path.display())]
    #[diagnostic(code(weld::manifest::gnuc_toolset))]
    GnucRequiresGnuToolset { path: PathBuf, toolset: String },

    #[error("`{}` is a workspace manifest, expected a project", path.display())]
    #[diagnostic(code(weld::manifest::expected_project))]
    ExpectedProject { path: PathBuf },
}

/// The kind of artifact a project produces.
///
/// Library kinds carry the directory they expose to consumers as an include
/// path; a console application has none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectKind {
    ConsoleApp,
    SharedLib { include_dir: PathBuf },
    StaticLib { include_dir: PathBuf },
    /// Header-only project: contributes include paths, never compiled or linked.
    Utility { include_dir: PathBuf },
}

impl ProjectKind {
    /// The manifest spelling of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::ConsoleApp => "ConsoleApp",
            ProjectKind::SharedLib { .. } => "SharedLib",
            ProjectKind::StaticLib { .. } => "StaticLib",
            ProjectKind::Utility { .. } => "Utility",
        }
    }

    pub fn is_utility(&self) -> bool {
        matches!(self, ProjectKind::Utility { .. })
    }

    /// Include directory exposed by library kinds.
    pub fn include_dir(&self) -> Option<&Path> {
        match self {
            ProjectKind::ConsoleApp => None,
            ProjectKind::SharedLib { include_dir }
            | ProjectKind::StaticLib { include_dir }
            | ProjectKind::Utility { include_dir } => Some(include_dir),
        }
    }

    /// File name of the artifact produced for a project called `name`.
    pub fn artifact_name(&self, name: &str) -> Option<String> {
        match self {
            ProjectKind::ConsoleApp => Some(name.to_string()),
            ProjectKind::SharedLib { .. } => Some(format!("lib{}.so", name)),
            ProjectKind::StaticLib { .. } => Some(format!("lib{}.a", name)),
            ProjectKind::Utility { .. } => None,
        }
    }
}

/// A declared reference from one project to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEdge {
    /// Key of the `[dependencies.<name>]` table
    pub name: String,
    /// Path of the dependency project, relative to the consumer's root
    pub path: PathBuf,
    /// Whether the consumer compiles against the dependency's include directory
    pub exposes_include: bool,
}

/// A fully decoded project manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectManifest {
    pub name: String,
    pub kind: ProjectKind,
    /// Compiler identifier, validated when a build needs it
    pub toolset: String,
    /// Absolute directory containing the manifest
    pub root_path: PathBuf,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// File extensions, each with a leading dot
    pub source_extensions: Vec<String>,
    pub excluded_paths: Vec<String>,
    pub compile_flags: Vec<String>,
    pub link_flags: Vec<String>,
    pub dependencies: Vec<DependencyEdge>,
}

impl ProjectManifest {
    /// Load the project manifest stored in `dir`.
    pub fn load(dir: &Path) -> Result<Self, ManifestError> {
        match Manifest::load(dir)? {
            Manifest::Project(project) => Ok(project),
            Manifest::Workspace(ws) => Err(ManifestError::ExpectedProject {
                path: ws.manifest_path(),
            }),
        }
    }

    /// The include directory exposed to consumers.
    ///
    /// Console applications expose none; asking for it is a configuration error.
    pub fn include_dir(&self) -> Result<&Path, ManifestError> {
        self.kind
            .include_dir()
            .ok_or_else(|| ManifestError::IncludeDirNotAllowed {
                project: self.name.clone(),
            })
    }

    /// File name of the final artifact, `None` for utility projects.
    pub fn artifact_name(&self) -> Option<String> {
        self.kind.artifact_name(&self.name)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root_path.join(MANIFEST_NAME)
    }

    /// Absolute root of a dependency declared by this project.
    pub fn dependency_root(&self, edge: &DependencyEdge) -> PathBuf {
        lexically_normal(&self.root_path.join(&edge.path))
    }
}

/// A decoded workspace manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceManifest {
    /// Absolute directory containing the manifest
    pub root_path: PathBuf,
    /// Member paths relative to `root_path`, in declaration order
    pub members: Vec<PathBuf>,
    /// Shared output tree; member `m` builds into `output_dir/m`
    pub output_dir: PathBuf,
}

impl WorkspaceManifest {
    pub fn manifest_path(&self) -> PathBuf {
        self.root_path.join(MANIFEST_NAME)
    }

    /// Absolute roots of every member, in declaration order.
    pub fn member_roots(&self) -> Vec<PathBuf> {
        self.members
            .iter()
            .map(|m| lexically_normal(&self.root_path.join(m)))
            .collect()
    }
}

/// Either kind of manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Manifest {
    Project(ProjectManifest),
    Workspace(WorkspaceManifest),
}

#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    project: Option<RawProject>,
    workspace: Option<RawWorkspace>,
    #[serde(default)]
    settings: RawSettings,
    lib: Option<RawLib>,
    #[serde(default)]
    files: RawFiles,
    gnuc: Option<RawGnuc>,
    #[serde(default)]
    dependencies: toml::Table,
}

#[derive(Debug, Default, Deserialize)]
struct RawProject {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawWorkspace {
    members: Option<Vec<String>>,
    out_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    toolset: Option<String>,
    src_dir: Option<String>,
    out_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLib {
    include_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawFiles {
    cextensions: Option<Vec<String>>,
    #[serde(default)]
    exclude: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawGnuc {
    #[serde(default)]
    cflags: Vec<String>,
    #[serde(default)]
    lflags: Vec<String>,
}

impl Manifest {
    /// Load the manifest stored in `dir`.
    pub fn load(dir: &Path) -> Result<Self, ManifestError> {
        let root = normalize_path(dir);
        let path = root.join(MANIFEST_NAME);
        let content = std::fs::read_to_string(&path).map_err(|source| ManifestError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content, &path)
    }

    /// Decode manifest content read from `path`.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(content).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            message: e.message().to_string(),
        })?;

        let root = lexically_normal(path.parent().unwrap_or(Path::new(".")));

        match (raw.project.is_some(), raw.workspace.is_some()) {
            (true, true) => Err(ManifestError::ProjectAndWorkspace {
                path: path.to_path_buf(),
            }),
            (true, false) => decode_project(raw, root, path).map(Manifest::Project),
            (false, true) => decode_workspace(raw, root, path).map(Manifest::Workspace),
            (false, false) => Err(ManifestError::NoSection {
                path: path.to_path_buf(),
            }),
        }
    }
}

fn decode_workspace(
    raw: RawManifest,
    root: PathBuf,
    path: &Path,
) -> Result<WorkspaceManifest, ManifestError> {
    let ws = raw.workspace.unwrap_or_default();
    let members = ws.members.ok_or_else(|| ManifestError::MissingField {
        path: path.to_path_buf(),
        field: "workspace.members".to_string(),
    })?;

    let out_dir = ws
        .out_dir
        .or(raw.settings.out_dir)
        .unwrap_or_else(|| DEFAULT_OUT_DIR.to_string());

    Ok(WorkspaceManifest {
        output_dir: lexically_normal(&root.join(out_dir)),
        members: members.into_iter().map(PathBuf::from).collect(),
        root_path: root,
    })
}

fn decode_project(
    raw: RawManifest,
    root: PathBuf,
    path: &Path,
) -> Result<ProjectManifest, ManifestError> {
    let project = raw.project.unwrap_or_default();
    let missing = |field: &str| ManifestError::MissingField {
        path: path.to_path_buf(),
        field: field.to_string(),
    };

    let name = project.name.ok_or_else(|| missing("project.name"))?;
    let kind_str = project.kind.ok_or_else(|| missing("project.type"))?;

    let toolset = raw
        .settings
        .toolset
        .unwrap_or_else(|| DEFAULT_TOOLSET.to_string());
    let src_dir = raw
        .settings
        .src_dir
        .unwrap_or_else(|| DEFAULT_SRC_DIR.to_string());
    let out_dir = raw
        .settings
        .out_dir
        .unwrap_or_else(|| DEFAULT_OUT_DIR.to_string());

    let source_dir = lexically_normal(&root.join(&src_dir));
    let include_dir = raw
        .lib
        .as_ref()
        .and_then(|l| l.include_dir.as_ref())
        .map(|dir| lexically_normal(&root.join(dir)))
        .unwrap_or_else(|| source_dir.clone());

    let kind = match kind_str.as_str() {
        "ConsoleApp" => {
            if raw.lib.is_some() {
                return Err(ManifestError::IncludeDirNotAllowed { project: name });
            }
            ProjectKind::ConsoleApp
        }
        "SharedLib" => ProjectKind::SharedLib { include_dir },
        "StaticLib" => ProjectKind::StaticLib { include_dir },
        "Utility" => ProjectKind::Utility { include_dir },
        other => {
            return Err(ManifestError::UnknownKind {
                path: path.to_path_buf(),
                kind: other.to_string(),
            })
        }
    };

    if raw.gnuc.is_some() && !Toolset::is_gnu(&toolset) {
        return Err(ManifestError::GnucRequiresGnuToolset {
            path: path.to_path_buf(),
            toolset,
        });
    }
    let gnuc = raw.gnuc.unwrap_or_default();

    let compile_flags = non_empty(gnuc.cflags);
    let mut link_flags = non_empty(gnuc.lflags);
    if kind.is_utility() && !link_flags.is_empty() {
        tracing::warn!(
            "project `{}` is a Utility project; ignoring {} link flag(s)",
            name,
            link_flags.len()
        );
        link_flags.clear();
    }

    let source_extensions = match raw.files.cextensions {
        Some(exts) => normalize_extensions(exts),
        None => DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
    };

    let dependencies = decode_dependencies(&raw.dependencies, path)?;

    Ok(ProjectManifest {
        name,
        kind,
        toolset,
        source_dir,
        output_dir: lexically_normal(&root.join(out_dir)),
        root_path: root,
        source_extensions,
        excluded_paths: raw.files.exclude,
        compile_flags,
        link_flags,
        dependencies,
    })
}

fn decode_dependencies(
    table: &toml::Table,
    path: &Path,
) -> Result<Vec<DependencyEdge>, ManifestError> {
    let mut edges = Vec::with_capacity(table.len());

    for (name, value) in table {
        let field = |suffix: &str| format!("dependencies.{}{}", name, suffix);

        let dep = value.as_table().ok_or_else(|| ManifestError::InvalidField {
            path: path.to_path_buf(),
            field: field(""),
            expected: "table",
        })?;

        let dep_path = match dep.get("path") {
            Some(toml::Value::String(p)) => PathBuf::from(p),
            Some(_) => {
                return Err(ManifestError::InvalidField {
                    path: path.to_path_buf(),
                    field: field(".path"),
                    expected: "string",
                })
            }
            None => {
                return Err(ManifestError::MissingField {
                    path: path.to_path_buf(),
                    field: field(".path"),
                })
            }
        };

        let exposes_include = match dep.get("include") {
            Some(toml::Value::Boolean(b)) => *b,
            Some(_) => {
                return Err(ManifestError::InvalidField {
                    path: path.to_path_buf(),
                    field: field(".include"),
                    expected: "boolean",
                })
            }
            None => false,
        };

        edges.push(DependencyEdge {
            name: name.clone(),
            path: dep_path,
            exposes_include,
        });
    }

    Ok(edges)
}

fn non_empty(flags: Vec<String>) -> Vec<String> {
    flags.into_iter().filter(|f| !f.trim().is_empty()).collect()
}

fn normalize_extensions(exts: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(exts.len());
    for ext in exts {
        let ext = if ext.starts_with('.') {
            ext
        } else {
            format!(".{}", ext)
        };
        if !out.contains(&ext) {
            out.push(ext);
        }
    }
    out
}

/// Generate the manifest for a freshly scaffolded project.
///
/// `kind` is the manifest `type` value, e.g. `ConsoleApp`.
pub fn generate_manifest(name: &str, kind: &str, toolset: &str) -> String {
    let extension = if toolset == "g++" { ".cpp" } else { ".c" };

    format!(
        r#"[project]
name = "{name}"
type = "{kind}"

[files]
cextensions = ["{extension}"]

[settings]
toolset = "{toolset}"
src_dir = "src"
out_dir = "bin"

[gnuc]
cflags = [""]
lflags = [""]
"#
    )
}
