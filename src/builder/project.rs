//! Single-project build: resolve, discover, compile in parallel, link.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::graph::NodeIndex;

use crate::builder::context::BuildContext;
use crate::builder::discovery::{discover, exclude};
use crate::builder::errors::BuildError;
use crate::builder::events::BuildEvent;
use crate::builder::flags::{Flag, FlagSet};
use crate::builder::pool::{TaskHandle, WorkerPool};
use crate::builder::toolchain::{CommandSpec, GnuToolchain, Toolset, ToolsetError};
use crate::core::manifest::{ProjectKind, ProjectManifest};
use crate::core::workspace::WorkspaceInfo;
use crate::resolver::{self, DependencyBuilder, DependencyGraph};
use crate::util::fs::{ensure_dir, normalize_path};

/// Name of the object directory inside a project's output directory.
pub const OBJECT_DIR: &str = "genobjs";

/// What one project build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub name: String,
    pub kind: ProjectKind,
    pub output_dir: PathBuf,
    /// Final artifact; `None` when nothing was linked
    pub artifact: Option<PathBuf>,
    /// Object files in link order
    pub objects: Vec<PathBuf>,
}

/// Builds projects, memoising completed builds for one invocation.
pub struct ProjectBuilder<'a> {
    ctx: &'a BuildContext,
    pool: &'a WorkerPool,
    completed: HashMap<(PathBuf, PathBuf), BuildOutput>,
    compiled: usize,
}

impl<'a> ProjectBuilder<'a> {
    pub fn new(ctx: &'a BuildContext, pool: &'a WorkerPool) -> Self {
        ProjectBuilder {
            ctx,
            pool,
            completed: HashMap::new(),
            compiled: 0,
        }
    }

    /// Build the root project of `graph` into its own output directory.
    pub fn build(&mut self, graph: &DependencyGraph) -> Result<BuildOutput, BuildError> {
        self.build_node(graph, graph.root(), None, None)
    }

    /// Number of projects that went through the compile stage.
    pub fn compiled_count(&self) -> usize {
        self.compiled
    }

    /// Build one project of the graph.
    ///
    /// `output_dir` overrides the manifest's own output directory (workspace
    /// members build into the shared tree). A project already built into the
    /// same output directory during this invocation is not built again.
    pub fn build_node(
        &mut self,
        graph: &DependencyGraph,
        node: NodeIndex,
        workspace: Option<&WorkspaceInfo>,
        output_dir: Option<PathBuf>,
    ) -> Result<BuildOutput, BuildError> {
        let manifest = graph.manifest(node);
        let out_dir = output_dir.unwrap_or_else(|| manifest.output_dir.clone());
        let key = (normalize_path(&manifest.root_path), out_dir.clone());

        if let Some(done) = self.completed.get(&key) {
            tracing::debug!("`{}` already built into {}", manifest.name, out_dir.display());
            return Ok(done.clone());
        }

        let mut output = BuildOutput {
            name: manifest.name.clone(),
            kind: manifest.kind.clone(),
            output_dir: out_dir.clone(),
            artifact: None,
            objects: Vec::new(),
        };

        if manifest.kind.is_utility() {
            self.skip(manifest, "utility project");
            self.completed.insert(key, output.clone());
            return Ok(output);
        }

        let toolset = Toolset::for_project(&manifest.toolset, &manifest.name)?;
        tracing::debug!("building `{}` ({})", manifest.name, manifest.kind.as_str());

        let mut flags = resolver::resolve(graph, node, workspace, self)?;
        add_kind_flags(&manifest.kind, &mut flags);

        let sources = collect_sources(manifest)?;
        let obj_dir = out_dir.join(OBJECT_DIR);
        ensure_dir(&out_dir).map_err(|e| BuildError::io(&out_dir, e))?;
        ensure_dir(&obj_dir).map_err(|e| BuildError::io(&obj_dir, e))?;

        if sources.is_empty() {
            tracing::warn!(
                "no sources found for `{}` under {}",
                manifest.name,
                manifest.source_dir.display()
            );
            self.skip(manifest, "no sources");
            self.completed.insert(key, output.clone());
            return Ok(output);
        }

        let units = object_paths(&manifest.name, &sources, &obj_dir)?;

        let archiver = match manifest.kind {
            ProjectKind::StaticLib { .. } => Some(self.ctx.archiver.as_str()),
            _ => None,
        };
        let toolchain = GnuToolchain::resolve(
            toolset,
            archiver,
            &self.ctx.search_path,
            &manifest.root_path,
        )?;

        self.compile_all(manifest, &toolchain, &flags.compile, &units)?;
        self.compiled += 1;

        output.objects = units.into_iter().map(|(_, obj)| obj).collect();

        if let Some(name) = manifest.artifact_name() {
            let artifact = out_dir.join(name);
            self.link(manifest, &toolchain, &output.objects, &flags.link, &artifact)?;
            output.artifact = Some(artifact);
        }

        self.completed.insert(key, output.clone());
        Ok(output)
    }

    fn skip(&self, manifest: &ProjectManifest, detail: &str) {
        tracing::debug!("skipping `{}`: {}", manifest.name, detail);
        self.ctx.events.emit(BuildEvent::ProjectSkipped {
            project: manifest.name.clone(),
            detail: detail.to_string(),
        });
    }

    /// Submit one compile task per source and wait for all of them.
    fn compile_all(
        &self,
        manifest: &ProjectManifest,
        toolchain: &GnuToolchain,
        flags: &[Flag],
        units: &[(PathBuf, PathBuf)],
    ) -> Result<(), BuildError> {
        let total = units.len();
        let mut handles: Vec<(PathBuf, TaskHandle<Result<(), BuildError>>)> =
            Vec::with_capacity(total);

        for (source, object) in units {
            let cmd = toolchain.compile_command(source, object, flags);
            let task = CompileTask {
                project: manifest.name.clone(),
                source: source.clone(),
                object: object.clone(),
                total,
                cmd,
            };
            let ctx = self.ctx.clone();
            handles.push((source.clone(), self.pool.submit(move || task.run(&ctx))));
        }

        self.pool.barrier();

        let mut first_error = None;
        for (source, handle) in handles {
            let result = handle.join().map_err(|source_err| BuildError::Pool {
                source_file: source,
                source: source_err,
            });
            if let Err(err) | Ok(Err(err)) = result {
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn link(
        &self,
        manifest: &ProjectManifest,
        toolchain: &GnuToolchain,
        objects: &[PathBuf],
        flags: &[Flag],
        artifact: &Path,
    ) -> Result<(), BuildError> {
        let cmd = match manifest.kind {
            ProjectKind::StaticLib { .. } => {
                // `ar rcs` appends to an existing archive
                if artifact.exists() {
                    std::fs::remove_file(artifact).map_err(|e| BuildError::io(artifact, e))?;
                }
                toolchain
                    .archive_command(objects, artifact)
                    .ok_or_else(|| ToolsetError::NotFound {
                        name: self.ctx.archiver.clone(),
                        searched: self.ctx.search_path.dirs().to_vec(),
                    })?
            }
            _ => toolchain.link_command(objects, flags, artifact),
        };

        self.ctx.events.emit(BuildEvent::LinkStarted {
            project: manifest.name.clone(),
            artifact: artifact.to_path_buf(),
        });

        let status = self
            .ctx
            .runner
            .run(&cmd)
            .map_err(|source| BuildError::Spawn {
                program: cmd.program.clone(),
                source,
            })?;

        self.ctx.events.emit(BuildEvent::LinkFinished {
            project: manifest.name.clone(),
            artifact: artifact.to_path_buf(),
            success: status.success(),
        });

        if !status.success() {
            return Err(BuildError::Link {
                project: manifest.name.clone(),
                artifact: artifact.to_path_buf(),
                code: status.code,
            });
        }
        Ok(())
    }
}

impl DependencyBuilder for ProjectBuilder<'_> {
    fn build_dependency(
        &mut self,
        graph: &DependencyGraph,
        node: NodeIndex,
    ) -> Result<(), BuildError> {
        // External dependencies always build standalone, outside any workspace
        self.build_node(graph, node, None, None).map(|_| ())
    }
}

/// One compilation unit, owned by the worker that runs it.
struct CompileTask {
    project: String,
    source: PathBuf,
    object: PathBuf,
    total: usize,
    cmd: CommandSpec,
}

impl CompileTask {
    fn run(self, ctx: &BuildContext) -> Result<(), BuildError> {
        ctx.events.emit(BuildEvent::CompileStarted {
            project: self.project.clone(),
            source: self.source.clone(),
            total: self.total,
        });

        let result = ctx.runner.run(&self.cmd);
        let success = matches!(result, Ok(status) if status.success());

        ctx.events.emit(BuildEvent::CompileFinished {
            project: self.project.clone(),
            source: self.source.clone(),
            object: self.object.clone(),
            success,
        });

        let status = result.map_err(|source| BuildError::Spawn {
            program: self.cmd.program.clone(),
            source,
        })?;
        if !status.success() {
            return Err(BuildError::Compile {
                project: self.project,
                source_file: self.source,
                code: status.code,
            });
        }
        Ok(())
    }
}

fn add_kind_flags(kind: &ProjectKind, flags: &mut FlagSet) {
    if let ProjectKind::SharedLib { .. } = kind {
        flags.compile.push(Flag::PositionIndependent);
        flags.link.push(Flag::PositionIndependent);
        flags.link.push(Flag::Shared);
    }
}

fn collect_sources(manifest: &ProjectManifest) -> Result<Vec<PathBuf>, BuildError> {
    if !manifest.source_dir.is_dir() {
        return Err(BuildError::SourceDirMissing {
            project: manifest.name.clone(),
            path: manifest.source_dir.clone(),
        });
    }

    let found = discover(&manifest.source_dir, &manifest.source_extensions)
        .map_err(|e| BuildError::io(&manifest.source_dir, e))?;
    let kept = exclude(&manifest.source_dir, found, &manifest.excluded_paths);
    tracing::debug!("`{}`: {} source file(s)", manifest.name, kept.len());
    Ok(kept)
}

/// Pair each source with `<obj_dir>/<stem>.o`, rejecting duplicate names.
fn object_paths(
    project: &str,
    sources: &[PathBuf],
    obj_dir: &Path,
) -> Result<Vec<(PathBuf, PathBuf)>, BuildError> {
    let mut seen: HashMap<String, &PathBuf> = HashMap::new();
    let mut units = Vec::with_capacity(sources.len());

    for source in sources {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let object = format!("{}.o", stem);

        if let Some(first) = seen.insert(object.clone(), source) {
            return Err(BuildError::ObjectCollision {
                project: project.to_string(),
                object,
                first: first.clone(),
                second: source.clone(),
            });
        }
        units.push((source.clone(), obj_dir.join(&object)));
    }

    Ok(units)
}
