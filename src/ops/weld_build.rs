//! Implementation of `weld build`.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::builder::context::BuildContext;
use crate::builder::errors::BuildError;
use crate::builder::events::BuildEvent;
use crate::builder::pool::WorkerPool;
use crate::builder::project::{BuildOutput, ProjectBuilder};
use crate::builder::workspace::build_workspace;
use crate::core::manifest::Manifest;
use crate::resolver::DependencyGraph;

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// One entry per root project or workspace member
    pub outputs: Vec<BuildOutput>,

    /// Projects that went through the compile stage, dependencies included
    pub projects_built: usize,

    pub duration: Duration,
}

/// Build the project or workspace whose manifest lives in `root`.
///
/// One worker pool of `ctx.jobs` threads serves the whole invocation. A
/// `BuildFinished` event is emitted whether the build succeeds or not.
pub fn build(ctx: &BuildContext, root: &Path) -> Result<BuildReport> {
    let manifest = Manifest::load(root)?;
    let pool = WorkerPool::new(ctx.jobs).context("failed to start the worker pool")?;
    tracing::debug!("worker pool with {} threads", pool.thread_count());

    let start = Instant::now();
    let mut builder = ProjectBuilder::new(ctx, &pool);
    let result = build_manifest(&mut builder, manifest);
    let duration = start.elapsed();
    let projects_built = builder.compiled_count();

    ctx.events.emit(BuildEvent::finished(
        result.is_ok(),
        duration.as_millis() as u64,
        projects_built,
    ));

    Ok(BuildReport {
        outputs: result?,
        projects_built,
        duration,
    })
}

fn build_manifest(
    builder: &mut ProjectBuilder<'_>,
    manifest: Manifest,
) -> Result<Vec<BuildOutput>, BuildError> {
    match manifest {
        Manifest::Project(project) => {
            let graph = DependencyGraph::load(project)?;
            Ok(vec![builder.build(&graph)?])
        }
        Manifest::Workspace(workspace) => build_workspace(builder, &workspace),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::toolchain::ToolSearchPath;
    use crate::test_support::fixtures::{write_project, write_workspace, ProjectSpec};
    use crate::test_support::{fake_toolchain_dir, RecordingRunner, RecordingSink};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn context(tmp: &TempDir, runner: RecordingRunner) -> (BuildContext, Arc<RecordingSink>) {
        let bin = fake_toolchain_dir(tmp.path());
        let sink = Arc::new(RecordingSink::default());
        let ctx = BuildContext::new(ToolSearchPath::new([bin]))
            .with_runner(Arc::new(runner))
            .with_events(sink.clone())
            .with_jobs(2);
        (ctx, sink)
    }

    #[test]
    fn test_build_project_with_dependency() {
        let tmp = TempDir::new().unwrap();
        write_project(
            tmp.path(),
            &ProjectSpec::static_lib("util").source("src/util.c", "int util(void);\n"),
        );
        let app = write_project(
            tmp.path(),
            &ProjectSpec::console("app")
                .dep("util", true)
                .source("src/main.c", "int main(void) { return 0; }\n"),
        );

        let (ctx, sink) = context(&tmp, RecordingRunner::new());
        let report = build(&ctx, &app).unwrap();

        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.outputs[0].artifact, Some(app.join("bin/app")));
        assert_eq!(report.projects_built, 2);
        assert!(matches!(
            sink.events().last(),
            Some(BuildEvent::BuildFinished {
                success: true,
                projects_built: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_build_workspace() {
        let tmp = TempDir::new().unwrap();
        let ws = write_workspace(tmp.path(), "ws", &["core", "tool"]);
        write_project(
            &ws,
            &ProjectSpec::static_lib("core").source("src/core.c", "int core(void);\n"),
        );
        write_project(
            &ws,
            &ProjectSpec::console("tool")
                .dep("core", false)
                .source("src/main.c", "int main(void) { return 0; }\n"),
        );

        let (ctx, _sink) = context(&tmp, RecordingRunner::new());
        let report = build(&ctx, &ws).unwrap();

        let names: Vec<_> = report.outputs.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["core", "tool"]);
        assert!(ws.join("bin/core/libcore.a").is_file());
    }

    #[test]
    fn test_failed_build_still_reports_finish() {
        let tmp = TempDir::new().unwrap();
        let app = write_project(
            tmp.path(),
            &ProjectSpec::console("app").source("src/main.c", "int main(void) { return 0; }\n"),
        );

        let (ctx, sink) = context(&tmp, RecordingRunner::failing_on("main.c", 1));
        let err = build(&ctx, &app).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::Compile { .. })
        ));
        assert!(matches!(
            sink.events().last(),
            Some(BuildEvent::BuildFinished { success: false, .. })
        ));
    }

    #[test]
    fn test_cycle_fails_before_compiling() {
        let tmp = TempDir::new().unwrap();
        write_project(
            tmp.path(),
            &ProjectSpec::static_lib("a")
                .dep("b", false)
                .source("src/a.c", "int a(void);\n"),
        );
        write_project(
            tmp.path(),
            &ProjectSpec::static_lib("b")
                .dep("a", false)
                .source("src/b.c", "int b(void);\n"),
        );

        let runner = RecordingRunner::new();
        let (ctx, _sink) = context(&tmp, runner);
        let err = build(&ctx, &tmp.path().join("a")).unwrap_err();

        assert!(err.to_string().contains("cycle detected"));
    }
}
