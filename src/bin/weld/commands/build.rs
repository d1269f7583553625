//! `weld build` command

use anyhow::Result;

use crate::commands::Session;
use weld::ops::build;
use weld::util::shell::Status;
use weld::util::GlobalContext;

pub fn execute(session: &Session) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let root = session.manifest_root(&ctx)?;

    let build_ctx = ctx
        .build_context(&root, session.jobs)
        .with_events(session.shell.clone());

    session
        .shell
        .status(Status::Building, root.display());
    let report = build(&build_ctx, &root)?;

    if session.shell.is_verbose() {
        for output in &report.outputs {
            if let Some(artifact) = &output.artifact {
                session
                    .shell
                    .status(Status::Finished, format!("{} -> {}", output.name, artifact.display()));
            }
        }
    }

    Ok(())
}
