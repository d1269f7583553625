//! `weld new` command

use anyhow::Result;

use crate::cli::NewArgs;
use crate::commands::Session;
use weld::ops::{new_project, NewOptions};
use weld::util::shell::Status;
use weld::util::GlobalContext;

pub fn execute(args: NewArgs, session: &Session) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let path = ctx.cwd().join(args.path.unwrap_or_else(|| args.name.clone().into()));

    let opts = NewOptions {
        name: args.name,
        toolset: args.toolset,
        kind: args.kind.into(),
    };
    new_project(&path, &opts)?;

    session.shell.status(
        Status::Created,
        format!("{} `{}` project", opts.kind.manifest_type(), opts.name),
    );
    Ok(())
}
