//! `weld clean` command

use anyhow::Result;

use crate::commands::Session;
use weld::ops::clean;
use weld::util::shell::Status;
use weld::util::GlobalContext;

pub fn execute(session: &Session) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let root = session.manifest_root(&ctx)?;

    if let Some(removed) = clean(&root)? {
        session.shell.status(Status::Removed, removed.display());
    }
    Ok(())
}
