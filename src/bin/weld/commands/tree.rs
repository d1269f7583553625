//! `weld tree` command

use anyhow::Result;

use crate::cli::TreeArgs;
use crate::commands::Session;
use weld::ops::tree;
use weld::util::GlobalContext;

pub fn execute(args: TreeArgs, session: &Session) -> Result<()> {
    let ctx = GlobalContext::new()?;
    let root = session.manifest_root(&ctx)?;

    print!("{}", tree(&root, args.depth.unwrap_or(usize::MAX))?);
    Ok(())
}
