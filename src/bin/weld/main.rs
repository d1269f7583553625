//! Weld CLI - a parallel build orchestrator for C and C++ projects

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};
use commands::Session;
use weld::builder::{BuildError, ToolsetError};
use weld::core::ManifestError;
use weld::resolver::ResolveError;
use weld::util::diagnostic::{self, Diagnostic};
use weld::util::Shell;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "weld=debug" } else { "weld=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.quiet { "weld=error" } else { default_filter })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let shell = Arc::new(Shell::from_flags(
        cli.quiet,
        cli.verbose,
        cli.color,
        cli.message_format == MessageFormat::Json,
    ));

    if let Err(e) = run(cli, Arc::clone(&shell)) {
        report(&shell, &e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, shell: Arc<Shell>) -> Result<()> {
    let session = Session {
        shell,
        manifest_path: cli.manifest_path,
        jobs: cli.jobs,
    };

    match cli.command.unwrap_or(Commands::Build) {
        Commands::Build => commands::build::execute(&session),
        Commands::New(args) => commands::new::execute(args, &session),
        Commands::Clean => commands::clean::execute(&session),
        Commands::Tree(args) => commands::tree::execute(args, &session),
    }
}

/// Print a failed command's error and what to do about it.
fn report(shell: &Shell, err: &anyhow::Error) {
    if shell.is_json() {
        shell.error(format!("{:#}", err));
        return;
    }

    let diag = if let Some(e) = err.downcast_ref::<BuildError>() {
        e.to_diagnostic()
    } else if let Some(e) = err.downcast_ref::<ResolveError>() {
        e.to_diagnostic()
    } else if let Some(e) = err.downcast_ref::<ManifestError>() {
        from_miette(e)
    } else if let Some(e) = err.downcast_ref::<ToolsetError>() {
        from_miette(e)
    } else {
        Diagnostic::error(format!("{:#}", err))
    };

    diagnostic::emit(&diag, shell.use_color());
}

/// Carry a miette code and help text over into a weld diagnostic.
fn from_miette(err: &dyn miette::Diagnostic) -> Diagnostic {
    let mut diag = Diagnostic::error(err.to_string());
    if let Some(source) = err.source() {
        diag = diag.with_context(source.to_string());
    }
    if let Some(code) = err.code() {
        diag = diag.with_context(format!("code: {}", code));
    }
    if let Some(help) = err.help() {
        diag = diag.with_suggestion(help.to_string());
    }
    diag
}
