//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use weld::ops::ScaffoldKind;
use weld::util::shell::ColorChoice;

/// Weld - a parallel build orchestrator for C and C++ projects
#[derive(Parser)]
#[command(name = "weld")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, default_value = "auto", value_parser = parse_color)]
    pub color: ColorChoice,

    /// Output format for build progress
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    /// Path to weld.toml (or the directory holding it)
    #[arg(long, global = true)]
    pub manifest_path: Option<PathBuf>,

    /// Number of parallel compile jobs
    #[arg(short, long, global = true, env = "WELD_JOBS")]
    pub jobs: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the current project or workspace (default)
    Build,

    /// Create a new weld project
    New(NewArgs),

    /// Remove build artifacts
    Clean,

    /// Display the dependency tree
    Tree(TreeArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    ConsoleApp,
    SharedLib,
    StaticLib,
    Utility,
}

impl From<KindArg> for ScaffoldKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::ConsoleApp => ScaffoldKind::ConsoleApp,
            KindArg::SharedLib => ScaffoldKind::SharedLib,
            KindArg::StaticLib => ScaffoldKind::StaticLib,
            KindArg::Utility => ScaffoldKind::Utility,
        }
    }
}

#[derive(Args)]
pub struct NewArgs {
    /// Project name
    pub name: String,

    /// Compiler driver: gcc or g++
    #[arg(long, default_value = "gcc")]
    pub toolset: String,

    /// Project kind
    #[arg(long, value_enum, default_value_t = KindArg::ConsoleApp)]
    pub kind: KindArg,

    /// Directory to create the project in (defaults to name)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Maximum depth to display
    #[arg(long)]
    pub depth: Option<usize>,
}

fn parse_color(s: &str) -> Result<ColorChoice, String> {
    s.parse()
}
