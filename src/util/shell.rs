//! Centralized shell output and progress management.
//!
//! The Shell renders everything the user sees during a build:
//! - Status messages with consistent formatting
//! - A compile progress bar (via indicatif)
//! - JSON lines for machine-readable output
//!
//! # Design Principles
//!
//! 1. **Commands never manage spacing/indentation directly** - Shell handles all formatting
//! 2. **JSON mode is mutually exclusive** - No human output when JSON mode is enabled
//! 3. **Progress bars only in normal verbosity on a terminal** - Verbose mode prints plain lines

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;

use crate::builder::events::{BuildEvent, EventSink};

/// Shell output mode - Human and Json are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellMode {
    /// Human-readable output with optional colors and progress bars.
    Human {
        verbosity: Verbosity,
        color: ColorChoice,
    },
    /// Machine-readable JSON output only.
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Auto,
        }
    }
}

/// Output verbosity level (Human mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// --quiet: errors only, no progress
    Quiet,
    /// Default: status messages + progress bars
    #[default]
    Normal,
    /// --verbose: status lines and command lines, no progress bars
    Verbose,
}

/// Color output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorChoice {
    /// Detect TTY and use colors if available.
    #[default]
    Auto,
    /// Always use ANSI colors.
    Always,
    /// Never use ANSI colors.
    Never,
}

impl std::str::FromStr for ColorChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorChoice::Auto),
            "always" => Ok(ColorChoice::Always),
            "never" => Ok(ColorChoice::Never),
            _ => Err(format!(
                "invalid color choice '{}'; expected 'auto', 'always', or 'never'",
                s
            )),
        }
    }
}

/// Status types for output messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    // Success statuses (green)
    Created,
    Finished,
    Removed,

    // In-progress statuses (cyan)
    Compiling,
    Linking,
    Building,

    // Warning statuses (yellow)
    Skipped,
    Warning,

    // Error status (red)
    Error,
}

impl Status {
    /// Get the display text for this status.
    fn as_str(&self) -> &'static str {
        match self {
            Status::Created => "Created",
            Status::Finished => "Finished",
            Status::Removed => "Removed",
            Status::Compiling => "Compiling",
            Status::Linking => "Linking",
            Status::Building => "Building",
            Status::Skipped => "Skipped",
            Status::Warning => "Warning",
            Status::Error => "error",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Created | Status::Finished | Status::Removed => "\x1b[1;32m",
            Status::Compiling | Status::Linking | Status::Building => "\x1b[1;36m",
            Status::Skipped | Status::Warning => "\x1b[1;33m",
            Status::Error => "\x1b[1;31m",
        }
    }
}

/// Width statuses are right-aligned to.
const STATUS_WIDTH: usize = 12;

/// Central shell for all CLI output.
///
/// Also the [`EventSink`] of real builds.
#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    use_color: bool,
    /// Whether a progress bar may be drawn
    progress_enabled: bool,
    /// Compile progress of the project currently building
    progress: Mutex<Option<ProjectProgress>>,
}

#[derive(Debug)]
struct ProjectProgress {
    project: String,
    bar: ProgressBar,
}

impl Shell {
    /// Create a new shell with the given mode.
    pub fn new(mode: ShellMode) -> Self {
        let tty = io::stderr().is_terminal();
        let use_color = match &mode {
            ShellMode::Json => false,
            ShellMode::Human { color, .. } => match color {
                ColorChoice::Auto => tty,
                ColorChoice::Always => true,
                ColorChoice::Never => false,
            },
        };
        let progress_enabled = tty
            && matches!(
                mode,
                ShellMode::Human {
                    verbosity: Verbosity::Normal,
                    ..
                }
            );

        Shell {
            mode,
            use_color,
            progress_enabled,
            progress: Mutex::new(None),
        }
    }

    /// Create a shell from CLI flags with proper precedence.
    ///
    /// JSON mode takes precedence over quiet/verbose.
    pub fn from_flags(
        quiet: bool,
        verbose: bool,
        color: ColorChoice,
        message_format_json: bool,
    ) -> Self {
        let mode = if message_format_json {
            ShellMode::Json
        } else {
            let verbosity = if quiet {
                Verbosity::Quiet
            } else if verbose {
                Verbosity::Verbose
            } else {
                Verbosity::Normal
            };
            ShellMode::Human { verbosity, color }
        };

        Shell::new(mode)
    }

    pub fn mode(&self) -> &ShellMode {
        &self.mode
    }

    pub fn is_quiet(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Quiet,
                ..
            }
        )
    }

    pub fn is_verbose(&self) -> bool {
        matches!(
            self.mode,
            ShellMode::Human {
                verbosity: Verbosity::Verbose,
                ..
            }
        )
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, ShellMode::Json)
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    /// Print a status message.
    ///
    /// Format: `{status:>12} {message}`
    ///
    /// In quiet mode, only Error status is printed.
    /// In JSON mode, messages are silently ignored.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_json() {
            return;
        }
        if self.is_quiet() && status != Status::Error {
            return;
        }

        let line = format!("{} {}", self.format_status(status), msg);
        let progress = self.progress.lock();
        match progress.as_ref() {
            Some(p) => p.bar.println(line),
            None => eprintln!("{}", line),
        }
    }

    /// Print a warning message.
    pub fn warn(&self, msg: impl Display) {
        self.status(Status::Warning, msg);
    }

    /// Print an error message.
    ///
    /// In JSON mode, this outputs a JSON error event.
    pub fn error(&self, msg: impl Display) {
        if self.is_json() {
            let event = serde_json::json!({
                "reason": "error",
                "message": msg.to_string()
            });
            self.json_line(&event.to_string());
        } else {
            self.status(Status::Error, msg);
        }
    }

    /// Print one JSON line to stdout.
    fn json_line(&self, line: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }

    /// Format a status prefix with optional color.
    fn format_status(&self, status: Status) -> String {
        let text = status.as_str();
        if self.use_color {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                text,
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", text, width = STATUS_WIDTH)
        }
    }

    /// The human status line for an event, if it has one.
    fn render(&self, event: &BuildEvent) -> Option<(Status, String)> {
        match event {
            BuildEvent::CompileStarted {
                project, source, ..
            } => {
                let file = source.file_name().unwrap_or(source.as_os_str());
                Some((
                    Status::Compiling,
                    format!("{} ({})", file.to_string_lossy(), project),
                ))
            }
            BuildEvent::CompileFinished {
                source,
                success: false,
                ..
            } => Some((
                Status::Error,
                format!("failed to compile {}", source.display()),
            )),
            BuildEvent::LinkStarted { project, artifact } => Some((
                Status::Linking,
                format!("{} ({})", project, artifact.display()),
            )),
            BuildEvent::LinkFinished {
                project,
                success: false,
                ..
            } => Some((Status::Error, format!("failed to link {}", project))),
            BuildEvent::ProjectSkipped { project, detail } => {
                Some((Status::Skipped, format!("{} ({})", project, detail)))
            }
            BuildEvent::BuildFinished {
                success: true,
                duration_ms,
                projects_built,
            } => Some((
                Status::Finished,
                format!(
                    "{} project{} in {}",
                    projects_built,
                    if *projects_built == 1 { "" } else { "s" },
                    format_duration(Duration::from_millis(*duration_ms))
                ),
            )),
            _ => None,
        }
    }

    /// Start, advance or end the compile progress bar.
    fn track_progress(&self, event: &BuildEvent) {
        if !self.progress_enabled {
            return;
        }
        let mut progress = self.progress.lock();

        match event {
            BuildEvent::CompileStarted { project, total, .. } if *total > 1 => {
                if progress.as_ref().is_some_and(|p| &p.project == project) {
                    return;
                }
                if let Some(old) = progress.take() {
                    old.bar.finish_and_clear();
                }
                let bar = ProgressBar::new(*total as u64);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
                {
                    bar.set_style(style.progress_chars("#>-"));
                }
                bar.set_message(project.clone());
                *progress = Some(ProjectProgress {
                    project: project.clone(),
                    bar,
                });
            }
            BuildEvent::CompileFinished { project, .. } => {
                if let Some(p) = progress.as_ref().filter(|p| &p.project == project) {
                    p.bar.inc(1);
                }
            }
            BuildEvent::LinkStarted { .. }
            | BuildEvent::ProjectSkipped { .. }
            | BuildEvent::BuildFinished { .. } => {
                if let Some(old) = progress.take() {
                    old.bar.finish_and_clear();
                }
            }
            _ => {}
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

impl EventSink for Shell {
    fn emit(&self, event: BuildEvent) {
        if self.is_json() {
            self.json_line(&event.to_json());
            return;
        }

        // Bar first so the closing status line lands after it is cleared
        if matches!(
            event,
            BuildEvent::LinkStarted { .. } | BuildEvent::BuildFinished { .. }
        ) {
            self.track_progress(&event);
        }
        if let Some((status, msg)) = self.render(&event) {
            self.status(status, msg);
        }
        self.track_progress(&event);
    }
}

/// Format a duration in a human-readable way.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 60.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.1}m", secs / 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn plain() -> Shell {
        Shell::new(ShellMode::Human {
            verbosity: Verbosity::Normal,
            color: ColorChoice::Never,
        })
    }

    #[test]
    fn test_shell_modes() {
        let shell = plain();
        assert!(!shell.is_quiet());
        assert!(!shell.is_verbose());
        assert!(!shell.is_json());

        let quiet_shell = Shell::new(ShellMode::Human {
            verbosity: Verbosity::Quiet,
            color: ColorChoice::Never,
        });
        assert!(quiet_shell.is_quiet());

        let json_shell = Shell::new(ShellMode::Json);
        assert!(json_shell.is_json());
        assert!(!json_shell.use_color());
    }

    #[test]
    fn test_color_choice_parse() {
        assert_eq!("auto".parse::<ColorChoice>().unwrap(), ColorChoice::Auto);
        assert_eq!("Always".parse::<ColorChoice>().unwrap(), ColorChoice::Always);
        assert_eq!("never".parse::<ColorChoice>().unwrap(), ColorChoice::Never);
        assert!("invalid".parse::<ColorChoice>().is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "0.50s");
        assert_eq!(format_duration(Duration::from_secs(2)), "2.00s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1.5m");
    }

    #[test]
    fn test_status_formatting() {
        let formatted = plain().format_status(Status::Linking);
        assert_eq!(formatted, "     Linking");
        assert_eq!(formatted.len(), STATUS_WIDTH);
    }

    #[test]
    fn test_render_events() {
        let shell = plain();

        let started = BuildEvent::CompileStarted {
            project: "app".into(),
            source: PathBuf::from("/p/src/main.c"),
            total: 2,
        };
        assert_eq!(
            shell.render(&started),
            Some((Status::Compiling, "main.c (app)".to_string()))
        );

        let ok = BuildEvent::CompileFinished {
            project: "app".into(),
            source: PathBuf::from("/p/src/main.c"),
            object: PathBuf::from("/p/bin/genobjs/main.o"),
            success: true,
        };
        assert_eq!(shell.render(&ok), None);

        let done = BuildEvent::finished(true, 1500, 1);
        assert_eq!(
            shell.render(&done),
            Some((Status::Finished, "1 project in 1.50s".to_string()))
        );
        assert_eq!(shell.render(&BuildEvent::finished(false, 10, 0)), None);
    }

    #[test]
    fn test_from_flags() {
        let shell = Shell::from_flags(false, false, ColorChoice::Auto, false);
        assert!(!shell.is_quiet());
        assert!(!shell.is_verbose());
        assert!(!shell.is_json());

        let shell = Shell::from_flags(true, false, ColorChoice::Auto, false);
        assert!(shell.is_quiet());

        let shell = Shell::from_flags(false, true, ColorChoice::Auto, false);
        assert!(shell.is_verbose());

        // JSON takes precedence
        let shell = Shell::from_flags(true, true, ColorChoice::Auto, true);
        assert!(shell.is_json());
        assert!(!shell.is_quiet());
    }
}
