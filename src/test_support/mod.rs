//! Test utilities for weld unit tests.
//!
//! Builds run against a recording command runner instead of a real compiler:
//! every [`CommandSpec`] is recorded and its output file touched, so the
//! builder sees the artifacts it expects on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! let tmp = TempDir::new().unwrap();
//! let bin = fake_toolchain_dir(tmp.path());
//! let runner = Arc::new(RecordingRunner::new());
//! let ctx = BuildContext::new(ToolSearchPath::new([bin])).with_runner(runner.clone());
//! ```

pub mod fixtures;

use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::builder::events::{BuildEvent, EventSink};
use crate::builder::toolchain::CommandSpec;
use crate::util::process::{CommandRunner, ProcessStatus};

/// Create `<root>/toolchain-bin` holding executable `gcc`, `g++` and `ar` stubs.
pub fn fake_toolchain_dir(root: &Path) -> PathBuf {
    let bin = root.join("toolchain-bin");
    std::fs::create_dir_all(&bin).unwrap();

    for tool in ["gcc", "g++", "ar"] {
        let path = bin.join(tool);
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    bin
}

/// Records commands instead of running them.
///
/// Successful commands touch their output (`-o <file>`, or the archive named
/// after `rcs`). A runner built with [`RecordingRunner::failing_on`] reports
/// a non-zero exit for commands with an argument ending in the given text.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    commands: Mutex<Vec<CommandSpec>>,
    fail_on: Option<(String, i32)>,
    unless: Vec<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `code` for any command with an argument ending in `needle`.
    pub fn failing_on(needle: &str, code: i32) -> Self {
        RecordingRunner {
            fail_on: Some((needle.to_string(), code)),
            ..Self::default()
        }
    }

    /// Restrict failures to commands that do not contain `arg`.
    pub fn only_without(mut self, arg: &str) -> Self {
        self.unless.push(arg.to_string());
        self
    }

    /// Every command run so far, in execution order.
    pub fn commands(&self) -> Vec<CommandSpec> {
        self.commands.lock().clone()
    }

    /// The file a compile, link or archive command writes.
    pub fn output_of(cmd: &CommandSpec) -> Option<PathBuf> {
        if cmd.args.first().is_some_and(|a| a == "rcs") {
            return cmd.args.get(1).map(PathBuf::from);
        }
        cmd.output_arg().map(PathBuf::from)
    }

    fn should_fail(&self, cmd: &CommandSpec) -> Option<i32> {
        let (needle, code) = self.fail_on.as_ref()?;
        let hit = cmd
            .args
            .iter()
            .any(|a| a.to_string_lossy().ends_with(needle.as_str()));
        let exempt = cmd
            .args
            .iter()
            .any(|a| self.unless.iter().any(|u| a == u.as_str()));
        (hit && !exempt).then_some(*code)
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &CommandSpec) -> io::Result<ProcessStatus> {
        self.commands.lock().push(cmd.clone());

        if let Some(code) = self.should_fail(cmd) {
            return Ok(ProcessStatus::exited(code));
        }

        if let Some(output) = Self::output_of(cmd) {
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output, b"")?;
        }
        Ok(ProcessStatus::ok())
    }
}

/// Collects every emitted event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<BuildEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<BuildEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: BuildEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_recording_runner_touches_outputs() {
        let tmp = TempDir::new().unwrap();
        let obj = tmp.path().join("genobjs/main.o");
        let archive = tmp.path().join("libx.a");
        let runner = RecordingRunner::new();

        let compile = CommandSpec::new("gcc")
            .args(["-c", "main.c", "-o"])
            .arg(obj.display().to_string());
        let ar = CommandSpec::new("ar")
            .arg("rcs")
            .arg(archive.display().to_string())
            .arg(obj.display().to_string());

        assert!(runner.run(&compile).unwrap().success());
        assert!(runner.run(&ar).unwrap().success());
        assert!(obj.is_file());
        assert!(archive.is_file());
        assert_eq!(runner.commands().len(), 2);
    }

    #[test]
    fn test_recording_runner_failure() {
        let runner = RecordingRunner::failing_on("bad.c", 4);
        let cmd = CommandSpec::new("gcc").args(["-c", "src/bad.c", "-o", "/nonexistent/bad.o"]);

        assert_eq!(runner.run(&cmd).unwrap().code, Some(4));
    }
}
