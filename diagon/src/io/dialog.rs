//! Desktop dialogs through the platform's dialog helper program.
//!
//! `osascript` on macOS, `zenity` or `kdialog` under X11/Wayland. All three
//! use the same exit-code contract for questions and text entry: `0` means the
//! affirmative button, `1` means cancel.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{debug, instrument, warn};

use crate::core::types::Decision;
use crate::io::process::run_command;
use crate::io::prompter::{OperatorInput, Prompter, resolve_answer};

const OUTPUT_LIMIT_BYTES: usize = 64 * 1024;
const NOTICE_SECS: u64 = 2;
const NOTICE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_NOTICE_TITLE: &str = "diagon";

/// Dialog helper program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogBackend {
    Osascript,
    Zenity,
    Kdialog,
}

impl DialogBackend {
    pub fn program(self) -> &'static str {
        match self {
            DialogBackend::Osascript => "osascript",
            DialogBackend::Zenity => "zenity",
            DialogBackend::Kdialog => "kdialog",
        }
    }

    /// Detect a usable backend for the current session.
    pub fn detect() -> Option<Self> {
        detect_with(
            std::env::consts::OS,
            |key| std::env::var_os(key).is_some_and(|v| !v.is_empty()),
            |program| which::which(program).is_ok(),
        )
    }

    /// Retry/Abort question. Exit 0 = Retry, exit 1 = Abort.
    pub fn question_args(self, title: &str, message: &str) -> Vec<String> {
        match self {
            DialogBackend::Osascript => vec![
                "-e".to_string(),
                format!(
                    "display dialog \"{}\" with title \"{}\" buttons {{\"Abort\", \"Retry\"}} \
                     default button \"Retry\" cancel button \"Abort\" with icon caution",
                    applescript_escape(message),
                    applescript_escape(title)
                ),
            ],
            DialogBackend::Zenity => owned(&[
                "--question",
                "--no-markup",
                "--title",
                title,
                "--text",
                message,
                "--ok-label",
                "Retry",
                "--cancel-label",
                "Abort",
            ]),
            DialogBackend::Kdialog => owned(&[
                "--title",
                title,
                "--yesno",
                message,
                "--yes-label",
                "Retry",
                "--no-label",
                "Abort",
            ]),
        }
    }

    /// Text entry prefilled with `default`. Answer on stdout; exit 1 = cancelled.
    pub fn entry_args(self, title: &str, message: &str, default: &str) -> Vec<String> {
        match self {
            DialogBackend::Osascript => vec![
                "-e".to_string(),
                format!(
                    "text returned of (display dialog \"{}\" with title \"{}\" default answer \"{}\")",
                    applescript_escape(message),
                    applescript_escape(title),
                    applescript_escape(default)
                ),
            ],
            DialogBackend::Zenity => owned(&[
                "--entry",
                "--title",
                title,
                "--text",
                message,
                "--entry-text",
                default,
            ]),
            DialogBackend::Kdialog => owned(&["--title", title, "--inputbox", message, default]),
        }
    }

    /// Brief notice that closes on its own.
    pub fn notice_args(self, title: &str, message: &str) -> Vec<String> {
        let secs = NOTICE_SECS.to_string();
        match self {
            DialogBackend::Osascript => vec![
                "-e".to_string(),
                format!(
                    "display notification \"{}\" with title \"{}\"",
                    applescript_escape(message),
                    applescript_escape(title)
                ),
            ],
            DialogBackend::Zenity => owned(&[
                "--info",
                "--no-markup",
                "--title",
                title,
                "--text",
                message,
                "--timeout",
                secs.as_str(),
            ]),
            DialogBackend::Kdialog => {
                owned(&["--title", title, "--passivepopup", message, secs.as_str()])
            }
        }
    }
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

fn detect_with(
    os: &str,
    has_env: impl Fn(&str) -> bool,
    on_path: impl Fn(&str) -> bool,
) -> Option<DialogBackend> {
    if os == "macos" {
        return on_path("osascript").then_some(DialogBackend::Osascript);
    }
    if !(has_env("DISPLAY") || has_env("WAYLAND_DISPLAY")) {
        return None;
    }
    [DialogBackend::Zenity, DialogBackend::Kdialog]
        .into_iter()
        .find(|backend| on_path(backend.program()))
}

fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Map a question/entry helper exit code to "confirmed" (`true`) or "cancelled" (`false`).
fn confirmed(backend: DialogBackend, code: Option<i32>, stderr: &[u8]) -> Result<bool> {
    match code {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        other => bail!(
            "{} failed with exit code {:?}: {}",
            backend.program(),
            other,
            String::from_utf8_lossy(stderr).trim()
        ),
    }
}

/// Modal dialog prompter.
#[derive(Debug, Clone)]
pub struct DialogPrompter {
    backend: DialogBackend,
    program: PathBuf,
}

impl DialogPrompter {
    pub fn new(backend: DialogBackend) -> Self {
        Self::with_program(backend, backend.program())
    }

    /// Use `program` as the helper binary while speaking `backend`'s flags.
    pub fn with_program(backend: DialogBackend, program: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            program: program.into(),
        }
    }

    fn command(&self, args: Vec<String>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        cmd
    }
}

impl Prompter for DialogPrompter {
    #[instrument(skip_all, fields(backend = self.backend.program()))]
    fn ask(&mut self, title: &str, message: &str) -> Result<Decision> {
        let output = run_command(
            self.command(self.backend.question_args(title, message)),
            None,
            OUTPUT_LIMIT_BYTES,
        )?;
        let decision = if confirmed(self.backend, output.status.code(), &output.stderr)? {
            Decision::Retry
        } else {
            Decision::Abort
        };
        debug!(decision = decision.as_str(), "dialog answered");
        Ok(decision)
    }
}

impl OperatorInput for DialogPrompter {
    #[instrument(skip_all, fields(backend = self.backend.program()))]
    fn input(&mut self, title: &str, message: &str, default: &str) -> Result<Option<String>> {
        let output = run_command(
            self.command(self.backend.entry_args(title, message, default)),
            None,
            OUTPUT_LIMIT_BYTES,
        )?;
        if !confirmed(self.backend, output.status.code(), &output.stderr)? {
            return Ok(None);
        }
        Ok(resolve_answer(&String::from_utf8_lossy(&output.stdout), default))
    }

    fn notify(&mut self, title: Option<&str>, message: &str) -> Result<()> {
        let title = title.unwrap_or(DEFAULT_NOTICE_TITLE);
        let output = run_command(
            self.command(self.backend.notice_args(title, message)),
            Some(NOTICE_TIMEOUT),
            OUTPUT_LIMIT_BYTES,
        )?;
        // zenity exits 5 when its --timeout closes the window.
        if !output.status.success() && output.status.code() != Some(5) {
            warn!(
                backend = self.backend.program(),
                exit_code = ?output.status.code(),
                "notice helper reported failure"
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macos_uses_osascript_without_display() {
        let backend = detect_with("macos", |_| false, |p| p == "osascript");
        assert_eq!(backend, Some(DialogBackend::Osascript));
    }

    #[test]
    fn linux_requires_a_display() {
        assert_eq!(detect_with("linux", |_| false, |_| true), None);
        assert_eq!(
            detect_with("linux", |k| k == "WAYLAND_DISPLAY", |_| true),
            Some(DialogBackend::Zenity)
        );
    }

    #[test]
    fn linux_falls_back_to_kdialog() {
        let backend = detect_with("linux", |k| k == "DISPLAY", |p| p == "kdialog");
        assert_eq!(backend, Some(DialogBackend::Kdialog));
        assert_eq!(detect_with("linux", |k| k == "DISPLAY", |_| false), None);
    }

    #[test]
    fn zenity_question_labels_buttons() {
        let args = DialogBackend::Zenity.question_args("Action required", "disk <full> & more");
        assert!(args.contains(&"--question".to_string()));
        assert!(args.contains(&"--no-markup".to_string()));
        assert!(args.contains(&"disk <full> & more".to_string()));
        assert!(args.windows(2).any(|w| w == ["--ok-label", "Retry"]));
        assert!(args.windows(2).any(|w| w == ["--cancel-label", "Abort"]));
    }

    #[test]
    fn osascript_escapes_quotes_and_backslashes() {
        let args = DialogBackend::Osascript.question_args("T", r#"path "C:\tmp" locked"#);
        assert_eq!(args[0], "-e");
        assert!(args[1].contains(r#"display dialog "path \"C:\\tmp\" locked""#), "{}", args[1]);
        assert!(args[1].contains(r#"cancel button "Abort""#));
    }

    #[test]
    fn kdialog_entry_passes_default() {
        assert_eq!(
            DialogBackend::Kdialog.entry_args("Write File", "Write file to:", "out.txt"),
            vec!["--title", "Write File", "--inputbox", "Write file to:", "out.txt"]
        );
    }

    #[test]
    fn exit_codes_map_to_confirmation() {
        assert!(confirmed(DialogBackend::Zenity, Some(0), b"").expect("ok"));
        assert!(!confirmed(DialogBackend::Zenity, Some(1), b"").expect("cancel"));
        let err = confirmed(DialogBackend::Zenity, Some(255), b"cannot open display").unwrap_err();
        assert!(err.to_string().contains("cannot open display"));
        assert!(confirmed(DialogBackend::Kdialog, None, b"").is_err());
    }
}
