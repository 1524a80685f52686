//! Operator prompt abstraction.
//!
//! The [`Prompter`] trait decouples the stop gate loop from how the operator is
//! reached (line console, interactive terminal, desktop dialog). Tests use
//! scripted prompters that return predetermined decisions without any I/O.

use std::io::{self, BufRead, BufReader, IsTerminal, Stderr, Stdin, Write};

use anyhow::{Context, Result, anyhow};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use tracing::{debug, info, warn};

use crate::core::types::Decision;
use crate::io::config::PromptMode;
use crate::io::dialog::{DialogBackend, DialogPrompter};

/// Asks the operator whether to retry a failed action.
pub trait Prompter {
    /// Show `message` under `title` and block until the operator decides.
    fn ask(&mut self, title: &str, message: &str) -> Result<Decision>;
}

/// Free-form operator interactions used by the file gate.
pub trait OperatorInput {
    /// Ask for a line of text. `None` means the operator cancelled.
    ///
    /// A blank answer yields `default`, or counts as a cancel when `default` is empty.
    fn input(&mut self, title: &str, message: &str, default: &str) -> Result<Option<String>>;

    /// Show a short, non-blocking notice.
    fn notify(&mut self, title: Option<&str>, message: &str) -> Result<()>;
}

/// Everything [`select_prompter`] can hand back.
pub trait Operator: Prompter + OperatorInput {}

impl<T: Prompter + OperatorInput + ?Sized> Operator for T {}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn ask(&mut self, title: &str, message: &str) -> Result<Decision> {
        (**self).ask(title, message)
    }
}

impl<P: Prompter + ?Sized> Prompter for Box<P> {
    fn ask(&mut self, title: &str, message: &str) -> Result<Decision> {
        (**self).ask(title, message)
    }
}

impl<O: OperatorInput + ?Sized> OperatorInput for &mut O {
    fn input(&mut self, title: &str, message: &str, default: &str) -> Result<Option<String>> {
        (**self).input(title, message, default)
    }

    fn notify(&mut self, title: Option<&str>, message: &str) -> Result<()> {
        (**self).notify(title, message)
    }
}

impl<O: OperatorInput + ?Sized> OperatorInput for Box<O> {
    fn input(&mut self, title: &str, message: &str, default: &str) -> Result<Option<String>> {
        (**self).input(title, message, default)
    }

    fn notify(&mut self, title: Option<&str>, message: &str) -> Result<()> {
        (**self).notify(title, message)
    }
}

/// Line-oriented prompter over any reader/writer pair.
///
/// Used when stdin is not a terminal (pipes, CI logs) and in tests.
pub struct ConsolePrompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> ConsolePrompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }

    /// Read one line; `None` on end of input.
    fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .context("read console answer")?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

impl ConsolePrompter<BufReader<Stdin>, Stderr> {
    /// Prompt on stderr, read answers from stdin.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompter for ConsolePrompter<R, W> {
    fn ask(&mut self, title: &str, message: &str) -> Result<Decision> {
        write!(
            self.writer,
            "[STOP] {title}\n{message}\nType 'r' to retry or anything else to abort: "
        )
        .context("write console prompt")?;
        self.writer.flush().context("flush console prompt")?;

        match self.read_line()? {
            Some(answer) => Ok(Decision::from_answer(&answer)),
            None => {
                debug!("console input closed, treating as abort");
                Ok(Decision::Abort)
            }
        }
    }
}

impl<R: BufRead, W: Write> OperatorInput for ConsolePrompter<R, W> {
    fn input(&mut self, title: &str, message: &str, default: &str) -> Result<Option<String>> {
        writeln!(self.writer, "[{title}]").context("write console prompt")?;
        let prompt = if default.is_empty() {
            write!(self.writer, "{message}\n> ")
        } else {
            write!(self.writer, "{message}\n[{default}] > ")
        };
        prompt.context("write console prompt")?;
        self.writer.flush().context("flush console prompt")?;

        let Some(line) = self.read_line()? else {
            return Ok(None);
        };
        Ok(resolve_answer(&line, default))
    }

    fn notify(&mut self, _title: Option<&str>, message: &str) -> Result<()> {
        writeln!(self.writer, "{message}").context("write console notice")?;
        self.writer.flush().context("flush console notice")?;
        Ok(())
    }
}

/// Interactive terminal prompter (arrow-key selection).
#[derive(Default)]
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

const CHOICES: [&str; 2] = ["Retry", "Abort"];

impl Prompter for TerminalPrompter {
    fn ask(&mut self, title: &str, message: &str) -> Result<Decision> {
        eprintln!("\n{message}\n");
        let choice = Select::with_theme(&self.theme)
            .with_prompt(title)
            .items(&CHOICES)
            .default(0)
            .interact_opt()
            .context("read terminal selection")?;
        Ok(match choice {
            Some(0) => Decision::Retry,
            _ => Decision::Abort,
        })
    }
}

impl OperatorInput for TerminalPrompter {
    /// Text entry has no cancel key: Enter accepts the prefilled default, and
    /// Ctrl-C terminates the process. Cancelling means clearing the field when
    /// there is no default.
    fn input(&mut self, title: &str, message: &str, default: &str) -> Result<Option<String>> {
        eprintln!("[{title}]");
        let mut prompt = Input::<String>::with_theme(&self.theme)
            .with_prompt(message)
            .allow_empty(true);
        if !default.is_empty() {
            prompt = prompt.default(default.to_string());
        }
        let answer = prompt.interact_text().context("read terminal input")?;
        Ok(resolve_answer(&answer, default))
    }

    fn notify(&mut self, _title: Option<&str>, message: &str) -> Result<()> {
        eprintln!("{message}");
        Ok(())
    }
}

/// Asks `primary`; if it cannot be shown, asks `secondary` instead.
///
/// The fallback is decided per call, so a dialog that becomes available again
/// is used on the next prompt.
pub struct FallbackPrompter<A, B> {
    primary: A,
    secondary: B,
}

impl<A, B> FallbackPrompter<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: Prompter, B: Prompter> Prompter for FallbackPrompter<A, B> {
    fn ask(&mut self, title: &str, message: &str) -> Result<Decision> {
        match self.primary.ask(title, message) {
            Ok(decision) => Ok(decision),
            Err(err) => {
                warn!(err = %format!("{err:#}"), "primary prompt failed, falling back");
                self.secondary.ask(title, message)
            }
        }
    }
}

impl<A: OperatorInput, B: OperatorInput> OperatorInput for FallbackPrompter<A, B> {
    fn input(&mut self, title: &str, message: &str, default: &str) -> Result<Option<String>> {
        match self.primary.input(title, message, default) {
            Ok(answer) => Ok(answer),
            Err(err) => {
                warn!(err = %format!("{err:#}"), "primary input failed, falling back");
                self.secondary.input(title, message, default)
            }
        }
    }

    fn notify(&mut self, title: Option<&str>, message: &str) -> Result<()> {
        match self.primary.notify(title, message) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(err = %format!("{err:#}"), "primary notice failed, falling back");
                self.secondary.notify(title, message)
            }
        }
    }
}

/// Trimmed operator answer; blank falls back to `default`, blank with no default cancels.
pub(crate) fn resolve_answer(answer: &str, default: &str) -> Option<String> {
    let answer = answer.trim();
    if !answer.is_empty() {
        Some(answer.to_string())
    } else if default.is_empty() {
        None
    } else {
        Some(default.to_string())
    }
}

/// Pick an operator implementation for `mode` based on the current environment.
pub fn select_prompter(mode: PromptMode) -> Result<Box<dyn Operator>> {
    select_prompter_with(mode, DialogBackend::detect())
}

/// True when `mode` would read operator answers line by line from a piped stdin.
///
/// Callers that consume stdin themselves cannot prompt through such an operator.
pub fn answers_from_piped_stdin(mode: PromptMode) -> bool {
    let backend = match mode {
        PromptMode::Auto => DialogBackend::detect(),
        PromptMode::Dialog | PromptMode::Console => None,
    };
    uses_line_console(mode, backend, io::stdin().is_terminal())
}

fn uses_line_console(mode: PromptMode, backend: Option<DialogBackend>, stdin_tty: bool) -> bool {
    match mode {
        PromptMode::Dialog => false,
        PromptMode::Auto if backend.is_some() => false,
        PromptMode::Auto | PromptMode::Console => !stdin_tty,
    }
}

fn select_prompter_with(
    mode: PromptMode,
    detected: Option<DialogBackend>,
) -> Result<Box<dyn Operator>> {
    match mode {
        PromptMode::Auto => match detected {
            Some(backend) => {
                info!(backend = backend.program(), "using graphical dialogs");
                Ok(Box::new(FallbackPrompter::new(
                    DialogPrompter::new(backend),
                    console_operator(),
                )))
            }
            None => Ok(console_operator()),
        },
        PromptMode::Dialog => {
            let backend = detected.ok_or_else(|| {
                anyhow!(
                    "no graphical dialog available (needs a desktop session and one of osascript, zenity, kdialog)"
                )
            })?;
            info!(backend = backend.program(), "using graphical dialogs");
            Ok(Box::new(DialogPrompter::new(backend)))
        }
        PromptMode::Console => Ok(console_operator()),
    }
}

fn console_operator() -> Box<dyn Operator> {
    if io::stdin().is_terminal() && io::stderr().is_terminal() {
        debug!("using interactive terminal prompts");
        Box::new(TerminalPrompter::default())
    } else {
        debug!("using line console prompts");
        Box::new(ConsolePrompter::stdio())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::test_support::ScriptedPrompter;

    fn console(input: &str) -> ConsolePrompter<Cursor<Vec<u8>>, Vec<u8>> {
        ConsolePrompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn written(prompter: ConsolePrompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(prompter.into_parts().1).expect("utf8")
    }

    #[test]
    fn console_retries_on_r() {
        let mut prompter = console("r\n");
        let decision = prompter.ask("Save", "disk full").expect("ask");
        assert_eq!(decision, Decision::Retry);
        assert_eq!(
            written(prompter),
            "[STOP] Save\ndisk full\nType 'r' to retry or anything else to abort: "
        );
    }

    #[test]
    fn console_aborts_on_other_answers_and_eof() {
        let mut prompter = console("n\n");
        assert_eq!(prompter.ask("t", "m").expect("ask"), Decision::Abort);
        assert_eq!(prompter.ask("t", "m").expect("ask at eof"), Decision::Abort);
    }

    #[test]
    fn console_reads_one_answer_per_prompt() {
        let mut prompter = console("r\nretry\nq\n");
        assert_eq!(prompter.ask("t", "m").expect("1"), Decision::Retry);
        assert_eq!(prompter.ask("t", "m").expect("2"), Decision::Retry);
        assert_eq!(prompter.ask("t", "m").expect("3"), Decision::Abort);
    }

    #[test]
    fn console_input_applies_default_and_detects_cancel() {
        let mut prompter = console("\n/tmp/other.txt\n");
        assert_eq!(
            prompter
                .input("Write File", "Write file to:", "out.txt")
                .expect("blank"),
            Some("out.txt".to_string())
        );
        assert_eq!(
            prompter
                .input("Write File", "Write file to:", "out.txt")
                .expect("typed"),
            Some("/tmp/other.txt".to_string())
        );
        assert_eq!(
            prompter
                .input("Write File", "Write file to:", "out.txt")
                .expect("eof"),
            None
        );
        assert!(written(prompter).contains("Write file to:\n[out.txt] > "));
    }

    #[test]
    fn blank_answer_without_default_cancels() {
        assert_eq!(resolve_answer("  ~/a.txt \n", "b.txt"), Some("~/a.txt".to_string()));
        assert_eq!(resolve_answer("\n", "b.txt"), Some("b.txt".to_string()));
        assert_eq!(resolve_answer("  ", ""), None);

        let mut prompter = console("\n");
        assert_eq!(prompter.input("Name", "Label:", "").expect("blank"), None);
        assert!(written(prompter).contains("Label:\n> "));
    }

    #[test]
    fn piped_stdin_means_line_console_unless_dialog() {
        assert!(uses_line_console(PromptMode::Console, None, false));
        assert!(uses_line_console(PromptMode::Auto, None, false));
        assert!(!uses_line_console(
            PromptMode::Auto,
            Some(DialogBackend::Zenity),
            false
        ));
        assert!(!uses_line_console(PromptMode::Dialog, None, false));
        assert!(!uses_line_console(PromptMode::Console, None, true));
    }

    #[test]
    fn dialog_mode_without_backend_is_an_error() {
        let err = select_prompter_with(PromptMode::Dialog, None)
            .err()
            .expect("dialog mode should fail");
        assert!(err.to_string().contains("no graphical dialog available"));
        assert!(select_prompter_with(PromptMode::Auto, None).is_ok());
        assert!(select_prompter_with(PromptMode::Dialog, Some(DialogBackend::Zenity)).is_ok());
    }

    #[test]
    fn fallback_uses_secondary_when_primary_errors() {
        let broken = ScriptedPrompter::new(Vec::new());
        let backup = ScriptedPrompter::new(vec![Decision::Retry]);
        let mut prompter = FallbackPrompter::new(broken, backup);
        assert_eq!(prompter.ask("t", "m").expect("ask"), Decision::Retry);
        assert_eq!(prompter.secondary.asked.len(), 1);
    }

    #[test]
    fn fallback_prefers_primary() {
        let primary = ScriptedPrompter::new(vec![Decision::Abort]);
        let backup = ScriptedPrompter::new(vec![Decision::Retry]);
        let mut prompter = FallbackPrompter::new(primary, backup);
        assert_eq!(prompter.ask("t", "m").expect("ask"), Decision::Abort);
        assert!(prompter.secondary.asked.is_empty());
    }

    #[test]
    fn boxed_operator_forwards_calls() {
        let mut operator: Box<dyn Operator> =
            Box::new(ScriptedPrompter::new(vec![Decision::Retry]));
        assert_eq!(operator.ask("t", "m").expect("ask"), Decision::Retry);
        operator.notify(None, "done").expect("notify");
    }
}
