//! `diagon`: pause on failure and ask a human before retrying.
//!
//! `diagon run -- <cmd>` re-runs a command each time the operator chooses
//! Retry after it fails. `diagon write` and `diagon toast` expose the file
//! gate and operator notices.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use diagon::exit_codes;
use diagon::io::process::CommandAction;
use diagon::{
    GateError, OperatorInput, PromptMode, StopConfig, StopGate, answers_from_piped_stdin,
    gate_write, load_config, logging, select_prompter,
};
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "diagon.toml";

#[derive(Parser)]
#[command(
    name = "diagon",
    version,
    about = "Pause on failure and ask a human to retry or abort"
)]
struct Cli {
    /// Log gate attempts and prompter selection to stderr.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a command; after each failure ask whether to retry it.
    Run {
        #[command(flatten)]
        gate: GateArgs,
        /// Kill the command if a single attempt runs longer than this.
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Command and arguments (after `--`).
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Ask where to write a file, then write it atomically.
    Write {
        /// Suggested destination.
        path: PathBuf,
        /// Read content from this file instead of stdin.
        #[arg(long)]
        from: Option<PathBuf>,
        #[arg(long)]
        prompt: Option<PromptMode>,
    },
    /// Show a short notice.
    Toast {
        message: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        prompt: Option<PromptMode>,
    },
}

/// Gate settings; flags override the config file.
#[derive(Args, Debug, Default)]
struct GateArgs {
    /// TOML config file (defaults to `diagon.toml` if present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// auto, dialog or console.
    #[arg(long)]
    prompt: Option<PromptMode>,
    #[arg(long)]
    max_attempts: Option<u32>,
    #[arg(long)]
    deadline_secs: Option<u64>,
    #[arg(long)]
    title: Option<String>,
    /// Do not show the failure text in the prompt.
    #[arg(long)]
    hide_details: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::from(exit_codes::INVALID as u8)
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Run {
            gate,
            timeout_secs,
            command,
        } => cmd_run(&gate, timeout_secs, &command),
        Command::Write { path, from, prompt } => cmd_write(&path, from.as_deref(), prompt),
        Command::Toast {
            message,
            title,
            prompt,
        } => cmd_toast(&message, title.as_deref(), prompt),
    }
}

fn cmd_run(args: &GateArgs, timeout_secs: Option<u64>, command: &[String]) -> Result<i32> {
    let config = resolve_config(args)?;
    let mut action = CommandAction::from_argv(command)?;
    action.timeout = timeout_secs.map(Duration::from_secs);
    debug!(command = %action.display(), "running under stop gate");

    let mut gate = StopGate::new(select_prompter(config.prompt)?, config);
    match gate.run(|| action.run()) {
        Ok(output) => {
            io::stdout()
                .write_all(&output.stdout)
                .context("write command stdout")?;
            Ok(exit_codes::OK)
        }
        Err(err) => {
            let code = gate_exit_code(&err);
            eprintln!("{:#}", anyhow::Error::new(err));
            Ok(code)
        }
    }
}

fn cmd_write(path: &Path, from: Option<&Path>, prompt: Option<PromptMode>) -> Result<i32> {
    let mode = resolve_prompt_mode(prompt)?;
    let content = match from {
        Some(src) => fs::read(src).with_context(|| format!("read {}", src.display()))?,
        None => {
            if answers_from_piped_stdin(mode) {
                bail!(
                    "content is read from stdin, so the destination cannot be asked there; \
                     pass --from FILE or use --prompt dialog"
                );
            }
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("read content from stdin")?;
            buf
        }
    };
    let mut operator = select_prompter(mode)?;
    match gate_write(path, &content, &mut operator)? {
        Some(_) => Ok(exit_codes::OK),
        None => Ok(exit_codes::CANCELLED),
    }
}

fn cmd_toast(message: &str, title: Option<&str>, prompt: Option<PromptMode>) -> Result<i32> {
    let mode = resolve_prompt_mode(prompt)?;
    let mut operator = select_prompter(mode)?;
    operator.notify(title, message)?;
    Ok(exit_codes::OK)
}

fn gate_exit_code(err: &GateError) -> i32 {
    if err.is_aborted() {
        exit_codes::ABORTED
    } else if err.is_limit() {
        exit_codes::LIMIT
    } else {
        exit_codes::INVALID
    }
}

/// Load the config file (explicit path must exist) and apply flag overrides.
fn resolve_config(args: &GateArgs) -> Result<StopConfig> {
    let mut config = match &args.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            load_config(path)?
        }
        None => load_config(Path::new(DEFAULT_CONFIG_PATH))?,
    };
    if let Some(prompt) = args.prompt {
        config.prompt = prompt;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.max_attempts = Some(max_attempts);
    }
    if let Some(deadline_secs) = args.deadline_secs {
        config.deadline_secs = Some(deadline_secs);
    }
    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if args.hide_details {
        config.show_details = false;
    }
    config.validate()?;
    Ok(config)
}

fn resolve_prompt_mode(prompt: Option<PromptMode>) -> Result<PromptMode> {
    match prompt {
        Some(mode) => Ok(mode),
        None => Ok(load_config(Path::new(DEFAULT_CONFIG_PATH))?.prompt),
    }
}
