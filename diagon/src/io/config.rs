//! Stop gate configuration, optionally loaded from a TOML file.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::limits::Limits;

/// How the operator is asked to retry or abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Graphical dialog when a desktop session is available, otherwise the console.
    #[default]
    Auto,
    Dialog,
    Console,
}

impl FromStr for PromptMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(PromptMode::Auto),
            "dialog" => Ok(PromptMode::Dialog),
            "console" => Ok(PromptMode::Console),
            other => Err(anyhow!(
                "unknown prompt mode '{other}' (expected auto, dialog or console)"
            )),
        }
    }
}

/// Stop gate configuration (TOML).
///
/// Missing fields take the defaults below: unlimited retries, no deadline,
/// failure details shown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StopConfig {
    /// Stop without prompting once this many attempts have failed.
    pub max_attempts: Option<u32>,

    /// Stop without prompting on a failure after this many seconds.
    pub deadline_secs: Option<u64>,

    /// Include the failure text in the prompt.
    pub show_details: bool,

    /// Title of the prompt window or console banner.
    pub title: String,

    pub prompt: PromptMode,
}

impl Default for StopConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            deadline_secs: None,
            show_details: true,
            title: "Action required".to_string(),
            prompt: PromptMode::Auto,
        }
    }
}

impl StopConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == Some(0) {
            return Err(anyhow!("max_attempts must be > 0 (omit it for no limit)"));
        }
        if self.deadline_secs == Some(0) {
            return Err(anyhow!("deadline_secs must be > 0 (omit it for no deadline)"));
        }
        if self.title.trim().is_empty() {
            return Err(anyhow!("title must be non-empty"));
        }
        Ok(())
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_attempts: self.max_attempts,
            deadline: self.deadline_secs.map(Duration::from_secs),
        }
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `StopConfig::default()`.
pub fn load_config(path: &Path) -> Result<StopConfig> {
    if !path.exists() {
        let cfg = StopConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: StopConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &StopConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    crate::io::file_gate::write_atomic(path, buf.as_bytes())
        .with_context(|| format!("replace config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, StopConfig::default());
        assert_eq!(cfg.limits(), Limits::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state/config.toml");
        let cfg = StopConfig {
            max_attempts: Some(5),
            deadline_secs: Some(120),
            prompt: PromptMode::Console,
            ..StopConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.limits().deadline, Some(Duration::from_secs(120)));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "title = \"Save report\"\nprompt = \"dialog\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.title, "Save report");
        assert_eq!(cfg.prompt, PromptMode::Dialog);
        assert!(cfg.show_details);
        assert_eq!(cfg.max_attempts, None);
    }

    #[test]
    fn zero_limits_are_rejected() {
        let cfg = StopConfig {
            max_attempts: Some(0),
            ..StopConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = StopConfig {
            deadline_secs: Some(0),
            ..StopConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = StopConfig {
            title: "  ".to_string(),
            ..StopConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn prompt_mode_parses_case_insensitively() {
        assert_eq!("Console".parse::<PromptMode>().expect("parse"), PromptMode::Console);
        assert!("tk".parse::<PromptMode>().is_err());
    }
}
