//! Gated file writes: operator-chosen destination, atomic replace.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument};

use crate::gate::{GateError, StopGate};
use crate::io::prompter::{OperatorInput, Prompter};

const WRITE_TITLE: &str = "Write File";

/// Atomically replace `path` with `data` (temp file in the same directory + rename).
///
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    tmp.write_all(data)
        .with_context(|| format!("write temp file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync temp file for {}", path.display()))?;
    tmp.persist(path)
        .map_err(|err| err.error)
        .with_context(|| format!("replace {}", path.display()))?;
    debug!(path = %path.display(), bytes = data.len(), "wrote file atomically");
    Ok(())
}

/// Expand a leading `~` to the current user's home directory.
///
/// Only `~` and `~/...` are expanded. `~user/...` is left as a literal path.
pub fn expand_home(raw: &str) -> PathBuf {
    let rest = if raw == "~" {
        Some("")
    } else {
        raw.strip_prefix("~/")
    };
    match (rest, home::home_dir()) {
        (Some(rest), Some(home)) if rest.is_empty() => home,
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(raw),
    }
}

/// Ask the operator where to write `content`, then write it atomically.
///
/// Returns the written path, or `None` if the operator cancelled. Both outcomes
/// are confirmed with a short notice.
#[instrument(skip_all, fields(suggested = %suggested.display()))]
pub fn gate_write<O: OperatorInput + ?Sized>(
    suggested: &Path,
    content: &[u8],
    operator: &mut O,
) -> Result<Option<PathBuf>> {
    let suggested_text = suggested.display().to_string();
    let answer = operator.input(
        WRITE_TITLE,
        &format!("Write file to:\n{suggested_text}"),
        &suggested_text,
    )?;
    let Some(answer) = answer else {
        info!("write cancelled by operator");
        operator.notify(None, "Write cancelled")?;
        return Ok(None);
    };

    let answer = answer.trim();
    let dest = if answer.is_empty() {
        suggested.to_path_buf()
    } else {
        expand_home(answer)
    };
    write_atomic(&dest, content)?;
    info!(dest = %dest.display(), "file written");
    operator.notify(None, &format!("Wrote {}", dest.display()))?;
    Ok(Some(dest))
}

/// Write `data` to `path` under the stop gate, asking the operator after each failure.
pub fn write_until_resolved<P: Prompter>(
    gate: &mut StopGate<P>,
    path: &Path,
    data: &[u8],
) -> Result<(), GateError> {
    gate.run(|| write_atomic(path, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Decision;
    use crate::io::config::StopConfig;
    use crate::test_support::ScriptedPrompter;

    #[test]
    fn write_atomic_creates_parents_and_replaces() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested/dir/out.txt");
        write_atomic(&path, b"first").expect("write 1");
        write_atomic(&path, b"second").expect("write 2");
        assert_eq!(fs::read(&path).expect("read"), b"second");

        let leftovers: Vec<_> = fs::read_dir(path.parent().expect("parent"))
            .expect("read dir")
            .collect();
        assert_eq!(leftovers.len(), 1, "temp file should be renamed away");
    }

    #[test]
    fn gate_write_uses_suggested_path_on_blank_answer() {
        let temp = tempfile::tempdir().expect("tempdir");
        let suggested = temp.path().join("report.csv");
        let mut operator = ScriptedPrompter::new(Vec::new()).with_inputs(vec![Some(String::new())]);

        let written = gate_write(&suggested, b"a,b\n", &mut operator).expect("gate write");
        assert_eq!(written.as_deref(), Some(suggested.as_path()));
        assert_eq!(fs::read(&suggested).expect("read"), b"a,b\n");
        assert_eq!(operator.inputs_asked.len(), 1);
        assert!(operator.inputs_asked[0].contains("Write file to:"));
        assert_eq!(
            operator.notices,
            vec![format!("Wrote {}", suggested.display())]
        );
    }

    #[test]
    fn gate_write_honours_operator_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let chosen = temp.path().join("elsewhere/report.csv");
        let mut operator = ScriptedPrompter::new(Vec::new())
            .with_inputs(vec![Some(chosen.display().to_string())]);

        let written = gate_write(&temp.path().join("report.csv"), b"x", &mut operator)
            .expect("gate write");
        assert_eq!(written, Some(chosen.clone()));
        assert!(chosen.exists());
        assert!(!temp.path().join("report.csv").exists());
    }

    #[test]
    fn gate_write_cancel_writes_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let suggested = temp.path().join("report.csv");
        let mut operator = ScriptedPrompter::new(Vec::new()).with_inputs(vec![None]);

        let written = gate_write(&suggested, b"x", &mut operator).expect("gate write");
        assert_eq!(written, None);
        assert!(!suggested.exists());
        assert_eq!(operator.notices, vec!["Write cancelled".to_string()]);
    }

    #[test]
    fn expand_home_only_touches_leading_tilde() {
        assert_eq!(expand_home("/tmp/~x"), PathBuf::from("/tmp/~x"));
        assert_eq!(expand_home("~user/x"), PathBuf::from("~user/x"));
        if let Some(home) = home::home_dir() {
            assert_eq!(expand_home("~/notes.txt"), home.join("notes.txt"));
            assert_eq!(expand_home("~"), home);
        }
    }

    #[test]
    fn write_until_resolved_writes_on_first_try() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("out.bin");
        let mut prompter = ScriptedPrompter::new(vec![Decision::Abort]);
        let mut gate = StopGate::new(&mut prompter, StopConfig::default());

        write_until_resolved(&mut gate, &path, b"\x00\x01").expect("write");
        drop(gate);
        assert_eq!(fs::read(&path).expect("read"), b"\x00\x01");
        assert!(prompter.asked.is_empty());
    }
}
