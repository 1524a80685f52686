//! Operator-facing text for failure prompts.

const HEADLINE: &str = "An operation failed.";
const GUIDANCE: &str = "Take whatever action is needed outside the program \
(e.g., close a file, log in, connect VPN), then click Retry.";

/// Compose the prompt body shown after a failed attempt.
///
/// `details` is the rendered failure; it is omitted when `None` or blank.
pub fn failure_message(details: Option<&str>) -> String {
    let mut msg = format!("{HEADLINE}\n\n{GUIDANCE}");
    if let Some(details) = details.map(str::trim).filter(|d| !d.is_empty()) {
        msg.push_str("\n\nDetails: ");
        msg.push_str(details);
    }
    msg
}

/// Render an error with its full cause chain on one line (`outer: inner: root`).
pub fn render_failure(err: &anyhow::Error) -> String {
    format!("{err:#}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn message_includes_details() {
        let msg = failure_message(Some("PermissionDenied: out.bin"));
        assert!(msg.starts_with("An operation failed.\n\n"));
        assert!(msg.contains("then click Retry."));
        assert!(msg.ends_with("\n\nDetails: PermissionDenied: out.bin"));
    }

    #[test]
    fn blank_details_are_omitted() {
        assert!(!failure_message(None).contains("Details"));
        assert!(!failure_message(Some("  \n")).contains("Details"));
    }

    #[test]
    fn render_includes_cause_chain() {
        let err = Err::<(), _>(std::io::Error::other("disk full"))
            .context("write out.bin")
            .unwrap_err();
        assert_eq!(render_failure(&err), "write out.bin: disk full");
    }
}
