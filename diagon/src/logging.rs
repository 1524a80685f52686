//! Diagnostic tracing for the `diagon` binary.
//!
//! Operator prompts never go through tracing; this is developer output only.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const QUIET_DIRECTIVE: &str = "warn";
const VERBOSE_DIRECTIVE: &str = "warn,diagon=info";

/// Filter used when `RUST_LOG` is unset.
///
/// `--verbose` adds the gate's per-attempt and dialog selection events.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_DIRECTIVE
    } else {
        QUIET_DIRECTIVE
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` takes precedence over [`default_directive`].
/// Output: stderr, compact format.
///
/// # Example
/// ```bash
/// RUST_LOG=diagon=debug diagon run -- ./deploy.sh
/// ```
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_enables_crate_info_events() {
        assert_eq!(default_directive(false), "warn");
        assert!(default_directive(true).contains("diagon=info"));
        for verbose in [false, true] {
            assert!(
                default_directive(verbose).parse::<EnvFilter>().is_ok(),
                "{}",
                default_directive(verbose)
            );
        }
    }
}
