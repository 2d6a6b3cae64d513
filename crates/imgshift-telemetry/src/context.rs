//! Run-level tracing context.

use tracing::Span;

use crate::init::build_sha;

/// Root span for one command invocation; every event of the run inherits its fields.
#[must_use]
pub fn run_span(command: &str, run_id: &str) -> Span {
    tracing::info_span!(
        "run",
        command = %command,
        run_id = %run_id,
        build_sha = %build_sha()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_span_is_constructible_without_subscriber() {
        let span = run_span("scan", "run-1");
        let _entered = span.enter();
    }
}
