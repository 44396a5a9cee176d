//! Metrics hooks.
//!
//! Events go out through `tracing`; the binary layer decides where they land.

use tracing::{trace, trace_span};

pub fn emit_span(event: &str, key_values: &[(&str, String)]) {
    let span = trace_span!("tagql", event);
    let _enter = span.enter();
    for (k, v) in key_values {
        trace!(%event, %k, %v, "metric");
    }
}
