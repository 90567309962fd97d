//! Tool call metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! host process installs a recorder.

use metrics::{counter, histogram};

const TOOL_CALLS_TOTAL: &str = "canvas_lms_mcp_tool_calls_total";
const TOOL_CALL_DURATION: &str = "canvas_lms_mcp_tool_call_duration_seconds";

/// Outcome label for a successful call.
pub const OUTCOME_OK: &str = "ok";

/// Record one tool call.
///
/// # Arguments
///
/// * `tool` - Tool name as requested (unknown names are recorded as `unknown`)
/// * `outcome` - [`OUTCOME_OK`] or the error kind
/// * `duration_secs` - Wall time of the call
pub fn record_tool_call(tool: &str, outcome: &str, duration_secs: f64) {
    counter!(
        TOOL_CALLS_TOTAL,
        "tool" => tool.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!(TOOL_CALL_DURATION, "tool" => tool.to_string()).record(duration_secs);
}
