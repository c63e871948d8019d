//! Tool result formatting
//!
//! The error string shape is matched by front ends to detect degraded
//! results, so it must stay stable.

use std::sync::LazyLock;

use regex::Regex;

static ERROR_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]\s]+) ERROR\]").expect("valid error marker regex"));

/// Format a failed tool call for the model
///
/// `[<TOOL_NAME_UPPERCASE> ERROR] <error text>. The assistant will continue with available information.`
pub fn format_tool_error(tool_name: &str, error: &str) -> String {
    format!(
        "[{} ERROR] {}. The assistant will continue with available information.",
        tool_name.to_uppercase(),
        error
    )
}

/// Tool names (uppercase, as written in the marker) of every error marker
/// found in `text`, in order of first appearance
pub fn detect_error_markers(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for caps in ERROR_MARKER.captures_iter(text) {
        let name = caps[1].to_string();
        if !found.contains(&name) {
            found.push(name);
        }
    }
    found
}
