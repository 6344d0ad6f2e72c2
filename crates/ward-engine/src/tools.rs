//! Tool classification.
//!
//! Three disjoint compile-time sets. Anything in none of them is
//! *unclassified*: allowed without gating but still logged by the post-hook.

/// Read-only and meta tools. Bypass all gating.
pub const EXEMPT_TOOLS: &[&str] = &[
    "read_file",
    "list_files",
    "search_files",
    "codebase_search",
    "list_code_definition_names",
    "ask_followup_question",
    "attempt_completion",
    "switch_mode",
    "select_active_intent",
    "verify_acceptance_criteria",
    "update_todo_list",
    "access_mcp_resource",
    "list_mcp_tools",
];

/// File-mutating tools. Require intent, scope, and the optimistic lock.
pub const WRITE_TOOLS: &[&str] = &[
    "write_to_file",
    "apply_diff",
    "edit",
    "search_and_replace",
    "search_replace",
    "edit_file",
    "apply_patch",
    "insert_code_block",
];

/// Arbitrary shell execution and file deletion. Require an `IN_PROGRESS`
/// intent and human approval; the path may be null, so scope does not apply
/// uniformly.
pub const DESTRUCTIVE_TOOLS: &[&str] = &["execute_command", "delete_file"];

/// Which gating pipeline a tool goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolClass {
    /// Bypasses gating entirely.
    Exempt,
    /// Full write pipeline: intent, scope, optimistic lock.
    Write,
    /// Intent plus human approval.
    Destructive,
    /// No gating; logged by the post-hook.
    Unclassified,
}

/// Classify a tool by name.
#[must_use]
pub fn classify_tool(tool_name: &str) -> ToolClass {
    if EXEMPT_TOOLS.contains(&tool_name) {
        ToolClass::Exempt
    } else if WRITE_TOOLS.contains(&tool_name) {
        ToolClass::Write
    } else if DESTRUCTIVE_TOOLS.contains(&tool_name) {
        ToolClass::Destructive
    } else {
        ToolClass::Unclassified
    }
}
