//! Heuristic mutation classification.
//!
//! The label is coarse and keyed on the tool name plus whether the file
//! existed beforehand. It feeds audit records, not authorization decisions.

use crate::trace::MutationClass;

/// Tools whose edits are treated as localized refactors.
const REFACTOR_TOOLS: &[&str] = &[
    "apply_diff",
    "edit",
    "search_and_replace",
    "search_replace",
    "edit_file",
    "apply_patch",
];

/// Classify a mutation from the tool name and the pre-invocation hash.
///
/// A missing `pre_hash` means the file did not exist, which dominates every
/// other signal.
#[must_use]
pub fn classify_mutation(tool_name: &str, pre_hash: Option<&str>) -> MutationClass {
    if pre_hash.is_none() {
        return MutationClass::FileCreation;
    }
    if REFACTOR_TOOLS.contains(&tool_name) {
        return MutationClass::AstRefactor;
    }
    match tool_name {
        "write_to_file" => MutationClass::IntentEvolution,
        "execute_command" => MutationClass::Configuration,
        _ => MutationClass::IntentEvolution,
    }
}
