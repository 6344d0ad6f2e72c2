//! Lenient intent validation.
//!
//! The catalog is human-edited, so the validator forgives what it can.
//! Hard problems (missing id, unknown status, empty scope) drop the intent;
//! soft problems (bad version, malformed related_specs entry) keep it with
//! the offending field defaulted. Unknown fields are ignored entirely.
//! Everything is logged; nothing is thrown.

use std::collections::HashSet;

use serde_yaml::Value;
use tracing::warn;

use ward_core::intent::{is_valid_intent_id, Intent, IntentStatus, RelatedSpec, RelatedSpecType};

/// Validate a parsed YAML sequence into intents.
///
/// Intents with hard errors are dropped; duplicates of an already-seen id
/// are dropped. All findings are logged as warnings.
#[must_use]
pub fn validate_intents(items: &[Value]) -> Vec<Intent> {
    let mut seen = HashSet::new();
    let mut intents = Vec::new();

    for (index, item) in items.iter().enumerate() {
        match validate_one(item) {
            Ok((intent, warnings)) => {
                for message in warnings {
                    warn!(intent_id = %intent.id, %message, "intent field ignored");
                }
                if !seen.insert(intent.id.clone()) {
                    warn!(intent_id = %intent.id, "duplicate intent id, dropping later entry");
                    continue;
                }
                intents.push(intent);
            }
            Err(errors) => {
                for message in &errors {
                    warn!(index, %message, "invalid intent dropped");
                }
            }
        }
    }

    intents
}

/// Validate a single intent mapping.
///
/// Returns the intent plus soft warnings, or the list of hard errors that
/// disqualify it.
pub fn validate_one(item: &Value) -> Result<(Intent, Vec<String>), Vec<String>> {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let id = match item.get("id").and_then(Value::as_str) {
        Some(id) if is_valid_intent_id(id) => id.to_string(),
        Some(id) => {
            errors.push(format!("id '{id}' does not match ^[A-Z]+-\\d{{3,}}$"));
            String::new()
        }
        None => {
            errors.push("missing id".to_string());
            String::new()
        }
    };

    let name = match item.get("name").and_then(Value::as_str) {
        Some(name) if (3..=200).contains(&name.chars().count()) => name.to_string(),
        Some(name) => {
            errors.push(format!("name length {} outside 3-200", name.chars().count()));
            String::new()
        }
        None => {
            errors.push("missing name".to_string());
            String::new()
        }
    };

    let status = match item.get("status").and_then(Value::as_str) {
        Some(s) => match s.parse::<IntentStatus>() {
            Ok(status) => status,
            Err(()) => {
                errors.push(format!("unknown status '{s}'"));
                IntentStatus::Pending
            }
        },
        None => {
            errors.push("missing status".to_string());
            IntentStatus::Pending
        }
    };

    let owned_scope = string_seq(item.get("owned_scope"));
    if owned_scope.is_empty() {
        errors.push("owned_scope is missing or empty".to_string());
    }

    let constraints = match item.get("constraints") {
        None => Vec::new(),
        Some(v) if v.is_sequence() => string_seq(Some(v)),
        Some(_) => {
            errors.push("constraints is not a sequence".to_string());
            Vec::new()
        }
    };

    let acceptance_criteria = match item.get("acceptance_criteria") {
        None => Vec::new(),
        Some(v) if v.is_sequence() => string_seq(Some(v)),
        Some(_) => {
            errors.push("acceptance_criteria is not a sequence".to_string());
            Vec::new()
        }
    };

    let created_at = match item.get("created_at").and_then(Value::as_str) {
        Some(ts) => ts.to_string(),
        None => {
            errors.push("missing created_at".to_string());
            String::new()
        }
    };
    let updated_at = match item.get("updated_at").and_then(Value::as_str) {
        Some(ts) => ts.to_string(),
        None => {
            errors.push("missing updated_at".to_string());
            String::new()
        }
    };

    let version = match item.get("version") {
        None => 1,
        Some(v) => match v.as_u64() {
            Some(n) if n >= 1 => u32::try_from(n).unwrap_or(u32::MAX),
            _ => {
                warnings.push(format!("version {v:?} is not a positive integer, using 1"));
                1
            }
        },
    };

    let related_specs = match item.get("related_specs") {
        None => Vec::new(),
        Some(v) => match v.as_sequence() {
            Some(seq) => {
                let mut specs = Vec::new();
                for entry in seq {
                    match related_spec(entry) {
                        Some(spec) => specs.push(spec),
                        None => warnings.push(format!("malformed related_specs entry {entry:?}")),
                    }
                }
                specs
            }
            None => {
                warnings.push("related_specs is not a sequence".to_string());
                Vec::new()
            }
        },
    };

    let parent_intent = match item.get("parent_intent") {
        None => None,
        Some(v) => match v.as_str() {
            Some(p) if is_valid_intent_id(p) => Some(p.to_string()),
            _ => {
                warnings.push(format!("malformed parent_intent {v:?}"));
                None
            }
        },
    };

    let tags = match item.get("tags") {
        None => Vec::new(),
        Some(v) if v.is_sequence() => string_seq(Some(v)),
        Some(v) => {
            warnings.push(format!("tags is not a sequence: {v:?}"));
            Vec::new()
        }
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok((
        Intent {
            id,
            name,
            status,
            version,
            owned_scope,
            constraints,
            acceptance_criteria,
            related_specs,
            parent_intent,
            tags,
            created_at,
            updated_at,
        },
        warnings,
    ))
}

fn string_seq(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_sequence)
        .map(|seq| {
            seq.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn related_spec(entry: &Value) -> Option<RelatedSpec> {
    let spec_type = RelatedSpecType::parse(entry.get("type")?.as_str()?)?;
    let reference = entry.get("ref")?.as_str()?.to_string();
    Some(RelatedSpec {
        spec_type,
        reference,
    })
}
