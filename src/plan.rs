//! Schema-driven planning.
//!
//! Every resource plans the same way, so the diff lives here instead of in
//! each handler: the schema says which attributes are computed, which force
//! replacement and which are sets.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::schema::{Attribute, AttributeType, Block, Schema};
use crate::types::{AttributeChange, PlanResult};

const SENSITIVE_PLACEHOLDER: &str = "(sensitive value)";

/// Compute the plan for moving from `prior` to `proposed`.
///
/// - No prior state plans a create.
/// - A null `proposed` plans a destroy: every prior attribute is removed.
/// - Computed attributes left null in `proposed` keep their prior value,
///   unless the plan replaces the resource.
/// - A changed force-new attribute marks the plan as replacing.
pub fn plan(schema: &Schema, prior: Option<&Value>, proposed: &Value) -> PlanResult {
    let prior = prior.filter(|p| !p.is_null());

    if proposed.is_null() {
        return plan_destroy(schema, prior);
    }

    let mut planned = match proposed {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };

    let attributes = sorted_attributes(schema);

    let requires_replace = prior.is_some_and(|prior| {
        attributes.iter().any(|(name, attr)| {
            attr.force_new
                && !same_value(&attr.attr_type, prior.get(*name), planned.get(*name))
        })
    });

    if let Some(prior) = prior {
        if !requires_replace {
            for (name, attr) in &attributes {
                let unset = planned.get(*name).map_or(true, Value::is_null);
                if attr.flags.computed && unset {
                    if let Some(value) = prior.get(*name).filter(|v| !v.is_null()) {
                        planned.insert(name.to_string(), value.clone());
                    }
                }
            }
        }
    }

    let mut changes = Vec::new();
    for (name, attr) in &attributes {
        let before = prior.and_then(|p| p.get(*name));
        let after = planned.get(*name);
        if same_value(&attr.attr_type, before, after) {
            continue;
        }
        changes.push(change(name, before, after, attr.flags.sensitive));
    }

    let block_names: BTreeSet<&String> = schema.block.blocks.keys().collect();
    for name in block_names {
        let before = prior.and_then(|p| p.get(name.as_str()));
        let after = planned.get(name.as_str());
        if present(before) != present(after) {
            let block = &schema.block.blocks[name].block;
            let before = present(before).map(|v| redact_block(block, v));
            let after = present(after).map(|v| redact_block(block, v));
            changes.push(change(name, before.as_ref(), after.as_ref(), false));
        }
    }

    let planned = Value::Object(planned);
    if changes.is_empty() {
        PlanResult::no_change(planned)
    } else {
        PlanResult::with_changes(planned, changes, requires_replace)
    }
}

fn plan_destroy(schema: &Schema, prior: Option<&Value>) -> PlanResult {
    let Some(prior) = prior else {
        return PlanResult::no_change(Value::Null);
    };

    let changes = sorted_attributes(schema)
        .into_iter()
        .filter_map(|(name, attr)| {
            present(prior.get(name))
                .map(|value| AttributeChange::removed(name, redact(value, attr.flags.sensitive)))
        })
        .collect::<Vec<_>>();

    PlanResult::with_changes(Value::Null, changes, false)
}

fn sorted_attributes(schema: &Schema) -> Vec<(&str, &Attribute)> {
    let mut attributes: Vec<_> = schema
        .block
        .attributes
        .iter()
        .map(|(name, attr)| (name.as_str(), attr))
        .collect();
    attributes.sort_by_key(|(name, _)| *name);
    attributes
}

/// Null, missing and empty collections are all "unset".
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        _ => true,
    })
}

fn same_value(attr_type: &AttributeType, before: Option<&Value>, after: Option<&Value>) -> bool {
    match (present(before), present(after)) {
        (None, None) => true,
        (Some(Value::Array(a)), Some(Value::Array(b))) if matches!(attr_type, AttributeType::Set(_)) => {
            let a: BTreeSet<String> = a.iter().map(Value::to_string).collect();
            let b: BTreeSet<String> = b.iter().map(Value::to_string).collect();
            a == b
        },
        (a, b) => a == b,
    }
}

fn change(name: &str, before: Option<&Value>, after: Option<&Value>, sensitive: bool) -> AttributeChange {
    match (present(before), present(after)) {
        (None, Some(after)) => AttributeChange::added(name, redact(after, sensitive)),
        (Some(before), None) => AttributeChange::removed(name, redact(before, sensitive)),
        (before, after) => AttributeChange::new(
            name,
            before.map(|v| redact(v, sensitive)),
            after.map(|v| redact(v, sensitive)),
        ),
    }
}

fn redact(value: &Value, sensitive: bool) -> Value {
    if sensitive {
        Value::String(SENSITIVE_PLACEHOLDER.to_string())
    } else {
        value.clone()
    }
}

/// Mask the sensitive attributes of every element of a block value.
fn redact_block(block: &Block, value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|item| redact_block(block, item)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, v)| {
                    let sensitive = !v.is_null()
                        && block
                            .attributes
                            .get(key)
                            .is_some_and(|attr| attr.flags.sensitive);
                    (key.clone(), redact(v, sensitive))
                })
                .collect(),
        ),
        other => other.clone(),
    }
}
