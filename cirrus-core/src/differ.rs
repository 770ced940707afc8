//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the "desired state" declared in configuration with the "current
//! state" fetched from the Provider, and generates a list of required
//! Effects (Plan). Attribute flags from the schema decide whether a change is
//! applied in place or forces a replacement.

use std::collections::HashMap;

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with updatable differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// An immutable attribute changed -> delete and create again
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
    /// Data source -> always evaluated
    Read(Resource),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_) | Diff::Read(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State, schema: Option<&ResourceSchema>) -> Diff {
    if desired.is_data_source() {
        return Diff::Read(desired.clone());
    }
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes, schema);

    if changed.is_empty() {
        return Diff::NoChange(desired.id.clone());
    }

    let forces_new: Vec<String> = changed
        .iter()
        .filter(|name| schema.is_some_and(|s| s.is_force_new(name)))
        .cloned()
        .collect();

    if forces_new.is_empty() {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    } else {
        Diff::Replace {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: forces_new,
        }
    }
}

/// Zero values are indistinguishable from an unset attribute
fn is_zero_value(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Int(i) => *i == 0,
        Value::Bool(b) => !b,
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
    }
}

/// Find changed attributes between desired and current state
///
/// Computed-only attributes never count. An optional, non-computed
/// attribute present remotely but dropped from the configuration counts
/// as changed (e.g., removing all tags).
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
    schema: Option<&ResourceSchema>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        let attr = schema.and_then(|s| s.attributes.get(key));
        if attr.is_some_and(|a| a.is_computed_only()) {
            continue;
        }

        match current.get(key) {
            Some(current_value) if current_value == desired_value => {}
            None if is_zero_value(desired_value) => {}
            _ => changed.push(key.clone()),
        }
    }

    if let Some(schema) = schema {
        for (key, current_value) in current {
            if desired.contains_key(key) || is_zero_value(current_value) {
                continue;
            }
            if let Some(attr) = schema.attributes.get(key)
                && attr.optional
                && !attr.computed
            {
                changed.push(key.clone());
            }
        }
    }

    changed.sort();
    changed
}

/// Compute Diff for multiple resources and generate a Plan
///
/// Schema defaults are applied to the desired attributes before comparing.
pub fn create_plan(
    desired: &[Resource],
    current_states: &HashMap<ResourceId, State>,
    schemas: &HashMap<String, ResourceSchema>,
) -> Plan {
    let mut plan = Plan::new();

    for resource in desired {
        let schema = schemas.get(&resource.id.resource_type);
        let mut resource = resource.clone();
        if let Some(schema) = schema {
            schema.apply_defaults(&mut resource.attributes);
        }

        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        match diff(&resource, &current, schema) {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Read(r) => plan.add(Effect::Read(r)),
            Diff::Update {
                id,
                from,
                to,
                changed_attributes,
            } => {
                let identifier = from.identifier.clone().unwrap_or_default();
                plan.add(Effect::Update {
                    id,
                    identifier,
                    from,
                    to,
                    changed_attributes,
                });
            }
            Diff::Replace {
                id,
                from,
                to,
                changed_attributes,
            } => {
                let identifier = from.identifier.clone().unwrap_or_default();
                plan.add(Effect::Replace {
                    id,
                    identifier,
                    to,
                    changed_attributes,
                });
            }
            Diff::NoChange(_) => {}
        }
    }

    plan
}

/// Plan the deletion of every existing, managed state
pub fn create_destroy_plan<'a>(states: impl IntoIterator<Item = &'a State>) -> Plan {
    let mut plan = Plan::new();
    for state in states {
        if let (true, Some(identifier)) = (state.exists, &state.identifier) {
            plan.add(Effect::Delete {
                id: state.id.clone(),
                identifier: identifier.clone(),
            });
        }
    }
    plan
}
