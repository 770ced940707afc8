//! Effect - A single side effect against the cloud, described as a value

use std::fmt;

use crate::resource::{Resource, ResourceId, State};

/// One lifecycle call a Plan will make
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Evaluate a data source
    Read(Resource),
    /// Create a resource that does not exist yet
    Create(Resource),
    /// Update changed attributes in place
    Update {
        id: ResourceId,
        identifier: String,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Delete and re-create because an immutable attribute changed
    Replace {
        id: ResourceId,
        identifier: String,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Delete an existing resource
    Delete { id: ResourceId, identifier: String },
}

impl Effect {
    /// Whether this Effect modifies remote state
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(r) | Effect::Create(r) => &r.id,
            Effect::Update { id, .. } | Effect::Replace { id, .. } | Effect::Delete { id, .. } => {
                id
            }
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Read(r) => write!(f, "<= {} (read)", r.id),
            Effect::Create(r) => write!(f, "+ {}", r.id),
            Effect::Update {
                id,
                changed_attributes,
                ..
            } => write!(f, "~ {} ({})", id, changed_attributes.join(", ")),
            Effect::Replace {
                id,
                changed_attributes,
                ..
            } => write!(
                f,
                "-/+ {} (forces replacement: {})",
                id,
                changed_attributes.join(", ")
            ),
            Effect::Delete { id, identifier } => write!(f, "- {} [{}]", id, identifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_effects() {
        let create = Effect::Create(Resource::new("vpc", "main"));
        assert_eq!(create.to_string(), "+ vpc.main");

        let delete = Effect::Delete {
            id: ResourceId::new("vpc", "main"),
            identifier: "vpc-123".to_string(),
        };
        assert_eq!(delete.to_string(), "- vpc.main [vpc-123]");

        let replace = Effect::Replace {
            id: ResourceId::new("cce_cluster", "k8s"),
            identifier: "c-1".to_string(),
            to: Resource::new("cce_cluster", "k8s"),
            changed_attributes: vec!["flavor_id".to_string()],
        };
        assert_eq!(
            replace.to_string(),
            "-/+ cce_cluster.k8s (forces replacement: flavor_id)"
        );
    }

    #[test]
    fn reads_are_not_mutating() {
        let read = Effect::Read(Resource::new("dms_maintain_window", "w").with_read_only(true));
        assert!(!read.is_mutating());
        assert!(Effect::Create(Resource::new("vpc", "main")).is_mutating());
    }
}
