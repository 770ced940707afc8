//! Resource type definitions and lifecycle handlers
//!
//! This module defines:
//! - Resource type definitions (implementing ResourceType trait)
//! - Handlers translating records into API calls, one per resource type
//! - Helpers for pulling typed values out of configuration records

pub mod cce_cluster;
pub mod vpc;

use std::collections::HashMap;

use cirrus_core::provider::{ProviderError, ProviderResult, ResourceType};
use cirrus_core::resource::{Resource, State, Value};
use cirrus_core::schema::ResourceSchema;

use crate::schemas;

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $schema:ident) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                schemas::$schema::TYPE_NAME
            }
            fn schema(&self) -> ResourceSchema {
                schemas::$schema::schema()
            }
        }
    };
}

define_resource_type!(VpcType, vpc);
define_resource_type!(CceClusterType, cce_cluster);
define_resource_type!(DmsMaintainWindowType, dms_maintain_window);

/// Returns all resource types (and data sources) supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(VpcType),
        Box::new(CceClusterType),
        Box::new(DmsMaintainWindowType),
    ]
}

// =============================================================================
// Attribute Helpers
// =============================================================================

pub(crate) fn required_str(resource: &Resource, key: &str) -> ProviderResult<String> {
    resource
        .get_str(key)
        .map(str::to_string)
        .ok_or_else(|| {
            ProviderError::new(format!("Missing required attribute '{}'", key))
                .for_resource(resource.id.clone())
        })
}

pub(crate) fn optional_str(resource: &Resource, key: &str) -> String {
    resource.get_str(key).unwrap_or_default().to_string()
}

/// String values of a map attribute; non-string entries are skipped
pub(crate) fn string_map(attributes: &HashMap<String, Value>, key: &str) -> HashMap<String, String> {
    attributes
        .get(key)
        .and_then(Value::as_map)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

pub(crate) fn state_string_map(state: &State, key: &str) -> HashMap<String, String> {
    string_map(&state.attributes, key)
}

/// Resources are managed in the provider's region only
pub(crate) fn check_region(resource: &Resource, region: &str) -> ProviderResult<()> {
    match resource.get_str("region") {
        Some(wanted) if wanted != region => Err(ProviderError::new(format!(
            "region '{}' differs from the provider region '{}'",
            wanted, region
        ))
        .for_resource(resource.id.clone())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_types_match_schemas() {
        for t in resource_types() {
            assert_eq!(t.name(), t.schema().resource_type);
        }
    }

    #[test]
    fn string_map_skips_non_strings() {
        let resource = Resource::new("vpc", "main").with_attribute(
            "tags",
            Value::Map(
                [
                    ("env".to_string(), Value::String("dev".to_string())),
                    ("count".to_string(), Value::Int(1)),
                ]
                .into(),
            ),
        );
        let tags = string_map(&resource.attributes, "tags");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["env"], "dev");
    }

    #[test]
    fn region_must_match_provider() {
        let resource = Resource::new("vpc", "main")
            .with_attribute("region", Value::String("eu-west-0".to_string()));
        assert!(check_region(&resource, "eu-west-0").is_ok());

        let err = check_region(&resource, "cn-north-4").unwrap_err();
        assert_eq!(
            err.to_string(),
            "[vpc.main] region 'eu-west-0' differs from the provider region 'cn-north-4'"
        );
    }

    #[test]
    fn missing_required_attribute() {
        let resource = Resource::new("vpc", "main");
        let err = required_str(&resource, "cidr").unwrap_err();
        assert_eq!(err.to_string(), "[vpc.main] Missing required attribute 'cidr'");
    }
}
