//! vpc schema

use std::time::Duration;

use cirrus_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

pub const TYPE_NAME: &str = "vpc";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description("Virtual Private Cloud")
        .with_create_timeout(Duration::from_secs(10 * 60))
        .with_delete_timeout(Duration::from_secs(3 * 60))
        .attribute(
            AttributeSchema::new("region", AttributeType::String)
                .optional()
                .computed()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("name", types::resource_name())
                .required()
                .with_description("VPC name"),
        )
        .attribute(
            AttributeSchema::new("cidr", types::cidr())
                .required()
                .with_description("Address range of the VPC"),
        )
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("shared", AttributeType::Bool)
                .computed()
                .with_provider_name("enable_shared_snat"),
        )
        .attribute(
            AttributeSchema::new("routes", types::block_list(&["destination", "nexthop"])).computed(),
        )
        .attribute(
            AttributeSchema::new("tags", types::string_map())
                .optional()
                .with_description("Key/value tags, managed through the v2.0 tags API"),
        )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use cirrus_core::resource::Value;

    use super::*;

    #[test]
    fn name_and_cidr_are_updatable() {
        let schema = schema();
        let changed = vec!["name".to_string(), "cidr".to_string(), "region".to_string()];
        assert_eq!(schema.updatable(&changed), vec!["name", "cidr"]);
    }

    #[test]
    fn rejects_bad_cidr() {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("vpc-1".to_string()));
        attrs.insert("cidr".to_string(), Value::String("10.0.0.0/40".to_string()));
        assert!(schema().validate(&attrs).is_err());

        attrs.insert("cidr".to_string(), Value::String("10.0.0.0/16".to_string()));
        assert!(schema().validate(&attrs).is_ok());
    }
}
