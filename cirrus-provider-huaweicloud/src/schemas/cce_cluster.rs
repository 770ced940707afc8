//! cce_cluster schema

use std::time::Duration;

use cirrus_core::resource::Value;
use cirrus_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

pub const TYPE_NAME: &str = "cce_cluster";

pub const DEFAULT_AUTHENTICATION_MODE: &str = "x509";

fn immutable_string(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::String)
        .required()
        .force_new()
}

fn immutable_map(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, types::string_map())
        .optional()
        .force_new()
}

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description("Cloud Container Engine cluster")
        .with_create_timeout(Duration::from_secs(30 * 60))
        .with_delete_timeout(Duration::from_secs(30 * 60))
        .attribute(
            AttributeSchema::new("region", AttributeType::String)
                .optional()
                .computed()
                .force_new(),
        )
        .attribute(immutable_string("name").with_provider_name("metadata.name"))
        .attribute(immutable_string("flavor_id").with_provider_name("spec.flavor"))
        .attribute(immutable_string("cluster_type").with_provider_name("spec.type"))
        .attribute(immutable_string("vpc_id").with_provider_name("spec.hostNetwork.vpc"))
        .attribute(immutable_string("subnet_id").with_provider_name("spec.hostNetwork.subnet"))
        .attribute(
            immutable_string("container_network_type")
                .with_provider_name("spec.containerNetwork.mode"),
        )
        .attribute(immutable_map("labels"))
        .attribute(immutable_map("annotations"))
        .attribute(
            immutable_map("extend_param")
                .with_description("Extra creation parameters passed through as spec.extendParam"),
        )
        .attribute(
            AttributeSchema::new("cluster_version", AttributeType::String)
                .optional()
                .computed()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("highway_subnet_id", AttributeType::String)
                .optional()
                .computed()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("container_network_cidr", AttributeType::String)
                .optional()
                .computed()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .optional()
                .computed(),
        )
        .attribute(
            AttributeSchema::new("billing_mode", AttributeType::Int)
                .optional()
                .computed()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("authentication_mode", AttributeType::String)
                .optional()
                .force_new()
                .with_default(Value::String(DEFAULT_AUTHENTICATION_MODE.to_string())),
        )
        .attribute(
            AttributeSchema::new("authenticating_proxy_ca", AttributeType::String)
                .optional()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("multi_az", AttributeType::Bool)
                .optional()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("eip", types::ip_address())
                .optional()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("kube_proxy_mode", AttributeType::String)
                .optional()
                .force_new(),
        )
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new(
                "certificate_clusters",
                types::block_list(&["name", "server", "certificate_authority_data"]),
            )
            .computed(),
        )
        .attribute(
            AttributeSchema::new(
                "certificate_users",
                types::block_list(&["name", "client_certificate_data", "client_key_data"]),
            )
            .computed(),
        )
}
