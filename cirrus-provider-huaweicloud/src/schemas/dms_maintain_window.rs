//! dms_maintain_window data source schema

use cirrus_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

pub const TYPE_NAME: &str = "dms_maintain_window";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(TYPE_NAME)
        .with_description("Maintenance time window of DMS instances")
        .as_data_source()
        .attribute(
            AttributeSchema::new("seq", AttributeType::Int)
                .optional()
                .computed(),
        )
        .attribute(
            AttributeSchema::new("begin", AttributeType::String)
                .optional()
                .computed(),
        )
        .attribute(
            AttributeSchema::new("end", AttributeType::String)
                .optional()
                .computed(),
        )
        .attribute(
            AttributeSchema::new("default", AttributeType::Bool)
                .optional()
                .computed(),
        )
}
