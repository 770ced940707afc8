//! Attribute schemas for every HuaweiCloud type the provider handles

pub mod cce_cluster;
pub mod dms_maintain_window;
pub mod vpc;

use cirrus_core::schema::ResourceSchema;

/// All schemas, resources first, then data sources
pub fn all_schemas() -> Vec<ResourceSchema> {
    vec![
        vpc::schema(),
        cce_cluster::schema(),
        dms_maintain_window::schema(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_names_are_unique() {
        let schemas = all_schemas();
        let mut names: Vec<&str> = schemas.iter().map(|s| s.resource_type.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), schemas.len());
    }
}
