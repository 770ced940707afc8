//! JSON configuration file: the declared resources and their known identities

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use cirrus_core::resource::{Resource, ResourceId, Value};
use cirrus_core::schema::ResourceSchema;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub resources: Vec<ResourceEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceEntry {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// Remote identifier of an already created resource
    #[serde(default)]
    pub id: Option<String>,
    /// Marks a data source lookup
    #[serde(default)]
    pub data: bool,
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl ResourceEntry {
    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(&self.resource_type, &self.name)
    }

    /// Convert to a resource; a `null` attribute is left unset
    pub fn to_resource(&self) -> Result<Resource, String> {
        let mut resource = Resource::new(&self.resource_type, &self.name).with_read_only(self.data);
        for (key, value) in &self.attributes {
            let value = Value::from_json(value)
                .map_err(|e| format!("{}: attribute '{}': {}", self.resource_id(), key, e))?;
            if let Some(value) = value {
                resource.attributes.insert(key.clone(), value);
            }
        }
        Ok(resource)
    }
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn resources(&self) -> Result<Vec<Resource>> {
        self.resources
            .iter()
            .map(|entry| entry.to_resource().map_err(anyhow::Error::msg))
            .collect()
    }

    /// Check every entry against its schema, collecting all problems
    pub fn validate(&self, schemas: &HashMap<String, ResourceSchema>) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for entry in &self.resources {
            let id = entry.resource_id();
            if !seen.insert(id.clone()) {
                errors.push(format!("{}: declared more than once", id));
            }

            let Some(schema) = schemas.get(&entry.resource_type) else {
                errors.push(format!("{}: unknown resource type '{}'", id, entry.resource_type));
                continue;
            };
            if schema.data_source != entry.data {
                let kind = if schema.data_source { "a data source" } else { "a resource" };
                errors.push(format!(
                    "{}: '{}' is {}, set \"data\": {}",
                    id, entry.resource_type, kind, schema.data_source
                ));
            }
            if entry.data && entry.id.is_some() {
                errors.push(format!("{}: data sources have no id", id));
            }
            match entry.to_resource() {
                Ok(resource) => {
                    if let Err(type_errors) = schema.validate(&resource.attributes) {
                        errors.extend(type_errors.into_iter().map(|e| format!("{}: {}", id, e)));
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}
