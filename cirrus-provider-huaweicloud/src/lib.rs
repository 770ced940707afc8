//! Cirrus HuaweiCloud Provider
//!
//! Resource handlers for HuaweiCloud's REST control plane.
//!
//! ## Module Structure
//!
//! - `config` - Region, project, credentials and poll settings
//! - `client` - REST client and `ApiError`
//! - `api` - Typed request/response bodies per remote API
//! - `schemas` - Attribute schemas per type
//! - `resources` - `vpc` and `cce_cluster` lifecycle handlers
//! - `data_sources` - `dms_maintain_window` lookup
//! - `provider` - HuaweiCloudProvider implementation

pub mod api;
pub mod client;
pub mod config;
pub mod data_sources;
pub mod provider;
pub mod resources;
pub mod schemas;

// Re-export main types
pub use client::{ApiError, ServiceClient};
pub use config::{ConfigError, PollSettings, ProviderConfig};
pub use provider::HuaweiCloudProvider;

use cirrus_core::provider::{BoxFuture, Provider, ProviderResult, ResourceType};
use cirrus_core::resource::{Resource, ResourceId, State};

use resources::resource_types;

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for HuaweiCloudProvider {
    fn name(&self) -> &'static str {
        "huaweicloud"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn read(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.read_resource(&id, &identifier).await })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.lookup_data_source(&resource).await })
    }

    fn validate(&self, resource: &Resource) -> ProviderResult<()> {
        self.validate_resource(resource)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(&resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
        changed: &[String],
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        let changed = changed.to_vec();
        Box::pin(async move {
            self.update_resource(&id, &identifier, &from, &to, &changed)
                .await
        })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}
