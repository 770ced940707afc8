//! HuaweiCloud Provider implementation
//!
//! This module wires the per-type handlers to service clients built from a
//! [`ProviderConfig`] and routes lifecycle calls to them by type name.

use cirrus_core::provider::{ProviderError, ProviderResult};
use cirrus_core::resource::{Resource, ResourceId, State};

use crate::client::ServiceClient;
use crate::config::{ProviderConfig, Service};
use crate::data_sources::dms_maintain_window::MaintainWindowDataSource;
use crate::resources::cce_cluster::CceClusterHandler;
use crate::resources::check_region;
use crate::resources::vpc::VpcHandler;
use crate::schemas::{cce_cluster, dms_maintain_window, vpc};

/// HuaweiCloud Provider
pub struct HuaweiCloudProvider {
    config: ProviderConfig,
    vpc: VpcHandler,
    cce_cluster: CceClusterHandler,
    maintain_window: MaintainWindowDataSource,
}

impl HuaweiCloudProvider {
    /// Create a provider; every handler shares one HTTP connection pool
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("cirrus/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::wrap("Error creating HTTP client", e))?;

        let client = |service: Service, path: String| {
            ServiceClient::new(
                http.clone(),
                format!("{}/{}", config.service_endpoint(service), path),
                config.auth_token.clone(),
            )
        };
        let project = &config.project_id;

        let vpc = VpcHandler::new(
            client(Service::Vpc, format!("v1/{}", project)),
            client(Service::Vpc, format!("v2.0/{}", project)),
            &config.region,
            config.poll,
        );
        let cce_cluster = CceClusterHandler::new(
            client(Service::Cce, format!("api/v3/projects/{}", project)),
            &config.region,
            config.poll,
        );
        let maintain_window =
            MaintainWindowDataSource::new(client(Service::Dms, format!("v1.0/{}", project)));

        Ok(Self {
            vpc,
            cce_cluster,
            maintain_window,
            config,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    // =========================================================================
    // Dispatch by resource type
    // =========================================================================

    pub async fn read_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        match id.resource_type.as_str() {
            vpc::TYPE_NAME => self.vpc.read(id, identifier).await,
            cce_cluster::TYPE_NAME => self.cce_cluster.read(id, identifier).await,
            _ => Err(unknown_type(id)),
        }
    }

    pub async fn lookup_data_source(&self, resource: &Resource) -> ProviderResult<State> {
        match resource.id.resource_type.as_str() {
            dms_maintain_window::TYPE_NAME => self.maintain_window.read(resource).await,
            _ => Err(unknown_type(&resource.id)),
        }
    }

    /// Only resources in the provider's region can be created
    pub fn validate_resource(&self, resource: &Resource) -> ProviderResult<()> {
        match resource.id.resource_type.as_str() {
            vpc::TYPE_NAME | cce_cluster::TYPE_NAME => check_region(resource, self.region()),
            _ => Err(unknown_type(&resource.id)),
        }
    }

    pub async fn create_resource(&self, resource: &Resource) -> ProviderResult<State> {
        match resource.id.resource_type.as_str() {
            vpc::TYPE_NAME => self.vpc.create(resource).await,
            cce_cluster::TYPE_NAME => self.cce_cluster.create(resource).await,
            _ => Err(unknown_type(&resource.id)),
        }
    }

    pub async fn update_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
        changed: &[String],
    ) -> ProviderResult<State> {
        match id.resource_type.as_str() {
            vpc::TYPE_NAME => self.vpc.update(id, identifier, from, to, changed).await,
            cce_cluster::TYPE_NAME => self.cce_cluster.update(id, identifier, to, changed).await,
            _ => Err(unknown_type(id)),
        }
    }

    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        match id.resource_type.as_str() {
            vpc::TYPE_NAME => self.vpc.delete(id, identifier).await,
            cce_cluster::TYPE_NAME => self.cce_cluster.delete(id, identifier).await,
            _ => Err(unknown_type(id)),
        }
    }
}

fn unknown_type(id: &ResourceId) -> ProviderError {
    ProviderError::new(format!("Unknown resource type: {}", id.resource_type)).for_resource(id.clone())
}
