//! Cloud Container Engine v3 cluster API

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::client::{ApiResult, ServiceClient};

pub const KIND_CLUSTER: &str = "Cluster";
pub const API_VERSION: &str = "v3";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    #[serde(default)]
    pub kind: String,
    #[serde(rename = "apiVersion", alias = "apiversion", default)]
    pub api_version: String,
    pub metadata: Metadata,
    pub spec: Spec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub labels: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub annotations: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    #[serde(rename = "type")]
    pub cluster_type: String,
    pub flavor: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub host_network: HostNetwork,
    pub container_network: ContainerNetwork,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Authentication>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub billing_mode: i64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extend_param: HashMap<String, String>,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostNetwork {
    pub vpc: String,
    pub subnet: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub highway_subnet: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerNetwork {
    pub mode: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cidr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authentication {
    pub mode: String,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub authenticating_proxy: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub phase: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateOpts {
    pub spec: UpdateSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Kubeconfig-style access material for a cluster
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Certificate {
    #[serde(default)]
    pub clusters: Vec<CertCluster>,
    #[serde(default)]
    pub users: Vec<CertUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CertCluster {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cluster: CertClusterData,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CertClusterData {
    #[serde(default)]
    pub server: String,
    #[serde(rename = "certificate-authority-data", default)]
    pub certificate_authority_data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CertUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user: CertUserData,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CertUserData {
    #[serde(rename = "client-certificate-data", default)]
    pub client_certificate_data: String,
    #[serde(rename = "client-key-data", default)]
    pub client_key_data: String,
}

impl Cluster {
    /// Lifecycle phase reported by the service, empty when absent
    pub fn phase(&self) -> &str {
        self.status.as_ref().map(|s| s.phase.as_str()).unwrap_or_default()
    }
}

pub async fn create(client: &ServiceClient, cluster: &Cluster) -> ApiResult<Cluster> {
    client.post(&["clusters"], cluster).await
}

pub async fn get(client: &ServiceClient, id: &str) -> ApiResult<Cluster> {
    client.get(&["clusters", id]).await
}

pub async fn get_cert(client: &ServiceClient, id: &str) -> ApiResult<Certificate> {
    client.get(&["clusters", id, "clustercert"]).await
}

pub async fn update(client: &ServiceClient, id: &str, opts: &UpdateOpts) -> ApiResult<Cluster> {
    client.put(&["clusters", id], opts).await
}

pub async fn delete(client: &ServiceClient, id: &str) -> ApiResult<()> {
    client.delete(&["clusters", id]).await
}
