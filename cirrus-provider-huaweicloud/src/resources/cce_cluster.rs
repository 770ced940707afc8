//! cce_cluster lifecycle against the CCE v3 API
//!
//! The cluster JSON nests most settings under `spec`; the flat record maps
//! onto it field by field. `multi_az`, `eip` and `kube_proxy_mode` are
//! folded into `spec.extendParam` on create and unfolded again on read, so a
//! round trip reports what the user configured.

use std::collections::HashMap;

use cirrus_core::provider::{ProviderError, ProviderResult};
use cirrus_core::resource::{Resource, ResourceId, State, Value};
use cirrus_core::waiter::{BoxError, StateChangeConf};

use super::{check_region, optional_str, required_str, string_map};
use crate::api::cce::{
    self, API_VERSION, Authentication, Certificate, Cluster, ContainerNetwork, HostNetwork,
    KIND_CLUSTER, Metadata, Spec, UpdateOpts, UpdateSpec,
};
use crate::client::ServiceClient;
use crate::config::PollSettings;
use crate::schemas;
use crate::schemas::cce_cluster::DEFAULT_AUTHENTICATION_MODE;

const EXTEND_CLUSTER_AZ: &str = "clusterAZ";
const EXTEND_KUBE_PROXY_MODE: &str = "kubeProxyMode";
const EXTEND_EXTERNAL_IP: &str = "clusterExternalIP";
const MULTI_AZ: &str = "multi_az";
const PROXY_CA: &str = "ca";

pub struct CceClusterHandler {
    client: ServiceClient,
    region: String,
    poll: PollSettings,
}

impl CceClusterHandler {
    pub fn new(client: ServiceClient, region: impl Into<String>, poll: PollSettings) -> Self {
        Self {
            client,
            region: region.into(),
            poll,
        }
    }

    pub async fn create(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        check_region(resource, &self.region)?;
        let request = build_cluster(resource)?;

        let created = cce::create(&self.client, &request)
            .await
            .map_err(|e| ProviderError::wrap("Error creating CCE cluster", e).for_resource(id.clone()))?;
        let cluster_id = created.metadata.uid.as_str();
        log::info!("CCE cluster ID: {}", cluster_id);

        log::debug!("Waiting for CCE cluster ({}) to become available", cluster_id);
        let conf = self.poll.apply(
            StateChangeConf::new(&["Creating"], &["Available"])
                .with_failure(&["Error"])
                .with_timeout(schemas::cce_cluster::schema().timeouts.create),
        );
        conf.wait_for_state(move || self.refresh_phase(cluster_id))
            .await
            .map_err(|e| ProviderError::wrap("Error creating CCE cluster", e).for_resource(id.clone()))?;

        self.read(id, cluster_id).await
    }

    pub async fn read(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        let cluster = match cce::get(&self.client, identifier).await {
            Ok(cluster) => cluster,
            Err(e) if e.is_not_found() => {
                log::info!("CCE cluster {} not found, removing from state", identifier);
                return Ok(State::not_found(id.clone()));
            }
            Err(e) => {
                return Err(ProviderError::wrap("Error retrieving CCE cluster", e)
                    .for_resource(id.clone()));
            }
        };

        let mut attributes = cluster_attributes(&cluster, &self.region);
        let cert = match cce::get_cert(&self.client, identifier).await {
            Ok(cert) => cert,
            Err(e) => {
                log::warn!("Error fetching certificate of CCE cluster {}: {}", identifier, e);
                Certificate::default()
            }
        };
        attributes.extend(certificate_attributes(&cert));

        Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
    }

    pub async fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        to: &Resource,
        changed: &[String],
    ) -> ProviderResult<State> {
        let schema = schemas::cce_cluster::schema();
        if schema.updatable(changed).contains(&"description") {
            let opts = UpdateOpts {
                spec: UpdateSpec {
                    description: Some(optional_str(to, "description")),
                },
            };
            cce::update(&self.client, identifier, &opts)
                .await
                .map_err(|e| {
                    ProviderError::wrap(format!("Error updating CCE cluster {}", identifier), e)
                        .for_resource(id.clone())
                })?;
        }

        self.read(id, identifier).await
    }

    pub async fn delete(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        match cce::delete(&self.client, identifier).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                log::info!("CCE cluster {} already deleted", identifier);
                return Ok(());
            }
            Err(e) => {
                return Err(ProviderError::wrap("Error deleting CCE cluster", e)
                    .for_resource(id.clone()));
            }
        }

        let conf = self.poll.apply(
            StateChangeConf::new(&["Deleting", "Available", "Unavailable"], &["Deleted"])
                .with_timeout(schemas::cce_cluster::schema().timeouts.delete),
        );
        conf.wait_for_state(move || self.refresh_deleted(identifier))
            .await
            .map_err(|e| ProviderError::wrap("Error deleting CCE cluster", e).for_resource(id.clone()))?;

        log::info!("Successfully deleted CCE cluster {}", identifier);
        Ok(())
    }

    async fn refresh_phase(&self, cluster_id: &str) -> Result<(Option<Cluster>, String), BoxError> {
        let cluster = cce::get(&self.client, cluster_id).await?;
        let phase = cluster.phase().to_string();
        Ok((Some(cluster), phase))
    }

    async fn refresh_deleted(&self, cluster_id: &str) -> Result<(Option<()>, String), BoxError> {
        match cce::get(&self.client, cluster_id).await {
            Ok(cluster) if cluster.phase() == "Deleting" => Ok((Some(()), "Deleting".to_string())),
            Ok(_) => Ok((Some(()), "Available".to_string())),
            Err(e) if e.is_not_found() => Ok((Some(()), "Deleted".to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

/// Creation request for a configuration record
fn build_cluster(resource: &Resource) -> ProviderResult<Cluster> {
    let mut extend_param = string_map(&resource.attributes, "extend_param");
    if resource.get_bool("multi_az") == Some(true) {
        extend_param.insert(EXTEND_CLUSTER_AZ.to_string(), MULTI_AZ.to_string());
    }
    if let Some(mode) = resource.get_str("kube_proxy_mode").filter(|m| !m.is_empty()) {
        extend_param.insert(EXTEND_KUBE_PROXY_MODE.to_string(), mode.to_string());
    }
    if let Some(eip) = resource.get_str("eip").filter(|ip| !ip.is_empty()) {
        extend_param.insert(EXTEND_EXTERNAL_IP.to_string(), eip.to_string());
    }

    let mut authenticating_proxy = HashMap::new();
    if let Some(ca) = resource.get_str("authenticating_proxy_ca").filter(|ca| !ca.is_empty()) {
        authenticating_proxy.insert(PROXY_CA.to_string(), ca.to_string());
    }
    let auth_mode = resource
        .get_str("authentication_mode")
        .unwrap_or(DEFAULT_AUTHENTICATION_MODE)
        .to_string();

    Ok(Cluster {
        kind: KIND_CLUSTER.to_string(),
        api_version: API_VERSION.to_string(),
        metadata: Metadata {
            name: required_str(resource, "name")?,
            uid: String::new(),
            labels: string_map(&resource.attributes, "labels"),
            annotations: string_map(&resource.attributes, "annotations"),
        },
        spec: Spec {
            cluster_type: required_str(resource, "cluster_type")?,
            flavor: required_str(resource, "flavor_id")?,
            version: optional_str(resource, "cluster_version"),
            description: optional_str(resource, "description"),
            host_network: HostNetwork {
                vpc: required_str(resource, "vpc_id")?,
                subnet: required_str(resource, "subnet_id")?,
                highway_subnet: optional_str(resource, "highway_subnet_id"),
            },
            container_network: ContainerNetwork {
                mode: required_str(resource, "container_network_type")?,
                cidr: optional_str(resource, "container_network_cidr"),
            },
            authentication: Some(Authentication {
                mode: auth_mode,
                authenticating_proxy,
            }),
            billing_mode: resource.get_int("billing_mode").unwrap_or_default(),
            extend_param,
        },
        status: None,
    })
}

fn string(value: &str) -> Value {
    Value::String(value.to_string())
}

fn cluster_attributes(cluster: &Cluster, region: &str) -> HashMap<String, Value> {
    let spec = &cluster.spec;
    let mut extend_param = spec.extend_param.clone();
    let multi_az = extend_param.remove(EXTEND_CLUSTER_AZ).as_deref() == Some(MULTI_AZ);
    let kube_proxy_mode = extend_param.remove(EXTEND_KUBE_PROXY_MODE).unwrap_or_default();
    let eip = extend_param.remove(EXTEND_EXTERNAL_IP).unwrap_or_default();

    let mut attributes = HashMap::from([
        ("region".to_string(), string(region)),
        ("name".to_string(), string(&cluster.metadata.name)),
        ("status".to_string(), string(cluster.phase())),
        ("flavor_id".to_string(), string(&spec.flavor)),
        ("cluster_type".to_string(), string(&spec.cluster_type)),
        ("cluster_version".to_string(), string(&spec.version)),
        ("description".to_string(), string(&spec.description)),
        ("billing_mode".to_string(), Value::Int(spec.billing_mode)),
        ("vpc_id".to_string(), string(&spec.host_network.vpc)),
        ("subnet_id".to_string(), string(&spec.host_network.subnet)),
        (
            "highway_subnet_id".to_string(),
            string(&spec.host_network.highway_subnet),
        ),
        (
            "container_network_type".to_string(),
            string(&spec.container_network.mode),
        ),
        (
            "container_network_cidr".to_string(),
            string(&spec.container_network.cidr),
        ),
        (
            "labels".to_string(),
            Value::string_map(cluster.metadata.labels.clone()),
        ),
        (
            "annotations".to_string(),
            Value::string_map(cluster.metadata.annotations.clone()),
        ),
        ("extend_param".to_string(), Value::string_map(extend_param)),
        ("multi_az".to_string(), Value::Bool(multi_az)),
        ("kube_proxy_mode".to_string(), Value::String(kube_proxy_mode)),
        ("eip".to_string(), Value::String(eip)),
    ]);

    if let Some(auth) = &spec.authentication {
        attributes.insert("authentication_mode".to_string(), string(&auth.mode));
        if let Some(ca) = auth.authenticating_proxy.get(PROXY_CA) {
            attributes.insert("authenticating_proxy_ca".to_string(), string(ca));
        }
    }
    attributes
}

fn certificate_attributes(cert: &Certificate) -> [(String, Value); 2] {
    let clusters = cert
        .clusters
        .iter()
        .map(|c| {
            Value::string_map([
                ("name", &c.name),
                ("server", &c.cluster.server),
                (
                    "certificate_authority_data",
                    &c.cluster.certificate_authority_data,
                ),
            ])
        })
        .collect();
    let users = cert
        .users
        .iter()
        .map(|u| {
            Value::string_map([
                ("name", &u.name),
                ("client_certificate_data", &u.user.client_certificate_data),
                ("client_key_data", &u.user.client_key_data),
            ])
        })
        .collect();

    [
        ("certificate_clusters".to_string(), Value::List(clusters)),
        ("certificate_users".to_string(), Value::List(users)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::cce::{CertCluster, CertClusterData};

    fn cluster_resource() -> Resource {
        Resource::new("cce_cluster", "k8s")
            .with_attribute("name", string("k8s"))
            .with_attribute("flavor_id", string("cce.s1.small"))
            .with_attribute("cluster_type", string("VirtualMachine"))
            .with_attribute("vpc_id", string("vpc-1"))
            .with_attribute("subnet_id", string("subnet-1"))
            .with_attribute("container_network_type", string("overlay_l2"))
    }

    #[test]
    fn extend_param_merges_dedicated_fields() {
        let resource = cluster_resource()
            .with_attribute("multi_az", Value::Bool(true))
            .with_attribute("eip", string("100.1.1.1"))
            .with_attribute("kube_proxy_mode", string("ipvs"))
            .with_attribute("extend_param", Value::string_map([("dssMasterVolumes", "ssd")]));

        let cluster = build_cluster(&resource).unwrap();
        let params = &cluster.spec.extend_param;
        assert_eq!(params[EXTEND_CLUSTER_AZ], "multi_az");
        assert_eq!(params[EXTEND_EXTERNAL_IP], "100.1.1.1");
        assert_eq!(params[EXTEND_KUBE_PROXY_MODE], "ipvs");
        assert_eq!(params["dssMasterVolumes"], "ssd");
    }

    #[test]
    fn authentication_defaults_to_x509() {
        let cluster = build_cluster(&cluster_resource()).unwrap();
        let auth = cluster.spec.authentication.unwrap();
        assert_eq!(auth.mode, "x509");
        assert!(auth.authenticating_proxy.is_empty());
        assert_eq!(cluster.kind, "Cluster");
        assert_eq!(cluster.api_version, "v3");
    }

    #[test]
    fn missing_vpc_is_reported() {
        let mut resource = cluster_resource();
        resource.attributes.remove("vpc_id");
        let err = build_cluster(&resource).unwrap_err();
        assert!(err.to_string().contains("'vpc_id'"));
    }

    #[test]
    fn read_unfolds_extend_param() {
        let resource = cluster_resource()
            .with_attribute("multi_az", Value::Bool(true))
            .with_attribute("extend_param", Value::string_map([("dssMasterVolumes", "ssd")]));
        let cluster = build_cluster(&resource).unwrap();

        let attrs = cluster_attributes(&cluster, "cn-north-4");
        assert_eq!(attrs["multi_az"], Value::Bool(true));
        assert_eq!(
            attrs["extend_param"],
            Value::string_map([("dssMasterVolumes", "ssd")])
        );
        assert_eq!(attrs["eip"], string(""));
        assert_eq!(attrs["authentication_mode"], string("x509"));
    }

    #[test]
    fn certificate_blocks() {
        let cert = Certificate {
            clusters: vec![CertCluster {
                name: "internal".to_string(),
                cluster: CertClusterData {
                    server: "https://10.0.0.2:5443".to_string(),
                    certificate_authority_data: "Y2E=".to_string(),
                },
            }],
            users: vec![],
        };

        let [(clusters_key, clusters), (users_key, users)] = certificate_attributes(&cert);
        assert_eq!(clusters_key, "certificate_clusters");
        assert_eq!(users_key, "certificate_users");
        assert_eq!(users, Value::List(vec![]));
        let Value::List(clusters) = clusters else {
            panic!("expected list");
        };
        assert_eq!(
            clusters[0].as_map().unwrap()["server"],
            string("https://10.0.0.2:5443")
        );
    }
}
