//! vpc lifecycle: networking v1 for the VPC itself, v2.0 for its tags

use std::collections::HashMap;

use cirrus_core::provider::{ProviderError, ProviderResult};
use cirrus_core::resource::{Resource, ResourceId, State, Value};
use cirrus_core::waiter::{BoxError, StateChangeConf};

use super::{check_region, required_str, state_string_map, string_map};
use crate::api::tags::{self, Action, Tag};
use crate::api::vpc::{self, CreateOpts, UpdateOpts, Vpc};
use crate::client::{ApiError, ServiceClient};
use crate::config::PollSettings;
use crate::schemas;

const TAG_RESOURCE_KIND: &str = "vpcs";

pub struct VpcHandler {
    client: ServiceClient,
    tags_client: ServiceClient,
    region: String,
    poll: PollSettings,
}

impl VpcHandler {
    pub fn new(
        client: ServiceClient,
        tags_client: ServiceClient,
        region: impl Into<String>,
        poll: PollSettings,
    ) -> Self {
        Self {
            client,
            tags_client,
            region: region.into(),
            poll,
        }
    }

    pub async fn create(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        check_region(resource, &self.region)?;
        let opts = CreateOpts {
            name: required_str(resource, "name")?,
            cidr: required_str(resource, "cidr")?,
        };

        let created = vpc::create(&self.client, &opts)
            .await
            .map_err(|e| ProviderError::wrap("Error creating VPC", e).for_resource(id.clone()))?;
        let vpc_id = created.id.as_str();
        log::info!("Vpc ID: {}", vpc_id);

        let conf = self.poll.apply(
            StateChangeConf::new(&["CREATING"], &["ACTIVE"])
                .with_timeout(schemas::vpc::schema().timeouts.create),
        );
        // The VPC exists from here on; failures keep its ID
        conf.wait_for_state(move || self.refresh_active(vpc_id))
            .await
            .map_err(|e| {
                ProviderError::wrap(format!("Error waiting for Vpc ({}) to become ACTIVE", vpc_id), e)
                    .for_resource(id.clone())
                    .with_identifier(vpc_id)
            })?;

        let wanted_tags = tags::from_map(&string_map(&resource.attributes, "tags"));
        tags::batch(&self.tags_client, TAG_RESOURCE_KIND, vpc_id, Action::Create, &wanted_tags)
            .await
            .map_err(|e| {
                ProviderError::wrap(format!("Error setting tags of VPC {}", vpc_id), e)
                    .for_resource(id.clone())
                    .with_identifier(vpc_id)
            })?;

        self.read(id, vpc_id)
            .await
            .map_err(|e| e.with_identifier(vpc_id))
    }

    pub async fn read(&self, id: &ResourceId, identifier: &str) -> ProviderResult<State> {
        let remote = match vpc::get(&self.client, identifier).await {
            Ok(remote) => remote,
            Err(e) if e.is_not_found() => {
                log::info!("VPC {} not found, removing from state", identifier);
                return Ok(State::not_found(id.clone()));
            }
            Err(e) => {
                return Err(ProviderError::wrap("Error retrieving VPC", e).for_resource(id.clone()));
            }
        };

        let mut attributes = vpc_attributes(&remote, &self.region);
        match tags::get(&self.tags_client, TAG_RESOURCE_KIND, identifier).await {
            Ok(remote_tags) => {
                attributes.insert("tags".to_string(), Value::string_map(remote_tags));
            }
            Err(e) if e.is_not_found() => {
                log::info!("fetching VPC {} tags failed: {}", identifier, e);
            }
            Err(e) => {
                return Err(
                    ProviderError::wrap(format!("Error fetching VPC {} tags", identifier), e)
                        .for_resource(id.clone()),
                );
            }
        }

        Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
    }

    pub async fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
        changed: &[String],
    ) -> ProviderResult<State> {
        let schema = schemas::vpc::schema();
        let updatable = schema.updatable(changed);

        let mut opts = UpdateOpts::default();
        if updatable.contains(&"name") {
            opts.name = Some(required_str(to, "name")?);
        }
        if updatable.contains(&"cidr") {
            opts.cidr = Some(required_str(to, "cidr")?);
        }
        if !opts.is_empty() {
            vpc::update(&self.client, identifier, &opts)
                .await
                .map_err(|e| ProviderError::wrap("Error updating VPC", e).for_resource(id.clone()))?;
        }

        if updatable.contains(&"tags") {
            let (removed, added) = tag_changes(
                &state_string_map(from, "tags"),
                &string_map(&to.attributes, "tags"),
            );
            let tag_error = |e: ApiError| {
                ProviderError::wrap(format!("Error updating tags of VPC {}", identifier), e)
                    .for_resource(id.clone())
            };
            tags::batch(&self.tags_client, TAG_RESOURCE_KIND, identifier, Action::Delete, &removed)
                .await
                .map_err(tag_error)?;
            tags::batch(&self.tags_client, TAG_RESOURCE_KIND, identifier, Action::Create, &added)
                .await
                .map_err(tag_error)?;
        }

        self.read(id, identifier).await
    }

    pub async fn delete(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        log::debug!("Deleting VPC {}", identifier);
        let conf = self.poll.apply(
            StateChangeConf::new(&["ACTIVE"], &["DELETED"])
                .with_timeout(schemas::vpc::schema().timeouts.delete),
        );
        conf.wait_for_state(move || self.refresh_deleted(identifier))
            .await
            .map_err(|e| ProviderError::wrap("Error deleting VPC", e).for_resource(id.clone()))?;
        Ok(())
    }

    /// Status of a VPC being created; the API reports `OK` once usable
    async fn refresh_active(&self, vpc_id: &str) -> Result<(Option<Vpc>, String), BoxError> {
        let remote = vpc::get(&self.client, vpc_id).await?;
        match remote.status.as_str() {
            "OK" => Ok((Some(remote), "ACTIVE".to_string())),
            "DOWN" => Err(format!("Vpc status: '{}'", remote.status).into()),
            _ => {
                let status = remote.status.clone();
                Ok((Some(remote), status))
            }
        }
    }

    /// Issue a delete on every poll until the VPC is gone; 409 means it is still in use
    async fn refresh_deleted(&self, vpc_id: &str) -> Result<(Option<()>, String), BoxError> {
        match vpc::get(&self.client, vpc_id).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                log::info!("Successfully deleted vpc {}", vpc_id);
                return Ok((Some(()), "DELETED".to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        match vpc::delete(&self.client, vpc_id).await {
            Ok(()) => Ok((Some(()), "ACTIVE".to_string())),
            Err(e) if e.is_not_found() => {
                log::info!("Successfully deleted vpc {}", vpc_id);
                Ok((Some(()), "DELETED".to_string()))
            }
            Err(e) if e.is_conflict() => {
                log::debug!("VPC {} still in use: {}", vpc_id, e);
                Ok((Some(()), "ACTIVE".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn vpc_attributes(remote: &Vpc, region: &str) -> HashMap<String, Value> {
    let routes = remote
        .routes
        .iter()
        .map(|r| Value::string_map([("destination", &r.destination), ("nexthop", &r.nexthop)]))
        .collect();

    HashMap::from([
        ("name".to_string(), Value::String(remote.name.clone())),
        ("cidr".to_string(), Value::String(remote.cidr.clone())),
        ("status".to_string(), Value::String(remote.status.clone())),
        ("shared".to_string(), Value::Bool(remote.enable_shared_snat)),
        ("region".to_string(), Value::String(region.to_string())),
        ("routes".to_string(), Value::List(routes)),
    ])
}

/// Tags to delete (gone or changed) and to create (new or changed)
fn tag_changes(
    old: &HashMap<String, String>,
    new: &HashMap<String, String>,
) -> (Vec<Tag>, Vec<Tag>) {
    let removed: HashMap<String, String> = old
        .iter()
        .filter(|(k, v)| new.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    let added: HashMap<String, String> = new
        .iter()
        .filter(|(k, v)| old.get(*k) != Some(*v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    (tags::from_map(&removed), tags::from_map(&added))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::vpc::Route;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn keys(tags: &[Tag]) -> Vec<&str> {
        tags.iter().map(|t| t.key.as_str()).collect()
    }

    #[test]
    fn changed_tags_are_deleted_and_recreated() {
        let old = map(&[("env", "dev"), ("team", "net"), ("keep", "1")]);
        let new = map(&[("env", "prod"), ("keep", "1"), ("owner", "ops")]);

        let (removed, added) = tag_changes(&old, &new);
        assert_eq!(keys(&removed), vec!["env", "team"]);
        assert_eq!(keys(&added), vec!["env", "owner"]);
        assert_eq!(added[0].value, "prod");
    }

    #[test]
    fn identical_tags_need_no_calls() {
        let tags = map(&[("env", "dev")]);
        let (removed, added) = tag_changes(&tags, &tags);
        assert!(removed.is_empty());
        assert!(added.is_empty());
    }

    #[test]
    fn attributes_from_remote_vpc() {
        let remote = Vpc {
            id: "vpc-1".to_string(),
            name: "main".to_string(),
            cidr: "10.0.0.0/16".to_string(),
            status: "OK".to_string(),
            routes: vec![Route {
                destination: "0.0.0.0/0".to_string(),
                nexthop: "10.0.0.1".to_string(),
            }],
            enable_shared_snat: false,
        };

        let attrs = vpc_attributes(&remote, "cn-north-4");
        assert_eq!(attrs["shared"], Value::Bool(false));
        assert_eq!(attrs["region"], Value::String("cn-north-4".to_string()));
        assert_eq!(
            attrs["routes"],
            Value::List(vec![Value::string_map([
                ("destination", "0.0.0.0/0"),
                ("nexthop", "10.0.0.1"),
            ])])
        );
    }
}
