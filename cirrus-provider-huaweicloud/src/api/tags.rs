//! Networking v2.0 resource tags API

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::client::{ApiResult, ServiceClient};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Delete,
}

#[derive(Serialize)]
struct ActionRequest<'a> {
    action: Action,
    tags: &'a [Tag],
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    tags: Vec<Tag>,
}

/// Sorted tag list from a key/value map
pub fn from_map(map: &HashMap<String, String>) -> Vec<Tag> {
    let mut tags: Vec<Tag> = map
        .iter()
        .map(|(key, value)| Tag {
            key: key.clone(),
            value: value.clone(),
        })
        .collect();
    tags.sort_by(|a, b| a.key.cmp(&b.key));
    tags
}

pub fn to_map(tags: Vec<Tag>) -> HashMap<String, String> {
    tags.into_iter().map(|t| (t.key, t.value)).collect()
}

pub async fn get(
    client: &ServiceClient,
    resource_kind: &str,
    id: &str,
) -> ApiResult<HashMap<String, String>> {
    let response: TagsResponse = client.get(&[resource_kind, id, "tags"]).await?;
    Ok(to_map(response.tags))
}

/// Create or delete a batch of tags on one resource
pub async fn batch(
    client: &ServiceClient,
    resource_kind: &str,
    id: &str,
    action: Action,
    tags: &[Tag],
) -> ApiResult<()> {
    if tags.is_empty() {
        return Ok(());
    }
    client
        .post_action(&[resource_kind, id, "tags", "action"], &ActionRequest { action, tags })
        .await
}
