//! Distributed Message Service v1.0 maintenance windows

use serde::Deserialize;

use crate::client::{ApiResult, ServiceClient};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MaintainWindow {
    pub seq: i64,
    #[serde(default)]
    pub begin: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub default: bool,
}

#[derive(Deserialize)]
struct ListResponse {
    #[serde(default)]
    maintain_windows: Vec<MaintainWindow>,
}

pub async fn list_maintain_windows(client: &ServiceClient) -> ApiResult<Vec<MaintainWindow>> {
    let response: ListResponse = client.get(&["instances", "maintain-windows"]).await?;
    Ok(response.maintain_windows)
}
