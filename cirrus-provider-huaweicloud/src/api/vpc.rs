//! Networking v1 VPC API

use serde::{Deserialize, Serialize};

use crate::client::{ApiResult, ServiceClient};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Vpc {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cidr: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub enable_shared_snat: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub nexthop: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateOpts {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub cidr: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateOpts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
}

impl UpdateOpts {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.cidr.is_none()
    }
}

#[derive(Serialize)]
struct Request<'a, T> {
    vpc: &'a T,
}

#[derive(Deserialize)]
struct Response {
    vpc: Vpc,
}

pub async fn create(client: &ServiceClient, opts: &CreateOpts) -> ApiResult<Vpc> {
    let response: Response = client.post(&["vpcs"], &Request { vpc: opts }).await?;
    Ok(response.vpc)
}

pub async fn get(client: &ServiceClient, id: &str) -> ApiResult<Vpc> {
    let response: Response = client.get(&["vpcs", id]).await?;
    Ok(response.vpc)
}

pub async fn update(client: &ServiceClient, id: &str, opts: &UpdateOpts) -> ApiResult<Vpc> {
    let response: Response = client.put(&["vpcs", id], &Request { vpc: opts }).await?;
    Ok(response.vpc)
}

pub async fn delete(client: &ServiceClient, id: &str) -> ApiResult<()> {
    client.delete(&["vpcs", id]).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_is_wrapped() {
        let opts = CreateOpts {
            name: "vpc-1".to_string(),
            cidr: "192.168.0.0/16".to_string(),
        };
        let body = serde_json::to_value(Request { vpc: &opts }).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"vpc": {"name": "vpc-1", "cidr": "192.168.0.0/16"}})
        );
    }

    #[test]
    fn update_sends_only_set_fields() {
        let opts = UpdateOpts {
            name: Some("renamed".to_string()),
            cidr: None,
        };
        let body = serde_json::to_value(Request { vpc: &opts }).unwrap();
        assert_eq!(body, serde_json::json!({"vpc": {"name": "renamed"}}));
        assert!(UpdateOpts::default().is_empty());
    }

    #[test]
    fn parses_vpc_with_routes() {
        let response: Response = serde_json::from_value(serde_json::json!({
            "vpc": {
                "id": "vpc-1",
                "name": "main",
                "cidr": "10.0.0.0/16",
                "status": "OK",
                "routes": [{"destination": "0.0.0.0/0", "nexthop": "10.0.0.1"}],
                "enable_shared_snat": true
            }
        }))
        .unwrap();

        assert_eq!(response.vpc.status, "OK");
        assert!(response.vpc.enable_shared_snat);
        assert_eq!(response.vpc.routes[0].nexthop, "10.0.0.1");
    }
}
