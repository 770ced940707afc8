//! REST client for one HuaweiCloud service endpoint

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Errors returned by the REST API layer
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Resource not found: {method} {url}")]
    NotFound { method: Method, url: String },

    #[error("Conflict (409) on {method} {url}: {body}")]
    Conflict {
        method: Method,
        url: String,
        body: String,
    },

    #[error("Unexpected HTTP status {status} on {method} {url}: {body}")]
    Status {
        method: Method,
        url: String,
        status: u16,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Conflict { .. } => Some(409),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            ApiError::Decode { .. } => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Client bound to a versioned service root, e.g. `https://vpc.<region>.../v1/<project>`
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl ServiceClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth_token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join path segments onto the service root
    pub fn url(&self, segments: &[&str]) -> String {
        let mut url = self.base_url.clone();
        for segment in segments {
            url.push('/');
            url.push_str(segment.trim_matches('/'));
        }
        url
    }

    pub async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<T> {
        let url = self.url(segments);
        let body = self.execute(Method::GET, &url, None::<&()>).await?;
        decode(&url, &body)
    }

    pub async fn post<B, T>(&self, segments: &[&str], payload: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments);
        let body = self.execute(Method::POST, &url, Some(payload)).await?;
        decode(&url, &body)
    }

    /// POST whose response body is ignored (e.g., 204 actions)
    pub async fn post_action<B: Serialize + ?Sized>(&self, segments: &[&str], payload: &B) -> ApiResult<()> {
        let url = self.url(segments);
        self.execute(Method::POST, &url, Some(payload)).await?;
        Ok(())
    }

    pub async fn put<B, T>(&self, segments: &[&str], payload: &B) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments);
        let body = self.execute(Method::PUT, &url, Some(payload)).await?;
        decode(&url, &body)
    }

    pub async fn delete(&self, segments: &[&str]) -> ApiResult<()> {
        let url = self.url(segments);
        self.execute(Method::DELETE, &url, None::<&()>).await?;
        Ok(())
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        match &self.auth_token {
            Some(token) => builder.header(AUTH_TOKEN_HEADER, token),
            None => builder,
        }
    }

    /// Send a request and return the body of a successful response
    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: &str,
        payload: Option<&B>,
    ) -> ApiResult<String> {
        log::debug!("{} {}", method, url);
        let mut builder = self.request(method.clone(), url);
        if let Some(payload) = payload {
            builder = builder.json(payload);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        log::debug!("{} {} -> {}", method, url, status);

        if status.is_success() {
            return Ok(body);
        }

        let url = url.to_string();
        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound { method, url },
            StatusCode::CONFLICT => ApiError::Conflict { method, url, body },
            _ => ApiError::Status {
                method,
                url,
                status: status.as_u16(),
                body,
            },
        })
    }
}

fn decode<T: DeserializeOwned>(url: &str, body: &str) -> ApiResult<T> {
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        url: url.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_segments() {
        let client = ServiceClient::new(reqwest::Client::new(), "http://host/v1/p/", None);
        assert_eq!(client.base_url(), "http://host/v1/p");
        assert_eq!(client.url(&["vpcs", "abc"]), "http://host/v1/p/vpcs/abc");
        assert_eq!(client.url(&[]), "http://host/v1/p");
    }

    #[test]
    fn error_status_codes() {
        let not_found = ApiError::NotFound {
            method: Method::GET,
            url: "u".to_string(),
        };
        assert!(not_found.is_not_found());
        assert_eq!(not_found.status(), Some(404));

        let conflict = ApiError::Conflict {
            method: Method::DELETE,
            url: "u".to_string(),
            body: "in use".to_string(),
        };
        assert!(conflict.is_conflict());
        assert_eq!(conflict.to_string(), "Conflict (409) on DELETE u: in use");
    }

    #[test]
    fn decode_reports_url() {
        let err = decode::<serde_json::Value>("http://host/x", "not json").unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
        assert!(err.to_string().starts_with("Failed to decode response from http://host/x"));
    }
}
