//! Provider configuration: region, project, credentials and poll tuning

use std::time::Duration;

use cirrus_core::waiter::StateChangeConf;
use thiserror::Error;

pub const ENV_REGION: &str = "HW_REGION_NAME";
pub const ENV_PROJECT_ID: &str = "HW_PROJECT_ID";
pub const ENV_AUTH_TOKEN: &str = "HW_AUTH_TOKEN";
pub const ENV_ENDPOINT: &str = "HW_ENDPOINT";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required setting: set {var}")]
    Missing { var: &'static str },

    #[error("Invalid value for {var}: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Remote services the handlers talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Vpc,
    Cce,
    Dms,
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::Vpc => "vpc",
            Service::Cce => "cce",
            Service::Dms => "dms",
        }
    }
}

/// Timing shared by every state-change waiter the provider runs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub delay: Duration,
    pub min_timeout: Duration,
    pub max_interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            min_timeout: Duration::from_secs(3),
            max_interval: Duration::from_secs(10),
        }
    }
}

impl PollSettings {
    pub fn apply(&self, conf: StateChangeConf) -> StateChangeConf {
        conf.with_delay(self.delay)
            .with_min_timeout(self.min_timeout)
            .with_max_interval(self.max_interval)
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub region: String,
    pub project_id: String,
    pub auth_token: Option<String>,
    /// Overrides every service URL (private deployments, mock servers)
    pub endpoint: Option<String>,
    pub poll: PollSettings,
}

impl ProviderConfig {
    pub fn new(region: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            project_id: project_id.into(),
            auth_token: None,
            endpoint: None,
            poll: PollSettings::default(),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    /// Build a configuration from `HW_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &'static str| lookup(var).filter(|v| !v.trim().is_empty());

        let region = get(ENV_REGION).ok_or(ConfigError::Missing { var: ENV_REGION })?;
        let project_id = get(ENV_PROJECT_ID).ok_or(ConfigError::Missing {
            var: ENV_PROJECT_ID,
        })?;

        let mut config = Self::new(region, project_id);
        config.auth_token = get(ENV_AUTH_TOKEN);
        if let Some(endpoint) = get(ENV_ENDPOINT) {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ConfigError::Invalid {
                    var: ENV_ENDPOINT,
                    message: format!("'{}' must start with http:// or https://", endpoint),
                });
            }
            config.endpoint = Some(endpoint);
        }
        Ok(config)
    }

    /// Root URL of a service, without a trailing slash
    pub fn service_endpoint(&self, service: Service) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.{}.myhuaweicloud.com", service.name(), self.region),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn reads_settings_from_environment() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (ENV_REGION, "cn-north-4"),
            (ENV_PROJECT_ID, "p-123"),
            (ENV_AUTH_TOKEN, "token"),
        ]))
        .unwrap();

        assert_eq!(config.region, "cn-north-4");
        assert_eq!(config.project_id, "p-123");
        assert_eq!(config.auth_token.as_deref(), Some("token"));
        assert_eq!(
            config.service_endpoint(Service::Cce),
            "https://cce.cn-north-4.myhuaweicloud.com"
        );
    }

    #[test]
    fn missing_project_is_an_error() {
        let err = ProviderConfig::from_lookup(lookup(&[(ENV_REGION, "cn-north-4")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                var: ENV_PROJECT_ID
            }
        );
        assert_eq!(err.to_string(), "Missing required setting: set HW_PROJECT_ID");
    }

    #[test]
    fn blank_values_count_as_missing() {
        let err = ProviderConfig::from_lookup(lookup(&[(ENV_REGION, " "), (ENV_PROJECT_ID, "p")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing { var: ENV_REGION });
    }

    #[test]
    fn endpoint_override_is_shared_by_all_services() {
        let config = ProviderConfig::from_lookup(lookup(&[
            (ENV_REGION, "r"),
            (ENV_PROJECT_ID, "p"),
            (ENV_ENDPOINT, "http://127.0.0.1:8080/"),
        ]))
        .unwrap();

        assert_eq!(config.service_endpoint(Service::Vpc), "http://127.0.0.1:8080");
        assert_eq!(config.service_endpoint(Service::Dms), "http://127.0.0.1:8080");
    }

    #[test]
    fn endpoint_must_be_a_url() {
        let err = ProviderConfig::from_lookup(lookup(&[
            (ENV_REGION, "r"),
            (ENV_PROJECT_ID, "p"),
            (ENV_ENDPOINT, "localhost:8080"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_ENDPOINT, .. }));
    }
}
