#![allow(dead_code)]

use std::time::Duration;

use cirrus_provider_huaweicloud::{HuaweiCloudProvider, PollSettings, ProviderConfig};
use wiremock::MockServer;

pub const PROJECT: &str = "p-123";
pub const REGION: &str = "cn-north-4";
pub const TOKEN: &str = "test-token";

/// Poll fast enough that a full create/delete cycle takes milliseconds
pub fn fast_poll() -> PollSettings {
    PollSettings {
        delay: Duration::from_millis(5),
        min_timeout: Duration::from_millis(5),
        max_interval: Duration::from_millis(20),
    }
}

pub fn provider(server: &MockServer) -> HuaweiCloudProvider {
    let config = ProviderConfig::new(REGION, PROJECT)
        .with_auth_token(TOKEN)
        .with_endpoint(server.uri())
        .with_poll(fast_poll());
    HuaweiCloudProvider::new(config).expect("provider builds")
}
