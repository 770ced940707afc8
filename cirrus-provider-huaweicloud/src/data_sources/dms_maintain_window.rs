//! dms_maintain_window: pick one of the fixed DMS maintenance windows

use std::collections::HashMap;

use cirrus_core::provider::{ProviderError, ProviderResult};
use cirrus_core::resource::{Resource, State, Value};

use crate::api::dms::{self, MaintainWindow};
use crate::client::ServiceClient;

pub const NO_RESULTS: &str =
    "Your query returned no results. Please change your filters and try again.";

/// Window filters; unset `seq`/`begin`/`end` match every window
///
/// `default` is always compared: leaving it out selects non-default windows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowFilter {
    pub seq: Option<i64>,
    pub begin: Option<String>,
    pub end: Option<String>,
    pub default: bool,
}

impl WindowFilter {
    /// `seq` 0 and empty strings count as unset
    pub fn from_resource(resource: &Resource) -> Self {
        let non_empty = |key: &str| {
            resource
                .get_str(key)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            seq: resource.get_int("seq").filter(|seq| *seq != 0),
            begin: non_empty("begin"),
            end: non_empty("end"),
            default: resource.get_bool("default").unwrap_or_default(),
        }
    }

    pub fn matches(&self, window: &MaintainWindow) -> bool {
        self.seq.is_none_or(|seq| seq == window.seq)
            && self.begin.as_ref().is_none_or(|b| *b == window.begin)
            && self.end.as_ref().is_none_or(|e| *e == window.end)
            && self.default == window.default
    }
}

pub struct MaintainWindowDataSource {
    client: ServiceClient,
}

impl MaintainWindowDataSource {
    pub fn new(client: ServiceClient) -> Self {
        Self { client }
    }

    pub async fn read(&self, resource: &Resource) -> ProviderResult<State> {
        let id = &resource.id;
        let windows = dms::list_maintain_windows(&self.client)
            .await
            .map_err(|e| {
                ProviderError::wrap("Error getting dms maintainwindows", e).for_resource(id.clone())
            })?;

        let filter = WindowFilter::from_resource(resource);
        let window = windows
            .into_iter()
            .find(|w| filter.matches(w))
            .ok_or_else(|| ProviderError::new(NO_RESULTS).for_resource(id.clone()))?;
        log::debug!("Dms MaintainWindow : {:?}", window);

        let attributes = HashMap::from([
            ("seq".to_string(), Value::Int(window.seq)),
            ("begin".to_string(), Value::String(window.begin)),
            ("end".to_string(), Value::String(window.end)),
            ("default".to_string(), Value::Bool(window.default)),
        ]);
        Ok(State::existing(id.clone(), attributes).with_identifier(window.seq.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(seq: i64, begin: &str, end: &str, default: bool) -> MaintainWindow {
        MaintainWindow {
            seq,
            begin: begin.to_string(),
            end: end.to_string(),
            default,
        }
    }

    #[test]
    fn empty_filter_matches_regular_windows_only() {
        let filter = WindowFilter::default();
        assert!(filter.matches(&window(1, "22", "02", false)));
        assert!(!filter.matches(&window(2, "02", "06", true)));
    }

    #[test]
    fn zero_seq_and_empty_strings_are_unset() {
        let resource = Resource::new("dms_maintain_window", "w")
            .with_attribute("seq", Value::Int(0))
            .with_attribute("begin", Value::String(String::new()));
        assert_eq!(WindowFilter::from_resource(&resource), WindowFilter::default());
    }

    #[test]
    fn all_set_filters_must_match() {
        let filter = WindowFilter {
            begin: Some("02".to_string()),
            default: true,
            ..Default::default()
        };
        assert!(filter.matches(&window(2, "02", "06", true)));
        assert!(!filter.matches(&window(2, "02", "06", false)));
        assert!(!filter.matches(&window(3, "06", "10", true)));
    }
}
