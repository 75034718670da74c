//! Provider-level configuration.
//!
//! Built once when the provider is configured and treated as immutable
//! for the lifetime of the process. Resource handlers read defaults
//! from here; they never mutate it.

use std::time::Duration;

use cirrus_common::{Error, Result};

/// Per-operation timeout overrides. `None` falls back to the
/// resource's own default.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timeouts {
    pub create: Option<Duration>,
    pub update: Option<Duration>,
    pub delete: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Management API endpoint, e.g. `https://api.cirrus.example:443`.
    pub endpoint: String,
    /// Default folder for resources that do not set `folder_id`.
    pub folder_id: String,
    pub timeouts: Timeouts,
    /// Interval between operation status polls.
    pub poll_interval: Duration,
}

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

impl ProviderConfig {
    pub fn new(endpoint: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            folder_id: folder_id.into(),
            timeouts: Timeouts::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn create_timeout(&self, default: Duration) -> Duration {
        self.timeouts.create.unwrap_or(default)
    }

    pub fn update_timeout(&self, default: Duration) -> Duration {
        self.timeouts.update.unwrap_or(default)
    }

    pub fn delete_timeout(&self, default: Duration) -> Duration {
        self.timeouts.delete.unwrap_or(default)
    }

    /// Folder for a resource: its own `folder_id` attribute when set,
    /// otherwise the provider default.
    pub fn resolve_folder_id(&self, resource_folder: Option<String>) -> Result<String> {
        match resource_folder {
            Some(f) if !f.is_empty() => Ok(f),
            _ if !self.folder_id.is_empty() => Ok(self.folder_id.clone()),
            _ => Err(Error::InvalidConfig(
                "folder_id is not set on the resource and the provider has no default".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_overrides_win() {
        let config = ProviderConfig::new("http://localhost:19900", "folder-1").with_timeouts(
            Timeouts {
                create: Some(Duration::from_secs(90)),
                ..Default::default()
            },
        );
        let default = Duration::from_secs(600);
        assert_eq!(config.create_timeout(default), Duration::from_secs(90));
        assert_eq!(config.update_timeout(default), default);
    }

    #[test]
    fn folder_resolution() {
        let config = ProviderConfig::new("http://localhost:19900", "default-folder");
        assert_eq!(
            config.resolve_folder_id(Some("explicit".into())).unwrap(),
            "explicit"
        );
        assert_eq!(config.resolve_folder_id(None).unwrap(), "default-folder");

        let bare = ProviderConfig::new("http://localhost:19900", "");
        assert!(bare.resolve_folder_id(None).is_err());
    }
}
