//! Coordinator configuration
//!
//! Loaded from TOML with every field defaulted, then overlaid with
//! environment variables:
//!
//! | Variable | Field |
//! |---|---|
//! | `NAV_DEVICE` | `device` (`phone` / `pad`) |
//! | `NAV_SIDEBAR_HIDEABLE` | `sidebar_hideable` |
//! | `NAV_ANIMATE_CHAINS` | `animate_chains` |

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::{CoordinationError, CoordinationResult};
use crate::rollout::flag_store::{parse_bool, parse_bool_env};

/// Default broadcast buffer for UI events.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Hardware class the app is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Narrow device; multi-column mode delegates to the Site tab.
    Phone,
    /// Wide device; multi-column mode shows sidebar + list + detail.
    Pad,
}

impl DeviceClass {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "phone" => Some(Self::Phone),
            "pad" | "tablet" => Some(Self::Pad),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phone => write!(f, "phone"),
            Self::Pad => write!(f, "pad"),
        }
    }
}

/// Configuration for the root coordinator and its presenters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Device class, selects the multi-column presenter variant.
    pub device: DeviceClass,
    /// Whether the sidebar column may be hidden after a selection.
    pub sidebar_hideable: bool,
    /// "Animated" flag passed to every step of navigation chains.
    pub animate_chains: bool,
    /// Broadcast buffer for UI events.
    pub event_capacity: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            device: DeviceClass::Pad,
            sidebar_hideable: true,
            animate_chains: true,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl CoordinatorConfig {
    /// Parse from a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(raw: &str) -> CoordinationResult<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> CoordinationResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| CoordinationError::InvalidValue {
            field: "path".to_string(),
            message: format!("{}: {}", path.display(), e),
        })?;
        Self::from_toml_str(&raw)
    }

    /// Overlay environment variables on top of this config.
    pub fn with_env(mut self) -> Self {
        if let Ok(raw) = std::env::var("NAV_DEVICE") {
            match DeviceClass::parse(&raw) {
                Some(device) => self.device = device,
                None => warn!(value = %raw, "Ignoring unrecognized NAV_DEVICE"),
            }
        }
        if let Some(v) = parse_bool_env("NAV_SIDEBAR_HIDEABLE") {
            self.sidebar_hideable = v;
        }
        if let Ok(raw) = std::env::var("NAV_ANIMATE_CHAINS") {
            self.animate_chains = parse_bool(&raw);
        }
        self
    }

    fn validate(&self) -> CoordinationResult<()> {
        if self.event_capacity == 0 {
            return Err(CoordinationError::InvalidValue {
                field: "event_capacity".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
