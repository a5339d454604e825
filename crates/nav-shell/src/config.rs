//! Shell configuration: the coordinator section plus the simulated account
//! the in-memory domain store starts with.

use anyhow::{Context, Result};
use nav_coordination::{
    CoordinatorConfig, EnvFlagStore, FlagOverrides, FlagStore, InMemoryDomainStore,
    NotificationId, PostId, RolloutPhase, SiteId,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub coordinator: CoordinatorConfig,
    pub account: AccountConfig,
    /// Rollout phase to start in; `NAV_ROLLOUT_PHASE` applies when unset.
    pub phase: Option<String>,
}

/// Simulated account contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    pub signed_in: bool,
    pub sites: Vec<u64>,
    /// `[site, post]` pairs deep links can resolve.
    pub posts: Vec<[u64; 2]>,
    pub notifications: Vec<u64>,
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            signed_in: true,
            sites: vec![1],
            posts: Vec::new(),
            notifications: Vec::new(),
        }
    }
}

impl ShellConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Failed to parse shell config")?;
        // Validates the coordinator section the same way a standalone load would
        let section = toml::to_string(&config.coordinator)
            .context("Failed to re-encode coordinator section")?;
        CoordinatorConfig::from_toml_str(&section)?;
        Ok(config)
    }

    /// Load from `path` when given, defaults otherwise, then overlay the
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                Self::from_toml_str(&raw)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => Self::default(),
        };
        Ok(config.with_env())
    }

    pub fn with_env(mut self) -> Self {
        self.coordinator = self.coordinator.with_env();
        self
    }

    /// Starting phase: command line, then config file, then environment.
    pub fn initial_phase(&self, cli: Option<&str>) -> RolloutPhase {
        let phase = cli.or(self.phase.as_deref()).map(RolloutPhase::parse);
        EnvFlagStore::new()
            .with_overrides(FlagOverrides { phase })
            .flag_state()
            .phase
    }

    pub fn domain_store(&self) -> InMemoryDomainStore {
        let account = &self.account;
        let mut store = InMemoryDomainStore::new(account.sites.iter().copied().map(SiteId));
        for [site, post] in &account.posts {
            store = store.with_post(SiteId(*site), PostId(*post));
        }
        for note in &account.notifications {
            store = store.with_notification(NotificationId(*note));
        }
        store.set_signed_in(account.signed_in);
        store
    }
}
