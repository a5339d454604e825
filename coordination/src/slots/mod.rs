//! Content Slots — Retained Per-Destination Navigation State
//!
//! Every top-level destination (a site, Notifications, the Reader, Welcome)
//! owns one [`ContentEntry`] holding a list stack and a detail
//! stack. Entries are created lazily on first selection and retained for the
//! lifetime of the owning presenter, so returning to a destination resumes
//! exactly where the user left off.
//!
//! # Live vs. retained
//!
//! ```text
//!            restore(key)                 capture(key, list, detail)
//! registry ───────────────▶ live columns ─────────────────────────────▶ registry
//!  (retained stacks)         (in-flight)          (before switching away)
//! ```
//!
//! At most one entry is live at a time. While live, its stacks are owned by
//! the presenter's [`Columns`]; the registry only remembers which key is live.

pub mod columns;

pub use columns::{ColumnLayout, Columns};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::domain::SiteId;
use crate::error::ContractViolation;
use crate::screen::NavigationStack;

/// Key of a top-level destination in the multi-column layout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "content", rename_all = "snake_case")]
pub enum ContentKey {
    Site { site: SiteId },
    Notifications,
    /// All Reader sections share one entry; the section is navigation
    /// inside its list stack.
    Reader,
    /// No-sites welcome content.
    Welcome,
}

impl ContentKey {
    pub fn site(site: SiteId) -> Self {
        Self::Site { site }
    }

    /// Site this content represents, if any.
    pub fn site_id(&self) -> Option<SiteId> {
        match self {
            Self::Site { site } => Some(*site),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Site { site } => write!(f, "{}", site),
            Self::Notifications => write!(f, "notifications"),
            Self::Reader => write!(f, "reader"),
            Self::Welcome => write!(f, "welcome"),
        }
    }
}

/// Retained UI state of one destination.
#[derive(Debug, Clone)]
pub struct ContentEntry {
    key: ContentKey,
    list: NavigationStack,
    detail: NavigationStack,
    appearances: u32,
}

impl ContentEntry {
    pub fn new(key: ContentKey, list: NavigationStack, detail: NavigationStack) -> Self {
        Self {
            key,
            list,
            detail,
            appearances: 0,
        }
    }

    pub fn key(&self) -> &ContentKey {
        &self.key
    }

    /// Retained list stack. Empty while the entry is live.
    pub fn list(&self) -> &NavigationStack {
        &self.list
    }

    /// Retained detail stack. Empty while the entry is live.
    pub fn detail(&self) -> &NavigationStack {
        &self.detail
    }

    /// How many times the "became visible" hook fired.
    pub fn appearances(&self) -> u32 {
        self.appearances
    }

    fn became_visible(&mut self) {
        self.appearances += 1;
        debug!(key = %self.key, appearances = self.appearances, "Content became visible");
    }
}

/// Owns one [`ContentEntry`] per destination.
#[derive(Debug, Default)]
pub struct ContentSlotRegistry {
    entries: BTreeMap<ContentKey, ContentEntry>,
    live: Option<ContentKey>,
}

impl ContentSlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &ContentKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &ContentKey) -> Option<&ContentEntry> {
        self.entries.get(key)
    }

    /// Key of the entry whose stacks are currently in the live columns.
    pub fn live(&self) -> Option<&ContentKey> {
        self.live.as_ref()
    }

    /// Create the entry for `key` if it does not exist yet.
    ///
    /// Returns `true` if a new entry was created. An existing entry is never
    /// recreated, which preserves its navigation history.
    pub fn ensure_with<F>(&mut self, key: &ContentKey, make: F) -> bool
    where
        F: FnOnce(&ContentKey) -> ContentEntry,
    {
        if self.entries.contains_key(key) {
            return false;
        }
        let entry = make(key);
        debug!(key = %key, "Content entry created");
        self.entries.insert(key.clone(), entry);
        true
    }

    /// Hand the retained stacks of `key` to the live columns and fire its
    /// "became visible" hook.
    pub fn restore(
        &mut self,
        key: &ContentKey,
    ) -> Result<(NavigationStack, NavigationStack), ContractViolation> {
        if let Some(previous) = &self.live {
            if previous != key {
                warn!(live = %previous, next = %key, "Restoring without capturing live content");
            }
        }
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| ContractViolation::MissingContent { key: key.clone() })?;
        let list = std::mem::take(&mut entry.list);
        let detail = std::mem::take(&mut entry.detail);
        entry.became_visible();
        self.live = Some(key.clone());
        Ok((list, detail))
    }

    /// Store the in-flight stacks of the live entry back into the registry.
    pub fn capture(
        &mut self,
        key: &ContentKey,
        list: NavigationStack,
        detail: NavigationStack,
    ) -> Result<(), ContractViolation> {
        let entry = self
            .entries
            .get_mut(key)
            .ok_or_else(|| ContractViolation::MissingContent { key: key.clone() })?;
        entry.list = list;
        entry.detail = detail;
        if self.live.as_ref() == Some(key) {
            self.live = None;
        }
        debug!(key = %key, list = entry.list.len(), detail = entry.detail.len(), "Content captured");
        Ok(())
    }

    /// Destroy the entry for `key`. Returns whether it was live.
    pub fn remove(&mut self, key: &ContentKey) -> bool {
        let was_live = self.live.as_ref() == Some(key);
        if was_live {
            self.live = None;
        }
        if self.entries.remove(key).is_some() {
            debug!(key = %key, was_live, "Content entry destroyed");
        }
        was_live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::{ScreenFactory, ScreenKind, SequentialScreenFactory};

    fn entry(factory: &SequentialScreenFactory, key: &ContentKey) -> ContentEntry {
        ContentEntry::new(
            key.clone(),
            NavigationStack::with_root(factory.make(ScreenKind::NotificationsList)),
            NavigationStack::new(),
        )
    }

    #[test]
    fn test_lazy_creation_is_once() {
        let factory = SequentialScreenFactory::new();
        let mut registry = ContentSlotRegistry::new();
        let key = ContentKey::Notifications;

        assert!(registry.ensure_with(&key, |k| entry(&factory, k)));
        assert!(!registry.ensure_with(&key, |k| entry(&factory, k)));
        assert_eq!(registry.len(), 1);
        assert_eq!(factory.produced(), 1);
    }

    #[test]
    fn test_restore_capture_cycle() {
        let factory = SequentialScreenFactory::new();
        let mut registry = ContentSlotRegistry::new();
        let key = ContentKey::site(SiteId(4));
        registry.ensure_with(&key, |k| entry(&factory, k));

        let (mut list, detail) = registry.restore(&key).unwrap();
        assert_eq!(registry.live(), Some(&key));
        assert!(registry.get(&key).unwrap().list().is_empty());

        list.push(factory.make(ScreenKind::AppSettings));
        registry.capture(&key, list, detail).unwrap();
        assert_eq!(registry.live(), None);

        let entry = registry.get(&key).unwrap();
        assert_eq!(entry.list().len(), 2);
        assert_eq!(entry.appearances(), 1);
    }

    #[test]
    fn test_missing_entry_is_a_violation() {
        let mut registry = ContentSlotRegistry::new();
        let key = ContentKey::Welcome;
        assert_eq!(
            registry.restore(&key).unwrap_err(),
            ContractViolation::MissingContent { key: key.clone() }
        );
        assert!(registry
            .capture(&key, NavigationStack::new(), NavigationStack::new())
            .is_err());
    }

    #[test]
    fn test_remove_live_entry() {
        let factory = SequentialScreenFactory::new();
        let mut registry = ContentSlotRegistry::new();
        let key = ContentKey::site(SiteId(1));
        registry.ensure_with(&key, |k| entry(&factory, k));
        registry.restore(&key).unwrap();

        assert!(registry.remove(&key));
        assert!(registry.live().is_none());
        assert!(!registry.contains(&key));
        assert!(!registry.remove(&key));
    }

    #[test]
    fn test_content_key_display() {
        assert_eq!(ContentKey::site(SiteId(3)).to_string(), "site-3");
        assert_eq!(ContentKey::Reader.to_string(), "reader");
    }
}
