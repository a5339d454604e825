//! Domain identifiers and the domain object store contract
//!
//! The coordination core never owns sites, posts or notifications. It looks
//! them up by identifier through [`DomainStore`] and listens to the store's
//! deletion feed so a presenter can recover when the object it displays is
//! removed underneath it.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeSet;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Channel capacity for the deletion feed
const CHANGE_FEED_CAPACITY: usize = 64;

/// Identifier of a site (blog) known to the domain store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(pub u64);

/// Identifier of a post within a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

/// Identifier of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub u64);

impl std::fmt::Display for SiteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "site-{}", self.0)
    }
}

impl std::fmt::Display for PostId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "post-{}", self.0)
    }
}

impl std::fmt::Display for NotificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "note-{}", self.0)
    }
}

/// Sub-section of the Reader destination.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderSection {
    /// Followed sites stream.
    Subscriptions,
    /// Recommended content.
    Discover,
    /// Saved-for-later posts.
    Saved,
    /// Liked posts.
    Liked,
    /// Reader search.
    Search,
    /// Stream for a single tag.
    Tag(String),
}

impl std::fmt::Display for ReaderSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Subscriptions => write!(f, "subscriptions"),
            Self::Discover => write!(f, "discover"),
            Self::Saved => write!(f, "saved"),
            Self::Liked => write!(f, "liked"),
            Self::Search => write!(f, "search"),
            Self::Tag(slug) => write!(f, "tag:{}", slug),
        }
    }
}

/// A change reported by the domain store's change feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainChange {
    /// A site was removed from the account.
    SiteDeleted { site: SiteId },
}

/// Lookup-by-identifier access to domain objects.
///
/// Implementations are queried from the UI thread only; all methods take
/// `&self` and use interior mutability where they need to.
pub trait DomainStore {
    /// Whether a signed-in account exists.
    fn has_account(&self) -> bool;

    /// All sites currently on the account, in display order.
    fn sites(&self) -> Vec<SiteId>;

    /// Whether the given site exists.
    fn site_exists(&self, site: SiteId) -> bool {
        self.sites().contains(&site)
    }

    /// Whether the given post can be resolved.
    fn post_exists(&self, site: SiteId, post: PostId) -> bool;

    /// Whether the given notification can be resolved.
    fn notification_exists(&self, note: NotificationId) -> bool;

    /// Subscribe to the deletion feed.
    fn changes(&self) -> broadcast::Receiver<DomainChange>;

    /// First site other than `excluded`, used for automatic reselection.
    fn next_site(&self, excluded: SiteId) -> Option<SiteId> {
        self.sites().into_iter().find(|s| *s != excluded)
    }
}

/// In-memory domain store used by the shell and the test suites.
pub struct InMemoryDomainStore {
    signed_in: RefCell<bool>,
    sites: RefCell<Vec<SiteId>>,
    posts: RefCell<BTreeSet<(SiteId, PostId)>>,
    notifications: RefCell<BTreeSet<NotificationId>>,
    sender: broadcast::Sender<DomainChange>,
}

impl InMemoryDomainStore {
    /// Create a signed-in store with the given sites.
    pub fn new(sites: impl IntoIterator<Item = SiteId>) -> Self {
        let (sender, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            signed_in: RefCell::new(true),
            sites: RefCell::new(sites.into_iter().collect()),
            posts: RefCell::new(BTreeSet::new()),
            notifications: RefCell::new(BTreeSet::new()),
            sender,
        }
    }

    /// Create a store with no account and no sites.
    pub fn signed_out() -> Self {
        let store = Self::new([]);
        *store.signed_in.borrow_mut() = false;
        store
    }

    /// Register a post that deep links can resolve.
    pub fn with_post(self, site: SiteId, post: PostId) -> Self {
        self.posts.borrow_mut().insert((site, post));
        self
    }

    /// Register a notification that deep links can resolve.
    pub fn with_notification(self, note: NotificationId) -> Self {
        self.notifications.borrow_mut().insert(note);
        self
    }

    /// Add a site to the account.
    pub fn add_site(&self, site: SiteId) {
        let mut sites = self.sites.borrow_mut();
        if !sites.contains(&site) {
            sites.push(site);
        }
    }

    /// Set whether an account is signed in.
    pub fn set_signed_in(&self, signed_in: bool) {
        *self.signed_in.borrow_mut() = signed_in;
    }

    /// Remove a site and publish the deletion on the change feed.
    ///
    /// Returns `false` when the site was not on the account.
    pub fn delete_site(&self, site: SiteId) -> bool {
        let removed = {
            let mut sites = self.sites.borrow_mut();
            let before = sites.len();
            sites.retain(|s| *s != site);
            sites.len() != before
        };
        if !removed {
            debug!(%site, "Delete requested for unknown site");
            return false;
        }
        self.posts.borrow_mut().retain(|(s, _)| *s != site);
        info!(%site, "Site deleted");
        // No subscribers is fine; presenters subscribe when they are built.
        let _ = self.sender.send(DomainChange::SiteDeleted { site });
        true
    }
}

impl Default for InMemoryDomainStore {
    fn default() -> Self {
        Self::new([])
    }
}

impl DomainStore for InMemoryDomainStore {
    fn has_account(&self) -> bool {
        *self.signed_in.borrow()
    }

    fn sites(&self) -> Vec<SiteId> {
        self.sites.borrow().clone()
    }

    fn post_exists(&self, site: SiteId, post: PostId) -> bool {
        self.posts.borrow().contains(&(site, post))
    }

    fn notification_exists(&self, note: NotificationId) -> bool {
        self.notifications.borrow().contains(&note)
    }

    fn changes(&self) -> broadcast::Receiver<DomainChange> {
        self.sender.subscribe()
    }
}
