//! Screens, the screen factory contract, and navigation stacks
//!
//! A [`Screen`] is an opaque presentable unit. The coordination core only
//! cares about its identity and which kind of destination it represents, so
//! chain steps can check "the context screen must be of kind X" before
//! navigating further.

use serde::{Deserialize, Serialize};
use std::cell::Cell;

use crate::domain::{NotificationId, PostId, ReaderSection, SiteId};

/// Unique identifier of a screen instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenId(pub u64);

/// What a screen shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScreenKind {
    /// Root container of the tab-bar presenters.
    TabBarContainer,
    /// Root container of the multi-column presenter.
    SplitContainer,
    /// Persistent sidebar column.
    Sidebar,
    /// Blurring overlay shown while the root presenter is rebuilt.
    UpdatingOverlay,
    /// Sign-in / no-sites flow.
    SignIn,
    SiteMenu { site: SiteId },
    SiteDashboard { site: SiteId },
    ReaderStream { section: ReaderSection },
    ReaderPost { site: SiteId, post: PostId },
    ReaderSearchResults { query: String },
    NotificationsList,
    NotificationDetail { note: NotificationId },
    /// Profile / Me.
    Me,
    AppSettings,
    PrivacySettings,
    /// Welcome screen shown when the account has no sites.
    Welcome,
    /// Static "feature moved" screen of the static-screens rollout phase.
    StaticNotice { feature: String },
    /// Empty/error placeholder used when a domain lookup fails.
    Unavailable,
}

/// An opaque presentable unit of UI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Screen {
    pub id: ScreenId,
    pub kind: ScreenKind,
}

impl Screen {
    /// Whether this screen is of the given kind.
    pub fn is(&self, kind: &ScreenKind) -> bool {
        &self.kind == kind
    }
}

impl std::fmt::Display for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {:?}", self.id.0, self.kind)
    }
}

/// Produces screens for destinations.
///
/// The core asks for "the screen of kind X" and never looks inside the
/// result. Factories are shared by successive presenters across mode
/// rebuilds, so they take `&self`.
pub trait ScreenFactory {
    fn make(&self, kind: ScreenKind) -> Screen;
}

/// Screen factory handing out sequential identifiers.
#[derive(Debug, Default)]
pub struct SequentialScreenFactory {
    next: Cell<u64>,
}

impl SequentialScreenFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of screens produced so far.
    pub fn produced(&self) -> u64 {
        self.next.get()
    }
}

impl ScreenFactory for SequentialScreenFactory {
    fn make(&self, kind: ScreenKind) -> Screen {
        let id = self.next.get() + 1;
        self.next.set(id);
        Screen {
            id: ScreenId(id),
            kind,
        }
    }
}

/// Ordered "back" history within one destination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NavigationStack {
    screens: Vec<Screen>,
}

impl NavigationStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack containing only `root`.
    pub fn with_root(root: Screen) -> Self {
        Self {
            screens: vec![root],
        }
    }

    pub fn push(&mut self, screen: Screen) {
        self.screens.push(screen);
    }

    /// Pop the top screen. The root is never popped.
    pub fn pop(&mut self) -> Option<Screen> {
        if self.screens.len() > 1 {
            self.screens.pop()
        } else {
            None
        }
    }

    /// Pop everything above the root.
    pub fn pop_to_root(&mut self) {
        self.screens.truncate(1);
    }

    /// Replace the whole stack with `root`.
    pub fn reset(&mut self, root: Screen) {
        self.screens.clear();
        self.screens.push(root);
    }

    pub fn root(&self) -> Option<&Screen> {
        self.screens.first()
    }

    pub fn top(&self) -> Option<&Screen> {
        self.screens.last()
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn screens(&self) -> &[Screen] {
        &self.screens
    }

    /// Append all screens of `other` on top of this stack.
    pub fn extend(&mut self, other: NavigationStack) {
        self.screens.extend(other.screens);
    }

    /// Split off everything from index `at` upwards into a new stack.
    pub fn split_off(&mut self, at: usize) -> NavigationStack {
        let at = at.min(self.screens.len());
        NavigationStack {
            screens: self.screens.split_off(at),
        }
    }

    pub fn clear(&mut self) {
        self.screens.clear();
    }

    /// Identifiers of the screens, bottom to top.
    pub fn ids(&self) -> Vec<ScreenId> {
        self.screens.iter().map(|s| s.id).collect()
    }
}

impl From<Vec<Screen>> for NavigationStack {
    fn from(screens: Vec<Screen>) -> Self {
        Self { screens }
    }
}
