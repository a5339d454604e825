//! Root presenters
//!
//! A root presenter owns the app's top-level UI for one presentation mode.
//! [`RootPresenter`] is a closed sum over the presenter variants; callers ask
//! it for [`Capabilities`] instead of downcasting, and every entry point is
//! total: an operation the variant does not support returns
//! [`Dispatch::Unsupported`] (or `None`) and does nothing.
//!
//! | mode            | device | presenter                                |
//! |-----------------|--------|------------------------------------------|
//! | `TabBar`        | any    | [`TabBarPresenter`] / [`TabVariant::Full`] |
//! | `StaticTabBar`  | any    | [`TabBarPresenter`] / `StaticScreens`    |
//! | `MultiColumn`   | pad    | [`MultiColumnPresenter`]                 |
//! | `MultiColumn`   | phone  | [`TabBarPresenter`] / `SiteOnly`         |

pub mod multi_column;
pub mod tab_bar;

pub use multi_column::MultiColumnPresenter;
pub use tab_bar::{Tab, TabBarPresenter, TabVariant};

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::config::{CoordinatorConfig, DeviceClass};
use crate::deep_link::DeepLinkTarget;
use crate::domain::{DomainStore, NotificationId, ReaderSection, SiteId};
use crate::error::ContractViolation;
use crate::rollout::PresentationMode;
use crate::screen::{Screen, ScreenFactory, ScreenKind};

/// Presenter variant, as observed by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenterKind {
    TabBar,
    StaticTabBar,
    MultiColumn,
    /// Site-only presenter used for multi-column mode on phones.
    Simplified,
}

/// Features reachable through the current presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities {
    pub reader: bool,
    pub discover: bool,
    pub notifications: bool,
    pub me: bool,
    pub sidebar: bool,
}

/// Outcome of a navigation entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispatch {
    Handled,
    /// The presenter has no such destination; nothing changed.
    Unsupported,
}

/// Something a presenter needs from its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresenterRequest {
    /// The account has no sites left; show the sign-in flow.
    SignIn,
}

/// Collaborators shared by every presenter the coordinator builds.
#[derive(Clone)]
pub struct PresenterDeps {
    pub screens: Rc<dyn ScreenFactory>,
    pub store: Rc<dyn DomainStore>,
}

pub enum RootPresenter {
    Tabs(TabBarPresenter),
    MultiColumn(MultiColumnPresenter),
}

impl RootPresenter {
    /// Build the presenter for a mode.
    pub fn build(mode: PresentationMode, config: &CoordinatorConfig, deps: PresenterDeps) -> Self {
        match (mode, config.device) {
            (PresentationMode::TabBar, _) => Self::Tabs(TabBarPresenter::new(TabVariant::Full, deps)),
            (PresentationMode::StaticTabBar, _) => {
                Self::Tabs(TabBarPresenter::new(TabVariant::StaticScreens, deps))
            }
            (PresentationMode::MultiColumn, DeviceClass::Pad) => {
                Self::MultiColumn(MultiColumnPresenter::new(deps, config.sidebar_hideable))
            }
            (PresentationMode::MultiColumn, DeviceClass::Phone) => {
                Self::Tabs(TabBarPresenter::new(TabVariant::SiteOnly, deps))
            }
        }
    }

    pub fn kind(&self) -> PresenterKind {
        match self {
            Self::Tabs(p) => match p.variant() {
                TabVariant::Full => PresenterKind::TabBar,
                TabVariant::StaticScreens => PresenterKind::StaticTabBar,
                TabVariant::SiteOnly => PresenterKind::Simplified,
            },
            Self::MultiColumn(_) => PresenterKind::MultiColumn,
        }
    }

    pub fn capabilities(&self) -> Capabilities {
        match self {
            Self::Tabs(p) => p.capabilities(),
            Self::MultiColumn(p) => p.capabilities(),
        }
    }

    /// Root screen to install in the window.
    pub fn root_screen(&self) -> &Screen {
        match self {
            Self::Tabs(p) => p.root_screen(),
            Self::MultiColumn(p) => p.root_screen(),
        }
    }

    pub fn current_site(&self) -> Option<SiteId> {
        match self {
            Self::Tabs(p) => p.current_site(),
            Self::MultiColumn(p) => p.current_site(),
        }
    }

    pub fn top_screen(&self) -> Option<&Screen> {
        match self {
            Self::Tabs(p) => p.top_screen(),
            Self::MultiColumn(p) => p.top_screen(),
        }
    }

    pub fn show_reader(&mut self, section: ReaderSection) -> Dispatch {
        match self {
            Self::Tabs(p) => p.show_reader(section),
            Self::MultiColumn(p) => p.show_reader(section),
        }
    }

    pub fn switch_to_discover(&mut self) -> Dispatch {
        match self {
            Self::Tabs(p) => p.switch_to_discover(),
            Self::MultiColumn(p) => p.switch_to_discover(),
        }
    }

    pub fn show_site(&mut self, site: SiteId) -> Dispatch {
        match self {
            Self::Tabs(p) => p.show_site(site),
            Self::MultiColumn(p) => p.show_site(site),
        }
    }

    pub fn show_notifications(&mut self) -> Dispatch {
        match self {
            Self::Tabs(p) => p.show_notifications(),
            Self::MultiColumn(p) => p.show_notifications(),
        }
    }

    pub fn show_notification(&mut self, note: NotificationId) -> Dispatch {
        match self {
            Self::Tabs(p) => p.show_notification(note),
            Self::MultiColumn(p) => p.show_notification(note),
        }
    }

    /// Show Profile/Me and return the Me screen.
    pub fn show_me(&mut self, animated: bool) -> Option<Screen> {
        match self {
            Self::Tabs(p) => p.show_me(animated),
            Self::MultiColumn(p) => p.show_me(animated),
        }
    }

    /// Push a new screen of `kind` onto the topmost stack.
    pub fn push_screen(&mut self, kind: ScreenKind, animated: bool) -> Option<Screen> {
        match self {
            Self::Tabs(p) => p.push_screen(kind, animated),
            Self::MultiColumn(p) => p.push_screen(kind, animated),
        }
    }

    pub fn pop(&mut self) -> Option<Screen> {
        match self {
            Self::Tabs(p) => p.pop(),
            Self::MultiColumn(p) => p.pop(),
        }
    }

    pub fn navigate(&mut self, target: &DeepLinkTarget) -> Dispatch {
        match self {
            Self::Tabs(p) => p.navigate(target),
            Self::MultiColumn(p) => p.navigate(target),
        }
    }

    pub fn on_site_deleted(&mut self, site: SiteId) -> Vec<PresenterRequest> {
        match self {
            Self::Tabs(p) => p.on_site_deleted(site),
            Self::MultiColumn(p) => p.on_site_deleted(site),
        }
    }

    pub fn sync_domain_changes(&mut self) -> Vec<PresenterRequest> {
        match self {
            Self::Tabs(p) => p.sync_domain_changes(),
            Self::MultiColumn(p) => p.sync_domain_changes(),
        }
    }

    pub fn violations(&self) -> &[ContractViolation] {
        match self {
            Self::Tabs(_) => &[],
            Self::MultiColumn(p) => p.violations(),
        }
    }

    pub fn as_multi_column(&self) -> Option<&MultiColumnPresenter> {
        match self {
            Self::MultiColumn(p) => Some(p),
            Self::Tabs(_) => None,
        }
    }

    pub fn as_multi_column_mut(&mut self) -> Option<&mut MultiColumnPresenter> {
        match self {
            Self::MultiColumn(p) => Some(p),
            Self::Tabs(_) => None,
        }
    }

    pub fn as_tabs(&self) -> Option<&TabBarPresenter> {
        match self {
            Self::Tabs(p) => Some(p),
            Self::MultiColumn(_) => None,
        }
    }
}
