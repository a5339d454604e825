//! Single-stack tab presenters.
//!
//! One type covers the full tab bar, the static-screens variant (Reader and
//! Notifications replaced by static notices) and the simplified site-only
//! variant used when multi-column is resolved on a phone.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{Capabilities, Dispatch, PresenterDeps, PresenterRequest};
use crate::deep_link::DeepLinkTarget;
use crate::domain::{DomainChange, NotificationId, ReaderSection, SiteId};
use crate::screen::{NavigationStack, Screen, ScreenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    MySite,
    Reader,
    Notifications,
    Me,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabVariant {
    /// All tabs with live content.
    Full,
    /// Reader and Notifications show static notices.
    StaticScreens,
    /// Only the site tab; Me is pushed on the site stack.
    SiteOnly,
}

impl TabVariant {
    pub fn tabs(self) -> &'static [Tab] {
        match self {
            Self::Full | Self::StaticScreens => &[Tab::MySite, Tab::Reader, Tab::Notifications, Tab::Me],
            Self::SiteOnly => &[Tab::MySite],
        }
    }
}

pub struct TabBarPresenter {
    variant: TabVariant,
    root: Screen,
    tabs: BTreeMap<Tab, NavigationStack>,
    selected: Tab,
    current_site: Option<SiteId>,
    deps: PresenterDeps,
    changes: broadcast::Receiver<DomainChange>,
}

impl TabBarPresenter {
    pub fn new(variant: TabVariant, deps: PresenterDeps) -> Self {
        let root = deps.screens.make(ScreenKind::TabBarContainer);
        let changes = deps.store.changes();
        let current_site = deps.store.sites().first().copied();
        let mut presenter = Self {
            variant,
            root,
            tabs: BTreeMap::new(),
            selected: Tab::MySite,
            current_site,
            deps,
            changes,
        };
        for tab in variant.tabs() {
            let screen = presenter.tab_root(*tab);
            presenter
                .tabs
                .insert(*tab, NavigationStack::with_root(screen));
        }
        presenter
    }

    fn tab_root(&self, tab: Tab) -> Screen {
        let kind = match (tab, self.variant) {
            (Tab::MySite, _) => self.site_root_kind(),
            (Tab::Reader, TabVariant::StaticScreens) => ScreenKind::StaticNotice {
                feature: "reader".to_string(),
            },
            (Tab::Reader, _) => ScreenKind::ReaderStream {
                section: ReaderSection::Subscriptions,
            },
            (Tab::Notifications, TabVariant::StaticScreens) => ScreenKind::StaticNotice {
                feature: "notifications".to_string(),
            },
            (Tab::Notifications, _) => ScreenKind::NotificationsList,
            (Tab::Me, _) => ScreenKind::Me,
        };
        self.deps.screens.make(kind)
    }

    fn site_root_kind(&self) -> ScreenKind {
        match self.current_site {
            Some(site) => ScreenKind::SiteMenu { site },
            None => ScreenKind::Welcome,
        }
    }

    pub fn variant(&self) -> TabVariant {
        self.variant
    }

    pub fn capabilities(&self) -> Capabilities {
        match self.variant {
            TabVariant::Full => Capabilities {
                reader: true,
                discover: true,
                notifications: true,
                me: true,
                sidebar: false,
            },
            TabVariant::StaticScreens => Capabilities {
                reader: true,
                discover: false,
                notifications: true,
                me: true,
                sidebar: false,
            },
            TabVariant::SiteOnly => Capabilities {
                reader: false,
                discover: false,
                notifications: false,
                me: true,
                sidebar: false,
            },
        }
    }

    pub fn root_screen(&self) -> &Screen {
        &self.root
    }

    pub fn current_site(&self) -> Option<SiteId> {
        self.current_site
    }

    pub fn selected_tab(&self) -> Tab {
        self.selected
    }

    pub fn stack(&self, tab: Tab) -> Option<&NavigationStack> {
        self.tabs.get(&tab)
    }

    pub fn top_screen(&self) -> Option<&Screen> {
        self.tabs.get(&self.selected).and_then(NavigationStack::top)
    }

    pub fn select_tab(&mut self, tab: Tab) -> Dispatch {
        if !self.tabs.contains_key(&tab) {
            debug!(?tab, variant = ?self.variant, "Tab not available");
            return Dispatch::Unsupported;
        }
        self.selected = tab;
        Dispatch::Handled
    }

    fn selected_stack(&mut self) -> Option<&mut NavigationStack> {
        self.tabs.get_mut(&self.selected)
    }

    pub fn show_reader(&mut self, section: ReaderSection) -> Dispatch {
        if self.select_tab(Tab::Reader) == Dispatch::Unsupported {
            return Dispatch::Unsupported;
        }
        if self.variant == TabVariant::StaticScreens {
            return Dispatch::Handled;
        }
        let kind = ScreenKind::ReaderStream { section };
        let needs_root = self
            .tabs
            .get(&Tab::Reader)
            .and_then(NavigationStack::root)
            .map_or(true, |root| !root.is(&kind));
        let fresh = needs_root.then(|| self.deps.screens.make(kind));
        if let Some(stack) = self.selected_stack() {
            match fresh {
                Some(root) => stack.reset(root),
                None => stack.pop_to_root(),
            }
        }
        Dispatch::Handled
    }

    pub fn switch_to_discover(&mut self) -> Dispatch {
        if !self.capabilities().discover {
            debug!(variant = ?self.variant, "Discover not available");
            return Dispatch::Unsupported;
        }
        self.show_reader(ReaderSection::Discover)
    }

    pub fn show_site(&mut self, site: SiteId) -> Dispatch {
        self.selected = Tab::MySite;
        let kind = if self.deps.store.site_exists(site) {
            self.current_site = Some(site);
            ScreenKind::SiteMenu { site }
        } else {
            info!(%site, "Site lookup failed, showing placeholder");
            ScreenKind::Unavailable
        };
        let already_shown = self
            .tabs
            .get(&Tab::MySite)
            .and_then(NavigationStack::root)
            .is_some_and(|root| root.is(&kind));
        if already_shown {
            self.land_on_root();
        } else {
            let screen = self.deps.screens.make(kind);
            if let Some(stack) = self.selected_stack() {
                stack.reset(screen);
            }
        }
        Dispatch::Handled
    }

    pub fn show_notifications(&mut self) -> Dispatch {
        if self.select_tab(Tab::Notifications) == Dispatch::Unsupported {
            return Dispatch::Unsupported;
        }
        self.land_on_root();
        Dispatch::Handled
    }

    pub fn show_notification(&mut self, note: NotificationId) -> Dispatch {
        if self.show_notifications() == Dispatch::Unsupported {
            return Dispatch::Unsupported;
        }
        if self.variant == TabVariant::Full && self.deps.store.notification_exists(note) {
            self.push_screen(ScreenKind::NotificationDetail { note }, false);
        }
        Dispatch::Handled
    }

    /// Select Me, or push it on the site stack in the site-only variant.
    pub fn show_me(&mut self, animated: bool) -> Option<Screen> {
        if self.select_tab(Tab::Me) == Dispatch::Handled {
            self.land_on_root();
            return self.top_screen().cloned();
        }
        self.selected = Tab::MySite;
        let shown = self
            .top_screen()
            .filter(|top| top.is(&ScreenKind::Me))
            .cloned();
        if shown.is_some() {
            return shown;
        }
        self.push_screen(ScreenKind::Me, animated)
    }

    pub fn push_screen(&mut self, kind: ScreenKind, animated: bool) -> Option<Screen> {
        let screen = self.deps.screens.make(kind);
        debug!(screen = %screen, tab = ?self.selected, animated, "Push");
        let stack = self.selected_stack()?;
        stack.push(screen.clone());
        Some(screen)
    }

    pub fn pop(&mut self) -> Option<Screen> {
        self.selected_stack()?.pop()
    }

    fn land_on_root(&mut self) {
        if let Some(stack) = self.selected_stack() {
            stack.pop_to_root();
        }
    }

    pub fn navigate(&mut self, target: &DeepLinkTarget) -> Dispatch {
        info!(target = %target, variant = ?self.variant, "Deep link");
        match target {
            DeepLinkTarget::Post { site, post } => {
                let dispatch = self.show_reader(ReaderSection::Subscriptions);
                if dispatch == Dispatch::Handled
                    && self.variant == TabVariant::Full
                    && self.deps.store.post_exists(*site, *post)
                {
                    self.push_screen(
                        ScreenKind::ReaderPost {
                            site: *site,
                            post: *post,
                        },
                        false,
                    );
                }
                dispatch
            }
            DeepLinkTarget::Tag { slug } => self.show_reader(ReaderSection::Tag(slug.clone())),
            DeepLinkTarget::Search { query } => {
                let dispatch = self.show_reader(ReaderSection::Search);
                if dispatch == Dispatch::Handled && self.variant == TabVariant::Full {
                    if let Some(query) = query {
                        self.push_screen(
                            ScreenKind::ReaderSearchResults {
                                query: query.clone(),
                            },
                            false,
                        );
                    }
                }
                dispatch
            }
            DeepLinkTarget::Site { site } => {
                if self.deps.store.site_exists(*site) {
                    self.show_site(*site)
                } else {
                    debug!(%site, "Site not found, landing on site root");
                    self.selected = Tab::MySite;
                    self.land_on_root();
                    Dispatch::Handled
                }
            }
            DeepLinkTarget::Notification { note } => self.show_notification(*note),
        }
    }

    pub fn on_site_deleted(&mut self, site: SiteId) -> Vec<PresenterRequest> {
        if self.current_site != Some(site) {
            return Vec::new();
        }
        let replacement = self.deps.store.next_site(site);
        info!(%site, replacement = ?replacement, "Displayed site deleted");
        self.current_site = replacement;
        let root = self.deps.screens.make(self.site_root_kind());
        if let Some(stack) = self.tabs.get_mut(&Tab::MySite) {
            stack.reset(root);
        }
        match replacement {
            Some(_) => Vec::new(),
            None => vec![PresenterRequest::SignIn],
        }
    }

    pub fn sync_domain_changes(&mut self) -> Vec<PresenterRequest> {
        let mut requests = Vec::new();
        loop {
            match self.changes.try_recv() {
                Ok(DomainChange::SiteDeleted { site }) => {
                    requests.extend(self.on_site_deleted(site));
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Deletion feed lagged, re-checking current site");
                    if let Some(site) = self.current_site {
                        if !self.deps.store.site_exists(site) {
                            requests.extend(self.on_site_deleted(site));
                        }
                    }
                }
                Err(_) => break,
            }
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InMemoryDomainStore, PostId};
    use crate::screen::SequentialScreenFactory;
    use std::rc::Rc;

    fn tab_bar(variant: TabVariant, store: InMemoryDomainStore) -> (TabBarPresenter, Rc<InMemoryDomainStore>) {
        let store = Rc::new(store);
        let deps = PresenterDeps {
            screens: Rc::new(SequentialScreenFactory::new()),
            store: store.clone(),
        };
        (TabBarPresenter::new(variant, deps), store)
    }

    #[test]
    fn test_site_only_has_a_single_tab() {
        let (mut p, _) = tab_bar(TabVariant::SiteOnly, InMemoryDomainStore::new([SiteId(1)]));
        assert_eq!(p.show_reader(ReaderSection::Saved), Dispatch::Unsupported);
        assert_eq!(p.show_notifications(), Dispatch::Unsupported);
        assert_eq!(p.switch_to_discover(), Dispatch::Unsupported);
        assert_eq!(p.selected_tab(), Tab::MySite);

        // Me lands on the site stack, once
        let me = p.show_me(true).unwrap();
        assert_eq!(p.show_me(true), Some(me));
        assert_eq!(p.stack(Tab::MySite).unwrap().len(), 2);
    }

    #[test]
    fn test_static_screens_show_notices() {
        let (mut p, _) = tab_bar(
            TabVariant::StaticScreens,
            InMemoryDomainStore::new([SiteId(1)]),
        );
        assert_eq!(p.switch_to_discover(), Dispatch::Unsupported);
        assert_eq!(p.show_reader(ReaderSection::Saved), Dispatch::Handled);
        assert_eq!(
            p.top_screen().unwrap().kind,
            ScreenKind::StaticNotice {
                feature: "reader".into()
            }
        );
    }

    #[test]
    fn test_reader_section_switch_resets_stack() {
        let store = InMemoryDomainStore::new([SiteId(1)]).with_post(SiteId(1), PostId(2));
        let (mut p, _) = tab_bar(TabVariant::Full, store);

        p.navigate(&DeepLinkTarget::Post {
            site: SiteId(1),
            post: PostId(2),
        });
        assert_eq!(p.stack(Tab::Reader).unwrap().len(), 2);

        p.switch_to_discover();
        let stack = p.stack(Tab::Reader).unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(
            stack.root().unwrap().kind,
            ScreenKind::ReaderStream {
                section: ReaderSection::Discover
            }
        );
    }

    #[test]
    fn test_deleting_last_site_requests_sign_in() {
        let (mut p, store) = tab_bar(TabVariant::Full, InMemoryDomainStore::new([SiteId(1)]));
        store.delete_site(SiteId(1));
        assert_eq!(p.sync_domain_changes(), vec![PresenterRequest::SignIn]);
        assert_eq!(p.current_site(), None);
        assert_eq!(
            p.stack(Tab::MySite).unwrap().root().unwrap().kind,
            ScreenKind::Welcome
        );
    }

    #[test]
    fn test_unknown_site_link_lands_on_site_root() {
        let (mut p, _) = tab_bar(TabVariant::Full, InMemoryDomainStore::new([SiteId(1)]));
        p.select_tab(Tab::Reader);
        assert_eq!(
            p.navigate(&DeepLinkTarget::Site { site: SiteId(9) }),
            Dispatch::Handled
        );
        assert_eq!(p.selected_tab(), Tab::MySite);
        assert_eq!(p.current_site(), Some(SiteId(1)));
    }
}
