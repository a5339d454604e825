//! Multi-column presenter: persistent sidebar + list + detail.
//!
//! Every selection change, layout change and deletion goes through the
//! [`SelectionMachine`]; this type only applies the effects it returns. The
//! live content's stacks sit in [`Columns`], everything else is retained in
//! the [`ContentSlotRegistry`].

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{Capabilities, Dispatch, PresenterDeps, PresenterRequest};
use crate::deep_link::DeepLinkTarget;
use crate::domain::{DomainChange, NotificationId, ReaderSection, SiteId};
use crate::error::{report, ContractViolation};
use crate::screen::{NavigationStack, Screen, ScreenKind};
use crate::selection::{
    SelectionEvent, SelectionMachine, SelectionState, SidebarSelection, SlotEffect,
    TransitionRecord,
};
use crate::slots::{ColumnLayout, Columns, ContentEntry, ContentKey, ContentSlotRegistry};

pub struct MultiColumnPresenter {
    root: Screen,
    sidebar: Screen,
    sidebar_visible: bool,
    machine: SelectionMachine,
    registry: ContentSlotRegistry,
    columns: Columns,
    /// Profile/Me is presented modally over the split container.
    modal: Option<NavigationStack>,
    sidebar_syncs: Vec<SidebarSelection>,
    deps: PresenterDeps,
    changes: broadcast::Receiver<DomainChange>,
    violations: Vec<ContractViolation>,
}

impl MultiColumnPresenter {
    /// Build the presenter and select the initial destination: the first
    /// site, or Welcome when the account has none.
    pub fn new(deps: PresenterDeps, sidebar_hideable: bool) -> Self {
        let root = deps.screens.make(ScreenKind::SplitContainer);
        let sidebar = deps.screens.make(ScreenKind::Sidebar);
        let changes = deps.store.changes();
        let mut presenter = Self {
            root,
            sidebar,
            sidebar_visible: true,
            machine: SelectionMachine::new(ColumnLayout::Expanded, sidebar_hideable),
            registry: ContentSlotRegistry::new(),
            columns: Columns::new(ColumnLayout::Expanded),
            modal: None,
            sidebar_syncs: Vec::new(),
            deps,
            changes,
            violations: Vec::new(),
        };
        let initial = match presenter.deps.store.sites().first() {
            Some(site) => SidebarSelection::Site { site: *site },
            None => SidebarSelection::Welcome,
        };
        presenter.select(initial);
        presenter
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            reader: true,
            discover: true,
            notifications: true,
            me: true,
            sidebar: true,
        }
    }

    pub fn root_screen(&self) -> &Screen {
        &self.root
    }

    pub fn sidebar_screen(&self) -> &Screen {
        &self.sidebar
    }

    pub fn is_sidebar_visible(&self) -> bool {
        self.sidebar_visible
    }

    pub fn state(&self) -> &SelectionState {
        self.machine.state()
    }

    pub fn selection(&self) -> &SidebarSelection {
        &self.machine.state().selection
    }

    pub fn displayed(&self) -> Option<&ContentKey> {
        self.machine.state().displayed.as_ref()
    }

    pub fn layout(&self) -> ColumnLayout {
        self.machine.state().layout
    }

    /// Site shown in the columns. `None` when a placeholder stands in for a
    /// site that could not be resolved.
    pub fn current_site(&self) -> Option<SiteId> {
        let site = self.displayed().and_then(ContentKey::site_id)?;
        let placeholder = self
            .columns
            .list_root()
            .is_some_and(|root| root.is(&ScreenKind::Unavailable));
        (!placeholder).then_some(site)
    }

    pub fn registry(&self) -> &ContentSlotRegistry {
        &self.registry
    }

    pub fn entry(&self, key: &ContentKey) -> Option<&ContentEntry> {
        self.registry.get(key)
    }

    /// List and detail stacks of a destination, whether it is live or
    /// retained.
    pub fn content_stacks(&self, key: &ContentKey) -> Option<(NavigationStack, NavigationStack)> {
        if self.registry.live() == Some(key) {
            return Some(self.columns.snapshot());
        }
        self.registry
            .get(key)
            .map(|entry| (entry.list().clone(), entry.detail().clone()))
    }

    pub fn modal(&self) -> Option<&NavigationStack> {
        self.modal.as_ref()
    }

    /// Sidebar rows highlighted from the display side, oldest first.
    pub fn sidebar_syncs(&self) -> &[SidebarSelection] {
        &self.sidebar_syncs
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        self.machine.transitions()
    }

    /// One-line selection history, for logs and the shell.
    pub fn selection_summary(&self) -> String {
        self.machine.summary()
    }

    pub fn violations(&self) -> &[ContractViolation] {
        &self.violations
    }

    /// Topmost visible screen.
    pub fn top_screen(&self) -> Option<&Screen> {
        match &self.modal {
            Some(modal) => modal.top(),
            None => self.columns.top(),
        }
    }

    pub fn set_sidebar_hideable(&mut self, hideable: bool) {
        self.machine.set_sidebar_hideable(hideable);
    }

    /// Sidebar selection changed.
    pub fn select(&mut self, selection: SidebarSelection) -> Vec<PresenterRequest> {
        self.dispatch(SelectionEvent::select(selection))
    }

    /// Layout became collapsed (narrow size class).
    pub fn collapse(&mut self) {
        self.dispatch(SelectionEvent::Collapse);
    }

    /// Layout became expanded; the sidebar reappears.
    pub fn expand(&mut self) {
        self.dispatch(SelectionEvent::Expand);
    }

    /// Show a destination from outside the sidebar. While collapsed this only
    /// changes what is displayed; the sidebar catches up on expand.
    fn route(&mut self, selection: SidebarSelection) {
        let event = match self.layout() {
            ColumnLayout::Collapsed => SelectionEvent::ContentDisplayed { selection },
            ColumnLayout::Expanded => SelectionEvent::select(selection),
        };
        self.dispatch(event);
    }

    pub fn show_reader(&mut self, section: ReaderSection) -> Dispatch {
        self.route(SidebarSelection::Reader { section });
        Dispatch::Handled
    }

    pub fn switch_to_discover(&mut self) -> Dispatch {
        self.show_reader(ReaderSection::Discover)
    }

    pub fn show_site(&mut self, site: SiteId) -> Dispatch {
        self.route(SidebarSelection::Site { site });
        Dispatch::Handled
    }

    pub fn show_notifications(&mut self) -> Dispatch {
        self.route(SidebarSelection::Notifications);
        Dispatch::Handled
    }

    pub fn show_notification(&mut self, note: NotificationId) -> Dispatch {
        self.route(SidebarSelection::Notifications);
        self.land_on_notification(note);
        Dispatch::Handled
    }

    /// Present Profile/Me modally and return it.
    pub fn show_me(&mut self, animated: bool) -> Option<Screen> {
        let me = self.deps.screens.make(ScreenKind::Me);
        debug!(screen = %me, animated, "Presenting Me");
        self.modal = Some(NavigationStack::with_root(me.clone()));
        Some(me)
    }

    fn dismiss_modal(&mut self) {
        if self.modal.take().is_some() {
            debug!("Modal dismissed");
        }
    }

    /// Push a new screen onto the topmost stack: the modal when one is
    /// presented, the detail column otherwise.
    pub fn push_screen(&mut self, kind: ScreenKind, animated: bool) -> Option<Screen> {
        if self.modal.is_none() && self.displayed().is_none() {
            report(
                &mut self.violations,
                ContractViolation::MissingDetailContainer {
                    operation: "push_screen".to_string(),
                },
            );
            return None;
        }
        let screen = self.deps.screens.make(kind);
        debug!(screen = %screen, animated, "Push");
        match &mut self.modal {
            Some(modal) => modal.push(screen.clone()),
            None => self.columns.push_detail(screen.clone()),
        }
        Some(screen)
    }

    /// Drill down in the list column of the displayed content.
    pub fn push_list_screen(&mut self, kind: ScreenKind) -> Option<Screen> {
        if self.displayed().is_none() {
            report(
                &mut self.violations,
                ContractViolation::MissingDetailContainer {
                    operation: "push_list_screen".to_string(),
                },
            );
            return None;
        }
        let screen = self.deps.screens.make(kind);
        self.columns.push_list(screen.clone());
        Some(screen)
    }

    /// Back navigation on the topmost stack.
    pub fn pop(&mut self) -> Option<Screen> {
        match &mut self.modal {
            Some(modal) => modal.pop(),
            None => self.columns.pop(),
        }
    }

    /// Resolve a deep link into a destination plus sub-navigation.
    ///
    /// Never fails: unresolvable targets land on the destination root.
    pub fn navigate(&mut self, target: &DeepLinkTarget) -> Dispatch {
        info!(target = %target, destination = ?target.destination(), "Deep link");
        self.dismiss_modal();
        if let Some(section) = target.reader_section() {
            self.select(SidebarSelection::Reader { section });
        }
        match target {
            DeepLinkTarget::Post { site, post } => {
                if self.deps.store.post_exists(*site, *post) {
                    let screen = self.deps.screens.make(ScreenKind::ReaderPost {
                        site: *site,
                        post: *post,
                    });
                    self.columns.show_detail(screen);
                } else {
                    debug!(%site, %post, "Post not found, landing on reader root");
                    self.columns.pop_list_to_root();
                }
            }
            DeepLinkTarget::Tag { .. } => self.columns.pop_list_to_root(),
            DeepLinkTarget::Search { query } => {
                self.columns.pop_list_to_root();
                if let Some(query) = query {
                    let results = self
                        .deps
                        .screens
                        .make(ScreenKind::ReaderSearchResults {
                            query: query.clone(),
                        });
                    self.columns.push_list(results);
                }
            }
            DeepLinkTarget::Site { site } => {
                let selection = if self.deps.store.site_exists(*site) {
                    SidebarSelection::Site { site: *site }
                } else {
                    debug!(%site, "Site not found, landing on site root");
                    self.site_root()
                };
                self.select(selection);
                self.columns.pop_list_to_root();
            }
            DeepLinkTarget::Notification { note } => {
                self.select(SidebarSelection::Notifications);
                self.land_on_notification(*note);
            }
        }
        Dispatch::Handled
    }

    /// React to a deleted site.
    pub fn on_site_deleted(&mut self, site: SiteId) -> Vec<PresenterRequest> {
        let replacement = self.deps.store.next_site(site);
        if self.current_site() == Some(site) {
            info!(%site, replacement = ?replacement, "Displayed site deleted");
        }
        self.dispatch(SelectionEvent::SiteDeleted { site, replacement })
    }

    /// Drain the domain store's deletion feed.
    pub fn sync_domain_changes(&mut self) -> Vec<PresenterRequest> {
        let mut requests = Vec::new();
        loop {
            match self.changes.try_recv() {
                Ok(DomainChange::SiteDeleted { site }) => {
                    requests.extend(self.on_site_deleted(site));
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Deletion feed lagged, re-checking displayed site");
                    if let Some(site) = self.current_site() {
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

    /// Point the Reader list at `section`'s stream. A list already rooted
    /// there keeps its stack.
    fn switch_reader_section(&mut self, section: &ReaderSection) {
        let stream = ScreenKind::ReaderStream {
            section: section.clone(),
        };
        if self
            .columns
            .list_root()
            .is_some_and(|root| root.is(&stream))
        {
            return;
        }
        debug!(%section, "Reader section changed");
        let root = self.deps.screens.make(stream);
        self.columns.reset_list(root);
    }

    fn land_on_notification(&mut self, note: NotificationId) {
        self.columns.pop_list_to_root();
        if self.deps.store.notification_exists(note) {
            let detail = self
                .deps
                .screens
                .make(ScreenKind::NotificationDetail { note });
            self.columns.show_detail(detail);
        } else {
            debug!(%note, "Notification not found, landing on notifications root");
        }
    }

    /// Root of the Site destination: the shown site, else the first site,
    /// else Welcome.
    fn site_root(&self) -> SidebarSelection {
        if let Some(site) = self.current_site() {
            return SidebarSelection::Site { site };
        }
        match self.deps.store.sites().first() {
            Some(site) => SidebarSelection::Site { site: *site },
            None => SidebarSelection::Welcome,
        }
    }

    fn dispatch(&mut self, event: SelectionEvent) -> Vec<PresenterRequest> {
        let effects = self.machine.dispatch(&event);
        let requests = self.apply(effects);
        if self.displayed() == Some(&ContentKey::Reader) {
            let section = self.machine.state().reader_section.clone();
            self.switch_reader_section(&section);
        }
        requests
    }

    fn apply(&mut self, effects: Vec<SlotEffect>) -> Vec<PresenterRequest> {
        let mut requests = Vec::new();
        for effect in effects {
            match effect {
                SlotEffect::Capture { key } => {
                    let (list, detail) = self.columns.take();
                    if let Err(violation) = self.registry.capture(&key, list, detail) {
                        report(&mut self.violations, violation);
                    }
                }
                SlotEffect::Display { key } => {
                    let deps = &self.deps;
                    let section = &self.machine.state().reader_section;
                    self.registry
                        .ensure_with(&key, |k| materialize(deps, k, section));
                    match self.registry.restore(&key) {
                        Ok((list, detail)) => self.columns.install(list, detail),
                        Err(violation) => report(&mut self.violations, violation),
                    }
                    self.dismiss_modal();
                }
                SlotEffect::ClearColumns => {
                    self.columns.clear();
                    self.dismiss_modal();
                }
                SlotEffect::HideSidebar => self.sidebar_visible = false,
                SlotEffect::MergeColumns => self.columns.collapse(),
                SlotEffect::SplitColumns => {
                    self.columns.expand();
                    self.sidebar_visible = true;
                }
                SlotEffect::SyncSidebar { selection } => {
                    debug!(selection = %selection, "Sidebar synced from display");
                    self.sidebar_syncs.push(selection);
                }
                SlotEffect::Discard { key } => {
                    if self.registry.remove(&key) {
                        self.columns.clear();
                    }
                }
                SlotEffect::RequestSignIn => {
                    info!("No sites left, handing off to sign-in");
                    requests.push(PresenterRequest::SignIn);
                }
            }
        }
        requests
    }
}

/// Build the initial stacks of a destination.
fn materialize(deps: &PresenterDeps, key: &ContentKey, section: &ReaderSection) -> ContentEntry {
    let screens = deps.screens.as_ref();
    let (list, detail) = match key {
        ContentKey::Site { site } => {
            if deps.store.site_exists(*site) {
                (
                    NavigationStack::with_root(screens.make(ScreenKind::SiteMenu { site: *site })),
                    NavigationStack::with_root(
                        screens.make(ScreenKind::SiteDashboard { site: *site }),
                    ),
                )
            } else {
                info!(%site, "Site lookup failed, showing placeholder");
                (
                    NavigationStack::with_root(screens.make(ScreenKind::Unavailable)),
                    NavigationStack::new(),
                )
            }
        }
        ContentKey::Notifications => (
            NavigationStack::with_root(screens.make(ScreenKind::NotificationsList)),
            NavigationStack::new(),
        ),
        ContentKey::Reader => (
            NavigationStack::with_root(screens.make(ScreenKind::ReaderStream {
                section: section.clone(),
            })),
            NavigationStack::new(),
        ),
        ContentKey::Welcome => (
            NavigationStack::with_root(screens.make(ScreenKind::Welcome)),
            NavigationStack::new(),
        ),
    };
    ContentEntry::new(key.clone(), list, detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InMemoryDomainStore, PostId};
    use std::rc::Rc;
    use crate::screen::SequentialScreenFactory;

    fn presenter(sites: &[u64]) -> (MultiColumnPresenter, Rc<InMemoryDomainStore>) {
        let store = Rc::new(InMemoryDomainStore::new(sites.iter().map(|s| SiteId(*s))));
        let deps = PresenterDeps {
            screens: Rc::new(SequentialScreenFactory::new()),
            store: store.clone(),
        };
        (MultiColumnPresenter::new(deps, true), store)
    }

    #[test]
    fn test_initial_selection_is_first_site() {
        let (p, _) = presenter(&[3, 4]);
        assert_eq!(p.selection(), &SidebarSelection::Site { site: SiteId(3) });
        assert_eq!(p.current_site(), Some(SiteId(3)));
        assert!(!p.is_sidebar_visible());
    }

    #[test]
    fn test_initial_selection_without_sites_is_welcome() {
        let (p, _) = presenter(&[]);
        assert_eq!(p.selection(), &SidebarSelection::Welcome);
        assert_eq!(p.top_screen().unwrap().kind, ScreenKind::Welcome);
    }

    #[test]
    fn test_unknown_site_degrades_to_placeholder() {
        let (mut p, _) = presenter(&[1]);
        p.show_site(SiteId(99));
        let (list, detail) = p.content_stacks(&ContentKey::site(SiteId(99))).unwrap();
        assert_eq!(list.root().unwrap().kind, ScreenKind::Unavailable);
        assert!(detail.is_empty());
        assert!(p.violations().is_empty());
    }

    #[test]
    fn test_push_without_content_is_violation() {
        let (mut p, _) = presenter(&[1]);
        p.select(SidebarSelection::Empty);
        assert!(p.push_screen(ScreenKind::AppSettings, false).is_none());
        assert_eq!(p.violations().len(), 1);
    }

    #[test]
    fn test_me_is_modal_and_dismissed_by_selection_change() {
        let (mut p, _) = presenter(&[1]);
        let me = p.show_me(true).unwrap();
        let settings = p.push_screen(ScreenKind::AppSettings, true).unwrap();
        assert_eq!(p.modal().unwrap().ids(), vec![me.id, settings.id]);
        assert_eq!(p.top_screen(), Some(&settings));

        p.select(SidebarSelection::Notifications);
        assert!(p.modal().is_none());
    }

    #[test]
    fn test_post_deep_link_shows_detail() {
        let store = Rc::new(
            InMemoryDomainStore::new([SiteId(1)]).with_post(SiteId(1), PostId(5)),
        );
        let deps = PresenterDeps {
            screens: Rc::new(SequentialScreenFactory::new()),
            store,
        };
        let mut p = MultiColumnPresenter::new(deps, true);

        p.navigate(&DeepLinkTarget::Post {
            site: SiteId(1),
            post: PostId(5),
        });
        assert_eq!(
            p.selection(),
            &SidebarSelection::Reader {
                section: ReaderSection::Subscriptions
            }
        );
        assert_eq!(
            p.top_screen().unwrap().kind,
            ScreenKind::ReaderPost {
                site: SiteId(1),
                post: PostId(5)
            }
        );
    }

    #[test]
    fn test_unresolvable_post_lands_on_reader_root() {
        let (mut p, _) = presenter(&[1]);
        p.navigate(&DeepLinkTarget::Post {
            site: SiteId(1),
            post: PostId(404),
        });
        assert_eq!(
            p.top_screen().unwrap().kind,
            ScreenKind::ReaderStream {
                section: ReaderSection::Subscriptions
            }
        );
    }

    #[test]
    fn test_search_deep_link_pushes_results() {
        let (mut p, _) = presenter(&[1]);
        p.navigate(&DeepLinkTarget::Search {
            query: Some("rust".into()),
        });
        let (list, _) = p.content_stacks(&ContentKey::Reader).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(
            list.root().unwrap().kind,
            ScreenKind::ReaderStream {
                section: ReaderSection::Search
            }
        );
        assert_eq!(
            list.top().unwrap().kind,
            ScreenKind::ReaderSearchResults {
                query: "rust".into()
            }
        );

        // Same link again does not stack a second results screen
        p.navigate(&DeepLinkTarget::Search {
            query: Some("rust".into()),
        });
        let (list, _) = p.content_stacks(&ContentKey::Reader).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_reader_links_share_one_registry_entry() {
        let (mut p, _) = presenter(&[1]);
        for slug in ["rust", "tokio", "serde", "tracing"] {
            p.navigate(&DeepLinkTarget::Tag { slug: slug.into() });
        }
        p.navigate(&DeepLinkTarget::Search {
            query: Some("async".into()),
        });
        p.navigate(&DeepLinkTarget::Post {
            site: SiteId(1),
            post: PostId(404),
        });
        p.show_reader(ReaderSection::Discover);

        // Site 1 plus the single Reader entry
        assert_eq!(p.registry().len(), 2);
        let (list, detail) = p.content_stacks(&ContentKey::Reader).unwrap();
        assert_eq!(list.len(), 1);
        assert!(detail.is_empty());
        assert_eq!(
            list.root().unwrap().kind,
            ScreenKind::ReaderStream {
                section: ReaderSection::Discover
            }
        );
    }

    #[test]
    fn test_reader_section_survives_leaving_and_returning() {
        let (mut p, _) = presenter(&[1]);
        p.navigate(&DeepLinkTarget::Tag {
            slug: "rust".into(),
        });
        p.select(SidebarSelection::Notifications);
        p.select(SidebarSelection::Reader {
            section: ReaderSection::Tag("rust".into()),
        });
        assert_eq!(
            p.top_screen().unwrap().kind,
            ScreenKind::ReaderStream {
                section: ReaderSection::Tag("rust".into())
            }
        );
    }

    #[test]
    fn test_last_site_deletion_dismisses_me() {
        let (mut p, store) = presenter(&[1]);
        p.show_me(false);
        store.delete_site(SiteId(1));
        let requests = p.sync_domain_changes();
        assert_eq!(requests, vec![PresenterRequest::SignIn]);
        assert!(p.modal().is_none());
        assert!(p.top_screen().is_none());
    }

    #[test]
    fn test_placeholder_site_is_not_current() {
        let (mut p, _) = presenter(&[1]);
        p.show_site(SiteId(99));
        assert_eq!(p.displayed(), Some(&ContentKey::site(SiteId(99))));
        assert_eq!(p.current_site(), None);

        p.show_site(SiteId(1));
        assert_eq!(p.current_site(), Some(SiteId(1)));
    }

    #[test]
    fn test_sidebar_is_its_own_screen() {
        let (p, _) = presenter(&[1]);
        assert_eq!(p.sidebar_screen().kind, ScreenKind::Sidebar);
        assert_ne!(p.sidebar_screen().id, p.root_screen().id);
    }

    #[test]
    fn test_unknown_site_deep_link_lands_on_site_root() {
        let (mut p, _) = presenter(&[1, 2]);
        p.select(SidebarSelection::Notifications);
        p.navigate(&DeepLinkTarget::Site { site: SiteId(77) });
        assert_eq!(p.selection(), &SidebarSelection::Site { site: SiteId(1) });
    }

    #[test]
    fn test_deletion_feed_drives_reselection() {
        let (mut p, store) = presenter(&[1, 2]);
        store.delete_site(SiteId(1));
        let requests = p.sync_domain_changes();
        assert!(requests.is_empty());
        assert_eq!(p.selection(), &SidebarSelection::Site { site: SiteId(2) });
        assert!(p.entry(&ContentKey::site(SiteId(1))).is_none());
    }
}
