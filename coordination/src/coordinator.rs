//! Root coordinator
//!
//! Owns the live root presenter and the presentation mode it was built for.
//! All collaborators are injected; there is no process-wide instance.
//!
//! # Mode swap protocol
//!
//! ```text
//! reload_ui_if_needed
//!   resolve ── same mode ──▶ Unchanged (no rebuild, no window calls)
//!      │
//!      └─ new mode ─▶ show overlay ─▶ feature prompt (awaited)
//!                       ─▶ build presenter ─▶ window.show(root, Dip)
//!                       ─▶ drop old presenter ─▶ clear overlay
//!                       ─▶ publish UiTypeChanged
//! ```
//!
//! Events are serialized through [`RootCoordinator::run`]: a rebuild
//! completes before the next event is taken, so deep links arriving mid-swap
//! wait in the queue and are replayed against the new presenter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::rc::Rc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::chain::ChainOutcome;
use crate::config::CoordinatorConfig;
use crate::deep_link::DeepLinkTarget;
use crate::domain::{DomainStore, SiteId};
use crate::error::{report, ContractViolation};
use crate::events::{EventBus, SharedEventBus, UiEvent};
use crate::flows;
use crate::presenter::{Dispatch, PresenterDeps, PresenterRequest, RootPresenter};
use crate::rollout::{self, FlagStore, PresentationMode, ResolveTrigger};
use crate::screen::{Screen, ScreenFactory, ScreenKind};
use crate::selection::SidebarSelection;
use crate::slots::ColumnLayout;
use crate::window::{FeatureOverlay, Transition, WindowHost};

/// Everything the coordinator talks to.
pub struct Collaborators {
    pub flags: Rc<dyn FlagStore>,
    pub window: Box<dyn WindowHost>,
    pub overlay: Box<dyn FeatureOverlay>,
    pub screens: Rc<dyn ScreenFactory>,
    pub store: Rc<dyn DomainStore>,
}

/// Input to the coordinator's event loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// App returned to the foreground.
    Foreground,
    /// The flag store reported a change.
    FlagsChanged,
    /// A site was removed from the account.
    SiteDeleted { site: SiteId },
    DeepLink { target: DeepLinkTarget },
    /// Size class change of the multi-column layout.
    LayoutChanged { layout: ColumnLayout },
    /// User tapped a sidebar row.
    SidebarSelected { selection: SidebarSelection },
    OpenPrivacySettings,
}

impl AppEvent {
    /// Events whose only effect is a mode re-resolution; consecutive ones
    /// collapse into a single reload.
    fn reload_trigger(&self) -> Option<ResolveTrigger> {
        match self {
            Self::Foreground => Some(ResolveTrigger::Foreground),
            Self::FlagsChanged => Some(ResolveTrigger::FlagsChanged),
            _ => None,
        }
    }
}

/// Result of [`RootCoordinator::reload_ui_if_needed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReloadOutcome {
    /// No presenter yet; nothing to compare against.
    NotShown,
    Unchanged,
    Rebuilt {
        from: PresentationMode,
        to: PresentationMode,
        prompted: bool,
    },
}

/// A completed mode swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeChange {
    pub from: PresentationMode,
    pub to: PresentationMode,
    pub trigger: ResolveTrigger,
    pub prompted: bool,
    pub at: DateTime<Utc>,
}

/// Counters from one [`RootCoordinator::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub events: usize,
    /// Reload triggers folded into an earlier one.
    pub coalesced: usize,
    pub rebuilds: usize,
}

pub struct RootCoordinator {
    config: CoordinatorConfig,
    flags: Rc<dyn FlagStore>,
    window: Box<dyn WindowHost>,
    overlay: Box<dyn FeatureOverlay>,
    deps: PresenterDeps,
    events: SharedEventBus,
    presenter: Option<RootPresenter>,
    mode: Option<PresentationMode>,
    displayed: bool,
    builds: usize,
    history: Vec<ModeChange>,
    violations: Vec<ContractViolation>,
}

impl RootCoordinator {
    pub fn new(config: CoordinatorConfig, collaborators: Collaborators) -> Self {
        let events = EventBus::with_capacity(config.event_capacity).shared();
        Self {
            config,
            flags: collaborators.flags,
            window: collaborators.window,
            overlay: collaborators.overlay,
            deps: PresenterDeps {
                screens: collaborators.screens,
                store: collaborators.store,
            },
            events,
            presenter: None,
            mode: None,
            displayed: false,
            builds: 0,
            history: Vec::new(),
            violations: Vec::new(),
        }
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn events(&self) -> &SharedEventBus {
        &self.events
    }

    /// Mode the live presenter was built for.
    pub fn mode(&self) -> Option<PresentationMode> {
        self.mode
    }

    /// Number of presenters built so far.
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn history(&self) -> &[ModeChange] {
        &self.history
    }

    /// Contract violations seen by the coordinator and the live presenter.
    pub fn violations(&self) -> Vec<ContractViolation> {
        let mut all = self.violations.clone();
        if let Some(presenter) = &self.presenter {
            all.extend_from_slice(presenter.violations());
        }
        all
    }

    /// The live presenter, if one was built.
    pub fn current_presenter(&self) -> Option<&RootPresenter> {
        self.presenter.as_ref()
    }

    pub fn resolve_mode(&self) -> PresentationMode {
        let state = self.flags.flag_state();
        let mode = rollout::resolve(&state);
        debug!(phase = %state.phase, %mode, "Resolved presentation mode");
        mode
    }

    /// Show the app UI when an account exists, the sign-in flow otherwise.
    pub fn show_ui(&mut self) {
        if self.deps.store.has_account() {
            self.show_app_ui();
        } else {
            info!("No account, showing sign-in");
            self.show_sign_in();
        }
    }

    /// Resolve the mode, build its presenter and display its root.
    pub fn show_app_ui(&mut self) {
        let mode = self.resolve_mode();
        let presenter = self.build_presenter(mode, false);
        let transition = if self.displayed {
            Transition::Dip
        } else {
            Transition::None
        };
        self.window.show(presenter.root_screen(), transition);
        self.presenter = Some(presenter);
        self.displayed = true;
        info!(%mode, ?transition, "App UI shown");
    }

    pub fn show_sign_in(&mut self) {
        let screen = self.deps.screens.make(ScreenKind::SignIn);
        self.window.show_sign_in(&screen);
        self.publish(UiEvent::SignInShown {
            timestamp: Utc::now(),
        });
    }

    /// Rebuild the presenter if the resolved mode changed.
    pub async fn reload_ui_if_needed(&mut self) -> ReloadOutcome {
        self.reload(ResolveTrigger::FlagsChanged).await
    }

    async fn reload(&mut self, trigger: ResolveTrigger) -> ReloadOutcome {
        let to = self.resolve_mode();
        let from = match self.mode {
            None => {
                debug!(%trigger, "Reload before the app UI was shown");
                return ReloadOutcome::NotShown;
            }
            Some(from) if from == to => {
                debug!(%trigger, mode = %to, "Mode unchanged");
                return ReloadOutcome::Unchanged;
            }
            Some(from) => from,
        };

        info!(%trigger, %from, %to, "Presentation mode changed, rebuilding");
        let overlay = self.deps.screens.make(ScreenKind::UpdatingOverlay);
        self.window.show_overlay(&overlay);
        let prompted = self.overlay.present_if_needed(&overlay, from, to).await;

        let presenter = self.build_presenter(to, false);
        self.window.show(presenter.root_screen(), Transition::Dip);
        if let Some(old) = self.presenter.replace(presenter) {
            debug!(kind = ?old.kind(), "Previous presenter released");
        }
        self.displayed = true;
        self.window.clear_overlay();

        self.history.push(ModeChange {
            from,
            to,
            trigger,
            prompted,
            at: Utc::now(),
        });
        self.publish(UiEvent::ui_type_changed(Some(from), to));
        ReloadOutcome::Rebuilt { from, to, prompted }
    }

    /// The live presenter. Asking before the UI was shown is a contract
    /// violation; it is logged and the presenter is built on demand.
    pub fn presenter(&mut self) -> &mut RootPresenter {
        let presenter = match self.presenter.take() {
            Some(presenter) => presenter,
            None => {
                report(&mut self.violations, ContractViolation::PresenterNotBuilt);
                let mode = self.resolve_mode();
                self.build_presenter(mode, true)
            }
        };
        self.presenter.insert(presenter)
    }

    /// Route a deep link to the live presenter.
    pub fn open(&mut self, target: &DeepLinkTarget) -> Dispatch {
        let dispatch = self.presenter().navigate(target);
        if dispatch == Dispatch::Unsupported {
            info!(%target, "Deep link not supported by the current presenter");
        }
        self.publish(UiEvent::DeepLinkRouted {
            target: target.clone(),
            dispatch,
            timestamp: Utc::now(),
        });
        dispatch
    }

    /// Wait for the window to finish presenting `screen`.
    pub async fn presentation_finished(&mut self, screen: &Screen, animated: bool) {
        self.window.presentation_finished(screen, animated).await;
        debug!(%screen, animated, "Presentation finished");
    }

    /// Profile/Me → App Settings → Privacy Settings.
    pub async fn open_privacy_settings(&mut self) -> ChainOutcome {
        let from = self.presenter().root_screen().clone();
        let animated = self.config.animate_chains;
        flows::privacy_settings().start(self, from, animated).await
    }

    /// A site was deleted: let the presenter reselect, hand off to sign-in
    /// if nothing is left, then re-resolve the mode.
    pub async fn site_deleted(&mut self, site: SiteId) -> ReloadOutcome {
        let mut requests = Vec::new();
        if let Some(presenter) = self.presenter.as_mut() {
            requests.extend(presenter.sync_domain_changes());
            if presenter.current_site() == Some(site) && !self.deps.store.site_exists(site) {
                requests.extend(presenter.on_site_deleted(site));
            }
        }
        if requests.contains(&PresenterRequest::SignIn) {
            self.show_sign_in();
        }
        self.reload(ResolveTrigger::SiteDeleted).await
    }

    /// Apply one event.
    pub async fn handle(&mut self, event: AppEvent) {
        match event {
            AppEvent::Foreground => {
                self.reload(ResolveTrigger::Foreground).await;
            }
            AppEvent::FlagsChanged => {
                self.reload(ResolveTrigger::FlagsChanged).await;
            }
            AppEvent::SiteDeleted { site } => {
                self.site_deleted(site).await;
            }
            AppEvent::DeepLink { target } => {
                self.open(&target);
            }
            AppEvent::LayoutChanged { layout } => match self.presenter().as_multi_column_mut() {
                Some(presenter) => match layout {
                    ColumnLayout::Collapsed => presenter.collapse(),
                    ColumnLayout::Expanded => presenter.expand(),
                },
                None => debug!(%layout, "Layout change ignored by single-stack presenter"),
            },
            AppEvent::SidebarSelected { selection } => {
                let requests = match self.presenter().as_multi_column_mut() {
                    Some(presenter) => presenter.select(selection),
                    None => {
                        warn!(%selection, "Sidebar selection without a sidebar");
                        Vec::new()
                    }
                };
                if requests.contains(&PresenterRequest::SignIn) {
                    self.show_sign_in();
                }
            }
            AppEvent::OpenPrivacySettings => {
                self.open_privacy_settings().await;
            }
        }
    }

    /// Serialized event loop. Runs until every sender is dropped.
    ///
    /// Reload triggers already queued behind a reload trigger are folded
    /// into it; other events keep their order.
    pub async fn run(&mut self, mut events: mpsc::Receiver<AppEvent>) -> RunStats {
        let mut stats = RunStats::default();
        let mut backlog = VecDeque::new();
        let builds_before = self.history.len();

        loop {
            let event = match backlog.pop_front() {
                Some(event) => event,
                None => match events.recv().await {
                    Some(event) => event,
                    None => break,
                },
            };
            stats.events += 1;

            if event.reload_trigger().is_some() {
                // The reload reads the latest flags, so queued reload
                // triggers are redundant. Everything else is replayed after.
                let mut folded = 0;
                while let Ok(queued) = events.try_recv() {
                    if queued.reload_trigger().is_some() {
                        folded += 1;
                    } else {
                        backlog.push_back(queued);
                    }
                }
                if folded > 0 {
                    debug!(folded, deferred = backlog.len(), "Reload triggers coalesced");
                    stats.events += folded;
                    stats.coalesced += folded;
                }
            }

            self.handle(event).await;
        }

        stats.rebuilds = self.history.len() - builds_before;
        info!(
            events = stats.events,
            coalesced = stats.coalesced,
            rebuilds = stats.rebuilds,
            "Event loop finished"
        );
        stats
    }

    fn build_presenter(&mut self, mode: PresentationMode, lazily: bool) -> RootPresenter {
        let presenter = RootPresenter::build(mode, &self.config, self.deps.clone());
        self.mode = Some(mode);
        self.builds += 1;
        info!(%mode, kind = ?presenter.kind(), lazily, "Presenter built");
        self.publish(UiEvent::PresenterBuilt {
            kind: presenter.kind(),
            lazily,
            timestamp: Utc::now(),
        });
        presenter
    }

    fn publish(&self, event: UiEvent) {
        if let Err(e) = self.events.publish(event) {
            warn!(error = %e, "Failed to publish UI event");
        }
    }
}
