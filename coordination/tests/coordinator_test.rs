//! Root coordinator suite: mode swaps, the sign-in gate, deep-link routing,
//! the privacy settings flow and the serialized event loop.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use nav_coordination::events::EventBusExt;
use nav_coordination::{
    AppEvent, ChainOutcome, Collaborators, ColumnLayout, ContractViolation, CoordinatorConfig,
    DeepLinkTarget, DeviceClass, Dispatch, EventFilter, FeatureOverlay, InMemoryDomainStore,
    NoPrompt, PresentationMode, PresenterKind, ReaderSection, RecordingWindow, ReloadOutcome,
    RolloutPhase, RootCoordinator, Screen, ScreenKind, SequentialScreenFactory, SidebarSelection,
    SiteId, StaticFlagStore, Tab, Transition, UiEvent, WindowCall,
};

struct Harness {
    coordinator: RootCoordinator,
    flags: Rc<StaticFlagStore>,
    store: Rc<InMemoryDomainStore>,
    window: Rc<RefCell<Vec<WindowCall>>>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nav_coordination=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

fn harness_with(
    phase: RolloutPhase,
    device: DeviceClass,
    store: InMemoryDomainStore,
    overlay: Box<dyn FeatureOverlay>,
) -> Harness {
    init_tracing();
    let flags = Rc::new(StaticFlagStore::new(phase));
    let store = Rc::new(store);
    let window = RecordingWindow::new();
    let log = window.log();
    let config = CoordinatorConfig {
        device,
        ..CoordinatorConfig::default()
    };
    let coordinator = RootCoordinator::new(
        config,
        Collaborators {
            flags: flags.clone(),
            window: Box::new(window),
            overlay,
            screens: Rc::new(SequentialScreenFactory::new()),
            store: store.clone(),
        },
    );
    Harness {
        coordinator,
        flags,
        store,
        window: log,
    }
}

fn harness(phase: RolloutPhase, sites: &[u64]) -> Harness {
    harness_with(
        phase,
        DeviceClass::Pad,
        InMemoryDomainStore::new(sites.iter().map(|s| SiteId(*s))),
        Box::new(NoPrompt),
    )
}

/// Overlay that always prompts, suspends, and records how many window calls
/// had happened when it was asked.
struct SlowPrompt {
    seen_window_calls: Rc<RefCell<Vec<usize>>>,
    window: Rc<RefCell<Vec<WindowCall>>>,
}

#[async_trait(?Send)]
impl FeatureOverlay for SlowPrompt {
    async fn present_if_needed(
        &mut self,
        _overlay: &Screen,
        _from: PresentationMode,
        _to: PresentationMode,
    ) -> bool {
        self.seen_window_calls
            .borrow_mut()
            .push(self.window.borrow().len());
        tokio::time::sleep(Duration::from_millis(20)).await;
        true
    }
}

fn sign_in_count(window: &Rc<RefCell<Vec<WindowCall>>>) -> usize {
    window
        .borrow()
        .iter()
        .filter(|call| matches!(call, WindowCall::ShowSignIn { .. }))
        .count()
}

// ── Mode swaps ─────────────────────────────────────────────────────

#[tokio::test]
async fn reload_without_flag_change_never_rebuilds() {
    let mut h = harness(RolloutPhase::Normal, &[1]);
    let mut changes = h
        .coordinator
        .events()
        .subscribe_filtered(EventFilter::new().types(vec!["ui_type_changed"]));
    h.coordinator.show_app_ui();
    let calls = h.window.borrow().len();

    assert_eq!(h.coordinator.reload_ui_if_needed().await, ReloadOutcome::Unchanged);
    assert_eq!(h.coordinator.reload_ui_if_needed().await, ReloadOutcome::Unchanged);

    assert_eq!(h.coordinator.builds(), 1);
    assert_eq!(h.window.borrow().len(), calls);
    assert!(changes.drain().is_empty());
}

#[tokio::test]
async fn flag_change_rebuilds_exactly_once() {
    let mut h = harness(RolloutPhase::Normal, &[1]);
    let mut changes = h
        .coordinator
        .events()
        .subscribe_filtered(EventFilter::new().types(vec!["ui_type_changed"]));
    h.coordinator.show_app_ui();

    h.flags.set_phase(RolloutPhase::Four);
    let first = h.coordinator.reload_ui_if_needed().await;
    let second = h.coordinator.reload_ui_if_needed().await;

    assert_eq!(
        first,
        ReloadOutcome::Rebuilt {
            from: PresentationMode::TabBar,
            to: PresentationMode::MultiColumn,
            prompted: false,
        }
    );
    assert_eq!(second, ReloadOutcome::Unchanged);
    assert_eq!(h.coordinator.builds(), 2);
    assert_eq!(h.coordinator.mode(), Some(PresentationMode::MultiColumn));

    let events = changes.drain();
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0].event,
        UiEvent::UiTypeChanged {
            from: Some(PresentationMode::TabBar),
            to: PresentationMode::MultiColumn,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn rebuild_follows_overlay_protocol() {
    init_tracing();
    let window = RecordingWindow::new();
    let log = window.log();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let flags = Rc::new(StaticFlagStore::new(RolloutPhase::Normal));
    let mut coordinator = RootCoordinator::new(
        CoordinatorConfig::default(),
        Collaborators {
            flags: flags.clone(),
            window: Box::new(window),
            overlay: Box::new(SlowPrompt {
                seen_window_calls: seen.clone(),
                window: log.clone(),
            }),
            screens: Rc::new(SequentialScreenFactory::new()),
            store: Rc::new(InMemoryDomainStore::new([SiteId(1)])),
        },
    );
    coordinator.show_app_ui();
    flags.set_phase(RolloutPhase::StaticScreens);

    let outcome = coordinator.reload_ui_if_needed().await;
    assert!(matches!(outcome, ReloadOutcome::Rebuilt { prompted: true, .. }));

    let calls = log.borrow().clone();
    assert_eq!(calls.len(), 4);
    assert!(matches!(&calls[0], WindowCall::Show { transition: Transition::None, .. }));
    match &calls[1] {
        WindowCall::ShowOverlay { overlay } => assert!(overlay.is(&ScreenKind::UpdatingOverlay)),
        other => panic!("expected overlay, got {:?}", other),
    }
    match &calls[2] {
        WindowCall::Show { root, transition } => {
            assert_eq!(*transition, Transition::Dip);
            assert_eq!(
                Some(root),
                coordinator.current_presenter().map(|p| p.root_screen())
            );
        }
        other => panic!("expected show, got {:?}", other),
    }
    assert_eq!(calls[3], WindowCall::ClearOverlay);

    // Prompt was asked while the overlay was up and before the swap
    assert_eq!(*seen.borrow(), vec![2]);
    assert_eq!(coordinator.history().len(), 1);
    assert!(coordinator.history()[0].prompted);
}

#[test]
fn multi_column_mode_on_phone_uses_site_only_presenter() {
    let mut h = harness_with(
        RolloutPhase::Four,
        DeviceClass::Phone,
        InMemoryDomainStore::new([SiteId(1)]),
        Box::new(NoPrompt),
    );
    h.coordinator.show_app_ui();
    let presenter = h.coordinator.presenter();
    assert_eq!(presenter.kind(), PresenterKind::Simplified);
    assert!(!presenter.capabilities().reader);
}

// ── Sign-in gate and lazy presenter ────────────────────────────────

#[test]
fn show_ui_without_account_shows_sign_in() {
    let mut h = harness_with(
        RolloutPhase::Four,
        DeviceClass::Pad,
        InMemoryDomainStore::signed_out(),
        Box::new(NoPrompt),
    );
    h.coordinator.show_ui();

    assert_eq!(sign_in_count(&h.window), 1);
    assert!(h.coordinator.current_presenter().is_none());
    assert_eq!(h.coordinator.builds(), 0);
}

#[test]
fn presenter_before_show_is_built_lazily_and_reported() {
    let mut h = harness(RolloutPhase::Normal, &[1]);
    assert_eq!(h.coordinator.presenter().kind(), PresenterKind::TabBar);
    assert_eq!(
        h.coordinator.violations(),
        vec![ContractViolation::PresenterNotBuilt]
    );

    h.coordinator.show_app_ui();
    assert_eq!(h.coordinator.violations().len(), 1);
}

// ── Deep links ─────────────────────────────────────────────────────

#[test]
fn deep_links_route_through_current_presenter() {
    let mut h = harness(RolloutPhase::Four, &[1]);
    let mut routed = h
        .coordinator
        .events()
        .subscribe_filtered(EventFilter::new().types(vec!["deep_link_routed"]));
    h.coordinator.show_app_ui();

    let dispatch = h.coordinator.open(&DeepLinkTarget::Tag {
        slug: "rust".into(),
    });
    assert_eq!(dispatch, Dispatch::Handled);
    let presenter = h.coordinator.current_presenter().unwrap();
    assert_eq!(
        presenter.as_multi_column().unwrap().selection(),
        &SidebarSelection::Reader {
            section: ReaderSection::Tag("rust".into())
        }
    );
    assert_eq!(routed.drain().len(), 1);
}

#[test]
fn unsupported_deep_link_is_a_noop() {
    let mut h = harness_with(
        RolloutPhase::Four,
        DeviceClass::Phone,
        InMemoryDomainStore::new([SiteId(1)]),
        Box::new(NoPrompt),
    );
    h.coordinator.show_app_ui();
    let before = h.coordinator.presenter().top_screen().cloned();

    let dispatch = h.coordinator.open(&DeepLinkTarget::Search {
        query: Some("rust".into()),
    });
    assert_eq!(dispatch, Dispatch::Unsupported);
    assert_eq!(h.coordinator.presenter().top_screen().cloned(), before);
}

// ── Privacy settings flow ──────────────────────────────────────────

#[tokio::test]
async fn privacy_flow_in_tab_bar() {
    let mut h = harness(RolloutPhase::Normal, &[1]);
    h.coordinator.show_app_ui();

    let outcome = h.coordinator.open_privacy_settings().await;
    assert!(outcome.is_completed());
    assert!(outcome.last().is(&ScreenKind::PrivacySettings));

    let tabs = h.coordinator.current_presenter().unwrap().as_tabs().unwrap();
    assert_eq!(tabs.selected_tab(), Tab::Me);
    let kinds: Vec<ScreenKind> = tabs
        .stack(Tab::Me)
        .unwrap()
        .screens()
        .iter()
        .map(|s| s.kind.clone())
        .collect();
    assert_eq!(
        kinds,
        vec![ScreenKind::Me, ScreenKind::AppSettings, ScreenKind::PrivacySettings]
    );
}

#[tokio::test]
async fn privacy_flow_in_multi_column_uses_modal() {
    let mut h = harness(RolloutPhase::Four, &[1]);
    h.coordinator.show_app_ui();

    let outcome = h.coordinator.open_privacy_settings().await;
    assert!(outcome.is_completed());

    let multi = h
        .coordinator
        .current_presenter()
        .unwrap()
        .as_multi_column()
        .unwrap();
    assert_eq!(multi.modal().unwrap().len(), 3);
    // Columns untouched
    let (_, detail) = multi
        .content_stacks(&nav_coordination::ContentKey::site(SiteId(1)))
        .unwrap();
    assert_eq!(detail.len(), 1);
}

#[tokio::test]
async fn privacy_flow_in_site_only_presenter() {
    let mut h = harness_with(
        RolloutPhase::SelfHosted,
        DeviceClass::Phone,
        InMemoryDomainStore::new([SiteId(1)]),
        Box::new(NoPrompt),
    );
    h.coordinator.show_app_ui();

    let outcome = h.coordinator.open_privacy_settings().await;
    assert!(outcome.is_completed());
    let tabs = h.coordinator.current_presenter().unwrap().as_tabs().unwrap();
    assert_eq!(tabs.stack(Tab::MySite).unwrap().len(), 4);
}

fn animated_coordinator(animate_chains: bool) -> (RootCoordinator, Rc<RefCell<Vec<WindowCall>>>) {
    init_tracing();
    let window = RecordingWindow::new().with_animation(Duration::from_millis(300));
    let log = window.log();
    let coordinator = RootCoordinator::new(
        CoordinatorConfig {
            animate_chains,
            ..CoordinatorConfig::default()
        },
        Collaborators {
            flags: Rc::new(StaticFlagStore::new(RolloutPhase::Four)),
            window: Box::new(window),
            overlay: Box::new(NoPrompt),
            screens: Rc::new(SequentialScreenFactory::new()),
            store: Rc::new(InMemoryDomainStore::new([SiteId(1)])),
        },
    );
    (coordinator, log)
}

#[tokio::test(start_paused = true)]
async fn privacy_flow_waits_for_me_to_finish_presenting() {
    let (mut coordinator, log) = animated_coordinator(true);
    coordinator.show_app_ui();

    let start = tokio::time::Instant::now();
    let outcome = coordinator.open_privacy_settings().await;
    assert!(outcome.is_completed());
    assert!(start.elapsed() >= Duration::from_millis(300));

    let finished: Vec<Screen> = log
        .borrow()
        .iter()
        .filter_map(|call| match call {
            WindowCall::PresentationFinished { screen } => Some(screen.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(finished.len(), 1);
    assert!(finished[0].is(&ScreenKind::Me));
}

#[tokio::test(start_paused = true)]
async fn unanimated_privacy_flow_does_not_wait() {
    let (mut coordinator, _log) = animated_coordinator(false);
    coordinator.show_app_ui();

    let start = tokio::time::Instant::now();
    assert!(coordinator.open_privacy_settings().await.is_completed());
    assert!(start.elapsed() < Duration::from_millis(300));
}

#[tokio::test]
async fn privacy_flow_before_show_still_completes() {
    let mut h = harness(RolloutPhase::Normal, &[1]);
    let outcome = h.coordinator.open_privacy_settings().await;
    assert!(matches!(outcome, ChainOutcome::Completed { .. }));
    assert_eq!(
        h.coordinator.violations(),
        vec![ContractViolation::PresenterNotBuilt]
    );
}

// ── Site deletion ──────────────────────────────────────────────────

#[tokio::test]
async fn deleting_sites_reselects_then_hands_off_to_sign_in_once() {
    let mut h = harness(RolloutPhase::Four, &[1, 2]);
    h.coordinator.show_app_ui();

    h.store.delete_site(SiteId(1));
    h.coordinator
        .handle(AppEvent::SiteDeleted { site: SiteId(1) })
        .await;
    let selection = h
        .coordinator
        .current_presenter()
        .unwrap()
        .as_multi_column()
        .unwrap()
        .selection()
        .clone();
    assert_eq!(selection, SidebarSelection::Site { site: SiteId(2) });
    assert_eq!(sign_in_count(&h.window), 0);

    h.store.delete_site(SiteId(2));
    h.coordinator
        .handle(AppEvent::SiteDeleted { site: SiteId(2) })
        .await;
    let multi = h.coordinator.current_presenter().unwrap().as_multi_column().unwrap();
    assert_eq!(multi.selection(), &SidebarSelection::Empty);
    assert_eq!(sign_in_count(&h.window), 1);

    // Deletion does not change the mode here
    assert_eq!(h.coordinator.builds(), 1);
}

// ── Event loop ─────────────────────────────────────────────────────

#[tokio::test]
async fn queued_reload_triggers_coalesce_into_one_rebuild() {
    let mut h = harness(RolloutPhase::Normal, &[1]);
    h.coordinator.show_app_ui();
    h.flags.set_phase(RolloutPhase::Four);

    let (tx, rx) = mpsc::channel(16);
    tx.send(AppEvent::FlagsChanged).await.unwrap();
    tx.send(AppEvent::Foreground).await.unwrap();
    tx.send(AppEvent::DeepLink {
        target: DeepLinkTarget::Tag {
            slug: "rust".into(),
        },
    })
    .await
    .unwrap();
    tx.send(AppEvent::FlagsChanged).await.unwrap();
    drop(tx);

    let stats = h.coordinator.run(rx).await;
    assert_eq!(stats.events, 4);
    assert_eq!(stats.coalesced, 2);
    assert_eq!(stats.rebuilds, 1);

    // The deep link was replayed against the new presenter
    let multi = h.coordinator.current_presenter().unwrap().as_multi_column().unwrap();
    assert_eq!(
        multi.displayed(),
        Some(&nav_coordination::ContentKey::Reader)
    );
    assert_eq!(
        multi.state().reader_section,
        ReaderSection::Tag("rust".into())
    );
}

#[tokio::test(start_paused = true)]
async fn deep_link_during_rebuild_is_replayed_after_swap() {
    init_tracing();
    let window = RecordingWindow::new();
    let log = window.log();
    let flags = Rc::new(StaticFlagStore::new(RolloutPhase::Normal));
    let mut coordinator = RootCoordinator::new(
        CoordinatorConfig::default(),
        Collaborators {
            flags: flags.clone(),
            window: Box::new(window),
            overlay: Box::new(SlowPrompt {
                seen_window_calls: Rc::new(RefCell::new(Vec::new())),
                window: log.clone(),
            }),
            screens: Rc::new(SequentialScreenFactory::new()),
            store: Rc::new(InMemoryDomainStore::new([SiteId(1)])),
        },
    );
    coordinator.show_app_ui();
    flags.set_phase(RolloutPhase::NewUsers);

    let (tx, rx) = mpsc::channel(16);
    let producer = async move {
        tx.send(AppEvent::FlagsChanged).await.unwrap();
        // The prompt is still pending when the link arrives
        tokio::time::sleep(Duration::from_millis(5)).await;
        tx.send(AppEvent::DeepLink {
            target: DeepLinkTarget::Search { query: None },
        })
        .await
        .unwrap();
    };

    let (stats, ()) = tokio::join!(coordinator.run(rx), producer);
    assert_eq!(stats.rebuilds, 1);
    assert_eq!(stats.events, 2);

    let multi = coordinator.current_presenter().unwrap().as_multi_column().unwrap();
    assert_eq!(
        multi.selection(),
        &SidebarSelection::Reader {
            section: ReaderSection::Search
        }
    );
}

#[tokio::test]
async fn layout_and_sidebar_events_reach_multi_column_presenter() {
    let mut h = harness(RolloutPhase::Four, &[1]);
    h.coordinator.show_app_ui();

    h.coordinator
        .handle(AppEvent::LayoutChanged {
            layout: ColumnLayout::Collapsed,
        })
        .await;
    h.coordinator
        .handle(AppEvent::SidebarSelected {
            selection: SidebarSelection::Notifications,
        })
        .await;

    let multi = h.coordinator.current_presenter().unwrap().as_multi_column().unwrap();
    assert_eq!(multi.layout(), ColumnLayout::Collapsed);
    assert_eq!(multi.selection(), &SidebarSelection::Notifications);
    assert!(h.coordinator.violations().is_empty());
}
