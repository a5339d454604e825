//! Scenario replay
//!
//! A scenario is a TOML list of steps. Host steps mutate the simulated
//! environment (flag store, account); event steps are queued on the
//! coordinator's channel. Consecutive event steps form one batch so the
//! serialized loop sees them the way it would see a burst of real input:
//!
//! ```toml
//! name = "rollout"
//!
//! [[steps]]
//! action = "set_phase"
//! phase = "four"
//!
//! [[steps]]
//! action = "flags_changed"
//!
//! [[steps]]
//! action = "deep_link"
//! link = { target = "tag", slug = "rust" }
//! ```

use nav_coordination::events::{EventBusExt, EventFilter};
use nav_coordination::{
    AppEvent, Collaborators, ColumnLayout, DeepLinkTarget, DomainStore, InMemoryDomainStore,
    ModeChange, NoPrompt, PresentationMode, PresenterKind, PublishedEvent, RecordingWindow,
    RolloutPhase, RootCoordinator, RunStats, Screen, SequentialScreenFactory, SidebarSelection,
    SiteId, StaticFlagStore, WindowCall,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::config::ShellConfig;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid scenario: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Coordinator stopped accepting events")]
    ChannelClosed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    // ── Host steps ─────────────────────────────────────────────────────
    /// Change the rollout phase without telling the coordinator.
    SetPhase { phase: String },
    AddSite { site: u64 },
    /// Remove a site from the account, then report it to the coordinator.
    DeleteSite { site: u64 },

    // ── Coordinator events ─────────────────────────────────────────────
    Foreground,
    FlagsChanged,
    DeepLink { link: DeepLinkTarget },
    Layout { layout: ColumnLayout },
    Select { selection: SidebarSelection },
    PrivacySettings,
}

impl Step {
    fn event(&self) -> Option<AppEvent> {
        match self {
            Self::Foreground => Some(AppEvent::Foreground),
            Self::FlagsChanged => Some(AppEvent::FlagsChanged),
            Self::DeepLink { link } => Some(AppEvent::DeepLink {
                target: link.clone(),
            }),
            Self::Layout { layout } => Some(AppEvent::LayoutChanged { layout: *layout }),
            Self::Select { selection } => Some(AppEvent::SidebarSelected {
                selection: selection.clone(),
            }),
            Self::PrivacySettings => Some(AppEvent::OpenPrivacySettings),
            Self::SetPhase { .. } | Self::AddSite { .. } | Self::DeleteSite { .. } => None,
        }
    }
}

impl Scenario {
    pub fn from_toml_str(raw: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scenario = Self::from_toml_str(&raw)?;
        if scenario.name.is_empty() {
            scenario.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }
        Ok(scenario)
    }
}

/// Window calls by type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WindowSummary {
    pub shows: usize,
    pub overlays: usize,
    pub overlay_clears: usize,
    pub sign_ins: usize,
}

impl WindowSummary {
    fn from_calls(calls: &[WindowCall]) -> Self {
        let mut summary = Self::default();
        for call in calls {
            match call {
                WindowCall::Show { .. } => summary.shows += 1,
                WindowCall::ShowOverlay { .. } => summary.overlays += 1,
                WindowCall::ClearOverlay => summary.overlay_clears += 1,
                WindowCall::ShowSignIn { .. } => summary.sign_ins += 1,
                WindowCall::PresentationFinished { .. } => {}
            }
        }
        summary
    }
}

/// Final state after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub scenario: String,
    pub mode: Option<PresentationMode>,
    pub presenter: Option<PresenterKind>,
    pub builds: usize,
    pub stats: RunStats,
    pub window: WindowSummary,
    pub mode_changes: Vec<ModeChange>,
    pub events: Vec<PublishedEvent>,
    pub violations: Vec<String>,
    /// Sidebar selection and transition log, multi-column only.
    pub selection: Option<String>,
    /// Sidebar column, when a multi-column presenter is showing it.
    pub sidebar: Option<Screen>,
    pub top_screen: Option<Screen>,
}

impl Report {
    pub fn render_text(&self) -> String {
        let mut out = format!("Scenario: {}\n", self.scenario);
        match self.mode {
            Some(mode) => out.push_str(&format!("Mode: {}\n", mode)),
            None => out.push_str("Mode: (signed out)\n"),
        }
        if let Some(kind) = self.presenter {
            out.push_str(&format!("Presenter: {:?} (builds: {})\n", kind, self.builds));
        }
        out.push_str(&format!(
            "Events: {} handled, {} coalesced, {} rebuilds\n",
            self.stats.events, self.stats.coalesced, self.stats.rebuilds
        ));
        out.push_str(&format!(
            "Window: {} shows, {} overlays, {} sign-ins\n",
            self.window.shows, self.window.overlays, self.window.sign_ins
        ));
        for change in &self.mode_changes {
            out.push_str(&format!(
                "  {} -> {} ({}{})\n",
                change.from,
                change.to,
                change.trigger,
                if change.prompted { ", prompted" } else { "" }
            ));
        }
        if let Some(selection) = &self.selection {
            out.push_str(&format!("Selection: {}\n", selection));
        }
        if let Some(sidebar) = &self.sidebar {
            out.push_str(&format!("Sidebar: {}\n", sidebar));
        }
        if let Some(screen) = &self.top_screen {
            out.push_str(&format!("Top screen: {:?}\n", screen.kind));
        }
        if !self.violations.is_empty() {
            out.push_str(&format!("Violations ({}):\n", self.violations.len()));
            for violation in &self.violations {
                out.push_str(&format!("  - {}\n", violation));
            }
        }
        out
    }
}

/// Replay `scenario` against a fresh coordinator built from `config`.
pub async fn replay(
    scenario: &Scenario,
    config: &ShellConfig,
    phase: RolloutPhase,
) -> Result<Report, ScenarioError> {
    info!(
        scenario = %scenario.name,
        steps = scenario.steps.len(),
        %phase,
        device = %config.coordinator.device,
        "Replaying scenario"
    );

    let flags = Rc::new(StaticFlagStore::new(phase));
    let store = Rc::new(config.domain_store());
    let window = RecordingWindow::new();
    let calls = window.log();
    let mut coordinator = RootCoordinator::new(
        config.coordinator.clone(),
        Collaborators {
            flags: flags.clone(),
            window: Box::new(window),
            overlay: Box::new(NoPrompt),
            screens: Rc::new(SequentialScreenFactory::new()),
            store: store.clone(),
        },
    );
    let mut observed = coordinator.events().subscribe_filtered(EventFilter::new());

    coordinator.show_ui();

    let mut stats = RunStats::default();
    let mut batch = Vec::new();
    for step in &scenario.steps {
        if let Some(event) = step.event() {
            batch.push(event);
            continue;
        }
        flush(&mut coordinator, &mut batch, &mut stats).await?;
        apply_host_step(step, &flags, &store, &mut batch);
    }
    flush(&mut coordinator, &mut batch, &mut stats).await?;

    let presenter = coordinator.current_presenter();
    let report = Report {
        scenario: scenario.name.clone(),
        mode: coordinator.mode(),
        presenter: presenter.map(|p| p.kind()),
        builds: coordinator.builds(),
        stats,
        window: WindowSummary::from_calls(&calls.borrow()),
        mode_changes: coordinator.history().to_vec(),
        events: observed.drain(),
        violations: coordinator
            .violations()
            .iter()
            .map(|v| v.to_string())
            .collect(),
        selection: presenter
            .and_then(|p| p.as_multi_column())
            .map(|p| p.selection_summary()),
        sidebar: presenter
            .and_then(|p| p.as_multi_column())
            .filter(|p| p.is_sidebar_visible())
            .map(|p| p.sidebar_screen().clone()),
        top_screen: presenter.and_then(|p| p.top_screen()).cloned(),
    };
    Ok(report)
}

fn apply_host_step(
    step: &Step,
    flags: &StaticFlagStore,
    store: &InMemoryDomainStore,
    batch: &mut Vec<AppEvent>,
) {
    match step {
        Step::SetPhase { phase } => {
            let phase = RolloutPhase::parse(phase);
            let changed = flags.set_phase(phase.clone());
            debug!(%phase, changed, "Rollout phase set");
        }
        Step::AddSite { site } => {
            store.add_site(SiteId(*site));
            debug!(site, total = store.sites().len(), "Site added");
        }
        Step::DeleteSite { site } => {
            let site = SiteId(*site);
            if store.delete_site(site) {
                batch.push(AppEvent::SiteDeleted { site });
            }
        }
        _ => {}
    }
}

/// Hand the queued events to the coordinator and run them to completion.
async fn flush(
    coordinator: &mut RootCoordinator,
    batch: &mut Vec<AppEvent>,
    stats: &mut RunStats,
) -> Result<(), ScenarioError> {
    if batch.is_empty() {
        return Ok(());
    }
    let (tx, rx) = mpsc::channel(batch.len());
    for event in batch.drain(..) {
        tx.send(event)
            .await
            .map_err(|_| ScenarioError::ChannelClosed)?;
    }
    drop(tx);

    let run = coordinator.run(rx).await;
    stats.events += run.events;
    stats.coalesced += run.coalesced;
    stats.rebuilds += run.rebuilds;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nav_coordination::{DeviceClass, ReaderSection, ScreenKind};

    fn run(raw: &str, config: ShellConfig, phase: RolloutPhase) -> Report {
        let scenario = Scenario::from_toml_str(raw).unwrap();
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(replay(&scenario, &config, phase)).unwrap()
    }

    #[test]
    fn test_parse_steps() {
        let scenario = Scenario::from_toml_str(
            r#"
            name = "mixed"

            [[steps]]
            action = "set_phase"
            phase = "staticScreens"

            [[steps]]
            action = "deep_link"
            link = { target = "tag", slug = "rust" }

            [[steps]]
            action = "select"
            selection = { selection = "reader", section = "saved" }

            [[steps]]
            action = "layout"
            layout = "collapsed"
            "#,
        )
        .unwrap();
        assert_eq!(scenario.steps.len(), 4);
        assert_eq!(
            scenario.steps[2],
            Step::Select {
                selection: SidebarSelection::Reader {
                    section: ReaderSection::Saved
                }
            }
        );
        assert!(scenario.steps[0].event().is_none());
        assert_eq!(
            scenario.steps[3].event(),
            Some(AppEvent::LayoutChanged {
                layout: ColumnLayout::Collapsed
            })
        );
    }

    #[test]
    fn test_bundled_scenarios_parse() {
        for raw in [
            include_str!("../scenarios/rollout.toml"),
            include_str!("../scenarios/sidebar.toml"),
            include_str!("../scenarios/static_screens.toml"),
        ] {
            let scenario = Scenario::from_toml_str(raw).unwrap();
            assert!(!scenario.name.is_empty());
            assert!(!scenario.steps.is_empty());
        }
    }

    #[test]
    fn test_sidebar_scenario_ends_in_sign_in() {
        let config = ShellConfig::from_toml_str(include_str!("../shell.toml")).unwrap();
        let report = run(
            include_str!("../scenarios/sidebar.toml"),
            config,
            RolloutPhase::Normal,
        );
        assert_eq!(report.presenter, Some(PresenterKind::MultiColumn));
        assert_eq!(report.window.sign_ins, 1);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let err = Scenario::from_toml_str("[[steps]]\naction = \"reboot\"\n").unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }

    #[test]
    fn test_flag_flip_rebuilds_once() {
        let report = run(
            r#"
            [[steps]]
            action = "set_phase"
            phase = "four"

            [[steps]]
            action = "flags_changed"

            [[steps]]
            action = "foreground"
            "#,
            ShellConfig::default(),
            RolloutPhase::Normal,
        );
        assert_eq!(report.mode, Some(PresentationMode::MultiColumn));
        assert_eq!(report.presenter, Some(PresenterKind::MultiColumn));
        assert_eq!(report.stats.rebuilds, 1);
        assert_eq!(report.stats.coalesced, 1);
        assert_eq!(report.mode_changes.len(), 1);
        assert_eq!(report.window.shows, 2);
        assert_eq!(report.window.overlays, 1);
        assert_eq!(report.window.overlay_clears, 1);
        assert!(report.violations.is_empty());
    }

    #[test]
    fn test_signed_out_shows_sign_in() {
        let mut config = ShellConfig::default();
        config.account.signed_in = false;
        let report = run("", config, RolloutPhase::Normal);
        assert_eq!(report.mode, None);
        assert_eq!(report.window.sign_ins, 1);
        assert_eq!(report.window.shows, 0);
        assert!(report
            .events
            .iter()
            .any(|e| e.event_type() == "sign_in_shown"));
    }

    #[test]
    fn test_deleting_every_site_signs_out() {
        let mut config = ShellConfig::default();
        config.account.sites = vec![1, 2];
        let report = run(
            r#"
            [[steps]]
            action = "delete_site"
            site = 1

            [[steps]]
            action = "delete_site"
            site = 2

            [[steps]]
            action = "delete_site"
            site = 2
            "#,
            config,
            RolloutPhase::Four,
        );
        assert_eq!(report.window.sign_ins, 1);
        assert_eq!(report.stats.events, 2);
    }

    #[test]
    fn test_privacy_flow_on_phone() {
        let mut config = ShellConfig::default();
        config.coordinator.device = DeviceClass::Phone;
        let report = run(
            "[[steps]]\naction = \"privacy_settings\"\n",
            config,
            RolloutPhase::SelfHosted,
        );
        assert_eq!(report.presenter, Some(PresenterKind::Simplified));
        assert_eq!(
            report.top_screen.map(|s| s.kind),
            Some(ScreenKind::PrivacySettings)
        );
        assert!(report.selection.is_none());
    }

    #[test]
    fn test_pinned_sidebar_is_reported() {
        let mut config = ShellConfig::default();
        config.coordinator.sidebar_hideable = false;
        let report = run("", config, RolloutPhase::Four);
        assert_eq!(
            report.sidebar.as_ref().map(|s| s.kind.clone()),
            Some(ScreenKind::Sidebar)
        );
        assert!(report.render_text().contains("Sidebar: "));

        let hidden = run("", ShellConfig::default(), RolloutPhase::Four);
        assert!(hidden.sidebar.is_none());
    }

    #[test]
    fn test_render_text_mentions_mode_and_violations() {
        let report = run(
            "[[steps]]\naction = \"foreground\"\n",
            ShellConfig::default(),
            RolloutPhase::Normal,
        );
        let text = report.render_text();
        assert!(text.contains("Mode: tab_bar"));
        assert!(text.contains("1 handled, 0 coalesced, 0 rebuilds"));
        assert!(!text.contains("Violations"));
    }
}
