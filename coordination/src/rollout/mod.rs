//! Rollout Phases — Presentation Mode Resolution
//!
//! Maps the remote feature-rollout phase to the top-level UI shape the app
//! shows. Resolution is a pure function of [`FlagState`]; it is re-run
//! whenever the app returns to the foreground, the flag store reports a
//! change, or a site is deleted.
//!
//! # Phase → Mode
//!
//! ```text
//! normal | one | two | three     → TabBar
//! four | new_users | self_hosted → MultiColumn   (simplified feature set)
//! static_screens                 → StaticTabBar
//! unknown / future values        → TabBar        (fail-open to the richest mode)
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use nav_coordination::rollout::{resolve, FlagState, PresentationMode, RolloutPhase};
//!
//! let mode = resolve(&FlagState::new(RolloutPhase::SelfHosted));
//! assert_eq!(mode, PresentationMode::MultiColumn);
//! ```

pub mod flag_store;

pub use flag_store::{EnvFlagStore, FlagOverrides, FlagStore, StaticFlagStore};

use serde::{Deserialize, Serialize};

/// Feature-availability stage the install is in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutPhase {
    /// Full feature set, no rollout in effect.
    Normal,
    One,
    Two,
    Three,
    /// Reduced-feature rollout group.
    Four,
    /// Accounts created after the reduced-feature cut-off.
    NewUsers,
    /// Users with self-hosted sites only.
    SelfHosted,
    /// Dedicated static-screens phase.
    StaticScreens,
    /// A remote value this build does not recognize.
    Unknown(String),
}

impl RolloutPhase {
    /// Every phase this build knows about.
    pub fn known() -> &'static [RolloutPhase] {
        &[
            RolloutPhase::Normal,
            RolloutPhase::One,
            RolloutPhase::Two,
            RolloutPhase::Three,
            RolloutPhase::Four,
            RolloutPhase::NewUsers,
            RolloutPhase::SelfHosted,
            RolloutPhase::StaticScreens,
        ]
    }

    /// Parse a remote phase value. Never fails: unrecognized values become
    /// [`RolloutPhase::Unknown`].
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "normal" | "" => Self::Normal,
            "one" | "1" => Self::One,
            "two" | "2" => Self::Two,
            "three" | "3" => Self::Three,
            "four" | "4" => Self::Four,
            "newusers" => Self::NewUsers,
            "selfhosted" => Self::SelfHosted,
            "staticscreens" => Self::StaticScreens,
            _ => Self::Unknown(raw.trim().to_string()),
        }
    }

    /// Whether this phase runs the simplified feature set.
    pub fn is_simplified(&self) -> bool {
        matches!(self, Self::Four | Self::NewUsers | Self::SelfHosted)
    }
}

impl Default for RolloutPhase {
    fn default() -> Self {
        Self::Normal
    }
}

impl std::fmt::Display for RolloutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::One => write!(f, "one"),
            Self::Two => write!(f, "two"),
            Self::Three => write!(f, "three"),
            Self::Four => write!(f, "four"),
            Self::NewUsers => write!(f, "new_users"),
            Self::SelfHosted => write!(f, "self_hosted"),
            Self::StaticScreens => write!(f, "static_screens"),
            Self::Unknown(raw) => write!(f, "unknown({})", raw),
        }
    }
}

/// Snapshot of the remote flag state used for resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagState {
    /// Current rollout phase.
    pub phase: RolloutPhase,
}

impl FlagState {
    pub fn new(phase: RolloutPhase) -> Self {
        Self { phase }
    }
}

/// Top-level UI shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationMode {
    /// Full-feature tab bar.
    TabBar,
    /// Sidebar + list + detail columns (simplified feature set).
    MultiColumn,
    /// Tab bar with static placeholder screens.
    StaticTabBar,
}

impl std::fmt::Display for PresentationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TabBar => write!(f, "tab_bar"),
            Self::MultiColumn => write!(f, "multi_column"),
            Self::StaticTabBar => write!(f, "static_tab_bar"),
        }
    }
}

/// Why the mode is being re-resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveTrigger {
    /// App returned to the foreground.
    Foreground,
    /// The flag store reported a value change.
    FlagsChanged,
    /// A site was deleted, possibly changing eligibility.
    SiteDeleted,
}

impl std::fmt::Display for ResolveTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Foreground => write!(f, "foreground"),
            Self::FlagsChanged => write!(f, "flags_changed"),
            Self::SiteDeleted => write!(f, "site_deleted"),
        }
    }
}

/// Resolve the presentation mode for a flag state.
///
/// Pure and total: every phase maps to exactly one mode, unknown phases map
/// to [`PresentationMode::TabBar`].
pub fn resolve(state: &FlagState) -> PresentationMode {
    match &state.phase {
        RolloutPhase::Four | RolloutPhase::NewUsers | RolloutPhase::SelfHosted => {
            PresentationMode::MultiColumn
        }
        RolloutPhase::StaticScreens => PresentationMode::StaticTabBar,
        RolloutPhase::Normal
        | RolloutPhase::One
        | RolloutPhase::Two
        | RolloutPhase::Three
        | RolloutPhase::Unknown(_) => PresentationMode::TabBar,
    }
}
