//! Flag Stores — Read-Only Access to the Rollout Phase
//!
//! The coordination core reads the rollout phase through [`FlagStore`] and
//! never writes it. Two stores ship with the crate:
//!
//! | Store | Source |
//! |---|---|
//! | [`EnvFlagStore`] | `NAV_ROLLOUT_PHASE`, read on every query |
//! | [`StaticFlagStore`] | An in-memory value, settable by the host |
//!
//! # Per-Run Overrides
//!
//! ```rust,ignore
//! use nav_coordination::rollout::{EnvFlagStore, FlagOverrides, RolloutPhase};
//!
//! let store = EnvFlagStore::new().with_overrides(FlagOverrides {
//!     phase: Some(RolloutPhase::StaticScreens),
//! });
//! ```

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use super::{FlagState, RolloutPhase};

/// Environment variable holding the rollout phase.
pub const PHASE_ENV: &str = "NAV_ROLLOUT_PHASE";

/// Queryable source of the current rollout phase.
pub trait FlagStore {
    /// Current flag state. May be called many times; must be cheap.
    fn flag_state(&self) -> FlagState;
}

/// Per-run overrides for flag values.
///
/// `None` means "don't override", `Some(..)` explicitly sets the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagOverrides {
    pub phase: Option<RolloutPhase>,
}

impl FlagOverrides {
    /// Apply overrides to a flag state. Only `Some` values are applied.
    pub fn apply(&self, state: &mut FlagState) {
        if let Some(phase) = &self.phase {
            state.phase = phase.clone();
        }
    }

    /// Whether any override is set.
    pub fn any(&self) -> bool {
        self.phase.is_some()
    }
}

/// Flag store backed by the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvFlagStore {
    overrides: FlagOverrides,
}

impl EnvFlagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(mut self, overrides: FlagOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

impl FlagStore for EnvFlagStore {
    fn flag_state(&self) -> FlagState {
        let phase = std::env::var(PHASE_ENV)
            .map(|raw| RolloutPhase::parse(&raw))
            .unwrap_or_default();
        let mut state = FlagState::new(phase);
        self.overrides.apply(&mut state);
        state
    }
}

/// In-memory flag store. The host updates it and then reports the change to
/// the coordinator (`AppEvent::FlagsChanged`).
#[derive(Debug, Default)]
pub struct StaticFlagStore {
    state: RefCell<FlagState>,
}

impl StaticFlagStore {
    pub fn new(phase: RolloutPhase) -> Self {
        Self {
            state: RefCell::new(FlagState::new(phase)),
        }
    }

    /// Replace the current phase. Returns `true` if the value changed.
    pub fn set_phase(&self, phase: RolloutPhase) -> bool {
        let mut state = self.state.borrow_mut();
        if state.phase == phase {
            return false;
        }
        state.phase = phase;
        true
    }
}

impl FlagStore for StaticFlagStore {
    fn flag_state(&self) -> FlagState {
        self.state.borrow().clone()
    }
}

/// Parse a boolean environment variable.
///
/// Accepts "1", "true", or "yes" (case-insensitive) as enabled.
/// Returns `None` when the variable is missing.
pub(crate) fn parse_bool_env(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| parse_bool(&v))
}

pub(crate) fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_store_reports_changes() {
        let store = StaticFlagStore::new(RolloutPhase::Normal);
        assert!(!store.set_phase(RolloutPhase::Normal));
        assert!(store.set_phase(RolloutPhase::Four));
        assert_eq!(store.flag_state().phase, RolloutPhase::Four);
    }

    #[test]
    fn test_overrides_only_apply_some() {
        let mut state = FlagState::new(RolloutPhase::Two);
        FlagOverrides::default().apply(&mut state);
        assert_eq!(state.phase, RolloutPhase::Two);

        let overrides = FlagOverrides {
            phase: Some(RolloutPhase::StaticScreens),
        };
        assert!(overrides.any());
        overrides.apply(&mut state);
        assert_eq!(state.phase, RolloutPhase::StaticScreens);
    }

    #[test]
    fn test_env_store_override_wins() {
        // Override makes the result independent of the test environment
        let store = EnvFlagStore::new().with_overrides(FlagOverrides {
            phase: Some(RolloutPhase::SelfHosted),
        });
        assert_eq!(store.flag_state().phase, RolloutPhase::SelfHosted);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("1"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" yes "));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("off"));
    }
}
