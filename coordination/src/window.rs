//! Window owner and feature-overlay contracts
//!
//! The coordinator never manipulates window internals; it hands a root screen
//! to a [`WindowHost`] and asks a [`FeatureOverlay`] whether an explanatory
//! prompt should cover a mode change.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::rollout::PresentationMode;
use crate::screen::Screen;

/// How a new root screen replaces the old one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Swap without animation (first display).
    None,
    /// Dip-to-background transition used for later swaps.
    Dip,
}

/// Owner of the app window.
#[async_trait(?Send)]
pub trait WindowHost {
    /// Install `root` as the displayed root screen.
    fn show(&mut self, root: &Screen, transition: Transition);

    /// Cover the window with a blurring overlay screen.
    fn show_overlay(&mut self, overlay: &Screen);

    fn clear_overlay(&mut self);

    /// Present the sign-in / no-sites flow.
    fn show_sign_in(&mut self, screen: &Screen);

    /// Resolves once `screen` has finished presenting. Unanimated
    /// presentations are already finished.
    async fn presentation_finished(&mut self, _screen: &Screen, _animated: bool) {}
}

/// Decides whether a mode change gets an explanatory prompt.
#[async_trait(?Send)]
pub trait FeatureOverlay {
    /// Present a prompt over `overlay` if needed; resolves once it is
    /// dismissed. Returns whether a prompt was shown.
    async fn present_if_needed(
        &mut self,
        overlay: &Screen,
        from: PresentationMode,
        to: PresentationMode,
    ) -> bool;
}

/// Overlay collaborator that never prompts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

#[async_trait(?Send)]
impl FeatureOverlay for NoPrompt {
    async fn present_if_needed(
        &mut self,
        _overlay: &Screen,
        _from: PresentationMode,
        _to: PresentationMode,
    ) -> bool {
        false
    }
}

/// A call received by [`RecordingWindow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum WindowCall {
    Show { root: Screen, transition: Transition },
    ShowOverlay { overlay: Screen },
    ClearOverlay,
    ShowSignIn { screen: Screen },
    PresentationFinished { screen: Screen },
}

/// Shared log of window calls.
pub type WindowLog = Rc<RefCell<Vec<WindowCall>>>;

/// Window host that records every call, for the shell and tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingWindow {
    log: WindowLog,
    animation: Duration,
}

impl RecordingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Animated presentations take `animation` to finish.
    pub fn with_animation(mut self, animation: Duration) -> Self {
        self.animation = animation;
        self
    }

    /// Handle to the call log; stays valid after the window is moved.
    pub fn log(&self) -> WindowLog {
        Rc::clone(&self.log)
    }

    fn record(&self, call: WindowCall) {
        tracing::trace!(?call, "Window call");
        self.log.borrow_mut().push(call);
    }
}

#[async_trait(?Send)]
impl WindowHost for RecordingWindow {
    fn show(&mut self, root: &Screen, transition: Transition) {
        self.record(WindowCall::Show {
            root: root.clone(),
            transition,
        });
    }

    fn show_overlay(&mut self, overlay: &Screen) {
        self.record(WindowCall::ShowOverlay {
            overlay: overlay.clone(),
        });
    }

    fn clear_overlay(&mut self) {
        self.record(WindowCall::ClearOverlay);
    }

    fn show_sign_in(&mut self, screen: &Screen) {
        self.record(WindowCall::ShowSignIn {
            screen: screen.clone(),
        });
    }

    async fn presentation_finished(&mut self, screen: &Screen, animated: bool) {
        if animated && !self.animation.is_zero() {
            tokio::time::sleep(self.animation).await;
        }
        self.record(WindowCall::PresentationFinished {
            screen: screen.clone(),
        });
    }
}
