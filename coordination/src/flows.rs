//! Canned navigation flows built on [`NavigationChain`].

use futures::future::FutureExt;
use tracing::debug;

use crate::chain::{NavigationChain, NavigationStep, StepFuture};
use crate::coordinator::RootCoordinator;
use crate::screen::{Screen, ScreenKind};

/// Presents Profile/Me and waits until the window has finished showing it.
struct PresentMe;

impl NavigationStep<RootCoordinator> for PresentMe {
    fn name(&self) -> &str {
        "show_me"
    }

    fn perform<'a>(
        &'a mut self,
        coordinator: &'a mut RootCoordinator,
        _from: Screen,
        animated: bool,
    ) -> StepFuture<'a> {
        async move {
            let me = coordinator.presenter().show_me(animated)?;
            coordinator.presentation_finished(&me, animated).await;
            Some(me)
        }
        .boxed_local()
    }
}

/// Profile/Me → App Settings → `destination`.
///
/// Each step checks that the previous one landed on the expected screen and
/// stops the chain otherwise.
pub fn me_settings_chain(name: &str, destination: ScreenKind) -> NavigationChain<RootCoordinator> {
    NavigationChain::first(name, PresentMe)
        .then_fn("app_settings", |coordinator: &mut RootCoordinator, from: Screen, animated: bool| {
            if !from.is(&ScreenKind::Me) {
                debug!(screen = %from, "Expected Me before App Settings");
                return None;
            }
            coordinator
                .presenter()
                .push_screen(ScreenKind::AppSettings, animated)
        })
        .then_fn("destination", move |coordinator: &mut RootCoordinator, from: Screen, animated: bool| {
            if !from.is(&ScreenKind::AppSettings) {
                debug!(screen = %from, "Expected App Settings before destination");
                return None;
            }
            coordinator.presenter().push_screen(destination.clone(), animated)
        })
}

/// Open Privacy Settings from anywhere.
pub fn privacy_settings() -> NavigationChain<RootCoordinator> {
    me_settings_chain("privacy_settings", ScreenKind::PrivacySettings)
}
