//! Navigation action chains
//!
//! A chain is an ordered list of steps. Each step receives the screen the
//! previous step produced and either hands on the next screen or stops the
//! chain by returning `None`. Steps may suspend (e.g. until an animated
//! presentation finishes).
//!
//! The chain is consumed by [`NavigationChain::start`]: the returned future
//! owns every step, so the chain stays alive while a step is pending and all
//! steps are dropped as soon as the chain completes or stops.
//!
//! ```ignore
//! let outcome = NavigationChain::new("privacy")
//!     .then_fn("me", |nav: &mut Nav, _from, animated| nav.show_me(animated))
//!     .then_fn("settings", |nav, from, animated| nav.push_after(from, animated))
//!     .start(&mut nav, root, true)
//!     .await;
//! ```

use futures::future::{FutureExt, LocalBoxFuture};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::screen::Screen;

/// Future returned by a step: the next context screen, or `None` to stop.
pub type StepFuture<'a> = LocalBoxFuture<'a, Option<Screen>>;

/// One step of a [`NavigationChain`] operating on a context `C`.
pub trait NavigationStep<C: ?Sized> {
    fn name(&self) -> &str;

    fn perform<'a>(&'a mut self, ctx: &'a mut C, from: Screen, animated: bool) -> StepFuture<'a>;
}

/// Step backed by a synchronous closure.
pub struct FnStep<F> {
    name: String,
    f: F,
}

/// Wrap a closure as a named step.
pub fn step_fn<F>(name: &str, f: F) -> FnStep<F> {
    FnStep {
        name: name.to_string(),
        f,
    }
}

impl<C, F> NavigationStep<C> for FnStep<F>
where
    C: ?Sized,
    F: FnMut(&mut C, Screen, bool) -> Option<Screen>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn perform<'a>(&'a mut self, ctx: &'a mut C, from: Screen, animated: bool) -> StepFuture<'a> {
        let next = (self.f)(ctx, from, animated);
        futures::future::ready(next).boxed_local()
    }
}

/// How a chain run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ChainOutcome {
    /// Every step produced a screen; `last` is the final one.
    Completed { last: Screen },
    /// Step `at` (zero-based) returned no result. `last` is the screen it
    /// was given.
    Stopped { at: usize, step: String, last: Screen },
}

impl ChainOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }

    /// Last screen the chain reached.
    pub fn last(&self) -> &Screen {
        match self {
            Self::Completed { last } | Self::Stopped { last, .. } => last,
        }
    }
}

/// Ordered sequence of navigation steps.
pub struct NavigationChain<C: ?Sized> {
    name: String,
    steps: Vec<Box<dyn NavigationStep<C>>>,
}

impl<C: ?Sized> NavigationChain<C> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            steps: Vec::new(),
        }
    }

    /// Chain starting with `step`.
    pub fn first(name: &str, step: impl NavigationStep<C> + 'static) -> Self {
        Self::new(name).then(step)
    }

    /// Append a step.
    pub fn then(mut self, step: impl NavigationStep<C> + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Append a closure step.
    pub fn then_fn<F>(self, name: &str, f: F) -> Self
    where
        F: FnMut(&mut C, Screen, bool) -> Option<Screen> + 'static,
    {
        self.then(step_fn(name, f))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run the steps in order, starting from `from`.
    ///
    /// Each step runs only after the previous one produced a screen. An
    /// empty chain completes immediately with `from`.
    pub async fn start(self, ctx: &mut C, from: Screen, animated: bool) -> ChainOutcome {
        let Self { name, mut steps } = self;
        let total = steps.len();
        let mut current = from;

        for (at, step) in steps.iter_mut().enumerate() {
            match step.perform(ctx, current.clone(), animated).await {
                Some(next) => {
                    debug!(chain = %name, step = step.name(), index = at, screen = %next, "Step completed");
                    current = next;
                }
                None => {
                    info!(chain = %name, step = step.name(), index = at, of = total, "Chain stopped");
                    return ChainOutcome::Stopped {
                        at,
                        step: step.name().to_string(),
                        last: current,
                    };
                }
            }
        }

        debug!(chain = %name, steps = total, "Chain completed");
        ChainOutcome::Completed { last: current }
    }
}
