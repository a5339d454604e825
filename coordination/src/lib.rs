//! Navigation Coordination Core
//!
//! This library decides which top-level UI shape a content-management client
//! presents, builds it, and keeps per-destination navigation state alive
//! across selection changes, layout changes and deletions.
//!
//! # Components
//!
//! ## Presentation mode
//! - [`rollout::resolve`]: pure mapping from feature-flag state to a
//!   [`PresentationMode`]
//! - [`RootCoordinator`]: owns the live presenter, swaps it when the mode
//!   changes, routes deep links and runs the serialized event loop
//!
//! ## Presenters
//! - [`RootPresenter`]: closed sum over the presenter variants with a
//!   [`Capabilities`] query
//! - [`MultiColumnPresenter`]: sidebar + list + detail, driven by the
//!   [`selection::reduce`] transition function
//! - [`TabBarPresenter`]: full, static-screens and site-only tab variants
//!
//! ## Navigation state
//! - [`ContentSlotRegistry`]: retained list/detail stacks per destination
//! - [`NavigationChain`]: ordered, possibly suspending navigation steps
//!
//! # Usage
//!
//! ```ignore
//! let mut coordinator = RootCoordinator::new(config, collaborators);
//! coordinator.show_ui();
//! coordinator.open(&DeepLinkTarget::Tag { slug: "rust".into() });
//! coordinator.open_privacy_settings().await;
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod chain;
pub mod config;
pub mod coordinator;
pub mod deep_link;
pub mod domain;
pub mod error;
pub mod events;
pub mod flows;
pub mod presenter;
pub mod rollout;
pub mod screen;
pub mod selection;
pub mod slots;
pub mod window;

// Re-export key types
pub use chain::{step_fn, ChainOutcome, NavigationChain, NavigationStep, StepFuture};
pub use config::{CoordinatorConfig, DeviceClass};
pub use coordinator::{AppEvent, Collaborators, ModeChange, ReloadOutcome, RootCoordinator, RunStats};
pub use deep_link::{DeepLinkTarget, Destination};
pub use domain::{
    DomainChange, DomainStore, InMemoryDomainStore, NotificationId, PostId, ReaderSection, SiteId,
};
pub use error::{ContractViolation, CoordinationError, CoordinationResult};
pub use events::{EventBus, EventFilter, PublishedEvent, SharedEventBus, UiEvent};
pub use presenter::{
    Capabilities, Dispatch, MultiColumnPresenter, PresenterDeps, PresenterKind, PresenterRequest,
    RootPresenter, Tab, TabBarPresenter, TabVariant,
};
pub use rollout::{
    EnvFlagStore, FlagOverrides, FlagState, FlagStore, PresentationMode, ResolveTrigger,
    RolloutPhase, StaticFlagStore,
};
pub use screen::{NavigationStack, Screen, ScreenFactory, ScreenId, ScreenKind, SequentialScreenFactory};
pub use selection::{SelectionEvent, SelectionMachine, SelectionState, SidebarSelection, SlotEffect};
pub use slots::{ColumnLayout, ContentEntry, ContentKey, ContentSlotRegistry};
pub use window::{FeatureOverlay, NoPrompt, RecordingWindow, Transition, WindowCall, WindowHost};
