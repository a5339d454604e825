//! UI coordination events
//!
//! 1. **Event Types** (`types.rs`): what the root coordinator announces.
//! 2. **Event Bus** (`bus.rs`): Tokio broadcast-based pub/sub.
//!
//! ```text
//! ┌──────────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ RootCoordinator  │────▶│  Event Bus   │────▶│  Subscribers │
//! │    (publish)     │     │  (broadcast) │     │   (recv)     │
//! └──────────────────┘     └──────────────┘     └──────────────┘
//! ```

pub mod bus;
pub mod types;

pub use bus::{EventBus, EventBusExt, EventFilter, FilteredReceiver, SharedEventBus};
pub use types::{EventId, PublishedEvent, UiEvent};
