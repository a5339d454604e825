//! UI coordination events
//!
//! Published by the root coordinator so observers (analytics, the shell,
//! tests) can follow presentation changes without holding the coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::deep_link::DeepLinkTarget;
use crate::presenter::{Dispatch, PresenterKind};
use crate::rollout::PresentationMode;

/// Unique identifier for events
pub type EventId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// The root presenter was rebuilt for a different mode.
    UiTypeChanged {
        from: Option<PresentationMode>,
        to: PresentationMode,
        timestamp: DateTime<Utc>,
    },

    /// A root presenter was built.
    PresenterBuilt {
        kind: PresenterKind,
        /// Built on demand because a caller asked before the UI was shown.
        lazily: bool,
        timestamp: DateTime<Utc>,
    },

    /// A deep link was routed to the current presenter.
    DeepLinkRouted {
        target: DeepLinkTarget,
        dispatch: Dispatch,
        timestamp: DateTime<Utc>,
    },

    /// The app handed off to the sign-in flow.
    SignInShown { timestamp: DateTime<Utc> },
}

impl UiEvent {
    pub fn ui_type_changed(from: Option<PresentationMode>, to: PresentationMode) -> Self {
        Self::UiTypeChanged {
            from,
            to,
            timestamp: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            UiEvent::UiTypeChanged { timestamp, .. } => *timestamp,
            UiEvent::PresenterBuilt { timestamp, .. } => *timestamp,
            UiEvent::DeepLinkRouted { timestamp, .. } => *timestamp,
            UiEvent::SignInShown { timestamp } => *timestamp,
        }
    }

    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            UiEvent::UiTypeChanged { .. } => "ui_type_changed",
            UiEvent::PresenterBuilt { .. } => "presenter_built",
            UiEvent::DeepLinkRouted { .. } => "deep_link_routed",
            UiEvent::SignInShown { .. } => "sign_in_shown",
        }
    }

    /// Create a new unique event ID
    pub fn new_id() -> EventId {
        uuid::Uuid::new_v4().to_string()
    }
}

/// An event as subscribers receive it, stamped with its publish id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedEvent {
    pub id: EventId,
    #[serde(flatten)]
    pub event: UiEvent,
}

impl PublishedEvent {
    pub fn new(event: UiEvent) -> Self {
        Self {
            id: UiEvent::new_id(),
            event,
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.event.event_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = UiEvent::ui_type_changed(Some(PresentationMode::TabBar), PresentationMode::MultiColumn);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"ui_type_changed\""));
        assert!(json.contains("\"to\":\"multi_column\""));

        let back: UiEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.event_type(), "ui_type_changed");
    }

    #[test]
    fn test_event_ids_are_unique() {
        assert_ne!(UiEvent::new_id(), UiEvent::new_id());
    }

    #[test]
    fn test_published_event_carries_id_beside_payload() {
        let published = PublishedEvent::new(UiEvent::SignInShown {
            timestamp: Utc::now(),
        });
        let json = serde_json::to_value(&published).unwrap();
        assert_eq!(json["id"], published.id.as_str());
        assert_eq!(json["type"], "sign_in_shown");
        assert_eq!(published.event_type(), "sign_in_shown");
    }
}
