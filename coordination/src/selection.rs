//! Sidebar Selection State Machine — selection ↔ display reconciliation.
//!
//! The multi-column presenter keeps two things in sync: what the sidebar
//! shows as selected, and which content entry is actually displayed in the
//! list/detail columns. Instead of two observers guarding each other against
//! feedback loops, every change goes through one pure transition function:
//!
//! ```text
//! reduce(state, event) -> Transition { state, effects }
//! ```
//!
//! The presenter applies the returned [`SlotEffect`]s in order. The rules the
//! table encodes:
//!
//! ```text
//! Select(s)            s displays the shown content → no-op
//!                      otherwise → Capture(old), Display(new), HideSidebar?
//! ContentDisplayed(s)  s already shown → no-op
//!                      otherwise → Capture(old)?, Display(k)?;
//!                      expanded: selection follows display (SyncSidebar)
//!                      collapsed: selection left stale until Expand
//! Collapse             → MergeColumns
//! Expand               → SplitColumns; display is the source of truth,
//!                      SyncSidebar if the selection went stale
//! SiteDeleted          shown site deleted → Discard, then Display(next)
//!                      or ClearColumns + RequestSignIn
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

use crate::domain::{ReaderSection, SiteId};
use crate::slots::{ColumnLayout, ContentKey};

/// What the sidebar shows as selected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "selection", rename_all = "snake_case")]
pub enum SidebarSelection {
    Empty,
    Site { site: SiteId },
    Notifications,
    Reader { section: ReaderSection },
    Welcome,
}

impl SidebarSelection {
    /// Content entry this selection displays. `Empty` displays nothing.
    pub fn content_key(&self) -> Option<ContentKey> {
        match self {
            Self::Empty => None,
            Self::Site { site } => Some(ContentKey::site(*site)),
            Self::Notifications => Some(ContentKey::Notifications),
            Self::Reader { .. } => Some(ContentKey::Reader),
            Self::Welcome => Some(ContentKey::Welcome),
        }
    }

    /// Selection that corresponds to displayed content. `reader` is the
    /// section the Reader entry is showing.
    pub fn for_display(displayed: Option<&ContentKey>, reader: &ReaderSection) -> Self {
        match displayed {
            None => Self::Empty,
            Some(ContentKey::Site { site }) => Self::Site { site: *site },
            Some(ContentKey::Notifications) => Self::Notifications,
            Some(ContentKey::Reader) => Self::Reader {
                section: reader.clone(),
            },
            Some(ContentKey::Welcome) => Self::Welcome,
        }
    }
}

impl fmt::Display for SidebarSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reader { section } => write!(f, "reader/{}", section),
            other => match other.content_key() {
                Some(key) => write!(f, "{}", key),
                None => write!(f, "empty"),
            },
        }
    }
}

/// Input to the transition function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SelectionEvent {
    /// The sidebar selection changed (user tap or programmatic).
    Select { selection: SidebarSelection },
    /// Content was shown without going through the sidebar. `selection` is
    /// the sidebar row matching what is now shown.
    ContentDisplayed { selection: SidebarSelection },
    /// The layout became collapsed (narrow size class).
    Collapse,
    /// The layout became expanded again; the sidebar reappears.
    Expand,
    /// A site was deleted. `replacement` is the next valid site, if any.
    SiteDeleted {
        site: SiteId,
        replacement: Option<SiteId>,
    },
}

impl SelectionEvent {
    pub fn select(selection: SidebarSelection) -> Self {
        Self::Select { selection }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Select { .. } => "select",
            Self::ContentDisplayed { .. } => "content_displayed",
            Self::Collapse => "collapse",
            Self::Expand => "expand",
            Self::SiteDeleted { .. } => "site_deleted",
        }
    }
}

/// Side effect for the presenter to apply, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum SlotEffect {
    /// Store the live columns' in-flight stacks back into this entry.
    Capture { key: ContentKey },
    /// Materialize (lazily) and install this entry; fires "became visible".
    Display { key: ContentKey },
    /// Empty the live columns.
    ClearColumns,
    /// Hide the sidebar column.
    HideSidebar,
    /// Merge detail into the single compact stack.
    MergeColumns,
    /// Split the compact stack back into list and detail.
    SplitColumns,
    /// Update the sidebar's highlighted row without navigating.
    SyncSidebar { selection: SidebarSelection },
    /// Destroy this entry; its backing object is gone.
    Discard { key: ContentKey },
    /// Hand off to the sign-in / no-sites flow.
    RequestSignIn,
}

/// State reconciled by the transition function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub selection: SidebarSelection,
    /// Content currently installed in the columns; `None` means no selection.
    pub displayed: Option<ContentKey>,
    pub layout: ColumnLayout,
    /// Whether the layout allows hiding the sidebar after a selection.
    pub sidebar_hideable: bool,
    /// Section the Reader entry shows.
    pub reader_section: ReaderSection,
}

impl SelectionState {
    pub fn new(layout: ColumnLayout, sidebar_hideable: bool) -> Self {
        Self {
            selection: SidebarSelection::Empty,
            displayed: None,
            layout,
            sidebar_hideable,
            reader_section: ReaderSection::Subscriptions,
        }
    }

    /// Sidebar row matching the displayed content.
    pub fn displayed_selection(&self) -> SidebarSelection {
        SidebarSelection::for_display(self.displayed.as_ref(), &self.reader_section)
    }

    /// Whether selection and display agree.
    pub fn in_sync(&self) -> bool {
        self.selection == self.displayed_selection()
    }
}

/// Result of one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: SelectionState,
    pub effects: Vec<SlotEffect>,
}

impl Transition {
    fn unchanged(state: &SelectionState) -> Self {
        Self {
            state: state.clone(),
            effects: Vec::new(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }
}

/// The transition function.
pub fn reduce(state: &SelectionState, event: &SelectionEvent) -> Transition {
    match event {
        SelectionEvent::Select { selection } => reduce_select(state, selection),
        SelectionEvent::ContentDisplayed { selection } => reduce_displayed(state, selection),
        SelectionEvent::Collapse => {
            if state.layout == ColumnLayout::Collapsed {
                return Transition::unchanged(state);
            }
            let mut next = state.clone();
            next.layout = ColumnLayout::Collapsed;
            Transition {
                state: next,
                effects: vec![SlotEffect::MergeColumns],
            }
        }
        SelectionEvent::Expand => {
            if state.layout == ColumnLayout::Expanded {
                return Transition::unchanged(state);
            }
            let mut next = state.clone();
            next.layout = ColumnLayout::Expanded;
            let mut effects = vec![SlotEffect::SplitColumns];
            // Display is the source of truth in this direction.
            let synced = state.displayed_selection();
            if synced != state.selection {
                next.selection = synced.clone();
                effects.push(SlotEffect::SyncSidebar { selection: synced });
            }
            Transition {
                state: next,
                effects,
            }
        }
        SelectionEvent::SiteDeleted { site, replacement } => {
            reduce_site_deleted(state, *site, *replacement)
        }
    }
}

fn reduce_select(state: &SelectionState, selection: &SidebarSelection) -> Transition {
    let key = selection.content_key();
    let mut next = state.clone();
    next.selection = selection.clone();
    if let SidebarSelection::Reader { section } = selection {
        next.reader_section = section.clone();
    }
    if key == state.displayed {
        // Re-applying the shown selection must not reset its stacks.
        return Transition {
            state: next,
            effects: Vec::new(),
        };
    }

    let mut effects = Vec::new();
    if let Some(old) = &state.displayed {
        effects.push(SlotEffect::Capture { key: old.clone() });
    }
    match &key {
        Some(key) => {
            effects.push(SlotEffect::Display { key: key.clone() });
            if state.layout == ColumnLayout::Expanded && state.sidebar_hideable {
                effects.push(SlotEffect::HideSidebar);
            }
        }
        None => effects.push(SlotEffect::ClearColumns),
    }

    next.displayed = key;
    Transition {
        state: next,
        effects,
    }
}

fn reduce_displayed(state: &SelectionState, selection: &SidebarSelection) -> Transition {
    let Some(key) = selection.content_key() else {
        return Transition::unchanged(state);
    };

    let mut next = state.clone();
    let mut effects = Vec::new();
    if state.displayed.as_ref() != Some(&key) {
        if let Some(old) = &state.displayed {
            effects.push(SlotEffect::Capture { key: old.clone() });
        }
        effects.push(SlotEffect::Display { key: key.clone() });
        next.displayed = Some(key);
    }
    if let SidebarSelection::Reader { section } = selection {
        next.reader_section = section.clone();
    }
    if state.layout == ColumnLayout::Expanded && *selection != state.selection {
        next.selection = selection.clone();
        effects.push(SlotEffect::SyncSidebar {
            selection: selection.clone(),
        });
    }
    Transition {
        state: next,
        effects,
    }
}

fn reduce_site_deleted(
    state: &SelectionState,
    site: SiteId,
    replacement: Option<SiteId>,
) -> Transition {
    let deleted = ContentKey::site(site);
    let mut next = state.clone();
    let mut effects = vec![SlotEffect::Discard {
        key: deleted.clone(),
    }];

    if state.displayed.as_ref() == Some(&deleted) {
        match replacement {
            Some(other) => {
                let key = ContentKey::site(other);
                effects.push(SlotEffect::Display { key: key.clone() });
                next.selection = SidebarSelection::Site { site: other };
                next.displayed = Some(key);
            }
            None => {
                effects.push(SlotEffect::ClearColumns);
                effects.push(SlotEffect::RequestSignIn);
                next.selection = SidebarSelection::Empty;
                next.displayed = None;
            }
        }
    } else if state.selection == (SidebarSelection::Site { site }) {
        // Stale selection pointing at the deleted site: follow the display.
        let synced = state.displayed_selection();
        next.selection = synced.clone();
        effects.push(SlotEffect::SyncSidebar { selection: synced });
    }

    Transition {
        state: next,
        effects,
    }
}

/// A single recorded transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Event label (e.g. "select", "expand").
    pub event: String,
    /// Selection before the transition.
    pub from: SidebarSelection,
    /// Selection after the transition.
    pub to: SidebarSelection,
    /// Displayed content after the transition.
    pub displayed: Option<ContentKey>,
    /// Number of effects produced.
    pub effects: usize,
    /// Milliseconds since the machine was created.
    pub elapsed_ms: u64,
}

/// Holds the current [`SelectionState`] and logs every transition.
pub struct SelectionMachine {
    state: SelectionState,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl SelectionMachine {
    pub fn new(layout: ColumnLayout, sidebar_hideable: bool) -> Self {
        Self {
            state: SelectionState::new(layout, sidebar_hideable),
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn set_sidebar_hideable(&mut self, hideable: bool) {
        self.state.sidebar_hideable = hideable;
    }

    /// Run the transition function and adopt its state.
    ///
    /// No-op transitions are not recorded.
    pub fn dispatch(&mut self, event: &SelectionEvent) -> Vec<SlotEffect> {
        let Transition { state, effects } = reduce(&self.state, event);
        if effects.is_empty() && state == self.state {
            return effects;
        }

        tracing::debug!(
            event = event.label(),
            from = %self.state.selection,
            to = %state.selection,
            effects = effects.len(),
            "Selection transition"
        );

        self.transitions.push(TransitionRecord {
            event: event.label().to_string(),
            from: self.state.selection.clone(),
            to: state.selection.clone(),
            displayed: state.displayed.clone(),
            effects: effects.len(),
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
        });
        self.state = state;
        effects
    }

    /// Full transition log.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// One-line history summary.
    pub fn summary(&self) -> String {
        let steps: Vec<String> = self
            .transitions
            .iter()
            .map(|t| format!("{}:{}", t.event, t.to))
            .collect();
        format!(
            "{} ({} transitions){}",
            self.state.selection,
            self.transitions.len(),
            if steps.is_empty() {
                String::new()
            } else {
                format!(" [{}]", steps.join(" → "))
            }
        )
    }
}
