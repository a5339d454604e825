//! Live list/detail columns
//!
//! The multi-column presenter shows one content entry at a time in two shared
//! columns. When the layout collapses, both columns are merged into a single
//! compact stack (list screens at the bottom, detail screens on top); the
//! boundary is remembered so expanding splits them back without loss.

use serde::{Deserialize, Serialize};

use crate::screen::{NavigationStack, Screen};

/// Width class of the multi-column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnLayout {
    /// Sidebar, list and detail visible side by side.
    Expanded,
    /// Narrow size class: a single compact stack.
    Collapsed,
}

impl std::fmt::Display for ColumnLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expanded => write!(f, "expanded"),
            Self::Collapsed => write!(f, "collapsed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Arrangement {
    Split {
        list: NavigationStack,
        detail: NavigationStack,
    },
    Compact {
        stack: NavigationStack,
        /// Number of screens at the bottom of `stack` that belong to the list.
        list_depth: usize,
    },
}

/// The shared list + detail columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    arrangement: Arrangement,
}

impl Columns {
    /// Empty columns in the given layout.
    pub fn new(layout: ColumnLayout) -> Self {
        let arrangement = match layout {
            ColumnLayout::Expanded => Arrangement::Split {
                list: NavigationStack::new(),
                detail: NavigationStack::new(),
            },
            ColumnLayout::Collapsed => Arrangement::Compact {
                stack: NavigationStack::new(),
                list_depth: 0,
            },
        };
        Self { arrangement }
    }

    pub fn layout(&self) -> ColumnLayout {
        match self.arrangement {
            Arrangement::Split { .. } => ColumnLayout::Expanded,
            Arrangement::Compact { .. } => ColumnLayout::Collapsed,
        }
    }

    /// Whether no screens are installed.
    pub fn is_empty(&self) -> bool {
        match &self.arrangement {
            Arrangement::Split { list, detail } => list.is_empty() && detail.is_empty(),
            Arrangement::Compact { stack, .. } => stack.is_empty(),
        }
    }

    /// Install a content entry's stacks, replacing whatever was shown.
    pub fn install(&mut self, list: NavigationStack, detail: NavigationStack) {
        self.arrangement = match self.layout() {
            ColumnLayout::Expanded => Arrangement::Split { list, detail },
            ColumnLayout::Collapsed => merge(list, detail),
        };
    }

    /// Move the in-flight stacks out, leaving the columns empty.
    pub fn take(&mut self) -> (NavigationStack, NavigationStack) {
        let layout = self.layout();
        let arrangement = std::mem::replace(&mut self.arrangement, Columns::new(layout).arrangement);
        split(arrangement)
    }

    /// Copy of the stacks in list/detail form.
    pub fn snapshot(&self) -> (NavigationStack, NavigationStack) {
        split(self.arrangement.clone())
    }

    pub fn clear(&mut self) {
        self.arrangement = Columns::new(self.layout()).arrangement;
    }

    /// Merge the detail column into a single compact stack.
    pub fn collapse(&mut self) {
        if let Arrangement::Split { list, detail } = &mut self.arrangement {
            let merged = merge(std::mem::take(list), std::mem::take(detail));
            self.arrangement = merged;
        }
    }

    /// Split the compact stack back into list and detail columns.
    pub fn expand(&mut self) {
        if let Arrangement::Compact { .. } = self.arrangement {
            let arrangement = std::mem::replace(
                &mut self.arrangement,
                Columns::new(ColumnLayout::Expanded).arrangement,
            );
            let (list, detail) = split(arrangement);
            self.arrangement = Arrangement::Split { list, detail };
        }
    }

    /// Push onto the list column. While collapsed this drops detail screens,
    /// as a list push replaces the secondary content.
    pub fn push_list(&mut self, screen: Screen) {
        match &mut self.arrangement {
            Arrangement::Split { list, .. } => list.push(screen),
            Arrangement::Compact { stack, list_depth } => {
                let _ = stack.split_off(*list_depth);
                stack.push(screen);
                *list_depth = stack.len();
            }
        }
    }

    /// Pop the list column back to its root; detail is untouched.
    pub fn pop_list_to_root(&mut self) {
        match &mut self.arrangement {
            Arrangement::Split { list, .. } => list.pop_to_root(),
            Arrangement::Compact { stack, list_depth } => {
                if *list_depth > 1 {
                    let upper = stack.split_off(*list_depth);
                    stack.pop_to_root();
                    stack.extend(upper);
                    *list_depth = 1;
                }
            }
        }
    }

    /// Root of the list column.
    pub fn list_root(&self) -> Option<&Screen> {
        match &self.arrangement {
            Arrangement::Split { list, .. } => list.root(),
            Arrangement::Compact { stack, .. } => stack.root(),
        }
    }

    /// Replace the list column with a new root and drop the detail screens.
    pub fn reset_list(&mut self, root: Screen) {
        match &mut self.arrangement {
            Arrangement::Split { list, detail } => {
                list.reset(root);
                detail.clear();
            }
            Arrangement::Compact { stack, list_depth } => {
                *stack = NavigationStack::with_root(root);
                *list_depth = 1;
            }
        }
    }

    /// Push onto the detail column.
    pub fn push_detail(&mut self, screen: Screen) {
        match &mut self.arrangement {
            Arrangement::Split { detail, .. } => detail.push(screen),
            Arrangement::Compact { stack, .. } => stack.push(screen),
        }
    }

    /// Replace the detail column with `screen`.
    pub fn show_detail(&mut self, screen: Screen) {
        match &mut self.arrangement {
            Arrangement::Split { detail, .. } => detail.reset(screen),
            Arrangement::Compact { stack, list_depth } => {
                let _ = stack.split_off(*list_depth);
                stack.push(screen);
            }
        }
    }

    /// Back navigation: pop the topmost visible screen.
    pub fn pop(&mut self) -> Option<Screen> {
        match &mut self.arrangement {
            Arrangement::Split { list, detail } => {
                if detail.is_empty() {
                    list.pop()
                } else {
                    // The detail root may be popped; the list root may not.
                    let mut screens = std::mem::take(detail);
                    let popped = screens.split_off(screens.len() - 1);
                    *detail = screens;
                    popped.top().cloned()
                }
            }
            Arrangement::Compact { stack, list_depth } => {
                let popped = stack.pop();
                *list_depth = (*list_depth).min(stack.len());
                popped
            }
        }
    }

    /// Topmost visible screen.
    pub fn top(&self) -> Option<&Screen> {
        match &self.arrangement {
            Arrangement::Split { list, detail } => detail.top().or_else(|| list.top()),
            Arrangement::Compact { stack, .. } => stack.top(),
        }
    }
}

fn merge(list: NavigationStack, detail: NavigationStack) -> Arrangement {
    let list_depth = list.len();
    let mut stack = list;
    stack.extend(detail);
    Arrangement::Compact { stack, list_depth }
}

fn split(arrangement: Arrangement) -> (NavigationStack, NavigationStack) {
    match arrangement {
        Arrangement::Split { list, detail } => (list, detail),
        Arrangement::Compact {
            mut stack,
            list_depth,
        } => {
            let detail = stack.split_off(list_depth);
            (stack, detail)
        }
    }
}
