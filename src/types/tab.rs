use std::fmt;

use serde::{Deserialize, Serialize};

/// Labels longer than this many characters are shortened in the tab strip.
pub const TITLE_MAX_CHARS: usize = 15;
/// Number of characters kept when a label is shortened.
pub const TITLE_KEEP_CHARS: usize = 12;
pub const TITLE_ELLIPSIS: &str = "...";

pub const HOME_LABEL: &str = "Home";
pub const PLACEHOLDER_LABEL: &str = "New Tab";

/// Stable tab identity, assigned at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a tab is currently showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentState {
    /// Placeholder home view with the search box.
    Home,
    /// Promoted to a live page view.
    Live { url: String, title: String },
}

impl ContentState {
    pub fn is_live(&self) -> bool {
        matches!(self, ContentState::Live { .. })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ContentState::Home => None,
            ContentState::Live { url, .. } => Some(url),
        }
    }
}

/// Kind of tab requested by `create_tab`. Both start on the home view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewTabKind {
    Home,
    Placeholder,
}

/// A logical browser tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab {
    pub id: TabId,
    pub content: ContentState,
    /// Raw tab-strip text; see [`display_title`] for the rendered form.
    pub label: String,
    pub created_at: i64,
}

impl Tab {
    pub fn display_label(&self) -> String {
        display_title(&self.label)
    }
}

/// Result of resolving a tab-strip position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Tab(TabId),
    /// The trailing "+" slot.
    Affordance,
}

/// Outcome of `promote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// The tab left the home view and needs a live view.
    Promoted,
    /// The tab was already live; load the URL into its existing view.
    Navigated,
}

/// Serializable view of one tab in strip order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabSnapshot {
    pub id: TabId,
    pub position: usize,
    pub label: String,
    pub url: Option<String>,
    pub live: bool,
    pub selected: bool,
}

/// Shortens a title for the tab strip: more than 15 characters become the
/// first 12 followed by `...`.
pub fn display_title(title: &str) -> String {
    if title.chars().count() > TITLE_MAX_CHARS {
        let mut short: String = title.chars().take(TITLE_KEEP_CHARS).collect();
        short.push_str(TITLE_ELLIPSIS);
        short
    } else {
        title.to_string()
    }
}
