use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::services::url_resolver::host_of;
use crate::types::errors::TabError;
use crate::types::tab::{
    ContentState, NewTabKind, Promotion, Slot, Tab, TabId, TabSnapshot, HOME_LABEL,
    PLACEHOLDER_LABEL,
};

/// Trait defining the tab registry interface.
pub trait TabRegistryTrait {
    fn create_tab(&mut self, kind: NewTabKind) -> TabId;
    fn move_tab(&mut self, from: usize, to: usize) -> Result<(), TabError>;
    fn select_position(&mut self, position: usize) -> Result<TabId, TabError>;
    fn promote(&mut self, id: TabId, url: &str, title: &str) -> Result<Promotion, TabError>;
    fn update_title(&mut self, id: TabId, title: &str) -> bool;
    fn slot_at(&self, position: usize) -> Result<Slot, TabError>;
    fn tab_at(&self, position: usize) -> Option<&Tab>;
    fn position_of(&self, id: TabId) -> Option<usize>;
    fn get_tab(&self, id: TabId) -> Option<&Tab>;
    fn selected(&self) -> Option<TabId>;
    fn selected_tab(&self) -> Option<&Tab>;
    fn tab_count(&self) -> usize;
    fn affordance_position(&self) -> usize;
    fn tab_order(&self) -> &[TabId];
    fn snapshots(&self) -> Vec<TabSnapshot>;
}

/// In-memory registry mapping stable tab identities to strip positions and content.
///
/// `order` (position -> identity) and `positions` (identity -> position) are
/// kept as exact inverses; both change only inside this type.
pub struct TabRegistry {
    tabs: HashMap<TabId, Tab>,
    order: Vec<TabId>,
    positions: HashMap<TabId, usize>,
    selected: Option<TabId>,
    next_id: u64,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self {
            tabs: HashMap::new(),
            order: Vec::new(),
            positions: HashMap::new(),
            selected: None,
            next_id: 1,
        }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Rewrites identity -> position for every slot in `range`.
    fn reindex(&mut self, range: std::ops::RangeInclusive<usize>) {
        for position in range {
            if let Some(id) = self.order.get(position) {
                self.positions.insert(*id, position);
            }
        }
    }

    fn check_position(&self, position: usize) -> Result<(), TabError> {
        if position >= self.order.len() {
            return Err(TabError::PositionOutOfRange {
                position,
                len: self.order.len(),
            });
        }
        Ok(())
    }

    /// Whether the two lookup tables are exact inverses over `0..N`.
    pub fn is_consistent(&self) -> bool {
        self.order.len() == self.positions.len()
            && self.order.len() == self.tabs.len()
            && self
                .order
                .iter()
                .enumerate()
                .all(|(pos, id)| self.positions.get(id) == Some(&pos) && self.tabs.contains_key(id))
    }
}

impl Default for TabRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TabRegistryTrait for TabRegistry {
    /// Create a tab just before the "+" slot and select it.
    fn create_tab(&mut self, kind: NewTabKind) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;

        let label = match kind {
            NewTabKind::Home => HOME_LABEL,
            NewTabKind::Placeholder => PLACEHOLDER_LABEL,
        };
        self.tabs.insert(
            id,
            Tab {
                id,
                content: ContentState::Home,
                label: label.to_string(),
                created_at: Self::now(),
            },
        );

        let position = self.order.len();
        self.order.insert(position, id);
        self.reindex(position..=position);
        self.selected = Some(id);

        debug!(tab = %id, position, "created tab");
        id
    }

    /// Move the tab at `from` to `to`; tabs in between close the gap.
    fn move_tab(&mut self, from: usize, to: usize) -> Result<(), TabError> {
        self.check_position(from)?;
        self.check_position(to)?;
        if from == to {
            return Ok(());
        }

        let id = self.order.remove(from);
        self.order.insert(to, id);
        self.reindex(from.min(to)..=from.max(to));

        debug!(tab = %id, from, to, "moved tab");
        Ok(())
    }

    /// Select the tab at `position`. The "+" slot creates and selects a new tab.
    fn select_position(&mut self, position: usize) -> Result<TabId, TabError> {
        match self.slot_at(position)? {
            Slot::Affordance => Ok(self.create_tab(NewTabKind::Placeholder)),
            Slot::Tab(id) => {
                self.selected = Some(id);
                Ok(id)
            }
        }
    }

    /// Move a tab from the home view to a live page, or update an already live tab.
    fn promote(&mut self, id: TabId, url: &str, title: &str) -> Result<Promotion, TabError> {
        let Some(tab) = self.tabs.get_mut(&id) else {
            warn!(tab = %id, "promote on unknown tab ignored");
            return Err(TabError::UnknownIdentity(id));
        };

        let label = if title.is_empty() {
            host_of(url).unwrap_or_else(|| url.to_string())
        } else {
            title.to_string()
        };

        let outcome = match tab.content {
            ContentState::Home => Promotion::Promoted,
            ContentState::Live { .. } => Promotion::Navigated,
        };
        tab.content = ContentState::Live {
            url: url.to_string(),
            title: title.to_string(),
        };
        tab.label = label;

        debug!(tab = %id, url, ?outcome, "promote");
        Ok(outcome)
    }

    fn update_title(&mut self, id: TabId, title: &str) -> bool {
        if !self.positions.contains_key(&id) {
            return false;
        }
        let Some(tab) = self.tabs.get_mut(&id) else {
            return false;
        };
        tab.label = title.to_string();
        if let ContentState::Live { title: live_title, .. } = &mut tab.content {
            *live_title = title.to_string();
        }
        true
    }

    fn slot_at(&self, position: usize) -> Result<Slot, TabError> {
        match position.cmp(&self.order.len()) {
            std::cmp::Ordering::Less => Ok(Slot::Tab(self.order[position])),
            std::cmp::Ordering::Equal => Ok(Slot::Affordance),
            std::cmp::Ordering::Greater => Err(TabError::PositionOutOfRange {
                position,
                len: self.order.len(),
            }),
        }
    }

    fn tab_at(&self, position: usize) -> Option<&Tab> {
        self.order.get(position).and_then(|id| self.tabs.get(id))
    }

    fn position_of(&self, id: TabId) -> Option<usize> {
        self.positions.get(&id).copied()
    }

    fn get_tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.get(&id)
    }

    fn selected(&self) -> Option<TabId> {
        self.selected
    }

    fn selected_tab(&self) -> Option<&Tab> {
        self.selected.and_then(|id| self.tabs.get(&id))
    }

    fn tab_count(&self) -> usize {
        self.order.len()
    }

    fn affordance_position(&self) -> usize {
        self.order.len()
    }

    fn tab_order(&self) -> &[TabId] {
        &self.order
    }

    fn snapshots(&self) -> Vec<TabSnapshot> {
        self.order
            .iter()
            .enumerate()
            .filter_map(|(position, id)| {
                self.tabs.get(id).map(|tab| TabSnapshot {
                    id: *id,
                    position,
                    label: tab.display_label(),
                    url: tab.content.url().map(str::to_string),
                    live: tab.content.is_live(),
                    selected: self.selected == Some(*id),
                })
            })
            .collect()
    }
}
