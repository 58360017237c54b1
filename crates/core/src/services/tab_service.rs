use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::api::client::keys;
use crate::errors::CoreError;
use crate::models::record::RecordKind;
use crate::storage::manager::{StorageManager, ACTIVE_TAB_KEY};

/// Badge counts above this are shown as `99+`.
const MAX_BADGE: u32 = 99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tab {
    #[serde(rename = "expenseTab")]
    Expense,
    #[serde(rename = "weightTab")]
    Weight,
    #[serde(rename = "bpTab")]
    BloodPressure,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Expense, Tab::Weight, Tab::BloodPressure];

    pub fn id(&self) -> &'static str {
        match self {
            Tab::Expense => "expenseTab",
            Tab::Weight => "weightTab",
            Tab::BloodPressure => "bpTab",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Expense => "Expenses",
            Tab::Weight => "Weight",
            Tab::BloodPressure => "Blood pressure",
        }
    }

    pub fn from_id(id: &str) -> Option<Tab> {
        Tab::ALL.into_iter().find(|t| t.id() == id)
    }

    /// Ctrl/Cmd + 1..3 selects a tab.
    pub fn from_shortcut(key: char) -> Option<Tab> {
        match key {
            '1' => Some(Tab::Expense),
            '2' => Some(Tab::Weight),
            '3' => Some(Tab::BloodPressure),
            _ => None,
        }
    }

    /// API cache entries feeding this tab, dropped when the tab is re-entered.
    pub fn cache_keys(&self) -> &'static [&'static str] {
        match self {
            Tab::Expense => &[keys::EXPENSE_STATS],
            Tab::Weight => &[keys::WEIGHT, keys::SETTINGS],
            Tab::BloodPressure => &[keys::BLOOD_PRESSURE],
        }
    }

    pub fn record_kind(&self) -> RecordKind {
        match self {
            Tab::Expense => RecordKind::Expense,
            Tab::Weight => RecordKind::Weight,
            Tab::BloodPressure => RecordKind::BloodPressure,
        }
    }

    pub fn for_record(kind: RecordKind) -> Tab {
        match kind {
            RecordKind::Expense => Tab::Expense,
            RecordKind::Weight => Tab::Weight,
            RecordKind::BloodPressure => Tab::BloodPressure,
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for Tab {
    type Err = CoreError;

    /// Accepts tab ids (`bpTab`) as well as record kind names (`bp`, `weight`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tab::from_id(s.trim())
            .or_else(|| s.parse::<RecordKind>().ok().map(Tab::for_record))
            .ok_or_else(|| CoreError::UnknownTab(s.to_string()))
    }
}

/// Emitted whenever the active tab actually changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabChange {
    pub previous: Tab,
    pub current: Tab,
    pub timestamp: DateTime<Utc>,
}

/// Active-tab state machine: exactly one tab is active, the choice survives
/// restarts through local storage.
#[derive(Debug, Clone)]
pub struct TabService {
    active: Tab,
    disabled: BTreeSet<Tab>,
    badges: HashMap<Tab, u32>,
    storage: StorageManager,
}

impl TabService {
    pub fn new(storage: StorageManager) -> Self {
        Self {
            active: Tab::Expense,
            disabled: BTreeSet::new(),
            badges: HashMap::new(),
            storage,
        }
    }

    pub fn current_tab(&self) -> Tab {
        self.active
    }

    pub fn is_active(&self, tab: Tab) -> bool {
        self.active == tab
    }

    /// Restore the persisted tab (default `expenseTab`).
    pub fn load_saved_tab(&mut self) -> Option<TabChange> {
        let saved: String = self
            .storage
            .get_or(ACTIVE_TAB_KEY, Tab::Expense.id().to_string());
        let tab = Tab::from_id(&saved)?;
        self.switch_tab(tab)
    }

    /// Make `tab` active. No-op (returns `None`) if it already is, or if it
    /// is disabled.
    pub fn switch_tab(&mut self, tab: Tab) -> Option<TabChange> {
        if self.active == tab || self.disabled.contains(&tab) {
            return None;
        }
        debug!(from = %self.active, to = %tab, "switching tab");

        let change = TabChange {
            previous: self.active,
            current: tab,
            timestamp: Utc::now(),
        };
        self.active = tab;
        self.storage.set(ACTIVE_TAB_KEY, tab.id());
        Some(change)
    }

    /// Handle a Ctrl/Cmd + digit shortcut.
    pub fn handle_shortcut(&mut self, key: char) -> Option<TabChange> {
        Tab::from_shortcut(key).and_then(|tab| self.switch_tab(tab))
    }

    pub fn is_disabled(&self, tab: Tab) -> bool {
        self.disabled.contains(&tab)
    }

    /// Disable `tab`. If it was active, the first enabled tab takes over.
    pub fn disable_tab(&mut self, tab: Tab) -> Option<TabChange> {
        self.disabled.insert(tab);
        if self.active != tab {
            return None;
        }
        let fallback = Tab::ALL.into_iter().find(|t| !self.disabled.contains(t))?;
        self.switch_tab(fallback)
    }

    pub fn enable_tab(&mut self, tab: Tab) {
        self.disabled.remove(&tab);
    }

    /// Tabs that can currently be selected.
    pub fn available_tabs(&self) -> Vec<Tab> {
        Tab::ALL
            .into_iter()
            .filter(|t| !self.disabled.contains(t))
            .collect()
    }

    // ── Notification badges ─────────────────────────────────────────

    pub fn set_badge(&mut self, tab: Tab, count: u32) {
        self.badges.insert(tab, count);
    }

    pub fn badge_count(&self, tab: Tab) -> u32 {
        self.badges.get(&tab).copied().unwrap_or(0)
    }

    pub fn clear_badge(&mut self, tab: Tab) {
        self.badges.remove(&tab);
    }

    /// Text of the badge on `tab`; `None` when hidden (no count or zero).
    pub fn badge_text(&self, tab: Tab) -> Option<String> {
        match self.badges.get(&tab).copied() {
            None | Some(0) => None,
            Some(n) if n > MAX_BADGE => Some(format!("{MAX_BADGE}+")),
            Some(n) => Some(n.to_string()),
        }
    }
}
