mod allocator;
mod capacity;
mod error;
mod lifecycle;
pub mod naming;
pub mod placement;
mod queries;
mod store;
#[cfg(test)]
mod tests;

pub use allocator::SeatOutcome;
pub use error::SeatingError;
pub use queries::{Headcount, SeatingStats, TableSummary};
pub use store::ArrangementStore;

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::model::*;

use naming::{auto_name, dominant_group, next_number, parse_auto_name};
use placement::Rect;

/// Everything one seating session mutates: the arrangement store plus the
/// roster, preferences, layout and naming markers it is evaluated against.
///
/// All operations are synchronous; a session owns exactly one engine and is
/// its only writer.
#[derive(Debug, Clone)]
pub struct SeatingEngine {
    store: ArrangementStore,
    roster: HashMap<GuestId, Guest>,
    /// Roster ids in the order the provider returned them.
    roster_order: Vec<GuestId>,
    preferences: Preferences,
    layout: Layout,
    separated: bool,
    label: String,
    /// Tables whose name was set by hand; auto-naming leaves them alone.
    manual_names: HashSet<TableId>,
}

impl SeatingEngine {
    pub fn new(label: impl Into<String>, separated: bool) -> Self {
        Self {
            store: ArrangementStore::new(),
            roster: HashMap::new(),
            roster_order: Vec::new(),
            preferences: Preferences::default(),
            layout: Layout::default(),
            separated,
            label: label.into(),
            manual_names: HashSet::new(),
        }
    }

    pub fn store(&self) -> &ArrangementStore {
        &self.store
    }

    pub fn is_separated(&self) -> bool {
        self.separated
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_manually_named(&self, table_id: &TableId) -> bool {
        self.manual_names.contains(table_id)
    }

    // ── Snapshot exchange ────────────────────────────────────

    /// Replace tables, arrangements, preferences and layout wholesale.
    ///
    /// Manual-name markers come from the snapshot when it carries them;
    /// otherwise the markers of tables that survive the load are kept.
    pub fn load_snapshot(&mut self, snapshot: &SeatingSnapshot) {
        self.load_tables(snapshot);
        self.preferences = snapshot.preferences.clone();
        self.layout = snapshot.layout.clone();
        if let Some(ids) = &snapshot.manual_names {
            self.manual_names = ids
                .iter()
                .filter(|id| self.store.contains_table(id))
                .copied()
                .collect();
        }
        debug!(
            tables = self.store.table_count(),
            seated = self.store.seated_count(),
            "loaded seating snapshot"
        );
    }

    /// Replace only tables and arrangements, keeping preferences, layout
    /// and the manual-name markers of tables that survive. Tables new to
    /// the session are auto-named.
    pub fn load_arrangement(&mut self, snapshot: &SeatingSnapshot) {
        self.load_tables(snapshot);
        debug!(
            tables = self.store.table_count(),
            seated = self.store.seated_count(),
            "loaded arrangement"
        );
    }

    fn load_tables(&mut self, snapshot: &SeatingSnapshot) {
        self.store = ArrangementStore::from_snapshot(snapshot);
        let store = &self.store;
        self.manual_names.retain(|id| store.contains_table(id));
    }

    pub fn snapshot(&self) -> SeatingSnapshot {
        let mut snapshot = SeatingSnapshot {
            preferences: self.preferences.clone(),
            layout: self.layout.clone(),
            ..Default::default()
        };
        self.store.fill_snapshot(&mut snapshot);
        let mut manual: Vec<TableId> = self.manual_names.iter().copied().collect();
        manual.sort();
        snapshot.manual_names = Some(manual);
        snapshot
    }

    // ── Roster ───────────────────────────────────────────────

    pub fn set_roster(&mut self, guests: Vec<Guest>) {
        self.roster_order = guests.iter().map(|g| g.id).collect();
        self.roster = guests.into_iter().map(|g| (g.id, g)).collect();
    }

    pub fn guest(&self, id: &GuestId) -> Option<&Guest> {
        self.roster.get(id)
    }

    /// Roster in provider order.
    pub fn guests(&self) -> impl Iterator<Item = &Guest> {
        self.roster_order.iter().filter_map(|id| self.roster.get(id))
    }

    pub fn roster_snapshot(&self) -> Vec<Guest> {
        self.guests().cloned().collect()
    }

    // ── Preferences & layout ─────────────────────────────────

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Install new preferences. Must-sit-together pairs are only honoured
    /// within one group; cross-group or unknown pairs are dropped. Returns
    /// the number of dropped pairs.
    pub fn set_preferences(&mut self, mut preferences: Preferences) -> usize {
        let before = preferences.must_sit_together.len();
        preferences.must_sit_together.retain(|pair| {
            let groups = (
                self.roster.get(&pair.guest1).map(|g| g.group_label()),
                self.roster.get(&pair.guest2).map(|g| g.group_label()),
            );
            match groups {
                (Some(Some(a)), Some(Some(b))) if a == b && pair.guest1 != pair.guest2 => true,
                _ => {
                    warn!(
                        "dropping must-sit-together pair {} / {}: not in the same group",
                        pair.guest1, pair.guest2
                    );
                    false
                }
            }
        });
        let dropped = before - preferences.must_sit_together.len();
        self.preferences = preferences;
        dropped
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = layout;
    }

    // ── Shared helpers ───────────────────────────────────────

    /// Footprints of tables in a partition, optionally leaving one out.
    pub(super) fn footprints(&self, partition: Option<Partition>, exclude: Option<TableId>) -> Vec<Rect> {
        self.store
            .tables()
            .filter(|t| partition.is_none_or(|p| t.gender == p))
            .filter(|t| Some(t.id) != exclude)
            .map(|t| Rect::of(t.position, t.size))
            .collect()
    }

    pub(super) fn dominant_group_at(&self, table_id: &TableId) -> Option<String> {
        let occupants = self.store.occupants(table_id);
        dominant_group(occupants.iter().filter_map(|occ| {
            self.roster
                .get(&occ.guest_id)
                .map(|g| (g.group_label(), g.count_for(occ.gender)))
        }))
    }

    /// Recompute an auto-named table's name from its current occupants.
    pub(super) fn refresh_name(&mut self, table_id: &TableId) {
        if self.manual_names.contains(table_id) {
            return;
        }
        let Some(table) = self.store.table(table_id) else {
            return;
        };
        let number = parse_auto_name(&table.name, &self.label).unwrap_or_else(|| {
            next_number(
                self.store
                    .tables()
                    .filter(|t| t.id != *table_id)
                    .map(|t| t.name.as_str()),
                &self.label,
            )
        });
        let name = auto_name(&self.label, number, self.dominant_group_at(table_id).as_deref());
        if let Some(table) = self.store.table_mut(table_id) {
            table.name = name;
        }
    }

    /// Rename every auto-named table after a bulk change.
    pub fn refresh_all_names(&mut self) {
        for id in self.store.table_ids() {
            self.refresh_name(&id);
        }
    }
}
