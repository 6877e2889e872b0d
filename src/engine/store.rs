use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::model::*;

/// In-memory tables and guest→table mappings.
///
/// Tables live in one keyed store and carry their partition tag; the three
/// arrangements are keyed by the occurrence's gender (`None` for the whole
/// guest in non-separated events). `seat_index` is the reverse lookup that
/// enforces one table per occurrence.
#[derive(Debug, Clone, Default)]
pub struct ArrangementStore {
    tables: BTreeMap<TableId, Table>,
    neutral: Arrangement,
    male: Arrangement,
    female: Arrangement,
    seat_index: HashMap<GuestRef, TableId>,
}

impl ArrangementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a persisted snapshot. Duplicate occurrences keep their
    /// first table; entries pointing at unknown tables are dropped.
    pub fn from_snapshot(snapshot: &SeatingSnapshot) -> Self {
        let mut store = Self::new();
        for (tables, partition) in [
            (&snapshot.tables, Partition::Neutral),
            (&snapshot.male_tables, Partition::Male),
            (&snapshot.female_tables, Partition::Female),
        ] {
            for table in tables {
                let mut table = table.clone();
                if partition != Partition::Neutral {
                    table.gender = partition;
                }
                store.tables.insert(table.id, table);
            }
        }
        for (arrangement, slot) in [
            (&snapshot.arrangement, None),
            (&snapshot.male_arrangement, Some(Gender::Male)),
            (&snapshot.female_arrangement, Some(Gender::Female)),
        ] {
            for (table_id, guests) in arrangement {
                if !store.tables.contains_key(table_id) {
                    warn!("snapshot arrangement references unknown table {table_id}");
                    continue;
                }
                for guest_id in guests {
                    let key = GuestRef { guest_id: *guest_id, gender: slot };
                    if let Some(existing) = store.seat_index.get(&key) {
                        warn!("occurrence {key} seated at {existing} and {table_id}; keeping first");
                        continue;
                    }
                    store.place(key, *table_id);
                }
            }
        }
        store
    }

    /// Split tables back into the per-partition lists of the snapshot.
    pub fn fill_snapshot(&self, snapshot: &mut SeatingSnapshot) {
        snapshot.tables.clear();
        snapshot.male_tables.clear();
        snapshot.female_tables.clear();
        for table in self.tables.values() {
            match table.gender {
                Partition::Neutral => snapshot.tables.push(table.clone()),
                Partition::Male => snapshot.male_tables.push(table.clone()),
                Partition::Female => snapshot.female_tables.push(table.clone()),
            }
        }
        snapshot.arrangement = self.neutral.clone();
        snapshot.male_arrangement = self.male.clone();
        snapshot.female_arrangement = self.female.clone();
    }

    // ── Tables ───────────────────────────────────────────────

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn contains_table(&self, id: &TableId) -> bool {
        self.tables.contains_key(id)
    }

    pub fn table(&self, id: &TableId) -> Option<&Table> {
        self.tables.get(id)
    }

    pub fn table_mut(&mut self, id: &TableId) -> Option<&mut Table> {
        self.tables.get_mut(id)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    pub fn tables_in(&self, partition: Partition) -> impl Iterator<Item = &Table> {
        self.tables.values().filter(move |t| t.gender == partition)
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        self.tables.keys().copied().collect()
    }

    pub fn insert_table(&mut self, table: Table) {
        self.tables.insert(table.id, table);
    }

    /// Remove a table and every arrangement entry for it. Returns the table
    /// and the occurrences that were seated there.
    pub fn remove_table(&mut self, id: &TableId) -> Option<(Table, Vec<GuestRef>)> {
        let table = self.tables.remove(id)?;
        let displaced = self.occupants(id);
        for key in &displaced {
            self.seat_index.remove(key);
        }
        self.neutral.remove(id);
        self.male.remove(id);
        self.female.remove(id);
        Some((table, displaced))
    }

    pub fn clear(&mut self) {
        self.tables.clear();
        self.neutral.clear();
        self.male.clear();
        self.female.clear();
        self.seat_index.clear();
    }

    // ── Arrangements ─────────────────────────────────────────

    pub fn arrangement(&self, slot: Option<Gender>) -> &Arrangement {
        match slot {
            None => &self.neutral,
            Some(Gender::Male) => &self.male,
            Some(Gender::Female) => &self.female,
        }
    }

    fn arrangement_mut(&mut self, slot: Option<Gender>) -> &mut Arrangement {
        match slot {
            None => &mut self.neutral,
            Some(Gender::Male) => &mut self.male,
            Some(Gender::Female) => &mut self.female,
        }
    }

    pub fn seated_at(&self, table_id: &TableId, slot: Option<Gender>) -> &[GuestId] {
        self.arrangement(slot)
            .get(table_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every occurrence seated at a table, across all arrangements, in
    /// seating order per arrangement.
    pub fn occupants(&self, table_id: &TableId) -> Vec<GuestRef> {
        let mut out = Vec::new();
        for slot in [None, Some(Gender::Male), Some(Gender::Female)] {
            for guest_id in self.seated_at(table_id, slot) {
                out.push(GuestRef { guest_id: *guest_id, gender: slot });
            }
        }
        out
    }

    pub fn is_occupied(&self, table_id: &TableId) -> bool {
        [None, Some(Gender::Male), Some(Gender::Female)]
            .iter()
            .any(|slot| !self.seated_at(table_id, *slot).is_empty())
    }

    pub fn table_of(&self, key: &GuestRef) -> Option<TableId> {
        self.seat_index.get(key).copied()
    }

    pub fn seated_count(&self) -> usize {
        self.seat_index.len()
    }

    pub fn seated_keys(&self) -> impl Iterator<Item = (&GuestRef, &TableId)> {
        self.seat_index.iter()
    }

    /// Append an occurrence to a table. The caller has already removed it
    /// from any previous table.
    pub(crate) fn place(&mut self, key: GuestRef, table_id: TableId) {
        self.arrangement_mut(key.gender)
            .entry(table_id)
            .or_default()
            .push(key.guest_id);
        self.seat_index.insert(key, table_id);
    }

    /// Remove an occurrence from whichever table holds it.
    pub(crate) fn remove(&mut self, key: &GuestRef) -> Option<TableId> {
        let table_id = self.seat_index.remove(key)?;
        let arrangement = self.arrangement_mut(key.gender);
        if let Some(guests) = arrangement.get_mut(&table_id) {
            guests.retain(|g| *g != key.guest_id);
            if guests.is_empty() {
                arrangement.remove(&table_id);
            }
        }
        Some(table_id)
    }

    pub fn clear_arrangements(&mut self) {
        self.neutral.clear();
        self.male.clear();
        self.female.clear();
        self.seat_index.clear();
    }
}
