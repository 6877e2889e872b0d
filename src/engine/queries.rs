use serde::Serialize;

use crate::model::*;

use super::capacity::occupancy;
use super::{SeatingEngine, SeatingError};

/// Read-side view of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableSummary {
    pub id: TableId,
    pub name: String,
    pub partition: Partition,
    pub capacity: u32,
    pub occupied: u32,
    pub over_capacity: bool,
    pub draft: bool,
    pub dominant_group: Option<String>,
    pub guests: Vec<GuestRef>,
}

/// Confirmed headcount that needs seats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Headcount {
    pub total: u32,
    pub male: u32,
    pub female: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatingStats {
    pub tables: usize,
    pub total_capacity: u32,
    pub needed: u32,
    pub seated: u32,
    pub over_capacity_tables: usize,
}

impl SeatingEngine {
    pub fn occupancy(&self, table_id: TableId) -> Result<u32, SeatingError> {
        if !self.store.contains_table(&table_id) {
            return Err(SeatingError::TableNotFound(table_id));
        }
        Ok(occupancy(&self.store, &self.roster, &table_id))
    }

    pub fn free_seats(&self, table_id: TableId) -> Result<u32, SeatingError> {
        let table = self
            .store
            .table(&table_id)
            .ok_or(SeatingError::TableNotFound(table_id))?;
        Ok(table.capacity.saturating_sub(self.occupancy(table_id)?))
    }

    /// Tables holding more than their capacity. Only reachable through
    /// roster changes made elsewhere; such tables are flagged, never trimmed.
    pub fn over_capacity_tables(&self) -> Vec<TableId> {
        self.store
            .tables()
            .filter(|t| occupancy(&self.store, &self.roster, &t.id) > t.capacity)
            .map(|t| t.id)
            .collect()
    }

    /// Confirmed occurrences with headcount that are not at any table, in
    /// roster order.
    pub fn unseated(&self) -> Vec<GuestRef> {
        let slots: &[Option<Gender>] = if self.separated {
            &[Some(Gender::Male), Some(Gender::Female)]
        } else {
            &[None]
        };
        let mut out = Vec::new();
        for guest in self.guests().filter(|g| g.is_confirmed()) {
            for slot in slots {
                let key = GuestRef {
                    guest_id: guest.id,
                    gender: *slot,
                };
                if guest.count_for(*slot) > 0 && self.store.table_of(&key).is_none() {
                    out.push(key);
                }
            }
        }
        out
    }

    pub fn needed_seats(&self) -> Headcount {
        let mut hc = Headcount::default();
        for guest in self.guests().filter(|g| g.is_confirmed()) {
            if self.separated {
                hc.male += guest.male_count;
                hc.female += guest.female_count;
                hc.total += guest.male_count + guest.female_count;
            } else {
                hc.total += guest.party_size;
            }
        }
        hc
    }

    pub fn table_summary(&self, table_id: TableId) -> Result<TableSummary, SeatingError> {
        let table = self
            .store
            .table(&table_id)
            .ok_or(SeatingError::TableNotFound(table_id))?;
        let occupied = occupancy(&self.store, &self.roster, &table_id);
        Ok(TableSummary {
            id: table.id,
            name: table.name.clone(),
            partition: table.gender,
            capacity: table.capacity,
            occupied,
            over_capacity: occupied > table.capacity,
            draft: table.draft,
            dominant_group: self.dominant_group_at(&table_id),
            guests: self.store.occupants(&table_id),
        })
    }

    pub fn table_summaries(&self) -> Vec<TableSummary> {
        self.store
            .table_ids()
            .into_iter()
            .filter_map(|id| self.table_summary(id).ok())
            .collect()
    }

    pub fn stats(&self) -> SeatingStats {
        let mut stats = SeatingStats {
            tables: self.store.table_count(),
            needed: self.needed_seats().total,
            ..Default::default()
        };
        for table in self.store.tables() {
            let occupied = occupancy(&self.store, &self.roster, &table.id);
            stats.total_capacity += table.capacity;
            stats.seated += occupied;
            if occupied > table.capacity {
                stats.over_capacity_tables += 1;
            }
        }
        stats
    }
}
