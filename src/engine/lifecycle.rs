use tracing::{debug, info};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::capacity::{occupancy, validate_capacity};
use super::naming::{auto_name, next_number};
use super::placement::{find_free_position, grid_position};
use super::{SeatingEngine, SeatingError};

impl SeatingEngine {
    /// Create a draft table. A requested position is nudged clear of every
    /// other table; without one the table goes to the next free neutral grid
    /// cell.
    pub fn add_table(&mut self, spec: NewTable) -> Result<TableId, SeatingError> {
        if self.store.table_count() >= MAX_TABLES_PER_EVENT {
            return Err(SeatingError::LimitExceeded("too many tables"));
        }
        let capacity = spec.capacity.unwrap_or_else(|| {
            self.preferences
                .preferred_table_size
                .clamp(MIN_TABLE_CAPACITY, MAX_TABLE_CAPACITY)
        });
        validate_capacity(capacity)?;
        if let Some(ref n) = spec.name
            && n.len() > MAX_NAME_LEN
        {
            return Err(SeatingError::LimitExceeded("table name too long"));
        }
        if spec.notes.len() > MAX_NOTES_LEN {
            return Err(SeatingError::LimitExceeded("table notes too long"));
        }

        let id = Ulid::new();
        let size = Size::for_table(spec.kind, capacity);
        let position = match spec.position {
            Some(requested) => find_free_position(requested, size, &self.footprints(None, None)),
            None => grid_position(
                Partition::Neutral,
                size,
                &self.footprints(Some(Partition::Neutral), None),
            ),
        };
        let name = match spec.name.filter(|n| !n.trim().is_empty()) {
            Some(name) => {
                self.manual_names.insert(id);
                name
            }
            None => auto_name(
                &self.label,
                next_number(self.store.tables().map(|t| t.name.as_str()), &self.label),
                None,
            ),
        };

        self.store.insert_table(Table {
            id,
            name,
            kind: spec.kind,
            capacity,
            position,
            size,
            rotation: spec.rotation,
            gender: Partition::Neutral,
            notes: spec.notes,
            draft: true,
        });
        debug!(table = %id, capacity, "table added");
        Ok(id)
    }

    /// Create one draft table per capacity, all-or-nothing.
    pub fn add_tables(&mut self, capacities: &[u32]) -> Result<Vec<TableId>, SeatingError> {
        if self.store.table_count() + capacities.len() > MAX_TABLES_PER_EVENT {
            return Err(SeatingError::LimitExceeded("too many tables"));
        }
        for cap in capacities {
            validate_capacity(*cap)?;
        }
        let mut ids = Vec::with_capacity(capacities.len());
        for cap in capacities {
            ids.push(self.add_table(NewTable {
                capacity: Some(*cap),
                ..Default::default()
            })?);
        }
        Ok(ids)
    }

    /// Make a draft permanent.
    pub fn confirm_table(&mut self, id: TableId) -> Result<(), SeatingError> {
        let table = self
            .store
            .table_mut(&id)
            .ok_or(SeatingError::TableNotFound(id))?;
        table.draft = false;
        Ok(())
    }

    /// Drop a table that was never confirmed.
    pub fn discard_draft(&mut self, id: TableId) -> Result<Vec<GuestRef>, SeatingError> {
        let table = self.store.table(&id).ok_or(SeatingError::TableNotFound(id))?;
        if !table.draft {
            return Err(SeatingError::NotDraft(id));
        }
        self.delete_table(id)
    }

    pub fn update_table(&mut self, id: TableId, update: TableUpdate) -> Result<(), SeatingError> {
        let occupied = occupancy(&self.store, &self.roster, &id);
        let table = self.store.table(&id).ok_or(SeatingError::TableNotFound(id))?;
        if let Some(capacity) = update.capacity {
            validate_capacity(capacity)?;
            if capacity < occupied {
                return Err(SeatingError::CapacityBelowOccupancy {
                    table_id: id,
                    capacity,
                    occupied,
                });
            }
        }
        if let Some(ref n) = update.name
            && n.len() > MAX_NAME_LEN
        {
            return Err(SeatingError::LimitExceeded("table name too long"));
        }
        if let Some(ref n) = update.notes
            && n.len() > MAX_NOTES_LEN
        {
            return Err(SeatingError::LimitExceeded("table notes too long"));
        }
        let reshaped = update.kind.is_some_and(|k| k != table.kind)
            || update.capacity.is_some_and(|c| c != table.capacity);

        let Some(table) = self.store.table_mut(&id) else {
            return Err(SeatingError::TableNotFound(id));
        };
        if let Some(kind) = update.kind {
            table.kind = kind;
        }
        if let Some(capacity) = update.capacity {
            table.capacity = capacity;
        }
        match update.size {
            Some(size) => table.size = size,
            None if reshaped => table.size = Size::for_table(table.kind, table.capacity),
            None => {}
        }
        if let Some(position) = update.position {
            table.position = position;
        }
        if let Some(rotation) = update.rotation {
            table.rotation = rotation;
        }
        if let Some(notes) = update.notes {
            table.notes = notes;
        }

        if update.reset_name {
            self.manual_names.remove(&id);
            self.refresh_name(&id);
        } else if let Some(name) = update.name.filter(|n| !n.trim().is_empty()) {
            self.manual_names.insert(id);
            if let Some(table) = self.store.table_mut(&id) {
                table.name = name;
            }
        }
        Ok(())
    }

    /// Remove a table and its arrangement entries. Displaced guests become
    /// unseated; they are never reassigned.
    pub fn delete_table(&mut self, id: TableId) -> Result<Vec<GuestRef>, SeatingError> {
        let (_, displaced) = self
            .store
            .remove_table(&id)
            .ok_or(SeatingError::TableNotFound(id))?;
        self.manual_names.remove(&id);
        info!(table = %id, displaced = displaced.len(), "table deleted");
        Ok(displaced)
    }

    /// Move a table into another partition, repositioning it on that
    /// partition's grid. Only separated events have gendered partitions, and
    /// occupants must all belong to the target partition.
    pub fn migrate_table(&mut self, id: TableId, partition: Partition) -> Result<(), SeatingError> {
        let table = self.store.table(&id).ok_or(SeatingError::TableNotFound(id))?;
        if table.gender == partition {
            return Ok(());
        }
        if !self.separated {
            return Err(SeatingError::NotSeparated(id));
        }
        for occ in self.store.occupants(&id) {
            match (partition.gender(), occ.gender) {
                (None, _) => return Err(SeatingError::NeutralTableOccupied(id)),
                (Some(_), None) => {
                    return Err(SeatingError::WholePartyOccupant {
                        table_id: id,
                        guest_id: occ.guest_id,
                    });
                }
                (Some(target), Some(g)) if target != g => {
                    return Err(SeatingError::GenderMismatch {
                        table_id: id,
                        table: partition,
                        guest: g,
                    });
                }
                _ => {}
            }
        }
        self.relocate(&id, partition);
        self.refresh_name(&id);
        Ok(())
    }

    /// Retag and reposition without validation.
    pub(super) fn relocate(&mut self, id: &TableId, partition: Partition) {
        let Some(size) = self.store.table(id).map(|t| t.size) else {
            return;
        };
        let position = grid_position(partition, size, &self.footprints(Some(partition), Some(*id)));
        if let Some(table) = self.store.table_mut(id) {
            debug!(table = %id, from = %table.gender, to = %partition, "table migrated");
            table.gender = partition;
            table.position = position;
        }
    }

    /// Drop every table and arrangement.
    pub fn clear_all(&mut self) {
        let tables = self.store.table_count();
        self.store.clear();
        self.manual_names.clear();
        info!(tables, "seating cleared");
    }
}
