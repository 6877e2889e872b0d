use tracing::debug;

use crate::model::*;

use super::capacity::{check_capacity, occupancy, resolve_slot};
use super::{SeatingEngine, SeatingError};

/// Result of an accepted `seat` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SeatOutcome {
    /// The occurrence that was seated, with its resolved gender.
    pub occurrence: GuestRef,
    pub table_id: TableId,
    pub previous: Option<TableId>,
    /// The table was neutral and got claimed for the occurrence's gender.
    pub claimed: bool,
}

impl SeatingEngine {
    /// Seat a guest occurrence at a table, moving it from any table it
    /// currently occupies.
    ///
    /// Every check runs before anything is mutated, so a rejected move
    /// leaves the store untouched.
    pub fn seat(&mut self, guest: GuestRef, table_id: TableId) -> Result<SeatOutcome, SeatingError> {
        let table = self
            .store
            .table(&table_id)
            .ok_or(SeatingError::TableNotFound(table_id))?;
        let g = self
            .roster
            .get(&guest.guest_id)
            .ok_or(SeatingError::GuestNotFound(guest.guest_id))?;
        let slot = resolve_slot(g, guest.gender, self.separated)?;
        let key = GuestRef {
            guest_id: guest.guest_id,
            gender: slot,
        };
        let requested = g.count_for(slot);
        if requested == 0 {
            return Err(SeatingError::EmptyOccurrence(key));
        }

        let previous = self.store.table_of(&key);
        if previous == Some(table_id) {
            return Ok(SeatOutcome {
                occurrence: key,
                table_id,
                previous,
                claimed: false,
            });
        }

        let mut claim = None;
        if let Some(gender) = slot {
            match table.gender {
                Partition::Neutral => {
                    if self.store.is_occupied(&table_id) {
                        return Err(SeatingError::NeutralTableOccupied(table_id));
                    }
                    claim = Some(Partition::from(gender));
                }
                p if p == Partition::from(gender) => {}
                p => {
                    return Err(SeatingError::GenderMismatch {
                        table_id,
                        table: p,
                        guest: gender,
                    });
                }
            }
        }

        let occupied = occupancy(&self.store, &self.roster, &table_id);
        check_capacity(table, occupied, requested)?;

        // Validated; commit.
        if let Some(prev) = previous {
            self.store.remove(&key);
            self.after_vacate(&prev);
        }
        if let Some(partition) = claim {
            self.relocate(&table_id, partition);
        }
        self.store.place(key, table_id);
        self.refresh_name(&table_id);

        debug!(guest = %key, table = %table_id, from = ?previous, "seated");
        Ok(SeatOutcome {
            occurrence: key,
            table_id,
            previous,
            claimed: claim.is_some(),
        })
    }

    /// Remove a guest occurrence from whichever table holds it. Without an
    /// explicit gender in a separated event both occurrences are removed.
    ///
    /// Unseating someone who is not seated is a no-op. Returns the tables
    /// that were vacated.
    pub fn unseat(&mut self, guest: GuestRef) -> Vec<TableId> {
        let keys = match (self.separated, guest.gender) {
            (false, _) => vec![GuestRef::whole(guest.guest_id)],
            (true, Some(_)) => vec![guest],
            (true, None) => vec![GuestRef::male(guest.guest_id), GuestRef::female(guest.guest_id)],
        };
        let mut vacated = Vec::new();
        for key in keys {
            if let Some(table_id) = self.store.remove(&key) {
                self.after_vacate(&table_id);
                debug!(guest = %key, table = %table_id, "unseated");
                vacated.push(table_id);
            }
        }
        vacated
    }

    /// Empty gendered tables revert to neutral; names follow the occupants.
    fn after_vacate(&mut self, table_id: &TableId) {
        let revert = self
            .store
            .table(table_id)
            .is_some_and(|t| t.gender != Partition::Neutral)
            && !self.store.is_occupied(table_id);
        if revert {
            self.relocate(table_id, Partition::Neutral);
        }
        self.refresh_name(table_id);
    }
}
