use std::collections::HashMap;

use crate::limits::*;
use crate::model::*;

use super::store::ArrangementStore;
use super::SeatingError;

pub(crate) fn validate_capacity(capacity: u32) -> Result<(), SeatingError> {
    if !(MIN_TABLE_CAPACITY..=MAX_TABLE_CAPACITY).contains(&capacity) {
        return Err(SeatingError::InvalidCapacity(capacity));
    }
    Ok(())
}

/// Which arrangement an occurrence belongs to.
///
/// Non-separated events always seat the whole party. Separated events use
/// the explicit suffix if given, else the guest's only non-zero count.
pub(crate) fn resolve_slot(
    guest: &Guest,
    explicit: Option<Gender>,
    separated: bool,
) -> Result<Option<Gender>, SeatingError> {
    if !separated {
        return Ok(None);
    }
    explicit
        .or_else(|| guest.single_gender())
        .map(Some)
        .ok_or(SeatingError::CannotDetermineGender(guest.id))
}

/// Summed contribution of everyone seated at a table. Guests missing from
/// the roster contribute nothing.
pub(crate) fn occupancy(
    store: &ArrangementStore,
    roster: &HashMap<GuestId, Guest>,
    table_id: &TableId,
) -> u32 {
    store
        .occupants(table_id)
        .iter()
        .map(|occ| {
            roster
                .get(&occ.guest_id)
                .map_or(0, |g| g.count_for(occ.gender))
        })
        .sum()
}

pub(crate) fn check_capacity(table: &Table, occupied: u32, requested: u32) -> Result<(), SeatingError> {
    let available = table.capacity.saturating_sub(occupied);
    if requested > available {
        return Err(SeatingError::CapacityExceeded {
            table_id: table.id,
            table: table.name.clone(),
            capacity: table.capacity,
            requested,
            available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn capacity_bounds_are_inclusive() {
        assert!(validate_capacity(MIN_TABLE_CAPACITY).is_ok());
        assert!(validate_capacity(MAX_TABLE_CAPACITY).is_ok());
        assert_eq!(validate_capacity(7), Err(SeatingError::InvalidCapacity(7)));
        assert_eq!(validate_capacity(37), Err(SeatingError::InvalidCapacity(37)));
    }

    #[test]
    fn slot_resolution_order() {
        let mut g = Guest::new(Ulid::new(), "a", 3);
        assert_eq!(resolve_slot(&g, Some(Gender::Male), false), Ok(None));
        assert_eq!(
            resolve_slot(&g, None, true),
            Err(SeatingError::CannotDetermineGender(g.id))
        );
        g.female_count = 2;
        assert_eq!(resolve_slot(&g, None, true), Ok(Some(Gender::Female)));
        assert_eq!(resolve_slot(&g, Some(Gender::Male), true), Ok(Some(Gender::Male)));
    }

    #[test]
    fn check_capacity_reports_numbers() {
        let t = Table::new(Ulid::new(), "Table 1", TableType::Round, 10);
        assert!(check_capacity(&t, 4, 6).is_ok());
        match check_capacity(&t, 4, 7) {
            Err(SeatingError::CapacityExceeded { capacity, requested, available, .. }) => {
                assert_eq!((capacity, requested, available), (10, 7, 6));
            }
            other => panic!("unexpected {other:?}"),
        }
        // Already over capacity: zero available, not an underflow.
        assert!(matches!(
            check_capacity(&t, 12, 1),
            Err(SeatingError::CapacityExceeded { available: 0, .. })
        ));
    }
}
