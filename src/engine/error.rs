use ulid::Ulid;

use crate::model::{Gender, GuestRef, Partition};

#[derive(Debug, Clone, PartialEq)]
pub enum SeatingError {
    CapacityExceeded {
        table_id: Ulid,
        table: String,
        capacity: u32,
        requested: u32,
        available: u32,
    },
    GenderMismatch {
        table_id: Ulid,
        table: Partition,
        guest: Gender,
    },
    NeutralTableOccupied(Ulid),
    /// Gendered partitions only exist when seating is separated.
    NotSeparated(Ulid),
    /// A table holding whole parties cannot move into a gendered partition.
    WholePartyOccupant {
        table_id: Ulid,
        guest_id: Ulid,
    },
    CannotDetermineGender(Ulid),
    TableNotFound(Ulid),
    GuestNotFound(Ulid),
    EmptyOccurrence(GuestRef),
    InvalidCapacity(u32),
    CapacityBelowOccupancy {
        table_id: Ulid,
        capacity: u32,
        occupied: u32,
    },
    NotDraft(Ulid),
    LimitExceeded(&'static str),
}

impl SeatingError {
    /// Short machine-readable kind, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            SeatingError::CapacityExceeded { .. } => "capacity_exceeded",
            SeatingError::GenderMismatch { .. } => "gender_mismatch",
            SeatingError::NeutralTableOccupied(_) => "neutral_table_occupied",
            SeatingError::NotSeparated(_) => "not_separated",
            SeatingError::WholePartyOccupant { .. } => "whole_party_occupant",
            SeatingError::CannotDetermineGender(_) => "cannot_determine_gender",
            SeatingError::TableNotFound(_) => "table_not_found",
            SeatingError::GuestNotFound(_) => "guest_not_found",
            SeatingError::EmptyOccurrence(_) => "empty_occurrence",
            SeatingError::InvalidCapacity(_) => "invalid_capacity",
            SeatingError::CapacityBelowOccupancy { .. } => "capacity_below_occupancy",
            SeatingError::NotDraft(_) => "not_draft",
            SeatingError::LimitExceeded(_) => "limit_exceeded",
        }
    }
}

impl std::fmt::Display for SeatingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeatingError::CapacityExceeded {
                table,
                capacity,
                requested,
                available,
                ..
            } => write!(
                f,
                "table {table} (capacity {capacity}) has {available} free seats, {requested} needed"
            ),
            SeatingError::GenderMismatch { table_id, table, guest } => {
                write!(f, "table {table_id} is {table}, cannot seat {guest} guests")
            }
            SeatingError::NeutralTableOccupied(id) => {
                write!(f, "neutral table {id} is already occupied")
            }
            SeatingError::NotSeparated(id) => {
                write!(f, "table {id} cannot change partition: seating is not separated")
            }
            SeatingError::WholePartyOccupant { table_id, guest_id } => write!(
                f,
                "table {table_id} seats the whole party of guest {guest_id} and cannot be gendered"
            ),
            SeatingError::CannotDetermineGender(id) => {
                write!(f, "cannot determine which occurrence of guest {id} to seat")
            }
            SeatingError::TableNotFound(id) => write!(f, "table not found: {id}"),
            SeatingError::GuestNotFound(id) => write!(f, "guest not found: {id}"),
            SeatingError::EmptyOccurrence(r) => write!(f, "guest occurrence {r} has no headcount"),
            SeatingError::InvalidCapacity(cap) => write!(
                f,
                "capacity {cap} out of range [{}, {}]",
                crate::limits::MIN_TABLE_CAPACITY,
                crate::limits::MAX_TABLE_CAPACITY
            ),
            SeatingError::CapacityBelowOccupancy {
                table_id,
                capacity,
                occupied,
            } => write!(
                f,
                "cannot reduce table {table_id} to {capacity}: {occupied} seats occupied"
            ),
            SeatingError::NotDraft(id) => write!(f, "table {id} is not a draft"),
            SeatingError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for SeatingError {}
