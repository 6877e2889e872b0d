//! Table suggestions and create-and-arrange folding.
//!
//! The suggestion collaborator is heuristic; this module only shapes its
//! inputs, warns when the table set looks too small for the rules in force,
//! and folds an accepted arrangement back into the engine.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, warn};

use crate::engine::{SeatingEngine, SeatingError};
use crate::gateway::{ExistingTable, GenerateRequest, SuggestTablesRequest};
use crate::limits::*;
use crate::model::*;

/// Capacities the buffer treats as regular.
const STANDARD_CAPACITIES: [u32; 3] = [8, 10, 12];

const BASE_BUFFER: f64 = 1.05;
const MIXED_SIZE_BUFFER: f64 = 1.15;
const IRREGULAR_SIZE_BUFFER: f64 = 0.10;
const GROUPING_FACTOR: f64 = 1.3;
const STRICT_GROUPING_FACTOR: f64 = 1.6;
const SEPARATED_FACTOR: f64 = 1.25;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuggestionOptions {
    /// Keep the current arrangement and only seat the rest.
    pub preserve_existing: bool,
    /// Only custom-sized tables are used; emergency tables are created on
    /// demand, so no warning is raised.
    pub use_custom_only: bool,
    /// The user edited the suggested counts by hand.
    pub manual_override: bool,
}

impl SuggestionOptions {
    fn suppresses_warning(&self) -> bool {
        self.use_custom_only || self.manual_override
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    fn of(capacity: u32) -> Self {
        match capacity {
            0..=10 => SizeClass::Small,
            11..=14 => SizeClass::Medium,
            _ => SizeClass::Large,
        }
    }
}

/// Required-capacity buffer for a table set. Mixed or irregular sizes pack
/// worse; grouping rules and gender separation leave more seats empty.
pub fn buffer_multiplier(capacities: &[u32], preferences: &Preferences, separated: bool) -> f64 {
    let classes: BTreeSet<SizeClass> = capacities.iter().map(|c| SizeClass::of(*c)).collect();
    let irregular = capacities.iter().any(|c| !STANDARD_CAPACITIES.contains(c));

    let mut multiplier = if classes.len() > 1 {
        MIXED_SIZE_BUFFER
    } else {
        BASE_BUFFER
    };
    if irregular {
        multiplier += IRREGULAR_SIZE_BUFFER;
    }
    if preferences.is_strict() {
        multiplier *= STRICT_GROUPING_FACTOR;
    } else if preferences.has_grouping_rules() {
        multiplier *= GROUPING_FACTOR;
    }
    if separated {
        multiplier *= SEPARATED_FACTOR;
    }
    multiplier.clamp(MIN_BUFFER_MULTIPLIER, MAX_BUFFER_MULTIPLIER)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityWarning {
    pub required: u32,
    pub available: u32,
    pub shortfall: u32,
    pub multiplier: f64,
}

/// Warn when the current tables plus `planned` capacities fall short of the
/// buffered headcount.
pub fn capacity_warning(
    engine: &SeatingEngine,
    planned: &[u32],
    options: SuggestionOptions,
) -> Option<CapacityWarning> {
    if options.suppresses_warning() {
        return None;
    }
    let mut capacities: Vec<u32> = engine.store().tables().map(|t| t.capacity).collect();
    capacities.extend_from_slice(planned);

    let multiplier = buffer_multiplier(&capacities, engine.preferences(), engine.is_separated());
    let needed = engine.needed_seats().total;
    let required = (f64::from(needed) * multiplier).ceil() as u32;
    let available = capacities.iter().fold(0u32, |acc, c| acc.saturating_add(*c));
    if available >= required {
        return None;
    }
    warn!(required, available, multiplier, "table capacity likely insufficient");
    Some(CapacityWarning {
        required,
        available,
        shortfall: required - available,
        multiplier,
    })
}

pub fn suggest_request(engine: &SeatingEngine, options: SuggestionOptions) -> SuggestTablesRequest {
    let headcount = engine.needed_seats();
    let existing_tables = engine
        .store()
        .tables()
        .map(|t| ExistingTable {
            id: t.id,
            capacity: t.capacity,
            occupied: engine.occupancy(t.id).unwrap_or(0),
            gender: t.gender,
        })
        .collect();
    SuggestTablesRequest {
        total_guests: headcount.total,
        male_guests: headcount.male,
        female_guests: headcount.female,
        existing_tables,
        preferences: engine.preferences().clone(),
        preserve_existing: options.preserve_existing,
        is_separated_seating: engine.is_separated(),
    }
}

/// Generation request over the full, already enlarged table set.
pub fn generate_request(engine: &SeatingEngine, options: SuggestionOptions) -> GenerateRequest {
    GenerateRequest {
        guests: engine.guests().filter(|g| g.is_confirmed()).cloned().collect(),
        seating: engine.snapshot(),
        preserve_existing: options.preserve_existing,
        is_separated_seating: engine.is_separated(),
    }
}

/// Adopt a generated arrangement. Draft tables from the batch that came back
/// are confirmed; every auto-named table is renamed for its new occupants.
pub fn fold_generated(engine: &mut SeatingEngine, generated: &SeatingSnapshot, batch: &[TableId]) {
    engine.load_arrangement(generated);
    for id in batch {
        if engine.confirm_table(*id).is_err() {
            debug!(table = %id, "generated arrangement dropped a batch table");
        }
    }
    engine.refresh_all_names();
}

/// Undo a batch after generation failed.
pub fn rollback_batch(engine: &mut SeatingEngine, batch: &[TableId]) {
    for id in batch {
        match engine.discard_draft(*id) {
            Ok(_) | Err(SeatingError::TableNotFound(_)) => {}
            Err(e) => debug!(table = %id, "batch table kept: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    fn strict() -> Preferences {
        let mut p = Preferences {
            allow_group_mixing: false,
            ..Default::default()
        };
        p.group_policies.insert("Family".into(), GroupPolicy::Separate);
        p
    }

    #[test]
    fn uniform_standard_tables_get_base_buffer() {
        let m = buffer_multiplier(&[10, 10, 10], &Preferences::default(), false);
        assert!((m - 1.05).abs() < 1e-9);
    }

    #[test]
    fn mixed_and_irregular_sizes_add_up() {
        // small + medium, 13 is irregular
        let m = buffer_multiplier(&[10, 13], &Preferences::default(), false);
        assert!((m - 1.25).abs() < 1e-9);
    }

    #[test]
    fn rules_and_separation_scale_and_clamp() {
        let rules = Preferences {
            allow_group_mixing: false,
            ..Default::default()
        };
        let m = buffer_multiplier(&[10], &rules, false);
        assert!((m - 1.05 * 1.3).abs() < 1e-9);

        let m = buffer_multiplier(&[10], &strict(), true);
        assert!((m - 1.05 * 1.6 * 1.25).abs() < 1e-9);

        let m = buffer_multiplier(&[8, 13, 20], &strict(), true);
        assert!(m <= MAX_BUFFER_MULTIPLIER);
        assert!((m - MAX_BUFFER_MULTIPLIER).abs() < 1e-9);
    }

    fn engine_needing(seats: u32) -> SeatingEngine {
        let mut e = SeatingEngine::new("Table", false);
        e.set_roster(vec![Guest::new(Ulid::new(), "crowd", seats)]);
        e
    }

    #[test]
    fn warning_when_short_and_suppressed_on_request() {
        let e = engine_needing(30);
        let w = capacity_warning(&e, &[10, 10, 10], SuggestionOptions::default()).unwrap();
        assert_eq!(w.available, 30);
        assert_eq!(w.required, 32);
        assert_eq!(w.shortfall, 2);

        assert!(capacity_warning(&e, &[10, 10, 10, 10], SuggestionOptions::default()).is_none());
        let custom = SuggestionOptions {
            use_custom_only: true,
            ..Default::default()
        };
        assert!(capacity_warning(&e, &[10], custom).is_none());
        let manual = SuggestionOptions {
            manual_override: true,
            ..Default::default()
        };
        assert!(capacity_warning(&e, &[10], manual).is_none());
    }

    #[test]
    fn suggest_request_describes_existing_tables() {
        let mut e = engine_needing(4);
        let guest = e.guests().next().unwrap().id;
        let t = e.add_table(NewTable::default()).unwrap();
        e.seat(guest.into(), t).unwrap();
        let req = suggest_request(&e, SuggestionOptions::default());
        assert_eq!(req.total_guests, 4);
        assert_eq!(req.existing_tables.len(), 1);
        assert_eq!(req.existing_tables[0].occupied, 4);
        assert!(!req.is_separated_seating);
    }

    #[test]
    fn generated_arrangement_confirms_batch_and_renames() {
        let mut e = SeatingEngine::new("Table", false);
        let mut g = Guest::new(Ulid::new(), "Ada", 2);
        g.group = Some("Family".into());
        e.set_roster(vec![g.clone()]);
        let batch = e.add_tables(&[10, 12]).unwrap();

        let mut generated = e.snapshot();
        generated.arrangement.insert(batch[0], vec![g.id]);
        fold_generated(&mut e, &generated, &batch);

        for id in &batch {
            assert!(!e.store().table(id).unwrap().draft);
        }
        assert_eq!(e.store().table(&batch[0]).unwrap().name, "Table 1 - Family");
        assert_eq!(e.store().table(&batch[1]).unwrap().name, "Table 2");
    }

    #[test]
    fn rollback_discards_only_drafts() {
        let mut e = SeatingEngine::new("Table", false);
        let kept = e.add_table(NewTable::default()).unwrap();
        e.confirm_table(kept).unwrap();
        let batch = e.add_tables(&[10, 10]).unwrap();
        rollback_batch(&mut e, &batch);
        assert_eq!(e.store().table_count(), 1);
        assert!(e.store().contains_table(&kept));
    }
}
