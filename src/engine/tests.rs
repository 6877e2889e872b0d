use super::*;
use super::placement::grid_cell;
use crate::limits::*;
use ulid::Ulid;

fn engine(separated: bool) -> SeatingEngine {
    SeatingEngine::new("Table", separated)
}

fn guest(name: &str, party: u32, group: Option<&str>) -> Guest {
    let mut g = Guest::new(Ulid::new(), name, party);
    g.group = group.map(str::to_owned);
    g
}

fn gendered(name: &str, male: u32, female: u32) -> Guest {
    let mut g = Guest::new(Ulid::new(), name, male + female);
    g.male_count = male;
    g.female_count = female;
    g
}

fn table(engine: &mut SeatingEngine, capacity: u32) -> TableId {
    engine
        .add_table(NewTable {
            capacity: Some(capacity),
            ..Default::default()
        })
        .unwrap()
}

/// Sum of contributions at every table never exceeds capacity and every
/// occurrence sits at most once.
fn assert_invariants(engine: &SeatingEngine) {
    for t in engine.store().tables() {
        assert!(engine.occupancy(t.id).unwrap() <= t.capacity, "over capacity: {}", t.name);
    }
    let mut seen = std::collections::HashSet::new();
    for slot in [None, Some(Gender::Male), Some(Gender::Female)] {
        for guests in engine.store().arrangement(slot).values() {
            for g in guests {
                assert!(seen.insert((*g, slot)), "occurrence seated twice: {g}");
            }
        }
    }
}

// ── Capacity allocator ───────────────────────────────────

#[test]
fn seat_until_capacity_then_reject_with_numbers() {
    let mut e = engine(false);
    let t = table(&mut e, 10);
    let a = guest("a", 4, None);
    let b = guest("b", 7, None);
    e.set_roster(vec![a.clone(), b.clone()]);

    e.seat(a.id.into(), t).unwrap();
    assert_eq!(e.occupancy(t).unwrap(), 4);

    match e.seat(b.id.into(), t) {
        Err(SeatingError::CapacityExceeded {
            table_id,
            capacity,
            requested,
            available,
            ..
        }) => {
            assert_eq!(table_id, t);
            assert_eq!((capacity, requested, available), (10, 7, 6));
        }
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }
    assert_eq!(e.occupancy(t).unwrap(), 4);
    assert_eq!(e.store().table_of(&GuestRef::whole(b.id)), None);
}

#[test]
fn seat_fills_table_exactly() {
    let mut e = engine(false);
    let t = table(&mut e, 8);
    let a = guest("a", 5, None);
    let b = guest("b", 3, None);
    e.set_roster(vec![a.clone(), b.clone()]);
    e.seat(a.id.into(), t).unwrap();
    e.seat(b.id.into(), t).unwrap();
    assert_eq!(e.free_seats(t).unwrap(), 0);
}

#[test]
fn move_removes_from_previous_table() {
    let mut e = engine(false);
    let t1 = table(&mut e, 10);
    let t2 = table(&mut e, 10);
    let a = guest("a", 2, None);
    e.set_roster(vec![a.clone()]);

    e.seat(a.id.into(), t1).unwrap();
    let out = e.seat(a.id.into(), t2).unwrap();
    assert_eq!(out.previous, Some(t1));
    assert!(e.store().seated_at(&t1, None).is_empty());
    assert_eq!(e.store().seated_at(&t2, None), &[a.id]);
    assert_invariants(&e);
}

#[test]
fn rejected_move_leaves_guest_in_place() {
    let mut e = engine(false);
    let t1 = table(&mut e, 10);
    let t2 = table(&mut e, 8);
    let a = guest("a", 6, None);
    let filler = guest("filler", 8, None);
    e.set_roster(vec![a.clone(), filler.clone()]);
    e.seat(filler.id.into(), t2).unwrap();
    e.seat(a.id.into(), t1).unwrap();

    let err = e.seat(a.id.into(), t2).unwrap_err();
    assert_eq!(err.kind(), "capacity_exceeded");
    assert_eq!(e.store().table_of(&GuestRef::whole(a.id)), Some(t1));
    assert_eq!(e.occupancy(t1).unwrap(), 6);
}

#[test]
fn reseating_at_same_table_is_noop() {
    let mut e = engine(false);
    let t = table(&mut e, 10);
    let a = guest("a", 10, None);
    e.set_roster(vec![a.clone()]);
    e.seat(a.id.into(), t).unwrap();
    let out = e.seat(a.id.into(), t).unwrap();
    assert_eq!(out.previous, Some(t));
    assert_eq!(e.store().seated_at(&t, None), &[a.id]);
}

#[test]
fn unknown_table_and_guest() {
    let mut e = engine(false);
    let t = table(&mut e, 10);
    let a = guest("a", 1, None);
    e.set_roster(vec![a.clone()]);
    let missing = Ulid::new();
    assert_eq!(e.seat(a.id.into(), missing), Err(SeatingError::TableNotFound(missing)));
    assert_eq!(e.seat(missing.into(), t), Err(SeatingError::GuestNotFound(missing)));
}

#[test]
fn unseat_is_idempotent() {
    let mut e = engine(false);
    let t = table(&mut e, 10);
    let a = guest("a", 2, None);
    e.set_roster(vec![a.clone()]);
    e.seat(a.id.into(), t).unwrap();

    assert_eq!(e.unseat(a.id.into()), vec![t]);
    let before = e.snapshot();
    assert!(e.unseat(a.id.into()).is_empty());
    assert_eq!(e.snapshot(), before);
}

#[test]
fn random_sequence_keeps_invariants() {
    let mut e = engine(false);
    let tables: Vec<_> = (0..4).map(|_| table(&mut e, 8)).collect();
    let guests: Vec<_> = (0..12).map(|i| guest(&format!("g{i}"), 1 + (i % 4), None)).collect();
    e.set_roster(guests.clone());

    // Deterministic pseudo-random walk.
    let mut x: u64 = 0x9e37_79b9;
    for _ in 0..500 {
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        let g = &guests[(x % guests.len() as u64) as usize];
        if x % 5 == 0 {
            e.unseat(g.id.into());
        } else {
            let t = tables[((x >> 8) % tables.len() as u64) as usize];
            let _ = e.seat(g.id.into(), t);
        }
        assert_invariants(&e);
    }
}

// ── Separated seating ────────────────────────────────────

#[test]
fn neutral_table_claimed_then_gender_mismatch() {
    let mut e = engine(true);
    let t = table(&mut e, 10);
    let g = gendered("g", 2, 0);
    let h = gendered("h", 0, 1);
    e.set_roster(vec![g.clone(), h.clone()]);

    let out = e.seat(GuestRef::male(g.id), t).unwrap();
    assert!(out.claimed);
    let tbl = e.store().table(&t).unwrap();
    assert_eq!(tbl.gender, Partition::Male);
    assert_eq!(tbl.position, grid_cell(Partition::Male, 0));

    assert_eq!(
        e.seat(GuestRef::female(h.id), t),
        Err(SeatingError::GenderMismatch {
            table_id: t,
            table: Partition::Male,
            guest: Gender::Female,
        })
    );
    assert!(e.store().seated_at(&t, Some(Gender::Female)).is_empty());
}

#[test]
fn gender_inferred_from_single_count() {
    let mut e = engine(true);
    let t = table(&mut e, 10);
    let h = gendered("h", 0, 3);
    e.set_roster(vec![h.clone()]);
    let out = e.seat(h.id.into(), t).unwrap();
    assert_eq!(out.occurrence, GuestRef::female(h.id));
    assert_eq!(e.store().table(&t).unwrap().gender, Partition::Female);
    assert_eq!(e.occupancy(t).unwrap(), 3);
}

#[test]
fn ambiguous_gender_is_rejected() {
    let mut e = engine(true);
    let t = table(&mut e, 10);
    let both = gendered("both", 1, 1);
    e.set_roster(vec![both.clone()]);
    assert_eq!(
        e.seat(both.id.into(), t),
        Err(SeatingError::CannotDetermineGender(both.id))
    );
    assert_eq!(e.store().table(&t).unwrap().gender, Partition::Neutral);
}

#[test]
fn explicit_gender_without_headcount_is_rejected() {
    let mut e = engine(true);
    let t = table(&mut e, 10);
    let g = gendered("g", 2, 0);
    e.set_roster(vec![g.clone()]);
    assert_eq!(
        e.seat(GuestRef::female(g.id), t),
        Err(SeatingError::EmptyOccurrence(GuestRef::female(g.id)))
    );
}

#[test]
fn both_occurrences_seat_independently() {
    let mut e = engine(true);
    let tm = table(&mut e, 10);
    let tf = table(&mut e, 10);
    let g = gendered("g", 2, 3);
    e.set_roster(vec![g.clone()]);
    e.seat(GuestRef::male(g.id), tm).unwrap();
    e.seat(GuestRef::female(g.id), tf).unwrap();
    assert_eq!(e.occupancy(tm).unwrap(), 2);
    assert_eq!(e.occupancy(tf).unwrap(), 3);

    // No suffix in a separated event clears both.
    let mut vacated = e.unseat(g.id.into());
    vacated.sort();
    let mut expected = vec![tm, tf];
    expected.sort();
    assert_eq!(vacated, expected);
}

#[test]
fn occupied_neutral_table_cannot_be_claimed() {
    let mut e = engine(true);
    let a = gendered("a", 1, 0);
    let b = gendered("b", 1, 0);
    e.set_roster(vec![a.clone(), b.clone()]);

    // A neutral table that already carries someone, as a remote edit could leave it.
    let t = Table::new(Ulid::new(), "Table 1", TableType::Round, 10);
    let mut snap = SeatingSnapshot::default();
    snap.male_arrangement.insert(t.id, vec![a.id]);
    snap.tables.push(t.clone());
    e.load_snapshot(&snap);

    assert_eq!(
        e.seat(GuestRef::male(b.id), t.id),
        Err(SeatingError::NeutralTableOccupied(t.id))
    );
}

#[test]
fn emptied_table_reverts_to_neutral_without_suffix() {
    let mut e = engine(true);
    let t = table(&mut e, 10);
    let g = {
        let mut g = gendered("g", 2, 0);
        g.group = Some("Family".into());
        g
    };
    e.set_roster(vec![g.clone()]);

    e.seat(GuestRef::male(g.id), t).unwrap();
    assert_eq!(e.store().table(&t).unwrap().name, "Table 1 - Family");

    e.unseat(GuestRef::male(g.id));
    let tbl = e.store().table(&t).unwrap();
    assert_eq!(tbl.gender, Partition::Neutral);
    assert_eq!(tbl.name, "Table 1");
    assert_eq!(tbl.position, grid_cell(Partition::Neutral, 0));
}

#[test]
fn moving_last_guest_reverts_source_table() {
    let mut e = engine(true);
    let t1 = table(&mut e, 10);
    let t2 = table(&mut e, 10);
    let g = gendered("g", 1, 0);
    e.set_roster(vec![g.clone()]);
    e.seat(g.id.into(), t1).unwrap();
    e.seat(g.id.into(), t2).unwrap();
    assert_eq!(e.store().table(&t1).unwrap().gender, Partition::Neutral);
    assert_eq!(e.store().table(&t2).unwrap().gender, Partition::Male);
}

#[test]
fn second_claimed_table_takes_next_grid_cell() {
    let mut e = engine(true);
    let t1 = table(&mut e, 10);
    let t2 = table(&mut e, 10);
    let a = gendered("a", 1, 0);
    let b = gendered("b", 1, 0);
    e.set_roster(vec![a.clone(), b.clone()]);
    e.seat(a.id.into(), t1).unwrap();
    e.seat(b.id.into(), t2).unwrap();
    assert_eq!(e.store().table(&t1).unwrap().position, grid_cell(Partition::Male, 0));
    assert_eq!(e.store().table(&t2).unwrap().position, grid_cell(Partition::Male, 1));
}

#[test]
fn migrate_rejects_foreign_occupants() {
    let mut e = engine(true);
    let t = table(&mut e, 10);
    let a = gendered("a", 1, 0);
    e.set_roster(vec![a.clone()]);
    e.seat(a.id.into(), t).unwrap();
    assert!(matches!(
        e.migrate_table(t, Partition::Female),
        Err(SeatingError::GenderMismatch { .. })
    ));
    assert_eq!(
        e.migrate_table(t, Partition::Neutral),
        Err(SeatingError::NeutralTableOccupied(t))
    );
    assert!(e.migrate_table(t, Partition::Male).is_ok());
}

#[test]
fn migrate_requires_separated_seating() {
    let mut e = engine(false);
    let t = table(&mut e, 10);
    let a = guest("a", 2, None);
    e.set_roster(vec![a.clone()]);
    e.seat(a.id.into(), t).unwrap();
    let before = e.snapshot();

    assert_eq!(e.migrate_table(t, Partition::Male), Err(SeatingError::NotSeparated(t)));
    assert_eq!(e.snapshot(), before);
    assert!(e.snapshot().male_tables.is_empty());
    assert!(e.migrate_table(t, Partition::Neutral).is_ok());
}

#[test]
fn migrate_rejects_whole_party_into_gendered_partition() {
    let mut e = engine(true);
    let t = table(&mut e, 10);
    let a = guest("a", 2, None);
    let mut snap = e.snapshot();
    snap.arrangement.insert(t, vec![a.id]);
    e.set_roster(vec![a.clone()]);
    e.load_snapshot(&snap);

    assert_eq!(
        e.migrate_table(t, Partition::Female),
        Err(SeatingError::WholePartyOccupant { table_id: t, guest_id: a.id })
    );
    assert_eq!(e.store().table(&t).unwrap().gender, Partition::Neutral);
}

// ── Table lifecycle ──────────────────────────────────────

#[test]
fn new_tables_are_drafts_with_sequential_names() {
    let mut e = engine(false);
    let t1 = table(&mut e, 10);
    let t2 = table(&mut e, 12);
    assert!(e.store().table(&t1).unwrap().draft);
    assert_eq!(e.store().table(&t1).unwrap().name, "Table 1");
    assert_eq!(e.store().table(&t2).unwrap().name, "Table 2");

    e.confirm_table(t1).unwrap();
    assert!(!e.store().table(&t1).unwrap().draft);
    assert_eq!(e.discard_draft(t1), Err(SeatingError::NotDraft(t1)));
    e.discard_draft(t2).unwrap();
    assert!(!e.store().contains_table(&t2));
}

#[test]
fn default_capacity_follows_preferences() {
    let mut e = engine(false);
    let mut prefs = Preferences::default();
    prefs.preferred_table_size = 12;
    e.set_preferences(prefs);
    let t = e.add_table(NewTable::default()).unwrap();
    assert_eq!(e.store().table(&t).unwrap().capacity, 12);
}

#[test]
fn capacity_out_of_range_is_rejected() {
    let mut e = engine(false);
    for cap in [0, 7, 37] {
        let res = e.add_table(NewTable {
            capacity: Some(cap),
            ..Default::default()
        });
        assert_eq!(res, Err(SeatingError::InvalidCapacity(cap)));
    }
    assert_eq!(e.store().table_count(), 0);
}

#[test]
fn requested_position_avoids_collision() {
    let mut e = engine(false);
    let first = e
        .add_table(NewTable {
            capacity: Some(10),
            position: Some(Position::new(500.0, 500.0)),
            ..Default::default()
        })
        .unwrap();
    let second = e
        .add_table(NewTable {
            capacity: Some(10),
            position: Some(Position::new(500.0, 500.0)),
            ..Default::default()
        })
        .unwrap();
    let a = e.store().table(&first).unwrap();
    let b = e.store().table(&second).unwrap();
    assert_eq!(a.position, Position::new(500.0, 500.0));
    assert!(!placement::Rect::of(a.position, a.size)
        .collides(&placement::Rect::of(b.position, b.size), PLACEMENT_PADDING));
}

#[test]
fn capacity_reduction_below_occupancy_is_rejected() {
    let mut e = engine(false);
    let t = table(&mut e, 12);
    let a = guest("a", 9, None);
    e.set_roster(vec![a.clone()]);
    e.seat(a.id.into(), t).unwrap();

    let res = e.update_table(t, TableUpdate {
        capacity: Some(8),
        ..Default::default()
    });
    assert_eq!(
        res,
        Err(SeatingError::CapacityBelowOccupancy {
            table_id: t,
            capacity: 8,
            occupied: 9,
        })
    );
    assert_eq!(e.store().table(&t).unwrap().capacity, 12);

    e.update_table(t, TableUpdate {
        capacity: Some(9),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(e.store().table(&t).unwrap().capacity, 9);
}

#[test]
fn reshaping_recomputes_size() {
    let mut e = engine(false);
    let t = table(&mut e, 10);
    e.update_table(t, TableUpdate {
        kind: Some(TableType::Rectangular),
        capacity: Some(20),
        ..Default::default()
    })
    .unwrap();
    let tbl = e.store().table(&t).unwrap();
    assert_eq!(tbl.size, Size::for_table(TableType::Rectangular, 20));
}

#[test]
fn manual_name_survives_auto_naming() {
    let mut e = engine(false);
    let t = table(&mut e, 10);
    let a = guest("a", 2, Some("Work"));
    e.set_roster(vec![a.clone()]);
    e.update_table(t, TableUpdate {
        name: Some("Head table".into()),
        ..Default::default()
    })
    .unwrap();
    e.seat(a.id.into(), t).unwrap();
    assert_eq!(e.store().table(&t).unwrap().name, "Head table");
    assert!(e.is_manually_named(&t));

    // Typing something that looks generated still counts as manual.
    e.update_table(t, TableUpdate {
        name: Some("Table 7".into()),
        ..Default::default()
    })
    .unwrap();
    e.unseat(a.id.into());
    e.seat(a.id.into(), t).unwrap();
    assert_eq!(e.store().table(&t).unwrap().name, "Table 7");

    e.update_table(t, TableUpdate {
        reset_name: true,
        ..Default::default()
    })
    .unwrap();
    assert!(!e.is_manually_named(&t));
    assert_eq!(e.store().table(&t).unwrap().name, "Table 7 - Work");
}

#[test]
fn dominant_group_by_headcount() {
    let mut e = engine(false);
    let t = table(&mut e, 12);
    let a = guest("a", 1, Some("Work"));
    let b = guest("b", 1, Some("Work"));
    let c = guest("c", 3, Some("Family"));
    e.set_roster(vec![a.clone(), b.clone(), c.clone()]);
    e.seat(a.id.into(), t).unwrap();
    e.seat(b.id.into(), t).unwrap();
    assert_eq!(e.store().table(&t).unwrap().name, "Table 1 - Work");
    e.seat(c.id.into(), t).unwrap();
    assert_eq!(e.store().table(&t).unwrap().name, "Table 1 - Family");
}

#[test]
fn delete_displaces_guests_to_unseated() {
    let mut e = engine(false);
    let t = table(&mut e, 10);
    let other = table(&mut e, 10);
    let a = guest("a", 2, None);
    let b = guest("b", 2, None);
    e.set_roster(vec![a.clone(), b.clone()]);
    e.seat(a.id.into(), t).unwrap();
    e.seat(b.id.into(), other).unwrap();

    let displaced = e.delete_table(t).unwrap();
    assert_eq!(displaced, vec![GuestRef::whole(a.id)]);
    assert_eq!(e.unseated(), vec![GuestRef::whole(a.id)]);
    assert_eq!(e.store().table_of(&GuestRef::whole(b.id)), Some(other));
    assert_eq!(e.delete_table(t), Err(SeatingError::TableNotFound(t)));
}

#[test]
fn clear_all_drops_everything() {
    let mut e = engine(true);
    let t = table(&mut e, 10);
    let g = gendered("g", 1, 0);
    e.set_roster(vec![g.clone()]);
    e.seat(g.id.into(), t).unwrap();
    e.clear_all();
    let snap = e.snapshot();
    assert!(snap.is_empty());
    assert!(!snap.has_arrangement());
}

// ── Over-capacity and queries ────────────────────────────

#[test]
fn external_growth_is_flagged_not_truncated() {
    let mut e = engine(false);
    let t = table(&mut e, 8);
    let mut a = guest("a", 6, None);
    let b = guest("b", 1, None);
    e.set_roster(vec![a.clone(), b.clone()]);
    e.seat(a.id.into(), t).unwrap();

    a.party_size = 10;
    e.set_roster(vec![a.clone(), b.clone()]);
    assert_eq!(e.over_capacity_tables(), vec![t]);
    assert_eq!(e.store().seated_at(&t, None), &[a.id]);
    assert!(e.table_summary(t).unwrap().over_capacity);
    assert!(matches!(
        e.seat(b.id.into(), t),
        Err(SeatingError::CapacityExceeded { available: 0, .. })
    ));
    assert_eq!(e.stats().over_capacity_tables, 1);
}

#[test]
fn unseated_lists_confirmed_occurrences() {
    let mut e = engine(true);
    let t = table(&mut e, 10);
    let g = gendered("g", 1, 2);
    let mut pending = gendered("p", 1, 0);
    pending.status = RsvpStatus::Pending;
    e.set_roster(vec![g.clone(), pending]);
    e.seat(GuestRef::male(g.id), t).unwrap();
    assert_eq!(e.unseated(), vec![GuestRef::female(g.id)]);
    assert_eq!(
        e.needed_seats(),
        Headcount {
            total: 3,
            male: 1,
            female: 2
        }
    );
}

#[test]
fn manual_marker_survives_reload() {
    let mut e = engine(false);
    let t = table(&mut e, 10);
    let a = guest("a", 2, Some("Family"));
    e.set_roster(vec![a.clone()]);
    e.update_table(t, TableUpdate {
        name: Some("Table 7".into()),
        ..Default::default()
    })
    .unwrap();

    let saved = e.snapshot();
    assert_eq!(saved.manual_names, Some(vec![t]));

    let mut reloaded = engine(false);
    reloaded.set_roster(vec![a.clone()]);
    reloaded.load_snapshot(&saved);
    assert!(reloaded.is_manually_named(&t));
    reloaded.seat(a.id.into(), t).unwrap();
    assert_eq!(reloaded.store().table(&t).unwrap().name, "Table 7");

    // A snapshot from a client that never wrote markers keeps ours.
    let mut legacy = saved.clone();
    legacy.manual_names = None;
    e.load_snapshot(&legacy);
    assert!(e.is_manually_named(&t));
    e.seat(a.id.into(), t).unwrap();
    assert_eq!(e.store().table(&t).unwrap().name, "Table 7");
}

#[test]
fn load_snapshot_does_not_infer_markers_from_names() {
    let mut e = engine(false);
    let auto = Table::new(Ulid::new(), "Table 3 - Work", TableType::Round, 10);
    let odd = Table::new(Ulid::new(), "Sweetheart", TableType::Square, 8);
    let snap = SeatingSnapshot {
        tables: vec![auto.clone(), odd.clone()],
        manual_names: Some(vec![auto.id]),
        ..Default::default()
    };
    e.load_snapshot(&snap);
    assert!(e.is_manually_named(&auto.id));
    assert!(!e.is_manually_named(&odd.id));
    let next = table(&mut e, 10);
    assert_eq!(e.store().table(&next).unwrap().name, "Table 4");
}

#[test]
fn generated_tables_are_auto_named() {
    let mut e = engine(false);
    let kept = table(&mut e, 10);
    e.update_table(kept, TableUpdate {
        name: Some("Head table".into()),
        ..Default::default()
    })
    .unwrap();
    let a = guest("a", 3, Some("Family"));
    e.set_roster(vec![a.clone()]);

    let mut generated = e.snapshot();
    generated.manual_names = None;
    let extra = Table::new(Ulid::new(), "Emergency 1", TableType::Round, 10);
    generated.arrangement.insert(extra.id, vec![a.id]);
    generated.tables.push(extra.clone());
    e.load_arrangement(&generated);
    e.refresh_all_names();

    assert!(e.is_manually_named(&kept));
    assert!(!e.is_manually_named(&extra.id));
    assert_eq!(e.store().table(&kept).unwrap().name, "Head table");
    assert_eq!(e.store().table(&extra.id).unwrap().name, "Table 1 - Family");
}

#[test]
fn must_sit_together_requires_same_group() {
    let mut e = engine(false);
    let a = guest("a", 1, Some("Work"));
    let b = guest("b", 1, Some("Work"));
    let c = guest("c", 1, Some("Family"));
    e.set_roster(vec![a.clone(), b.clone(), c.clone()]);
    let prefs = Preferences {
        must_sit_together: vec![
            GuestPair { guest1: a.id, guest2: b.id },
            GuestPair { guest1: a.id, guest2: c.id },
            GuestPair { guest1: a.id, guest2: Ulid::new() },
        ],
        ..Default::default()
    };
    assert_eq!(e.set_preferences(prefs), 2);
    assert_eq!(e.preferences().must_sit_together.len(), 1);
}

#[test]
fn table_limit_is_enforced() {
    let mut e = engine(false);
    let caps = vec![MIN_TABLE_CAPACITY; MAX_TABLES_PER_EVENT + 1];
    assert_eq!(e.add_tables(&caps), Err(SeatingError::LimitExceeded("too many tables")));
    assert_eq!(e.store().table_count(), 0);
}
