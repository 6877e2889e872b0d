use crate::limits::*;
use crate::model::*;

// ── Collision geometry ────────────────────────────────────────────

/// Axis-aligned footprint of a table. `position` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn of(position: Position, size: Size) -> Self {
        Self {
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
        }
    }

    /// Overlap test with `padding` kept clear on every side.
    pub fn collides(&self, other: &Rect, padding: f64) -> bool {
        self.x < other.x + other.width + padding
            && other.x < self.x + self.width + padding
            && self.y < other.y + other.height + padding
            && other.y < self.y + self.height + padding
    }
}

fn collides_any(candidate: &Rect, others: &[Rect]) -> bool {
    others.iter().any(|o| candidate.collides(o, PLACEMENT_PADDING))
}

/// First non-colliding position near `requested`.
///
/// Sweeps outward in rings of `PLACEMENT_RADIUS_STEP`, trying every
/// `PLACEMENT_ANGLE_STEP_DEG` on each ring, up to `PLACEMENT_MAX_RADIUS`.
/// Falls back to `requested` when nothing fits inside the bound.
pub fn find_free_position(requested: Position, size: Size, others: &[Rect]) -> Position {
    if !collides_any(&Rect::of(requested, size), others) {
        return requested;
    }
    let steps = (360.0 / PLACEMENT_ANGLE_STEP_DEG).round() as usize;
    let mut radius = PLACEMENT_RADIUS_STEP;
    while radius <= PLACEMENT_MAX_RADIUS {
        for step in 0..steps {
            let angle = (step as f64 * PLACEMENT_ANGLE_STEP_DEG).to_radians();
            let candidate = Position::new(
                requested.x + radius * angle.cos(),
                requested.y + radius * angle.sin(),
            );
            if candidate.x < 0.0 || candidate.y < 0.0 {
                continue;
            }
            if !collides_any(&Rect::of(candidate, size), others) {
                return candidate;
            }
        }
        radius += PLACEMENT_RADIUS_STEP;
    }
    requested
}

// ── Partition grid ────────────────────────────────────────────────

pub fn grid_origin_x(partition: Partition) -> f64 {
    match partition {
        Partition::Neutral => GRID_ORIGIN_X_NEUTRAL,
        Partition::Male => GRID_ORIGIN_X_MALE,
        Partition::Female => GRID_ORIGIN_X_FEMALE,
    }
}

pub fn grid_cell(partition: Partition, index: usize) -> Position {
    let col = index % GRID_COLUMNS;
    let row = index / GRID_COLUMNS;
    Position::new(
        grid_origin_x(partition) + col as f64 * GRID_SPACING_X,
        GRID_ORIGIN_Y + row as f64 * GRID_SPACING_Y,
    )
}

/// First grid cell of a partition that is not covered by `others`.
pub fn grid_position(partition: Partition, size: Size, others: &[Rect]) -> Position {
    (0..MAX_GRID_CELLS)
        .map(|i| grid_cell(partition, i))
        .find(|pos| !others.iter().any(|o| Rect::of(*pos, size).collides(o, 0.0)))
        .unwrap_or_else(|| grid_cell(partition, 0))
}
