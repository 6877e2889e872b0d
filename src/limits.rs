// ── Table bounds ─────────────────────────────────────────────────

pub const MIN_TABLE_CAPACITY: u32 = 8;
pub const MAX_TABLE_CAPACITY: u32 = 36;
pub const DEFAULT_TABLE_CAPACITY: u32 = 10;

pub const MAX_TABLES_PER_EVENT: usize = 500;
pub const MAX_NAME_LEN: usize = 256;
pub const MAX_NOTES_LEN: usize = 4096;

// ── Placement (canvas units) ─────────────────────────────────────

/// Margin added around every table when testing for overlap.
pub const PLACEMENT_PADDING: f64 = 20.0;
pub const PLACEMENT_RADIUS_STEP: f64 = 50.0;
pub const PLACEMENT_ANGLE_STEP_DEG: f64 = 30.0;
pub const PLACEMENT_MAX_RADIUS: f64 = 1000.0;

// ── Partition grid ───────────────────────────────────────────────

pub const GRID_COLUMNS: usize = 4;
pub const GRID_SPACING_X: f64 = 220.0;
pub const GRID_SPACING_Y: f64 = 220.0;
pub const GRID_ORIGIN_Y: f64 = 100.0;
pub const GRID_ORIGIN_X_NEUTRAL: f64 = 100.0;
pub const GRID_ORIGIN_X_MALE: f64 = 1100.0;
pub const GRID_ORIGIN_X_FEMALE: f64 = 2100.0;
/// Upper bound on grid cells scanned before falling back to the origin.
pub const MAX_GRID_CELLS: usize = 4096;

// ── Session timing (milliseconds) ────────────────────────────────

pub const DEFAULT_DEBOUNCE_MS: u64 = 1_500;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const MAX_SESSIONS: usize = 64;
pub const MAX_EVENT_ID_LEN: usize = 256;

// ── Suggestion buffers ───────────────────────────────────────────

pub const MIN_BUFFER_MULTIPLIER: f64 = 1.05;
pub const MAX_BUFFER_MULTIPLIER: f64 = 2.5;

/// Delay before a client re-authenticates after a 401 ends its session.
pub const AUTH_REDIRECT_DELAY_MS: u64 = 2_000;
