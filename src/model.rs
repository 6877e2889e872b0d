use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::limits::DEFAULT_TABLE_CAPACITY;

/// Unix milliseconds. The only time type.
pub type Ms = i64;

pub type GuestId = Ulid;
pub type TableId = Ulid;

/// Table id → ordered guest ids. Order is seating order.
pub type Arrangement = BTreeMap<TableId, Vec<GuestId>>;

pub fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as Ms)
        .unwrap_or(0)
}

// ── Guests ───────────────────────────────────────────────────────

/// One of the two occurrences a guest can have in a gender-separated event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Confirmed,
    Pending,
    Declined,
    #[serde(other)]
    Unknown,
}

/// A guest as supplied by the roster collaborator.
///
/// `party_size` is the capacity contribution in non-separated events;
/// `male_count`/`female_count` are the per-occurrence contributions when
/// seating is separated by gender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guest {
    pub id: GuestId,
    pub name: String,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub custom_group: Option<String>,
    pub status: RsvpStatus,
    #[serde(default = "default_party_size")]
    pub party_size: u32,
    #[serde(default)]
    pub male_count: u32,
    #[serde(default)]
    pub female_count: u32,
}

fn default_party_size() -> u32 {
    1
}

impl Guest {
    pub fn new(id: GuestId, name: impl Into<String>, party_size: u32) -> Self {
        Self {
            id,
            name: name.into(),
            group: None,
            custom_group: None,
            status: RsvpStatus::Confirmed,
            party_size,
            male_count: 0,
            female_count: 0,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == RsvpStatus::Confirmed
    }

    /// Group used for naming and grouping rules. A custom label wins over the
    /// predefined group.
    pub fn group_label(&self) -> Option<&str> {
        self.custom_group
            .as_deref()
            .filter(|g| !g.is_empty())
            .or(self.group.as_deref().filter(|g| !g.is_empty()))
    }

    /// Headcount for one occurrence. `None` means the whole party.
    pub fn count_for(&self, gender: Option<Gender>) -> u32 {
        match gender {
            None => self.party_size,
            Some(Gender::Male) => self.male_count,
            Some(Gender::Female) => self.female_count,
        }
    }

    /// The only gender with a non-zero count, if exactly one has one.
    pub fn single_gender(&self) -> Option<Gender> {
        match (self.male_count > 0, self.female_count > 0) {
            (true, false) => Some(Gender::Male),
            (false, true) => Some(Gender::Female),
            _ => None,
        }
    }
}

/// Reference to a guest occurrence, optionally carrying an explicit gender.
///
/// Textual form: `<ulid>`, `<ulid>:male` or `<ulid>:female`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GuestRef {
    pub guest_id: GuestId,
    pub gender: Option<Gender>,
}

impl GuestRef {
    pub fn whole(guest_id: GuestId) -> Self {
        Self { guest_id, gender: None }
    }

    pub fn male(guest_id: GuestId) -> Self {
        Self { guest_id, gender: Some(Gender::Male) }
    }

    pub fn female(guest_id: GuestId) -> Self {
        Self { guest_id, gender: Some(Gender::Female) }
    }
}

impl From<GuestId> for GuestRef {
    fn from(id: GuestId) -> Self {
        Self::whole(id)
    }
}

impl fmt::Display for GuestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.gender {
            Some(g) => write!(f, "{}:{g}", self.guest_id),
            None => write!(f, "{}", self.guest_id),
        }
    }
}

impl FromStr for GuestRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, gender) = match s.split_once(':') {
            Some((id, "male")) => (id, Some(Gender::Male)),
            Some((id, "female")) => (id, Some(Gender::Female)),
            Some((_, other)) => return Err(format!("unknown gender suffix: {other}")),
            None => (s, None),
        };
        let guest_id = Ulid::from_string(id).map_err(|e| format!("invalid guest id {id}: {e}"))?;
        Ok(Self { guest_id, gender })
    }
}

impl Serialize for GuestRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GuestRef {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ── Tables ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableType {
    #[default]
    Round,
    Square,
    Rectangular,
}

/// Partition tag of a table. Only meaningful for gender-separated events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    #[default]
    #[serde(rename = "none")]
    Neutral,
    Male,
    Female,
}

impl Partition {
    pub fn gender(&self) -> Option<Gender> {
        match self {
            Partition::Neutral => None,
            Partition::Male => Some(Gender::Male),
            Partition::Female => Some(Gender::Female),
        }
    }
}

impl From<Gender> for Partition {
    fn from(g: Gender) -> Self {
        match g {
            Gender::Male => Partition::Male,
            Gender::Female => Partition::Female,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Neutral => f.write_str("neutral"),
            Partition::Male => f.write_str("male"),
            Partition::Female => f.write_str("female"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Default footprint for a table of the given type and capacity.
    pub fn for_table(kind: TableType, capacity: u32) -> Self {
        let extra = capacity.saturating_sub(8) as f64;
        match kind {
            TableType::Round | TableType::Square => {
                let d = 120.0 + extra * 5.0;
                Self { width: d, height: d }
            }
            TableType::Rectangular => Self {
                width: 80.0 + capacity as f64 * 10.0,
                height: 90.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: TableId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: TableType,
    pub capacity: u32,
    #[serde(default)]
    pub position: Position,
    pub size: Size,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub gender: Partition,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub draft: bool,
}

impl Table {
    pub fn new(id: TableId, name: impl Into<String>, kind: TableType, capacity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            capacity,
            position: Position::default(),
            size: Size::for_table(kind, capacity),
            rotation: 0.0,
            gender: Partition::Neutral,
            notes: String::new(),
            draft: false,
        }
    }
}

/// Fields accepted when creating a table. Anything left out is derived.
#[derive(Debug, Clone, Default)]
pub struct NewTable {
    pub name: Option<String>,
    pub kind: TableType,
    pub capacity: Option<u32>,
    pub position: Option<Position>,
    pub rotation: f64,
    pub notes: String,
}

/// Partial update of a table; `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TableUpdate {
    pub name: Option<String>,
    /// Drop any manual name and go back to the generated one.
    pub reset_name: bool,
    pub kind: Option<TableType>,
    pub capacity: Option<u32>,
    pub position: Option<Position>,
    pub size: Option<Size>,
    pub rotation: Option<f64>,
    pub notes: Option<String>,
}

// ── Preferences ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GroupPolicy {
    Mixable,
    Separate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMixingRule {
    pub group1: String,
    pub group2: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestPair {
    pub guest1: GuestId,
    pub guest2: GuestId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub allow_group_mixing: bool,
    pub group_mixing_rules: Vec<GroupMixingRule>,
    pub group_policies: BTreeMap<String, GroupPolicy>,
    pub must_sit_together: Vec<GuestPair>,
    pub preferred_table_size: u32,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            allow_group_mixing: true,
            group_mixing_rules: Vec::new(),
            group_policies: BTreeMap::new(),
            must_sit_together: Vec::new(),
            preferred_table_size: DEFAULT_TABLE_CAPACITY,
        }
    }
}

impl Preferences {
    /// True when any rule constrains how groups may share tables.
    pub fn has_grouping_rules(&self) -> bool {
        !self.allow_group_mixing
            || !self.group_mixing_rules.is_empty()
            || self.group_policies.values().any(|p| *p == GroupPolicy::Separate)
            || !self.must_sit_together.is_empty()
    }

    pub fn is_strict(&self) -> bool {
        !self.allow_group_mixing
            && self.group_policies.values().any(|p| *p == GroupPolicy::Separate)
    }
}

// ── Snapshot ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub scale: f64,
    pub offset: Position,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Position::default(),
        }
    }
}

/// Unit of persistence and of conflict detection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeatingSnapshot {
    pub tables: Vec<Table>,
    pub arrangement: Arrangement,
    pub male_tables: Vec<Table>,
    pub female_tables: Vec<Table>,
    pub male_arrangement: Arrangement,
    pub female_arrangement: Arrangement,
    pub preferences: Preferences,
    pub layout: Layout,
    pub updated_at: Option<Ms>,
    pub guest_fingerprint: Option<GuestFingerprint>,
    /// Tables named by hand. Absent in snapshots written by older clients.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_names: Option<Vec<TableId>>,
}

impl SeatingSnapshot {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.male_tables.is_empty() && self.female_tables.is_empty()
    }

    pub fn has_arrangement(&self) -> bool {
        [&self.arrangement, &self.male_arrangement, &self.female_arrangement]
            .iter()
            .any(|a| a.values().any(|guests| !guests.is_empty()))
    }
}

// ── Fingerprint ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FingerprintEntry {
    pub status: RsvpStatus,
    pub party_size: u32,
    pub male_count: u32,
    pub female_count: u32,
    pub name: String,
    pub group: Option<String>,
}

impl From<&Guest> for FingerprintEntry {
    fn from(g: &Guest) -> Self {
        Self {
            status: g.status,
            party_size: g.party_size,
            male_count: g.male_count,
            female_count: g.female_count,
            name: g.name.clone(),
            group: g.group_label().map(str::to_owned),
        }
    }
}

/// Reduced projection of the roster, the diff basis for drift detection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GuestFingerprint {
    pub guests: BTreeMap<GuestId, FingerprintEntry>,
}

impl GuestFingerprint {
    pub fn capture(roster: &[Guest]) -> Self {
        Self {
            guests: roster.iter().map(|g| (g.id, FingerprintEntry::from(g))).collect(),
        }
    }

    pub fn get(&self, id: &GuestId) -> Option<&FingerprintEntry> {
        self.guests.get(id)
    }
}
