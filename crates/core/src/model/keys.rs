use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of quiz difficulty tiers.
pub const LEVEL_COUNT: u8 = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LevelError {
    #[error("level {0} is outside 1..={LEVEL_COUNT}")]
    OutOfRange(u8),
}

/// A quiz difficulty tier, always within `1..=LEVEL_COUNT`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Level(u8);

impl Level {
    pub const FIRST: Level = Level(1);
    pub const LAST: Level = Level(LEVEL_COUNT);

    /// Creates a `Level`.
    ///
    /// # Errors
    ///
    /// Returns `LevelError::OutOfRange` when `value` is not a known tier.
    pub fn new(value: u8) -> Result<Self, LevelError> {
        if (1..=LEVEL_COUNT).contains(&value) {
            Ok(Self(value))
        } else {
            Err(LevelError::OutOfRange(value))
        }
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// The tier above this one, if any.
    #[must_use]
    pub fn next(&self) -> Option<Level> {
        Level::new(self.0 + 1).ok()
    }

    /// All tiers in ascending order.
    pub fn all() -> impl Iterator<Item = Level> {
        (1..=LEVEL_COUNT).map(Level)
    }
}

impl TryFrom<u8> for Level {
    type Error = LevelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Level::new(value)
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level({})", self.0)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Learning module identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKey {
    Earthquake,
    Flood,
    Fire,
}

impl ModuleKey {
    pub const ALL: [ModuleKey; 3] = [ModuleKey::Earthquake, ModuleKey::Flood, ModuleKey::Fire];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKey::Earthquake => "earthquake",
            ModuleKey::Flood => "flood",
            ModuleKey::Fire => "fire",
        }
    }
}

/// Disaster kind a drill simulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisasterType {
    Earthquake,
    Fire,
    Flood,
}

impl DisasterType {
    pub const ALL: [DisasterType; 3] = [
        DisasterType::Earthquake,
        DisasterType::Fire,
        DisasterType::Flood,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            DisasterType::Earthquake => "earthquake",
            DisasterType::Fire => "fire",
            DisasterType::Flood => "flood",
        }
    }

    #[must_use]
    pub fn drill_title(&self) -> &'static str {
        match self {
            DisasterType::Earthquake => "Earthquake Drill",
            DisasterType::Fire => "Fire Drill",
            DisasterType::Flood => "Flood Drill",
        }
    }
}

/// State covered by the regional contact directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Punjab,
    Delhi,
    Haryana,
    Maharashtra,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::Punjab,
        Region::Delhi,
        Region::Haryana,
        Region::Maharashtra,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Punjab => "punjab",
            Region::Delhi => "delhi",
            Region::Haryana => "haryana",
            Region::Maharashtra => "maharashtra",
        }
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DisasterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

/// Error type for parsing a key from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseKeyError {
    kind: &'static str,
    raw: String,
}

impl fmt::Display for ParseKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.raw)
    }
}

impl std::error::Error for ParseKeyError {}

impl ParseKeyError {
    pub(crate) fn new(kind: &'static str, raw: &str) -> Self {
        Self {
            kind,
            raw: raw.to_string(),
        }
    }
}

fn parse_named<T: Copy>(
    s: &str,
    all: &[T],
    name: impl Fn(&T) -> &'static str,
    kind: &'static str,
) -> Result<T, ParseKeyError> {
    let needle = s.trim().to_ascii_lowercase();
    all.iter()
        .find(|item| name(*item) == needle)
        .copied()
        .ok_or_else(|| ParseKeyError::new(kind, s))
}

impl FromStr for Level {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .ok()
            .and_then(|value| Level::new(value).ok())
            .ok_or_else(|| ParseKeyError::new("level", s))
    }
}

impl FromStr for ModuleKey {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(s, &ModuleKey::ALL, ModuleKey::as_str, "module")
    }
}

impl FromStr for DisasterType {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(s, &DisasterType::ALL, DisasterType::as_str, "disaster type")
    }
}

impl FromStr for Region {
    type Err = ParseKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_named(s, &Region::ALL, Region::as_str, "region")
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
