use crate::error::DaystoneError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number of concurrent "today" slots.
pub const SLOT_COUNT: usize = 3;

// ---------------------------------------------------------------------------
// TaskId / ProjectId
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(Uuid);

impl ProjectId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ProjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ProjectId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// MediaRef
// ---------------------------------------------------------------------------

/// A reference to a captured media asset (a device file URI). The reference is
/// opaque to the core; it only promises to be non-empty when built through
/// [`MediaRef::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(String);

impl MediaRef {
    /// Returns `None` for a blank reference.
    pub fn new(uri: impl Into<String>) -> Option<Self> {
        let uri = uri.into();
        let trimmed = uri.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// MediaKind
// ---------------------------------------------------------------------------

/// Whether a capture is a milestone plan or a progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Plan,
    Update,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Plan => "plan",
            MediaKind::Update => "update",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ProgressKey
// ---------------------------------------------------------------------------

/// Addresses one milestone of one project. Progress chains, started flags and
/// plan videos are all keyed by this pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub project: ProjectId,
    pub milestone: usize,
}

impl ProgressKey {
    pub fn new(project: ProjectId, milestone: usize) -> Self {
        Self { project, milestone }
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project, self.milestone)
    }
}

impl std::str::FromStr for ProgressKey {
    type Err = DaystoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((project, milestone)) = s.rsplit_once(':') else {
            return Err(DaystoneError::InvalidKey(s.to_string()));
        };
        let project = project
            .parse::<ProjectId>()
            .map_err(|_| DaystoneError::InvalidKey(s.to_string()))?;
        let milestone = milestone
            .parse::<usize>()
            .map_err(|_| DaystoneError::InvalidKey(s.to_string()))?;
        Ok(Self { project, milestone })
    }
}

// ---------------------------------------------------------------------------
// SaveStatus
// ---------------------------------------------------------------------------

/// Outcome of a best-effort store write. Storage failures never bubble out of
/// scheduling operations; in-memory state stays authoritative and the caller
/// gets this status to surface as "not saved".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    NotSaved,
}

impl SaveStatus {
    /// Combine two write outcomes; any failure wins.
    pub fn and(self, other: SaveStatus) -> SaveStatus {
        if self == SaveStatus::Saved && other == SaveStatus::Saved {
            SaveStatus::Saved
        } else {
            SaveStatus::NotSaved
        }
    }

    pub fn saved(self) -> bool {
        self == SaveStatus::Saved
    }
}

// ---------------------------------------------------------------------------
// Slot
// ---------------------------------------------------------------------------

/// A validated slot index. Out-of-range slot numbers are unrepresentable, so
/// every slot operation can index without checking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(usize);

impl Slot {
    pub fn new(index: usize) -> Option<Self> {
        (index < SLOT_COUNT).then_some(Self(index))
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn all() -> [Slot; SLOT_COUNT] {
        [Slot(0), Slot(1), Slot(2)]
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0 + 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
