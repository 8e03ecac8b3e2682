//! Journal notes as seen by the clarity digest.
//!
//! Storage lives outside this crate. [`NoteSource`] is the one query the
//! digest needs from it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// A journal note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

impl Note {
    /// A note created and last updated at `created_at`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        created_at: SystemTime,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            created_at,
            updated_at: created_at,
        }
    }
}

/// Trailing window a clarity digest covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "3days")]
    ThreeDays,
    #[serde(rename = "2weeks")]
    TwoWeeks,
    #[serde(rename = "3months")]
    ThreeMonths,
}

impl Timeframe {
    /// Length of the window.
    pub fn duration(self) -> Duration {
        match self {
            Timeframe::ThreeDays => 3 * DAY,
            Timeframe::TwoWeeks => 14 * DAY,
            Timeframe::ThreeMonths => 90 * DAY,
        }
    }

    /// Keyword used on the wire.
    pub fn keyword(self) -> &'static str {
        match self {
            Timeframe::ThreeDays => "3days",
            Timeframe::TwoWeeks => "2weeks",
            Timeframe::ThreeMonths => "3months",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Error for an unknown timeframe keyword.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid timeframe '{0}' (expected 3days, 2weeks or 3months)")]
pub struct InvalidTimeframe(pub String);

impl FromStr for Timeframe {
    type Err = InvalidTimeframe;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "3days" => Ok(Timeframe::ThreeDays),
            "2weeks" => Ok(Timeframe::TwoWeeks),
            "3months" => Ok(Timeframe::ThreeMonths),
            other => Err(InvalidTimeframe(other.to_string())),
        }
    }
}

/// Query interface onto a note store.
#[async_trait]
pub trait NoteSource: Send + Sync {
    /// Notes created within `window` of now, in a stable order.
    async fn notes_within(&self, window: Duration) -> Result<Vec<Note>, NoteSourceError>;
}

/// Failure reported by a [`NoteSource`].
#[derive(Debug, thiserror::Error)]
#[error("note source error: {0}")]
pub struct NoteSourceError(pub String);

/// A [`NoteSource`] over notes held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotes {
    notes: Vec<Note>,
}

impl InMemoryNotes {
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    pub fn push(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Notes created at or after `since`.
    pub fn created_since(&self, since: SystemTime) -> Vec<Note> {
        self.notes
            .iter()
            .filter(|note| note.created_at >= since)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl NoteSource for InMemoryNotes {
    async fn notes_within(&self, window: Duration) -> Result<Vec<Note>, NoteSourceError> {
        let since = SystemTime::now()
            .checked_sub(window)
            .unwrap_or(SystemTime::UNIX_EPOCH);
        Ok(self.created_since(since))
    }
}
