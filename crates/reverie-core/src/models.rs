//! Domain models for Reverie

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// One user-authored, timestamped text record.
///
/// Reflections arrive decrypted from the entry repository and are treated as
/// immutable: the engine reads them, it never writes them back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reflection {
    /// Opaque unique identifier
    pub id: String,
    /// Authoring time
    pub created_at: DateTime<Utc>,
    /// If present, the record is excluded from all computation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Plaintext body
    pub text: String,
    /// Optional reference to an externally-imported source document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl Reflection {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A half-open-in-spirit, inclusive-in-practice analysis time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AnalysisWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window covering the `days` days leading up to `now`, inclusive.
    pub fn trailing_days(now: DateTime<Utc>, days: i64) -> Self {
        Self {
            start: now - Duration::days(days),
            end: now,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }

    /// Whole days spanned by the window, rounded up, never below 1.
    pub fn span_days(&self) -> i64 {
        let secs = (self.end - self.start).num_seconds().max(0);
        ((secs + 86_399) / 86_400).max(1)
    }
}

/// Non-deleted reflections, in input order.
pub fn live<'a>(reflections: &'a [Reflection]) -> Vec<&'a Reflection> {
    reflections.iter().filter(|r| !r.is_deleted()).collect()
}

/// Non-deleted reflections inside `window`, in input order.
pub fn live_in_window<'a>(
    reflections: &'a [Reflection],
    window: &AnalysisWindow,
) -> Vec<&'a Reflection> {
    reflections
        .iter()
        .filter(|r| !r.is_deleted() && window.contains(r.created_at))
        .collect()
}
