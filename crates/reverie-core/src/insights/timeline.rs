//! Timeline Event Detector
//!
//! Extracts a handful of discrete, falsifiable narrative moments from the
//! history: the first and last entries, week-over-week pace shifts, and
//! silences that border a burst of intensity. Every event states a claim,
//! points at the entries that support it, and states a contrast (what did
//! not happen) so the claim stays checkable.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::models::{live, Reflection};

use super::engine::{AnalysisContext, Detector};
use super::types::{InsightCard, InsightData, InsightEvidence, InsightKind};

/// Minimum non-deleted reflections before any event is emitted
pub const MIN_ENTRIES: usize = 10;
/// Minimum reflections before pace shifts are considered
pub const MIN_ENTRIES_PACE: usize = 20;
/// Minimum reflections before silences are considered
pub const MIN_ENTRIES_SILENCE: usize = 15;
/// The most recent entry must be older than this for a last-occurrence event
pub const LAST_OCCURRENCE_MIN_AGE_DAYS: i64 = 7;
/// Week-over-week ratio at or above this (or at or below its inverse) is a
/// pace shift
pub const PACE_SHIFT_RATIO: f64 = 2.0;
/// Gaps shorter than this are not silences
pub const SILENCE_MIN_GAP_DAYS: i64 = 7;
/// Density window measured on each side of a silence
pub const SILENCE_DENSITY_WINDOW_DAYS: i64 = 30;
/// One side's density must exceed the other's by this factor
pub const SILENCE_INTENSITY_RATIO: f64 = 1.5;
/// Maximum pace-shift events kept
const MAX_PACE_SHIFTS: usize = 2;
/// Maximum events returned overall
const MAX_EVENTS: usize = 5;

/// Kind of timeline moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventType {
    FirstOccurrence,
    LastOccurrence,
    PaceShift,
    SilenceAsSignal,
}

impl TimelineEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimelineEventType::FirstOccurrence => "first_occurrence",
            TimelineEventType::LastOccurrence => "last_occurrence",
            TimelineEventType::PaceShift => "pace_shift",
            TimelineEventType::SilenceAsSignal => "silence_as_signal",
        }
    }
}

impl fmt::Display for TimelineEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One discrete, falsifiable moment on the timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: String,
    pub event_type: TimelineEventType,
    pub date: DateTime<Utc>,
    /// A falsifiable assertion about this one moment
    pub claim: String,
    pub evidence: Vec<InsightEvidence>,
    /// What did NOT happen, keeping the claim checkable
    pub contrast: String,
    /// Quantified support for the claim (counts, ratios)
    pub confidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_context: Option<String>,
}

/// Detect timeline events, newest first, at most [`MAX_EVENTS`].
pub fn detect_events(reflections: &[Reflection], now: DateTime<Utc>) -> Vec<TimelineEvent> {
    let mut entries = live(reflections);
    if entries.len() < MIN_ENTRIES {
        return vec![];
    }
    entries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

    let mut events = Vec::new();
    events.push(first_occurrence(&entries));
    if let Some(e) = last_occurrence(&entries, now) {
        events.push(e);
    }
    if entries.len() >= MIN_ENTRIES_PACE {
        events.extend(pace_shifts(&entries));
    }
    if entries.len() >= MIN_ENTRIES_SILENCE {
        if let Some(e) = silence_as_signal(&entries) {
            events.push(e);
        }
    }

    events.sort_by(|a, b| b.date.cmp(&a.date).then(a.id.cmp(&b.id)));
    events.truncate(MAX_EVENTS);
    events
}

/// The earliest entry. Always emitted once the overall floor is met.
fn first_occurrence(entries: &[&Reflection]) -> TimelineEvent {
    let first = entries[0];
    let evidence: Vec<InsightEvidence> = entries
        .iter()
        .take(2)
        .map(|r| InsightEvidence::from_reflection(r))
        .collect();

    TimelineEvent {
        id: "timeline:first_occurrence".to_string(),
        event_type: TimelineEventType::FirstOccurrence,
        date: first.created_at,
        claim: format!(
            "You wrote your first entry on {}.",
            first.created_at.format("%B %-d, %Y")
        ),
        evidence,
        contrast: "No earlier entry exists in this history.".to_string(),
        confidence: format!("Earliest of {} entries.", entries.len()),
        before_context: None,
        after_context: entries
            .get(1)
            .map(|r| format!("The next entry followed on {}.", r.created_at.format("%B %-d, %Y"))),
    }
}

/// The most recent entry, but only when it is far enough in the past that
/// its distance is itself the story.
fn last_occurrence(entries: &[&Reflection], now: DateTime<Utc>) -> Option<TimelineEvent> {
    let last = entries.last()?;
    let age_days = (now - last.created_at).num_days();
    if age_days <= LAST_OCCURRENCE_MIN_AGE_DAYS {
        return None;
    }

    let evidence: Vec<InsightEvidence> = entries
        .iter()
        .rev()
        .take(2)
        .map(|r| InsightEvidence::from_reflection(r))
        .collect();

    Some(TimelineEvent {
        id: "timeline:last_occurrence".to_string(),
        event_type: TimelineEventType::LastOccurrence,
        date: last.created_at,
        claim: format!(
            "Your most recent entry was {} days ago, on {}.",
            age_days,
            last.created_at.format("%B %-d, %Y")
        ),
        evidence,
        contrast: "Nothing has been written since.".to_string(),
        confidence: format!("Latest of {} entries; gap measured to the analysis time.", entries.len()),
        before_context: None,
        after_context: None,
    })
}

/// ISO week (Monday start) of a date, keyed for ordering
fn week_key(date: NaiveDate) -> (i32, u32) {
    let iso = date.iso_week();
    (iso.year(), iso.week())
}

/// Week-over-week doublings and halvings between consecutive non-empty
/// weeks, anchored at the first entry of the changed week. Newest
/// [`MAX_PACE_SHIFTS`] kept.
fn pace_shifts(entries: &[&Reflection]) -> Vec<TimelineEvent> {
    let mut weeks: BTreeMap<(i32, u32), Vec<&Reflection>> = BTreeMap::new();
    for r in entries {
        weeks.entry(week_key(r.created_at.date_naive())).or_default().push(r);
    }

    let ordered: Vec<(&(i32, u32), &Vec<&Reflection>)> = weeks.iter().collect();
    let mut events = Vec::new();

    for pair in ordered.windows(2) {
        let (_, prev_entries) = pair[0];
        let (_, week_entries) = pair[1];
        let prev_count = prev_entries.len();
        let count = week_entries.len();
        let ratio = count as f64 / prev_count as f64;

        let direction = if ratio >= PACE_SHIFT_RATIO {
            "doubled"
        } else if ratio <= 1.0 / PACE_SHIFT_RATIO {
            "halved"
        } else {
            continue;
        };

        let anchor = week_entries[0];
        let mut evidence: Vec<InsightEvidence> = week_entries
            .iter()
            .take(3)
            .map(|r| InsightEvidence::from_reflection(r))
            .collect();
        if let Some(prev_last) = prev_entries.last() {
            evidence.push(InsightEvidence::from_reflection(prev_last));
        }
        evidence.truncate(4);

        events.push(TimelineEvent {
            id: format!("timeline:pace_shift:{}", anchor.created_at.format("%Y-%m-%d")),
            event_type: TimelineEventType::PaceShift,
            date: anchor.created_at,
            claim: format!(
                "In the week of {}, your writing pace {} ({} entries after {}).",
                anchor.created_at.format("%B %-d"),
                direction,
                count,
                prev_count
            ),
            evidence,
            contrast: format!(
                "The week before held {} entries; this was not a steady continuation.",
                prev_count
            ),
            confidence: format!("{} vs {} entries, a {:.1}x change.", count, prev_count, ratio),
            before_context: Some(format!("{} entries the previous non-empty week.", prev_count)),
            after_context: None,
        });
    }

    // Newest shifts are the interesting ones
    events.reverse();
    events.truncate(MAX_PACE_SHIFTS);
    events
}

/// The single longest gap between adjacent entries, if it borders a burst.
fn silence_as_signal(entries: &[&Reflection]) -> Option<TimelineEvent> {
    let (gap_start, gap_end, gap_days) = entries
        .windows(2)
        .map(|w| (w[0], w[1], (w[1].created_at - w[0].created_at).num_days()))
        .max_by_key(|t| t.2)?;

    if gap_days < SILENCE_MIN_GAP_DAYS {
        return None;
    }

    let window = Duration::days(SILENCE_DENSITY_WINDOW_DAYS);
    let before_count = entries
        .iter()
        .filter(|r| {
            r.created_at <= gap_start.created_at && r.created_at >= gap_start.created_at - window
        })
        .count();
    let after_count = entries
        .iter()
        .filter(|r| r.created_at >= gap_end.created_at && r.created_at <= gap_end.created_at + window)
        .count();

    let before_density = before_count as f64 / SILENCE_DENSITY_WINDOW_DAYS as f64;
    let after_density = after_count as f64 / SILENCE_DENSITY_WINDOW_DAYS as f64;

    // The silence is only a signal when one side is clearly the busier one
    let (claim, before_context, after_context) =
        if before_density > 0.0 && before_density >= SILENCE_INTENSITY_RATIO * after_density {
            (
                format!(
                    "A {}-day silence followed a burst of intensity that ended on {}.",
                    gap_days,
                    gap_start.created_at.format("%B %-d, %Y")
                ),
                Some(format!("{} entries in the 30 days before the silence.", before_count)),
                Some(format!("{} entries in the 30 days after.", after_count)),
            )
        } else if after_density >= SILENCE_INTENSITY_RATIO * before_density && after_density > 0.0 {
            (
                format!(
                    "A {}-day silence preceded a burst of intensity starting {}.",
                    gap_days,
                    gap_end.created_at.format("%B %-d, %Y")
                ),
                Some(format!("{} entries in the 30 days before the silence.", before_count)),
                Some(format!("{} entries in the 30 days after.", after_count)),
            )
        } else {
            return None;
        };

    Some(TimelineEvent {
        id: format!("timeline:silence:{}", gap_end.created_at.format("%Y-%m-%d")),
        event_type: TimelineEventType::SilenceAsSignal,
        date: gap_end.created_at,
        claim,
        evidence: vec![
            InsightEvidence::from_reflection(gap_start),
            InsightEvidence::from_reflection(gap_end),
        ],
        contrast: format!(
            "No entry exists inside the {} days between these two.",
            gap_days
        ),
        confidence: format!(
            "Density {:.2} entries/day before vs {:.2} after the gap.",
            before_density, after_density
        ),
        before_context,
        after_context,
    })
}

/// Detector adapter: one card per timeline event
pub struct TimelineInsight;

impl TimelineInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TimelineInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for TimelineInsight {
    fn id(&self) -> InsightKind {
        InsightKind::TimelineSpike
    }

    fn name(&self) -> &'static str {
        "Timeline Events"
    }

    fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightCard>> {
        let events = detect_events(ctx.reflections, ctx.now);
        let cards = events
            .into_iter()
            .map(|event| {
                let title = match event.event_type {
                    TimelineEventType::FirstOccurrence => "Where it all started".to_string(),
                    TimelineEventType::LastOccurrence => "It has been a while".to_string(),
                    TimelineEventType::PaceShift => "Your pace shifted".to_string(),
                    TimelineEventType::SilenceAsSignal => "A silence that says something".to_string(),
                };
                let explanation =
                    format!("{} {} {}", event.claim, event.contrast, event.confidence);
                let evidence = event.evidence.clone();
                InsightCard::new(event.id.clone(), title, explanation, ctx.now, InsightData::TimelineSpike { event })
                    .with_evidence(evidence)
            })
            .collect();
        Ok(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{fixed_now, reflection};

    #[test]
    fn test_below_floor_yields_nothing() {
        let now = fixed_now();
        let reflections: Vec<_> = (0..9)
            .map(|i| reflection(&format!("r{}", i), now, i, "note"))
            .collect();
        assert!(detect_events(&reflections, now).is_empty());
    }

    #[test]
    fn test_first_occurrence_always_emitted() {
        let now = fixed_now();
        let reflections: Vec<_> = (0..10)
            .map(|i| reflection(&format!("r{}", i), now, i, "note"))
            .collect();

        let events = detect_events(&reflections, now);
        let first = events
            .iter()
            .find(|e| e.event_type == TimelineEventType::FirstOccurrence)
            .unwrap();
        assert_eq!(first.evidence[0].entry_id, "r9");
        assert!(!first.claim.is_empty());
        assert!(!first.contrast.is_empty());
    }

    #[test]
    fn test_last_occurrence_only_when_stale() {
        let now = fixed_now();
        let fresh: Vec<_> = (0..10)
            .map(|i| reflection(&format!("r{}", i), now, i, "note"))
            .collect();
        let fresh_events = detect_events(&fresh, now);
        assert!(!fresh_events
            .iter()
            .any(|e| e.event_type == TimelineEventType::LastOccurrence));

        let stale: Vec<_> = (0..10)
            .map(|i| reflection(&format!("r{}", i), now, 10 + i, "note"))
            .collect();
        let stale_events = detect_events(&stale, now);
        let last = stale_events
            .iter()
            .find(|e| e.event_type == TimelineEventType::LastOccurrence)
            .unwrap();
        assert!(last.claim.contains("10 days ago"));
    }

    #[test]
    fn test_pace_shift_on_doubling_week() {
        let now = fixed_now();
        let mut reflections = Vec::new();
        // Three weeks at 3 entries, then a week with 8
        for week in 0..3 {
            for i in 0..3 {
                reflections.push(reflection(
                    &format!("w{}e{}", week, i),
                    now,
                    28 - week * 7 - i * 2,
                    "steady",
                ));
            }
        }
        for i in 0..8 {
            reflections.push(reflection(&format!("burst{}", i), now, 6 - (i % 7), "burst"));
        }
        // Pad to reach the pace floor
        for i in 0..3 {
            reflections.push(reflection(&format!("pad{}", i), now, 40 + i, "old"));
        }

        let events = detect_events(&reflections, now);
        let shift = events
            .iter()
            .find(|e| e.event_type == TimelineEventType::PaceShift);
        assert!(shift.is_some(), "expected a pace shift event");
        let shift = shift.unwrap();
        assert!(shift.claim.contains("doubled") || shift.claim.contains("halved"));
        assert!(shift.evidence.len() >= 2 && shift.evidence.len() <= 4);
    }

    #[test]
    fn test_silence_following_a_burst() {
        let now = fixed_now();
        // Dense month, 10-day silence, then a thin tail
        let mut reflections = Vec::new();
        for i in 0..20 {
            reflections.push(reflection(&format!("dense{}", i), now, 40 - i, "busy stretch"));
        }
        reflections.push(reflection("after1", now, 9, "back"));
        reflections.push(reflection("after2", now, 5, "again"));

        let events = detect_events(&reflections, now);
        let silence = events
            .iter()
            .find(|e| e.event_type == TimelineEventType::SilenceAsSignal)
            .unwrap();
        assert!(silence.claim.contains("followed a burst"));
        assert_eq!(silence.evidence.len(), 2);
        assert!(silence.confidence.contains("entries/day"));
    }

    #[test]
    fn test_short_gaps_are_not_silences() {
        let now = fixed_now();
        // 16 entries, max gap 3 days
        let reflections: Vec<_> = (0..16)
            .map(|i| reflection(&format!("r{}", i), now, i * 3, "regular"))
            .collect();

        let events = detect_events(&reflections, now);
        assert!(!events
            .iter()
            .any(|e| e.event_type == TimelineEventType::SilenceAsSignal));
    }

    #[test]
    fn test_newest_first_and_capped() {
        let now = fixed_now();
        let mut reflections = Vec::new();
        for i in 0..30 {
            reflections.push(reflection(&format!("r{}", i), now, 60 - i * 2, "note"));
        }

        let events = detect_events(&reflections, now);
        assert!(events.len() <= 5);
        assert!(events.windows(2).all(|w| w[0].date >= w[1].date));
    }
}
