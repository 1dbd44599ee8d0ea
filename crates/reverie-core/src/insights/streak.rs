//! Streak Coach
//!
//! Finds the hour of day the user most consistently writes in, measures the
//! current and longest day-streaks, and frames one coaching card around how
//! close `now` is to that peak hour.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{live, Reflection};

use super::engine::{AnalysisContext, Detector};
use super::types::{InsightCard, InsightData, InsightEvidence, InsightKind};

/// Minimum non-deleted reflections before coaching makes sense
pub const MIN_ENTRIES: usize = 5;
/// The peak hour must hold at least this many entries
pub const MIN_PEAK_HOUR_COUNT: usize = 3;
/// Hours-until-peak at or below this counts as imminent
const IMMINENT_HOURS: u32 = 2;

/// Streak and peak-hour numbers preserved on the card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakCoachData {
    /// Hour of day (0-23) with the most entries across all history
    pub best_hour: u32,
    pub best_hour_count: usize,
    /// Consecutive days with entries, counted backward from today or
    /// yesterday
    pub current_streak: usize,
    /// Longest run of consecutive days with entries, ever
    pub longest_streak: usize,
}

/// Where `now` sits relative to the peak writing hour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeakPhase {
    AtPeak,
    Imminent(u32),
    JustPassed,
    Elsewhere,
}

fn peak_phase(now_hour: u32, best_hour: u32) -> PeakPhase {
    let until = (best_hour + 24 - now_hour) % 24;
    if until == 0 {
        PeakPhase::AtPeak
    } else if until <= IMMINENT_HOURS {
        PeakPhase::Imminent(until)
    } else if until >= 24 - IMMINENT_HOURS {
        PeakPhase::JustPassed
    } else {
        PeakPhase::Elsewhere
    }
}

/// Emit zero or one coaching card for the user's writing habit.
pub fn coach(reflections: &[Reflection], now: DateTime<Utc>) -> Vec<InsightCard> {
    let entries = live(reflections);
    if entries.len() < MIN_ENTRIES {
        return vec![];
    }

    let mut per_hour = [0usize; 24];
    for r in &entries {
        per_hour[r.created_at.hour() as usize] += 1;
    }
    let best_hour = (0..24u32)
        .max_by_key(|&h| (per_hour[h as usize], std::cmp::Reverse(h)))
        .unwrap_or(0);
    let best_hour_count = per_hour[best_hour as usize];
    if best_hour_count < MIN_PEAK_HOUR_COUNT {
        return vec![];
    }

    let days: BTreeSet<NaiveDate> = entries.iter().map(|r| r.created_at.date_naive()).collect();
    let current_streak = current_streak(&days, now.date_naive());
    let longest_streak = longest_streak(&days);

    let data = StreakCoachData {
        best_hour,
        best_hour_count,
        current_streak,
        longest_streak,
    };

    let streak_clause = if current_streak >= 2 {
        format!(" You're {} days into a streak.", current_streak)
    } else {
        String::new()
    };

    let explanation = match peak_phase(now.hour(), best_hour) {
        PeakPhase::AtPeak => format!(
            "This is the hour you write most often ({} entries at {:02}:00).{} A good moment to add one more.",
            best_hour_count, best_hour, streak_clause
        ),
        PeakPhase::Imminent(h) => format!(
            "Your usual writing window opens in about {} hour{}.{}",
            h,
            if h == 1 { "" } else { "s" },
            streak_clause
        ),
        PeakPhase::JustPassed => format!(
            "Your usual window around {:02}:00 just passed. A short entry still counts toward the habit.{}",
            best_hour, streak_clause
        ),
        PeakPhase::Elsewhere => format!(
            "You write most often around {:02}:00. Your longest run is {} consecutive day{}.{}",
            best_hour,
            longest_streak,
            if longest_streak == 1 { "" } else { "s" },
            streak_clause
        ),
    };

    // Evidence: entries from the peak hour, newest first
    let mut peak_entries: Vec<&Reflection> = entries
        .iter()
        .copied()
        .filter(|r| r.created_at.hour() == best_hour)
        .collect();
    peak_entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    let evidence: Vec<InsightEvidence> = peak_entries
        .into_iter()
        .take(5)
        .map(InsightEvidence::from_reflection)
        .collect();

    let card = InsightCard::new(
        format!("streak:hour:{}", best_hour),
        format!("Your writing hour is {:02}:00", best_hour),
        explanation,
        now,
        InsightData::StreakCoach { streaks: data },
    )
    .with_evidence(evidence);

    vec![card]
}

/// Consecutive days with entries, counted backward from today, or from
/// yesterday when today has none yet.
fn current_streak(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> usize {
    let mut cursor = if days.contains(&today) {
        today
    } else if days.contains(&(today - Duration::days(1))) {
        today - Duration::days(1)
    } else {
        return 0;
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        cursor -= Duration::days(1);
    }
    streak
}

/// Longest run of consecutive days with entries, over all history
fn longest_streak(days: &BTreeSet<NaiveDate>) -> usize {
    let mut longest = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;

    for &day in days {
        run = match prev {
            Some(p) if day == p + Duration::days(1) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }
    longest
}

/// Detector adapter over [`coach`]
pub struct StreakCoachInsight;

impl StreakCoachInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StreakCoachInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for StreakCoachInsight {
    fn id(&self) -> InsightKind {
        InsightKind::StreakCoach
    }

    fn name(&self) -> &'static str {
        "Streak Coach"
    }

    fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightCard>> {
        Ok(coach(ctx.reflections, ctx.now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{fixed_now, reflection, reflection_at};
    use chrono::TimeZone;

    fn at_hour(id: &str, days_ago: i64, hour: u32) -> Reflection {
        let now = fixed_now();
        let date = (now - Duration::days(days_ago)).date_naive();
        reflection_at(
            id,
            Utc.from_utc_datetime(&date.and_hms_opt(hour, 5, 0).unwrap()),
            "evening notes",
        )
    }

    #[test]
    fn test_fewer_than_five_entries_yields_nothing() {
        let now = fixed_now();
        let reflections: Vec<_> = (0..4)
            .map(|i| reflection(&format!("r{}", i), now, i, "note"))
            .collect();
        assert!(coach(&reflections, now).is_empty());
    }

    #[test]
    fn test_weak_peak_hour_yields_nothing() {
        let now = fixed_now();
        // Six entries spread across six different hours: no hour reaches 3
        let reflections: Vec<_> = (0..6)
            .map(|i| at_hour(&format!("r{}", i), i as i64, (8 + i * 2) as u32))
            .collect();
        assert!(coach(&reflections, now).is_empty());
    }

    #[test]
    fn test_peak_hour_and_streaks() {
        // fixed_now() is 21:30; entries cluster at hour 21
        let reflections = vec![
            at_hour("a", 0, 21),
            at_hour("b", 1, 21),
            at_hour("c", 2, 21),
            at_hour("d", 3, 21),
            at_hour("e", 10, 9),
        ];

        let cards = coach(&reflections, fixed_now());
        assert_eq!(cards.len(), 1);
        let InsightData::StreakCoach { streaks } = &cards[0].data else {
            panic!("expected streak payload");
        };
        assert_eq!(streaks.best_hour, 21);
        assert_eq!(streaks.best_hour_count, 4);
        assert_eq!(streaks.current_streak, 4);
        assert_eq!(streaks.longest_streak, 4);
        // now is inside the peak hour
        assert!(cards[0].explanation.contains("hour you write most often"));
    }

    #[test]
    fn test_streak_counts_from_yesterday_when_today_empty() {
        let reflections = vec![
            at_hour("a", 1, 20),
            at_hour("b", 2, 20),
            at_hour("c", 3, 20),
            at_hour("d", 4, 20),
            at_hour("e", 9, 20),
        ];

        let cards = coach(&reflections, fixed_now());
        let InsightData::StreakCoach { streaks } = &cards[0].data else {
            panic!("expected streak payload");
        };
        assert_eq!(streaks.current_streak, 4);
    }

    #[test]
    fn test_broken_streak_is_zero() {
        let reflections = vec![
            at_hour("a", 3, 20),
            at_hour("b", 4, 20),
            at_hour("c", 5, 20),
            at_hour("d", 6, 20),
            at_hour("e", 7, 20),
        ];

        let cards = coach(&reflections, fixed_now());
        let InsightData::StreakCoach { streaks } = &cards[0].data else {
            panic!("expected streak payload");
        };
        assert_eq!(streaks.current_streak, 0);
        assert_eq!(streaks.longest_streak, 5);
    }

    #[test]
    fn test_evidence_from_peak_hour_newest_first() {
        let reflections = vec![
            at_hour("a", 0, 21),
            at_hour("b", 1, 21),
            at_hour("c", 2, 21),
            at_hour("d", 3, 21),
            at_hour("e", 4, 21),
            at_hour("f", 5, 21),
            at_hour("g", 6, 9),
        ];

        let cards = coach(&reflections, fixed_now());
        let evidence = &cards[0].evidence;
        assert_eq!(evidence.len(), 5);
        assert_eq!(evidence[0].entry_id, "a");
        assert!(evidence.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_peak_phase_table() {
        assert_eq!(peak_phase(21, 21), PeakPhase::AtPeak);
        assert_eq!(peak_phase(19, 21), PeakPhase::Imminent(2));
        assert_eq!(peak_phase(22, 21), PeakPhase::JustPassed);
        assert_eq!(peak_phase(9, 21), PeakPhase::Elsewhere);
        // Wraps around midnight
        assert_eq!(peak_phase(23, 1), PeakPhase::Imminent(2));
        assert_eq!(peak_phase(1, 23), PeakPhase::JustPassed);
    }
}
