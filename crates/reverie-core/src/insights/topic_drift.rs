//! Topic Drift Detector
//!
//! Scans reflections for keyword matches against a closed topic vocabulary
//! and reports each topic's movement across a 28-day lookback split into an
//! older half (days 28-15) and a newer half (days 14-0). All matching is
//! deterministic case-insensitive substring matching; there is no semantic
//! model behind it.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::Reflection;
use crate::text::preview;

use super::engine::{AnalysisContext, Detector};
use super::types::{
    InsightCard, InsightData, InsightEvidence, InsightKind, TopicDriftBucket, TopicStrength,
    TopicTrend,
};

/// Days of history the drift split considers
pub const LOOKBACK_DAYS: i64 = 28;
/// Last day-of-age that still counts as the newer half
pub const NEWER_HALF_MAX_AGE: i64 = 14;
/// newer/older at or above this is rising
pub const RISING_RATIO: f64 = 1.5;
/// newer/older at or below this is fading
pub const FADING_RATIO: f64 = 2.0 / 3.0;
/// |newer - older| at or above this is high strength
pub const HIGH_STRENGTH_DELTA: i64 = 3;
/// Maximum buckets returned
pub const MAX_BUCKETS: usize = 5;
/// Maximum sample titles kept per topic
const MAX_SAMPLE_TITLES: usize = 3;

/// The closed topic vocabulary. Topics never come from anywhere else.
pub const TOPIC_VOCABULARY: &[(&str, &[&str])] = &[
    (
        "work",
        &[
            "deadline", "meeting", "project", "boss", "coworker", "office", "interview",
            "promotion", "workload", "client", "standup",
        ],
    ),
    (
        "health",
        &[
            "sleep", "tired", "exercise", "workout", "doctor", "headache", "energy", "sick",
            "diet", "migraine", "appointment",
        ],
    ),
    (
        "relationships",
        &[
            "friend", "family", "partner", "mom", "dad", "brother", "sister", "wedding",
            "argument", "visit",
        ],
    ),
    (
        "money",
        &[
            "budget", "rent", "salary", "debt", "savings", "expense", "bill", "afford",
            "invest", "paycheck",
        ],
    ),
    (
        "creativity",
        &[
            "writing", "drawing", "music", "sketch", "design", "paint", "song", "poem",
            "novel", "studio",
        ],
    ),
    (
        "learning",
        &[
            "book", "reading", "course", "study", "learn", "language", "practice", "lesson",
            "lecture",
        ],
    ),
    (
        "travel",
        &[
            "trip", "flight", "travel", "hotel", "vacation", "abroad", "airport", "packing",
            "itinerary",
        ],
    ),
    (
        "emotions",
        &[
            "anxious", "grateful", "happy", "sad", "angry", "stress", "worry", "calm",
            "overwhelmed", "lonely",
        ],
    ),
];

/// True if the reflection body mentions any keyword of `topic`.
///
/// Case-insensitive substring matching against the closed vocabulary.
pub fn matches_topic(text: &str, topic: &str) -> bool {
    let lowered = text.to_lowercase();
    TOPIC_VOCABULARY
        .iter()
        .find(|(name, _)| *name == topic)
        .map(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .unwrap_or(false)
}

/// Non-deleted reflections matching `topic`, newest first.
pub fn topic_matches<'a>(reflections: &'a [Reflection], topic: &str) -> Vec<&'a Reflection> {
    let mut matched: Vec<&Reflection> = reflections
        .iter()
        .filter(|r| !r.is_deleted() && matches_topic(&r.text, topic))
        .collect();
    matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    matched
}

/// Scan reflections for topic keyword matches and report each matched
/// topic's trend and strength across the 28-day lookback.
///
/// `count` tallies matches across the whole input set; only the older/newer
/// counters are window-bound. A reflection increments a topic at most once.
/// At most [`MAX_BUCKETS`] buckets are returned, rising first (descending
/// newer-older delta), then stable (descending count), then fading with the
/// softest fade first.
pub fn drift_topics(reflections: &[Reflection], now: DateTime<Utc>) -> Vec<TopicDriftBucket> {
    let mut buckets = Vec::new();

    for (topic, keywords) in TOPIC_VOCABULARY {
        let mut count = 0usize;
        let mut older = 0usize;
        let mut newer = 0usize;
        let mut lookback_matches: Vec<&Reflection> = Vec::new();

        for r in reflections {
            if r.is_deleted() {
                continue;
            }
            let lowered = r.text.to_lowercase();
            if !keywords.iter().any(|k| lowered.contains(k)) {
                continue;
            }
            count += 1;

            let age_days = (now - r.created_at).num_days();
            if (0..=NEWER_HALF_MAX_AGE).contains(&age_days) {
                newer += 1;
                lookback_matches.push(r);
            } else if ((NEWER_HALF_MAX_AGE + 1)..=LOOKBACK_DAYS).contains(&age_days) {
                older += 1;
                lookback_matches.push(r);
            }
        }

        if count == 0 {
            continue;
        }

        // Older half empty: any newer activity reads as rising, none reads
        // as stable. The ratio rule only applies when older > 0.
        let trend = if older == 0 {
            if newer > 0 {
                TopicTrend::Rising
            } else {
                TopicTrend::Stable
            }
        } else {
            let ratio = newer as f64 / older as f64;
            if ratio >= RISING_RATIO {
                TopicTrend::Rising
            } else if ratio <= FADING_RATIO {
                TopicTrend::Fading
            } else {
                TopicTrend::Stable
            }
        };

        let delta = (newer as i64 - older as i64).abs();
        let strength = if delta >= HIGH_STRENGTH_DELTA {
            TopicStrength::High
        } else if delta == 2 {
            TopicStrength::Medium
        } else {
            TopicStrength::Low
        };

        lookback_matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let sample_titles = lookback_matches
            .iter()
            .take(MAX_SAMPLE_TITLES)
            .map(|r| preview(&r.text))
            .collect();

        buckets.push(TopicDriftBucket {
            topic: topic.to_string(),
            count,
            sample_titles,
            trend,
            strength,
            newer,
            older,
        });
    }

    buckets.sort_by(|a, b| {
        a.trend.rank().cmp(&b.trend.rank()).then_with(|| match a.trend {
            // Rising: biggest climb first. Fading: softest fade first.
            // Both orders are descending by delta since fading deltas are
            // negative.
            TopicTrend::Rising | TopicTrend::Fading => b.delta().cmp(&a.delta()),
            TopicTrend::Stable => b.count.cmp(&a.count),
        })
        .then_with(|| a.topic.cmp(&b.topic))
    });
    buckets.truncate(MAX_BUCKETS);
    buckets
}

/// Detector adapter: one card per drift bucket, bucket preserved as payload
pub struct TopicDriftInsight;

impl TopicDriftInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TopicDriftInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for TopicDriftInsight {
    fn id(&self) -> InsightKind {
        InsightKind::TopicCluster
    }

    fn name(&self) -> &'static str {
        "Topic Drift"
    }

    fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightCard>> {
        let buckets = drift_topics(ctx.reflections, ctx.now);
        let mut cards = Vec::with_capacity(buckets.len());

        for bucket in buckets {
            let title = match bucket.trend {
                TopicTrend::Rising => format!("{} is on the rise", capitalize(&bucket.topic)),
                TopicTrend::Stable => format!("{} is holding steady", capitalize(&bucket.topic)),
                TopicTrend::Fading => format!("{} is fading out", capitalize(&bucket.topic)),
            };
            let explanation = format!(
                "{} entries touch {}: {} in the last two weeks against {} in the two weeks before ({} signal).",
                bucket.count, bucket.topic, bucket.newer, bucket.older, bucket.strength
            );
            let evidence = topic_matches(ctx.reflections, &bucket.topic)
                .into_iter()
                .take(3)
                .map(InsightEvidence::from_reflection)
                .collect();

            cards.push(
                InsightCard::new(
                    format!("topic:{}", bucket.topic),
                    title,
                    explanation,
                    ctx.now,
                    InsightData::TopicCluster { bucket },
                )
                .with_evidence(evidence),
            );
        }

        Ok(cards)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{fixed_now, reflection};

    #[test]
    fn test_same_day_cluster_is_rising_via_older_zero_rule() {
        let now = fixed_now();
        // Three entries on one recent day, no history either side. The older
        // half is empty, so any newer activity reads as rising.
        let reflections = vec![
            reflection("a", now, 2, "the deadline is close"),
            reflection("b", now, 2, "deadline and a meeting"),
            reflection("c", now, 2, "another meeting about the deadline"),
        ];

        let buckets = drift_topics(&reflections, now);
        let work = buckets.iter().find(|b| b.topic == "work").unwrap();
        assert_eq!(work.count, 3);
        assert_eq!(work.newer, 3);
        assert_eq!(work.older, 0);
        assert_eq!(work.trend, TopicTrend::Rising);
        assert_eq!(work.strength, TopicStrength::High);
    }

    #[test]
    fn test_no_matches_in_newer_half_with_empty_older_is_stable() {
        let now = fixed_now();
        // Matches exist but sit entirely outside the lookback
        let reflections = vec![
            reflection("a", now, 60, "old budget worries"),
            reflection("b", now, 65, "more budget notes"),
        ];

        let buckets = drift_topics(&reflections, now);
        let money = buckets.iter().find(|b| b.topic == "money").unwrap();
        assert_eq!(money.count, 2);
        assert_eq!(money.newer, 0);
        assert_eq!(money.older, 0);
        assert_eq!(money.trend, TopicTrend::Stable);
    }

    #[test]
    fn test_ratio_rules() {
        let now = fixed_now();
        let mut reflections = Vec::new();
        // work: 2 older, 3 newer -> 1.5 ratio, rising
        reflections.push(reflection("w1", now, 20, "project meeting"));
        reflections.push(reflection("w2", now, 18, "another meeting"));
        reflections.push(reflection("w3", now, 3, "deadline"));
        reflections.push(reflection("w4", now, 4, "boss check-in meeting"));
        reflections.push(reflection("w5", now, 5, "office day"));
        // health: 3 older, 2 newer -> 0.667 ratio, fading
        reflections.push(reflection("h1", now, 20, "tired again"));
        reflections.push(reflection("h2", now, 21, "workout skipped"));
        reflections.push(reflection("h3", now, 22, "doctor visit"));
        reflections.push(reflection("h4", now, 2, "tired"));
        reflections.push(reflection("h5", now, 1, "slow workout"));
        // money: 2 older, 2 newer -> 1.0 ratio, stable
        reflections.push(reflection("m1", now, 19, "rent due"));
        reflections.push(reflection("m2", now, 17, "budget review"));
        reflections.push(reflection("m3", now, 6, "rent paid"));
        reflections.push(reflection("m4", now, 7, "budget again"));

        let buckets = drift_topics(&reflections, now);
        let trend_of = |topic: &str| buckets.iter().find(|b| b.topic == topic).unwrap().trend;
        assert_eq!(trend_of("work"), TopicTrend::Rising);
        assert_eq!(trend_of("health"), TopicTrend::Fading);
        assert_eq!(trend_of("money"), TopicTrend::Stable);
    }

    #[test]
    fn test_output_grouped_rising_stable_fading() {
        let now = fixed_now();
        let mut reflections = Vec::new();
        for i in 0..4 {
            reflections.push(reflection(&format!("r{}", i), now, 3 + i, "new project deadline"));
        }
        reflections.push(reflection("s1", now, 20, "rent"));
        reflections.push(reflection("s2", now, 5, "budget"));
        for i in 0..3 {
            reflections.push(reflection(&format!("f{}", i), now, 20 + i, "tired, no exercise"));
        }
        reflections.push(reflection("f4", now, 2, "tired"));

        let buckets = drift_topics(&reflections, now);
        let ranks: Vec<u8> = buckets.iter().map(|b| b.trend.rank()).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted, "rising must precede stable must precede fading");
    }

    #[test]
    fn test_at_most_five_buckets_and_sample_cap() {
        let now = fixed_now();
        let text = "deadline tired friend budget paint book trip anxious";
        let reflections: Vec<_> = (0..6)
            .map(|i| reflection(&format!("r{}", i), now, i, text))
            .collect();

        let buckets = drift_topics(&reflections, now);
        assert_eq!(buckets.len(), MAX_BUCKETS);
        assert!(buckets.iter().all(|b| b.sample_titles.len() <= 3));
    }

    #[test]
    fn test_deleted_reflections_never_match() {
        let now = fixed_now();
        let mut gone = reflection("gone", now, 2, "deadline panic");
        gone.deleted_at = Some(now);

        let buckets = drift_topics(&[gone], now);
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let now = fixed_now();
        let reflections: Vec<_> = (0..10)
            .map(|i| reflection(&format!("r{}", i), now, i * 3, "meeting then a workout"))
            .collect();

        let a = serde_json::to_string(&drift_topics(&reflections, now)).unwrap();
        let b = serde_json::to_string(&drift_topics(&reflections, now)).unwrap();
        assert_eq!(a, b);
    }
}
