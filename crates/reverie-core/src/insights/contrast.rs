//! Contrast Pair Generator
//!
//! Consumes Topic Drift output and proposes rising-vs-fading pairings. This
//! is the only detector that depends on another detector's output shape.

use crate::error::Result;

use super::engine::{AnalysisContext, Detector};
use super::topic_drift::{drift_topics, topic_matches};
use super::types::{
    ContrastPair, InsightCard, InsightData, InsightEvidence, InsightKind, TopicDriftBucket,
    TopicTrend,
};

/// Buckets below this match count never pair
pub const MIN_BUCKET_COUNT: usize = 2;
/// Maximum pairs returned
pub const MAX_PAIRS: usize = 3;

/// Pair rising topics against fading ones.
///
/// Requires at least one rising and one fading bucket with `count >=`
/// [`MIN_BUCKET_COUNT`], else returns nothing. The full rising x fading
/// cross product is scored by summed counts; the top [`MAX_PAIRS`] survive.
pub fn contrast_pairs(buckets: &[TopicDriftBucket]) -> Vec<ContrastPair> {
    let eligible: Vec<&TopicDriftBucket> = buckets
        .iter()
        .filter(|b| b.count >= MIN_BUCKET_COUNT)
        .collect();

    let rising: Vec<&&TopicDriftBucket> = eligible
        .iter()
        .filter(|b| b.trend == TopicTrend::Rising)
        .collect();
    let fading: Vec<&&TopicDriftBucket> = eligible
        .iter()
        .filter(|b| b.trend == TopicTrend::Fading)
        .collect();

    if rising.is_empty() || fading.is_empty() {
        return vec![];
    }

    let mut pairs = Vec::with_capacity(rising.len() * fading.len());
    for r in &rising {
        for f in &fading {
            pairs.push(ContrastPair {
                topic_a: r.topic.clone(),
                topic_b: f.topic.clone(),
                trend_a: TopicTrend::Rising,
                trend_b: TopicTrend::Fading,
                score: r.count + f.count,
                summary: format!(
                    "{} is rising while {} is fading over the last month.",
                    r.topic, f.topic
                ),
            });
        }
    }

    pairs.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.topic_a.cmp(&b.topic_a))
            .then_with(|| a.topic_b.cmp(&b.topic_b))
    });
    pairs.truncate(MAX_PAIRS);
    pairs
}

/// Detector adapter: recomputes drift, pairs it, one card per pair
pub struct ContrastPairInsight;

impl ContrastPairInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ContrastPairInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for ContrastPairInsight {
    fn id(&self) -> InsightKind {
        InsightKind::ContrastPair
    }

    fn name(&self) -> &'static str {
        "Contrast Pairs"
    }

    fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightCard>> {
        let buckets = drift_topics(ctx.reflections, ctx.now);
        let pairs = contrast_pairs(&buckets);
        let mut cards = Vec::with_capacity(pairs.len());

        for pair in pairs {
            // Two entries per side keeps the claim checkable from the card
            let mut evidence: Vec<InsightEvidence> = topic_matches(ctx.reflections, &pair.topic_a)
                .into_iter()
                .take(2)
                .map(InsightEvidence::from_reflection)
                .collect();
            evidence.extend(
                topic_matches(ctx.reflections, &pair.topic_b)
                    .into_iter()
                    .take(2)
                    .map(InsightEvidence::from_reflection),
            );

            cards.push(
                InsightCard::new(
                    format!("contrast:{}:{}", pair.topic_a, pair.topic_b),
                    format!("{} up, {} down", pair.topic_a, pair.topic_b),
                    pair.summary.clone(),
                    ctx.now,
                    InsightData::ContrastPair { pair },
                )
                .with_evidence(evidence),
            );
        }

        Ok(cards)
    }
}
