//! Core types for the Reflection Insight Engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::Reflection;
use crate::text::preview;

use super::cluster::LinkClusterData;
use super::distribution::DistributionResult;
use super::streak::StreakCoachData;
use super::timeline::TimelineEvent;

/// Kinds of insight cards that can be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// A discrete, falsifiable moment on the timeline
    TimelineSpike,
    /// Entries grouped by lexical overlap
    LinkCluster,
    /// Writing-hour and day-streak coaching
    StreakCoach,
    /// A topic rising, holding, or fading over the lookback
    TopicCluster,
    /// Shape of the per-day writing distribution
    Distribution,
    /// A rising topic paired against a fading one
    ContrastPair,
    /// Baseline activity summary, emitted whenever there is any data
    AlwaysOnSummary,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::TimelineSpike => "timeline_spike",
            InsightKind::LinkCluster => "link_cluster",
            InsightKind::StreakCoach => "streak_coach",
            InsightKind::TopicCluster => "topic_cluster",
            InsightKind::Distribution => "distribution",
            InsightKind::ContrastPair => "contrast_pair",
            InsightKind::AlwaysOnSummary => "always_on_summary",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timeline_spike" => Ok(InsightKind::TimelineSpike),
            "link_cluster" => Ok(InsightKind::LinkCluster),
            "streak_coach" => Ok(InsightKind::StreakCoach),
            "topic_cluster" => Ok(InsightKind::TopicCluster),
            "distribution" => Ok(InsightKind::Distribution),
            "contrast_pair" => Ok(InsightKind::ContrastPair),
            "always_on_summary" => Ok(InsightKind::AlwaysOnSummary),
            _ => Err(format!("Unknown insight kind: {}", s)),
        }
    }
}

/// Direction a topic is moving across the lookback window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicTrend {
    Rising,
    Stable,
    Fading,
}

impl TopicTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicTrend::Rising => "rising",
            TopicTrend::Stable => "stable",
            TopicTrend::Fading => "fading",
        }
    }

    /// Group rank for output ordering: rising before stable before fading
    pub fn rank(&self) -> u8 {
        match self {
            TopicTrend::Rising => 0,
            TopicTrend::Stable => 1,
            TopicTrend::Fading => 2,
        }
    }
}

impl fmt::Display for TopicTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How strongly a topic's half-over-half movement is supported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicStrength {
    High,
    Medium,
    Low,
}

impl TopicStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopicStrength::High => "high",
            TopicStrength::Medium => "medium",
            TopicStrength::Low => "low",
        }
    }
}

impl fmt::Display for TopicStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A pointer from an insight card back to a concrete reflection.
///
/// Carries a derived preview only, never the entry body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightEvidence {
    pub entry_id: String,
    pub timestamp: DateTime<Utc>,
    pub preview: String,
}

impl InsightEvidence {
    pub fn from_reflection(r: &Reflection) -> Self {
        Self {
            entry_id: r.id.clone(),
            timestamp: r.created_at,
            preview: preview(&r.text),
        }
    }
}

/// One topic's movement across the 28-day lookback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicDriftBucket {
    /// Topic name, drawn from the closed vocabulary
    pub topic: String,
    /// Total matches across the whole input set, lookback or not
    pub count: usize,
    /// Up to 3 entry title previews that matched
    pub sample_titles: Vec<String>,
    pub trend: TopicTrend,
    pub strength: TopicStrength,
    /// Matches in the newer half of the lookback (days 14–0)
    pub newer: usize,
    /// Matches in the older half of the lookback (days 28–15)
    pub older: usize,
}

impl TopicDriftBucket {
    /// Newer-half minus older-half match count, the ordering key for rising
    /// and fading groups.
    pub fn delta(&self) -> i64 {
        self.newer as i64 - self.older as i64
    }
}

/// A rising topic paired with a fading one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContrastPair {
    pub topic_a: String,
    pub topic_b: String,
    /// Always `rising` in valid output
    pub trend_a: TopicTrend,
    /// Always `fading` in valid output
    pub trend_b: TopicTrend,
    /// Rising count + fading count
    pub score: usize,
    pub summary: String,
}

/// Baseline activity numbers for the always-on summary card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryData {
    pub total_entries: usize,
    pub active_days: usize,
    pub first_at: DateTime<Utc>,
    pub last_at: DateTime<Utc>,
}

/// Kind-specific payload attached to an insight card.
///
/// A closed sum rather than a free-form map, so the compiler checks
/// exhaustiveness wherever cards are consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InsightData {
    TimelineSpike { event: TimelineEvent },
    LinkCluster { cluster: LinkClusterData },
    StreakCoach { streaks: StreakCoachData },
    TopicCluster { bucket: TopicDriftBucket },
    Distribution { result: DistributionResult },
    ContrastPair { pair: ContrastPair },
    AlwaysOnSummary { summary: SummaryData },
}

impl InsightData {
    /// The card kind this payload belongs to
    pub fn kind(&self) -> InsightKind {
        match self {
            InsightData::TimelineSpike { .. } => InsightKind::TimelineSpike,
            InsightData::LinkCluster { .. } => InsightKind::LinkCluster,
            InsightData::StreakCoach { .. } => InsightKind::StreakCoach,
            InsightData::TopicCluster { .. } => InsightKind::TopicCluster,
            InsightData::Distribution { .. } => InsightKind::Distribution,
            InsightData::ContrastPair { .. } => InsightKind::ContrastPair,
            InsightData::AlwaysOnSummary { .. } => InsightKind::AlwaysOnSummary,
        }
    }
}

/// The common output unit of every detector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightCard {
    /// Unique per computation (e.g., "topic:work", "timeline:first_occurrence")
    pub id: String,
    pub kind: InsightKind,
    pub title: String,
    pub explanation: String,
    pub evidence: Vec<InsightEvidence>,
    /// The caller-supplied `now`, so identical inputs yield identical cards
    pub computed_at: DateTime<Utc>,
    pub data: InsightData,
}

impl InsightCard {
    /// Create a card; `kind` is derived from the payload so the two cannot
    /// disagree at construction time.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        explanation: impl Into<String>,
        computed_at: DateTime<Utc>,
        data: InsightData,
    ) -> Self {
        Self {
            id: id.into(),
            kind: data.kind(),
            title: title.into(),
            explanation: explanation.into(),
            evidence: Vec::new(),
            computed_at,
            data,
        }
    }

    /// Attach supporting evidence
    pub fn with_evidence(mut self, evidence: Vec<InsightEvidence>) -> Self {
        self.evidence = evidence;
        self
    }
}
