//! Insight Engine - Evidence-Backed Reflection Insights
//!
//! A pluggable system that turns a snapshot of timestamped reflections into
//! insight cards. Instead of waiting for users to reread their own archive,
//! it analyzes the snapshot and surfaces what's interesting, with every
//! claim pinned to the entries that support it.
//!
//! ## Core Insight Types
//!
//! - **Timeline Events** - Firsts, silences, and pace shifts over time
//! - **Distribution** - Statistical shape of the writing cadence
//! - **Link Clusters** - Entries grouped by lexical overlap
//! - **Topic Drift** - Rising, stable, and fading themes
//! - **Contrast Pairs** - Rising themes set against fading ones
//! - **Streak Coach** - Peak writing hour and day-streak framing
//! - **Always-On Summary** - Whole-archive totals, never absent
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reverie_core::insights::artifact;
//!
//! let snapshot = artifact::build(&reflections, 90, now);
//! for card in &snapshot.cards {
//!     println!("{}: {}", card.title, card.explanation);
//! }
//! ```

pub mod artifact;
pub mod cluster;
pub mod contrast;
pub mod distribution;
pub mod engine;
pub mod streak;
pub mod summary;
pub mod timeline;
pub mod topic_drift;
pub mod types;
pub mod validate;

pub use artifact::{Artifact, ArtifactDebug};
pub use cluster::{LinkClusterData, LinkClusterInsight};
pub use contrast::ContrastPairInsight;
pub use distribution::{DayCount, DistributionInsight, DistributionResult, DistributionShape};
pub use engine::{AnalysisContext, Detector, DetectorRun, InsightEngine};
pub use streak::{StreakCoachData, StreakCoachInsight};
pub use summary::AlwaysOnSummaryInsight;
pub use timeline::{TimelineEvent, TimelineEventType, TimelineInsight};
pub use topic_drift::TopicDriftInsight;
pub use types::{
    ContrastPair, InsightCard, InsightData, InsightEvidence, InsightKind, SummaryData,
    TopicDriftBucket, TopicStrength, TopicTrend,
};
pub use validate::{InsightGate, RejectReason};
