//! Insight Engine - orchestrates the pure detectors
//!
//! Every detector is a synchronous, side-effect-free function of the
//! reflection snapshot plus an explicit `now`; the engine just runs the
//! registered detectors in priority order and swallows individual failures.

use chrono::{DateTime, Utc};

use crate::models::{AnalysisWindow, Reflection};
use crate::Result;

use super::cluster::LinkClusterInsight;
use super::contrast::ContrastPairInsight;
use super::distribution::DistributionInsight;
use super::streak::StreakCoachInsight;
use super::summary::AlwaysOnSummaryInsight;
use super::timeline::TimelineInsight;
use super::topic_drift::TopicDriftInsight;
use super::types::{InsightCard, InsightKind};

/// Context provided to insight detectors
pub struct AnalysisContext<'a> {
    /// Snapshot of reflections under analysis; already window-filtered by
    /// the artifact builder
    pub reflections: &'a [Reflection],
    /// Explicit computation time; detectors never read the wall clock
    pub now: DateTime<Utc>,
    /// The analysis window the snapshot was cut to
    pub window: AnalysisWindow,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(reflections: &'a [Reflection], window: AnalysisWindow, now: DateTime<Utc>) -> Self {
        Self {
            reflections,
            now,
            window,
        }
    }

    /// Context for the `days` days leading up to `now`
    pub fn trailing_days(reflections: &'a [Reflection], days: i64, now: DateTime<Utc>) -> Self {
        Self::new(reflections, AnalysisWindow::trailing_days(now, days), now)
    }
}

/// Trait for insight detectors
pub trait Detector: Send + Sync {
    /// The card kind this detector produces
    fn id(&self) -> InsightKind;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Analyze the snapshot and produce candidate cards
    fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightCard>>;
}

/// Candidate counts per detector, for the artifact's diagnostic channel
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DetectorRun {
    pub detector: String,
    pub candidates: usize,
    pub failed: bool,
}

/// The main insight engine that runs detectors in priority order
pub struct InsightEngine {
    detectors: Vec<Box<dyn Detector>>,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl InsightEngine {
    /// Create an engine with the built-in detectors, registered in the fixed
    /// output priority order: timeline events, distribution spikes, link
    /// clusters, topic drift, contrast pairs, streak coaching, then the
    /// always-on summary.
    pub fn new() -> Self {
        let mut engine = Self { detectors: vec![] };

        engine.register(Box::new(TimelineInsight::new()));
        engine.register(Box::new(DistributionInsight::new()));
        engine.register(Box::new(LinkClusterInsight::new()));
        engine.register(Box::new(TopicDriftInsight::new()));
        engine.register(Box::new(ContrastPairInsight::new()));
        engine.register(Box::new(StreakCoachInsight::new()));
        engine.register(Box::new(AlwaysOnSummaryInsight::new()));

        engine
    }

    /// Register a detector at the end of the priority order
    pub fn register(&mut self, detector: Box<dyn Detector>) {
        self.detectors.push(detector);
    }

    /// Run all detectors and concatenate candidates in priority order.
    ///
    /// A detector failure contributes zero cards and never aborts the run.
    pub fn analyze_all(&self, ctx: &AnalysisContext<'_>) -> (Vec<InsightCard>, Vec<DetectorRun>) {
        let mut all_cards = vec![];
        let mut runs = vec![];

        for detector in &self.detectors {
            match detector.detect(ctx) {
                Ok(cards) => {
                    tracing::debug!(
                        detector = detector.name(),
                        count = cards.len(),
                        "Detector complete"
                    );
                    runs.push(DetectorRun {
                        detector: detector.id().as_str().to_string(),
                        candidates: cards.len(),
                        failed: false,
                    });
                    all_cards.extend(cards);
                }
                Err(e) => {
                    tracing::warn!(
                        detector = detector.name(),
                        error = %e,
                        "Detector failed; contributing zero cards"
                    );
                    runs.push(DetectorRun {
                        detector: detector.id().as_str().to_string(),
                        candidates: 0,
                        failed: true,
                    });
                }
            }
        }

        (all_cards, runs)
    }

    /// Kinds of the registered detectors, in priority order
    pub fn detector_kinds(&self) -> Vec<InsightKind> {
        self.detectors.iter().map(|d| d.id()).collect()
    }
}
