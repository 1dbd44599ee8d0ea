//! Artifact Builder
//!
//! The one entry point callers use: cut the snapshot to a trailing window,
//! run every detector, gate the candidates, and wrap the survivors in a
//! self-describing artifact. Same snapshot and same `now` always yield the
//! same artifact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{live_in_window, AnalysisWindow, Reflection};

use super::engine::{AnalysisContext, DetectorRun, InsightEngine};
use super::types::InsightCard;
use super::validate::InsightGate;

/// The complete output of one insight computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artifact {
    /// Human-readable window label, e.g. "90d"
    pub horizon: String,
    pub window: AnalysisWindow,
    /// Caller-supplied computation time, echoed back
    pub created_at: DateTime<Utc>,
    /// Gated cards in detector priority order
    pub cards: Vec<InsightCard>,
    pub debug: ArtifactDebug,
}

/// Diagnostic channel carried alongside the cards, never rendered to the
/// end user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactDebug {
    /// Live entries inside the window that the detectors saw
    pub entry_count: usize,
    /// Per-detector candidate counts, in priority order
    pub detectors: Vec<DetectorRun>,
    /// Candidates removed by the validation gate
    pub dropped: usize,
}

/// Compute the insight artifact for the trailing `window_days` days.
///
/// Deleted entries and entries outside the window never reach the
/// detectors. `now` is the only clock: it fixes the window, every age
/// comparison, and the artifact's `created_at`.
pub fn build(reflections: &[Reflection], window_days: i64, now: DateTime<Utc>) -> Artifact {
    let window = AnalysisWindow::trailing_days(now, window_days);
    let snapshot: Vec<Reflection> = live_in_window(reflections, &window)
        .into_iter()
        .cloned()
        .collect();

    tracing::debug!(
        entries = snapshot.len(),
        window_days,
        "Building insight artifact"
    );

    let ctx = AnalysisContext::new(&snapshot, window, now);
    let engine = InsightEngine::new();
    let (candidates, runs) = engine.analyze_all(&ctx);

    let gate = InsightGate::new(&snapshot);
    let (cards, dropped) = gate.filter(candidates);

    Artifact {
        horizon: format!("{}d", window_days),
        window,
        created_at: now,
        cards,
        debug: ArtifactDebug {
            entry_count: snapshot.len(),
            detectors: runs,
            dropped,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::types::InsightKind;
    use crate::models::test_support::{fixed_now, reflection};

    fn month_of_entries(now: DateTime<Utc>) -> Vec<Reflection> {
        let mut reflections = Vec::new();
        for i in 0..30 {
            reflections.push(reflection(
                &format!("r{}", i),
                now,
                i,
                "work deadline stress budget planning",
            ));
        }
        reflections
    }

    #[test]
    fn test_empty_snapshot_yields_empty_artifact() {
        let now = fixed_now();
        let artifact = build(&[], 90, now);

        assert!(artifact.cards.is_empty());
        assert_eq!(artifact.horizon, "90d");
        assert_eq!(artifact.created_at, now);
        assert_eq!(artifact.debug.entry_count, 0);
        assert_eq!(artifact.debug.dropped, 0);
    }

    #[test]
    fn test_active_snapshot_always_carries_the_summary_card() {
        let now = fixed_now();
        let artifact = build(&month_of_entries(now), 90, now);

        assert!(artifact
            .cards
            .iter()
            .any(|c| c.kind == InsightKind::AlwaysOnSummary));
        // Summary sits last in priority order
        assert_eq!(
            artifact.cards.last().map(|c| c.kind),
            Some(InsightKind::AlwaysOnSummary)
        );
    }

    #[test]
    fn test_window_cuts_the_snapshot_before_detection() {
        let now = fixed_now();
        let mut reflections = month_of_entries(now);
        reflections.push(reflection("ancient", now, 400, "work deadline stress"));

        let artifact = build(&reflections, 90, now);
        assert_eq!(artifact.debug.entry_count, 30);
        for card in &artifact.cards {
            assert!(card.evidence.iter().all(|e| e.entry_id != "ancient"));
        }
    }

    #[test]
    fn test_deleted_entries_never_reach_detectors() {
        let now = fixed_now();
        let mut reflections = month_of_entries(now);
        for r in reflections.iter_mut().take(10) {
            r.deleted_at = Some(now);
        }

        let artifact = build(&reflections, 90, now);
        assert_eq!(artifact.debug.entry_count, 20);
    }

    #[test]
    fn test_every_evidence_id_resolves() {
        let now = fixed_now();
        let reflections = month_of_entries(now);
        let artifact = build(&reflections, 90, now);

        for card in &artifact.cards {
            for ev in &card.evidence {
                assert!(reflections.iter().any(|r| r.id == ev.entry_id));
            }
        }
    }

    #[test]
    fn test_computed_at_echoes_now_everywhere() {
        let now = fixed_now();
        let artifact = build(&month_of_entries(now), 90, now);

        assert!(!artifact.cards.is_empty());
        assert!(artifact.cards.iter().all(|c| c.computed_at == now));
    }

    #[test]
    fn test_idempotent() {
        let now = fixed_now();
        let reflections = month_of_entries(now);

        let a = serde_json::to_string(&build(&reflections, 90, now)).unwrap();
        let b = serde_json::to_string(&build(&reflections, 90, now)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_detector_runs_cover_all_registered_detectors() {
        let now = fixed_now();
        let artifact = build(&month_of_entries(now), 90, now);

        let kinds = InsightEngine::new().detector_kinds();
        assert_eq!(artifact.debug.detectors.len(), kinds.len());
        assert!(artifact.debug.detectors.iter().all(|r| !r.failed));
    }
}
