//! Always-On Summary
//!
//! The one card guaranteed whenever any live entry exists, so the artifact
//! is never empty for an active user. Pure bookkeeping over the snapshot.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::models::{live, Reflection};

use super::engine::{AnalysisContext, Detector};
use super::types::{InsightCard, InsightData, InsightEvidence, InsightKind, SummaryData};

/// Summarize the whole snapshot into zero or one card.
pub fn summarize(reflections: &[Reflection], now: DateTime<Utc>) -> Vec<InsightCard> {
    let entries = live(reflections);
    if entries.is_empty() {
        return vec![];
    }

    let first_at = entries.iter().map(|r| r.created_at).min().unwrap_or(now);
    let last_at = entries.iter().map(|r| r.created_at).max().unwrap_or(now);
    let days: BTreeSet<NaiveDate> = entries.iter().map(|r| r.created_at.date_naive()).collect();

    let summary = SummaryData {
        total_entries: entries.len(),
        active_days: days.len(),
        first_at,
        last_at,
    };

    let explanation = format!(
        "{} entries across {} active day{}, from {} to {}.",
        summary.total_entries,
        summary.active_days,
        if summary.active_days == 1 { "" } else { "s" },
        first_at.date_naive(),
        last_at.date_naive()
    );

    // Evidence: the newest entry, ties broken by id
    let newest = entries
        .iter()
        .max_by(|a, b| a.created_at.cmp(&b.created_at).then(b.id.cmp(&a.id)));
    let evidence: Vec<InsightEvidence> = newest
        .into_iter()
        .map(|r| InsightEvidence::from_reflection(r))
        .collect();

    vec![InsightCard::new(
        "summary",
        "Your reflections at a glance",
        explanation,
        now,
        InsightData::AlwaysOnSummary { summary },
    )
    .with_evidence(evidence)]
}

/// Detector adapter over [`summarize`]
pub struct AlwaysOnSummaryInsight;

impl AlwaysOnSummaryInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AlwaysOnSummaryInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for AlwaysOnSummaryInsight {
    fn id(&self) -> InsightKind {
        InsightKind::AlwaysOnSummary
    }

    fn name(&self) -> &'static str {
        "Always-On Summary"
    }

    fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightCard>> {
        Ok(summarize(ctx.reflections, ctx.now))
    }
}
