//! Distribution Classifier
//!
//! Buckets reflections by calendar day over a trailing window and classifies
//! the shape of the per-day volume: steady habit (normal), heavy-day lean
//! (log-normal), a few dominant spikes (power-law), or none of the above
//! (mixed). Never fails; degenerate input yields a degenerate result.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Result;
use crate::models::{AnalysisWindow, Reflection};

use super::engine::{AnalysisContext, Detector};
use super::types::{InsightCard, InsightData, InsightEvidence, InsightKind};

/// Concentration at or above this classifies as power-law
pub const POWER_LAW_CONCENTRATION: f64 = 0.6;
/// Skewness at or above this classifies as power-law
pub const POWER_LAW_SKEW: f64 = 2.0;
/// Skewness at or above this classifies as log-normal
pub const LOG_NORMAL_SKEW: f64 = 0.8;
/// Concentration at or above this classifies as log-normal
pub const LOG_NORMAL_CONCENTRATION: f64 = 0.4;
/// |skewness| at or below this is compatible with normal
pub const NORMAL_SKEW_MAX: f64 = 0.4;
/// Concentration at or below this is compatible with normal
pub const NORMAL_CONCENTRATION_MAX: f64 = 0.3;
/// Share of active days counted as the "top" slice
const TOP_DAY_SHARE: f64 = 0.10;
/// How many busiest days the result reports
const TOP_DAYS_LIMIT: usize = 5;

/// Shape classification of the per-day writing distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionShape {
    Normal,
    LogNormal,
    PowerLaw,
    Mixed,
}

impl DistributionShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionShape::Normal => "normal",
            DistributionShape::LogNormal => "log_normal",
            DistributionShape::PowerLaw => "power_law",
            DistributionShape::Mixed => "mixed",
        }
    }
}

impl fmt::Display for DistributionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DistributionShape {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "normal" => Ok(DistributionShape::Normal),
            "log_normal" => Ok(DistributionShape::LogNormal),
            "power_law" => Ok(DistributionShape::PowerLaw),
            "mixed" => Ok(DistributionShape::Mixed),
            _ => Err(format!("Unknown distribution shape: {}", s)),
        }
    }
}

/// Entry count for one active calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: usize,
}

/// Daily counts over a trailing window plus derived statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionResult {
    pub window_days: i64,
    /// Active (nonzero) days only, ascending by date
    pub daily_counts: Vec<DayCount>,
    pub classification: DistributionShape,
    /// Population skewness (third standardized moment) of active-day counts
    pub skewness: f64,
    /// Population variance of active-day counts
    pub variance: f64,
    /// Max day count divided by the median nonzero day count
    pub spike_ratio: f64,
    /// Share of total volume held by the top 10% of active days
    pub concentration: f64,
    /// Most common nonzero day count
    pub mode_count: usize,
    /// Busiest days, count descending
    pub top_days: Vec<DayCount>,
}

impl DistributionResult {
    fn empty(window_days: i64) -> Self {
        Self {
            window_days,
            daily_counts: Vec::new(),
            classification: DistributionShape::Mixed,
            skewness: 0.0,
            variance: 0.0,
            spike_ratio: 0.0,
            concentration: 0.0,
            mode_count: 0,
            top_days: Vec::new(),
        }
    }

    pub fn total_entries(&self) -> usize {
        self.daily_counts.iter().map(|d| d.count).sum()
    }

    pub fn active_days(&self) -> usize {
        self.daily_counts.len()
    }
}

/// Classify the per-day writing distribution over the `window_days` trailing
/// days before `now`.
///
/// Deleted reflections and reflections outside the window are ignored. Zero
/// active days yields empty counts and a `mixed` classification; no code
/// path divides by zero.
pub fn classify(reflections: &[Reflection], window_days: i64, now: DateTime<Utc>) -> DistributionResult {
    let window = AnalysisWindow::trailing_days(now, window_days);

    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for r in reflections {
        if r.is_deleted() || !window.contains(r.created_at) {
            continue;
        }
        *per_day.entry(r.created_at.date_naive()).or_insert(0) += 1;
    }

    if per_day.is_empty() {
        return DistributionResult::empty(window_days);
    }

    let daily_counts: Vec<DayCount> = per_day
        .iter()
        .map(|(&date, &count)| DayCount { date, count })
        .collect();
    let counts: Vec<f64> = daily_counts.iter().map(|d| d.count as f64).collect();
    let total: f64 = counts.iter().sum();
    let n = counts.len() as f64;

    let mean = total / n;
    let variance = counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;
    let skewness = if variance > 0.0 {
        let m3 = counts.iter().map(|c| (c - mean).powi(3)).sum::<f64>() / n;
        m3 / variance.powf(1.5)
    } else {
        0.0
    };

    let max_count = counts.iter().cloned().fold(0.0_f64, f64::max);
    let med = median(&counts);
    let spike_ratio = if med > 0.0 { max_count / med } else { 0.0 };

    // Share of total volume held by the busiest ~10% of active days
    let mut sorted_desc = counts.clone();
    sorted_desc.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
    let top_n = ((n * TOP_DAY_SHARE).ceil() as usize).max(1);
    let concentration = sorted_desc.iter().take(top_n).sum::<f64>() / total;

    let mode_count = mode(&daily_counts);

    let mut top_days = daily_counts.clone();
    top_days.sort_by(|a, b| b.count.cmp(&a.count).then(a.date.cmp(&b.date)));
    top_days.truncate(TOP_DAYS_LIMIT);

    // Ordered policy, first match wins
    let classification = if concentration >= POWER_LAW_CONCENTRATION || skewness >= POWER_LAW_SKEW {
        DistributionShape::PowerLaw
    } else if skewness >= LOG_NORMAL_SKEW || concentration >= LOG_NORMAL_CONCENTRATION {
        DistributionShape::LogNormal
    } else if skewness.abs() <= NORMAL_SKEW_MAX && concentration <= NORMAL_CONCENTRATION_MAX {
        DistributionShape::Normal
    } else {
        DistributionShape::Mixed
    };

    DistributionResult {
        window_days,
        daily_counts,
        classification,
        skewness,
        variance,
        spike_ratio,
        concentration,
        mode_count,
        top_days,
    }
}

/// Most common nonzero day count; ties resolve to the smaller count
fn mode(daily_counts: &[DayCount]) -> usize {
    let mut freq: BTreeMap<usize, usize> = BTreeMap::new();
    for d in daily_counts {
        *freq.entry(d.count).or_insert(0) += 1;
    }
    freq.into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(count, _)| count)
        .unwrap_or(0)
}

/// Calculate median of a slice
fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Detector adapter that surfaces the classification as a card
pub struct DistributionInsight {
    /// Minimum active days before the shape is worth a card (default 5)
    min_active_days: usize,
}

impl DistributionInsight {
    pub fn new() -> Self {
        Self { min_active_days: 5 }
    }
}

impl Default for DistributionInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for DistributionInsight {
    fn id(&self) -> InsightKind {
        InsightKind::Distribution
    }

    fn name(&self) -> &'static str {
        "Distribution Classifier"
    }

    fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightCard>> {
        let result = classify(ctx.reflections, ctx.window.span_days(), ctx.now);
        if result.active_days() < self.min_active_days {
            return Ok(vec![]);
        }

        let title = match result.classification {
            DistributionShape::Normal => "A steady writing rhythm",
            DistributionShape::LogNormal => "Heavy days carry your writing",
            DistributionShape::PowerLaw => "A few big days dominate",
            DistributionShape::Mixed => "No single writing rhythm",
        };

        let explanation = format!(
            "{} entries across {} active days in the last {} days. Your busiest day holds {} entries ({:.1}x your typical day), and your top days account for {:.0}% of everything you wrote.",
            result.total_entries(),
            result.active_days(),
            result.window_days,
            result.top_days.first().map(|d| d.count).unwrap_or(0),
            result.spike_ratio,
            result.concentration * 100.0
        );

        // Evidence points at the peak day's entries
        let evidence = result
            .top_days
            .first()
            .map(|peak| {
                let mut on_peak: Vec<&Reflection> = ctx
                    .reflections
                    .iter()
                    .filter(|r| !r.is_deleted() && r.created_at.date_naive() == peak.date)
                    .collect();
                on_peak.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
                on_peak
                    .into_iter()
                    .take(3)
                    .map(InsightEvidence::from_reflection)
                    .collect()
            })
            .unwrap_or_default();

        let card = InsightCard::new(
            format!("distribution:{}", result.classification),
            title,
            explanation,
            ctx.now,
            InsightData::Distribution { result },
        )
        .with_evidence(evidence);

        Ok(vec![card])
    }
}
