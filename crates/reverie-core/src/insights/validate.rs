//! Insight Validation Gate
//!
//! The single enforcement point for the "fail silently, not loudly"
//! contract: any candidate card missing structural requirements is dropped
//! before rendering, with no diagnostic surfaced to the end user. Rejections
//! are visible only on the debug log.

use std::collections::HashSet;
use std::fmt;

use crate::models::Reflection;

use super::types::InsightCard;

/// Why a candidate card was rejected. Never shown to the end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    EmptyId,
    EmptyTitle,
    EmptyExplanation,
    EmptyEvidenceId,
    /// Evidence points at an entry id absent from the input snapshot
    UnknownEntry(String),
    /// The card's kind tag disagrees with its data payload
    KindMismatch,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::EmptyId => write!(f, "empty card id"),
            RejectReason::EmptyTitle => write!(f, "empty title"),
            RejectReason::EmptyExplanation => write!(f, "empty explanation"),
            RejectReason::EmptyEvidenceId => write!(f, "evidence with empty entry id"),
            RejectReason::UnknownEntry(id) => write!(f, "evidence references unknown entry {}", id),
            RejectReason::KindMismatch => write!(f, "kind tag disagrees with data payload"),
        }
    }
}

/// Structural contract filter over candidate cards.
///
/// Built once per computation from the same snapshot the detectors saw, so
/// evidence pointers can be checked against real entries.
pub struct InsightGate {
    known_ids: HashSet<String>,
}

impl InsightGate {
    pub fn new(reflections: &[Reflection]) -> Self {
        Self {
            known_ids: reflections.iter().map(|r| r.id.clone()).collect(),
        }
    }

    /// Total, side-effect-free structural check.
    pub fn check(&self, card: &InsightCard) -> Result<(), RejectReason> {
        if card.id.trim().is_empty() {
            return Err(RejectReason::EmptyId);
        }
        if card.title.trim().is_empty() {
            return Err(RejectReason::EmptyTitle);
        }
        if card.explanation.trim().is_empty() {
            return Err(RejectReason::EmptyExplanation);
        }
        if card.kind != card.data.kind() {
            return Err(RejectReason::KindMismatch);
        }
        for ev in &card.evidence {
            if ev.entry_id.trim().is_empty() {
                return Err(RejectReason::EmptyEvidenceId);
            }
            if !self.known_ids.contains(&ev.entry_id) {
                return Err(RejectReason::UnknownEntry(ev.entry_id.clone()));
            }
        }
        Ok(())
    }

    /// Boolean form of [`check`](Self::check).
    pub fn validate(&self, card: &InsightCard) -> bool {
        self.check(card).is_ok()
    }

    /// Keep only cards that pass, preserving order. Drops are logged at
    /// debug level and counted; nothing else observes them.
    pub fn filter(&self, cards: Vec<InsightCard>) -> (Vec<InsightCard>, usize) {
        let mut kept = Vec::with_capacity(cards.len());
        let mut dropped = 0;

        for card in cards {
            match self.check(&card) {
                Ok(()) => kept.push(card),
                Err(reason) => {
                    tracing::debug!(
                        card = card.id,
                        kind = card.kind.as_str(),
                        reason = %reason,
                        "Dropping malformed candidate card"
                    );
                    dropped += 1;
                }
            }
        }

        (kept, dropped)
    }
}
