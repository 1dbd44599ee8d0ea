//! Reverie Core Library
//!
//! Shared functionality for the Reverie reflection insight engine:
//! - Domain models for reflections and analysis windows
//! - Text utilities (tokenization, stopwords, Jaccard similarity)
//! - Pure insight detectors (timeline, distribution, clusters, drift,
//!   contrast, streaks, summary)
//! - The validation gate and artifact builder
//!
//! Every computation is a deterministic function of the reflection snapshot
//! plus an explicit `now`; nothing here touches the wall clock, the
//! filesystem, or the network.

pub mod error;
pub mod insights;
pub mod models;
pub mod text;

pub use error::{Error, Result};
pub use insights::{Artifact, InsightCard, InsightKind};
pub use models::{AnalysisWindow, Reflection};
