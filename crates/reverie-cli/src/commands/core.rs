//! Shared command utilities: snapshot loading and time resolution

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reverie_core::Reflection;

/// Load a reflection snapshot from a JSON file (an array of entries).
pub fn load_reflections(path: &Path) -> Result<Vec<Reflection>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
    let reflections: Vec<Reflection> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid snapshot JSON in {}", path.display()))?;

    tracing::debug!(
        entries = reflections.len(),
        file = %path.display(),
        "Loaded reflection snapshot"
    );
    Ok(reflections)
}

/// Resolve the computation time: an explicit --now wins, else the wall clock.
///
/// This is the only place the wall clock is read; everything downstream is a
/// pure function of the snapshot and this value.
pub fn resolve_now(now: Option<&str>) -> Result<DateTime<Utc>> {
    match now {
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("Invalid --now value (use RFC 3339): {}", raw))?;
            Ok(parsed.with_timezone(&Utc))
        }
        None => Ok(Utc::now()),
    }
}
