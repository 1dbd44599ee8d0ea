//! Report printers for each insight surface

use anyhow::Result;
use chrono::{DateTime, Utc};
use reverie_core::insights::{artifact, cluster, distribution, streak, timeline, topic_drift};
use reverie_core::insights::{InsightCard, InsightData};
use reverie_core::Reflection;

use super::truncate;

/// Run every detector and print the full artifact.
pub fn cmd_analyze(
    reflections: &[Reflection],
    window_days: i64,
    now: DateTime<Utc>,
    json: bool,
) -> Result<()> {
    let artifact = artifact::build(reflections, window_days, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&artifact)?);
        return Ok(());
    }

    println!();
    println!("🔮 Insight Cards");
    println!(
        "   Window: {} ending {}",
        artifact.horizon,
        artifact.created_at.date_naive()
    );
    println!(
        "   Entries: {}   Cards: {}   Dropped: {}",
        artifact.debug.entry_count,
        artifact.cards.len(),
        artifact.debug.dropped
    );
    println!("   ─────────────────────────────────────────────────────────────");

    if artifact.cards.is_empty() {
        println!("   Nothing to surface yet. Write a few entries and come back.");
        println!();
        return Ok(());
    }

    for card in &artifact.cards {
        print_card(card);
    }
    println!();
    Ok(())
}

fn print_card(card: &InsightCard) {
    println!();
    println!("   [{}] {}", card.kind, card.title);
    println!("   {}", card.explanation);
    for ev in &card.evidence {
        println!(
            "     • {}  {}",
            ev.timestamp.date_naive(),
            truncate(&ev.preview, 48)
        );
    }
}

/// Print rising, stable, and fading topics.
pub fn cmd_topics(reflections: &[Reflection], now: DateTime<Utc>, json: bool) -> Result<()> {
    let buckets = topic_drift::drift_topics(reflections, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&buckets)?);
        return Ok(());
    }

    println!();
    println!("🧭 Topic Drift (last 28 days vs the 28 before)");
    println!("   ─────────────────────────────────────────────────────────────");

    if buckets.is_empty() {
        println!("   No topics matched yet.");
        println!();
        return Ok(());
    }

    for b in &buckets {
        println!(
            "   {:<14} {:<7} {:<7} {} total ({} newer / {} older)",
            b.topic,
            b.trend.to_string(),
            b.strength.to_string(),
            b.count,
            b.newer,
            b.older
        );
        for title in &b.sample_titles {
            println!("     • {}", truncate(title, 48));
        }
    }
    println!();
    Ok(())
}

/// Print clusters of lexically-overlapping entries.
pub fn cmd_clusters(reflections: &[Reflection], now: DateTime<Utc>, json: bool) -> Result<()> {
    let cards = cluster::cluster(reflections, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    println!();
    println!("🕸️  Link Clusters");
    println!("   ─────────────────────────────────────────────────────────────");

    if cards.is_empty() {
        println!("   No overlapping entries found.");
        println!();
        return Ok(());
    }

    for card in &cards {
        print_card(card);
    }
    println!();
    Ok(())
}

/// Print the peak writing hour and day streaks.
pub fn cmd_streaks(reflections: &[Reflection], now: DateTime<Utc>, json: bool) -> Result<()> {
    let cards = streak::coach(reflections, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&cards)?);
        return Ok(());
    }

    println!();
    println!("🔥 Streaks");
    println!("   ─────────────────────────────────────────────────────────────");

    match cards.first() {
        None => println!("   Not enough entries to coach yet."),
        Some(card) => {
            if let InsightData::StreakCoach { streaks } = &card.data {
                println!(
                    "   Peak hour: {:02}:00 ({} entries)",
                    streaks.best_hour, streaks.best_hour_count
                );
                println!("   Current streak: {} days", streaks.current_streak);
                println!("   Longest streak: {} days", streaks.longest_streak);
            }
            println!("   {}", card.explanation);
        }
    }
    println!();
    Ok(())
}

/// Print timeline events, newest first.
pub fn cmd_timeline(reflections: &[Reflection], now: DateTime<Utc>, json: bool) -> Result<()> {
    let events = timeline::detect_events(reflections, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    println!();
    println!("📅 Timeline");
    println!("   ─────────────────────────────────────────────────────────────");

    if events.is_empty() {
        println!("   Not enough history for timeline events.");
        println!();
        return Ok(());
    }

    for e in &events {
        println!();
        println!("   {} [{}]", e.date.date_naive(), e.event_type);
        println!("   {}", e.claim);
        println!("   Contrast: {}", e.contrast);
        println!("   Support: {}", e.confidence);
    }
    println!();
    Ok(())
}

/// Print the statistical shape of the writing cadence.
pub fn cmd_distribution(
    reflections: &[Reflection],
    window_days: i64,
    now: DateTime<Utc>,
    json: bool,
) -> Result<()> {
    let result = distribution::classify(reflections, window_days, now);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!("📊 Writing Distribution (last {} days)", window_days);
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Shape: {}", result.classification);
    println!(
        "   Entries: {}   Active days: {}   Typical day: {} entr{}",
        result.total_entries(),
        result.active_days(),
        result.mode_count,
        if result.mode_count == 1 { "y" } else { "ies" }
    );
    println!(
        "   Skewness: {:.2}   Spike ratio: {:.2}   Top-day share: {:.0}%",
        result.skewness,
        result.spike_ratio,
        result.concentration * 100.0
    );

    if !result.top_days.is_empty() {
        println!("   Busiest days:");
        for d in &result.top_days {
            println!("     • {}  {} entries", d.date, d.count);
        }
    }
    println!();
    Ok(())
}
