//! Link Cluster Engine
//!
//! Groups reflections by lexical overlap. Token sets are compared pairwise
//! with Jaccard similarity; pairs at or above the edge threshold form a
//! similarity graph, and connected components become unranked clusters.
//!
//! The graph is an adjacency list keyed by index into the live-reflection
//! arena, so traversal holds no object references and nothing can cycle.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Reflection;
use crate::text::{preview, token_set};

use super::engine::{AnalysisContext, Detector};
use super::types::{InsightCard, InsightData, InsightEvidence, InsightKind};
use super::validate::InsightGate;

/// Pairwise Jaccard similarity at or above this creates an edge
pub const JACCARD_EDGE_THRESHOLD: f64 = 0.25;
/// Reflections with fewer surviving tokens are not clusterable
pub const MIN_MEMBER_TOKENS: usize = 3;
/// Components smaller than this are discarded
pub const MIN_CLUSTER_SIZE: usize = 2;
/// Maximum clusters returned
pub const MAX_CLUSTERS: usize = 5;
/// Maximum shared tokens reported per cluster
const MAX_TOP_TOKENS: usize = 5;
/// Maximum member snippets woven into the summary
const MAX_SUMMARY_SNIPPETS: usize = 3;
/// Maximum evidence entries per cluster card
const MAX_EVIDENCE: usize = 6;

/// Cluster payload preserved on the card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkClusterData {
    /// Ids of every member reflection
    pub member_ids: Vec<String>,
    pub size: usize,
    /// Tokens present in at least two members, by frequency
    pub top_tokens: Vec<String>,
}

/// One node of the similarity graph
struct Node<'a> {
    reflection: &'a Reflection,
    tokens: HashSet<String>,
}

/// Group reflections into lexical-overlap clusters, largest first.
///
/// Deleted reflections are excluded and at least two clusterable
/// reflections are required, else nothing is returned. Every produced card
/// has already passed the validation gate.
pub fn cluster(reflections: &[Reflection], now: DateTime<Utc>) -> Vec<InsightCard> {
    let live: Vec<&Reflection> = reflections.iter().filter(|r| !r.is_deleted()).collect();
    if live.len() < MIN_CLUSTER_SIZE {
        return vec![];
    }

    // Arena of clusterable nodes; everything below works on indices into it
    let nodes: Vec<Node> = live
        .iter()
        .map(|r| Node {
            reflection: r,
            tokens: token_set(&r.text),
        })
        .filter(|n| n.tokens.len() >= MIN_MEMBER_TOKENS)
        .collect();
    if nodes.len() < MIN_CLUSTER_SIZE {
        return vec![];
    }

    let adjacency = build_adjacency(&nodes);
    let components = connected_components(&adjacency);

    let mut clusters: Vec<Vec<usize>> = components
        .into_iter()
        .filter(|c| c.len() >= MIN_CLUSTER_SIZE)
        .collect();
    clusters.sort_by(|a, b| b.len().cmp(&a.len()));
    clusters.truncate(MAX_CLUSTERS);

    let gate = InsightGate::new(reflections);
    let mut cards = Vec::with_capacity(clusters.len());
    for (i, member_indices) in clusters.iter().enumerate() {
        let card = build_cluster_card(i, member_indices, &nodes, now);
        if gate.validate(&card) {
            cards.push(card);
        }
    }
    cards
}

/// Edges at or above the Jaccard threshold, as an index-keyed adjacency list
fn build_adjacency(nodes: &[Node]) -> Vec<Vec<usize>> {
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            if crate::text::jaccard(&nodes[i].tokens, &nodes[j].tokens) >= JACCARD_EDGE_THRESHOLD {
                adjacency[i].push(j);
                adjacency[j].push(i);
            }
        }
    }
    adjacency
}

/// Greedy-by-degree component collection: start BFS from unvisited nodes in
/// descending edge-count order
fn connected_components(adjacency: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..adjacency.len()).collect();
    order.sort_by(|&a, &b| adjacency[b].len().cmp(&adjacency[a].len()).then(a.cmp(&b)));

    let mut visited = vec![false; adjacency.len()];
    let mut components = Vec::new();

    for &start in &order {
        if visited[start] || adjacency[start].is_empty() {
            continue;
        }

        let mut component = Vec::new();
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        while let Some(node) = queue.pop_front() {
            component.push(node);
            for &next in &adjacency[node] {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
        components.push(component);
    }

    components
}

fn build_cluster_card(
    index: usize,
    member_indices: &[usize],
    nodes: &[Node],
    now: DateTime<Utc>,
) -> InsightCard {
    let mut members: Vec<&Reflection> = member_indices.iter().map(|&i| nodes[i].reflection).collect();
    members.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

    // Tokens shared by at least two members, most widespread first
    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for &i in member_indices {
        for token in &nodes[i].tokens {
            *doc_freq.entry(token.as_str()).or_insert(0) += 1;
        }
    }
    let mut shared: Vec<(&str, usize)> = doc_freq.into_iter().filter(|&(_, f)| f >= 2).collect();
    shared.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    let top_tokens: Vec<String> = shared
        .iter()
        .take(MAX_TOP_TOKENS)
        .map(|(t, _)| t.to_string())
        .collect();

    let title = if top_tokens.is_empty() {
        "A knot of related entries".to_string()
    } else {
        format!(
            "Entries that keep returning to {}",
            top_tokens
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        )
    };

    let snippets: Vec<String> = members
        .iter()
        .take(MAX_SUMMARY_SNIPPETS)
        .map(|r| format!("\u{201c}{}\u{201d}", preview(&r.text)))
        .collect();
    let explanation = format!(
        "{} entries share overlapping language. Includes {}.",
        members.len(),
        snippets.join(", ")
    );

    let evidence: Vec<InsightEvidence> = members
        .iter()
        .take(MAX_EVIDENCE)
        .map(|r| InsightEvidence::from_reflection(r))
        .collect();

    let data = InsightData::LinkCluster {
        cluster: LinkClusterData {
            member_ids: members.iter().map(|r| r.id.clone()).collect(),
            size: members.len(),
            top_tokens,
        },
    };

    InsightCard::new(format!("cluster:{}", index), title, explanation, now, data)
        .with_evidence(evidence)
}

/// Detector adapter over [`cluster`]
pub struct LinkClusterInsight;

impl LinkClusterInsight {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinkClusterInsight {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for LinkClusterInsight {
    fn id(&self) -> InsightKind {
        InsightKind::LinkCluster
    }

    fn name(&self) -> &'static str {
        "Link Clusters"
    }

    fn detect(&self, ctx: &AnalysisContext<'_>) -> Result<Vec<InsightCard>> {
        Ok(cluster(ctx.reflections, ctx.now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{fixed_now, reflection};

    #[test]
    fn test_two_overlapping_entries_form_one_cluster() {
        let now = fixed_now();
        // Token sets {budget, stress, work} and {budget, work, deadline}:
        // Jaccard 2/4 = 0.5, above the 0.25 edge threshold
        let reflections = vec![
            reflection("a", now, 1, "budget stress work"),
            reflection("b", now, 2, "budget work deadline"),
        ];

        let cards = cluster(&reflections, now);
        assert_eq!(cards.len(), 1);
        let InsightData::LinkCluster { cluster: data } = &cards[0].data else {
            panic!("expected link cluster payload");
        };
        assert_eq!(data.size, 2);
        assert!(data.top_tokens.contains(&"budget".to_string()));
        assert!(data.top_tokens.contains(&"work".to_string()));
    }

    #[test]
    fn test_disjoint_entries_produce_nothing() {
        let now = fixed_now();
        let reflections = vec![
            reflection("a", now, 1, "garden tomato seedling sunlight"),
            reflection("b", now, 2, "quarterly report spreadsheet revenue"),
        ];
        assert!(cluster(&reflections, now).is_empty());
    }

    #[test]
    fn test_short_entries_are_not_clusterable() {
        let now = fixed_now();
        // Fewer than three surviving tokens each
        let reflections = vec![
            reflection("a", now, 1, "budget work"),
            reflection("b", now, 2, "budget work"),
        ];
        assert!(cluster(&reflections, now).is_empty());
    }

    #[test]
    fn test_deleted_members_excluded() {
        let now = fixed_now();
        let mut gone = reflection("gone", now, 1, "budget stress work deadline");
        gone.deleted_at = Some(now);
        let reflections = vec![gone, reflection("b", now, 2, "budget work deadline stress")];
        assert!(cluster(&reflections, now).is_empty());
    }

    #[test]
    fn test_clusters_sorted_by_size_and_capped_evidence() {
        let now = fixed_now();
        let mut reflections = Vec::new();
        // Big cluster: eight entries around the same vocabulary
        for i in 0..8 {
            reflections.push(reflection(
                &format!("big{}", i),
                now,
                i as i64,
                "marathon training schedule tired legs",
            ));
        }
        // Small cluster: two entries
        reflections.push(reflection("s1", now, 10, "sourdough starter flour hydration"));
        reflections.push(reflection("s2", now, 11, "sourdough flour hydration levain"));

        let cards = cluster(&reflections, now);
        assert_eq!(cards.len(), 2);
        let InsightData::LinkCluster { cluster: first } = &cards[0].data else {
            panic!("expected link cluster payload");
        };
        assert_eq!(first.size, 8);
        assert!(cards[0].evidence.len() <= MAX_EVIDENCE);
        // Evidence newest first
        assert!(cards[0]
            .evidence
            .windows(2)
            .all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[test]
    fn test_at_most_five_clusters() {
        let now = fixed_now();
        let vocabularies = [
            "garden tomato seedling compost",
            "marathon training tired legs",
            "sourdough flour hydration starter",
            "guitar chord practice scales",
            "chess opening endgame tactics",
            "aquarium filter plants shrimp",
        ];
        let mut reflections = Vec::new();
        for (c, vocab) in vocabularies.iter().enumerate() {
            for i in 0..2 {
                reflections.push(reflection(&format!("c{}_{}", c, i), now, (c * 2 + i) as i64, vocab));
            }
        }

        let cards = cluster(&reflections, now);
        assert_eq!(cards.len(), MAX_CLUSTERS);
    }

    #[test]
    fn test_idempotent() {
        let now = fixed_now();
        let reflections: Vec<_> = (0..12)
            .map(|i| {
                reflection(
                    &format!("r{}", i),
                    now,
                    i,
                    if i % 2 == 0 {
                        "budget stress work deadline"
                    } else {
                        "garden tomato seedling compost"
                    },
                )
            })
            .collect();

        let a = serde_json::to_string(&cluster(&reflections, now)).unwrap();
        let b = serde_json::to_string(&cluster(&reflections, now)).unwrap();
        assert_eq!(a, b);
    }
}
