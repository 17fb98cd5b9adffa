use std::collections::{HashSet, VecDeque};
use crate::core::scoring::CostTable;
use crate::models::{CandidateList, CandidatePool, MatchResult, Pair};

/// Quality weight at or above which the repair pass is skipped
pub const SECOND_PASS_CUTOFF: f64 = 0.8;

/// Phase 1 output: pairs so far plus still-unpaired list owners
#[derive(Debug, Clone, Default)]
struct PartialMatching {
    pairs: Vec<Pair>,
    unpaired: Vec<String>,
}

/// Nearest-neighbour pairing in two passes.
///
/// # Passes
/// 1. Walk participants ordered by candidate count and give each its best
///    unused, mutually listed candidate
/// 2. If `quality_weight < 0.8`, retry the leftovers against each other over
///    edges listed by either side
#[derive(Debug, Clone)]
pub struct GreedyMatcher {
    quality_weight: f64,
    grade_gate: Option<u32>,
}

impl GreedyMatcher {
    pub fn new(quality_weight: f64) -> Self {
        Self {
            quality_weight: quality_weight.clamp(0.0, 1.0),
            grade_gate: None,
        }
    }

    /// Skip candidates whose known grade gap exceeds `max_difference`
    pub fn with_grade_gate(mut self, max_difference: Option<u32>) -> Self {
        self.grade_gate = max_difference;
        self
    }

    pub fn quality_weight(&self) -> f64 {
        self.quality_weight
    }

    /// Produce a pairing from filtered candidate lists
    pub fn pair(&self, pool: &CandidatePool) -> MatchResult {
        let costs = CostTable::from_pool(pool, None);

        let first = self.first_pass(pool, &costs);
        let pairs = if !first.unpaired.is_empty() && self.quality_weight < SECOND_PASS_CUTOFF {
            self.second_pass(pool, &costs, first)
        } else {
            first.pairs
        };

        let (pairs, dropped) = enforce_disjoint(pairs);
        if dropped > 0 {
            tracing::warn!("Greedy matcher dropped {} overlapping pairs", dropped);
        }

        let result = MatchResult::from_pairs(pairs, pool.roster());
        tracing::debug!(
            "Greedy matcher (quality weight {:.2}): {} pairs, {} unpaired",
            self.quality_weight,
            result.pair_count(),
            result.unpaired.len()
        );
        result
    }

    /// Most constrained first when favouring quality, most flexible first otherwise
    fn ordered<'a>(&self, pool: &'a CandidatePool) -> Vec<&'a CandidateList> {
        let mut order: Vec<&CandidateList> = pool.lists().iter().collect();
        if self.quality_weight >= 0.5 {
            order.sort_by_key(|l| l.len());
        } else {
            order.sort_by_key(|l| std::cmp::Reverse(l.len()));
        }
        order
    }

    fn gate_allows(&self, pool: &CandidatePool, a: &str, b: &str) -> bool {
        match (self.grade_gate, pool.grade_gap(a, b)) {
            (Some(max), Some(gap)) => gap <= max,
            _ => true,
        }
    }

    fn usable(&self, pool: &CandidatePool, owner: &str, candidate: &str) -> bool {
        owner != candidate
            && pool.is_listed_by(candidate, owner)
            && self.gate_allows(pool, owner, candidate)
    }

    fn make_pair(&self, pool: &CandidatePool, costs: &CostTable, a: &str, b: &str) -> Pair {
        Pair {
            first: a.to_string(),
            second: b.to_string(),
            quality: costs.quality(a, b).unwrap_or(0.0),
            grade_difference: pool.grade_gap(a, b),
        }
    }

    fn first_pass(&self, pool: &CandidatePool, costs: &CostTable) -> PartialMatching {
        let qw = self.quality_weight;
        let mut used: HashSet<&str> = HashSet::new();
        let mut pairs = Vec::new();

        for list in self.ordered(pool) {
            let owner = list.owner.as_str();
            if used.contains(owner) {
                continue;
            }

            let mut best: Option<(&str, f64)> = None;
            for candidate in list.ids() {
                if used.contains(candidate) || !self.usable(pool, owner, candidate) {
                    continue;
                }
                let score = costs.quality(owner, candidate).unwrap_or(0.0);
                let options = pool.list(candidate).map(|l| l.len()).unwrap_or(1).max(1);
                let adjusted = score * qw + (1.0 - qw) / options as f64;

                if best.map(|(_, s)| adjusted > s).unwrap_or(true) {
                    best = Some((candidate, adjusted));
                }
            }

            if let Some((partner, _)) = best {
                pairs.push(self.make_pair(pool, costs, owner, partner));
                used.insert(owner);
                used.insert(partner);
            }
        }

        let unpaired = pool
            .roster()
            .iter()
            .filter(|id| pool.list(id).is_some() && !used.contains(id.as_str()))
            .cloned()
            .collect();

        PartialMatching { pairs, unpaired }
    }

    /// Consumes only the phase 1 leftovers; earlier pairs are carried over as-is.
    ///
    /// A leftover takes the first remaining leftover it shares an edge with. An
    /// edge listed by either side counts, since mutually listed leftovers were
    /// already ruled out by phase 1.
    fn second_pass(&self, pool: &CandidatePool, costs: &CostTable, partial: PartialMatching) -> Vec<Pair> {
        let PartialMatching { mut pairs, unpaired } = partial;
        let mut pending: VecDeque<String> = unpaired.into_iter().collect();
        let mut stranded = 0usize;

        while let Some(current) = pending.pop_front() {
            let partner = pending
                .iter()
                .find(|c| costs.cost(&current, c).is_some() && self.gate_allows(pool, &current, c))
                .cloned();

            match partner {
                Some(partner) => {
                    pending.retain(|p| *p != partner);
                    pairs.push(self.make_pair(pool, costs, &current, &partner));
                }
                None => stranded += 1,
            }
        }

        tracing::trace!("Greedy second pass left {} participants unpaired", stranded);
        pairs
    }
}

/// Keep the first pair claiming each id; returns the kept pairs and how many were dropped
pub(crate) fn enforce_disjoint(pairs: Vec<Pair>) -> (Vec<Pair>, usize) {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(pairs.len());
    let mut dropped = 0;

    for pair in pairs {
        if pair.first != pair.second
            && !seen.contains(&pair.first)
            && !seen.contains(&pair.second)
        {
            seen.insert(pair.first.clone());
            seen.insert(pair.second.clone());
            kept.push(pair);
        } else {
            dropped += 1;
        }
    }

    (kept, dropped)
}
