use std::cmp::Ordering;
use crate::core::assignment::{maximize_matching, solve, CostMatrix};
use crate::core::cancel::CancelFlag;
use crate::core::scoring::{quality_from_cost, CostTable, NO_EDGE_COST};
use crate::error::EngineError;
use crate::models::{CandidatePool, GradeBlend, MatchResult, Pair, MIN_MATCH_QUALITY};

/// Global minimum-cost pairing over the full symmetric cost matrix
#[derive(Debug, Clone)]
pub struct OptimalMatcher {
    quality_weight: f64,
    min_match_quality: f64,
    grade_blend: Option<GradeBlend>,
    cancel: CancelFlag,
}

impl OptimalMatcher {
    pub fn new(quality_weight: f64) -> Self {
        Self {
            quality_weight: quality_weight.clamp(0.0, 1.0),
            min_match_quality: MIN_MATCH_QUALITY,
            grade_blend: None,
            cancel: CancelFlag::default(),
        }
    }

    pub fn with_min_quality(mut self, min_match_quality: f64) -> Self {
        self.min_match_quality = min_match_quality.clamp(0.0, 1.0);
        self
    }

    pub fn with_grade_blend(mut self, grade_blend: Option<GradeBlend>) -> Self {
        self.grade_blend = grade_blend;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Minimum quality an assignment needs to be kept.
    ///
    /// `min_match_quality` up to a quality weight of 0.5, then rising with
    /// the weight: `max(min_match_quality, quality_weight - 0.5)`.
    pub fn quality_floor(&self) -> f64 {
        self.min_match_quality.max(self.quality_weight - 0.5)
    }

    /// Solve the assignment problem over acceptable edges and decode a maximum matching.
    ///
    /// Only edges that clear the quality floor and the grade cap enter the matrix.
    /// The solver's permutation is split into cycles: 2-cycles become pairs, longer
    /// cycles keep their best alternating edge set. The decoded pairs are then
    /// grown along augmenting paths so that no two unpaired participants are left
    /// with an acceptable edge path between them.
    ///
    /// Fewer than two ids in the pool yields an empty result, not an error.
    ///
    /// # Errors
    /// `EngineError::Cancelled` if the cancel flag is raised before or after the solve.
    pub fn pair(&self, pool: &CandidatePool) -> Result<MatchResult, EngineError> {
        let costs = CostTable::from_pool(pool, self.grade_blend.as_ref());
        let ids = costs.ids();
        let n = ids.len();

        if n < 2 {
            tracing::warn!("Assignment infeasible: {} eligible participants", n);
            return Ok(MatchResult::empty(pool.roster()));
        }

        let floor = self.quality_floor();
        let max_gap = self.grade_blend.as_ref().and_then(|gb| gb.max_difference);

        let mut matrix = CostMatrix::filled(n, NO_EDGE_COST);
        let mut adjacency: Vec<Vec<(f64, usize)>> = vec![Vec::new(); n];
        let mut rejected = 0usize;

        for (i, j, cost) in costs.edges() {
            if quality_from_cost(cost) + 1e-12 < floor {
                rejected += 1;
                continue;
            }
            if let (Some(max), Some(gap)) = (max_gap, pool.grade_gap(&ids[i], &ids[j])) {
                if gap > max {
                    rejected += 1;
                    continue;
                }
            }
            matrix.set_symmetric(i, j, cost);
            adjacency[i].push((cost, j));
            adjacency[j].push((cost, i));
        }

        self.cancel.checkpoint("assignment solve start")?;
        let assignment = solve(&matrix);
        self.cancel.checkpoint("assignment solve end")?;

        let mut mate: Vec<Option<usize>> = vec![None; n];
        for (a, b) in decode_cycles(&assignment.row_to_col, &matrix) {
            mate[a] = Some(b);
            mate[b] = Some(a);
        }

        let adjacency: Vec<Vec<usize>> = adjacency
            .into_iter()
            .map(|mut edges| {
                edges.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap_or(Ordering::Equal).then(x.1.cmp(&y.1)));
                edges.into_iter().map(|(_, j)| j).collect()
            })
            .collect();
        let augmented = maximize_matching(&adjacency, &mut mate);
        self.cancel.checkpoint("matching repair end")?;

        let pairs: Vec<Pair> = mate
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.filter(|&j| i < j).map(|j| (i, j)))
            .map(|(i, j)| {
                let (a, b) = (&ids[i], &ids[j]);
                Pair {
                    first: a.clone(),
                    second: b.clone(),
                    quality: quality_from_cost(matrix.get(i, j)),
                    grade_difference: pool.grade_gap(a, b),
                }
            })
            .collect();

        let result = MatchResult::from_pairs(pairs, pool.roster());
        tracing::debug!(
            "Optimal matcher: solved {}x{} (total {:.3}), {} pairs kept, {} augmented, {} edges rejected",
            n,
            n,
            assignment.total_cost,
            result.pair_count(),
            augmented,
            rejected
        );
        Ok(result)
    }
}

/// Split a permutation into disjoint pairs along real edges.
///
/// Each cycle of length k is tried at every starting offset, taking every other
/// edge; the offset with the most real edges wins, then the lowest cost, then
/// the earliest offset. A 2-cycle is its own pair and a fixed point is dropped.
fn decode_cycles(row_to_col: &[usize], matrix: &CostMatrix) -> Vec<(usize, usize)> {
    let n = row_to_col.len();
    let mut visited = vec![false; n];
    let mut pairs = Vec::new();

    for start in 0..n {
        if visited[start] {
            continue;
        }
        let mut cycle = Vec::new();
        let mut v = start;
        while !visited[v] {
            visited[v] = true;
            cycle.push(v);
            v = row_to_col.get(v).copied().unwrap_or(v);
        }

        let k = cycle.len();
        if k < 2 {
            continue;
        }

        let mut best: Option<(usize, f64, Vec<(usize, usize)>)> = None;
        for offset in 0..k {
            let chosen: Vec<(usize, usize)> = (0..k / 2)
                .map(|m| (cycle[(offset + 2 * m) % k], cycle[(offset + 2 * m + 1) % k]))
                .filter(|&(a, b)| matrix.get(a, b) < NO_EDGE_COST)
                .collect();
            let cost: f64 = chosen.iter().map(|&(a, b)| matrix.get(a, b)).sum();
            let better = match &best {
                None => true,
                Some((count, best_cost, _)) => {
                    chosen.len() > *count || (chosen.len() == *count && cost + 1e-12 < *best_cost)
                }
            };
            if better {
                best = Some((chosen.len(), cost, chosen));
            }
        }

        if let Some((_, _, chosen)) = best {
            pairs.extend(chosen);
        }
    }

    pairs
}
