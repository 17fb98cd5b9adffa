use std::collections::HashMap;
use crate::models::{CandidatePool, GradeBlend, GradePenaltyTable};

/// Cost for a missing edge. Finite so solver arithmetic stays exact.
pub const NO_EDGE_COST: f64 = 1.0e6;

/// Grade-gap penalty under the default step table
///
/// 0 for equal grades, non-decreasing, saturating at 1.0 for a gap of 3 or more.
#[inline]
pub fn grade_penalty(gap: u32) -> f64 {
    GradePenaltyTable::default().penalty(gap)
}

/// Blend a rank cost with a grade cost:
/// `combined = (1 - weight) * base_cost + weight * grade_cost`
#[inline]
pub fn blend(base_cost: f64, grade_cost: f64, weight: f64) -> f64 {
    (1.0 - weight) * base_cost + weight * grade_cost
}

/// Cost of the candidate at `rank` in a list of `len`: earlier is cheaper
#[inline]
pub fn rank_cost(rank: usize, len: usize) -> f64 {
    if len == 0 {
        return NO_EDGE_COST;
    }
    rank as f64 / len as f64
}

#[inline]
pub fn quality_from_cost(cost: f64) -> f64 {
    (1.0 - cost).clamp(0.0, 1.0)
}

/// Symmetric per-pair costs derived from filtered candidate lists.
///
/// An edge listed by either side is usable; when both sides list it the
/// cheaper of the two costs wins.
#[derive(Debug, Clone, Default)]
pub struct CostTable {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    costs: HashMap<(usize, usize), f64>,
}

impl CostTable {
    /// Build the table, blending grade penalties in when `blend` is set.
    /// Pairs with a missing grade keep their rank cost.
    pub fn from_pool(pool: &CandidatePool, grade_blend: Option<&GradeBlend>) -> Self {
        let ids: Vec<String> = pool.universe().into_iter().map(str::to_string).collect();
        let index: HashMap<String, usize> =
            ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();

        let mut costs: HashMap<(usize, usize), f64> = HashMap::new();
        for list in pool.lists() {
            let a = index[list.owner.as_str()];
            for (rank, candidate) in list.ids().enumerate() {
                let b = index[candidate];
                if a == b {
                    continue;
                }
                let base = rank_cost(rank, list.len());
                let cost = match (grade_blend, pool.grade_gap(&list.owner, candidate)) {
                    (Some(gb), Some(gap)) => blend(base, gb.penalty.penalty(gap), gb.weight),
                    _ => base,
                };
                costs
                    .entry(key(a, b))
                    .and_modify(|c| *c = c.min(cost))
                    .or_insert(cost);
            }
        }

        Self { ids, index, costs }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn edge_count(&self) -> usize {
        self.costs.len()
    }

    pub fn cost(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        self.cost_at(i, j)
    }

    pub fn cost_at(&self, i: usize, j: usize) -> Option<f64> {
        self.costs.get(&key(i, j)).copied()
    }

    pub fn quality(&self, a: &str, b: &str) -> Option<f64> {
        self.cost(a, b).map(quality_from_cost)
    }

    /// All edges as `(i, j, cost)` with `i < j`
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.costs.iter().map(|(&(i, j), &c)| (i, j, c))
    }
}

#[inline]
fn key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}
