//! Minimum-cost assignment solver and matching repair.
//!
//! `solve` is the shortest augmenting path Hungarian method with row/column
//! potentials, O(n³) on a dense square matrix. On a symmetric matrix its
//! permutation is a cycle cover rather than a matching, so `maximize_matching`
//! (Edmonds' blossom algorithm) grows a decoded partial matching to maximum
//! cardinality on a general graph.

/// Dense square cost matrix
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    size: usize,
    cells: Vec<f64>,
}

impl CostMatrix {
    /// A `size` x `size` matrix with every cell set to `fill`
    pub fn filled(size: usize, fill: f64) -> Self {
        Self {
            size,
            cells: vec![fill; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.cells[row * self.size + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, cost: f64) {
        self.cells[row * self.size + col] = cost;
    }

    /// Set both `(a, b)` and `(b, a)`
    #[inline]
    pub fn set_symmetric(&mut self, a: usize, b: usize, cost: f64) {
        self.set(a, b, cost);
        self.set(b, a, cost);
    }
}

/// Solver output: the column chosen for every row
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub row_to_col: Vec<usize>,
    pub total_cost: f64,
}

/// Find a permutation minimizing the summed cost of `matrix`
pub fn solve(matrix: &CostMatrix) -> Assignment {
    let n = matrix.size();
    if n == 0 {
        return Assignment {
            row_to_col: Vec::new(),
            total_cost: 0.0,
        };
    }

    // 1-based with a virtual column 0
    let mut u = vec![0.0_f64; n + 1];
    let mut v = vec![0.0_f64; n + 1];
    let mut matched_row = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        matched_row[0] = row;
        let mut col0 = 0usize;
        let mut min_slack = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[col0] = true;
            let row0 = matched_row[col0];
            let mut delta = f64::INFINITY;
            let mut col1 = 0usize;

            for col in 1..=n {
                if used[col] {
                    continue;
                }
                let slack = matrix.get(row0 - 1, col - 1) - u[row0] - v[col];
                if slack < min_slack[col] {
                    min_slack[col] = slack;
                    way[col] = col0;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    col1 = col;
                }
            }

            for col in 0..=n {
                if used[col] {
                    u[matched_row[col]] += delta;
                    v[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }

            col0 = col1;
            if matched_row[col0] == 0 {
                break;
            }
        }

        // Flip the augmenting path
        loop {
            let prev = way[col0];
            matched_row[col0] = matched_row[prev];
            col0 = prev;
            if col0 == 0 {
                break;
            }
        }
    }

    let mut row_to_col = vec![0usize; n];
    for col in 1..=n {
        if matched_row[col] != 0 {
            row_to_col[matched_row[col] - 1] = col - 1;
        }
    }
    let total_cost = row_to_col
        .iter()
        .enumerate()
        .map(|(row, &col)| matrix.get(row, col))
        .sum();

    Assignment {
        row_to_col,
        total_cost,
    }
}

/// Grow `mate` to a maximum-cardinality matching over the undirected graph `adj`.
///
/// Existing pairs in `mate` are kept unless an augmenting path runs through
/// them. Neighbours are tried in `adj` order, so callers list cheaper edges
/// first. Returns the number of augmentations performed.
pub fn maximize_matching(adj: &[Vec<usize>], mate: &mut [Option<usize>]) -> usize {
    let mut augmented = 0;
    for root in 0..adj.len() {
        if mate[root].is_some() {
            continue;
        }
        let Some((end, parent)) = find_augmenting_path(adj, mate, root) else {
            continue;
        };

        // Flip matched and unmatched edges along the path back to the root
        let mut v = Some(end);
        while let Some(x) = v {
            let Some(px) = parent[x] else { break };
            let next = mate[px];
            mate[x] = Some(px);
            mate[px] = Some(x);
            v = next;
        }
        augmented += 1;
    }
    augmented
}

/// BFS over alternating paths from `root`, contracting odd cycles into their base.
/// Returns the free endpoint and the parent links of the alternating tree.
fn find_augmenting_path(
    adj: &[Vec<usize>],
    mate: &[Option<usize>],
    root: usize,
) -> Option<(usize, Vec<Option<usize>>)> {
    let n = adj.len();
    let mut base: Vec<usize> = (0..n).collect();
    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut in_tree = vec![false; n];
    let mut queue = std::collections::VecDeque::new();

    in_tree[root] = true;
    queue.push_back(root);

    while let Some(v) = queue.pop_front() {
        for &to in &adj[v] {
            if base[v] == base[to] || mate[v] == Some(to) {
                continue;
            }

            let outer = to == root || mate[to].map(|m| parent[m].is_some()).unwrap_or(false);
            if outer {
                let lca = lowest_common_base(&base, mate, &parent, v, to);
                let mut blossom = vec![false; n];
                mark_blossom_path(&base, mate, &mut parent, &mut blossom, v, lca, to);
                mark_blossom_path(&base, mate, &mut parent, &mut blossom, to, lca, v);

                for i in 0..n {
                    if blossom[base[i]] {
                        base[i] = lca;
                        if !in_tree[i] {
                            in_tree[i] = true;
                            queue.push_back(i);
                        }
                    }
                }
            } else if parent[to].is_none() {
                parent[to] = Some(v);
                match mate[to] {
                    None => return Some((to, parent)),
                    Some(m) => {
                        in_tree[m] = true;
                        queue.push_back(m);
                    }
                }
            }
        }
    }

    None
}

fn lowest_common_base(
    base: &[usize],
    mate: &[Option<usize>],
    parent: &[Option<usize>],
    a: usize,
    b: usize,
) -> usize {
    let mut seen = vec![false; base.len()];

    let mut a = a;
    loop {
        a = base[a];
        seen[a] = true;
        match mate[a].and_then(|m| parent[m]) {
            Some(next) => a = next,
            None => break,
        }
    }

    let mut b = b;
    loop {
        b = base[b];
        if seen[b] {
            return b;
        }
        match mate[b].and_then(|m| parent[m]) {
            Some(next) => b = next,
            None => return b,
        }
    }
}

fn mark_blossom_path(
    base: &[usize],
    mate: &[Option<usize>],
    parent: &mut [Option<usize>],
    blossom: &mut [bool],
    start: usize,
    lca: usize,
    child: usize,
) {
    let mut v = start;
    let mut child = child;
    while base[v] != lca {
        let Some(m) = mate[v] else { break };
        blossom[base[v]] = true;
        blossom[base[m]] = true;
        parent[v] = Some(child);
        child = m;
        match parent[m] {
            Some(next) => v = next,
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[f64]]) -> CostMatrix {
        let mut m = CostMatrix::filled(rows.len(), 0.0);
        for (i, row) in rows.iter().enumerate() {
            for (j, &c) in row.iter().enumerate() {
                m.set(i, j, c);
            }
        }
        m
    }

    fn permutations(n: usize) -> Vec<Vec<usize>> {
        if n == 0 {
            return vec![vec![]];
        }
        let mut out = Vec::new();
        for p in permutations(n - 1) {
            for pos in 0..=p.len() {
                let mut q = p.clone();
                q.insert(pos, n - 1);
                out.push(q);
            }
        }
        out
    }

    fn brute_force(m: &CostMatrix) -> f64 {
        permutations(m.size())
            .iter()
            .map(|p| p.iter().enumerate().map(|(r, &c)| m.get(r, c)).sum::<f64>())
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn test_empty_matrix() {
        let a = solve(&CostMatrix::filled(0, 0.0));
        assert!(a.row_to_col.is_empty());
        assert_eq!(a.total_cost, 0.0);
    }

    #[test]
    fn test_classic_instance() {
        let m = matrix(&[&[4.0, 1.0, 3.0], &[2.0, 0.0, 5.0], &[3.0, 2.0, 2.0]]);
        let a = solve(&m);
        assert_eq!(a.total_cost, 5.0);
        assert_eq!(a.row_to_col, vec![1, 0, 2]);
    }

    #[test]
    fn test_matches_brute_force() {
        // Deterministic pseudo-random instances
        let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
        for n in 1..=6 {
            for _ in 0..5 {
                let mut m = CostMatrix::filled(n, 0.0);
                for i in 0..n {
                    for j in 0..n {
                        seed ^= seed << 13;
                        seed ^= seed >> 7;
                        seed ^= seed << 17;
                        m.set(i, j, (seed % 100) as f64 / 10.0);
                    }
                }
                let a = solve(&m);
                assert!((a.total_cost - brute_force(&m)).abs() < 1e-9);

                let mut cols = a.row_to_col.clone();
                cols.sort_unstable();
                assert_eq!(cols, (0..n).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_avoids_sentinel_diagonal() {
        let big = 1.0e6;
        let m = matrix(&[&[big, 0.2, 0.9], &[0.2, big, 0.1], &[0.9, 0.1, big]]);
        let a = solve(&m);
        for (row, &col) in a.row_to_col.iter().enumerate() {
            assert_ne!(row, col);
        }
    }

    fn graph(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); n];
        for &(a, b) in edges {
            adj[a].push(b);
            adj[b].push(a);
        }
        adj
    }

    fn matched_pairs(mate: &[Option<usize>]) -> usize {
        mate.iter().enumerate().filter(|(i, m)| matches!(m, Some(j) if j > i)).count()
    }

    fn brute_force_max(n: usize, edges: &[(usize, usize)], used: &mut Vec<bool>) -> usize {
        let Some(v) = (0..n).find(|&v| !used[v]) else {
            return 0;
        };
        used[v] = true;
        let mut best = brute_force_max(n, edges, used);
        for &(a, b) in edges {
            let other = if a == v { b } else if b == v { a } else { continue };
            if !used[other] {
                used[other] = true;
                best = best.max(1 + brute_force_max(n, edges, used));
                used[other] = false;
            }
        }
        used[v] = false;
        best
    }

    #[test]
    fn test_augments_through_odd_cycle() {
        // Two triangles a-b-c and d-e-f joined by c-f, starting from {a-b, e-f}
        let adj = graph(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 5)]);
        let mut mate = vec![Some(1), Some(0), None, None, Some(5), Some(4)];

        assert_eq!(maximize_matching(&adj, &mut mate), 1);
        assert_eq!(matched_pairs(&mate), 3);
        assert_eq!(mate[0], Some(1));
        for (v, m) in mate.iter().enumerate() {
            let m = m.unwrap();
            assert_eq!(mate[m], Some(v));
            assert!(adj[v].contains(&m));
        }
    }

    #[test]
    fn test_maximum_cardinality_matches_brute_force() {
        let mut seed: u64 = 0x2545_F491_4F6C_DD1D;
        for n in 2..=9 {
            for _ in 0..6 {
                let mut edges = Vec::new();
                for a in 0..n {
                    for b in (a + 1)..n {
                        seed ^= seed << 13;
                        seed ^= seed >> 7;
                        seed ^= seed << 17;
                        if seed % 3 == 0 {
                            edges.push((a, b));
                        }
                    }
                }
                let adj = graph(n, &edges);
                let mut mate = vec![None; n];
                maximize_matching(&adj, &mut mate);

                let expected = brute_force_max(n, &edges, &mut vec![false; n]);
                assert_eq!(matched_pairs(&mate), expected, "n={} edges={:?}", n, edges);
            }
        }
    }

    #[test]
    fn test_maximum_matching_keeps_existing_pairs_when_already_maximum() {
        let adj = graph(4, &[(0, 1), (2, 3), (1, 2)]);
        let mut mate = vec![Some(1), Some(0), Some(3), Some(2)];
        assert_eq!(maximize_matching(&adj, &mut mate), 0);
        assert_eq!(mate, vec![Some(1), Some(0), Some(3), Some(2)]);
    }
}
