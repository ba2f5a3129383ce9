//! Exhaustive monochromatic-clique counting.
//!
//! For every `(color, k)` target, every `k`-subset of vertices is classified as:
//! - not a clique (some pair holds the null color),
//! - a monochromatic clique (every pair holds `color`), or
//! - a mixed clique.
//!
//! Targets are counted independently, so a vertex subset is examined once per
//! target whose size matches it. `total_cliques` is therefore a sum over
//! `(target, subset)` pairs and not a count of distinct cliques in the graph.

use crate::combo::SubsetEnumerator;
use crate::error::{ChromaError, Result};
use crate::graph::{Color, ColoredGraph};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// ColorTargets
// ============================================================================

/// Mapping from color to the clique size that must not appear monochromatically.
///
/// Color 1 ↦ 3 means "no monochromatic triangle in color 1".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorTargets {
    sizes: BTreeMap<Color, usize>,
}

impl ColorTargets {
    /// Creates an empty target map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a target map from `(color, size)` pairs.
    ///
    /// # Errors
    /// Returns an error if a size is zero or a color appears twice.
    pub fn from_pairs<I: IntoIterator<Item = (Color, usize)>>(pairs: I) -> Result<Self> {
        let mut targets = Self::new();
        for (color, size) in pairs {
            targets.insert(color, size)?;
        }
        Ok(targets)
    }

    /// Adds a target.
    ///
    /// # Errors
    /// Returns an error if `size` is zero or `color` already has a target.
    pub fn insert(&mut self, color: Color, size: usize) -> Result<()> {
        if size == 0 {
            return Err(ChromaError::EmptyTarget { color });
        }
        if self.sizes.insert(color, size).is_some() {
            return Err(ChromaError::config(format!(
                "color {color} has more than one target size"
            )));
        }
        Ok(())
    }

    /// Checks the targets against a graph: no target may name the null color, and no
    /// size may exceed the vertex count (a zero-vertex graph accepts any size).
    ///
    /// # Errors
    /// Returns [`ChromaError::NullTarget`] or [`ChromaError::TargetTooLarge`].
    pub fn check_against(&self, graph: &ColoredGraph) -> Result<()> {
        let order = graph.size();
        for (&color, &size) in &self.sizes {
            if color == graph.null_color() {
                return Err(ChromaError::NullTarget { color });
            }
            if order > 0 && size > order {
                return Err(ChromaError::TargetTooLarge { color, size, order });
            }
        }
        Ok(())
    }

    /// Target size for `color`, if any.
    #[inline]
    pub fn get(&self, color: Color) -> Option<usize> {
        self.sizes.get(&color).copied()
    }

    /// Iterates targets in ascending color order.
    pub fn iter(&self) -> impl Iterator<Item = (Color, usize)> + '_ {
        self.sizes.iter().map(|(&c, &k)| (c, k))
    }

    /// Target colors, ascending.
    pub fn colors(&self) -> Vec<Color> {
        self.sizes.keys().copied().collect()
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    /// Returns `true` if there are no targets.
    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

// ============================================================================
// ChromaticityCount
// ============================================================================

/// Result of one counting pass.
///
/// Every target color appears in the per-color tally, with 0 if it has no
/// monochromatic cliques.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChromaticityCount {
    total_cliques: u64,
    monochromatic: u64,
    mixed: u64,
    per_color: BTreeMap<Color, u64>,
}

impl ChromaticityCount {
    /// A count with every target color present at 0.
    pub fn zeroed(targets: &ColorTargets) -> Self {
        Self {
            per_color: targets.iter().map(|(c, _)| (c, 0)).collect(),
            ..Self::default()
        }
    }

    /// Valid cliques examined, summed over targets.
    #[inline]
    pub fn total_cliques(&self) -> u64 {
        self.total_cliques
    }

    /// Monochromatic cliques, summed over targets.
    #[inline]
    pub fn monochromatic(&self) -> u64 {
        self.monochromatic
    }

    /// Valid cliques that were not monochromatic in their target color.
    #[inline]
    pub fn mixed(&self) -> u64 {
        self.mixed
    }

    /// The search objective: total monochromatic count.
    #[inline]
    pub fn energy(&self) -> u64 {
        self.monochromatic
    }

    /// Monochromatic count for `color` (0 if it is not a target).
    pub fn for_color(&self, color: Color) -> u64 {
        self.per_color.get(&color).copied().unwrap_or(0)
    }

    /// Per-color monochromatic counts, ascending by color.
    pub fn per_color(&self) -> &BTreeMap<Color, u64> {
        &self.per_color
    }

    /// Additively combines two counts.
    #[must_use]
    pub fn merge(mut self, other: Self) -> Self {
        self.total_cliques += other.total_cliques;
        self.monochromatic += other.monochromatic;
        self.mixed += other.mixed;
        for (color, count) in other.per_color {
            *self.per_color.entry(color).or_insert(0) += count;
        }
        self
    }
}

impl fmt::Display for ChromaticityCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total cliques: {}", self.total_cliques)?;
        writeln!(f, "Monochromatic cliques: {}", self.monochromatic)?;
        writeln!(f, "Mixed cliques: {}", self.mixed)?;
        write!(f, "Monochromatic cliques by color:")?;
        for (color, count) in &self.per_color {
            write!(f, "\n\t{color}: {count}")?;
        }
        Ok(())
    }
}

// ============================================================================
// CliqueCounter
// ============================================================================

/// How per-target passes are scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CountStrategy {
    /// One target after another on the calling thread.
    Sequential,
    /// One rayon task per target; each task owns its tally and tallies are
    /// reduced after all tasks finish.
    #[default]
    Parallel,
}

/// Counts valid, monochromatic, and mixed cliques for a set of targets.
#[derive(Clone, Copy, Debug, Default)]
pub struct CliqueCounter {
    strategy: CountStrategy,
}

/// Reusable buffers for [`CliqueCounter::monochromatic_through_edge`], so repeated
/// per-edge counts do not allocate once the buffers have grown.
#[derive(Clone, Debug, Default)]
pub struct EdgeScratch {
    candidates: Vec<usize>,
    subsets: SubsetEnumerator,
}

impl EdgeScratch {
    /// Creates scratch sized for graphs on up to `n` vertices.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            candidates: Vec::with_capacity(n),
            subsets: SubsetEnumerator::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SubsetKind {
    NotClique,
    Monochromatic,
    Mixed,
}

impl CliqueCounter {
    /// Creates a counter using `strategy`.
    pub fn new(strategy: CountStrategy) -> Self {
        Self { strategy }
    }

    /// Scheduling strategy.
    pub fn strategy(&self) -> CountStrategy {
        self.strategy
    }

    /// Runs one full counting pass.
    ///
    /// The pass either completes for every target or fails before enumerating anything.
    ///
    /// # Errors
    /// Returns an error if a target names the null color or exceeds the vertex count.
    pub fn count(&self, graph: &ColoredGraph, targets: &ColorTargets) -> Result<ChromaticityCount> {
        targets.check_against(graph)?;
        Ok(self.count_unchecked(graph, targets))
    }

    /// Counting pass for targets already checked with [`ColorTargets::check_against`].
    pub(crate) fn count_unchecked(
        &self,
        graph: &ColoredGraph,
        targets: &ColorTargets,
    ) -> ChromaticityCount {
        let totals = match self.strategy {
            CountStrategy::Sequential => targets
                .iter()
                .map(|(color, size)| count_target(graph, color, size))
                .fold(ChromaticityCount::default(), ChromaticityCount::merge),
            CountStrategy::Parallel => targets
                .sizes
                .par_iter()
                .map(|(&color, &size)| count_target(graph, color, size))
                .reduce(ChromaticityCount::default, ChromaticityCount::merge),
        };
        ChromaticityCount::zeroed(targets).merge(totals)
    }

    /// Number of monochromatic target cliques that contain the pair `{i, j}` under
    /// the graph's current coloring.
    ///
    /// Recoloring `{i, j}` changes only these cliques, so for a recolor
    /// `E_after = E_before - through(before) + through(after)` matches a full recount.
    /// Indices must satisfy `i != j` and `i, j < graph.size()`.
    pub fn monochromatic_through_edge(
        &self,
        graph: &ColoredGraph,
        targets: &ColorTargets,
        i: usize,
        j: usize,
        scratch: &mut EdgeScratch,
    ) -> u64 {
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let color = graph.edge_ascending(lo, hi);
        let Some(size) = targets.get(color) else {
            return 0;
        };
        match size {
            0 | 1 => return 0,
            2 => return 1,
            _ => {}
        }

        // Third and later vertices must join both endpoints in `color`.
        let EdgeScratch { candidates, subsets } = scratch;
        candidates.clear();
        candidates.extend((0..graph.size()).filter(|&w| {
            w != lo
                && w != hi
                && graph.get_edge(lo, w) == color
                && graph.get_edge(hi, w) == color
        }));
        if subsets.reset(candidates.len(), size - 2).is_err() {
            return 0;
        }

        let mut count = 0u64;
        while subsets.advance() {
            let s = subsets.current();
            let all_match = s.iter().enumerate().all(|(a, &x)| {
                s[a + 1..]
                    .iter()
                    .all(|&y| graph.edge_ascending(candidates[x], candidates[y]) == color)
            });
            if all_match {
                count += 1;
            }
        }
        count
    }
}

/// One per-target pass with a private tally.
fn count_target(graph: &ColoredGraph, color: Color, size: usize) -> ChromaticityCount {
    let mut tally = ChromaticityCount::default();
    tally.per_color.insert(color, 0);

    let Ok(mut subsets) = SubsetEnumerator::new(graph.size(), size) else {
        return tally;
    };

    let check_valid = !graph.is_complete();
    let null = graph.null_color();
    let mut monochromatic = 0u64;
    let mut mixed = 0u64;
    while subsets.advance() {
        match classify(graph, subsets.current(), color, null, check_valid) {
            SubsetKind::Monochromatic => monochromatic += 1,
            SubsetKind::Mixed => mixed += 1,
            SubsetKind::NotClique => {}
        }
    }

    tally.total_cliques = monochromatic + mixed;
    tally.monochromatic = monochromatic;
    tally.mixed = mixed;
    tally.per_color.insert(color, monochromatic);
    tally
}

/// Classifies an ascending vertex subset.
///
/// On a complete graph no pair can be null, so the first mismatch settles the
/// subset as mixed. Otherwise the remaining pairs are still scanned for a null edge.
#[inline(always)]
fn classify(
    graph: &ColoredGraph,
    subset: &[usize],
    color: Color,
    null: Color,
    check_valid: bool,
) -> SubsetKind {
    let mut monochromatic = true;
    for (a, &u) in subset.iter().enumerate() {
        for &v in &subset[a + 1..] {
            let c = graph.edge_ascending(u, v);
            if c == color {
                continue;
            }
            if c == null {
                return SubsetKind::NotClique;
            }
            if !check_valid {
                return SubsetKind::Mixed;
            }
            monochromatic = false;
        }
    }
    if monochromatic {
        SubsetKind::Monochromatic
    } else {
        SubsetKind::Mixed
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combo::binomial;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;

    fn targets(pairs: &[(Color, usize)]) -> ColorTargets {
        ColorTargets::from_pairs(pairs.iter().copied()).unwrap()
    }

    fn pentagon() -> ColoredGraph {
        // Color 1 on the 5-cycle, color 2 on the pentagram.
        ColoredGraph::from_fn(5, 0, |i, j| if (j - i) % 5 == 1 || (j - i) % 5 == 4 { 1 } else { 2 })
    }

    #[test]
    fn monochromatic_complete_graph_counts_every_subset() {
        for strategy in [CountStrategy::Sequential, CountStrategy::Parallel] {
            let counter = CliqueCounter::new(strategy);
            for n in 1..=8 {
                let g = ColoredGraph::complete(n, 3, 0);
                for k in 1..=n {
                    let c = counter.count(&g, &targets(&[(3, k)])).unwrap();
                    assert_eq!(c.monochromatic(), binomial(n, k), "n={n} k={k}");
                    assert_eq!(c.mixed(), 0);
                    assert_eq!(c.total_cliques(), binomial(n, k));
                    assert_eq!(c.for_color(3), binomial(n, k));
                }
            }
        }
    }

    #[test]
    fn pair_target_counts_edges_of_that_color() {
        let mut rng = XorShiftRng::seed_from_u64(0xFACE);
        let counter = CliqueCounter::default();
        for _ in 0..20 {
            let g = ColoredGraph::random_complete(9, &[1, 2, 3], 0, &mut rng).unwrap();
            let c = counter.count(&g, &targets(&[(2, 2)])).unwrap();
            assert_eq!(c.for_color(2), g.color_count(2) as u64);
            assert_eq!(c.mixed(), 36 - g.color_count(2) as u64);
        }
    }

    #[test]
    fn counting_is_idempotent() {
        let mut rng = XorShiftRng::seed_from_u64(7);
        let g = ColoredGraph::random_complete(10, &[1, 2], 0, &mut rng).unwrap();
        let t = targets(&[(1, 3), (2, 4)]);
        let counter = CliqueCounter::default();
        assert_eq!(counter.count(&g, &t).unwrap(), counter.count(&g, &t).unwrap());
    }

    #[test]
    fn parallel_matches_sequential() {
        let mut rng = XorShiftRng::seed_from_u64(0xBEEF);
        let seq = CliqueCounter::new(CountStrategy::Sequential);
        let par = CliqueCounter::new(CountStrategy::Parallel);
        let t = targets(&[(1, 3), (2, 3), (3, 4)]);
        for _ in 0..10 {
            let g = ColoredGraph::random_complete(11, &[1, 2, 3], 0, &mut rng).unwrap();
            assert_eq!(seq.count(&g, &t).unwrap(), par.count(&g, &t).unwrap());
        }
    }

    #[test]
    fn shared_sizes_count_subsets_once_per_target() {
        let g = pentagon();
        let c = CliqueCounter::default()
            .count(&g, &targets(&[(1, 3), (2, 3)]))
            .unwrap();
        assert_eq!(c.total_cliques(), 20);
        assert_eq!(c.monochromatic(), 0);
        assert_eq!(c.mixed(), 20);
    }

    #[test]
    fn empty_targets_yield_zero_count() {
        let g = ColoredGraph::complete(6, 1, 0);
        let c = CliqueCounter::default().count(&g, &ColorTargets::new()).unwrap();
        assert_eq!(c, ChromaticityCount::default());
    }

    #[test]
    fn zero_vertex_graph_yields_zero_per_target() {
        let g = ColoredGraph::new(0, 0);
        let c = CliqueCounter::default()
            .count(&g, &targets(&[(1, 3), (2, 5)]))
            .unwrap();
        assert_eq!(c.total_cliques(), 0);
        assert_eq!(c.energy(), 0);
        assert_eq!(c.per_color().len(), 2);
        assert_eq!(c.for_color(2), 0);
    }

    #[test]
    fn missing_edges_exclude_subsets() {
        let mut g = ColoredGraph::complete(4, 1, 0);
        g.set_edge(0, 1, 0);
        let c = CliqueCounter::default().count(&g, &targets(&[(1, 3)])).unwrap();
        // Only {0,2,3} and {1,2,3} avoid the missing pair.
        assert_eq!(c.total_cliques(), 2);
        assert_eq!(c.monochromatic(), 2);
    }

    #[test]
    fn missing_edge_after_mismatch_still_excludes_subset() {
        let mut g = ColoredGraph::complete(3, 1, 0);
        g.set_edge(0, 1, 2);
        g.set_edge(1, 2, 0);
        let c = CliqueCounter::default().count(&g, &targets(&[(1, 3)])).unwrap();
        assert_eq!(c.total_cliques(), 0);
        assert_eq!(c.mixed(), 0);
    }

    #[test]
    fn rejects_oversized_target() {
        let g = ColoredGraph::complete(4, 1, 0);
        let err = CliqueCounter::default()
            .count(&g, &targets(&[(1, 5)]))
            .unwrap_err();
        assert!(matches!(
            err,
            ChromaError::TargetTooLarge { color: 1, size: 5, order: 4 }
        ));
    }

    #[test]
    fn rejects_null_target() {
        let g = ColoredGraph::complete(4, 1, 0);
        let err = CliqueCounter::default()
            .count(&g, &targets(&[(0, 2)]))
            .unwrap_err();
        assert!(matches!(err, ChromaError::NullTarget { color: 0 }));
    }

    #[test]
    fn target_map_rejects_zero_and_duplicates() {
        assert!(matches!(
            ColorTargets::from_pairs([(1, 0)]),
            Err(ChromaError::EmptyTarget { color: 1 })
        ));
        assert!(matches!(
            ColorTargets::from_pairs([(1, 3), (1, 4)]),
            Err(ChromaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn through_edge_delta_matches_full_recount() {
        let mut rng = XorShiftRng::seed_from_u64(0xDE17A);
        let counter = CliqueCounter::new(CountStrategy::Sequential);
        let t = targets(&[(1, 3), (2, 4), (3, 2)]);
        let mut g = ColoredGraph::random_complete(10, &[1, 2, 3], 0, &mut rng).unwrap();
        let mut energy = counter.count(&g, &t).unwrap().energy();
        let mut scratch = EdgeScratch::default();

        for _ in 0..300 {
            let i = rng.random_range(0..10);
            let mut j = rng.random_range(0..10);
            while j == i {
                j = rng.random_range(0..10);
            }
            let new_color = rng.random_range(1..=3);
            let before = counter.monochromatic_through_edge(&g, &t, i, j, &mut scratch);
            g.set_edge(i, j, new_color);
            let after = counter.monochromatic_through_edge(&g, &t, j, i, &mut scratch);
            energy = energy - before + after;
            assert_eq!(energy, counter.count(&g, &t).unwrap().energy());
        }
    }

    #[test]
    fn through_edge_ignores_untargeted_colors() {
        let g = ColoredGraph::complete(5, 4, 0);
        let counter = CliqueCounter::default();
        let mut scratch = EdgeScratch::with_capacity(5);
        let mut through = |pairs: &[(Color, usize)]| {
            counter.monochromatic_through_edge(&g, &targets(pairs), 0, 1, &mut scratch)
        };
        assert_eq!(through(&[(1, 3)]), 0);
        assert_eq!(through(&[(4, 3)]), 3);
        assert_eq!(through(&[(4, 5)]), 1);
    }

    #[test]
    fn through_edge_scratch_reuses_buffers() {
        let g = ColoredGraph::complete(12, 1, 0);
        let t = targets(&[(1, 4)]);
        let counter = CliqueCounter::default();
        let mut scratch = EdgeScratch::with_capacity(12);
        assert_eq!(counter.monochromatic_through_edge(&g, &t, 0, 1, &mut scratch), 45);
        let capacity = scratch.candidates.capacity();
        let buffer = scratch.candidates.as_ptr();
        for (i, j) in [(2, 7), (11, 3), (5, 6)] {
            assert_eq!(counter.monochromatic_through_edge(&g, &t, i, j, &mut scratch), 45);
        }
        assert_eq!(scratch.candidates.capacity(), capacity);
        assert_eq!(scratch.candidates.as_ptr(), buffer);
    }

    #[test]
    fn display_lists_every_target_color() {
        let g = pentagon();
        let c = CliqueCounter::default()
            .count(&g, &targets(&[(1, 2), (2, 3)]))
            .unwrap();
        let text = c.to_string();
        assert!(text.contains("Monochromatic cliques: 5"));
        assert!(text.contains("\t1: 5"));
        assert!(text.contains("\t2: 0"));
    }
}
