//! Edge-colored graph storage, text I/O, and random complete colorings.

use crate::error::{ChromaError, Result};
use rand::Rng;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

/// Edge color. One value per graph is reserved as the "no edge" color.
pub type Color = i32;

/// Largest vertex count accepted from text input or random generation.
pub const MAX_VERTICES: usize = 4096;

// ============================================================================
// ColoredGraph
// ============================================================================

/// A graph on `n` vertices storing one color per unordered vertex pair.
///
/// Representation:
/// - `colors` is the strictly upper triangle of the color matrix, flattened
///   row by row, so pair `(i, j)` with `i < j` lives at `row_start[i] + (j - i - 1)`.
/// - `row_start[i]` is precomputed to keep index arithmetic out of the counting loop.
/// - `missing` is the number of pairs currently holding the null color, so
///   [`ColoredGraph::is_complete`] is O(1).
///
/// Symmetry `color(i, j) == color(j, i)` holds by construction since both orders
/// address the same slot. Self-loops have no slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColoredGraph {
    n: usize,
    null: Color,
    colors: Vec<Color>,
    row_start: Vec<usize>,
    missing: usize,
}

impl ColoredGraph {
    /// Creates a graph on `n` vertices with every pair set to `null` (no edges).
    ///
    /// Callers handling untrusted sizes should bound `n` by [`MAX_VERTICES`] first.
    pub fn new(n: usize, null: Color) -> Self {
        let pairs = n * n.saturating_sub(1) / 2;
        let row_start = (0..n).map(|i| i * n - i * (i + 1) / 2).collect();
        Self {
            n,
            null,
            colors: vec![null; pairs],
            row_start,
            missing: pairs,
        }
    }

    /// Creates a complete graph with every edge colored `color`.
    pub fn complete(n: usize, color: Color, null: Color) -> Self {
        Self::from_fn(n, null, |_, _| color)
    }

    /// Creates a graph whose pair `(i, j)`, `i < j`, is colored `f(i, j)`.
    pub fn from_fn<F: FnMut(usize, usize) -> Color>(n: usize, null: Color, mut f: F) -> Self {
        let mut graph = Self::new(n, null);
        for i in 0..n {
            for j in (i + 1)..n {
                graph.set_edge(i, j, f(i, j));
            }
        }
        graph
    }

    /// Creates a complete graph whose every edge is a uniformly random `palette` color.
    ///
    /// # Errors
    /// Returns an error if `palette` is empty or contains the null color, or if `n`
    /// exceeds [`MAX_VERTICES`].
    pub fn random_complete<R: Rng>(
        n: usize,
        palette: &[Color],
        null: Color,
        rng: &mut R,
    ) -> Result<Self> {
        if palette.is_empty() {
            return Err(ChromaError::DegeneratePalette { colors: 0 });
        }
        if n > MAX_VERTICES {
            return Err(ChromaError::config(format!(
                "vertex count {n} exceeds the limit of {MAX_VERTICES}"
            )));
        }
        if palette.contains(&null) {
            return Err(ChromaError::config(format!(
                "palette contains the null color {null}"
            )));
        }
        Ok(Self::from_fn(n, null, |_, _| {
            palette[rng.random_range(0..palette.len())]
        }))
    }

    /// Returns the number of vertices.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.n
    }

    /// Returns the color that denotes "no edge".
    #[inline(always)]
    pub fn null_color(&self) -> Color {
        self.null
    }

    /// Slot of the ascending pair `lo < hi`.
    #[inline(always)]
    fn slot(&self, lo: usize, hi: usize) -> usize {
        debug_assert!(lo < hi && hi < self.n);
        self.row_start[lo] + (hi - lo - 1)
    }

    #[inline(always)]
    fn slot_unordered(&self, i: usize, j: usize) -> usize {
        debug_assert!(i != j, "self-loop ({i}, {i}) has no color");
        if i < j { self.slot(i, j) } else { self.slot(j, i) }
    }

    /// Returns the color of the pair `lo < hi` without reordering.
    ///
    /// This is the accessor used by clique enumeration, where subsets are ascending.
    #[inline(always)]
    pub fn edge_ascending(&self, lo: usize, hi: usize) -> Color {
        self.colors[self.slot(lo, hi)]
    }

    /// Returns the color of the unordered pair `{i, j}`.
    ///
    /// Indices must satisfy `i != j` and `i, j < size()`; see
    /// [`ColoredGraph::try_get_edge`] for a checked variant.
    #[inline(always)]
    pub fn get_edge(&self, i: usize, j: usize) -> Color {
        self.colors[self.slot_unordered(i, j)]
    }

    /// Sets the color of the unordered pair `{i, j}`.
    ///
    /// Indices must satisfy `i != j` and `i, j < size()`; see
    /// [`ColoredGraph::try_set_edge`] for a checked variant.
    #[inline]
    pub fn set_edge(&mut self, i: usize, j: usize, color: Color) {
        let slot = self.slot_unordered(i, j);
        let old = self.colors[slot];
        if old == self.null && color != self.null {
            self.missing -= 1;
        } else if old != self.null && color == self.null {
            self.missing += 1;
        }
        self.colors[slot] = color;
    }

    /// Returns whether `{i, j}` carries a non-null color.
    #[inline(always)]
    pub fn has_edge(&self, i: usize, j: usize) -> bool {
        self.get_edge(i, j) != self.null
    }

    /// Checked form of [`ColoredGraph::get_edge`].
    ///
    /// # Errors
    /// Returns an error if either index is out of range or `i == j`.
    pub fn try_get_edge(&self, i: usize, j: usize) -> Result<Color> {
        self.check_pair(i, j)?;
        Ok(self.get_edge(i, j))
    }

    /// Checked form of [`ColoredGraph::set_edge`].
    ///
    /// # Errors
    /// Returns an error if either index is out of range or `i == j`.
    pub fn try_set_edge(&mut self, i: usize, j: usize, color: Color) -> Result<()> {
        self.check_pair(i, j)?;
        self.set_edge(i, j, color);
        Ok(())
    }

    fn check_pair(&self, i: usize, j: usize) -> Result<()> {
        for v in [i, j] {
            if v >= self.n {
                return Err(ChromaError::VertexOutOfRange {
                    vertex: v,
                    order: self.n,
                });
            }
        }
        if i == j {
            return Err(ChromaError::SelfLoop { vertex: i });
        }
        Ok(())
    }

    /// Returns `true` iff no pair holds the null color.
    #[inline(always)]
    pub fn is_complete(&self) -> bool {
        self.missing == 0
    }

    /// Returns the number of pairs with a non-null color.
    #[inline]
    pub fn edge_count(&self) -> usize {
        self.colors.len() - self.missing
    }

    /// Returns every pair `(i, j)`, `i < j`, that carries a non-null color.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.edge_count());
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                if self.edge_ascending(i, j) != self.null {
                    out.push((i, j));
                }
            }
        }
        out
    }

    /// Returns the number of edges colored `color`.
    pub fn color_count(&self, color: Color) -> usize {
        self.colors.iter().filter(|&&c| c == color).count()
    }

    /// Returns the distinct non-null colors in use, ascending.
    pub fn palette(&self) -> Vec<Color> {
        let mut palette: Vec<Color> = self
            .colors
            .iter()
            .copied()
            .filter(|&c| c != self.null)
            .collect();
        palette.sort_unstable();
        palette.dedup();
        palette
    }

    /// Returns the packed color slots (strict upper triangle, row-major).
    #[inline]
    pub fn raw_colors(&self) -> &[Color] {
        &self.colors
    }

    /// Writes the graph in the text format read by [`parse_colored_graph`].
    ///
    /// The diagonal is written as the null color.
    ///
    /// # Errors
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, mut w: W) -> io::Result<()> {
        writeln!(w, "{} {}", self.n, self.null)?;
        for i in 0..self.n {
            for j in 0..self.n {
                if j > 0 {
                    write!(w, " ")?;
                }
                let c = if i == j { self.null } else { self.get_edge(i, j) };
                write!(w, "{c}")?;
            }
            writeln!(w)?;
        }
        Ok(())
    }

    /// Saves the graph to `path` in the text format.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }

    /// Loads a graph from a file in the text format.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or its contents are malformed.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut text = String::new();
        File::open(path)?.read_to_string(&mut text)?;
        parse_colored_graph(&text)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a colored graph from text.
///
/// Format:
/// - The first non-blank line holds the vertex count `n` and the null color.
/// - The next `n` non-blank lines each hold `n` whitespace-separated integer colors;
///   line `i` column `j` is the color of pair `(i, j)`.
/// - Diagonal entries are ignored.
///
/// # Errors
/// Returns an error on a missing/invalid header, a row with the wrong number of
/// entries, a non-integer entry, the wrong number of rows, or an asymmetric matrix.
pub fn parse_colored_graph(text: &str) -> Result<ColoredGraph> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(idx, l)| (idx + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    let (header_line, header) = lines
        .next()
        .ok_or_else(|| ChromaError::parse(1, "missing header line"))?;
    let mut fields = header.split_whitespace();
    let n: usize = parse_field(fields.next(), header_line, "vertex count")?;
    let null: Color = parse_field(fields.next(), header_line, "null color")?;
    if fields.next().is_some() {
        return Err(ChromaError::parse(
            header_line,
            "header must contain exactly a vertex count and a null color",
        ));
    }

    if n > MAX_VERTICES {
        return Err(ChromaError::parse(
            header_line,
            format!("vertex count {n} exceeds the limit of {MAX_VERTICES}"),
        ));
    }

    let mut rows: Vec<Vec<Color>> = Vec::new();
    for (line_no, line) in lines {
        if rows.len() == n {
            return Err(ChromaError::parse(
                line_no,
                format!("expected {n} rows, found more"),
            ));
        }
        let row = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse()
                    .map_err(|_| ChromaError::parse(line_no, format!("invalid color {token:?}")))
            })
            .collect::<Result<Vec<Color>>>()?;
        if row.len() != n {
            return Err(ChromaError::parse(
                line_no,
                format!("row {} has {} entries, expected {n}", rows.len(), row.len()),
            ));
        }
        rows.push(row);
    }
    if rows.len() != n {
        return Err(ChromaError::parse(
            header_line,
            format!("expected {n} rows, found {}", rows.len()),
        ));
    }

    let mut graph = ColoredGraph::new(n, null);
    for i in 0..n {
        for j in (i + 1)..n {
            let c = rows[i][j];
            if c != rows[j][i] {
                return Err(ChromaError::NotSymmetric { i, j });
            }
            graph.set_edge(i, j, c);
        }
    }
    Ok(graph)
}

fn parse_field<T: std::str::FromStr>(field: Option<&str>, line: usize, what: &str) -> Result<T> {
    let field = field.ok_or_else(|| ChromaError::parse(line, format!("missing {what}")))?;
    field
        .parse()
        .map_err(|_| ChromaError::parse(line, format!("invalid {what} {field:?}")))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xorshift::XorShiftRng;

    #[test]
    fn packed_slots_cover_every_pair_once() {
        for n in 0..12 {
            let g = ColoredGraph::new(n, 0);
            let mut seen = vec![false; g.raw_colors().len()];
            for i in 0..n {
                for j in (i + 1)..n {
                    let s = g.slot(i, j);
                    assert!(!seen[s], "slot {s} reused at ({i}, {j})");
                    seen[s] = true;
                }
            }
            assert!(seen.iter().all(|&b| b), "unused slot for n={n}");
        }
    }

    #[test]
    fn set_edge_is_symmetric() {
        let mut g = ColoredGraph::new(6, 0);
        g.set_edge(4, 1, 7);
        assert_eq!(g.get_edge(1, 4), 7);
        assert_eq!(g.get_edge(4, 1), 7);
        assert_eq!(g.edge_ascending(1, 4), 7);
    }

    #[test]
    fn has_edge_tracks_null_color() {
        let mut g = ColoredGraph::new(4, -1);
        assert!(!g.has_edge(0, 3));
        g.set_edge(0, 3, 0);
        assert!(g.has_edge(0, 3));
        g.set_edge(3, 0, -1);
        assert!(!g.has_edge(0, 3));
    }

    #[test]
    fn completeness_follows_edits() {
        let mut g = ColoredGraph::complete(5, 1, 0);
        assert!(g.is_complete());
        assert_eq!(g.edge_count(), 10);

        g.set_edge(2, 3, 0);
        assert!(!g.is_complete());
        assert_eq!(g.edge_count(), 9);

        // Recoloring between two non-null colors must not disturb the count.
        g.set_edge(0, 1, 2);
        assert_eq!(g.edge_count(), 9);

        g.set_edge(3, 2, 1);
        assert!(g.is_complete());
    }

    #[test]
    fn empty_and_single_vertex_graphs() {
        let g0 = ColoredGraph::new(0, 0);
        assert_eq!(g0.size(), 0);
        assert!(g0.is_complete());
        assert!(g0.edges().is_empty());

        let g1 = ColoredGraph::complete(1, 3, 0);
        assert_eq!(g1.edge_count(), 0);
        assert!(g1.palette().is_empty());
    }

    #[test]
    fn checked_accessors_reject_bad_indices() {
        let mut g = ColoredGraph::new(3, 0);
        assert!(matches!(
            g.try_set_edge(0, 3, 1),
            Err(ChromaError::VertexOutOfRange { vertex: 3, order: 3 })
        ));
        assert!(matches!(
            g.try_get_edge(2, 2),
            Err(ChromaError::SelfLoop { vertex: 2 })
        ));
        g.try_set_edge(2, 0, 5).unwrap();
        assert_eq!(g.try_get_edge(0, 2).unwrap(), 5);
    }

    #[test]
    fn palette_is_sorted_and_excludes_null() {
        let g = ColoredGraph::from_fn(5, 0, |i, j| {
            if (i + j) % 3 == 0 {
                0
            } else {
                9 - ((i * j) % 2) as Color
            }
        });
        let palette = g.palette();
        assert!(!palette.contains(&0));
        assert!(palette.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn random_complete_uses_only_palette_colors() {
        let mut rng = XorShiftRng::seed_from_u64(0xC0FFEE);
        let palette = [1, 2, 3];
        let g = ColoredGraph::random_complete(20, &palette, 0, &mut rng).unwrap();
        assert!(g.is_complete());
        assert!(g.raw_colors().iter().all(|c| palette.contains(c)));
        let total: usize = palette.iter().map(|&c| g.color_count(c)).sum();
        assert_eq!(total, 190);
    }

    #[test]
    fn random_complete_rejects_bad_palettes() {
        let mut rng = XorShiftRng::seed_from_u64(1);
        assert!(matches!(
            ColoredGraph::random_complete(4, &[], 0, &mut rng),
            Err(ChromaError::DegeneratePalette { colors: 0 })
        ));
        assert!(matches!(
            ColoredGraph::random_complete(4, &[0, 1], 0, &mut rng),
            Err(ChromaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn random_complete_rejects_oversized_order() {
        let mut rng = XorShiftRng::seed_from_u64(2);
        assert!(matches!(
            ColoredGraph::random_complete(MAX_VERTICES + 1, &[1, 2], 0, &mut rng),
            Err(ChromaError::InvalidConfig(_))
        ));
        assert!(matches!(
            ColoredGraph::random_complete(usize::MAX, &[1, 2], 0, &mut rng),
            Err(ChromaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn write_and_parse_roundtrip() {
        let mut rng = XorShiftRng::seed_from_u64(0x1234);
        let g = ColoredGraph::random_complete(9, &[1, 2, 3], 0, &mut rng).unwrap();

        let mut buf = Vec::new();
        g.write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("9 0\n"));

        let parsed = parse_colored_graph(&text).unwrap();
        assert_eq!(parsed, g);
    }

    #[test]
    fn parse_ignores_diagonal_and_blank_lines() {
        let text = "\n3 0\n\n5 1 2\n1 5 1\n2 1 5\n\n";
        let g = parse_colored_graph(text).unwrap();
        assert_eq!(g.get_edge(0, 1), 1);
        assert_eq!(g.get_edge(0, 2), 2);
        assert_eq!(g.get_edge(1, 2), 1);
    }

    #[test]
    fn parse_zero_vertex_graph() {
        let g = parse_colored_graph("0 0\n").unwrap();
        assert_eq!(g.size(), 0);
    }

    #[test]
    fn parse_rejects_missing_header() {
        let err = parse_colored_graph("  \n").unwrap_err();
        assert!(matches!(err, ChromaError::Parse { .. }));
    }

    #[test]
    fn parse_rejects_bad_header() {
        assert!(matches!(
            parse_colored_graph("x 0\n").unwrap_err(),
            ChromaError::Parse { line: 1, .. }
        ));
        assert!(matches!(
            parse_colored_graph("2\n0 1\n1 0\n").unwrap_err(),
            ChromaError::Parse { line: 1, .. }
        ));
    }

    #[test]
    fn parse_rejects_short_row() {
        let err = parse_colored_graph("3 0\n0 1 1\n1 0\n1 1 0\n").unwrap_err();
        assert!(matches!(err, ChromaError::Parse { line: 3, .. }));
    }

    #[test]
    fn parse_rejects_wrong_row_count() {
        assert!(matches!(
            parse_colored_graph("3 0\n0 1 1\n1 0 1\n").unwrap_err(),
            ChromaError::Parse { .. }
        ));
        assert!(matches!(
            parse_colored_graph("2 0\n0 1\n1 0\n1 1\n").unwrap_err(),
            ChromaError::Parse { line: 4, .. }
        ));
    }

    #[test]
    fn parse_rejects_oversized_header() {
        for text in ["5000000000 0\n", "200000 0\n0 1\n", "18446744073709551615 0\n"] {
            assert!(matches!(
                parse_colored_graph(text),
                Err(ChromaError::Parse { line: 1, .. })
            ));
        }
    }

    #[test]
    fn parse_fails_on_rows_before_building_large_graph() {
        let err = parse_colored_graph("4000 0\n0 1\n").unwrap_err();
        assert!(matches!(err, ChromaError::Parse { line: 2, .. }), "{err}");
        let err = parse_colored_graph("4000 0\n").unwrap_err();
        assert!(matches!(err, ChromaError::Parse { line: 1, .. }), "{err}");
        let err = parse_colored_graph("3 0\n0 1 1\n1 0 1\n").unwrap_err();
        assert!(matches!(err, ChromaError::Parse { line: 1, .. }), "{err}");
    }

    #[test]
    fn parse_rejects_non_integer_color() {
        let err = parse_colored_graph("2 0\n0 a\n1 0\n").unwrap_err();
        assert!(matches!(err, ChromaError::Parse { line: 2, .. }));
    }

    #[test]
    fn parse_rejects_asymmetric_matrix() {
        let err = parse_colored_graph("3 0\n0 1 2\n1 0 1\n1 1 0\n").unwrap_err();
        assert!(matches!(err, ChromaError::NotSymmetric { i: 0, j: 2 }));
    }

    #[test]
    fn save_and_load_file() {
        let path = std::env::temp_dir().join(format!("chroma_graph_{}.txt", std::process::id()));
        let g = ColoredGraph::from_fn(6, 0, |i, j| ((i + j) % 2 + 1) as Color);
        g.save_to_file(&path).unwrap();
        let loaded = ColoredGraph::load_from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, g);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ColoredGraph::load_from_file("/nonexistent/chroma/graph.txt").unwrap_err();
        assert!(matches!(err, ChromaError::Io(_)));
    }
}
