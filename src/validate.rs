//! Deterministic checks of finished colorings and of the bundled witness colorings.

use crate::count::{CliqueCounter, ColorTargets, CountStrategy};
use crate::error::{ChromaError, Result};
use crate::graph::{ColoredGraph, parse_colored_graph};

// ============================================================================
// Public API
// ============================================================================

/// Bundled colorings proving a lower bound on a Ramsey number, with the target
/// sizes each one avoids.
const WITNESSES: &[(&str, &str, &[(i32, usize)])] = &[
    // R(3,3) > 5: pentagon and pentagram.
    (
        "coloring_n5_r3_3.txt",
        include_str!("../witnesses/coloring_n5_r3_3.txt"),
        &[(1, 3), (2, 3)],
    ),
    // R(3,4) > 8: Wagner graph and its complement.
    (
        "coloring_n8_r3_4.txt",
        include_str!("../witnesses/coloring_n8_r3_4.txt"),
        &[(1, 3), (2, 4)],
    ),
    // R(4,4) > 17: Paley graph on 17 vertices.
    (
        "coloring_n17_r4_4.txt",
        include_str!("../witnesses/coloring_n17_r4_4.txt"),
        &[(1, 4), (2, 4)],
    ),
    // R(3,3,3) > 16: cubic-residue classes of GF(16).
    (
        "coloring_n16_r3_3_3.txt",
        include_str!("../witnesses/coloring_n16_r3_3_3.txt"),
        &[(1, 3), (2, 3), (3, 3)],
    ),
];

/// Checks that `graph` has no monochromatic clique for any target.
///
/// # Errors
/// Returns [`ChromaError::NotRamseyColoring`] naming the lowest violated color, or
/// any error from target validation.
pub fn validate_coloring(graph: &ColoredGraph, targets: &ColorTargets) -> Result<()> {
    let count = CliqueCounter::new(CountStrategy::Parallel).count(graph, targets)?;
    for (color, size) in targets.iter() {
        let found = count.for_color(color);
        if found > 0 {
            return Err(ChromaError::NotRamseyColoring {
                color,
                size,
                count: found,
            });
        }
    }
    Ok(())
}

/// Validates every bundled witness coloring.
///
/// # Errors
/// Returns the name of the first witness that fails to parse or validate.
pub fn validate_known_colorings() -> std::result::Result<(), String> {
    for (name, text, pairs) in WITNESSES {
        validate_case(text, pairs).map_err(|e| format!("{name}: {e}"))?;
    }
    Ok(())
}

// ============================================================================
// Internal
// ============================================================================

fn validate_case(text: &str, pairs: &[(i32, usize)]) -> Result<()> {
    let graph = parse_colored_graph(text)?;
    if !graph.is_complete() {
        return Err(ChromaError::config("witness coloring has uncolored pairs"));
    }
    let targets = ColorTargets::from_pairs(pairs.iter().copied())?;
    validate_coloring(&graph, &targets)
}

// ============================================================================
// Tests
// ============================================================================
