//! Error type shared by every fallible operation in the crate.

use crate::graph::Color;
use thiserror::Error;

/// Errors reported by graph construction, counting, and search.
///
/// None of these are recovered from mid-operation: the operation that hits one
/// returns it without enumerating cliques or recoloring anything.
#[derive(Error, Debug)]
pub enum ChromaError {
    /// A target clique size exceeds the number of vertices in the graph.
    #[error("target clique size {size} for color {color} exceeds vertex count {order}")]
    TargetTooLarge {
        /// The target color.
        color: Color,
        /// Requested clique size.
        size: usize,
        /// Number of vertices in the graph.
        order: usize,
    },

    /// A target clique size of zero.
    #[error("target clique size for color {color} must be positive")]
    EmptyTarget {
        /// The target color.
        color: Color,
    },

    /// A target names the graph's "no edge" color.
    #[error("color {color} is the null color and cannot be a clique target")]
    NullTarget {
        /// The offending color.
        color: Color,
    },

    /// An edge operation references a vertex outside `[0, n)`.
    #[error("vertex {vertex} is out of range for a graph on {order} vertices")]
    VertexOutOfRange {
        /// The offending vertex index.
        vertex: usize,
        /// Number of vertices in the graph.
        order: usize,
    },

    /// An edge operation names the same vertex twice.
    #[error("self-loop at vertex {vertex} is not addressable")]
    SelfLoop {
        /// The repeated vertex.
        vertex: usize,
    },

    /// A subset enumerator was asked for more elements than the universe holds.
    #[error("cannot choose {k} elements from a universe of {n}")]
    SubsetTooLarge {
        /// Universe size.
        n: usize,
        /// Requested subset size.
        k: usize,
    },

    /// Recoloring needs at least two colors to choose between.
    #[error("recolor palette has {colors} color(s); at least 2 are required")]
    DegeneratePalette {
        /// Number of colors available.
        colors: usize,
    },

    /// The graph has no non-null edge to recolor.
    #[error("graph has no edges to recolor")]
    NoEdges,

    /// A search parameter is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed graph text.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number in the input.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// The parsed color matrix disagrees with itself across the diagonal.
    #[error("color matrix is not symmetric at ({i}, {j})")]
    NotSymmetric {
        /// Row index.
        i: usize,
        /// Column index.
        j: usize,
    },

    /// A coloring still contains monochromatic target cliques.
    #[error("coloring has {count} monochromatic clique(s) of size {size} in color {color}")]
    NotRamseyColoring {
        /// The color with monochromatic cliques.
        color: Color,
        /// The target size that was violated.
        size: usize,
        /// Number of monochromatic cliques found.
        count: u64,
    },

    /// I/O failure while reading or writing a coloring.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChromaError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        ChromaError::InvalidConfig(message.into())
    }

    /// Creates a parse error for a 1-based line number.
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        ChromaError::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChromaError>;
