//! # Chroma
//!
//! Search for multicolor Ramsey colorings of complete graphs.
//!
//! Given an edge-colored graph and a target clique size per color, the crate counts
//! monochromatic target cliques and runs simulated annealing over single-edge
//! recolorings until that count reaches zero.
//!
//! This crate provides:
//! - A packed triangular colored-graph store with a plain-text format.
//! - A lexicographic `k`-subset enumerator.
//! - An exact clique counter, parallel across target colors, with an incremental
//!   per-edge variant.
//! - A simulated-annealing driver with reheating and parallel restarts.
//!
//! ## Quick Start
//!
//! ```
//! use chroma::prelude::*;
//!
//! // Look for a 2-coloring of K5 without monochromatic triangles.
//! let mut graph = ColoredGraph::complete(5, 1, 0);
//! let targets = ColorTargets::from_pairs([(1, 3), (2, 3)]).unwrap();
//! let cfg = AnnealConfig {
//!     max_iterations: 50_000,
//!     seed: Some(7),
//!     ..Default::default()
//! };
//! let report = Annealer::new(cfg).unwrap().run(&mut graph, &targets).unwrap();
//! if report.is_solved() {
//!     validate_coloring(&graph, &targets).unwrap();
//! }
//! ```
//!
//! ## Validating Known Witnesses
//!
//! ```
//! use chroma::validate::validate_known_colorings;
//!
//! validate_known_colorings().expect("all witnesses should be valid");
//! ```
//!
//! ## Modules
//!
//! - [`graph`]: Colored graph storage, random generation, and text I/O.
//! - [`combo`]: Subset enumeration and binomial coefficients.
//! - [`count`]: Clique targets and monochromatic clique counting.
//! - [`anneal`]: Simulated-annealing search and parallel restarts.
//! - [`validate`]: Deterministic validation of finished and bundled colorings.
//! - [`error`]: The crate error type.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::inline_always)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::needless_range_loop)]

pub mod anneal;
pub mod combo;
pub mod count;
pub mod error;
pub mod graph;
pub mod validate;

/// Re-export commonly used types for convenience.
pub mod prelude {
    pub use crate::anneal::{
        AnnealConfig, AnnealReport, Annealer, Phase, RestartStart, StateChange, run_restarts,
    };
    pub use crate::combo::SubsetEnumerator;
    pub use crate::count::{
        ChromaticityCount, CliqueCounter, ColorTargets, CountStrategy, EdgeScratch,
    };
    pub use crate::error::{ChromaError, Result};
    pub use crate::graph::{Color, ColoredGraph, MAX_VERTICES, parse_colored_graph};
    pub use crate::validate::{validate_coloring, validate_known_colorings};
}
