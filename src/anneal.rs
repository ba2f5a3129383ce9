//! Simulated-annealing search over edge colorings.
//!
//! Each iteration recolors one random existing edge, re-evaluates the monochromatic
//! clique count, and keeps or reverts the change by the Metropolis rule. The search
//! stops as soon as the count reaches zero or the iteration budget runs out.

use crate::count::{CliqueCounter, ColorTargets, CountStrategy, EdgeScratch};
use crate::error::{ChromaError, Result};
use crate::graph::{Color, ColoredGraph};
use log::{debug, info, warn};
use rand::prelude::*;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

// ============================================================================
// Configuration
// ============================================================================

/// Annealing parameters.
#[derive(Clone, Debug)]
pub struct AnnealConfig {
    /// Iteration budget.
    pub max_iterations: u64,
    /// Starting temperature `T0`.
    pub initial_temp: f64,
    /// Per-iteration cooling factor; `T(iter) = T0 * cooling_rate^iter`.
    pub cooling_rate: f64,
    /// Stagnant iterations (no strict improvement) after which the reheat boost applies.
    pub reheat_after: u64,
    /// Temperature added while the search is stagnant.
    pub reheat_boost: f64,
    /// Temperature floor; cooling never goes below this.
    pub min_temp: f64,
    /// Progress log period in iterations (0 disables progress logging).
    pub report_every: u64,
    /// Optional deterministic seed.
    pub seed: Option<u64>,
    /// Optional wall-clock cutoff.
    pub time_limit: Option<Duration>,
    /// Re-evaluate only the cliques through the recolored edge instead of recounting.
    pub incremental: bool,
    /// Scheduling for full counting passes.
    pub strategy: CountStrategy,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1_000_000,
            initial_temp: 5.0,
            cooling_rate: 0.9999,
            reheat_after: 10_000,
            reheat_boost: 1.0,
            min_temp: 1e-9,
            report_every: 100_000,
            seed: None,
            time_limit: None,
            incremental: true,
            strategy: CountStrategy::Parallel,
        }
    }
}

impl AnnealConfig {
    /// Checks parameter ranges.
    ///
    /// # Errors
    /// Returns [`ChromaError::InvalidConfig`] if a temperature is non-positive or not
    /// finite, the cooling rate is outside `(0, 1]`, or the reheat boost is negative.
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_temp.is_finite() && self.initial_temp > 0.0) {
            return Err(ChromaError::config(format!(
                "initial temperature must be positive, got {}",
                self.initial_temp
            )));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate <= 1.0) {
            return Err(ChromaError::config(format!(
                "cooling rate must be in (0, 1], got {}",
                self.cooling_rate
            )));
        }
        if !(self.min_temp.is_finite() && self.min_temp > 0.0) {
            return Err(ChromaError::config(format!(
                "temperature floor must be positive, got {}",
                self.min_temp
            )));
        }
        if !(self.reheat_boost.is_finite() && self.reheat_boost >= 0.0) {
            return Err(ChromaError::config(format!(
                "reheat boost must be non-negative, got {}",
                self.reheat_boost
            )));
        }
        Ok(())
    }

    /// Temperature at `iteration` given `stagnant` iterations since the last strict
    /// improvement. Always at least `min_temp`.
    #[inline]
    pub fn temperature(&self, iteration: u64, stagnant: u64) -> f64 {
        let cooled = self.initial_temp * self.cooling_rate.powf(iteration as f64);
        let boost = if stagnant > self.reheat_after {
            self.reheat_boost
        } else {
            0.0
        };
        (cooled + boost).max(self.min_temp)
    }
}

// ============================================================================
// State changes and reports
// ============================================================================

/// A single-edge recolor that can be applied and reverted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateChange {
    /// First endpoint.
    pub i: usize,
    /// Second endpoint.
    pub j: usize,
    /// Color before the change.
    pub old_color: Color,
    /// Color after the change.
    pub new_color: Color,
}

impl StateChange {
    /// Sets the edge to `new_color`.
    #[inline]
    pub fn apply(&self, graph: &mut ColoredGraph) {
        graph.set_edge(self.i, self.j, self.new_color);
    }

    /// Restores the edge to `old_color`.
    #[inline]
    pub fn revert(&self, graph: &mut ColoredGraph) {
        graph.set_edge(self.i, self.j, self.old_color);
    }
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// The monochromatic count reached zero.
    Solved,
    /// The iteration budget ran out first.
    BudgetExhausted,
    /// Stopped early by the time limit or an external stop flag.
    Interrupted,
}

/// A new best energy and the iteration it was reached at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TracePoint {
    /// Iteration count when the energy was reached (0 = initial coloring).
    pub iteration: u64,
    /// Energy reached.
    pub energy: u64,
}

/// Summary of one annealing run.
#[derive(Clone, Debug)]
pub struct AnnealReport {
    /// How the run ended.
    pub phase: Phase,
    /// Seed the run's generator was created from.
    pub seed: u64,
    /// Iterations performed.
    pub iterations: u64,
    /// Energy of the starting coloring.
    pub initial_energy: u64,
    /// Energy of the coloring left in the graph.
    pub final_energy: u64,
    /// Lowest energy seen.
    pub best_energy: u64,
    /// Coloring with the lowest energy seen.
    pub best: ColoredGraph,
    /// Strictly decreasing sequence of best energies.
    pub trace: Vec<TracePoint>,
    /// Proposals kept.
    pub accepted: u64,
    /// Proposals reverted.
    pub rejected: u64,
    /// Temperature at the last iteration.
    pub final_temperature: f64,
}

impl AnnealReport {
    /// Returns `true` if the run found a coloring with no monochromatic target cliques.
    pub fn is_solved(&self) -> bool {
        self.phase == Phase::Solved
    }
}

// ============================================================================
// Annealer
// ============================================================================

/// Drives the search on one graph with its own seeded generator.
#[derive(Clone, Debug)]
pub struct Annealer {
    cfg: AnnealConfig,
    counter: CliqueCounter,
    scratch: EdgeScratch,
    rng: SmallRng,
    seed: u64,
}

impl Annealer {
    /// Creates an annealer seeded from `cfg.seed`, or from OS entropy if unset.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn new(cfg: AnnealConfig) -> Result<Self> {
        let seed = cfg.seed.unwrap_or_else(random_u64);
        Self::with_seed(cfg, seed)
    }

    /// Creates an annealer with an explicit seed (ignoring `cfg.seed`).
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid.
    pub fn with_seed(cfg: AnnealConfig, seed: u64) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            counter: CliqueCounter::new(cfg.strategy),
            scratch: EdgeScratch::default(),
            cfg,
            rng: SmallRng::seed_from_u64(seed),
            seed,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &AnnealConfig {
        &self.cfg
    }

    /// The seed this annealer's generator was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Anneals `graph` in place.
    ///
    /// # Errors
    /// See [`Annealer::run_until`].
    pub fn run(
        &mut self,
        graph: &mut ColoredGraph,
        targets: &ColorTargets,
    ) -> Result<AnnealReport> {
        self.run_until(graph, targets, &AtomicBool::new(false))
    }

    /// Anneals `graph` in place, stopping early once `stop` is set.
    ///
    /// On return `graph` holds the final coloring, which is the solution when the
    /// report's phase is [`Phase::Solved`].
    ///
    /// # Errors
    /// Fails before touching the graph if a target is invalid for it, the graph has
    /// no edges, or fewer than two colors are available for recoloring.
    pub fn run_until(
        &mut self,
        graph: &mut ColoredGraph,
        targets: &ColorTargets,
        stop: &AtomicBool,
    ) -> Result<AnnealReport> {
        targets.check_against(graph)?;
        let edges = graph.edges();
        if edges.is_empty() {
            return Err(ChromaError::NoEdges);
        }
        let palette = recolor_palette(graph, targets);
        if palette.len() < 2 {
            return Err(ChromaError::DegeneratePalette {
                colors: palette.len(),
            });
        }

        let start = Instant::now();
        let initial_energy = self.counter.count_unchecked(graph, targets).energy();
        info!(
            "annealing: n={} edges={} targets={} palette={:?} seed={} initial energy={}",
            graph.size(),
            edges.len(),
            targets.len(),
            palette,
            self.seed,
            initial_energy
        );

        let mut report = AnnealReport {
            phase: Phase::BudgetExhausted,
            seed: self.seed,
            iterations: 0,
            initial_energy,
            final_energy: initial_energy,
            best_energy: initial_energy,
            best: graph.clone(),
            trace: vec![TracePoint {
                iteration: 0,
                energy: initial_energy,
            }],
            accepted: 0,
            rejected: 0,
            final_temperature: self.cfg.temperature(0, 0),
        };
        if initial_energy == 0 {
            report.phase = Phase::Solved;
            return Ok(report);
        }

        let mut current = initial_energy;
        let mut stagnant = 0u64;
        for iter in 0..self.cfg.max_iterations {
            if stop.load(Ordering::Relaxed) || self.out_of_time(iter, start) {
                report.phase = Phase::Interrupted;
                break;
            }
            report.iterations = iter + 1;

            let temp = self.cfg.temperature(iter, stagnant);
            report.final_temperature = temp;
            if stagnant == self.cfg.reheat_after + 1 && self.cfg.reheat_boost > 0.0 {
                debug!("iter {iter}: stagnant for {stagnant} iterations, reheating to {temp:.4}");
            }

            let change = self.propose(graph, &edges, &palette);
            let new_energy = self.evaluate(graph, targets, &change, current);

            if new_energy == 0 {
                current = 0;
                report.accepted += 1;
                report.phase = Phase::Solved;
                record_best(&mut report, graph, iter + 1, current);
                break;
            }

            if new_energy < current {
                current = new_energy;
                stagnant = 0;
                report.accepted += 1;
            } else {
                stagnant += 1;
                if new_energy == current || accept_move(new_energy - current, temp, &mut self.rng) {
                    current = new_energy;
                    report.accepted += 1;
                } else {
                    change.revert(graph);
                    report.rejected += 1;
                }
            }

            if current < report.best_energy {
                record_best(&mut report, graph, iter + 1, current);
                debug!("iter {}: new best energy {current}", report.iterations);
            }

            if self.cfg.report_every > 0
                && report.iterations.is_multiple_of(self.cfg.report_every)
            {
                info!(
                    "iter {} | T {temp:.4} | E {current} | best {} | accepted {} | rejected {}",
                    report.iterations, report.best_energy, report.accepted, report.rejected
                );
            }
        }

        report.final_energy = current;
        info!(
            "annealing finished: {:?} after {} iterations in {:.2?}, energy {} (best {})",
            report.phase,
            report.iterations,
            start.elapsed(),
            report.final_energy,
            report.best_energy
        );
        Ok(report)
    }

    #[inline]
    fn out_of_time(&self, iter: u64, start: Instant) -> bool {
        match self.cfg.time_limit {
            Some(limit) => iter.is_multiple_of(64) && start.elapsed() >= limit,
            None => false,
        }
    }

    /// Picks a uniformly random existing edge and a uniformly random palette color
    /// different from its current one.
    ///
    /// `edges` must be non-empty and `palette` sorted with at least two colors.
    pub fn propose(
        &mut self,
        graph: &ColoredGraph,
        edges: &[(usize, usize)],
        palette: &[Color],
    ) -> StateChange {
        debug_assert!(!edges.is_empty() && palette.len() >= 2);
        let (i, j) = edges[self.rng.random_range(0..edges.len())];
        let old_color = graph.edge_ascending(i, j);
        let new_color = match palette.binary_search(&old_color) {
            Ok(pos) => {
                let r = self.rng.random_range(0..palette.len() - 1);
                if r >= pos { palette[r + 1] } else { palette[r] }
            }
            Err(_) => palette[self.rng.random_range(0..palette.len())],
        };
        StateChange {
            i,
            j,
            old_color,
            new_color,
        }
    }

    /// Applies `change` and returns the resulting energy.
    #[inline]
    fn evaluate(
        &mut self,
        graph: &mut ColoredGraph,
        targets: &ColorTargets,
        change: &StateChange,
        current: u64,
    ) -> u64 {
        if self.cfg.incremental {
            let (i, j) = (change.i, change.j);
            let before = self
                .counter
                .monochromatic_through_edge(graph, targets, i, j, &mut self.scratch);
            change.apply(graph);
            let after = self
                .counter
                .monochromatic_through_edge(graph, targets, i, j, &mut self.scratch);
            current - before + after
        } else {
            change.apply(graph);
            self.counter.count_unchecked(graph, targets).energy()
        }
    }
}

#[inline]
fn record_best(report: &mut AnnealReport, graph: &ColoredGraph, iteration: u64, energy: u64) {
    report.best_energy = energy;
    report.best = graph.clone();
    report.trace.push(TracePoint { iteration, energy });
}

/// Metropolis acceptance of an uphill move by `delta` at temperature `temp > 0`.
#[inline]
fn accept_move<R: Rng>(delta: u64, temp: f64, rng: &mut R) -> bool {
    debug_assert!(temp > 0.0);
    let prob = (-(delta as f64) / temp).exp();
    rng.random_bool(prob.clamp(0.0, 1.0))
}

/// Colors available for recoloring: the graph's palette plus every target color.
pub fn recolor_palette(graph: &ColoredGraph, targets: &ColorTargets) -> Vec<Color> {
    let mut palette = graph.palette();
    palette.extend(targets.colors());
    palette.sort_unstable();
    palette.dedup();
    palette
}

// ============================================================================
// Parallel restarts
// ============================================================================

/// Starting coloring for each restart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartStart {
    /// Every restart starts from the given coloring.
    #[default]
    Template,
    /// Every restart recolors the template's edges uniformly at random first.
    RandomColoring,
}

/// Reports of a batch of independent restarts.
#[derive(Clone, Debug)]
pub struct RestartOutcome {
    /// One report per restart, in restart order.
    pub reports: Vec<AnnealReport>,
    /// Index of the best report.
    pub best: usize,
}

impl RestartOutcome {
    /// The report with the lowest best energy (solved runs first).
    pub fn best_report(&self) -> &AnnealReport {
        &self.reports[self.best]
    }
}

/// Runs `restarts` independent searches on rayon.
///
/// Restart `r` owns a generator seeded with `splitmix64(base ^ r)`, where `base` is
/// `cfg.seed` or a random value. The first restart to solve stops the rest.
///
/// # Errors
/// Returns an error if `restarts` is zero, the configuration is invalid, or any
/// restart fails.
pub fn run_restarts(
    template: &ColoredGraph,
    targets: &ColorTargets,
    cfg: &AnnealConfig,
    restarts: usize,
    start: RestartStart,
) -> Result<RestartOutcome> {
    if restarts == 0 {
        return Err(ChromaError::config("at least one restart is required"));
    }
    cfg.validate()?;
    targets.check_against(template)?;

    let base_seed = cfg.seed.unwrap_or_else(random_u64);
    let solved = AtomicBool::new(false);
    let global_best = AtomicU64::new(u64::MAX);
    info!("starting {restarts} restarts (base seed {base_seed})");

    let reports = (0..restarts)
        .into_par_iter()
        .map(|id| {
            let seed = splitmix64(base_seed ^ id as u64);
            let mut annealer = Annealer::with_seed(cfg.clone(), seed)?;
            let mut graph = template.clone();
            if start == RestartStart::RandomColoring {
                let palette = recolor_palette(template, targets);
                if palette.is_empty() {
                    return Err(ChromaError::DegeneratePalette { colors: 0 });
                }
                let mut rng = SmallRng::seed_from_u64(splitmix64(seed));
                for (i, j) in template.edges() {
                    graph.set_edge(i, j, palette[rng.random_range(0..palette.len())]);
                }
            }

            let report = annealer.run_until(&mut graph, targets, &solved).inspect_err(|e| {
                warn!("restart {id} failed: {e}");
            })?;
            if report.is_solved() {
                solved.store(true, Ordering::Relaxed);
            }
            let old = global_best.fetch_min(report.best_energy, Ordering::Relaxed);
            if report.best_energy < old {
                info!("restart {id}: best energy so far {}", report.best_energy);
            }
            Ok(report)
        })
        .collect::<Result<Vec<_>>>()?;

    let best = reports
        .iter()
        .enumerate()
        .min_by_key(|(_, r)| (!r.is_solved(), r.best_energy))
        .map_or(0, |(idx, _)| idx);
    Ok(RestartOutcome { reports, best })
}

fn random_u64() -> u64 {
    rand::random::<u64>()
}

/// SplitMix64 mixer for deriving per-restart seeds from a base seed.
#[inline]
fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// ============================================================================
// Tests
// ============================================================================
