use anyhow::{Context, Result, bail};
use chroma::prelude::*;
use clap::Parser;
use log::info;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::io::{self, Write};
use std::path::PathBuf;

/// Simulated-annealing search for multicolor Ramsey colorings.
///
/// GRAPH is either a coloring file or a bare vertex count. A vertex count builds a
/// random complete coloring with colors 1..=m, where m is the number of clique
/// sizes given. Clique sizes are assigned to the graph's colors in ascending order.
#[derive(Parser, Debug)]
#[command(name = "chroma")]
#[command(version)]
struct Cli {
    /// Coloring file, or a vertex count for a random complete coloring.
    #[arg(required_unless_present = "validate")]
    graph: Option<String>,

    /// Target clique size for each color, in ascending color order.
    #[arg(required_unless_present = "validate")]
    sizes: Vec<usize>,

    /// Iteration budget per restart.
    #[arg(long, default_value_t = 1_000_000)]
    iterations: u64,

    /// Deterministic base seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Starting temperature.
    #[arg(long, default_value_t = 5.0)]
    initial_temp: f64,

    /// Per-iteration cooling factor in (0, 1].
    #[arg(long, default_value_t = 0.9999)]
    cooling_rate: f64,

    /// Stagnant iterations before the reheat boost applies.
    #[arg(long, default_value_t = 10_000)]
    reheat_after: u64,

    /// Temperature added while stagnant.
    #[arg(long, default_value_t = 1.0)]
    reheat_boost: f64,

    /// Independent restarts to run in parallel.
    #[arg(long, default_value_t = 1)]
    restarts: usize,

    /// Count each target color on the calling thread.
    #[arg(long)]
    sequential: bool,

    /// Recount every clique on each iteration instead of only those through the changed edge.
    #[arg(long)]
    full_recount: bool,

    /// Write the best coloring to this file.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Validate the bundled witness colorings and exit.
    #[arg(long, alias = "test")]
    validate: bool,
}

impl Cli {
    fn anneal_config(&self) -> AnnealConfig {
        AnnealConfig {
            max_iterations: self.iterations,
            initial_temp: self.initial_temp,
            cooling_rate: self.cooling_rate,
            reheat_after: self.reheat_after,
            reheat_boost: self.reheat_boost,
            seed: self.seed,
            incremental: !self.full_recount,
            strategy: if self.sequential {
                CountStrategy::Sequential
            } else {
                CountStrategy::Parallel
            },
            ..AnnealConfig::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.validate {
        match validate_known_colorings() {
            Ok(()) => {
                println!("Validation OK: bundled witness colorings are correct.");
                return Ok(());
            }
            Err(e) => {
                eprintln!("Validation FAILED: {e}");
                std::process::exit(1);
            }
        }
    }

    let Some(source) = cli.graph.as_deref() else {
        bail!("a graph file or vertex count is required");
    };
    let (graph, palette) = load_graph(source, cli.sizes.len(), cli.seed)?;
    let targets = map_targets(&palette, &cli.sizes)?;
    let cfg = cli.anneal_config();

    let outcome = run_restarts(&graph, &targets, &cfg, cli.restarts, RestartStart::Template)
        .context("search failed")?;
    let report = outcome.best_report();
    info!(
        "best restart {} of {}: {:?}, best energy {}",
        outcome.best + 1,
        outcome.reports.len(),
        report.phase,
        report.best_energy
    );

    let count = CliqueCounter::new(cfg.strategy).count(&report.best, &targets)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{count}")?;
    writeln!(out)?;
    report.best.write_to(&mut out)?;
    out.flush()?;

    if let Some(path) = &cli.output {
        report
            .best
            .save_to_file(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote best coloring to {}", path.display());
    }
    Ok(())
}

/// Loads a coloring file, or builds a random complete coloring when `source` is a
/// bare vertex count. Returns the graph and the colors clique sizes map onto.
fn load_graph(
    source: &str,
    colors: usize,
    seed: Option<u64>,
) -> Result<(ColoredGraph, Vec<Color>)> {
    if let Ok(n) = source.parse::<usize>() {
        let palette: Vec<Color> = (1..=colors as Color).collect();
        let mut rng = SmallRng::seed_from_u64(seed.unwrap_or_else(rand::random));
        let graph = ColoredGraph::random_complete(n, &palette, 0, &mut rng)
            .context("cannot build a random coloring")?;
        info!("generated random {colors}-coloring of K{n}");
        return Ok((graph, palette));
    }
    let graph = ColoredGraph::load_from_file(source)
        .with_context(|| format!("failed to load graph from {source}"))?;
    info!("loaded {}-vertex graph from {source}", graph.size());
    let palette = graph.palette();
    Ok((graph, palette))
}

/// Assigns clique sizes to palette colors in ascending order.
fn map_targets(palette: &[Color], sizes: &[usize]) -> Result<ColorTargets> {
    if palette.len() != sizes.len() {
        bail!(
            "graph uses {} color(s) {:?} but {} clique size(s) were given",
            palette.len(),
            palette,
            sizes.len()
        );
    }
    let targets = ColorTargets::from_pairs(palette.iter().copied().zip(sizes.iter().copied()))?;
    Ok(targets)
}
