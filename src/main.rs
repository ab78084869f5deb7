use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use flexi_logger::Logger;
use pilot_2048::engine::Board;
use pilot_2048::expectimax::{start_search, EngineConfig};
use pilot_2048::pilot::Pilot;
use rand::{rngs::StdRng, SeedableRng};

#[derive(Parser, Debug)]
#[command(name = "pilot-2048", about = "Budgeted expectimax move picker for 2048")]
struct Cli {
    #[command(flatten)]
    limits: Limits,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Args, Debug)]
struct Limits {
    /// JSON file with `node_budget`, `depth_ceiling`, `initial_depth`
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Recursive calls allowed per search pass
    #[arg(long, global = true)]
    node_budget: Option<u64>,
    /// Deepest pass the driver will start
    #[arg(long, global = true)]
    depth_ceiling: Option<u32>,
    /// Depth of the first pass
    #[arg(long, global = true)]
    initial_depth: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Pick a move for one board
    Decide {
        /// 16 comma-separated tile values (0 = empty)
        cells: String,
        /// Cells are listed column by column
        #[arg(long, default_value_t = false)]
        column_major: bool,
    },
    /// Self-play a simulated game
    Play {
        /// RNG seed (random if absent)
        #[arg(long)]
        seed: Option<u64>,
        /// Stop after this many moves
        #[arg(long)]
        max_moves: Option<u64>,
        /// Do not print boards
        #[arg(long, default_value_t = false)]
        quiet: bool,
    },
}

impl Limits {
    fn resolve(&self) -> anyhow::Result<EngineConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
            }
            None => EngineConfig::default(),
        };
        if let Some(v) = self.node_budget { cfg.node_budget = v; }
        if let Some(v) = self.depth_ceiling { cfg.depth_ceiling = v; }
        if let Some(v) = self.initial_depth { cfg.initial_depth = v; }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_cells(raw: &str) -> anyhow::Result<Vec<u32>> {
    raw.split(',')
        .map(|s| s.trim().parse::<u32>().with_context(|| format!("bad tile value '{}'", s.trim())))
        .collect()
}

fn main() -> anyhow::Result<()> {
    let _logger = Logger::try_with_env_or_str("info")?
        .format(flexi_logger::colored_default_format)
        .start()?;

    let cli = Cli::parse();
    let cfg = cli.limits.resolve()?;

    match cli.cmd {
        Cmd::Decide { cells, column_major } => {
            let cells = parse_cells(&cells)?;
            let board = if column_major { Board::from_column_major(&cells)? } else { Board::from_cells(&cells)? };
            let decision = start_search(board, &cfg);
            match decision.chosen {
                Some(dir) => println!("{} ({})", dir, dir.arrow_key()),
                None => println!("noop"),
            }
            log::info!("depth {} after {} passes, {} nodes", decision.depth, decision.passes.len(), decision.total_nodes());
        }
        Cmd::Play { seed, max_moves, quiet } => {
            let seed = seed.unwrap_or_else(rand::random);
            log::info!("seed {}", seed);
            let mut pilot = Pilot::new(cfg, StdRng::seed_from_u64(seed));
            let summary = pilot.play(max_moves, |board, dir| {
                if !quiet {
                    println!("{}\n{}", dir, board);
                }
            });
            println!(
                "Moves made: {}, Score: {}, Highest tile: {}, Substitutions: {}",
                summary.moves, summary.score, summary.highest_tile, summary.substitutions
            );
        }
    }
    Ok(())
}
