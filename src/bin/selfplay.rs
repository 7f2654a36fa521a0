use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Instant;

use advisor_2048::advisor::MoveAdvisor;
use advisor_2048::expectimax::{ExpectimaxParallel, SearchConfig};
use advisor_2048::logging::init_logging;
use advisor_2048::session::{GameSession, RandomSpawns};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, Level};

#[derive(Debug, Parser)]
#[command(name = "selfplay", about = "Play seeded 2048 games with the parallel advisor")]
struct Args {
    /// Number of games
    #[arg(long, default_value_t = 10)]
    games: u64,

    /// Seed of the first game; game i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Search depth (overrides the config file)
    #[arg(long)]
    depth: Option<i64>,

    /// JSON file with search settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-game: stop after this many moves
    #[arg(long)]
    steps: Option<u64>,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,

    #[arg(long, default_value = "warn")]
    log_level: Level,
}

#[derive(Debug, Clone, Copy)]
struct GameResult {
    moves: u64,
    score: u64,
    highest_tile: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level);

    let cfg = match &args.config {
        Some(path) => SearchConfig::from_json_path(path)
            .with_context(|| format!("loading search config from {}", path.display()))?,
        None => SearchConfig::default(),
    };
    let depth = args.depth.unwrap_or(cfg.depth as i64);
    let advisor = MoveAdvisor::with_policy(ExpectimaxParallel::with_config(cfg));

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.games);
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} [{bar:30}] {pos}/{len} games | {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃")
                .progress_chars("=> "),
        );
        pb
    };

    let start = Instant::now();
    let mut results = Vec::with_capacity(args.games as usize);
    for i in 0..args.games {
        let seed = args.seed.wrapping_add(i);
        let result = run_game(&advisor, depth, seed, args.steps)?;
        debug!(seed, moves = result.moves, score = result.score, highest = result.highest_tile, "game finished");
        pb.set_message(format!("last score: {}", result.score));
        pb.inc(1);
        results.push(result);
    }
    pb.finish_and_clear();

    print_summary(&results, start.elapsed().as_secs_f64().max(1e-6));
    Ok(())
}

fn run_game(
    advisor: &MoveAdvisor<ExpectimaxParallel>,
    depth: i64,
    seed: u64,
    steps: Option<u64>,
) -> Result<GameResult> {
    let mut game = GameSession::new(RandomSpawns::seeded(seed));
    let mut moves: u64 = 0;
    while !game.is_game_over() {
        if steps.is_some_and(|limit| moves >= limit) {
            break;
        }
        let Some(dir) = advisor.recommend(game.board(), depth)?.best_move else { break };
        game.play(dir);
        moves += 1;
    }
    Ok(GameResult { moves, score: game.score(), highest_tile: game.board().highest_tile() })
}

fn print_summary(results: &[GameResult], elapsed: f64) {
    if results.is_empty() {
        println!("No games played.");
        return;
    }
    let n = results.len() as f64;
    let total_moves: u64 = results.iter().map(|r| r.moves).sum();
    let mean_score = results.iter().map(|r| r.score as f64).sum::<f64>() / n;
    let best_score = results.iter().map(|r| r.score).max().unwrap_or(0);

    let mut tiles: BTreeMap<u32, usize> = BTreeMap::new();
    for r in results {
        *tiles.entry(r.highest_tile).or_default() += 1;
    }

    println!(
        "Games: {} | moves: {} | moves/sec: {:.1} | mean score: {:.1} | best score: {}",
        results.len(),
        total_moves,
        total_moves as f64 / elapsed,
        mean_score,
        best_score
    );
    println!("Highest tile reached:");
    for (tile, count) in tiles.iter().rev() {
        println!("  {:>6}: {:>4} ({:.1}%)", tile, count, 100.0 * *count as f64 / n);
    }
}
