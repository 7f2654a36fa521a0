use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use advisor_2048::advisor::MoveAdvisor;
use advisor_2048::engine::{Board, Move};
use advisor_2048::expectimax::{Expectimax, SearchConfig};
use advisor_2048::insights::insights_with;
use advisor_2048::logging::init_logging;
use advisor_2048::protocol::handle_json;
use advisor_2048::session::{GameSession, RandomSpawns};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

#[derive(Debug, Parser)]
#[command(name = "advisor", about = "2048 move advisor")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,

    /// Search depth (overrides the config file)
    #[arg(long, global = true, allow_negative_numbers = true)]
    depth: Option<i64>,

    /// JSON file with search settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: Level,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Apply one move to a board and print the outcome as JSON
    Simulate {
        /// Board as a JSON array of four rows
        #[arg(long)]
        board: String,
        /// up, down, left or right
        #[arg(long)]
        direction: String,
    },
    /// Recommend a move with an explanation
    Recommend {
        #[arg(long)]
        board: String,
        /// Compare this move against the recommendation
        #[arg(long)]
        player_move: Option<String>,
    },
    /// Print coaching tips for a board
    Insights {
        #[arg(long)]
        board: String,
    },
    /// Answer JSON requests from stdin, one per line
    Serve {
        /// Seed for tiles spawned by move requests
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Let the advisor play a full game and print each board
    Play {
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Stop after this many moves
        #[arg(long)]
        max_moves: Option<u64>,
    },
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
    let advisor = MoveAdvisor::with_config(cfg);

    match args.cmd {
        Cmd::Simulate { board, direction } => {
            let board = parse_board(&board)?;
            let dir: Move = direction.parse()?;
            let out = board.simulate(dir);
            println!("{}", serde_json::to_string(&out)?);
        }
        Cmd::Recommend { board, player_move } => {
            let board = parse_board(&board)?;
            let player_move = player_move.map(|m| m.parse::<Move>()).transpose()?;
            let rec = advisor.recommend_with_coaching(board, depth, player_move)?;
            println!("{board}");
            match rec.best_move {
                Some(best) => println!("Best move: {best}"),
                None => println!("Best move: none"),
            }
            for (dir, ev) in &rec.scores {
                println!("  {dir:>5}: {ev:.2}");
            }
            println!("{}", rec.explanation);
            if let Some(coaching) = rec.coaching {
                println!("{coaching}");
            }
        }
        Cmd::Insights { board } => {
            let board = parse_board(&board)?;
            for tip in insights_with(&advisor, board, depth)? {
                println!("{tip}");
            }
        }
        Cmd::Serve { seed } => serve(&advisor, seed)?,
        Cmd::Play { seed, max_moves } => play(&advisor, depth, seed, max_moves)?,
    }
    Ok(())
}

fn parse_board(text: &str) -> Result<Board> {
    let rows: Vec<Vec<i64>> = serde_json::from_str(text).with_context(|| format!("board is not a JSON grid: {text}"))?;
    Ok(Board::try_from_rows(&rows)?)
}

fn serve(advisor: &MoveAdvisor<Expectimax>, seed: Option<u64>) -> Result<()> {
    let mut spawns = match seed {
        Some(seed) => RandomSpawns::seeded(seed),
        None => RandomSpawns::from_entropy(),
    };
    info!("serving requests on stdin");
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("reading request")?;
        if line.trim().is_empty() {
            continue;
        }
        writeln!(stdout, "{}", handle_json(&line, advisor, &mut spawns))?;
        stdout.flush()?;
    }
    Ok(())
}

fn play(advisor: &MoveAdvisor<Expectimax>, depth: i64, seed: u64, max_moves: Option<u64>) -> Result<()> {
    let mut game = GameSession::new(RandomSpawns::seeded(seed));
    let valuer = Expectimax::with_config(advisor.config().clone());
    let value_depth = advisor.config().resolve_depth(depth)?;
    println!("{}", game.board());
    let mut move_count: u64 = 0;
    while !game.is_game_over() {
        if max_moves.is_some_and(|limit| move_count >= limit) {
            break;
        }
        let rec = advisor.recommend(game.board(), depth)?;
        let Some(dir) = rec.best_move else { break };
        let report = game.play(dir);
        if !report.outcome.valid {
            bail!("advisor picked a no-op move {dir} on\n{}", game.board());
        }
        move_count += 1;
        println!(
            "{dir} (+{}, position value {:.2})\n{}",
            report.outcome.gained,
            valuer.state_value(game.board(), value_depth),
            game.board()
        );
    }
    println!(
        "Moves made: {}, Score: {}, Highest tile: {}",
        move_count,
        game.score(),
        game.board().highest_tile()
    );
    Ok(())
}
