//! Command line driver: plays the reference games with the engine.

use std::fmt::Display;
use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use itertools::Itertools;
use plies::evaluation::Evaluator;
use plies::game::{Game, Outcome, Player};
use plies::games::breakthrough::{self, Breakthrough};
use plies::games::bridge::{self, Bridge, Lanes, Road, LANES};
use plies::games::tictactoe::{self, TicTacToe};
use plies::search::{Depth, SearchResult, MAX_DEPTH};
use plies::{Config, Searcher};

#[derive(Parser, Debug)]
#[command(author, version, about, long_version = plies::build::CLAP_LONG_VERSION)]
struct Args {
    /// Enable debug logging.
    #[arg(short, long)]
    debug: bool,

    /// Transposition table size in MiB.
    #[arg(long, default_value_t = 16)]
    hash_mb: usize,

    /// Time budget for each move in milliseconds.
    #[arg(long, default_value_t = 100)]
    move_time_ms: u64,

    /// Deepest iterative deepening layer.
    #[arg(long, default_value_t = MAX_DEPTH)]
    depth: Depth,

    /// Seed of the Zobrist keys.
    #[arg(long, default_value_t = Config::DEFAULT_SEED)]
    seed: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Plays a game against itself until it is over.
    Selfplay {
        #[arg(value_enum)]
        game: GameKind,
    },
    /// Solves the bridge puzzle.
    Bridge {
        /// One lane of the road: `.` for road, `0` for a hole. Pass exactly
        /// four, top lane first.
        #[arg(long = "lane", required = true)]
        lanes: Vec<String>,

        /// Number of bikes, placed on the top lanes.
        #[arg(long, default_value_t = 4)]
        bikes: u8,

        /// Number of bikes that have to make it across.
        #[arg(long, default_value_t = 1)]
        min_bikes: u8,

        /// Initial speed.
        #[arg(long, default_value_t = 0)]
        speed: u8,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GameKind {
    Tictactoe,
    Breakthrough,
}

impl Args {
    fn config(&self) -> anyhow::Result<Config> {
        let config = Config {
            hash_bytes: self
                .hash_mb
                .checked_mul(1 << 20)
                .context("transposition table size overflows")?,
            move_time: Duration::from_millis(self.move_time_ms),
            max_depth: self.depth,
            seed: self.seed,
        };
        config.validate().context("invalid engine configuration")?;
        Ok(config)
    }
}

fn init_logging(debug: bool) {
    let log_level = if debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .format(|buf, record| {
        writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args())
    })
    .target(env_logger::Target::Stderr)
    .init();
}

fn describe<A: Display>(result: &SearchResult<A>) -> String {
    format!(
        "score {} depth {} nodes {} pv {}",
        result.score,
        result.depth.unwrap_or_default(),
        result.nodes,
        result.pv.iter().join(" ")
    )
}

/// Plays until the game is over, printing one line per move. Returns the
/// final outcome for the player to move at that point and that player.
fn selfplay<G, E>(
    mut game: G,
    searcher: &mut Searcher<E>,
    to_move: impl Fn(&G) -> Player,
) -> anyhow::Result<(Outcome, Player)>
where
    G: Game,
    G::Action: Display,
    E: Evaluator<G>,
{
    let mut ply = 1;
    loop {
        if let Some(outcome) = game.outcome() {
            return Ok((outcome, to_move(&game)));
        }
        let player = to_move(&game);
        let result = searcher.search(&mut game);
        let Some(action) = result.best_move else {
            bail!("no move found in a running game");
        };
        println!("{ply}. {player} {action} {}", describe(&result));
        let _ = game.apply(action);
        ply += 1;
    }
}

fn run_selfplay(kind: GameKind, config: Config) -> anyhow::Result<()> {
    let seed = config.seed;
    let (outcome, player) = match kind {
        GameKind::Tictactoe => {
            let mut searcher = Searcher::new(config, tictactoe::evaluate)?;
            selfplay(TicTacToe::new(seed), &mut searcher, TicTacToe::to_move)?
        },
        GameKind::Breakthrough => {
            let mut searcher = Searcher::new(config, breakthrough::evaluate)?;
            selfplay(Breakthrough::new(seed), &mut searcher, Breakthrough::to_move)?
        },
    };
    let winner = match outcome {
        Outcome::Draw => {
            println!("result: draw");
            return Ok(());
        },
        Outcome::Win => player,
        Outcome::Loss => !player,
    };
    println!(
        "result: {} wins",
        match winner {
            Player::White => "white",
            Player::Black => "black",
        }
    );
    Ok(())
}

fn run_bridge(
    lanes: &[String],
    bikes: u8,
    min_bikes: u8,
    speed: u8,
    config: Config,
) -> anyhow::Result<()> {
    let road = Road::parse(lanes).context("invalid road")?;
    if usize::from(bikes) > LANES {
        bail!("there are only {LANES} lanes, got {bikes} bikes");
    }
    let squad = (0..usize::from(bikes)).fold(Lanes::empty(), |squad, lane| {
        squad | Lanes::lane(lane)
    });
    let mut game = Bridge::new(road, squad, speed, min_bikes, config.seed)?;
    let mut searcher = Searcher::new(config, bridge::evaluate)?;
    while game.outcome().is_none() {
        let result = searcher.search(&mut game);
        let Some(command) = result.best_move else {
            bail!("no command found for a running puzzle");
        };
        game.apply(command);
        println!("{command} {} {}", describe(&result), game);
    }
    match game.outcome() {
        Some(Outcome::Win) => println!("result: crossed with {} bikes", game.bikes().count()),
        _ => println!("result: failed"),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);
    plies::log_engine_info();
    let config = args.config()?;
    match args.command {
        Command::Selfplay { game } => run_selfplay(game, config),
        Command::Bridge {
            lanes,
            bikes,
            min_bikes,
            speed,
        } => run_bridge(&lanes, bikes, min_bikes, speed, config),
    }
}
