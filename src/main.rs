//! Move generator front end
//!
//! Usage: movegen perft 4 startpos 197281
//!        movegen perftd 3 "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"
//!        movegen speed 5 startpos -j 8
//!        movegen test
//!        movegen            (interactive shell)

use std::io::{self, BufRead, Write};
use std::time::Instant;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result, WrapErr};
use log::{debug, info};

use chess_movegen::bitboard::draw;
use chess_movegen::game::Game;
use chess_movegen::movegen::MoveGenerator;
use chess_movegen::perft;
use chess_movegen::tables::{self, Tables};

#[derive(Parser, Debug)]
#[command(name = "movegen")]
#[command(about = "Bitboard chess move generator and perft driver", version)]
struct Cli {
    /// Log table construction and applied moves
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count leaf nodes, optionally checking against an expected count
    Perft {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        depth: u32,
        /// FEN string or "startpos"
        position: String,
        expected: Option<u64>,
        /// Split root moves across this many threads
        #[arg(short = 'j', long)]
        threads: Option<usize>,
    },
    /// Node count below each root move
    Perftd {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        depth: u32,
        /// FEN string or "startpos"
        position: String,
    },
    /// Time a perft run
    Speed {
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        depth: u32,
        /// FEN string or "startpos"
        position: String,
        /// Split root moves across this many threads
        #[arg(short = 'j', long)]
        threads: Option<usize>,
    },
    /// Run the built-in reference positions
    Test {
        /// Skip entries whose expected count is larger than this
        #[arg(long, default_value_t = 5_000_000)]
        max_nodes: u64,
    },
    /// Interactive command loop (default)
    Shell,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let tables = tables::init().wrap_err("building attack tables")?;

    match cli.command.unwrap_or(Command::Shell) {
        Command::Perft {
            depth,
            position,
            expected,
            threads,
        } => run_perft(tables, depth, &position, expected, threads),
        Command::Perftd { depth, position } => {
            let mut game = Game::from_fen(tables, &position)?;
            let stdout = io::stdout();
            game.perft_detail(depth, &mut stdout.lock())?;
            Ok(())
        }
        Command::Speed {
            depth,
            position,
            threads,
        } => run_speed(tables, depth, &position, threads),
        Command::Test { max_nodes } => run_suite(tables, max_nodes),
        Command::Shell => run_shell(tables),
    }
}

fn configure_threads(threads: Option<usize>) -> Result<()> {
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .wrap_err("configuring thread pool")?;
        info!("perft split across {} threads", n);
    }
    Ok(())
}

fn count_nodes(game: &mut Game, depth: u32, parallel: bool) -> u64 {
    if parallel {
        game.perft_parallel(depth)
    } else {
        game.perft(depth)
    }
}

fn run_perft(
    tables: &Tables,
    depth: u32,
    position: &str,
    expected: Option<u64>,
    threads: Option<usize>,
) -> Result<()> {
    configure_threads(threads)?;
    let mut game = Game::from_fen(tables, position)?;
    let nodes = count_nodes(&mut game, depth, threads.is_some());

    match expected {
        None => println!("{}", nodes),
        Some(expected) if expected == nodes => println!("passed: {}", nodes),
        Some(expected) => {
            println!(
                "failed: {:<10}{:<10}{:<10}input: perft {} {} {}",
                expected, nodes, " ", depth, position, expected
            );
            std::process::exit(1);
        }
    }
    Ok(())
}

fn run_speed(tables: &Tables, depth: u32, position: &str, threads: Option<usize>) -> Result<()> {
    configure_threads(threads)?;
    let mut game = Game::from_fen(tables, position)?;

    let start = Instant::now();
    let nodes = count_nodes(&mut game, depth, threads.is_some());
    let elapsed_ms = start.elapsed().as_millis().max(1) as u64;

    println!(
        "{} nodes in {}ms ({}nps)",
        nodes,
        elapsed_ms,
        nodes * 1000 / elapsed_ms
    );
    Ok(())
}

fn run_suite(tables: &Tables, max_nodes: u64) -> Result<()> {
    let gen = MoveGenerator::new(tables);
    let start = Instant::now();
    let results = perft::run_suite(&gen, max_nodes)?;

    for result in &results {
        println!("{}", result);
    }
    let failed = results.iter().filter(|r| !r.passed()).count();
    println!(
        "\n{} of {} passed in {:.2}s",
        results.len() - failed,
        results.len(),
        start.elapsed().as_secs_f64()
    );

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

const SHELL_HELP: &str = "\
commands:
  position <fen|startpos> [moves <m>...]   set up a position
  move <m>                                 play a move (e2e4, e7e8q)
  undo <m>                                 take back the last move
  perft <depth>                            count leaf nodes
  perftd <depth>                           count leaf nodes per root move
  moves                                    list legal moves
  attacks                                  squares attacked by the side not to move
  d                                        draw the board
  help                                     show this text
  quit                                     leave";

fn run_shell(tables: &Tables) -> Result<()> {
    let mut game = Game::new(tables);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    println!("chess move generator, try 'help' if you are lost");

    for line in stdin.lock().lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        debug!("shell: {}", line);

        match tokens[0] {
            "quit" | "exit" => break,
            "help" => println!("{}", SHELL_HELP),
            "d" => {
                print!("{}", game.board());
                println!("fen: {}", game.fen());
                println!("hash: {:016x}", game.hash());
                if game.is_check() {
                    println!("in check");
                }
            }
            "position" => match setup_position(tables, &tokens[1..]) {
                Ok(new_game) => game = new_game,
                Err(e) => println!("{}", e),
            },
            "move" => {
                for text in &tokens[1..] {
                    if let Err(e) = game.make_move(text) {
                        println!("{}", e);
                        break;
                    }
                }
            }
            "undo" => match tokens.get(1) {
                Some(text) => {
                    if let Err(e) = game.unmake_move(text) {
                        println!("{}", e);
                    }
                }
                None => println!("usage: undo <move>"),
            },
            "attacks" => {
                let enemy = game.board().side_to_move().other();
                let attacks = game.generator().generate_attacks(enemy, game.board());
                print!("{}", draw(attacks));
            }
            "moves" => {
                let moves = game.legal_moves();
                let names: Vec<String> = moves.iter().map(|m| m.to_string()).collect();
                println!("{} legal: {}", names.len(), names.join(" "));
            }
            "perft" => match parse_depth(tokens.get(1)) {
                Ok(depth) => {
                    let start = Instant::now();
                    let nodes = game.perft(depth);
                    println!("{} ({:.3}s)", nodes, start.elapsed().as_secs_f64());
                }
                Err(e) => println!("{}", e),
            },
            "perftd" => match parse_depth(tokens.get(1)) {
                Ok(depth) => {
                    game.perft_detail(depth, &mut stdout.lock())?;
                }
                Err(e) => println!("{}", e),
            },
            other => println!("unknown command '{}', try 'help'", other),
        }
        stdout.flush()?;
    }
    Ok(())
}

/// `<fen fields...|startpos> [moves <m>...]`, with an optional leading `fen`
fn setup_position<'t>(tables: &'t Tables, args: &[&str]) -> Result<Game<'t>> {
    let args = match args.first() {
        Some(&"fen") => &args[1..],
        _ => args,
    };
    let split = args.iter().position(|&t| t == "moves").unwrap_or(args.len());
    let (fen, moves) = args.split_at(split);
    if fen.is_empty() {
        return Err(eyre!("usage: position <fen|startpos> [moves <m>...]"));
    }

    let mut game = Game::from_fen(tables, &fen.join(" "))?;
    for text in moves.iter().skip(1) {
        game.make_move(text)?;
    }
    Ok(game)
}

fn parse_depth(token: Option<&&str>) -> Result<u32> {
    let token = token.ok_or_else(|| eyre!("'depth' is missing"))?;
    match token.parse::<u32>() {
        Ok(depth) if depth > 0 => Ok(depth),
        _ => Err(eyre!("'depth' must be a positive number, got '{}'", token)),
    }
}
