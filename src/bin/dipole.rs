use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rust_dipole::core::{Move, MoveOp, PlayerId, ReplayMode};
use rust_dipole::games::dipole::DipoleBoard;
use rust_dipole::robot::{RobotAlgorithm, RobotConfig, RobotDriver};
use rust_dipole::session::Session;

#[derive(Debug, Parser)]
#[command(name = "dipole", about = "Dipole self-play and replay checker")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Let two robots play a game and print the transcript
    SelfPlay {
        /// Session init string
        #[arg(long, default_value = "dipole 2 734687 1")]
        init: String,
        /// Robot for P0: mcts or alphabeta
        #[arg(long, default_value = "mcts")]
        white: RobotAlgorithm,
        /// Robot for P1: mcts or alphabeta
        #[arg(long, default_value = "alphabeta")]
        black: RobotAlgorithm,
        /// MCTS iterations per move
        #[arg(long, default_value_t = 2000)]
        iterations: u32,
        /// Alpha-beta depth limit
        #[arg(long, default_value_t = 4)]
        depth: u32,
        /// Search workers per robot
        #[arg(long, default_value_t = 1)]
        workers: usize,
        /// Wall-clock limit per move in milliseconds
        #[arg(long)]
        move_ms: Option<u64>,
        /// Stop after this many logged moves
        #[arg(long, default_value_t = 1000)]
        max_moves: usize,
        /// Write the transcript to this path
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replay a transcript and check it against a digest
    Replay {
        /// Session init string
        #[arg(long, default_value = "dipole 2 734687 1")]
        init: String,
        /// Transcript file, one move per line
        log: PathBuf,
        /// Expected final digest (hex)
        #[arg(long)]
        digest: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match Args::parse().cmd {
        Cmd::SelfPlay {
            init,
            white,
            black,
            iterations,
            depth,
            workers,
            move_ms,
            max_moves,
            out,
        } => {
            let base = RobotConfig::default()
                .with_iterations(iterations)
                .with_max_depth(depth)
                .with_workers(workers);
            let base = match move_ms {
                Some(ms) => base.with_time_limit(Duration::from_millis(ms)),
                None => base,
            };
            self_play(
                &init,
                [base.clone().with_algorithm(white), base.with_algorithm(black)],
                max_moves,
                out,
            )
        }
        Cmd::Replay { init, log, digest } => replay(&init, &log, digest.as_deref()),
    }
}

fn self_play(
    init: &str,
    configs: [RobotConfig; 2],
    max_moves: usize,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut session = Session::from_init_str(init)?;
    let mut robots = configs.map(RobotDriver::<DipoleBoard>::new);
    let start = Instant::now();

    session.apply(Move::simple(MoveOp::Start, PlayerId::new(0)), ReplayMode::Live)?;
    while !session.is_over() && session.log().len() < max_moves {
        let player = session.whose_turn();
        let played = session.robot_turn(&mut robots[player.index()])?;
        match played {
            Some(mv) => info!(%mv, digest = session.digest(), "played"),
            None => break,
        }
    }

    let digest = session.verify_replay()?;
    let transcript = session.transcript().join("\n");
    match out {
        Some(path) => fs::write(&path, transcript + "\n")
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{transcript}"),
    }
    println!(
        "result: {} | moves: {} | digest: {digest:016x} | {:.1}s",
        session
            .result()
            .map_or_else(|| "unfinished".to_string(), ToString::to_string),
        session.log().len(),
        start.elapsed().as_secs_f64(),
    );
    Ok(())
}

fn replay(init: &str, log: &PathBuf, expected: Option<&str>) -> anyhow::Result<()> {
    let text = fs::read_to_string(log).with_context(|| format!("reading {}", log.display()))?;
    let session = Session::replay(init, text.lines())?;
    let digest = session.verify_replay()?;

    if let Some(expected) = expected {
        let expected = u64::from_str_radix(expected.trim_start_matches("0x"), 16)
            .with_context(|| format!("bad digest '{expected}'"))?;
        if expected != digest {
            bail!("digest {digest:016x} does not match expected {expected:016x}");
        }
    }
    println!(
        "moves: {} | phase: {} | digest: {digest:016x}",
        session.log().len(),
        session.phase()
    );
    Ok(())
}
