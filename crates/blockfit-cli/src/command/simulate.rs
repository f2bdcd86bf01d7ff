use std::path::PathBuf;

use blockfit_engine::{SessionConfig, SpawnSeed};
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::{
    agent::RandomAgent,
    events::{EventCounts, EventLogger},
    record::RecordingSession,
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulateArg {
    /// Number of games to play
    #[arg(long, default_value_t = 10)]
    games: usize,
    /// Maximum number of turns per game
    #[arg(long, default_value_t = 1000)]
    max_turns: usize,
    /// Session configuration file (JSON); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for game and agent randomness; random when omitted
    #[arg(long)]
    agent_seed: Option<u64>,
    /// Directory to save game recordings to
    #[arg(long)]
    record_dir: Option<PathBuf>,
    /// Print every game event to stderr
    #[arg(long)]
    verbose: bool,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Default for SimulateArg {
    fn default() -> Self {
        Self {
            games: 10,
            max_turns: 1000,
            config: None,
            agent_seed: None,
            record_dir: None,
            verbose: false,
            output: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct SimulationReport {
    games: Vec<GameReport>,
    summary: Summary,
}

#[derive(Debug, Clone, Serialize)]
struct GameReport {
    game: usize,
    seed: SpawnSeed,
    score: usize,
    placed_shapes: usize,
    total_cleared_lines: usize,
    line_cleared_counter: Vec<usize>,
    game_over: bool,
    events: EventCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    recording: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct Summary {
    games: usize,
    finished_games: usize,
    min_score: usize,
    max_score: usize,
    mean_score: f64,
    mean_placed_shapes: f64,
}

impl Summary {
    #[expect(clippy::cast_precision_loss)]
    fn from_games(games: &[GameReport]) -> Self {
        if games.is_empty() {
            return Self::default();
        }
        let n = games.len() as f64;
        let total_score: usize = games.iter().map(|g| g.score).sum();
        let total_placed: usize = games.iter().map(|g| g.placed_shapes).sum();
        Self {
            games: games.len(),
            finished_games: games.iter().filter(|g| g.game_over).count(),
            min_score: games.iter().map(|g| g.score).min().unwrap_or(0),
            max_score: games.iter().map(|g| g.score).max().unwrap_or(0),
            mean_score: total_score as f64 / n,
            mean_placed_shapes: total_placed as f64 / n,
        }
    }
}

pub(crate) fn run(arg: &SimulateArg) -> anyhow::Result<()> {
    let SimulateArg {
        games,
        max_turns,
        config,
        agent_seed,
        record_dir,
        verbose,
        output,
    } = arg;

    let config = util::read_config_file(config.as_deref())?;
    let mut rng = match agent_seed {
        Some(seed) => Pcg32::seed_from_u64(*seed),
        None => Pcg32::from_rng(&mut rand::rng()),
    };

    eprintln!(
        "Simulating {games} games on a {}x{} board ({} shapes in catalog)",
        config.board_width,
        config.board_height,
        config.catalog.len()
    );

    let mut reports = Vec::with_capacity(*games);
    for game in 0..*games {
        let seed: SpawnSeed = rng.random();
        let agent = RandomAgent::new(rng.random());
        let (mut report, session) = play_game(game, &config, seed, agent, *max_turns, *verbose)?;
        if let Some(record_dir) = record_dir {
            let (recording, _) = session.into_recording();
            let path = recording.save(record_dir, &format!("game{game:04}"))?;
            eprintln!("  Saved recording to {}", path.display());
            report.recording = Some(path);
        }
        eprintln!(
            "Game {game}: score {}, {} shapes placed, {} lines cleared{}",
            report.score,
            report.placed_shapes,
            report.total_cleared_lines,
            if report.game_over { "" } else { " (turn limit)" }
        );
        reports.push(report);
    }

    let summary = Summary::from_games(&reports);
    eprintln!(
        "Finished {} of {} games, score min {} / mean {:.1} / max {}",
        summary.finished_games,
        summary.games,
        summary.min_score,
        summary.mean_score,
        summary.max_score
    );

    Output::save_json(
        &SimulationReport {
            games: reports,
            summary,
        },
        output.clone(),
    )
}

fn play_game(
    game: usize,
    config: &SessionConfig,
    seed: SpawnSeed,
    mut agent: RandomAgent,
    max_turns: usize,
    verbose: bool,
) -> anyhow::Result<(GameReport, RecordingSession)> {
    let logger = EventLogger::new(format!("game {game}"), verbose);
    let mut session = RecordingSession::with_seed(config.clone(), seed, logger)?;
    for _ in 0..max_turns {
        if agent.play_turn(&mut session)?.is_none() {
            break;
        }
    }

    let score = session.score();
    let report = GameReport {
        game,
        seed,
        score: score.score(),
        placed_shapes: score.placed_shapes(),
        total_cleared_lines: score.total_cleared_lines(),
        line_cleared_counter: score.line_cleared_counter().to_vec(),
        game_over: session.is_game_over(),
        events: session.sink().counts(),
        recording: None,
    };
    Ok((report, session))
}
