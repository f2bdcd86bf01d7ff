use clap::{Parser, Subcommand};

use self::{config::ConfigArg, replay::ReplayArg, simulate::SimulateArg};

mod config;
mod replay;
mod simulate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Play sessions with a random agent and report the results
    Simulate(#[clap(flatten)] SimulateArg),
    /// Replay a recorded session and verify its final state
    Replay(#[clap(flatten)] ReplayArg),
    /// Print the default session configuration
    Config(#[clap(flatten)] ConfigArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode.unwrap_or(Mode::Simulate(SimulateArg::default())) {
        Mode::Simulate(arg) => simulate::run(&arg)?,
        Mode::Replay(arg) => replay::run(&arg)?,
        Mode::Config(arg) => config::run(&arg)?,
    }
    Ok(())
}
