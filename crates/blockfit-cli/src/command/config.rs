use std::path::PathBuf;

use blockfit_engine::SessionConfig;

use crate::util::Output;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ConfigArg) -> anyhow::Result<()> {
    let ConfigArg { output } = arg;
    Output::save_json(&SessionConfig::default(), output.clone())
}
