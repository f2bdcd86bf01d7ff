mod agent;
mod command;
mod events;
mod record;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
