use alba_core::{debug, log::init_logger};
use clap::Parser;

mod cli;

use cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.logdir.as_deref(), &cli.loglevel)?;

    let params = cli.bridge_params()?;
    debug!("running {:?} with {:?}", cli.command, params);
    let output = cli.command.run(params)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
