mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    jenkins_pulse::output::print_banner();

    let cli = Cli::parse();
    info!("Starting jenkins-pulse");
    cli.execute().await?;

    Ok(())
}
