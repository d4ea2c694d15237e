#![forbid(unsafe_code)]
#![deny(clippy::mem_forget)]

use anyhow::Context;
use clap::Parser;
use pfx2cer::cli::Opt;
use pfx2cer::command::BuildCommand;
use pfx2cer::config::Pfx2CerConfig;
use pfx2cer::logging::initialise_tracing_subscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = Opt::parse();
    initialise_tracing_subscriber(opt.debug);

    let config = Pfx2CerConfig::load(opt.config_file.as_deref())
        .context("loading the pfx2cer configuration")?;

    let cmd = opt.cmd.build_command(&config);
    cmd.execute()
        .await
        .with_context(|| format!("failed to {}", cmd.description()))
}
