mod cli;
mod commands;

use anyhow::Result;
use choirconfig::{get_config, Config};
use clap::Parser;
use cli::{Cli, Commands};
use commands::App;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &Config, verbose: bool) -> Result<()> {
    if !verbose && !config.get_log_enable_console()? {
        return Ok(());
    }

    let level = if verbose {
        "debug".to_string()
    } else {
        config.get_log_min_level()?.to_lowercase()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config_dir {
        Some(dir) => Arc::new(Config::load_config(dir)?),
        None => get_config(),
    };
    init_logging(&config, cli.verbose)?;
    debug!("Configuration loaded from {}", config.dir());

    let app = App::new(config);
    match cli.command {
        Commands::Categories => app.categories(),
        Commands::List { category, filter } => app.list(category, filter.as_deref()).await?,
        Commands::Add(args) => app.add(args).await?,
        Commands::Remove { category, id, yes } => app.remove(category, &id, yes).await?,
        Commands::Sweep { category } => app.sweep(category).await?,
        Commands::Play {
            category,
            id,
            duration,
        } => app.play(category, &id, duration).await?,
        Commands::Whoami => app.whoami().await?,
        Commands::Profile { name } => app.profile(&name).await?,
        Commands::Avatar { path } => app.avatar(&path).await?,
        Commands::Config(args) => app.configure(args)?,
    }

    Ok(())
}
