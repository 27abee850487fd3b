use super::args::{Cli, Commands};
use super::handlers;
use crate::config::{self, Config};
use crate::context::{Display, ReportContext};
use crate::{logging, terminal};
use anyhow::Result;
use std::path::PathBuf;

pub fn run(cli: Cli) -> Result<()> {
    logging::init(cli.log_level);

    if let Commands::Reports = cli.command {
        return handlers::reports::handle();
    }

    let home = match (&cli.snapshot, &cli.config) {
        (Some(_), Some(_)) => None,
        _ => Some(config::resolve_home()?),
    };
    let config_path = resolve_path(cli.config.as_ref(), home.as_ref(), "config.toml");
    let snapshot_path = resolve_path(cli.snapshot.as_ref(), home.as_ref(), "snapshot.json");

    let config = Config::load_from(&config_path)?;
    let display = Display {
        terminal: terminal::resolve_size(cli.width, cli.height, &config.display),
        enable_color: terminal::enable_color(cli.color.unwrap_or(config.display.color)),
        title_repeat: config.display.title_repeat && !cli.no_title_repeat,
        flip: cli.flip,
        disable_aggregations: cli.no_aggregates,
    };
    let ctx = ReportContext::load(&snapshot_path, config, display)?;

    match cli.command {
        Commands::Info { command } => handlers::info::handle(&ctx, command),
        Commands::Show { command } => handlers::show::handle(&ctx, command),
        Commands::Summary => handlers::summary::handle(&ctx),
        Commands::Reports => handlers::reports::handle(),
    }
}

fn resolve_path(explicit: Option<&PathBuf>, home: Option<&PathBuf>, file: &str) -> PathBuf {
    match (explicit, home) {
        (Some(path), _) => path.clone(),
        (None, Some(home)) => home.join(file),
        (None, None) => PathBuf::from(file),
    }
}
