#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Grid Siege sessions headlessly.

mod ascii;
mod config;
mod game;
mod level_transfer;

use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use grid_siege_core::LevelLayout;
use grid_siege_world::{query, World};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{ascii::AsciiBackend, config::GameConfig, game::Game};

#[derive(Debug, Parser)]
#[command(name = "grid-siege")]
#[command(about = "Headless grid tower defense simulation")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// TOML level file
    #[arg(short, long, conflicts_with = "layout")]
    level: Option<PathBuf>,

    /// Level encoded as a layout string
    #[arg(long)]
    layout: Option<String>,

    /// Stop after this many ticks, overriding the configured limit
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Print a frame every N ticks (0 prints only the final frame)
    #[arg(long, default_value = "0")]
    render_every: u64,

    /// Double monster speed from the first tick
    #[arg(long)]
    fast_forward: bool,

    /// Scatter barriers over open nodes with this probability
    #[arg(long)]
    random_barriers: Option<f64>,

    /// Seed used when scattering barriers
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Print the final level as a layout string
    #[arg(long)]
    export_layout: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    println!("{}", query::welcome_banner(&World::new()));

    let mut config = match &cli.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    if cli.fast_forward {
        config.simulation.fast_forward = true;
    }

    let mut level = match (&cli.level, &cli.layout) {
        (Some(path), _) => Some(level_transfer::load_level_file(path)?),
        (None, Some(encoded)) => {
            Some(level_transfer::decode_layout(encoded).context("invalid --layout value")?)
        }
        (None, None) => None,
    };
    if let Some(density) = cli.random_barriers {
        anyhow::ensure!(
            (0.0..=1.0).contains(&density),
            "--random-barriers expects a probability between 0 and 1, received {density}"
        );
        let layout = level.get_or_insert_with(|| blank_layout(&config));
        let placed = level_transfer::scatter_barriers(layout, density, cli.seed);
        tracing::info!(placed, density, seed = cli.seed, "random barriers scattered");
    }

    let tick_limit = cli.ticks.unwrap_or(config.simulation.tick_limit);
    let mut game = Game::new(&config, level, AsciiBackend::new(io::stdout().lock()));
    for _ in 0..tick_limit {
        game.step()?;
        let tick = game.report().ticks;
        if cli.render_every > 0 && tick % cli.render_every == 0 {
            game.render()?;
        }
        if game.round_finished() {
            tracing::info!(tick, "round finished");
            break;
        }
    }
    game.render()?;

    let report = game.report();
    let seconds = report.ticks as f64 / f64::from(config.simulation.tick_rate_hz.max(1));
    tracing::info!(
        ticks = report.ticks,
        seconds,
        spawned = report.spawned,
        killed = report.killed,
        escaped = report.escaped,
        resources = report.resources,
        "session complete"
    );

    if cli.export_layout {
        println!("{}", level_transfer::encode_layout(&game.layout())?);
    }
    Ok(())
}

fn blank_layout(config: &GameConfig) -> LevelLayout {
    LevelLayout {
        rows: config.grid.rows,
        columns: config.grid.columns,
        cell_size: config.grid.cell_size,
        barriers: Vec::new(),
        start: None,
        end: None,
        structures: Vec::new(),
    }
}
