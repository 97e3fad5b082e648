//! TOML configuration for the command-line game loop.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use grid_siege_core::{Health, Resources};
use grid_siege_system_controls::PlayerAction;
use grid_siege_system_spawning::Config as SpawningConfig;
use grid_siege_world::WorldConfig;
use serde::Deserialize;

/// Complete configuration of a headless game session.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameConfig {
    pub(crate) grid: GridSection,
    pub(crate) monsters: MonsterSection,
    pub(crate) economy: EconomySection,
    pub(crate) simulation: SimulationSection,
    /// Player actions replayed at fixed ticks.
    pub(crate) script: Vec<ScriptedAction>,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GridSection {
    pub(crate) rows: u32,
    pub(crate) columns: u32,
    pub(crate) cell_size: f32,
}

impl Default for GridSection {
    fn default() -> Self {
        let world = WorldConfig::default();
        Self {
            rows: world.rows,
            columns: world.columns,
            cell_size: world.cell_size,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MonsterSection {
    pub(crate) health: i32,
    /// Grid units per tick.
    pub(crate) speed: f32,
    pub(crate) kill_reward: i64,
    pub(crate) escape_penalty: i64,
    pub(crate) wave_size: u32,
    pub(crate) spawn_interval_ticks: u32,
    /// Edge length of the square collision mask in pixels.
    pub(crate) collision_size: u32,
}

impl Default for MonsterSection {
    fn default() -> Self {
        let world = WorldConfig::default();
        Self {
            health: 10,
            speed: 0.125,
            kill_reward: world.kill_reward.get(),
            escape_penalty: world.escape_penalty.get(),
            wave_size: 10,
            spawn_interval_ticks: 30,
            collision_size: 24,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct EconomySection {
    pub(crate) starting_resources: i64,
}

impl Default for EconomySection {
    fn default() -> Self {
        Self {
            starting_resources: WorldConfig::default().starting_resources.get(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationSection {
    /// Reference tick rate; only used to report simulated time.
    pub(crate) tick_rate_hz: u32,
    /// Hard stop for a session, in ticks.
    pub(crate) tick_limit: u64,
    pub(crate) fast_forward: bool,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            tick_limit: 3_600,
            fast_forward: false,
        }
    }
}

/// Player action performed at the start of a given tick.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub(crate) struct ScriptedAction {
    pub(crate) tick: u64,
    #[serde(flatten)]
    pub(crate) action: PlayerAction,
}

impl GameConfig {
    /// Reads and parses a configuration file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Parses configuration from TOML text.
    pub(crate) fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Tunables handed to the authoritative world.
    pub(crate) fn world_config(&self) -> WorldConfig {
        WorldConfig {
            rows: self.grid.rows,
            columns: self.grid.columns,
            cell_size: self.grid.cell_size,
            starting_resources: Resources::new(self.economy.starting_resources),
            kill_reward: Resources::new(self.monsters.kill_reward),
            escape_penalty: Resources::new(self.monsters.escape_penalty),
        }
    }

    /// Wave cadence and monster stats handed to the spawning system.
    pub(crate) fn spawning_config(&self) -> SpawningConfig {
        SpawningConfig::new(
            self.monsters.spawn_interval_ticks,
            self.monsters.wave_size,
            Health::new(self.monsters.health),
            self.monsters.speed,
        )
    }
}
