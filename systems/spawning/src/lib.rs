#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system that releases a wave of monsters per round.

use grid_siege_core::{Command, Event, Health, SimulationFlags};

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    spawn_interval_ticks: u32,
    wave_size: u32,
    health: Health,
    speed: f32,
}

impl Config {
    /// Creates a new configuration using the provided cadence and monster stats.
    #[must_use]
    pub const fn new(
        spawn_interval_ticks: u32,
        wave_size: u32,
        health: Health,
        speed: f32,
    ) -> Self {
        Self {
            spawn_interval_ticks,
            wave_size,
            health,
            speed,
        }
    }
}

/// Pure system that emits spawn commands while a wave is in progress.
///
/// A wave starts when a route is assigned. The first monster appears on the
/// next tick and the rest follow every `spawn_interval_ticks` ticks.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    remaining: u32,
    countdown: u32,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            remaining: 0,
            countdown: 0,
        }
    }

    /// Monsters still waiting to be released in the current wave.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Consumes events to emit spawn commands.
    pub fn handle(&mut self, events: &[Event], flags: SimulationFlags, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::RouteAssigned { .. } => {
                    tracing::info!(wave_size = self.config.wave_size, "wave started");
                    self.remaining = self.config.wave_size;
                    self.countdown = 0;
                }
                Event::RouteUnavailable => {
                    self.remaining = 0;
                }
                Event::TimeAdvanced { .. } if !flags.paused => self.advance(out),
                _ => {}
            }
        }
    }

    fn advance(&mut self, out: &mut Vec<Command>) {
        if self.remaining == 0 {
            return;
        }
        if self.countdown > 0 {
            self.countdown -= 1;
            return;
        }

        out.push(Command::SpawnMonster {
            health: self.config.health,
            speed: self.config.speed,
        });
        self.remaining -= 1;
        self.countdown = self.config.spawn_interval_ticks.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_without_a_route() {
        let mut spawning = Spawning::new(Config::new(2, 3, Health::new(10), 0.125));
        let mut out = Vec::new();
        spawning.handle(
            &[Event::TimeAdvanced { tick: 1 }],
            SimulationFlags::default(),
            &mut out,
        );
        assert!(out.is_empty());
        assert_eq!(spawning.remaining(), 0);
    }

    #[test]
    fn unavailable_route_cancels_the_wave() {
        let mut spawning = Spawning::new(Config::new(2, 3, Health::new(10), 0.125));
        let mut out = Vec::new();
        spawning.handle(
            &[Event::RouteAssigned { length: 4 }, Event::RouteUnavailable],
            SimulationFlags::default(),
            &mut out,
        );
        assert_eq!(spawning.remaining(), 0);
    }
}
