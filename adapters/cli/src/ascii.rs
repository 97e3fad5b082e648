//! Plain-text backend that prints frames to any writer.

use std::io::Write;

use anyhow::Result as AnyResult;
use glam::Vec2;
use grid_siege_core::{NodeState, SoundCue, StructureKind};
use grid_siege_rendering::{RenderingBackend, Scene};

/// Renders scenes as character grids followed by a status line.
#[derive(Debug)]
pub(crate) struct AsciiBackend<W> {
    out: W,
}

impl<W> AsciiBackend<W>
where
    W: Write,
{
    /// Creates a backend writing frames to `out`.
    pub(crate) fn new(out: W) -> Self {
        Self { out }
    }
}

const fn node_glyph(state: NodeState) -> char {
    match state {
        NodeState::Open => '.',
        NodeState::Barrier => '#',
        NodeState::Start => 'S',
        NodeState::End => 'E',
        NodeState::Visited => '+',
        NodeState::OnPath => '*',
    }
}

const fn structure_glyph(kind: StructureKind) -> char {
    match kind {
        StructureKind::Tower => 'T',
        StructureKind::Gem => 'G',
    }
}

fn draw(scene: &Scene) -> Vec<Vec<char>> {
    let grid = &scene.grid;
    let mut rows: Vec<Vec<char>> = grid
        .nodes
        .chunks(grid.columns.max(1) as usize)
        .map(|row| row.iter().map(|node| node_glyph(node.state)).collect())
        .collect();

    let mut plot = |row: u32, column: u32, glyph: char| {
        if let Some(cell) = rows
            .get_mut(row as usize)
            .and_then(|line| line.get_mut(column as usize))
        {
            *cell = glyph;
        }
    };

    for structure in &scene.structures {
        plot(
            structure.cell.row(),
            structure.cell.column(),
            structure_glyph(structure.kind),
        );
    }

    let half_cell = Vec2::splat(grid.cell_size / 2.0);
    for monster in &scene.monsters {
        if let Some(cell) = grid.cell_at(monster.position + half_cell) {
            plot(cell.row(), cell.column(), 'M');
        }
    }

    rows
}

fn status_line(scene: &Scene) -> String {
    let hud = &scene.hud;
    let mut line = format!(
        "tick {} | resources {} | monsters {}",
        hud.tick,
        hud.resources.get(),
        scene.monsters.len()
    );
    if hud.paused {
        line.push_str(" | paused");
    }
    if hud.fast_forward {
        line.push_str(" | fast-forward");
    }
    match hud.last_build {
        Some(Ok(structure)) => line.push_str(&format!(" | built #{}", structure.get())),
        Some(Err(reason)) => line.push_str(&format!(" | build refused: {reason}")),
        None => {}
    }
    line
}

impl<W> RenderingBackend for AsciiBackend<W>
where
    W: Write,
{
    fn render_frame(&mut self, scene: &Scene) -> AnyResult<()> {
        for row in draw(scene) {
            writeln!(self.out, "{}", row.into_iter().collect::<String>())?;
        }
        writeln!(self.out, "{}", status_line(scene))?;
        self.out.flush()?;
        Ok(())
    }

    fn play_sound(&mut self, cue: SoundCue) -> AnyResult<()> {
        tracing::debug!(?cue, "sound");
        Ok(())
    }
}
