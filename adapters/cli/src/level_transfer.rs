//! Level files, single-line layout strings and seeded barrier generation.
//!
//! Levels reach the world as already-parsed [`LevelLayout`] values; all file
//! and string parsing happens here at the adapter edge.

use std::{fs, path::Path};

use anyhow::{Context, Result as AnyResult};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use grid_siege_core::{LevelLayout, NodeCoord, StructurePlacement};
use grid_siege_system_pathfinding::find_path;
use grid_siege_world::Grid;
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LAYOUT_DOMAIN: &str = "siege";
const LAYOUT_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded layout payload.
pub(crate) const LAYOUT_HEADER: &str = "siege:v1";
/// Delimiter used to separate the prefix, grid dimensions and payload.
const FIELD_DELIMITER: char = ':';

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableLayout {
    cell_size: f32,
    barriers: Vec<NodeCoord>,
    start: Option<NodeCoord>,
    end: Option<NodeCoord>,
    structures: Vec<StructurePlacement>,
}

/// Encodes a level into a single-line string suitable for sharing.
pub(crate) fn encode_layout(layout: &LevelLayout) -> AnyResult<String> {
    let payload = SerializableLayout {
        cell_size: layout.cell_size,
        barriers: layout.barriers.clone(),
        start: layout.start,
        end: layout.end,
        structures: layout.structures.clone(),
    };
    let json = serde_json::to_vec(&payload).context("failed to serialize level layout")?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!(
        "{LAYOUT_HEADER}:{}x{}:{encoded}",
        layout.rows, layout.columns
    ))
}

/// Decodes a level from its single-line string representation.
pub(crate) fn decode_layout(value: &str) -> Result<LevelLayout, LayoutTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LayoutTransferError::EmptyPayload);
    }

    let mut parts = trimmed.split(FIELD_DELIMITER);
    let domain = parts.next().ok_or(LayoutTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(LayoutTransferError::MissingVersion)?;
    let dimensions = parts.next().ok_or(LayoutTransferError::MissingDimensions)?;
    let payload = parts.next().ok_or(LayoutTransferError::MissingPayload)?;

    if domain != LAYOUT_DOMAIN {
        return Err(LayoutTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != LAYOUT_VERSION {
        return Err(LayoutTransferError::UnsupportedVersion(version.to_owned()));
    }

    let (rows, columns) = parse_dimensions(dimensions)?;
    let bytes = STANDARD_NO_PAD.decode(payload.as_bytes())?;
    let decoded: SerializableLayout = serde_json::from_slice(&bytes)?;

    let layout = LevelLayout {
        rows,
        columns,
        cell_size: decoded.cell_size,
        barriers: decoded.barriers,
        start: decoded.start,
        end: decoded.end,
        structures: decoded.structures,
    };
    layout.validate()?;
    Ok(layout)
}

/// Reads a TOML level file and validates it.
pub(crate) fn load_level_file(path: &Path) -> AnyResult<LevelLayout> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read level file {}", path.display()))?;
    let layout: LevelLayout = toml::from_str(&text)
        .with_context(|| format!("invalid level file {}", path.display()))?;
    layout
        .validate()
        .with_context(|| format!("level file {} failed validation", path.display()))?;
    Ok(layout)
}

/// Scatters barriers over open nodes while keeping the start and end connected.
///
/// Each open node becomes a barrier with probability `density`. A candidate
/// that would disconnect the route is skipped, so a layout whose route was
/// reachable stays reachable. The same seed always yields the same layout.
/// Returns the number of barriers added.
pub(crate) fn scatter_barriers(layout: &mut LevelLayout, density: f64, seed: u64) -> usize {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut grid = Grid::new(layout.rows, layout.columns, layout.cell_size);
    for barrier in &layout.barriers {
        grid.set_barrier(*barrier);
    }

    let occupied: Vec<NodeCoord> = layout
        .structures
        .iter()
        .map(|placement| placement.cell)
        .chain(layout.start)
        .chain(layout.end)
        .collect();
    let mut candidates: Vec<NodeCoord> = grid
        .nodes()
        .filter(|node| node.state().is_passable() && !occupied.contains(&node.coord()))
        .map(|node| node.coord())
        .collect();
    candidates.shuffle(&mut rng);

    let mut placed = 0;
    for cell in candidates {
        if !rng.gen_bool(density.clamp(0.0, 1.0)) {
            continue;
        }

        grid.set_barrier(cell);
        if let (Some(start), Some(end)) = (layout.start, layout.end) {
            grid.refresh_neighbors();
            if find_path(&grid, start, end).is_none() {
                grid.reset(cell);
                continue;
            }
        }
        layout.barriers.push(cell);
        placed += 1;
    }

    placed
}

/// Errors that can occur while decoding layout strings.
#[derive(Debug, Error)]
pub(crate) enum LayoutTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("layout string was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded layout.
    #[error("layout string is missing the prefix")]
    MissingPrefix,
    /// The encoded layout did not contain a version segment.
    #[error("layout string is missing the version")]
    MissingVersion,
    /// The encoded layout did not include grid dimensions.
    #[error("layout string is missing the grid dimensions")]
    MissingDimensions,
    /// The encoded layout did not include the payload segment.
    #[error("layout string is missing the payload")]
    MissingPayload,
    /// The encoded layout used an unexpected prefix segment.
    #[error("layout prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded layout used an unsupported version identifier.
    #[error("layout version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The grid dimensions could not be parsed from the encoded layout.
    #[error("could not parse grid dimensions '{0}'")]
    InvalidDimensions(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode layout payload: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),
    /// The decoded payload could not be deserialised.
    #[error("could not parse layout payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
    /// The decoded layout violates a grid precondition.
    #[error("layout is not a valid level: {0}")]
    InvalidLevel(#[from] grid_siege_core::LevelError),
}

fn parse_dimensions(dimensions: &str) -> Result<(u32, u32), LayoutTransferError> {
    let invalid = || LayoutTransferError::InvalidDimensions(dimensions.to_owned());
    let (rows, columns) = dimensions.split_once(['x', 'X']).ok_or_else(invalid)?;

    let rows = rows.trim().parse::<u32>().map_err(|_| invalid())?;
    let columns = columns.trim().parse::<u32>().map_err(|_| invalid())?;
    if rows == 0 || columns == 0 {
        return Err(invalid());
    }

    Ok((rows, columns))
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_siege_core::StructureKind;

    fn sample_layout() -> LevelLayout {
        LevelLayout {
            rows: 8,
            columns: 12,
            cell_size: 32.0,
            barriers: vec![NodeCoord::new(3, 4), NodeCoord::new(4, 4)],
            start: Some(NodeCoord::new(0, 0)),
            end: Some(NodeCoord::new(7, 11)),
            structures: vec![StructurePlacement {
                kind: StructureKind::Tower,
                cell: NodeCoord::new(2, 2),
            }],
        }
    }

    #[test]
    fn encoded_layout_decodes_to_the_same_level() {
        let layout = sample_layout();

        let encoded = encode_layout(&layout).expect("layout encodes");
        assert!(encoded.starts_with(&format!("{LAYOUT_HEADER}:8x12:")));

        let decoded = decode_layout(&encoded).expect("layout decodes");
        assert_eq!(layout, decoded);
    }

    #[test]
    fn foreign_prefixes_and_versions_are_rejected() {
        assert!(matches!(
            decode_layout("tower:v1:2x2:e30"),
            Err(LayoutTransferError::InvalidPrefix(prefix)) if prefix == "tower"
        ));
        assert!(matches!(
            decode_layout("siege:v9:2x2:e30"),
            Err(LayoutTransferError::UnsupportedVersion(_))
        ));
        assert!(matches!(
            decode_layout("   "),
            Err(LayoutTransferError::EmptyPayload)
        ));
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        assert!(matches!(
            decode_layout("siege:v1:0x4:e30"),
            Err(LayoutTransferError::InvalidDimensions(_))
        ));
    }

    #[test]
    fn decoded_levels_are_validated() {
        let mut layout = sample_layout();
        layout.barriers.push(NodeCoord::new(0, 0));
        let encoded = encode_layout(&layout).expect("layout encodes");

        assert!(matches!(
            decode_layout(&encoded),
            Err(LayoutTransferError::InvalidLevel(_))
        ));
    }

    #[test]
    fn scattered_barriers_keep_the_route_reachable() {
        let mut layout = sample_layout();
        let placed = scatter_barriers(&mut layout, 0.6, 7);

        assert!(placed > 0);
        layout.validate().expect("scattered layout stays valid");

        let mut grid = Grid::new(layout.rows, layout.columns, layout.cell_size);
        for barrier in &layout.barriers {
            grid.set_barrier(*barrier);
        }
        grid.refresh_neighbors();
        assert!(find_path(&grid, NodeCoord::new(0, 0), NodeCoord::new(7, 11)).is_some());
    }

    #[test]
    fn scattering_is_seeded() {
        let mut first = sample_layout();
        let mut second = sample_layout();
        let _ = scatter_barriers(&mut first, 0.3, 42);
        let _ = scatter_barriers(&mut second, 0.3, 42);
        assert_eq!(first, second);
    }
}
