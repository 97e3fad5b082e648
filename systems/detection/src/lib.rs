#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that engages monsters whose collision mask overlaps a
//! structure's range mask.
//!
//! Detection re-runs every tick with no memory of the previous result. The
//! first monster in identifier order that overlaps wins; a structure with no
//! overlapping live monster has its target cleared.

mod mask;

use std::collections::BTreeMap;

use grid_siege_core::{
    Command, Event, MonsterId, MonsterView, PixelPoint, SimulationFlags, StructureKind,
    StructureSnapshot, StructureView,
};

pub use mask::CollisionMask;

/// Decides whether a body mask overlaps a range mask.
///
/// Both origins are top-left corners in screen space. The offset between
/// them is floored to whole pixels, so moving both origins by the same
/// amount never changes the outcome.
#[must_use]
pub fn detect(
    range: &CollisionMask,
    range_origin: PixelPoint,
    body: &CollisionMask,
    body_origin: PixelPoint,
) -> bool {
    let offset = (
        (body_origin.x - range_origin.x).floor() as i64,
        (body_origin.y - range_origin.y).floor() as i64,
    );
    range.overlaps(body, offset)
}

/// Top-left corner of a range mask centered on the structure's node.
#[must_use]
pub fn range_origin(
    structure: &StructureSnapshot,
    cell_size: f32,
    range: &CollisionMask,
) -> PixelPoint {
    PixelPoint::new(
        structure.position.x + cell_size / 2.0 - range.width() as f32 / 2.0,
        structure.position.y + cell_size / 2.0 - range.height() as f32 / 2.0,
    )
}

/// Detection system holding the monster body mask and cached range masks.
#[derive(Debug)]
pub struct Detection {
    body: CollisionMask,
    ranges: BTreeMap<StructureKind, CollisionMask>,
}

impl Detection {
    /// Creates a detection system using `body` as every monster's collision mask.
    #[must_use]
    pub fn new(body: CollisionMask) -> Self {
        Self {
            body,
            ranges: BTreeMap::new(),
        }
    }

    /// Range mask used for structures of the provided kind.
    pub fn range_mask(&mut self, kind: StructureKind) -> &CollisionMask {
        self.ranges
            .entry(kind)
            .or_insert_with(|| CollisionMask::disc(kind.range_radius_px()))
    }

    /// Emits one [`Command::EngageTarget`] per structure after the clock advances.
    ///
    /// Nothing is emitted while paused.
    pub fn handle(
        &mut self,
        events: &[Event],
        flags: SimulationFlags,
        cell_size: f32,
        structures: &StructureView,
        monsters: &MonsterView,
        out: &mut Vec<Command>,
    ) {
        if flags.paused
            || !events
                .iter()
                .any(|event| matches!(event, Event::TimeAdvanced { .. }))
        {
            return;
        }

        for structure in structures.iter() {
            let target = self.first_overlapping(structure, cell_size, monsters);
            out.push(Command::EngageTarget {
                structure: structure.id,
                target,
            });
        }
    }

    fn first_overlapping(
        &mut self,
        structure: &StructureSnapshot,
        cell_size: f32,
        monsters: &MonsterView,
    ) -> Option<MonsterId> {
        let kind = structure.kind;
        let range = self
            .ranges
            .entry(kind)
            .or_insert_with(|| CollisionMask::disc(kind.range_radius_px()));
        let origin = range_origin(structure, cell_size, range);
        let body = &self.body;

        monsters
            .iter()
            .filter(|monster| monster.is_alive())
            .find(|monster| detect(range, origin, body, monster.screen))
            .map(|monster| monster.id)
    }
}
