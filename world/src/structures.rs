//! Authoritative structure state management utilities.

use std::collections::BTreeMap;

use grid_siege_core::{
    MonsterId, NodeCoord, PixelPoint, StructureId, StructureKind, StructureSnapshot,
};

/// Structure stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Structure {
    pub(crate) id: StructureId,
    pub(crate) kind: StructureKind,
    pub(crate) cell: NodeCoord,
    pub(crate) position: PixelPoint,
    pub(crate) level: u32,
    pub(crate) target: Option<MonsterId>,
    pub(crate) ready_in: u32,
}

impl Structure {
    pub(crate) fn snapshot(&self) -> StructureSnapshot {
        StructureSnapshot {
            id: self.id,
            kind: self.kind,
            cell: self.cell,
            position: self.position,
            level: self.level,
            target: self.target,
            ready_in: self.ready_in,
        }
    }
}

/// Registry that stores structures and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct StructureRegistry {
    entries: BTreeMap<StructureId, Structure>,
    next_structure_id: StructureId,
}

impl StructureRegistry {
    /// Creates an empty structure registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_structure_id: StructureId::new(0),
        }
    }

    pub(crate) fn insert(
        &mut self,
        kind: StructureKind,
        cell: NodeCoord,
        position: PixelPoint,
    ) -> StructureId {
        let id = self.next_structure_id;
        self.next_structure_id = StructureId::new(id.get().wrapping_add(1));
        let structure = Structure {
            id,
            kind,
            cell,
            position,
            level: 1,
            target: None,
            ready_in: 0,
        };
        let _ = self.entries.insert(id, structure);
        id
    }

    pub(crate) fn at(&self, cell: NodeCoord) -> Option<StructureId> {
        self.entries
            .values()
            .find(|structure| structure.cell == cell)
            .map(|structure| structure.id)
    }

    pub(crate) fn get_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Structure> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Structure> {
        self.entries.values_mut()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
