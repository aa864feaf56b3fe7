//! Authoritative block state management utilities.

use std::collections::BTreeMap;

use gridlock_core::{
    BlockColor, BlockId, BlockPhase, BlockSnapshot, CellCoord, Rotation, ShapeGeometry,
};

/// Block tracked by the world.
#[derive(Clone, Debug)]
pub(crate) struct PlacedBlock {
    /// Identifier allocated by the world for the block.
    pub(crate) id: BlockId,
    /// Occupancy mask of the block.
    pub(crate) shape: ShapeGeometry,
    /// Color of the block.
    pub(crate) color: BlockColor,
    /// Orientation of the block.
    pub(crate) rotation: Rotation,
    /// Grid cell under the shape's pivot.
    pub(crate) anchor: CellCoord,
    /// Cells claimed by the block; the only source for occupancy updates.
    pub(crate) cells: Vec<CellCoord>,
    /// Lifecycle stage of the block.
    pub(crate) phase: BlockPhase,
}

impl PlacedBlock {
    /// Cells the block would cover with its pivot on `anchor`.
    pub(crate) fn footprint_at(&self, anchor: CellCoord) -> Vec<CellCoord> {
        self.shape.footprint(anchor, self.rotation)
    }

    pub(crate) fn snapshot(&self) -> BlockSnapshot {
        BlockSnapshot {
            id: self.id,
            shape: self.shape,
            color: self.color,
            rotation: self.rotation,
            anchor: self.anchor,
            cells: self.cells.clone(),
            phase: self.phase,
        }
    }
}

/// Registry that stores blocks and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct BlockRegistry {
    entries: BTreeMap<BlockId, PlacedBlock>,
    next_block_id: BlockId,
}

impl BlockRegistry {
    /// Creates an empty block registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_block_id: BlockId::new(0),
        }
    }

    /// Stores a resting block and returns its identifier.
    pub(crate) fn insert(
        &mut self,
        shape: ShapeGeometry,
        color: BlockColor,
        anchor: CellCoord,
        rotation: Rotation,
    ) -> BlockId {
        let id = self.next_block_id;
        self.next_block_id = BlockId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            PlacedBlock {
                id,
                shape,
                color,
                rotation,
                anchor,
                cells: shape.footprint(anchor, rotation),
                phase: BlockPhase::Resting,
            },
        );
        id
    }

    pub(crate) fn get(&self, block: BlockId) -> Option<&PlacedBlock> {
        self.entries.get(&block)
    }

    pub(crate) fn get_mut(&mut self, block: BlockId) -> Option<&mut PlacedBlock> {
        self.entries.get_mut(&block)
    }

    pub(crate) fn remove(&mut self, block: BlockId) -> Option<PlacedBlock> {
        self.entries.remove(&block)
    }

    /// Drops every block, returning how many were stored.
    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &PlacedBlock> {
        self.entries.values()
    }
}
