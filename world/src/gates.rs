//! Colored gates that swallow matching blocks.

use std::collections::BTreeMap;

use gridlock_core::{BlockColor, CellCoord, GateError, GateId};

use crate::grid::GridOccupancy;

/// Colored opening covering a fixed set of grid cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gate {
    id: GateId,
    color: BlockColor,
    cells: Vec<CellCoord>,
}

impl Gate {
    /// Identifier allocated by the registry.
    #[must_use]
    pub const fn id(&self) -> GateId {
        self.id
    }

    /// Color a block must carry to pass.
    #[must_use]
    pub const fn color(&self) -> BlockColor {
        self.color
    }

    /// Cells covered by the gate, without duplicates.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Reports whether the gate covers the provided cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        self.cells.contains(&cell)
    }
}

/// Registry that stores gates and manages identifier allocation.
///
/// Gates never share a cell, so each cell maps to at most one gate.
#[derive(Clone, Debug)]
pub struct GateRegistry {
    entries: BTreeMap<GateId, Gate>,
    cell_owners: BTreeMap<CellCoord, GateId>,
    next_gate_id: GateId,
}

impl GateRegistry {
    /// Creates an empty registry with a reset identifier counter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            cell_owners: BTreeMap::new(),
            next_gate_id: GateId::new(0),
        }
    }

    /// Registers a gate over `cells`, collapsing duplicate cells.
    ///
    /// Every cell must be in bounds, not a wall and not claimed by another gate.
    pub fn register(
        &mut self,
        color: BlockColor,
        cells: &[CellCoord],
        grid: &GridOccupancy,
    ) -> Result<GateId, GateError> {
        let mut unique: Vec<CellCoord> = Vec::with_capacity(cells.len());
        for cell in cells {
            if !unique.contains(cell) {
                unique.push(*cell);
            }
        }

        if unique.is_empty() {
            return Err(GateError::Empty);
        }
        for cell in &unique {
            if !grid.is_within_bounds(*cell) {
                return Err(GateError::OutOfBounds);
            }
            if grid.is_wall(*cell) {
                return Err(GateError::Wall);
            }
            if self.cell_owners.contains_key(cell) {
                return Err(GateError::Overlap);
            }
        }

        let id = self.next_gate_id;
        self.next_gate_id = GateId::new(id.get().saturating_add(1));
        for cell in &unique {
            let _ = self.cell_owners.insert(*cell, id);
        }
        let _ = self.entries.insert(
            id,
            Gate {
                id,
                color,
                cells: unique,
            },
        );
        Ok(id)
    }

    /// Removes a gate, returning it when it existed.
    pub fn remove(&mut self, gate: GateId) -> Option<Gate> {
        let removed = self.entries.remove(&gate)?;
        for cell in removed.cells() {
            let _ = self.cell_owners.remove(cell);
        }
        Some(removed)
    }

    /// Retrieves a gate by identifier.
    #[must_use]
    pub fn get(&self, gate: GateId) -> Option<&Gate> {
        self.entries.get(&gate)
    }

    /// Gate covering the provided cell, if any.
    #[must_use]
    pub fn gate_at(&self, cell: CellCoord) -> Option<&Gate> {
        self.cell_owners
            .get(&cell)
            .and_then(|gate| self.entries.get(gate))
    }

    /// Gate a footprint of the given color can fall through.
    ///
    /// Passing requires a non-empty footprint lying entirely on a single gate
    /// whose color matches.
    #[must_use]
    pub fn can_block_pass(&self, color: BlockColor, cells: &[CellCoord]) -> Option<GateId> {
        let (first, rest) = cells.split_first()?;
        let gate = self.gate_at(*first)?;
        if gate.color() != color {
            return None;
        }
        rest.iter()
            .all(|cell| gate.contains(*cell))
            .then_some(gate.id())
    }

    /// Iterator over registered gates in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Gate> {
        self.entries.values()
    }

    /// Number of registered gates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no gates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for GateRegistry {
    fn default() -> Self {
        Self::new()
    }
}
