use crate::plant::{ColorGenome, PlantId};

/// Absolute grid coordinate. Row 0 is the ground; y grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Non-owning handle from a grid slot back to the living cell occupying it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub plant: PlantId,
    pub index: usize,
}

/// Occupancy map of living cells.
///
/// Slots are stored column by column so the per-column energy scans walk
/// contiguous memory.
#[derive(Debug, Clone)]
pub struct Grid {
    width: u32,
    height: u32,
    slots: Vec<Option<CellRef>>,
}

impl Grid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            slots: vec![None; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// True iff `pos` is inside the grid and no living cell occupies it.
    /// Anything outside the grid is simply unavailable.
    pub fn is_space_available(&self, pos: GridPos) -> bool {
        self.slot_index(pos)
            .is_some_and(|index| self.slots[index].is_none())
    }

    pub fn get(&self, pos: GridPos) -> Option<CellRef> {
        self.slot_index(pos).and_then(|index| self.slots[index])
    }

    /// Occupied coordinates in column order, each column scanned from the
    /// top row down to the ground.
    pub fn occupied(&self) -> impl Iterator<Item = (GridPos, CellRef)> + '_ {
        (0..self.width as i32).flat_map(move |x| {
            (0..self.height as i32)
                .rev()
                .filter_map(move |y| {
                    let pos = GridPos::new(x, y);
                    self.get(pos).map(|cell| (pos, cell))
                })
        })
    }

    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub(crate) fn place(&mut self, pos: GridPos, cell: CellRef) {
        let index = self
            .slot_index(pos)
            .unwrap_or_else(|| panic!("cell placed outside the grid at {pos:?}"));
        if let Some(existing) = self.slots[index] {
            panic!("grid slot {pos:?} already holds {existing:?}, cannot place {cell:?}");
        }
        self.slots[index] = Some(cell);
    }

    pub(crate) fn clear(&mut self, pos: GridPos) {
        if let Some(index) = self.slot_index(pos) {
            self.slots[index] = None;
        }
    }

    fn slot_index(&self, pos: GridPos) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(pos.x as usize * self.height as usize + pos.y as usize)
    }
}

/// What a presentation layer sees at one grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotCell {
    pub plant: PlantId,
    pub color: ColorGenome,
}

/// Read-only copy of the grid, detached from the live simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridSnapshot {
    width: u32,
    height: u32,
    cells: Vec<Option<SnapshotCell>>,
}

impl GridSnapshot {
    pub(crate) fn new(width: u32, height: u32, cells: Vec<Option<SnapshotCell>>) -> Self {
        debug_assert_eq!(cells.len(), width as usize * height as usize);
        Self {
            width,
            height,
            cells,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: i32, y: i32) -> Option<SnapshotCell> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        self.cells[x as usize * self.height as usize + y as usize]
    }

    pub fn occupied(&self) -> impl Iterator<Item = (GridPos, SnapshotCell)> + '_ {
        let height = self.height as usize;
        self.cells.iter().enumerate().filter_map(move |(index, cell)| {
            cell.map(|cell| {
                let pos = GridPos::new((index / height) as i32, (index % height) as i32);
                (pos, cell)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn plant_id() -> PlantId {
        let mut ids: SlotMap<PlantId, ()> = SlotMap::with_key();
        ids.insert(())
    }

    #[test]
    fn out_of_bounds_is_unavailable_not_an_error() {
        let grid = Grid::new(4, 3);
        assert!(grid.is_space_available(GridPos::new(0, 0)));
        assert!(grid.is_space_available(GridPos::new(3, 2)));
        assert!(!grid.is_space_available(GridPos::new(-1, 0)));
        assert!(!grid.is_space_available(GridPos::new(4, 0)));
        assert!(!grid.is_space_available(GridPos::new(0, 3)));
        assert_eq!(grid.get(GridPos::new(10, 10)), None);
    }

    #[test]
    fn place_and_clear_track_occupancy() {
        let mut grid = Grid::new(4, 3);
        let cell = CellRef {
            plant: plant_id(),
            index: 0,
        };
        let pos = GridPos::new(2, 1);

        grid.place(pos, cell);
        assert!(!grid.is_space_available(pos));
        assert_eq!(grid.get(pos), Some(cell));
        assert_eq!(grid.occupied_count(), 1);

        grid.clear(pos);
        assert!(grid.is_space_available(pos));
        assert_eq!(grid.occupied_count(), 0);
    }

    #[test]
    #[should_panic(expected = "already holds")]
    fn double_occupancy_is_fatal() {
        let mut grid = Grid::new(2, 2);
        let cell = CellRef {
            plant: plant_id(),
            index: 0,
        };
        grid.place(GridPos::new(1, 1), cell);
        grid.place(GridPos::new(1, 1), CellRef { index: 1, ..cell });
    }

    #[test]
    fn occupied_scans_columns_top_down() {
        let mut grid = Grid::new(2, 3);
        let plant = plant_id();
        grid.place(GridPos::new(1, 0), CellRef { plant, index: 0 });
        grid.place(GridPos::new(0, 0), CellRef { plant, index: 1 });
        grid.place(GridPos::new(0, 2), CellRef { plant, index: 2 });

        let order: Vec<GridPos> = grid.occupied().map(|(pos, _)| pos).collect();
        assert_eq!(
            order,
            vec![GridPos::new(0, 2), GridPos::new(0, 0), GridPos::new(1, 0)]
        );
    }
}
