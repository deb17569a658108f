use crate::grid::{Grid, GridPos};

/// What a cell turns into when it is grown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Normal,
    /// Never lives; activating it spends the cell and sows an offspring
    Seed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    Pending,
    Alive,
    Dead,
}

/// Side effect of a state change that the owning plant must apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Requested state already held
    Unchanged,
    /// Pending normal cell is now alive and occupies its slot
    Grew,
    /// Pending seed cell went straight to dead
    Germinated,
    /// Living cell died and frees its slot
    Died,
}

/// One unit of a plant body, placed relative to the plant root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    dx: i32,
    dy: i32,
    kind: CellKind,
    state: CellState,
    born_at: u64,
    activated_at: Option<u64>,
    /// Last tick this cell was reached from the ground; `None` until first verified
    connected_at: Option<u64>,
}

impl Cell {
    pub fn new(dx: i32, dy: i32, kind: CellKind, born_at: u64) -> Self {
        Self {
            dx,
            dy,
            kind,
            state: CellState::Pending,
            born_at,
            activated_at: None,
            connected_at: None,
        }
    }

    pub fn dx(&self) -> i32 {
        self.dx
    }

    pub fn dy(&self) -> i32 {
        self.dy
    }

    pub fn kind(&self) -> CellKind {
        self.kind
    }

    pub fn is_seed(&self) -> bool {
        self.kind == CellKind::Seed
    }

    pub fn state(&self) -> CellState {
        self.state
    }

    pub fn born_at(&self) -> u64 {
        self.born_at
    }

    pub fn activated_at(&self) -> Option<u64> {
        self.activated_at
    }

    pub fn connected_at(&self) -> Option<u64> {
        self.connected_at
    }

    /// Ticks since activation, or `None` if the cell was never activated
    pub fn age(&self, now: u64) -> Option<u64> {
        self.activated_at.map(|at| now.saturating_sub(at))
    }

    pub fn position(&self, root: GridPos) -> GridPos {
        root.offset(self.dx, self.dy)
    }

    pub fn is_space_available(&self, root: GridPos, grid: &Grid) -> bool {
        grid.is_space_available(self.position(root))
    }

    pub(crate) fn mark_connected(&mut self, now: u64) {
        self.connected_at = Some(now);
    }

    /// Move the cell toward `target`.
    ///
    /// # Panics
    ///
    /// On any transition outside the lifecycle: reviving a dead cell, killing
    /// a pending one, or returning a grown cell to pending.
    pub fn set_state(&mut self, target: CellState, now: u64) -> Transition {
        match (self.state, target) {
            (current, target) if current == target => Transition::Unchanged,
            (CellState::Pending, CellState::Alive) => {
                self.activated_at = Some(now);
                match self.kind {
                    CellKind::Normal => {
                        self.state = CellState::Alive;
                        Transition::Grew
                    }
                    CellKind::Seed => {
                        self.state = CellState::Dead;
                        Transition::Germinated
                    }
                }
            }
            (CellState::Alive, CellState::Dead) => {
                self.state = CellState::Dead;
                Transition::Died
            }
            (CellState::Dead, CellState::Alive) => {
                panic!("cannot revive a dead cell at offset ({}, {})", self.dx, self.dy)
            }
            (CellState::Pending, CellState::Dead) => {
                panic!("cannot kill a pending cell at offset ({}, {})", self.dx, self.dy)
            }
            (current, CellState::Pending) => {
                panic!(
                    "cell at offset ({}, {}) cannot return to pending from {current:?}",
                    self.dx, self.dy
                )
            }
            (current, target) => unreachable!("unhandled transition {current:?} -> {target:?}"),
        }
    }
}
