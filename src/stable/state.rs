//! Three-valued stable background state

use crate::life::board::{neighbourhood, BitBoard, Cell, N};

/// Outcome of a propagation pass over the stable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagateResult {
    pub consistent: bool,
    pub changed: bool,
    pub edges_changed: bool,
}

impl PropagateResult {
    pub const INCONSISTENT: PropagateResult = PropagateResult {
        consistent: false,
        changed: false,
        edges_changed: false,
    };
}

/// The stable background: known-on cells, undetermined cells, and cached
/// per-cell neighbourhood counts kept coherent with every mutation.
///
/// A cell is off iff it is in neither `state` nor `unknown`. The count
/// planes hold, for every cell, the number of on (respectively unknown)
/// cells in its full 3x3 window, in binary across four bit-planes.
#[derive(Clone)]
pub struct StableState {
    pub state: BitBoard,
    pub unknown: BitBoard,
    pub state_zoi: BitBoard,
    /// Off cells promised to have at most one live neighbour.
    pub glanced: BitBoard,
    /// Off cells promised to have at least two live neighbours.
    pub glanced_on: BitBoard,
    pub on_count: [BitBoard; 4],
    pub unk_count: [BitBoard; 4],
}

impl StableState {
    pub fn new(state: BitBoard, unknown: BitBoard) -> Self {
        debug_assert!((state & unknown).is_empty());
        let mut stable = Self {
            state,
            unknown,
            state_zoi: state.zoi(),
            glanced: BitBoard::default(),
            glanced_on: BitBoard::default(),
            on_count: [BitBoard::default(); 4],
            unk_count: [BitBoard::default(); 4],
        };
        stable.recount();
        stable
    }

    /// Rebuild both cached count planes from scratch.
    pub fn recount(&mut self) {
        self.on_count = self.state.count_neighbourhood();
        self.unk_count = self.unknown.count_neighbourhood();
    }

    /// Commit an unknown cell to on or off, updating the cached count
    /// planes incrementally. The cell must currently be unknown.
    pub fn set_cell(&mut self, cell: Cell, value: bool) {
        debug_assert!(self.unknown.get(cell), "set_cell on a determined cell");
        self.unknown.erase(cell);
        if value {
            self.state.set(cell);
        }

        for n in neighbourhood(cell) {
            self.decrement_unknown(n);
            if value {
                self.increment_on(n);
            }
        }
    }

    fn decrement_unknown(&mut self, cell: Cell) {
        let [u0, u1, u2, u3] = &mut self.unk_count;
        if u0.get(cell) {
            u0.erase(cell);
        } else if u1.get(cell) {
            u1.erase(cell);
            u0.set(cell);
        } else if u2.get(cell) {
            u2.erase(cell);
            u1.set(cell);
            u0.set(cell);
        } else if u3.get(cell) {
            u3.erase(cell);
            u2.set(cell);
            u1.set(cell);
            u0.set(cell);
        } else {
            debug_assert!(false, "unknown count underflow");
        }
    }

    fn increment_on(&mut self, cell: Cell) {
        let [o0, o1, o2, o3] = &mut self.on_count;
        if !o0.get(cell) {
            o0.set(cell);
        } else if !o1.get(cell) {
            o1.set(cell);
            o0.erase(cell);
        } else if !o2.get(cell) {
            o2.set(cell);
            o1.erase(cell);
            o0.erase(cell);
        } else if !o3.get(cell) {
            o3.set(cell);
            o2.erase(cell);
            o1.erase(cell);
            o0.erase(cell);
        } else {
            debug_assert!(false, "on count overflow");
        }
    }

    /// A currently-unknown cell in the 3x3 neighbourhood, or `None`.
    pub fn unknown_neighbour(&self, cell: Cell) -> Option<Cell> {
        neighbourhood(cell)
            .into_iter()
            .find(|&n| self.unknown.get(n))
    }

    /// Cells whose stable unknown-neighbourhood count is one or two; the
    /// cheapest cells to branch near.
    pub fn few_unknown_neighbours(&self) -> BitBoard {
        let [u0, u1, u2, u3] = &self.unk_count;
        let mut out = BitBoard::default();
        for x in 0..N {
            let one = u0.cols[x] & !u1.cols[x] & !u2.cols[x] & !u3.cols[x];
            let two = !u0.cols[x] & u1.cols[x] & !u2.cols[x] & !u3.cols[x];
            out.cols[x] = one | two;
        }
        out
    }

    /// Whether the cached count planes agree with a fresh recount.
    #[cfg(test)]
    pub fn counts_match_recount(&self) -> bool {
        self.on_count == self.state.count_neighbourhood()
            && self.unk_count == self.unknown.count_neighbourhood()
    }
}
