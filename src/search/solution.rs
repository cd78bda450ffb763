//! Catalyst solution representation

use crate::life::{emit_marked, emit_rle, BitBoard};
use serde::{Deserialize, Serialize};

/// A reported catalyst: a stable background that perturbed the pattern and
/// recovered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Combined starting pattern and stable background in the marking RLE
    /// dialect (`C` known stable, `A` live only, `B` still unknown).
    pub winner_rle: String,
    /// Plain RLE of the completed stable background plus the starting
    /// pattern, when stabilisation succeeded.
    pub completed_rle: Option<String>,
    /// Generation at which recovery was confirmed.
    pub found_gen: u32,
    /// Generation of first interaction with the background.
    pub interaction_gen: u32,
    /// Known-on cells of the stable background.
    pub stable_cells: usize,
    /// Search-area cells still undetermined when the solution was found.
    pub undetermined_cells: usize,

    #[serde(skip)]
    pub stable_board: BitBoard,
    #[serde(skip)]
    pub unknown_board: BitBoard,
    #[serde(skip)]
    pub starting_board: BitBoard,
    #[serde(skip)]
    pub completed_board: Option<BitBoard>,
}

impl Solution {
    pub fn new(
        starting: BitBoard,
        stable_state: BitBoard,
        stable_unknown: BitBoard,
        found_gen: u32,
        interaction_gen: u32,
    ) -> Self {
        let state = starting | stable_state;
        let marked = stable_unknown | stable_state;
        Self {
            winner_rle: emit_marked(&state, &marked),
            completed_rle: None,
            found_gen,
            interaction_gen,
            stable_cells: stable_state.pop() as usize,
            undetermined_cells: stable_unknown.pop() as usize,
            stable_board: stable_state,
            unknown_board: stable_unknown,
            starting_board: starting,
            completed_board: None,
        }
    }

    /// Attach a completed stable background.
    pub fn set_completed(&mut self, completed: BitBoard) {
        self.completed_rle = Some(emit_rle(&(completed | self.starting_board)));
        self.completed_board = Some(completed);
    }
}
