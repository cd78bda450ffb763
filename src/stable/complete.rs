//! Post-solution completion of the stable background
//!
//! Once a catalyst is reported, the remaining unknown cells still have to
//! be filled in with some concrete still life. This is a bounded
//! depth-first search with trial propagation as lookahead and the best
//! population found so far as a branch-and-bound cutoff.

use super::state::StableState;
use crate::life::board::{BitBoard, N};
use std::time::{Duration, Instant};

impl StableState {
    /// Resolve the remaining unknowns into a concrete still life, within a
    /// wall-clock timeout. Returns the completed board, or `None` when no
    /// completion was found in time. With `minimise` the search exhausts
    /// the deadline looking for a minimum-population completion.
    pub fn complete_stable(&self, timeout: Duration, minimise: bool) -> Option<BitBoard> {
        let mut best = BitBoard::default();
        let mut max_pop = u32::MAX;
        let mut search_area = if self.state.is_empty() {
            self.unknown
        } else {
            self.state
        };
        let deadline = Instant::now() + timeout;
        let mut found = false;

        loop {
            search_area = search_area.zoi();
            let mut copy = self.clone();
            copy.unknown &= search_area;
            copy.recount();
            found |= copy.complete_stable_step(deadline, minimise, &mut max_pop, &mut best);

            if found || Instant::now() > deadline {
                break;
            }
            if (self.unknown & !search_area).is_empty() {
                break;
            }
        }

        found.then_some(best)
    }

    fn complete_stable_step(
        &mut self,
        deadline: Instant,
        minimise: bool,
        max_pop: &mut u32,
        best: &mut BitBoard,
    ) -> bool {
        if Instant::now() > deadline {
            return false;
        }

        if !self.propagate_stable().consistent {
            return false;
        }

        let mut current_pop = self.state.pop();
        if current_pop >= *max_pop {
            return false;
        }

        let few_unknowns = self.low_unknown_count_cells();
        let result = self.test_unknown_neighbourhoods(&few_unknowns);
        if !result.consistent {
            return false;
        }
        if result.changed {
            current_pop = self.state.pop();
            if current_pop >= *max_pop {
                return false;
            }
        }

        let instabilities = self.state ^ self.state.step();
        if instabilities.is_empty() {
            *best = self.state;
            *max_pop = current_pop;
            return true;
        }

        if !minimise && instabilities.pop() + current_pop >= *max_pop {
            return false;
        }

        let settable = instabilities.zoi() & self.unknown;
        let placement = (settable & self.unknown_count_exactly(2))
            .first_on()
            .or_else(|| (settable & self.unknown_count_exactly(3)).first_on())
            .or_else(|| settable.first_on());
        let Some(placement) = placement else {
            return false;
        };

        let off_result = {
            let mut next = self.clone();
            next.set_cell(placement, false);
            next.complete_stable_step(deadline, minimise, max_pop, best)
        };
        if !minimise && off_result {
            return true;
        }

        // The on branch reuses this frame.
        self.set_cell(placement, true);
        if current_pop + 2 == *max_pop {
            // Any further on cell would break the population bound.
            self.unknown = BitBoard::default();
            self.recount();
        }
        let on_result = self.complete_stable_step(deadline, minimise, max_pop, best);

        off_result || on_result
    }

    /// Cells whose unknown-neighbourhood count is between one and three,
    /// the cheapest places to run trial propagation.
    fn low_unknown_count_cells(&self) -> BitBoard {
        let [u0, u1, u2, u3] = &self.unk_count;
        let mut out = BitBoard::default();
        for x in 0..N {
            out.cols[x] = !u3.cols[x] & !u2.cols[x] & (u1.cols[x] | u0.cols[x]);
        }
        out
    }

    fn unknown_count_exactly(&self, count: u32) -> BitBoard {
        let [u0, u1, u2, u3] = &self.unk_count;
        let mut out = BitBoard::default();
        for x in 0..N {
            out.cols[x] = match count {
                2 => !u0.cols[x] & u1.cols[x] & !u2.cols[x] & !u3.cols[x],
                3 => u0.cols[x] & u1.cols[x] & !u2.cols[x] & !u3.cols[x],
                _ => 0,
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_already_stable() {
        let block = BitBoard::from_cells([(10, 10), (11, 10), (10, 11), (11, 11)]);
        let stable = StableState::new(block, BitBoard::default());
        let completed = stable
            .complete_stable(Duration::from_secs(5), false)
            .expect("block should complete to itself");
        assert_eq!(completed, block);
    }

    #[test]
    fn test_complete_finishes_a_block() {
        // Domino with the two cells below unknown: the only completion is
        // the block.
        let state = BitBoard::from_cells([(10, 10), (11, 10)]);
        let unknown = BitBoard::from_cells([(10, 11), (11, 11)]);
        let stable = StableState::new(state, unknown);

        let completed = stable
            .complete_stable(Duration::from_secs(5), false)
            .expect("domino should complete to a block");
        assert_eq!(completed.step(), completed);
        assert_eq!(
            completed,
            BitBoard::from_cells([(10, 10), (11, 10), (10, 11), (11, 11)])
        );
    }

    #[test]
    fn test_completion_is_a_still_life() {
        // A domino with its whole neighbourhood unknown: whatever comes
        // back must be stable and contain the known on cells.
        let state = BitBoard::from_cells([(20, 20), (21, 20)]);
        let unknown = state.zoi() & !state;
        let stable = StableState::new(state, unknown);

        let completed = stable
            .complete_stable(Duration::from_secs(2), false)
            .expect("a domino extends to a still life");
        assert_eq!(completed.step(), completed);
        assert_eq!(completed & state, state);
    }

    #[test]
    fn test_minimise_prefers_smaller_population() {
        let state = BitBoard::from_cells([(20, 20), (21, 20)]);
        let unknown = state.zoi() & !state;
        let stable = StableState::new(state, unknown);

        let plain = stable.complete_stable(Duration::from_secs(2), false);
        let minimised = stable.complete_stable(Duration::from_secs(2), true);
        if let (Some(plain), Some(minimised)) = (plain, minimised) {
            assert!(minimised.pop() <= plain.pop());
        }
    }
}
