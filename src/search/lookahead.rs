//! Multi-generation lookahead and branch-cell selection
//!
//! After the committed trajectory stalls on active uncertainty, the driver
//! simulates a few more conservative generations without committing them,
//! prunes branches that already violate a bound, and picks the cell whose
//! stable neighbourhood is branched on next.

use super::driver::SearchState;
use super::unknown::UnknownState;
use crate::life::BitBoard;

/// How many uncommitted generations to look ahead.
pub const MAX_LOOKAHEAD_GENS: usize = 6;

/// A short uncommitted continuation of the current state.
pub struct Lookahead {
    pub gens: [UnknownState; MAX_LOOKAHEAD_GENS],
    pub len: usize,
}

impl SearchState {
    /// Simulate up to `MAX_LOOKAHEAD_GENS` conservative generations,
    /// stopping early once a generation has no known-active cells.
    pub fn populate_lookahead(&self) -> Lookahead {
        let mut gens = [UnknownState::default(); MAX_LOOKAHEAD_GENS];
        gens[0] = self.current;
        let mut len = 1;
        for i in 0..MAX_LOOKAHEAD_GENS - 1 {
            gens[i + 1] = gens[i].uncertain_step_maintaining(&self.stable);
            len += 1;
            if gens[i + 1].active_compared_to(&self.stable).is_empty() {
                break;
            }
        }
        Lookahead { gens, len }
    }

    /// Apply the activity constraints to every lookahead generation,
    /// accumulating ever-active cells along the way.
    pub fn check_lookahead(&mut self, lookahead: &Lookahead) -> bool {
        for i in 0..lookahead.len {
            let g = self.current_gen + i as u32;
            let active = lookahead.gens[i].active_compared_to(&self.stable);
            self.ever_active |= active;

            if g < self.params.min_first_active_gen && !active.is_empty() {
                return false;
            }
            if self.has_interacted
                && g > self.interaction_start + self.params.max_active_window_gens
                && !active.is_empty()
            {
                return false;
            }
            if !self.check_bounds(&active) {
                return false;
            }
        }
        true
    }

    /// Choose the focus cells to branch on: the first non-empty set under
    /// a sequence of successively weaker predicates, earliest generation
    /// first. Returns the focus set, the snapshot it branches on, and the
    /// snapshot's generation number.
    pub fn find_focuses(&self, lookahead: &Lookahead) -> Option<(BitBoard, UnknownState, u32)> {
        let len = lookahead.len;
        let mut focusable = [BitBoard::default(); MAX_LOOKAHEAD_GENS];
        let mut fallback = [BitBoard::default(); MAX_LOOKAHEAD_GENS];
        let mut priority = [BitBoard::default(); MAX_LOOKAHEAD_GENS];

        for i in 1..len {
            let gen = &lookahead.gens[i];
            let prev = &lookahead.gens[i - 1];

            // Cells that turn actively-unknown this generation, away from
            // the already actively-unknown area.
            let become_unknown = (gen.unknown & !gen.unknown_stable) & !prev.unknown;
            let prev_active_unknown = prev.unknown & !prev.unknown_stable;
            focusable[i] = become_unknown & !prev_active_unknown.zoi();

            // The last-resort pool only excludes cells that were already
            // actively unknown, so a stalled advance always yields a focus.
            fallback[i] = (gen.unknown & !gen.unknown_stable) & !prev_active_unknown;

            priority[i] = self.priority_mask(gen);
        }

        let few_unknowns = self.stable.few_unknown_neighbours();
        let zoi = self.stable.state_zoi;

        for pass in 0..8 {
            for i in 1..len {
                let mut mask = focusable[i];
                match pass {
                    0 => mask &= zoi & priority[i] & few_unknowns,
                    1 => mask &= priority[i] & few_unknowns,
                    2 => mask &= zoi & priority[i],
                    3 => mask &= priority[i],
                    4 => mask &= zoi & few_unknowns,
                    5 => mask &= few_unknowns,
                    6 => mask &= zoi,
                    _ => mask = fallback[i],
                }
                if !mask.is_empty() {
                    return Some((
                        mask,
                        lookahead.gens[i - 1],
                        self.current_gen + i as u32 - 1,
                    ));
                }
            }
        }
        None
    }

    /// Cells that must not become active in the given generation: outside
    /// the window the ever-active bounds still allow, or beyond a
    /// saturated population cap. Branching here prunes hardest.
    fn priority_mask(&self, gen: &UnknownState) -> BitBoard {
        let p = &self.params;
        let mut priority = BitBoard::default();
        let active = gen.active_compared_to(&self.stable);

        if p.max_ever_active_cells >= 0
            && self.ever_active.pop() >= p.max_ever_active_cells as u32
        {
            priority |= !self.ever_active;
        }
        if p.ever_active_bounds.0 >= 1 {
            let allowed = self.ever_active.dilate_rect(
                p.ever_active_bounds.0 as usize - 1,
                p.ever_active_bounds.1 as usize - 1,
            );
            priority |= !allowed;
        }

        if p.max_active_cells >= 0 && active.pop() >= p.max_active_cells as u32 {
            priority |= !active;
        }
        if p.active_bounds.0 >= 1 {
            let allowed = active.dilate_rect(
                p.active_bounds.0 as usize - 1,
                p.active_bounds.1 as usize - 1,
            );
            priority |= !allowed;
        }

        priority
    }
}
