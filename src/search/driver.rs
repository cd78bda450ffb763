//! Recursive backtracking search driver
//!
//! Each branch owns a full copy of the search state; siblings never share
//! mutable data. The first child of a branch copies, the second reuses the
//! current frame through the outer loop, so stack depth is bounded by the
//! depth of the decision tree.

use super::countdown::Countdown;
use super::params::SearchParams;
use super::solution::Solution;
use super::unknown::UnknownState;
use crate::life::{BitBoard, Cell};
use crate::stable::StableState;
use std::sync::Arc;

/// Shared accumulator threaded through the recursion.
#[derive(Default)]
pub struct SearchOutcome {
    pub solutions: Vec<Solution>,
    /// Set once a solution ends the search in single-solution mode.
    pub done: bool,
    /// Suppress solution printing (used by library-level tests).
    pub quiet: bool,
}

/// The complete state of one branch of the search.
#[derive(Clone)]
pub struct SearchState {
    pub stable: StableState,
    pub current: UnknownState,

    pub pending_focuses: BitBoard,
    pub focus_generation: UnknownState,
    pub focus_gen_number: u32,

    pub ever_active: BitBoard,
    pub current_gen: u32,
    pub has_interacted: bool,
    pub interaction_start: u32,
    pub recovered_time: u32,

    pub active_timer: Countdown,
    pub streak_timer: Countdown,

    pub params: Arc<SearchParams>,
}

impl SearchState {
    /// Build the root search state: assert the stator, propagate the
    /// stable background and check generation zero. `None` means the
    /// configuration is inconsistent and the search has no branches.
    pub fn new(params: Arc<SearchParams>) -> Option<Self> {
        let unknown = params.search_area & !params.stable_state;
        let mut stable = StableState::new(params.stable_state, unknown);
        stable.glanced = params.glanced & !stable.state & !stable.unknown;

        // Stator cells must be on in the stable background.
        for cell in (params.stator & !stable.state).iter_cells() {
            if stable.unknown.get(cell) {
                stable.set_cell(cell, true);
            } else {
                return None;
            }
        }

        if !stable.propagate_stable().consistent {
            return None;
        }

        let mut current = UnknownState::initial(params.starting_state, &stable);
        current.transfer_stable(&stable);

        let active_window = params.max_cell_active_window.max(0) as u32;
        let active_streak = params.max_cell_active_streak.max(0) as u32;

        let mut state = Self {
            stable,
            current,
            pending_focuses: BitBoard::default(),
            focus_generation: UnknownState::default(),
            focus_gen_number: 0,
            ever_active: BitBoard::default(),
            current_gen: 0,
            has_interacted: false,
            interaction_start: 0,
            recovered_time: 0,
            active_timer: Countdown::new(active_window),
            streak_timer: Countdown::new(active_streak),
            params,
        };

        let active = state.current.active_compared_to(&state.stable);
        state.ever_active |= active;
        if !state.check_generation(&active) {
            return None;
        }
        Some(state)
    }

    /// One step of the search: settle the stable side, advance as far as
    /// the current state stays determined, then branch on a focus cell.
    pub fn search_step(&mut self, out: &mut SearchOutcome) {
        loop {
            if out.done {
                return;
            }

            if self.pending_focuses.is_empty() {
                if !self.stable.propagate_stable().consistent {
                    return;
                }
                self.current.transfer_stable(&self.stable);

                if !self.try_advance(out) {
                    return;
                }

                let lookahead = self.populate_lookahead();
                if !self.check_lookahead(&lookahead) {
                    return;
                }

                match self.find_focuses(&lookahead) {
                    Some((focuses, snapshot, snapshot_gen)) => {
                        self.pending_focuses = focuses;
                        self.focus_generation = snapshot;
                        self.focus_gen_number = snapshot_gen;
                    }
                    // Nothing left to decide on this branch.
                    None => return,
                }
            }

            let Some(focus) = self.pending_focuses.first_on() else {
                continue;
            };

            let determined = self.focus_generation.known_next(focus);
            let cell = self.stable.unknown_neighbour(focus);

            let Some(cell) = cell else {
                self.erase_focus(focus);
                continue;
            };
            if determined {
                self.erase_focus(focus);
                continue;
            }

            // Branch on the cell, on first. The first child copies the
            // frame, the second reuses it through the loop.
            let mut child = self.clone();
            if child.assign(cell, true) {
                child.search_step(out);
            }
            if out.done {
                return;
            }

            if !self.assign(cell, false) {
                return;
            }
        }
    }

    /// Commit a branch decision: write the cell (and its symmetry image)
    /// into the stable state and the focus snapshot, re-propagate the
    /// touched columns, and run a one-generation feasibility filter.
    fn assign(&mut self, cell: Cell, value: bool) -> bool {
        self.stable.set_cell(cell, value);
        self.focus_generation.set_known(cell, value);

        let image = self.params.symmetry.transform_cell(cell);
        if image != cell {
            if self.stable.unknown.get(image) {
                self.stable.set_cell(image, value);
                self.focus_generation.set_known(image, value);
            } else if self.stable.state.get(image) != value {
                // The image was already determined and disagrees.
                return false;
            }
        }

        if !self.stable.propagate_column(cell.0).consistent {
            return false;
        }
        if image.0 != cell.0 && !self.stable.propagate_column(image.0).consistent {
            return false;
        }

        self.quick_filter()
    }

    /// A cheap feasibility check after a branch assignment: one
    /// conservative step from the focus snapshot, with the next
    /// generation's constraints applied.
    fn quick_filter(&self) -> bool {
        let next = self
            .focus_generation
            .uncertain_step_maintaining(&self.stable);
        let active = next.active_compared_to(&self.stable);
        let g = self.focus_gen_number + 1;
        let p = &self.params;

        if g < p.min_first_active_gen && !active.is_empty() {
            return false;
        }
        if self.has_interacted
            && g > self.interaction_start + p.max_active_window_gens
            && !active.is_empty()
        {
            return false;
        }

        if p.max_active_cells >= 0 && active.pop() > p.max_active_cells as u32 {
            return false;
        }
        if p.active_bounds.0 >= 0 {
            let (w, h) = active.width_height();
            if w > p.active_bounds.0 as u32 || h > p.active_bounds.1 as u32 {
                return false;
            }
        }

        let ever = self.ever_active | active;
        if p.max_ever_active_cells >= 0 && ever.pop() > p.max_ever_active_cells as u32 {
            return false;
        }
        if p.ever_active_bounds.0 >= 0 {
            let (w, h) = ever.width_height();
            if w > p.ever_active_bounds.0 as u32 || h > p.ever_active_bounds.1 as u32 {
                return false;
            }
        }
        true
    }

    fn erase_focus(&mut self, focus: Cell) {
        self.pending_focuses.erase(focus);
        self.pending_focuses
            .erase(self.params.symmetry.transform_cell(focus));
    }

    /// Advance while each next generation is fully determined (up to
    /// stable-derived uncertainty), applying the per-generation
    /// constraints. Returns `false` when the branch is finished, whether
    /// pruned or solved.
    pub fn try_advance(&mut self, out: &mut SearchOutcome) -> bool {
        while self.try_advance_one() {
            let active = self.current.active_compared_to(&self.stable);
            self.ever_active |= active;

            if !self.tick_timers(&active) {
                return false;
            }
            if !self.check_generation(&active) {
                return false;
            }

            if self.has_interacted && self.recovered_time >= self.params.min_stable_interval {
                let settled = self.current_gen - self.recovered_time;
                let window = settled.saturating_sub(self.interaction_start);
                if window >= self.params.min_active_window_gens {
                    self.report_solution(out);
                }
                return false;
            }
        }
        true
    }

    /// Advance one generation if no active uncertainty remains in the
    /// successor. Tracks interaction and recovery.
    pub fn try_advance_one(&mut self) -> bool {
        let next = self.current.uncertain_step_maintaining(&self.stable);
        let fully_known = (next.unknown ^ next.unknown_stable).is_empty();
        if !fully_known {
            return false;
        }

        if !self.has_interacted {
            let stepped_alone = (self.current.state & !self.stable.state).step();
            let deviation = ((next.state ^ stepped_alone) & !self.stable.state)
                | (self.stable.state & !next.state & !next.unknown);
            if !deviation.is_empty() {
                self.has_interacted = true;
                self.interaction_start = self.current_gen;
            }
        }

        self.current = next;
        self.current_gen += 1;

        if self.has_interacted {
            let recovered = ((self.stable.state ^ self.current.state) & self.stable.state_zoi)
                .is_empty();
            if recovered {
                self.recovered_time += 1;
            } else {
                self.recovered_time = 0;
            }
        }

        true
    }

    /// The per-generation constraints of the committed trajectory.
    fn check_generation(&self, active: &BitBoard) -> bool {
        let p = &self.params;
        let g = self.current_gen;

        if g < p.min_first_active_gen && !active.is_empty() {
            return false;
        }
        if !self.has_interacted && g > p.max_first_active_gen {
            return false;
        }
        if self.has_interacted
            && g > self.interaction_start + p.max_active_window_gens
            && !active.is_empty()
        {
            return false;
        }

        if !self.check_bounds(active) {
            return false;
        }

        if p.has_stator && !(p.stator & !self.current.state & !self.current.unknown).is_empty() {
            return false;
        }

        true
    }

    /// Population and bounding-box caps for active and ever-active cells.
    pub(super) fn check_bounds(&self, active: &BitBoard) -> bool {
        let p = &self.params;

        if p.max_active_cells >= 0 && active.pop() > p.max_active_cells as u32 {
            return false;
        }
        if p.active_bounds.0 >= 0 {
            let (w, h) = active.width_height();
            if w > p.active_bounds.0 as u32 || h > p.active_bounds.1 as u32 {
                return false;
            }
        }

        if p.max_ever_active_cells >= 0 && self.ever_active.pop() > p.max_ever_active_cells as u32
        {
            return false;
        }
        if p.ever_active_bounds.0 >= 0 {
            let (w, h) = self.ever_active.width_height();
            if w > p.ever_active_bounds.0 as u32 || h > p.ever_active_bounds.1 as u32 {
                return false;
            }
        }

        true
    }

    /// Per-cell activity caps via the countdown planes.
    fn tick_timers(&mut self, active: &BitBoard) -> bool {
        if self.params.max_cell_active_window >= 0 {
            self.active_timer.start(active);
            self.active_timer.tick();
            if !(self.active_timer.finished() & *active).is_empty() {
                return false;
            }
        }

        if self.params.max_cell_active_streak >= 0 {
            self.streak_timer.start(active);
            self.streak_timer.tick();
            if !(self.streak_timer.finished() & *active).is_empty() {
                return false;
            }
            self.streak_timer.reset(&!*active);
        }

        true
    }

    /// Emit a recovered catalyst, unless a filter or forbidden pattern
    /// rejects it.
    fn report_solution(&self, out: &mut SearchOutcome) {
        for filter in &self.params.filters {
            let passed = match filter.kind {
                crate::config::FilterKind::Exact => {
                    let matches_gen = filter.gen.map_or(true, |g| self.current_gen >= g);
                    matches_gen
                        && ((self.current.state ^ filter.state) & filter.mask).is_empty()
                }
                crate::config::FilterKind::Ever => {
                    (filter.state & filter.mask & !self.ever_active).is_empty()
                }
            };
            if !passed {
                return;
            }
        }

        for forbidden in &self.params.forbiddens {
            if ((self.stable.state ^ forbidden.state) & forbidden.mask).is_empty() {
                return;
            }
        }

        let mut solution = Solution::new(
            self.params.starting_state,
            self.stable.state,
            self.stable.unknown,
            self.current_gen,
            self.interaction_start,
        );

        if self.params.stabilise_results {
            if let Some(completed) = self
                .stable
                .complete_stable(self.params.stabilise_results_timeout, self.params.minimise_results)
            {
                solution.set_completed(completed);
            }
        }

        if !out.quiet {
            println!("Winner:");
            println!("{}", solution.winner_rle);
            if self.params.stabilise_results {
                match &solution.completed_rle {
                    Some(rle) => {
                        println!("Completed:");
                        println!("{}", rle);
                    }
                    None => println!("Completed: (no stable completion within timeout)"),
                }
            }
        }

        out.solutions.push(solution);
        if !self.params.continue_after_success {
            out.done = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn params_from(settings: &Settings) -> Arc<SearchParams> {
        Arc::new(SearchParams::from_settings(settings).unwrap())
    }

    fn block_cells() -> [Cell; 4] {
        [(10, 10), (11, 10), (10, 11), (11, 11)]
    }

    /// A state with a known stable background and a known current state,
    /// no unknowns anywhere.
    fn concrete_state(settings: &Settings, stable: BitBoard, current: BitBoard) -> SearchState {
        let params = params_from(settings);
        let mut state = SearchState::new(params).unwrap();
        state.stable = StableState::new(stable, BitBoard::default());
        state.current = UnknownState {
            state: current,
            unknown: BitBoard::default(),
            unknown_stable: BitBoard::default(),
        };
        state
    }

    fn harmless_settings() -> Settings {
        // A pattern far away from everything the tests construct.
        Settings {
            pattern: "A!".to_string(),
            stabilise_results: false,
            print_summary: false,
            ..Settings::default()
        }
    }

    #[test]
    fn test_spark_next_to_block_interacts() {
        // A single live cell diagonal to a block: the reaction turns the
        // block into a boat, which differs from the background forever.
        let block = BitBoard::from_cells(block_cells());
        let mut settings = harmless_settings();
        settings.active_window_range = [0, 2];
        let mut state =
            concrete_state(&settings, block, block | BitBoard::cell((12, 12)));

        let mut out = SearchOutcome {
            quiet: true,
            ..Default::default()
        };
        let advanced = state.try_advance(&mut out);

        assert!(!advanced, "the activity window must prune this branch");
        assert!(state.has_interacted);
        assert_eq!(state.interaction_start, 0);
        assert!(out.solutions.is_empty());
    }

    #[test]
    fn test_boat_reaction_dynamics() {
        // The same reaction, watched step by step: after one generation
        // the damaged block plus the two births form a boat, a still life.
        let block = BitBoard::from_cells(block_cells());
        let boat = BitBoard::from_cells([(10, 10), (11, 10), (10, 11), (12, 11), (11, 12)]);
        let start = block | BitBoard::cell((12, 12));
        assert_eq!(start.step(), boat);
        assert_eq!(boat.step(), boat);
    }

    #[test]
    fn test_recovery_reports_solution() {
        // A current state identical to the stable background, already
        // marked as having interacted: it stays quiet, so the recovery
        // counter runs out and a solution is reported.
        let block = BitBoard::from_cells(block_cells());
        let mut settings = harmless_settings();
        settings.min_stable_interval = 3;
        let mut state = concrete_state(&settings, block, block);
        state.has_interacted = true;
        state.interaction_start = 0;

        let mut out = SearchOutcome {
            quiet: true,
            ..Default::default()
        };
        let advanced = state.try_advance(&mut out);

        assert!(!advanced);
        assert_eq!(out.solutions.len(), 1);
        assert!(out.done);
        assert_eq!(out.solutions[0].stable_cells, 4);
        assert_eq!(state.recovered_time, 3);
    }

    #[test]
    fn test_max_active_cells_zero_prunes_interaction() {
        let block = BitBoard::from_cells(block_cells());
        let settings = harmless_settings();
        let mut state = concrete_state(&settings, block, block | BitBoard::cell((12, 12)));
        state.params = {
            let mut p = (*state.params).clone();
            p.max_active_cells = 0;
            Arc::new(p)
        };

        let mut out = SearchOutcome {
            quiet: true,
            ..Default::default()
        };
        assert!(!state.try_advance(&mut out));
        assert!(out.solutions.is_empty());
    }

    #[test]
    fn test_blinker_alone_never_interacts() {
        // No stable background at all: the pattern evolves on its own and
        // the first-active deadline eventually prunes the branch.
        let blinker = BitBoard::from_cells([(20, 20), (21, 20), (22, 20)]);
        let mut settings = harmless_settings();
        settings.first_active_range = [0, 10];
        let mut state = concrete_state(&settings, BitBoard::default(), blinker);

        let mut out = SearchOutcome {
            quiet: true,
            ..Default::default()
        };
        assert!(!state.try_advance(&mut out));
        assert!(!state.has_interacted);
        assert!(state.current_gen >= 11);
        assert!(out.solutions.is_empty());
    }

    #[test]
    fn test_stator_violation_prunes() {
        // The stator cell is eaten by the boat reaction: the branch dies
        // as soon as the cell is known off.
        let block = BitBoard::from_cells(block_cells());
        let settings = harmless_settings();
        let mut state = concrete_state(&settings, block, block | BitBoard::cell((12, 12)));
        state.params = {
            let mut p = (*state.params).clone();
            p.stator = BitBoard::cell((11, 11));
            p.has_stator = true;
            Arc::new(p)
        };

        let mut out = SearchOutcome {
            quiet: true,
            ..Default::default()
        };
        assert!(!state.try_advance(&mut out));
        assert!(out.solutions.is_empty());
    }

    #[test]
    fn test_cell_streak_cap_prunes_persistent_activity() {
        // The boat cells stay active forever; a streak cap of 2 kills the
        // branch after a few generations.
        let block = BitBoard::from_cells(block_cells());
        let mut settings = harmless_settings();
        settings.max_cell_active_streak = 2;
        let mut state =
            concrete_state(&settings, block, block | BitBoard::cell((12, 12)));

        let mut out = SearchOutcome {
            quiet: true,
            ..Default::default()
        };
        assert!(!state.try_advance(&mut out));
        assert!(out.solutions.is_empty());
        assert!(state.current_gen <= 5);
    }

    #[test]
    fn test_root_state_from_inconsistent_stator_is_none() {
        // A lone stator cell cannot be stable: the root propagation fails
        // and the search has no branches at all.
        let mut settings = harmless_settings();
        settings.pattern = "D!".to_string();
        assert!(SearchState::new(params_from(&settings)).is_none());
    }

    #[test]
    fn test_assign_respects_symmetry_images() {
        let mut settings = harmless_settings();
        // Two unknown cells mirrored across the vertical axis.
        settings.pattern = "A!".to_string();
        settings.symmetry = crate::life::Symmetry::ReflectX;
        let params = params_from(&settings);
        let mut state = SearchState::new(params).unwrap();

        let unknown = BitBoard::from_cells([(1, 10), (62, 10)]);
        state.stable = StableState::new(BitBoard::default(), unknown);
        state.focus_generation = UnknownState {
            state: BitBoard::default(),
            unknown,
            unknown_stable: unknown,
        };

        assert!(state.assign((1, 10), false));
        assert!(!state.stable.unknown.get((62, 10)));
        assert!(!state.stable.state.get((62, 10)));
    }
}
