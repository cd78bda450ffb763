//! Constraint propagation over the stable background
//!
//! Stability under B3/S23 is a local constraint: an on cell must be able to
//! reach a live-neighbour count of 2 or 3, an off cell must be able to avoid
//! exactly 3. The per-cell deductions below are evaluated bit-parallel over
//! neighbourhood-count bit-planes; the boolean expressions between the
//! `Autogenerated` markers are derived from the B3/S23 truth table and are
//! the correctness contract of this module.

use super::state::{PropagateResult, StableState};
use crate::life::board::{BitBoard, Cell, N};

#[inline]
fn half_add(a: u64, b: u64) -> (u64, u64) {
    (a ^ b, a & b)
}

#[inline]
fn full_add(a: u64, b: u64, c: u64) -> (u64, u64) {
    (a ^ b ^ c, (a & b) | (c & (a ^ b)))
}

/// Per-cell deduction outputs for one column word.
struct ColumnDeductions {
    set_off: u64,
    set_on: u64,
    signal_off: u64,
    signal_on: u64,
    abort: u64,
}

/// Evaluate the stability deductions for one column word, given the
/// (centre-inclusive, saturated) neighbourhood count bits.
#[allow(clippy::too_many_arguments)]
fn deduce(
    stateon: u64,
    stateunk: u64,
    gl: u64,
    dr: u64,
    on2: u64,
    on1: u64,
    on0: u64,
    unk3: u64,
    unk2: u64,
    unk1: u64,
    unk0: u64,
) -> ColumnDeductions {
    let mut set_off = 0u64;
    let mut set_on = 0u64;
    let mut signal_off = 0u64;
    let mut signal_on = 0u64;
    let mut abort = 0u64;

    // Begin Autogenerated
    set_off |= on2;
    set_off |= !on1 & (!unk1 | (!on0 & !unk0));
    set_on |= !on2 & on1 & on0 & !unk1;
    abort |= stateon & on2 & (on1 | on0);
    abort |= stateon & !on1 & on0 & !unk1;
    abort |= on1 & !unk1 & !unk0 & ((!stateon & !on2 & on0) | (stateon & !on0));
    signal_off |= !stateunk & !stateon & !on2 & on1 & !on0 & !unk1 & unk0;
    signal_off |= stateon & !on1 & ((!on0 & unk1) | (!unk1 & unk0));
    signal_on |= !stateunk & !stateon & !on2 & on1 & on0 & !unk1;
    signal_on |= stateon & on1 & !on0 & !unk1;
    signal_on |= stateon & !on1 & on0 & !unk0;
    // End Autogenerated

    // A glanced cell with an ON neighbour
    signal_off |= gl & !on2 & !on1 & on0;
    // A glanced cell with too many neighbours
    abort |= gl & (on2 | on1);
    // A glanced cell that is ON
    abort |= gl & stateon;

    // A glancedON cell with 2 ON/UNK neighbours
    signal_on |= dr & !unk3 & !unk2 & !on2 & !on1 & ((!unk1 & unk0 & on0) | (unk1 & !unk0 & !on0));
    // A glancedON cell with too few neighbours
    abort |= dr
        & !unk3
        & !unk2
        & !unk1
        & !on2
        & !on1
        & ((!unk0 & !on0) | (unk0 & !on0) | (!unk0 & on0));
    // A glancedON cell that is ON
    abort |= dr & stateon;

    signal_off &= unk0 | unk1;
    signal_on &= unk0 | unk1;

    ColumnDeductions {
        set_off,
        set_on,
        signal_off,
        signal_on,
        abort,
    }
}

impl StableState {
    /// One global deduction round. Resolves forced unknowns, dilates
    /// signal outputs over each cell's zone of influence, and reports
    /// inconsistency when a neighbourhood admits no stable assignment or
    /// when an unknown cell is signalled both on and off.
    pub fn propagate_stable_step(&mut self) -> PropagateResult {
        let start_unknown = self.unknown;

        let on = self.state.count_neighbourhood();
        let unk = self.unknown.count_neighbourhood();

        let mut new_off = BitBoard::default();
        let mut new_on = BitBoard::default();
        let mut new_signal_off = BitBoard::default();
        let mut new_signal_on = BitBoard::default();

        let mut has_set_off = 0u64;
        let mut has_set_on = 0u64;
        let mut has_signal_off = 0u64;
        let mut has_signal_on = 0u64;
        let mut has_abort = 0u64;

        for x in 0..N {
            let on3 = on[3].cols[x];
            let mut on2 = on[2].cols[x];
            let mut on1 = on[1].cols[x];
            let mut on0 = on[0].cols[x];
            on2 |= on3;
            on1 |= on3;
            on0 |= on3;

            let unk3 = unk[3].cols[x];
            let unk2 = unk[2].cols[x];
            let mut unk1 = unk[1].cols[x];
            let mut unk0 = unk[0].cols[x];
            unk1 |= unk2 | unk3;
            unk0 |= unk2 | unk3;

            let stateunk = self.unknown.cols[x];
            let d = deduce(
                self.state.cols[x],
                stateunk,
                self.glanced.cols[x],
                self.glanced_on.cols[x],
                on2,
                on1,
                on0,
                unk3,
                unk2,
                unk1,
                unk0,
            );

            new_off.cols[x] = d.set_off & stateunk;
            new_on.cols[x] = d.set_on & stateunk;
            new_signal_off.cols[x] = d.signal_off;
            new_signal_on.cols[x] = d.signal_on;

            has_set_off |= d.set_off;
            has_set_on |= d.set_on;
            has_signal_off |= d.signal_off;
            has_signal_on |= d.signal_on;
            has_abort |= d.abort;
        }

        if has_abort != 0 {
            return PropagateResult::INCONSISTENT;
        }

        let off_zoi = new_signal_off.zoi();
        let on_zoi = new_signal_on.zoi();
        if has_signal_on != 0
            && has_signal_off != 0
            && !(on_zoi & off_zoi & self.unknown).is_empty()
        {
            return PropagateResult::INCONSISTENT;
        }

        if has_set_on != 0 {
            self.state |= new_on;
            self.unknown &= !new_on;
        }
        if has_set_off != 0 {
            self.unknown &= !new_off;
        }
        if has_signal_off != 0 {
            self.unknown &= !off_zoi;
        }
        if has_signal_on != 0 {
            self.state |= on_zoi & self.unknown;
            self.unknown &= !on_zoi;
        }

        let changed = self.unknown != start_unknown;
        PropagateResult {
            consistent: true,
            changed,
            edges_changed: changed,
        }
    }

    /// Fixpoint of `propagate_stable_step`, then refresh the cached zone
    /// of influence and count planes.
    pub fn propagate_stable(&mut self) -> PropagateResult {
        let mut changed = false;
        loop {
            let result = self.propagate_stable_step();
            if !result.consistent {
                return PropagateResult::INCONSISTENT;
            }
            if !result.changed {
                break;
            }
            changed = true;
        }

        self.state_zoi = self.state.zoi();
        self.recount();
        PropagateResult {
            consistent: true,
            changed,
            edges_changed: changed,
        }
    }

    /// One deduction round restricted to the +-2 column band around
    /// `column`, used to re-propagate cheaply after a single cell change.
    pub fn propagate_column_step(&mut self, column: usize) -> PropagateResult {
        let band = |i: usize| (column + i + N - 2) % N;

        let mut nearby_stable = [0u64; 6];
        let mut nearby_unknown = [0u64; 6];
        let mut nearby_glanced = [0u64; 6];
        let mut nearby_glanced_on = [0u64; 6];
        for i in 0..6 {
            let c = band(i);
            nearby_stable[i] = self.state.cols[c];
            nearby_unknown[i] = self.unknown.cols[c];
            nearby_glanced[i] = self.glanced.cols[c];
            nearby_glanced_on[i] = self.glanced_on.cols[c];
        }

        let mut oncol0 = [0u64; 6];
        let mut oncol1 = [0u64; 6];
        let mut unkcol0 = [0u64; 6];
        let mut unkcol1 = [0u64; 6];
        for i in 0..6 {
            let a = nearby_stable[i];
            let l = a.rotate_left(1);
            let r = a.rotate_right(1);
            oncol0[i] = l ^ r ^ a;
            oncol1[i] = ((l ^ r) & a) | (l & r);

            let a = nearby_unknown[i];
            let l = a.rotate_left(1);
            let r = a.rotate_right(1);
            unkcol0[i] = l ^ r ^ a;
            unkcol1[i] = ((l ^ r) & a) | (l & r);
        }

        let mut new_off = [0u64; 6];
        let mut new_on = [0u64; 6];
        let mut signals_off = [0u64; 6];
        let mut signals_on = [0u64; 6];
        let mut signalled_off = [0u64; 6];
        let mut signalled_on = [0u64; 6];
        let mut abort = 0u64;

        for i in 1..5 {
            let idx_u = i - 1;
            let idx_b = i + 1;

            let (uc0, uc_carry0) = half_add(oncol0[idx_u], oncol0[i]);
            let (uc1, uc2) = full_add(oncol1[idx_u], oncol1[i], uc_carry0);
            let (on0_raw, on_carry0) = half_add(uc0, oncol0[idx_b]);
            let (on1_raw, on_carry1) = full_add(uc1, oncol1[idx_b], on_carry0);
            let (on2_raw, on3) = half_add(uc2, on_carry1);
            let on2 = on2_raw | on3;
            let on1 = on1_raw | on3;
            let on0 = on0_raw | on3;

            let (ucunk0, ucunk_carry0) = half_add(unkcol0[idx_u], unkcol0[i]);
            let (ucunk1, ucunk2) = full_add(unkcol1[idx_u], unkcol1[i], ucunk_carry0);
            let (unk0_raw, unk_carry0) = half_add(ucunk0, unkcol0[idx_b]);
            let (unk1_raw, unk_carry1) = full_add(ucunk1, unkcol1[idx_b], unk_carry0);
            let (unk2, unk3) = half_add(ucunk2, unk_carry1);
            let unk1 = unk1_raw | unk2 | unk3;
            let unk0 = unk0_raw | unk2 | unk3;

            let stateunk = nearby_unknown[i];
            let d = deduce(
                nearby_stable[i],
                stateunk,
                nearby_glanced[i],
                nearby_glanced_on[i],
                on2,
                on1,
                on0,
                unk3,
                unk2,
                unk1,
                unk0,
            );

            abort |= d.abort;
            new_off[i] = d.set_off & stateunk;
            new_on[i] = d.set_on & stateunk;
            signals_off[i] = d.signal_off;
            signals_on[i] = d.signal_on;
        }

        if abort != 0 {
            return PropagateResult::INCONSISTENT;
        }

        for i in 1..5 {
            let smear_off =
                signals_off[i].rotate_left(1) | signals_off[i] | signals_off[i].rotate_right(1);
            signalled_off[i - 1] |= smear_off;
            signalled_off[i] |= smear_off;
            signalled_off[i + 1] |= smear_off;

            let smear_on =
                signals_on[i].rotate_left(1) | signals_on[i] | signals_on[i].rotate_right(1);
            signalled_on[i - 1] |= smear_on;
            signalled_on[i] |= smear_on;
            signalled_on[i + 1] |= smear_on;
        }

        let mut overlaps = 0u64;
        for i in 0..6 {
            overlaps |= nearby_unknown[i] & signalled_off[i] & signalled_on[i];
        }
        if overlaps != 0 {
            return PropagateResult::INCONSISTENT;
        }

        for i in 1..5 {
            let c = band(i);
            self.state.cols[c] |= new_on[i];
            self.unknown.cols[c] &= !new_off[i];
            self.unknown.cols[c] &= !new_on[i];
        }
        for i in 0..6 {
            let c = band(i);
            self.state.cols[c] |= signalled_on[i] & nearby_unknown[i];
            self.unknown.cols[c] &= !signalled_on[i];
            self.unknown.cols[c] &= !signalled_off[i];
        }

        let mut unknown_changes = 0u64;
        let mut edge_changes = 0u64;
        for i in 0..6 {
            let diff = self.unknown.cols[band(i)] ^ nearby_unknown[i];
            unknown_changes |= diff;
            if i == 0 || i == 1 || i == 4 || i == 5 {
                edge_changes |= diff;
            }
        }

        PropagateResult {
            consistent: true,
            changed: unknown_changes != 0,
            edges_changed: edge_changes != 0,
        }
    }

    /// Grow the cached zone of influence around a changed column.
    fn update_zoi_column(&mut self, column: usize) {
        let mut temp = [0u64; 4];
        for (i, t) in temp.iter_mut().enumerate() {
            let col = self.state.cols[(column + i + N - 1) % N];
            *t = col | col.rotate_left(1) | col.rotate_right(1);
        }
        self.state_zoi.cols[(column + N - 1) % N] |= temp[0] | temp[1];
        for i in 1..3 {
            self.state_zoi.cols[(column + i + N - 1) % N] |= temp[i - 1] | temp[i] | temp[i + 1];
        }
        self.state_zoi.cols[(column + 2 + N) % N] |= temp[2] | temp[3];
    }

    /// Column-band fixpoint after a single cell change.
    pub fn propagate_column(&mut self, column: usize) -> PropagateResult {
        let mut changed = false;
        let mut edges_changed = false;
        loop {
            let result = self.propagate_column_step(column);
            if !result.consistent {
                return PropagateResult::INCONSISTENT;
            }
            changed |= result.changed;
            edges_changed |= result.edges_changed;
            if !result.changed {
                break;
            }
        }
        self.update_zoi_column(column);
        self.recount();
        PropagateResult {
            consistent: true,
            changed,
            edges_changed,
        }
    }

    /// Trial-propagate every cell of `cells`: try it on, try it off, and
    /// commit whatever both outcomes force or agree on.
    pub fn test_unknowns(&mut self, cells: &BitBoard) -> PropagateResult {
        let mut remaining = *cells & self.unknown;
        let mut change = false;
        while let Some(cell) = remaining.first_on() {
            remaining.erase(cell);

            let mut on_search = self.clone();
            on_search.set_cell(cell, true);
            let on_result = on_search.propagate_column(cell.0);

            let mut off_search = self.clone();
            off_search.set_cell(cell, false);
            let off_result = off_search.propagate_column(cell.0);

            match (on_result.consistent, off_result.consistent) {
                (false, false) => return PropagateResult::INCONSISTENT,
                (true, false) => {
                    *self = on_search;
                    change = true;
                }
                (false, true) => {
                    *self = off_search;
                    change = true;
                }
                (true, true) => {
                    if on_result.changed && off_result.changed {
                        change |= self.commit_agreement(&on_search, &off_search);
                    }
                }
            }

            remaining &= self.unknown;
        }
        self.finish_trials(change)
    }

    /// Like `test_unknowns` for the unknown cells around `center`, but
    /// recursing so that deductions inside the neighbourhood compound.
    pub fn test_unknown_neighbourhood(&mut self, center: Cell) -> PropagateResult {
        let mut remaining = BitBoard::cell(center).zoi() & self.unknown;
        let mut change = false;
        while let Some(cell) = remaining.first_on() {
            remaining.erase(cell);

            let mut on_search = self.clone();
            on_search.set_cell(cell, true);
            let mut on_result = on_search.propagate_column(cell.0);
            let mut on_changed = on_result.changed;
            if on_result.consistent {
                on_result = on_search.test_unknown_neighbourhood(center);
                on_changed = on_changed || on_result.changed;
            }

            let mut off_search = self.clone();
            off_search.set_cell(cell, false);
            let mut off_result = off_search.propagate_column(cell.0);
            let mut off_changed = off_result.changed;
            if off_result.consistent {
                off_result = off_search.test_unknown_neighbourhood(center);
                off_changed = off_changed || off_result.changed;
            }

            match (on_result.consistent, off_result.consistent) {
                (false, false) => return PropagateResult::INCONSISTENT,
                (true, false) => {
                    *self = on_search;
                    change = true;
                }
                (false, true) => {
                    *self = off_search;
                    change = true;
                }
                (true, true) => {
                    if on_changed && off_changed {
                        change |= self.commit_agreement(&on_search, &off_search);
                    }
                }
            }

            remaining &= self.unknown;
        }
        self.finish_trials(change)
    }

    /// Run `test_unknown_neighbourhood` for every cell of `cells`.
    pub fn test_unknown_neighbourhoods(&mut self, cells: &BitBoard) -> PropagateResult {
        let mut remaining = *cells;
        let mut change = false;
        while let Some(cell) = remaining.first_on() {
            remaining.erase(cell);
            let result = self.test_unknown_neighbourhood(cell);
            if !result.consistent {
                return PropagateResult::INCONSISTENT;
            }
            change = change || result.changed;
        }
        PropagateResult {
            consistent: true,
            changed: change,
            edges_changed: change,
        }
    }

    /// Commit the cells that the on-trial and off-trial resolved to the
    /// same value.
    fn commit_agreement(&mut self, on_search: &StableState, off_search: &StableState) -> bool {
        let agreement = self.unknown
            & !on_search.unknown
            & !off_search.unknown
            & !(on_search.state ^ off_search.state);
        if agreement.is_empty() {
            return false;
        }
        for cell in agreement.iter_cells() {
            self.set_cell(cell, on_search.state.get(cell));
        }
        true
    }

    fn finish_trials(&mut self, change: bool) -> PropagateResult {
        if change {
            let consistent = self.propagate_stable().consistent;
            PropagateResult {
                consistent,
                changed: true,
                edges_changed: true,
            }
        } else {
            PropagateResult {
                consistent: true,
                changed: false,
                edges_changed: false,
            }
        }
    }
}
