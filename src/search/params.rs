//! Resolved, immutable parameters shared by every search state

use crate::config::{FilterKind, Settings};
use crate::life::{parse_pattern, BitBoard, Symmetry};
use anyhow::{Context, Result};
use std::time::Duration;

/// A post-solution acceptance predicate.
#[derive(Debug, Clone)]
pub struct Filter {
    pub mask: BitBoard,
    pub state: BitBoard,
    pub gen: Option<u32>,
    pub kind: FilterKind,
}

/// A stable configuration that disqualifies a solution.
#[derive(Debug, Clone)]
pub struct Forbidden {
    pub mask: BitBoard,
    pub state: BitBoard,
}

/// Everything the search needs, resolved once from the settings and shared
/// read-only by every branch.
#[derive(Debug, Clone)]
pub struct SearchParams {
    pub min_first_active_gen: u32,
    pub max_first_active_gen: u32,
    pub min_active_window_gens: u32,
    pub max_active_window_gens: u32,
    pub min_stable_interval: u32,

    pub max_active_cells: i32,
    pub active_bounds: (i32, i32),
    pub max_ever_active_cells: i32,
    pub ever_active_bounds: (i32, i32),
    pub max_cell_active_window: i32,
    pub max_cell_active_streak: i32,

    pub symmetry: Symmetry,

    /// Live cells of the starting pattern (including known catalyst cells).
    pub starting_state: BitBoard,
    /// Catalyst cells known on in the stable background from the start.
    pub stable_state: BitBoard,
    /// The unknown search area.
    pub search_area: BitBoard,
    pub stator: BitBoard,
    pub has_stator: bool,
    pub glanced: BitBoard,

    pub filters: Vec<Filter>,
    pub forbiddens: Vec<Forbidden>,

    pub stabilise_results: bool,
    pub stabilise_results_timeout: Duration,
    pub minimise_results: bool,
    pub continue_after_success: bool,
    pub print_summary: bool,
}

impl SearchParams {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let pattern = parse_pattern(&settings.pattern)
            .context("Failed to parse the pattern")?
            .shift(-settings.pattern_center[0], -settings.pattern_center[1]);

        let mut filters = Vec::new();
        for spec in &settings.filter {
            let parsed = parse_pattern(&spec.filter)
                .context("Failed to parse a filter pattern")?
                .shift(spec.filter_pos[0], spec.filter_pos[1]);
            filters.push(Filter {
                mask: parsed.on | parsed.unknown,
                state: parsed.on,
                gen: spec.filter_gen,
                kind: spec.filter_type,
            });
        }

        let mut forbiddens = Vec::new();
        for spec in &settings.forbidden {
            let parsed = parse_pattern(&spec.forbidden)
                .context("Failed to parse a forbidden pattern")?
                .shift(spec.forbidden_pos[0], spec.forbidden_pos[1]);
            forbiddens.push(Forbidden {
                mask: parsed.on | parsed.unknown,
                state: parsed.on,
            });
        }

        let stator = pattern.stator;
        Ok(Self {
            min_first_active_gen: settings.first_active_range[0],
            max_first_active_gen: settings.first_active_range[1],
            min_active_window_gens: settings.active_window_range[0],
            max_active_window_gens: settings.active_window_range[1],
            min_stable_interval: settings.min_stable_interval,
            max_active_cells: settings.max_active_cells,
            active_bounds: (settings.active_bounds[0], settings.active_bounds[1]),
            max_ever_active_cells: settings.max_ever_active_cells,
            ever_active_bounds: (settings.ever_active_bounds[0], settings.ever_active_bounds[1]),
            max_cell_active_window: settings.max_cell_active_window,
            max_cell_active_streak: settings.max_cell_active_streak,
            symmetry: settings.symmetry,
            starting_state: pattern.on,
            stable_state: pattern.stable_on,
            search_area: pattern.unknown,
            has_stator: !stator.is_empty(),
            stator,
            glanced: pattern.glanced,
            filters,
            forbiddens,
            stabilise_results: settings.stabilise_results,
            stabilise_results_timeout: Duration::from_secs(settings.stabilise_results_timeout),
            minimise_results: settings.minimise_results,
            continue_after_success: settings.continue_after_success,
            print_summary: settings.print_summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_resolve() {
        let params = SearchParams::from_settings(&Settings::default()).unwrap();
        // The default pattern is a glider plus a 4x4 search area.
        assert_eq!(params.starting_state.pop(), 5);
        assert_eq!(params.search_area.pop(), 16);
        assert!(params.stable_state.is_empty());
        assert!(!params.has_stator);
        assert_eq!(params.min_stable_interval, 4);
    }

    #[test]
    fn test_pattern_center_translates() {
        let mut settings = Settings::default();
        settings.pattern = "A!".to_string();
        settings.pattern_center = [2, 3];
        let params = SearchParams::from_settings(&settings).unwrap();
        // The centre offset moves the pattern the opposite way, toroidally.
        assert!(params.starting_state.get((62, 61)));
    }

    #[test]
    fn test_stator_cells_are_stable_and_live() {
        let mut settings = Settings::default();
        settings.pattern = "D!".to_string();
        let params = SearchParams::from_settings(&settings).unwrap();
        assert!(params.has_stator);
        assert!(params.stator.get((0, 0)));
        assert!(params.stable_state.get((0, 0)));
        assert!(params.starting_state.get((0, 0)));
    }

    #[test]
    fn test_bad_pattern_is_an_error() {
        let mut settings = Settings::default();
        settings.pattern = "3Z!".to_string();
        assert!(SearchParams::from_settings(&settings).is_err());
    }

    #[test]
    fn test_filters_resolve_with_offset() {
        let mut settings = Settings::default();
        settings.filter = vec![crate::config::FilterSpec {
            filter: "A!".to_string(),
            filter_pos: [5, 6],
            filter_gen: None,
            filter_type: FilterKind::Exact,
        }];
        let params = SearchParams::from_settings(&settings).unwrap();
        assert_eq!(params.filters.len(), 1);
        assert!(params.filters[0].state.get((5, 6)));
        assert!(params.filters[0].mask.get((5, 6)));
    }
}
