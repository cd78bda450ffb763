//! Catalyst search problem definition

use super::driver::{SearchOutcome, SearchState};
use super::params::SearchParams;
use super::solution::Solution;
use crate::config::Settings;
use crate::utils::{ColorOutput, SolutionFormatter};
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;

/// A configured catalyst search.
pub struct CatalystProblem {
    settings: Settings,
    params: Arc<SearchParams>,
}

impl CatalystProblem {
    /// Create a new problem from settings.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate().context("Invalid settings")?;
        let params = Arc::new(
            SearchParams::from_settings(&settings).context("Failed to resolve search parameters")?,
        );
        Ok(Self { settings, params })
    }

    /// Run the search, printing solutions as they are found.
    pub fn solve(&mut self) -> Result<Vec<Solution>> {
        self.run(false)
    }

    /// Run the search without console output (used by tests and library
    /// callers).
    pub fn solve_quietly(&mut self) -> Result<Vec<Solution>> {
        self.run(true)
    }

    fn run(&mut self, quiet: bool) -> Result<Vec<Solution>> {
        let start_time = Instant::now();
        let mut out = SearchOutcome {
            quiet,
            ..Default::default()
        };

        match SearchState::new(self.params.clone()) {
            Some(mut root) => root.search_step(&mut out),
            None => {
                if !quiet {
                    println!(
                        "{}",
                        ColorOutput::warning("Configuration is inconsistent; nothing to search")
                    );
                }
            }
        }

        if !quiet {
            println!(
                "{}",
                ColorOutput::info(&format!(
                    "Search finished: {} solution(s) in {:.3}s",
                    out.solutions.len(),
                    start_time.elapsed().as_secs_f64()
                ))
            );
            if self.params.print_summary && !out.solutions.is_empty() {
                println!("{}", SolutionFormatter::format_summary(&out.solutions));
            }
        }

        if let Some(output) = &self.settings.output {
            SolutionFormatter::save_solutions(&out.solutions, &output.directory, &output.format)
                .context("Failed to save solutions")?;
        }

        Ok(out.solutions)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::life::{BitBoard, Cell};

    /// The fishhook eater, shifted to sit in the glider's lane.
    fn eater_cells() -> Vec<Cell> {
        vec![(4, 5), (5, 5), (4, 6), (5, 7), (6, 7), (7, 7), (7, 8)]
    }

    fn settings_with(pattern: &str) -> Settings {
        Settings {
            pattern: pattern.to_string(),
            min_stable_interval: 3,
            stabilise_results: false,
            print_summary: false,
            ..Settings::default()
        }
    }

    /// Glider (`A`) aimed at a known eater (`C`).
    const GLIDER_INTO_EATER: &str = ".A$2.A$3A3$4.2C$4.C$5.3C$7.C!";
    /// The same scene with the eater cells unknown (`B`).
    const GLIDER_INTO_UNKNOWNS: &str = ".A$2.A$3A3$4.2B$4.B$5.3B$7.B!";

    #[test]
    fn test_known_eater_consumes_glider() {
        // No unknowns at all: the driver just advances the reaction. The
        // eater takes the glider and recovers; one solution, found when
        // the recovery interval of 3 elapses at generation 9.
        let mut problem = CatalystProblem::new(settings_with(GLIDER_INTO_EATER)).unwrap();
        let solutions = problem.solve_quietly().unwrap();

        assert_eq!(solutions.len(), 1);
        assert_eq!(solutions[0].found_gen, 9);
        assert_eq!(solutions[0].interaction_gen, 4);
        assert_eq!(solutions[0].stable_cells, 7);
        assert_eq!(solutions[0].stable_board, BitBoard::from_cells(eater_cells()));
    }

    #[test]
    fn test_search_discovers_the_eater() {
        // The same scene with the seven eater cells unknown: the search
        // must branch its way to the eater. Brute force (below) shows it
        // is the only stable assignment of the region that satisfies the
        // recovery conditions.
        let mut settings = settings_with(GLIDER_INTO_UNKNOWNS);
        settings.continue_after_success = true;
        let mut problem = CatalystProblem::new(settings).unwrap();
        let solutions = problem.solve_quietly().unwrap();

        assert!(!solutions.is_empty(), "the eater must be found");

        let eater = BitBoard::from_cells(eater_cells());
        for solution in &solutions {
            // Decided cells must agree with the unique brute-force answer.
            assert!((solution.stable_board & !eater).is_empty());
            assert!(((eater & !solution.stable_board) & !solution.unknown_board).is_empty());
        }
    }

    #[test]
    fn test_search_agrees_with_brute_force() {
        // Enumerate every assignment of the unknown region and replay the
        // driver's acceptance rules with plain Life steps. Exactly one
        // assignment (the eater) must solve, and the search must cover it.
        let glider = BitBoard::from_cells([(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]);
        let region = eater_cells();

        let mut brute_solutions = Vec::new();
        for mask in 0u32..(1 << region.len()) {
            let mut bg = BitBoard::default();
            for (i, &cell) in region.iter().enumerate() {
                if mask >> i & 1 != 0 {
                    bg.set(cell);
                }
            }
            if bg.step() != bg {
                continue;
            }

            let bg_zoi = bg.zoi();
            let mut current = glider | bg;
            let mut interacted = false;
            let mut recovered = 0u32;
            let mut solved = false;
            for _ in 0..60 {
                let next = current.step();
                if !interacted {
                    let alone = (current & !bg).step();
                    let deviation = ((next ^ alone) & !bg) | (bg & !next);
                    if !deviation.is_empty() {
                        interacted = true;
                    }
                }
                current = next;
                let active = current ^ bg;
                if (active & bg_zoi).is_empty() {
                    recovered += 1;
                } else {
                    recovered = 0;
                }
                if interacted && recovered >= 3 {
                    solved = true;
                    break;
                }
            }
            if solved {
                brute_solutions.push(bg);
            }
        }

        assert_eq!(brute_solutions.len(), 1);
        assert_eq!(brute_solutions[0], BitBoard::from_cells(eater_cells()));

        let mut settings = settings_with(GLIDER_INTO_UNKNOWNS);
        settings.continue_after_success = true;
        let mut problem = CatalystProblem::new(settings).unwrap();
        let solutions = problem.solve_quietly().unwrap();

        // Every brute-force catalyst is covered by some reported solution.
        for bg in &brute_solutions {
            let covered = solutions.iter().any(|s| {
                (s.stable_board & !*bg).is_empty()
                    && ((*bg & !s.stable_board) & !s.unknown_board).is_empty()
            });
            assert!(covered, "brute-force catalyst not covered");
        }
    }

    #[test]
    fn test_no_free_cells_means_no_catalyst() {
        // A blinker with no unknown region: nothing can ever interact, so
        // the first-active deadline ends the search with zero solutions.
        let mut settings = settings_with("3A!");
        settings.first_active_range = [0, 20];
        let mut problem = CatalystProblem::new(settings).unwrap();
        assert!(problem.solve_quietly().unwrap().is_empty());
    }

    #[test]
    fn test_max_active_cells_zero_forbids_interaction() {
        let mut settings = settings_with(GLIDER_INTO_UNKNOWNS);
        settings.max_active_cells = 0;
        let mut problem = CatalystProblem::new(settings).unwrap();
        assert!(problem.solve_quietly().unwrap().is_empty());
    }

    #[test]
    fn test_inconsistent_stator_yields_no_solutions() {
        // A lone stator cell cannot be part of any stable background; the
        // root is inconsistent and the search reports nothing.
        let mut problem = CatalystProblem::new(settings_with("D!")).unwrap();
        assert!(problem.solve_quietly().unwrap().is_empty());
    }

    #[test]
    fn test_symmetric_search_reports_symmetric_stables() {
        // Under a reflection symmetry every reported stable background
        // must equal its own mirror image.
        let mut settings = settings_with(GLIDER_INTO_UNKNOWNS);
        settings.symmetry = crate::life::Symmetry::ReflectX;
        settings.continue_after_success = true;
        let mut problem = CatalystProblem::new(settings).unwrap();
        let solutions = problem.solve_quietly().unwrap();

        for solution in &solutions {
            let mirrored = crate::life::Symmetry::ReflectX.transform_board(&solution.stable_board);
            assert_eq!(solution.stable_board, mirrored);
        }
    }
}
