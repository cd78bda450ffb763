//! Game of Life catalyst search
//!
//! This library searches for catalysts: stable configurations of live
//! cells that perturb a given active pattern for a bounded number of
//! generations and then recover to their stable state. The search is a
//! constraint-propagation backtracking search over two coupled
//! bit-parallel state representations, a three-valued stable background
//! and a four-valued evolving state.

pub mod config;
pub mod life;
pub mod search;
pub mod stable;
pub mod utils;

pub use config::Settings;
pub use search::{CatalystProblem, Solution};

use anyhow::Result;

/// Main entry point for catalyst searches.
pub fn solve_catalyst(settings: Settings) -> Result<Vec<Solution>> {
    let mut problem = CatalystProblem::new(settings)?;
    problem.solve()
}
