//! The catalyst search: evolving state, lookahead, driver and solutions

pub mod countdown;
pub mod driver;
pub mod lookahead;
pub mod params;
pub mod problem;
pub mod solution;
pub mod unknown;

pub use driver::{SearchOutcome, SearchState};
pub use params::SearchParams;
pub use problem::CatalystProblem;
pub use solution::Solution;
pub use unknown::UnknownState;
