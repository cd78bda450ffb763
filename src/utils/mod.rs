//! Output and formatting helpers

pub mod display;

pub use display::{Color, ColorOutput, SolutionFormatter};
