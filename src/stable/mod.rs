//! Stable background: the three-valued state and its propagation engine

pub mod complete;
pub mod propagate;
pub mod state;

pub use state::{PropagateResult, StableState};
