//! Spatial symmetry transforms applied to stable-state assignments

use super::board::{BitBoard, Cell, N};
use serde::{Deserialize, Serialize};

/// A spatial symmetry of the grid. When a non-identity symmetry is
/// configured, every stable-cell assignment is mirrored to its image cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Symmetry {
    #[default]
    Identity,
    /// Reflection across the vertical axis (columns mirrored).
    ReflectX,
    /// Reflection across the horizontal axis (rows mirrored).
    ReflectY,
    Rotate180,
}

impl Symmetry {
    /// The image of a single cell under the transform.
    pub fn transform_cell(&self, (x, y): Cell) -> Cell {
        match self {
            Symmetry::Identity => (x, y),
            Symmetry::ReflectX => (N - 1 - x, y),
            Symmetry::ReflectY => (x, N - 1 - y),
            Symmetry::Rotate180 => (N - 1 - x, N - 1 - y),
        }
    }

    /// The image of a whole board under the transform.
    pub fn transform_board(&self, board: &BitBoard) -> BitBoard {
        match self {
            Symmetry::Identity => *board,
            Symmetry::ReflectX => {
                let mut out = BitBoard::default();
                for x in 0..N {
                    out.cols[N - 1 - x] = board.cols[x];
                }
                out
            }
            Symmetry::ReflectY => {
                let mut out = BitBoard::default();
                for x in 0..N {
                    out.cols[x] = board.cols[x].reverse_bits();
                }
                out
            }
            Symmetry::Rotate180 => {
                let mut out = BitBoard::default();
                for x in 0..N {
                    out.cols[N - 1 - x] = board.cols[x].reverse_bits();
                }
                out
            }
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Symmetry::Identity
    }
}
