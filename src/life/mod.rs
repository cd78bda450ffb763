//! Game of Life substrate: the bit-parallel grid, RLE codecs and symmetry

pub mod board;
pub mod rle;
pub mod symmetry;

pub use board::{BitBoard, Cell, N};
pub use rle::{emit_marked, emit_rle, parse_pattern, parse_rle, MarkedPattern};
pub use symmetry::Symmetry;
