//! RLE encoding and decoding, including the multi-state search dialect

use super::board::{BitBoard, N};
use anyhow::{bail, Context, Result};

/// The planes of a parsed multi-state search pattern.
///
/// Glyphs: `.`/`b` dead, `A`/`o` starting live cell, `B` unknown search
/// cell, `C` known stable catalyst cell, `D` stator (stable and required to
/// stay on), `E` glanced cell (stable off, promised at most one live
/// neighbour).
#[derive(Debug, Clone, Default)]
pub struct MarkedPattern {
    /// Cells live in the starting state (`A`, `C` and `D`).
    pub on: BitBoard,
    /// Unknown search-area cells (`B`).
    pub unknown: BitBoard,
    /// Cells known to be on in the stable background (`C` and `D`).
    pub stable_on: BitBoard,
    /// Cells that must remain on in every generation (`D`).
    pub stator: BitBoard,
    /// Glanced cells (`E`).
    pub glanced: BitBoard,
}

impl MarkedPattern {
    /// Translate every plane toroidally.
    pub fn shift(&self, dx: i32, dy: i32) -> Self {
        Self {
            on: self.on.shift(dx, dy),
            unknown: self.unknown.shift(dx, dy),
            stable_on: self.stable_on.shift(dx, dy),
            stator: self.stator.shift(dx, dy),
            glanced: self.glanced.shift(dx, dy),
        }
    }
}

/// Parse a multi-state pattern, anchored at the origin.
pub fn parse_pattern(rle: &str) -> Result<MarkedPattern> {
    let mut pattern = MarkedPattern::default();
    let body = strip_header(rle);

    let mut x = 0usize;
    let mut y = 0usize;
    let mut run = 0usize;

    for ch in body.chars() {
        match ch {
            '0'..='9' => {
                run = run * 10 + ch.to_digit(10).unwrap() as usize;
            }
            '$' => {
                y += run.max(1);
                x = 0;
                run = 0;
            }
            '!' => break,
            '\n' | '\r' | ' ' | '\t' => {}
            _ => {
                let count = run.max(1);
                if y >= N || x + count > N {
                    bail!("pattern exceeds the {}x{} grid at row {}", N, N, y);
                }
                for _ in 0..count {
                    let cell = (x, y);
                    match ch {
                        '.' | 'b' => {}
                        'A' | 'o' => pattern.on.set(cell),
                        'B' => pattern.unknown.set(cell),
                        'C' => {
                            pattern.on.set(cell);
                            pattern.stable_on.set(cell);
                        }
                        'D' => {
                            pattern.on.set(cell);
                            pattern.stable_on.set(cell);
                            pattern.stator.set(cell);
                        }
                        'E' => pattern.glanced.set(cell),
                        _ => bail!("unrecognised pattern glyph '{}'", ch),
                    }
                    x += 1;
                }
                run = 0;
            }
        }
    }

    Ok(pattern)
}

/// Parse a plain two-state RLE (`b`/`o` glyphs) into a board.
pub fn parse_rle(rle: &str) -> Result<BitBoard> {
    let pattern = parse_pattern(rle).context("failed to parse RLE")?;
    Ok(pattern.on)
}

/// Emit a plain two-state RLE with header, cropped to the bounding box.
pub fn emit_rle(board: &BitBoard) -> String {
    emit_cells(
        board,
        |cell| if board.get(cell) { 'o' } else { 'b' },
        'b',
        "B3/S23",
    )
}

/// Emit the solution-marking dialect of the search: `C` for a live marked
/// cell, `A` for live only, `B` for marked only, `.` otherwise.
pub fn emit_marked(state: &BitBoard, marked: &BitBoard) -> String {
    let combined = *state | *marked;
    emit_cells(
        &combined,
        |cell| match (state.get(cell), marked.get(cell)) {
            (true, true) => 'C',
            (true, false) => 'A',
            (false, true) => 'B',
            (false, false) => '.',
        },
        '.',
        "LifeBellman",
    )
}

/// Run-length encode the bounding box of `extent_of`, one glyph per cell.
fn emit_cells<F: Fn((usize, usize)) -> char>(
    extent_of: &BitBoard,
    glyph: F,
    dead: char,
    rule: &str,
) -> String {
    let cells: Vec<_> = extent_of.iter_cells().collect();
    if cells.is_empty() {
        return format!("x = 0, y = 0, rule = {}\n!", rule);
    }

    let min_x = cells.iter().map(|c| c.0).min().unwrap();
    let max_x = cells.iter().map(|c| c.0).max().unwrap();
    let min_y = cells.iter().map(|c| c.1).min().unwrap();
    let max_y = cells.iter().map(|c| c.1).max().unwrap();

    let width = max_x - min_x + 1;
    let height = max_y - min_y + 1;

    let mut out = format!("x = {}, y = {}, rule = {}\n", width, height, rule);
    let mut line = String::new();
    let push_run = |line: &mut String, count: usize, ch: char| {
        if count == 0 {
            return;
        }
        if count > 1 {
            line.push_str(&count.to_string());
        }
        line.push(ch);
    };

    let mut blank_rows = 0usize;
    for y in min_y..=max_y {
        let row: Vec<char> = (min_x..=max_x).map(|x| glyph((x, y))).collect();
        if row.iter().all(|&c| c == dead) {
            blank_rows += 1;
            continue;
        }
        if y > min_y {
            push_run(&mut line, blank_rows + 1, '$');
            blank_rows = 0;
        }

        let mut run_char = row[0];
        let mut run_len = 0usize;
        for &c in &row {
            if c == run_char {
                run_len += 1;
            } else {
                push_run(&mut line, run_len, run_char);
                run_char = c;
                run_len = 1;
            }
        }
        if run_char != dead {
            push_run(&mut line, run_len, run_char);
        }

        if line.len() > 70 {
            out.push_str(&line);
            out.push('\n');
            line.clear();
        }
    }
    line.push('!');
    out.push_str(&line);
    out
}

/// Drop header and comment lines, keeping only the RLE body.
fn strip_header(rle: &str) -> String {
    rle.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.starts_with('#') && !trimmed.starts_with('x')
        })
        .collect::<Vec<_>>()
        .join("\n")
}
