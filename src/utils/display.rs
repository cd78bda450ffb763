//! Display and output formatting utilities

use crate::config::OutputFormat;
use crate::life::BitBoard;
use crate::search::Solution;
use anyhow::Result;
use std::path::Path;

/// Format solutions for console output and files.
pub struct SolutionFormatter;

impl SolutionFormatter {
    /// Format a single solution for console output.
    pub fn format_solution(solution: &Solution) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "Catalyst with {} stable cell(s), interaction at generation {}, recovered by generation {}\n",
            solution.stable_cells, solution.interaction_gen, solution.found_gen
        ));
        if solution.undetermined_cells > 0 {
            output.push_str(&format!(
                "({} search cell(s) left undetermined)\n",
                solution.undetermined_cells
            ));
        }
        output.push_str(&solution.winner_rle);
        output.push('\n');

        if let Some(completed) = &solution.completed_rle {
            output.push_str("Completed:\n");
            output.push_str(completed);
            output.push('\n');
        }

        output
    }

    /// A summary table of all solutions.
    pub fn format_summary(solutions: &[Solution]) -> String {
        let mut output = String::new();

        output.push_str("Solutions Summary:\n");
        output.push_str("  # | Stable | Undet. | Interaction | Recovered | Completed\n");
        output.push_str("----|--------|--------|-------------|-----------|----------\n");

        for (i, solution) in solutions.iter().enumerate() {
            output.push_str(&format!(
                "{:3} | {:6} | {:6} | {:11} | {:9} | {}\n",
                i + 1,
                solution.stable_cells,
                solution.undetermined_cells,
                solution.interaction_gen,
                solution.found_gen,
                if solution.completed_rle.is_some() {
                    "yes"
                } else {
                    "no"
                }
            ));
        }

        output.push('\n');
        output.push_str(&Self::format_tiled(solutions));
        output
    }

    /// All found stable configurations side by side in one text grid.
    pub fn format_tiled(solutions: &[Solution]) -> String {
        const PER_ROW: usize = 4;
        let mut output = String::new();

        for chunk in solutions.chunks(PER_ROW) {
            let grids: Vec<Vec<String>> = chunk
                .iter()
                .map(|s| Self::grid_lines(&(s.stable_board | s.starting_board), &s.stable_board))
                .collect();
            let height = grids.iter().map(|g| g.len()).max().unwrap_or(0);
            let widths: Vec<usize> = grids
                .iter()
                .map(|g| g.iter().map(|l| l.len()).max().unwrap_or(0))
                .collect();

            for row in 0..height {
                let mut line = String::new();
                for (g, grid) in grids.iter().enumerate() {
                    let cell_line = grid.get(row).cloned().unwrap_or_default();
                    line.push_str(&format!("{:width$}", cell_line, width = widths[g] + 3));
                }
                output.push_str(line.trim_end());
                output.push('\n');
            }
            output.push('\n');
        }

        output
    }

    /// Render the bounding box of a board, stable cells emphasised.
    fn grid_lines(board: &BitBoard, stable: &BitBoard) -> Vec<String> {
        let cells: Vec<_> = board.iter_cells().collect();
        if cells.is_empty() {
            return vec![String::from("(empty)")];
        }
        let min_x = cells.iter().map(|c| c.0).min().unwrap();
        let max_x = cells.iter().map(|c| c.0).max().unwrap();
        let min_y = cells.iter().map(|c| c.1).min().unwrap();
        let max_y = cells.iter().map(|c| c.1).max().unwrap();

        (min_y..=max_y)
            .map(|y| {
                (min_x..=max_x)
                    .map(|x| {
                        if stable.get((x, y)) {
                            '#'
                        } else if board.get((x, y)) {
                            'o'
                        } else {
                            '.'
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Save solutions to files based on output format.
    pub fn save_solutions<P: AsRef<Path>>(
        solutions: &[Solution],
        output_dir: P,
        format: &OutputFormat,
    ) -> Result<()> {
        let output_dir = output_dir.as_ref();
        std::fs::create_dir_all(output_dir)?;

        match format {
            OutputFormat::Text => {
                for (i, solution) in solutions.iter().enumerate() {
                    let filepath = output_dir.join(format!("catalyst_{:03}.txt", i + 1));
                    std::fs::write(filepath, Self::format_solution(solution))?;
                }
            }
            OutputFormat::Json => {
                for (i, solution) in solutions.iter().enumerate() {
                    let filepath = output_dir.join(format!("catalyst_{:03}.json", i + 1));
                    let json = serde_json::to_string_pretty(solution)?;
                    std::fs::write(filepath, json)?;
                }
            }
        }

        Ok(())
    }
}

/// Color output utilities.
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if the terminal supports it).
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err()
            && (std::env::var("TERM").unwrap_or_default() != "dumb")
    }

    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_solution() -> Solution {
        Solution::new(
            BitBoard::from_cells([(0, 0)]),
            BitBoard::from_cells([(3, 0), (4, 0)]),
            BitBoard::default(),
            9,
            4,
        )
    }

    #[test]
    fn test_format_solution_mentions_generations() {
        let text = SolutionFormatter::format_solution(&sample_solution());
        assert!(text.contains("interaction at generation 4"));
        assert!(text.contains("recovered by generation 9"));
    }

    #[test]
    fn test_summary_table_has_one_row_per_solution() {
        let solutions = vec![sample_solution(), sample_solution()];
        let summary = SolutionFormatter::format_summary(&solutions);
        assert!(summary.contains("  1 |"));
        assert!(summary.contains("  2 |"));
    }

    #[test]
    fn test_tiled_grid_marks_stable_cells() {
        let tiled = SolutionFormatter::format_tiled(&[sample_solution()]);
        assert!(tiled.contains('#'));
        assert!(tiled.contains('o'));
    }

    #[test]
    fn test_save_solutions_text_and_json() {
        let dir = tempdir().unwrap();
        let solutions = vec![sample_solution()];

        SolutionFormatter::save_solutions(&solutions, dir.path(), &OutputFormat::Text).unwrap();
        assert!(dir.path().join("catalyst_001.txt").exists());

        SolutionFormatter::save_solutions(&solutions, dir.path(), &OutputFormat::Json).unwrap();
        assert!(dir.path().join("catalyst_001.json").exists());
    }

    #[test]
    fn test_color_output_contains_text() {
        let colored = ColorOutput::colored("test", Color::Red);
        assert!(colored.contains("test"));
    }
}
