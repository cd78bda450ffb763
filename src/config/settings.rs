//! Configuration settings for the catalyst search

use crate::life::Symmetry;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The declarative search configuration, loaded from a YAML file.
///
/// `pattern` uses the multi-state RLE dialect: `A` starting live cells,
/// `B` unknown search-area cells, `C` known stable catalyst cells, `D`
/// stator cells, `E` glanced cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Settings {
    pub pattern: String,

    /// Translation applied to the pattern before anchoring it.
    #[serde(default)]
    pub pattern_center: [i32; 2],

    /// Earliest and latest generation at which the catalyst may first
    /// interact.
    #[serde(default = "default_range")]
    pub first_active_range: [u32; 2],

    /// Shortest and longest permitted activity window after interaction.
    #[serde(default = "default_range")]
    pub active_window_range: [u32; 2],

    /// Generations of quiescence required to declare a solution.
    #[serde(default = "default_min_stable_interval")]
    pub min_stable_interval: u32,

    /// Cap on simultaneously active cells; -1 disables.
    #[serde(default = "default_disabled")]
    pub max_active_cells: i32,

    /// Cap on the union of active cells over all generations; -1 disables.
    #[serde(default = "default_disabled")]
    pub max_ever_active_cells: i32,

    /// Bounding-box cap on the active cells; [-1, -1] disables.
    #[serde(default = "default_bounds")]
    pub active_bounds: [i32; 2],

    /// Bounding-box cap on the ever-active cells; [-1, -1] disables.
    #[serde(default = "default_bounds")]
    pub ever_active_bounds: [i32; 2],

    /// Per-cell cap on the window between a cell's first and last
    /// activity; -1 disables.
    #[serde(default = "default_disabled")]
    pub max_cell_active_window: i32,

    /// Per-cell cap on consecutive active generations; -1 disables.
    #[serde(default = "default_disabled")]
    pub max_cell_active_streak: i32,

    #[serde(default)]
    pub symmetry: Symmetry,

    /// Run stable completion on every reported solution.
    #[serde(default = "default_true")]
    pub stabilise_results: bool,

    /// Wall-clock deadline for stable completion, in seconds.
    #[serde(default = "default_stabilise_timeout")]
    pub stabilise_results_timeout: u64,

    /// Make stable completion search for a minimum-population filling.
    #[serde(default)]
    pub minimise_results: bool,

    /// Keep searching after the first solution.
    #[serde(default)]
    pub continue_after_success: bool,

    /// Emit a tiled summary of all solutions on termination.
    #[serde(default = "default_true")]
    pub print_summary: bool,

    /// Post-solution acceptance predicates.
    #[serde(default)]
    pub filter: Vec<FilterSpec>,

    /// Stable configurations that disqualify a solution.
    #[serde(default)]
    pub forbidden: Vec<ForbiddenSpec>,

    #[serde(default)]
    pub output: Option<OutputSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FilterSpec {
    /// Multi-state RLE; `A` cells are the required state, `B` cells widen
    /// the mask without requiring a live cell.
    pub filter: String,
    #[serde(default)]
    pub filter_pos: [i32; 2],
    #[serde(default)]
    pub filter_gen: Option<u32>,
    #[serde(default)]
    pub filter_type: FilterKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    /// The masked cells must match exactly in the recovered state.
    #[default]
    Exact,
    /// The masked cells must all have been active at some point.
    Ever,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ForbiddenSpec {
    pub forbidden: String,
    #[serde(default)]
    pub forbidden_pos: [i32; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputSettings {
    pub directory: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn default_range() -> [u32; 2] {
    [0, 100]
}

fn default_min_stable_interval() -> u32 {
    4
}

fn default_disabled() -> i32 {
    -1
}

fn default_bounds() -> [i32; 2] {
    [-1, -1]
}

fn default_true() -> bool {
    true
}

fn default_stabilise_timeout() -> u64 {
    3
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // A glider heading into a 4x4 unknown search area.
            pattern: ".A$2.A$3A4$5.4B$5.4B$5.4B$5.4B!".to_string(),
            pattern_center: [0, 0],
            first_active_range: default_range(),
            active_window_range: default_range(),
            min_stable_interval: default_min_stable_interval(),
            max_active_cells: default_disabled(),
            max_ever_active_cells: default_disabled(),
            active_bounds: default_bounds(),
            ever_active_bounds: default_bounds(),
            max_cell_active_window: default_disabled(),
            max_cell_active_streak: default_disabled(),
            symmetry: Symmetry::Identity,
            stabilise_results: true,
            stabilise_results_timeout: default_stabilise_timeout(),
            minimise_results: false,
            continue_after_success: false,
            print_summary: true,
            filter: Vec::new(),
            forbidden: Vec::new(),
            output: None,
        }
    }
}

impl Settings {
    /// Load settings from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a YAML file.
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<()> {
        if self.pattern.trim().is_empty() {
            anyhow::bail!("A pattern is required");
        }

        if self.first_active_range[0] > self.first_active_range[1] {
            anyhow::bail!("first-active-range minimum exceeds its maximum");
        }

        if self.active_window_range[0] > self.active_window_range[1] {
            anyhow::bail!("active-window-range minimum exceeds its maximum");
        }

        if self.min_stable_interval == 0 {
            anyhow::bail!("min-stable-interval must be positive");
        }

        for (name, value) in [
            ("max-active-cells", self.max_active_cells),
            ("max-ever-active-cells", self.max_ever_active_cells),
        ] {
            if value < -1 {
                anyhow::bail!("{} must be -1 or non-negative", name);
            }
        }

        for (name, bounds) in [
            ("active-bounds", self.active_bounds),
            ("ever-active-bounds", self.ever_active_bounds),
        ] {
            for b in bounds {
                if b != -1 && b < 1 {
                    anyhow::bail!("{} entries must be -1 or positive", name);
                }
            }
        }

        for (name, value) in [
            ("max-cell-active-window", self.max_cell_active_window),
            ("max-cell-active-streak", self.max_cell_active_streak),
        ] {
            if !(-1..=15).contains(&value) {
                anyhow::bail!("{} must be -1 or between 0 and 15", name);
            }
        }

        Ok(())
    }

    /// Merge settings with command line overrides.
    pub fn merge_with_cli(&mut self, overrides: &CliOverrides) {
        if let Some(value) = overrides.continue_after_success {
            self.continue_after_success = value;
        }
        if let Some(value) = overrides.stabilise_results {
            self.stabilise_results = value;
        }
        if let Some(value) = overrides.minimise_results {
            self.minimise_results = value;
        }
        if let Some(value) = overrides.print_summary {
            self.print_summary = value;
        }
        if let Some(ref dir) = overrides.output_dir {
            let format = self.output.as_ref().map(|o| o.format).unwrap_or_default();
            self.output = Some(OutputSettings {
                directory: dir.clone(),
                format,
            });
        }
    }
}

/// Command line overrides for settings.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub continue_after_success: Option<bool>,
    pub stabilise_results: Option<bool>,
    pub minimise_results: Option<bool>,
    pub print_summary: Option<bool>,
    pub output_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let settings = Settings::default();
        settings.to_file(&path).unwrap();
        let loaded = Settings::from_file(&path).unwrap();

        assert_eq!(loaded.pattern, settings.pattern);
        assert_eq!(loaded.min_stable_interval, settings.min_stable_interval);
        assert_eq!(loaded.first_active_range, settings.first_active_range);
    }

    #[test]
    fn test_parses_kebab_case_keys() {
        let yaml = r#"
pattern: "3A!"
first-active-range: [0, 10]
max-active-cells: 6
active-bounds: [8, 8]
min-stable-interval: 2
symmetry: reflect-x
continue-after-success: true
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.first_active_range, [0, 10]);
        assert_eq!(settings.max_active_cells, 6);
        assert_eq!(settings.active_bounds, [8, 8]);
        assert_eq!(settings.symmetry, Symmetry::ReflectX);
        assert!(settings.continue_after_success);
        // Unset keys take their defaults.
        assert_eq!(settings.max_ever_active_cells, -1);
        assert!(settings.stabilise_results);
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let yaml = "pattern: \"3A!\"\nmax-active-cell: 6\n";
        assert!(serde_yaml::from_str::<Settings>(yaml).is_err());
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut settings = Settings::default();
        settings.first_active_range = [10, 5];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_cell_window() {
        let mut settings = Settings::default();
        settings.max_cell_active_window = 99;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_filter_spec_parsing() {
        let yaml = r#"
pattern: "3A!"
filter:
  - filter: "2A!"
    filter-pos: [3, 4]
    filter-type: ever
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.filter.len(), 1);
        assert_eq!(settings.filter[0].filter_pos, [3, 4]);
        assert_eq!(settings.filter[0].filter_type, FilterKind::Ever);
    }
}
