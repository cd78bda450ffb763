//! Configuration management for the catalyst search

pub mod settings;

pub use settings::{
    CliOverrides, FilterKind, FilterSpec, ForbiddenSpec, OutputFormat, OutputSettings, Settings,
};
