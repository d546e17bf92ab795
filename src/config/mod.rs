//! Configuration management for the villager optimizer

pub mod settings;

pub use settings::{
    CliOverrides, InputConfig, InputFormat, OutputConfig, OutputFormat, PricingConfig, Settings, SolverConfig,
    SolverStrategy,
};
