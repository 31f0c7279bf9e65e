//! Error taxonomy (spec.md §7). Library-side errors are `thiserror` enums;
//! the CLI boundary is responsible for turning these into user-facing
//! diagnostics, not this crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be > 0, got {value}")]
    MustBePositive { field: &'static str, value: f64 },

    #[error("minTps ({min}) must be <= initialTps ({initial}) <= maxTps ({max})")]
    TpsOrdering { min: f64, initial: f64, max: f64 },

    #[error("{field} must be in ({low}, {high}], got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        low: f64,
        high: f64,
    },

    #[error("percentile {value} must lie strictly in (0, 1)")]
    InvalidPercentile { value: f64 },

    #[error("step pattern must have at least one step")]
    EmptySteps,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("task init failed: {0}")]
    TaskInit(String),
}

#[derive(Debug, Error)]
pub enum ShutdownError {
    #[error("worker drain exceeded {0:?}")]
    DrainTimeout(std::time::Duration),

    #[error("force termination exceeded {0:?}; pool leaked rather than blocking forever")]
    ForceTimeout(std::time::Duration),
}
