// firewatch_core/src/planning/mod.rs

pub mod coverage;

pub use coverage::CoveragePlanner;
