//! Input loading and report rendering for the `hiring-insights` binary.
pub mod input;
pub mod report;
