//! Core library for driving the legacy DSSAT crop simulator across a
//! stochastic ensemble: fixed-column control and weather file emission,
//! spatial cultivar and soil-profile resolution, sequential simulator
//! invocation, and post-run yield reporting.

pub mod control;
pub mod cultivar;
pub mod domain;
pub mod report;
pub mod run;
pub mod soil;
pub mod weather;
