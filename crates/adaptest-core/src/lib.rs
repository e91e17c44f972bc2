//! adaptest-core: Adaptive assessment engine, leveling policy, and session driver.
//!
//! This crate defines the question bank, the level ladder, the stage state
//! machine that every question passes through, and the driver that runs a
//! complete session against a presentation layer and an export sink.

pub mod bank;
pub mod clock;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod ladder;
pub mod model;
pub mod policy;
pub mod record;
pub mod session;
pub mod statistics;
pub mod traits;

pub use error::AssessError;
