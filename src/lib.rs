//! modbake - cached overlay baking for engine games
//!
//! Copies a base game, applies an ordered list of overlay trees on top, and
//! stores the result in a content-addressed cache so the same combination
//! is only ever built once.

pub mod bake;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod overlay;
pub mod ui;

pub use bake::{BakeOutcome, BakeRequest, Baker};
pub use error::{BakeError, BakeResult};
