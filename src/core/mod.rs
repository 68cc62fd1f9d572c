//! Core abstractions for skymark.
//!
//! This module provides the domain types shared across features.

mod region;

pub use region::{Point, Region};
