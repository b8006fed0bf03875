//! shelterscope-common — Shared types, errors, and geometry helpers used across all Shelterscope crates.

pub mod error;
pub mod geo;

pub use error::{Result, ShelterError};
pub use geo::{Feature, FeatureCollection, Geometry, Position};
