//! shelterscope-ingestion — Criterion acquisition for candidate shelter sites.
//! Loads the auxiliary layers (roads, fault lines, land use, population) and
//! derives the raw criterion columns the ranker normalises and scores.

pub mod layers;
pub mod pipeline;
pub mod sources;

pub use layers::{LayerPaths, Layers, Overlays};
pub use pipeline::{enrich_sites, DISTANCE_TO_FAULTS, DISTANCE_TO_ROADS, LANDUSE_SCORE, POPULATION_DENSITY};
pub use sources::{CriterionSource, MissingValuePolicy};
