//! Keypoint-consistent augmentation for box + landmark annotated datasets.
//!
//! This crate provides:
//! - re-exports of the geometry, pipeline and annotation crates
//! - [`AugmentationEngine`], which runs a seeded pipeline over every record
//!   and writes augmented images plus a new annotation file
//! - the `annotaug` command line tool (feature `cli`)
//!
//! ## Quickstart
//!
//! ```no_run
//! use annotaug::{augment_dataset, AugmentConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AugmentConfig {
//!     num_augment: 4,
//!     ..AugmentConfig::default()
//! };
//! let summary = augment_dataset(&config)?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `annotaug::core`: boxes, keypoints, affine transforms, RGB warping.
//! - `annotaug::pipeline`: pipeline parameters, stages and seeded sampling.
//! - `annotaug::annotations`: annotation file records, loading and saving.

pub use annotaug_annotations as annotations;
pub use annotaug_core as core;
pub use annotaug_pipeline as pipeline;

mod config;
mod engine;
pub mod io;
pub mod naming;
mod overlay;

pub use config::{AugmentConfig, ConfigError};
pub use engine::{augment_dataset, AugmentError, AugmentationEngine, EngineOptions, RunSummary};
pub use overlay::draw_annotations;
