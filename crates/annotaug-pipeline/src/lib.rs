//! Seeded augmentation pipeline that moves annotations with the pixels.
//!
//! A [`GeometricPipeline`] draws a [`PipelineInstance`] from `(seed, draw_index)`.
//! The instance is a closed list of [`Stage`] values: geometric stages
//! (rotate, flip, crop) carry an exact coordinate mapping that is applied to
//! every point, photometric stages only touch pixel values.
//!
//! ```
//! use annotaug_pipeline::{GeometricPipeline, PipelineInstance, Stage};
//! use image::RgbImage;
//! use nalgebra::Point2;
//!
//! let pipeline = GeometricPipeline::default();
//! let instance = pipeline.build(234, 0);
//! assert_eq!(instance, pipeline.build(234, 0));
//!
//! let flip = PipelineInstance::from_stages(vec![Stage::FlipHorizontal]);
//! let (_, pts) = flip.apply(&RgbImage::new(100, 100), &[Point2::new(20.0, 5.0)]);
//! assert_eq!(pts[0], Point2::new(80.0, 5.0));
//! ```

mod params;
mod photometric;
mod pipeline;
mod stage;

pub use params::{GeometricParams, PhotometricParams, PipelineError, PipelineParams};
pub use photometric::PhotometricOp;
pub use pipeline::{draw_seed, GeometricPipeline, PipelineInstance, PHOTOMETRIC_CANDIDATES};
pub use stage::{CropPixels, CropSpec, Stage};
