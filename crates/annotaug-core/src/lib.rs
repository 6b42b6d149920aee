//! Core types and utilities for keypoint-consistent image augmentation.
//!
//! This crate is purely geometric: affine transforms, axis-aligned boxes,
//! keypoints and an RGB raster bundled with its annotation. It knows nothing
//! about random sampling or annotation file formats.

mod affine;
mod annotated;
mod annotation;
mod image;
mod logger;

pub use affine::Affine2;
pub use annotated::{AnnotatedImage, ANNOTATION_POINT_COUNT};
pub use annotation::{BoundingBox, Keypoint, KEYPOINT_COUNT};
pub use image::{sample_bilinear_rgb, sample_bilinear_rgb_u8, warp_affine_rgb};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
