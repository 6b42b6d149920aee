use crate::photometric::PhotometricOp;
use annotaug_core::{warp_affine_rgb, Affine2};
use image::imageops::{self, FilterType};
use image::RgbImage;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Per-side crop fractions of the input size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropSpec {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
    /// Resize the crop back to the input size.
    pub keep_size: bool,
}

/// Crop amounts in whole pixels for a concrete raster size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropPixels {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

/// Round both sides of one axis to pixels, keeping at least one pixel.
fn crop_axis(len: u32, a: f32, b: f32) -> (u32, u32) {
    let mut pa = (a * len as f32).round().max(0.0) as u32;
    let mut pb = (b * len as f32).round().max(0.0) as u32;
    while len > 0 && pa + pb >= len {
        if pa >= pb && pa > 0 {
            pa -= 1;
        } else if pb > 0 {
            pb -= 1;
        } else {
            break;
        }
    }
    (pa, pb)
}

impl CropSpec {
    pub fn pixels(&self, width: u32, height: u32) -> CropPixels {
        let (left, right) = crop_axis(width, self.left, self.right);
        let (top, bottom) = crop_axis(height, self.top, self.bottom);
        CropPixels {
            top,
            right,
            bottom,
            left,
        }
    }
}

/// One step of a pipeline instance, with all parameters already sampled.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Stage {
    /// Rotation about the image center, same canvas size, black fill.
    Rotate { degrees: f32 },
    FlipHorizontal,
    FlipVertical,
    Crop(CropSpec),
    Photometric(PhotometricOp),
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Rotate { .. } => "rotate",
            Stage::FlipHorizontal => "flip_horizontal",
            Stage::FlipVertical => "flip_vertical",
            Stage::Crop(_) => "crop",
            Stage::Photometric(op) => op.name(),
        }
    }

    pub fn is_geometric(&self) -> bool {
        !matches!(self, Stage::Photometric(_))
    }

    /// Coordinate mapping of this stage for an input of `width x height`,
    /// together with the output size. `None` for photometric stages.
    pub fn point_transform(&self, width: u32, height: u32) -> Option<(Affine2, u32, u32)> {
        let (w, h) = (width as f64, height as f64);
        match self {
            Stage::Rotate { degrees } => Some((
                Affine2::rotation_about(Point2::new(w / 2.0, h / 2.0), *degrees as f64),
                width,
                height,
            )),
            Stage::FlipHorizontal => Some((Affine2::flip_horizontal(w), width, height)),
            Stage::FlipVertical => Some((Affine2::flip_vertical(h), width, height)),
            Stage::Crop(spec) => {
                let px = spec.pixels(width, height);
                let cw = width - px.left - px.right;
                let ch = height - px.top - px.bottom;
                let shift = Affine2::translation(-(px.left as f64), -(px.top as f64));
                if spec.keep_size && (cw, ch) != (width, height) {
                    let scale = Affine2::scaling(w / cw as f64, h / ch as f64);
                    Some((shift.then(&scale), width, height))
                } else {
                    Some((shift, cw, ch))
                }
            }
            Stage::Photometric(_) => None,
        }
    }

    /// Apply the stage to a raster.
    pub fn apply_image(&self, img: &RgbImage) -> RgbImage {
        let (width, height) = img.dimensions();
        match self {
            Stage::Rotate { .. } => {
                let Some((dst_from_src, ow, oh)) = self.point_transform(width, height) else {
                    return img.clone();
                };
                match dst_from_src.inverse() {
                    Some(src_from_dst) => warp_affine_rgb(img, &src_from_dst, ow, oh),
                    None => img.clone(),
                }
            }
            Stage::FlipHorizontal => imageops::flip_horizontal(img),
            Stage::FlipVertical => imageops::flip_vertical(img),
            Stage::Crop(spec) => {
                let px = spec.pixels(width, height);
                let cw = width - px.left - px.right;
                let ch = height - px.top - px.bottom;
                if (cw, ch) == (width, height) {
                    return img.clone();
                }
                let cropped = imageops::crop_imm(img, px.left, px.top, cw, ch).to_image();
                if spec.keep_size {
                    imageops::resize(&cropped, width, height, FilterType::Triangle)
                } else {
                    cropped
                }
            }
            Stage::Photometric(op) => op.apply(img),
        }
    }
}
