use crate::params::{PipelineError, PipelineParams};
use crate::photometric::PhotometricOp;
use crate::stage::{CropSpec, Stage};
use annotaug_core::{Affine2, AnnotatedImage};
use image::RgbImage;
use nalgebra::Point2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Number of entries in the photometric library a draw picks its subset from.
pub const PHOTOMETRIC_CANDIDATES: usize = 11;

#[inline]
fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Seed of the random stream used for draw `draw_index` under run seed `seed`.
///
/// Every draw gets an independent stream, so draws can be built in any order
/// or on any thread.
pub fn draw_seed(seed: u64, draw_index: u64) -> u64 {
    splitmix64(splitmix64(seed) ^ draw_index)
}

/// A concrete, ordered list of stages produced by one draw.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineInstance {
    pub stages: Vec<Stage>,
}

impl PipelineInstance {
    pub fn from_stages(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn is_photometric_only(&self) -> bool {
        self.stages.iter().all(|s| !s.is_geometric())
    }

    /// Composite coordinate mapping for an input of `width x height`, and the
    /// final raster size.
    pub fn point_transform(&self, width: u32, height: u32) -> (Affine2, u32, u32) {
        let mut total = Affine2::identity();
        let (mut w, mut h) = (width, height);
        for stage in &self.stages {
            if let Some((t, nw, nh)) = stage.point_transform(w, h) {
                total = total.then(&t);
                w = nw;
                h = nh;
            }
        }
        (total, w, h)
    }

    /// Run every stage on `image`; geometric stages also move `points`.
    pub fn apply_in_place(&self, image: &RgbImage, points: &mut [Point2<f32>]) -> RgbImage {
        let mut img = image.clone();
        for stage in &self.stages {
            if let Some((t, _, _)) = stage.point_transform(img.width(), img.height()) {
                for p in points.iter_mut() {
                    *p = t.apply(*p);
                }
            }
            img = stage.apply_image(&img);
        }
        img
    }

    /// Apply to a raster and an arbitrary point set. The output keeps the
    /// point count and order.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "debug",
            skip(self, image, points),
            fields(stages = self.stages.len(), width = image.width(), height = image.height())
        )
    )]
    pub fn apply(&self, image: &RgbImage, points: &[Point2<f32>]) -> (RgbImage, Vec<Point2<f32>>) {
        let mut out = points.to_vec();
        let img = self.apply_in_place(image, &mut out);
        (img, out)
    }

    /// Apply to an annotated image. The box becomes the enclosing box of its
    /// transformed corners.
    pub fn apply_annotated(&self, annotated: &AnnotatedImage) -> AnnotatedImage {
        let mut pts = annotated.annotation_points();
        let img = self.apply_in_place(&annotated.image, &mut pts);
        AnnotatedImage::from_transformed(img, &pts)
    }
}

/// Seeded pipeline sampler.
#[derive(Clone, Debug)]
pub struct GeometricPipeline {
    params: PipelineParams,
}

impl Default for GeometricPipeline {
    fn default() -> Self {
        Self {
            params: PipelineParams::default(),
        }
    }
}

fn sample_channels(rng: &mut StdRng, range: (f32, f32), per_channel: f32) -> [f32; 3] {
    if rng.random_bool(per_channel as f64) {
        [
            rng.random_range(range.0..=range.1),
            rng.random_range(range.0..=range.1),
            rng.random_range(range.0..=range.1),
        ]
    } else {
        [rng.random_range(range.0..=range.1); 3]
    }
}

impl GeometricPipeline {
    pub fn new(params: PipelineParams) -> Result<Self, PipelineError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Draw the instance for `(seed, draw_index)`. Pure: the same arguments
    /// always give the same stages.
    pub fn build(&self, seed: u64, draw_index: u64) -> PipelineInstance {
        let mut rng = StdRng::seed_from_u64(draw_seed(seed, draw_index));
        let g = &self.params.geometric;

        let mut blocks: Vec<Vec<Stage>> = Vec::with_capacity(5);
        blocks.push(
            rng.random_bool(g.rotate_probability as f64)
                .then(|| Stage::Rotate {
                    degrees: rng.random_range(g.rotate_degrees.0..=g.rotate_degrees.1),
                })
                .into_iter()
                .collect(),
        );
        blocks.push(
            rng.random_bool(g.flip_horizontal_probability as f64)
                .then_some(Stage::FlipHorizontal)
                .into_iter()
                .collect(),
        );
        blocks.push(
            rng.random_bool(g.flip_vertical_probability as f64)
                .then_some(Stage::FlipVertical)
                .into_iter()
                .collect(),
        );
        blocks.push(
            rng.random_bool(g.crop_probability as f64)
                .then(|| {
                    let (lo, hi) = g.crop_fraction;
                    Stage::Crop(CropSpec {
                        top: rng.random_range(lo..=hi),
                        right: rng.random_range(lo..=hi),
                        bottom: rng.random_range(lo..=hi),
                        left: rng.random_range(lo..=hi),
                        keep_size: g.crop_keep_size,
                    })
                })
                .into_iter()
                .collect(),
        );
        blocks.push(self.sample_photometric(&mut rng));

        blocks.shuffle(&mut rng);
        let stages: Vec<Stage> = blocks.into_iter().flatten().collect();
        log::trace!(
            "draw {draw_index}: {}",
            stages.iter().map(Stage::name).collect::<Vec<_>>().join(" -> ")
        );
        PipelineInstance { stages }
    }

    /// Pick a random subset of the photometric library, in random order.
    fn sample_photometric(&self, rng: &mut StdRng) -> Vec<Stage> {
        let p = &self.params.photometric;
        let max = p.max_ops.min(PHOTOMETRIC_CANDIDATES);
        let min = p.min_ops.min(max);
        let count = rng.random_range(min..=max);

        let mut order: Vec<usize> = (0..PHOTOMETRIC_CANDIDATES).collect();
        order.shuffle(rng);
        order
            .into_iter()
            .take(count)
            .filter_map(|idx| self.sample_candidate(idx, rng))
            .map(Stage::Photometric)
            .collect()
    }

    fn sample_candidate(&self, idx: usize, rng: &mut StdRng) -> Option<PhotometricOp> {
        let p = &self.params.photometric;
        let op = match idx {
            0 => {
                if !rng.random_bool(p.superpixel_probability as f64) {
                    return None;
                }
                PhotometricOp::Superpixels {
                    replace: rng.random_range(p.superpixel_replace.0..=p.superpixel_replace.1),
                    segments: rng
                        .random_range(p.superpixel_segments.0..=p.superpixel_segments.1),
                    seed: rng.random(),
                }
            }
            1 => match rng.random_range(0..4u8) {
                0 => PhotometricOp::GaussianBlur {
                    sigma: rng.random_range(p.gaussian_sigma.0..=p.gaussian_sigma.1),
                },
                1 => PhotometricOp::AverageBlur {
                    kernel: rng.random_range(p.average_kernel.0..=p.average_kernel.1),
                },
                2 => {
                    let k = rng.random_range(p.median_kernel.0..=p.median_kernel.1);
                    PhotometricOp::MedianBlur { kernel: k | 1 }
                }
                _ => PhotometricOp::MotionBlur {
                    kernel: rng.random_range(p.motion_kernel.0..=p.motion_kernel.1),
                    angle_degrees: rng
                        .random_range(p.motion_angle_degrees.0..=p.motion_angle_degrees.1),
                },
            },
            2 => {
                if !rng.random_bool(p.edge_probability as f64) {
                    return None;
                }
                if rng.random_bool(0.5) {
                    PhotometricOp::EdgeDetect {
                        alpha: rng.random_range(p.edge_alpha.0..=p.edge_alpha.1),
                    }
                } else {
                    PhotometricOp::DirectedEdgeDetect {
                        alpha: rng.random_range(p.directed_edge_alpha.0..=p.directed_edge_alpha.1),
                        direction: rng.random_range(
                            p.directed_edge_direction.0..=p.directed_edge_direction.1,
                        ),
                    }
                }
            }
            3 => PhotometricOp::AdditiveGaussianNoise {
                scale: rng.random_range(p.noise_scale.0..=p.noise_scale.1),
                per_channel: rng.random_bool(p.noise_per_channel as f64),
                seed: rng.random(),
            },
            4 => {
                if rng.random_bool(0.5) {
                    PhotometricOp::Dropout {
                        fraction: rng.random_range(p.dropout_fraction.0..=p.dropout_fraction.1),
                        per_channel: rng.random_bool(p.dropout_per_channel as f64),
                        seed: rng.random(),
                    }
                } else {
                    PhotometricOp::CoarseDropout {
                        fraction: rng.random_range(
                            p.coarse_dropout_fraction.0..=p.coarse_dropout_fraction.1,
                        ),
                        size: rng.random_range(p.coarse_dropout_size.0..=p.coarse_dropout_size.1),
                        per_channel: rng.random_bool(p.coarse_dropout_per_channel as f64),
                        seed: rng.random(),
                    }
                }
            }
            5 => {
                let prob = p.invert_probability as f64;
                PhotometricOp::Invert {
                    channels: [
                        rng.random_bool(prob),
                        rng.random_bool(prob),
                        rng.random_bool(prob),
                    ],
                }
            }
            6 => PhotometricOp::Add {
                value: sample_channels(rng, p.add, p.add_per_channel),
            },
            7 => PhotometricOp::Multiply {
                factor: sample_channels(rng, p.multiply, p.multiply_per_channel),
            },
            8 => PhotometricOp::LinearContrast {
                alpha: sample_channels(rng, p.linear_contrast, p.linear_contrast_per_channel),
            },
            9 => PhotometricOp::SigmoidContrast {
                gain: rng.random_range(p.sigmoid_gain.0..=p.sigmoid_gain.1),
                cutoff: rng.random_range(p.sigmoid_cutoff.0..=p.sigmoid_cutoff.1),
            },
            _ => PhotometricOp::Grayscale {
                alpha: rng.random_range(p.grayscale_alpha.0..=p.grayscale_alpha.1),
            },
        };
        Some(op)
    }
}
