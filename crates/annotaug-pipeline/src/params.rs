use serde::{Deserialize, Serialize};

/// Errors returned when pipeline parameters are inconsistent.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("invalid range for {name}: min={min} > max={max} (or not finite)")]
    InvalidRange {
        name: &'static str,
        min: f64,
        max: f64,
    },
    #[error("probability {name}={value} is outside [0, 1]")]
    InvalidProbability { name: &'static str, value: f32 },
    #[error("kernel range for {name} must start at 1 or more (got {min})")]
    InvalidKernel { name: &'static str, min: u32 },
    #[error("photometric subset bounds are inverted (min_ops={min}, max_ops={max})")]
    InvalidSubsetBounds { min: usize, max: usize },
}

/// Geometric stage settings. Defaults are the stock augmentation recipe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometricParams {
    /// Rotation angle range in degrees, about the image center.
    pub rotate_degrees: (f32, f32),
    /// Probability that a rotation stage is drawn at all.
    pub rotate_probability: f32,
    pub flip_horizontal_probability: f32,
    pub flip_vertical_probability: f32,
    /// Probability that a crop stage is drawn.
    pub crop_probability: f32,
    /// Per-side crop fraction range, sampled independently for each side.
    pub crop_fraction: (f32, f32),
    /// Resize the cropped raster back to the input size.
    pub crop_keep_size: bool,
}

impl Default for GeometricParams {
    fn default() -> Self {
        Self {
            rotate_degrees: (-25.0, 25.0),
            rotate_probability: 1.0,
            flip_horizontal_probability: 0.5,
            flip_vertical_probability: 0.2,
            crop_probability: 0.5,
            crop_fraction: (0.0, 0.1),
            crop_keep_size: true,
        }
    }
}

/// Photometric operator library settings.
///
/// `*_per_channel` values are the probability that a draw samples one value
/// per channel instead of a single shared value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotometricParams {
    /// Bounds on how many operators are drawn per round.
    pub min_ops: usize,
    pub max_ops: usize,

    pub superpixel_probability: f32,
    pub superpixel_replace: (f32, f32),
    pub superpixel_segments: (u32, u32),

    pub gaussian_sigma: (f32, f32),
    pub average_kernel: (u32, u32),
    pub median_kernel: (u32, u32),
    pub motion_kernel: (u32, u32),
    pub motion_angle_degrees: (f32, f32),

    pub edge_probability: f32,
    pub edge_alpha: (f32, f32),
    pub directed_edge_alpha: (f32, f32),
    /// Direction as a fraction of a full turn.
    pub directed_edge_direction: (f32, f32),

    /// Standard deviation range in pixel units (0..255).
    pub noise_scale: (f32, f32),
    pub noise_per_channel: f32,

    pub dropout_fraction: (f32, f32),
    pub dropout_per_channel: f32,
    pub coarse_dropout_fraction: (f32, f32),
    /// Size of the dropout grid relative to the image size.
    pub coarse_dropout_size: (f32, f32),
    pub coarse_dropout_per_channel: f32,

    /// Per-channel probability of inversion.
    pub invert_probability: f32,

    pub add: (f32, f32),
    pub add_per_channel: f32,
    pub multiply: (f32, f32),
    pub multiply_per_channel: f32,
    pub linear_contrast: (f32, f32),
    pub linear_contrast_per_channel: f32,
    pub sigmoid_gain: (f32, f32),
    pub sigmoid_cutoff: (f32, f32),

    pub grayscale_alpha: (f32, f32),
}

impl Default for PhotometricParams {
    fn default() -> Self {
        Self {
            min_ops: 0,
            max_ops: 5,
            superpixel_probability: 0.5,
            superpixel_replace: (0.0, 1.0),
            superpixel_segments: (20, 200),
            gaussian_sigma: (0.0, 3.0),
            average_kernel: (2, 7),
            median_kernel: (3, 11),
            motion_kernel: (3, 7),
            motion_angle_degrees: (72.0, 144.0),
            edge_probability: 0.5,
            edge_alpha: (0.0, 0.5),
            directed_edge_alpha: (0.0, 0.7),
            directed_edge_direction: (0.0, 1.0),
            noise_scale: (0.0, 0.05 * 255.0),
            noise_per_channel: 0.5,
            dropout_fraction: (0.01, 0.1),
            dropout_per_channel: 0.5,
            coarse_dropout_fraction: (0.03, 0.15),
            coarse_dropout_size: (0.02, 0.05),
            coarse_dropout_per_channel: 0.2,
            invert_probability: 0.05,
            add: (-10.0, 10.0),
            add_per_channel: 0.5,
            multiply: (0.5, 1.5),
            multiply_per_channel: 0.5,
            linear_contrast: (0.5, 2.0),
            linear_contrast_per_channel: 0.5,
            sigmoid_gain: (3.0, 10.0),
            sigmoid_cutoff: (0.4, 0.6),
            grayscale_alpha: (0.0, 1.0),
        }
    }
}

impl PhotometricParams {
    /// Settings that never draw a photometric operator.
    pub fn disabled() -> Self {
        Self {
            min_ops: 0,
            max_ops: 0,
            ..Self::default()
        }
    }
}

/// Full configuration of the augmentation pipeline.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    pub geometric: GeometricParams,
    pub photometric: PhotometricParams,
}

fn check_range(name: &'static str, r: (f32, f32)) -> Result<(), PipelineError> {
    if !r.0.is_finite() || !r.1.is_finite() || r.0 > r.1 {
        return Err(PipelineError::InvalidRange {
            name,
            min: r.0 as f64,
            max: r.1 as f64,
        });
    }
    Ok(())
}

fn check_prob(name: &'static str, p: f32) -> Result<(), PipelineError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(PipelineError::InvalidProbability { name, value: p });
    }
    Ok(())
}

fn check_kernel(name: &'static str, r: (u32, u32)) -> Result<(), PipelineError> {
    if r.0 > r.1 {
        return Err(PipelineError::InvalidRange {
            name,
            min: r.0 as f64,
            max: r.1 as f64,
        });
    }
    if r.0 == 0 {
        return Err(PipelineError::InvalidKernel { name, min: r.0 });
    }
    Ok(())
}

impl PipelineParams {
    /// Check every range and probability.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let g = &self.geometric;
        check_range("rotate_degrees", g.rotate_degrees)?;
        check_prob("rotate_probability", g.rotate_probability)?;
        check_prob("flip_horizontal_probability", g.flip_horizontal_probability)?;
        check_prob("flip_vertical_probability", g.flip_vertical_probability)?;
        check_prob("crop_probability", g.crop_probability)?;
        check_range("crop_fraction", g.crop_fraction)?;
        if g.crop_fraction.0 < 0.0 || g.crop_fraction.1 >= 0.5 {
            return Err(PipelineError::InvalidRange {
                name: "crop_fraction",
                min: g.crop_fraction.0 as f64,
                max: g.crop_fraction.1 as f64,
            });
        }

        let p = &self.photometric;
        if p.min_ops > p.max_ops {
            return Err(PipelineError::InvalidSubsetBounds {
                min: p.min_ops,
                max: p.max_ops,
            });
        }
        check_prob("superpixel_probability", p.superpixel_probability)?;
        check_range("superpixel_replace", p.superpixel_replace)?;
        check_kernel("superpixel_segments", p.superpixel_segments)?;
        check_range("gaussian_sigma", p.gaussian_sigma)?;
        check_kernel("average_kernel", p.average_kernel)?;
        check_kernel("median_kernel", p.median_kernel)?;
        check_kernel("motion_kernel", p.motion_kernel)?;
        check_range("motion_angle_degrees", p.motion_angle_degrees)?;
        check_prob("edge_probability", p.edge_probability)?;
        check_range("edge_alpha", p.edge_alpha)?;
        check_range("directed_edge_alpha", p.directed_edge_alpha)?;
        check_range("directed_edge_direction", p.directed_edge_direction)?;
        check_range("noise_scale", p.noise_scale)?;
        check_prob("noise_per_channel", p.noise_per_channel)?;
        check_range("dropout_fraction", p.dropout_fraction)?;
        check_prob("dropout_per_channel", p.dropout_per_channel)?;
        check_range("coarse_dropout_fraction", p.coarse_dropout_fraction)?;
        check_range("coarse_dropout_size", p.coarse_dropout_size)?;
        check_prob("coarse_dropout_per_channel", p.coarse_dropout_per_channel)?;
        check_prob("invert_probability", p.invert_probability)?;
        check_range("add", p.add)?;
        check_prob("add_per_channel", p.add_per_channel)?;
        check_range("multiply", p.multiply)?;
        check_prob("multiply_per_channel", p.multiply_per_channel)?;
        check_range("linear_contrast", p.linear_contrast)?;
        check_prob("linear_contrast_per_channel", p.linear_contrast_per_channel)?;
        check_range("sigmoid_gain", p.sigmoid_gain)?;
        check_range("sigmoid_cutoff", p.sigmoid_cutoff)?;
        check_range("grayscale_alpha", p.grayscale_alpha)?;
        Ok(())
    }
}
