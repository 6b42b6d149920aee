//! Pixel-value operators. None of these move content, so annotations are
//! untouched by them.

use image::{imageops, GrayImage, Rgb, RgbImage};
use imageproc::filter::{filter_clamped, gaussian_blur_f32, median_filter, separable_filter_equal};
use imageproc::kernel::Kernel;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// A fully parameterized photometric operator.
///
/// Operators that need per-pixel randomness carry a `seed` drawn when the
/// pipeline instance is built, so applying the same operator twice gives the
/// same pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PhotometricOp {
    /// Grid superpixels: each cell is replaced by its mean color with
    /// probability `replace`.
    Superpixels { replace: f32, segments: u32, seed: u64 },
    GaussianBlur { sigma: f32 },
    AverageBlur { kernel: u32 },
    /// `kernel` is odd.
    MedianBlur { kernel: u32 },
    MotionBlur { kernel: u32, angle_degrees: f32 },
    EdgeDetect { alpha: f32 },
    /// `direction` is a fraction of a full turn.
    DirectedEdgeDetect { alpha: f32, direction: f32 },
    AdditiveGaussianNoise { scale: f32, per_channel: bool, seed: u64 },
    Dropout { fraction: f32, per_channel: bool, seed: u64 },
    CoarseDropout {
        fraction: f32,
        size: f32,
        per_channel: bool,
        seed: u64,
    },
    Invert { channels: [bool; 3] },
    Add { value: [f32; 3] },
    Multiply { factor: [f32; 3] },
    LinearContrast { alpha: [f32; 3] },
    SigmoidContrast { gain: f32, cutoff: f32 },
    Grayscale { alpha: f32 },
}

impl PhotometricOp {
    pub fn name(&self) -> &'static str {
        match self {
            PhotometricOp::Superpixels { .. } => "superpixels",
            PhotometricOp::GaussianBlur { .. } => "gaussian_blur",
            PhotometricOp::AverageBlur { .. } => "average_blur",
            PhotometricOp::MedianBlur { .. } => "median_blur",
            PhotometricOp::MotionBlur { .. } => "motion_blur",
            PhotometricOp::EdgeDetect { .. } => "edge_detect",
            PhotometricOp::DirectedEdgeDetect { .. } => "directed_edge_detect",
            PhotometricOp::AdditiveGaussianNoise { .. } => "additive_gaussian_noise",
            PhotometricOp::Dropout { .. } => "dropout",
            PhotometricOp::CoarseDropout { .. } => "coarse_dropout",
            PhotometricOp::Invert { .. } => "invert",
            PhotometricOp::Add { .. } => "add",
            PhotometricOp::Multiply { .. } => "multiply",
            PhotometricOp::LinearContrast { .. } => "linear_contrast",
            PhotometricOp::SigmoidContrast { .. } => "sigmoid_contrast",
            PhotometricOp::Grayscale { .. } => "grayscale",
        }
    }

    /// Apply to `img`, returning the new raster (same size).
    pub fn apply(&self, img: &RgbImage) -> RgbImage {
        match *self {
            PhotometricOp::Superpixels {
                replace,
                segments,
                seed,
            } => superpixels(img, replace, segments, seed),
            PhotometricOp::GaussianBlur { sigma } => {
                // Too small to change anything at u8 precision.
                if sigma < 0.01 {
                    img.clone()
                } else {
                    gaussian_blur_f32(img, sigma)
                }
            }
            PhotometricOp::AverageBlur { kernel } => {
                let k = kernel.max(1);
                separable_filter_equal(img, &vec![1.0 / k as f32; k as usize])
            }
            PhotometricOp::MedianBlur { kernel } => {
                let r = kernel / 2;
                if r == 0 {
                    img.clone()
                } else {
                    median_filter(img, r, r)
                }
            }
            PhotometricOp::MotionBlur {
                kernel,
                angle_degrees,
            } => {
                let k = kernel.max(1);
                let weights = motion_kernel(k, angle_degrees);
                filter_clamped::<_, f32, u8>(img, Kernel::new(&weights, k, k))
            }
            PhotometricOp::EdgeDetect { alpha } => edges(img, alpha, None),
            PhotometricOp::DirectedEdgeDetect { alpha, direction } => {
                edges(img, alpha, Some(direction * 360.0))
            }
            PhotometricOp::AdditiveGaussianNoise {
                scale,
                per_channel,
                seed,
            } => gaussian_noise(img, scale, per_channel, seed),
            PhotometricOp::Dropout {
                fraction,
                per_channel,
                seed,
            } => dropout(img, fraction, per_channel, seed),
            PhotometricOp::CoarseDropout {
                fraction,
                size,
                per_channel,
                seed,
            } => coarse_dropout(img, fraction, size, per_channel, seed),
            PhotometricOp::Invert { channels } => map_channels(img, |c, v| {
                if channels[c] {
                    255.0 - v
                } else {
                    v
                }
            }),
            PhotometricOp::Add { value } => map_channels(img, |c, v| v + value[c]),
            PhotometricOp::Multiply { factor } => map_channels(img, |c, v| v * factor[c]),
            PhotometricOp::LinearContrast { alpha } => {
                map_channels(img, |c, v| 128.0 + alpha[c] * (v - 128.0))
            }
            PhotometricOp::SigmoidContrast { gain, cutoff } => map_channels(img, |_, v| {
                255.0 / (1.0 + (gain * (cutoff - v / 255.0)).exp())
            }),
            PhotometricOp::Grayscale { alpha } => grayscale_blend(img, alpha),
        }
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn map_channels(img: &RgbImage, f: impl Fn(usize, f32) -> f32) -> RgbImage {
    let mut out = img.clone();
    for px in out.pixels_mut() {
        for c in 0..3 {
            px.0[c] = to_u8(f(c, px.0[c] as f32));
        }
    }
    out
}

/// Normalized line kernel through the center at `angle_degrees`.
fn motion_kernel(k: u32, angle_degrees: f32) -> Vec<f32> {
    let n = k as usize;
    let mut kernel = vec![0.0f32; n * n];
    let c = (k as f32 - 1.0) / 2.0;
    let (s, co) = angle_degrees.to_radians().sin_cos();
    let steps = 4 * n;
    for i in 0..=steps {
        let t = -c + 2.0 * c * i as f32 / steps as f32;
        let x = (c + t * co).round().clamp(0.0, k as f32 - 1.0) as usize;
        let y = (c + t * s).round().clamp(0.0, k as f32 - 1.0) as usize;
        kernel[y * n + x] = 1.0;
    }
    let sum: f32 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= sum;
    }
    kernel
}

fn superpixels(img: &RgbImage, replace: f32, segments: u32, seed: u64) -> RgbImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img.clone();
    }
    let n = segments.max(1) as f32;
    let nx = ((n * w as f32 / h as f32).sqrt().round() as u32).clamp(1, w);
    let ny = ((n / nx as f32).ceil() as u32).clamp(1, h);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = img.clone();
    for cy in 0..ny {
        let y0 = cy * h / ny;
        let y1 = (cy + 1) * h / ny;
        for cx in 0..nx {
            let x0 = cx * w / nx;
            let x1 = (cx + 1) * w / nx;
            if !rng.random_bool(replace.clamp(0.0, 1.0) as f64) || x1 <= x0 || y1 <= y0 {
                continue;
            }
            let mut sum = [0.0f64; 3];
            for y in y0..y1 {
                for x in x0..x1 {
                    let p = img.get_pixel(x, y).0;
                    for c in 0..3 {
                        sum[c] += p[c] as f64;
                    }
                }
            }
            let count = ((x1 - x0) * (y1 - y0)) as f64;
            let mean = Rgb(sum.map(|s| to_u8((s / count) as f32)));
            for y in y0..y1 {
                for x in x0..x1 {
                    out.put_pixel(x, y, mean);
                }
            }
        }
    }
    out
}

fn edges(img: &RgbImage, alpha: f32, direction_degrees: Option<f32>) -> RgbImage {
    let gray: GrayImage = imageops::grayscale(img);
    let gx = horizontal_sobel(&gray);
    let gy = vertical_sobel(&gray);
    let dir = direction_degrees.map(|d| d.to_radians().sin_cos());

    let mut out = img.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        let dx = gx.get_pixel(x, y).0[0] as f32;
        let dy = gy.get_pixel(x, y).0[0] as f32;
        let mag = match dir {
            Some((s, c)) => (dx * c + dy * s).abs(),
            None => (dx * dx + dy * dy).sqrt(),
        };
        // Sobel responses reach 4 * 255 on a hard step.
        let e = (mag / 4.0).clamp(0.0, 255.0);
        for c in 0..3 {
            let v = px.0[c] as f32;
            px.0[c] = to_u8((1.0 - alpha) * v + alpha * e);
        }
    }
    out
}

fn gaussian_noise(img: &RgbImage, scale: f32, per_channel: bool, seed: u64) -> RgbImage {
    let Ok(normal) = Normal::new(0.0f32, scale) else {
        return img.clone();
    };
    if scale <= 0.0 {
        return img.clone();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = img.clone();
    for px in out.pixels_mut() {
        if per_channel {
            for c in 0..3 {
                px.0[c] = to_u8(px.0[c] as f32 + normal.sample(&mut rng));
            }
        } else {
            let n = normal.sample(&mut rng);
            for c in 0..3 {
                px.0[c] = to_u8(px.0[c] as f32 + n);
            }
        }
    }
    out
}

fn dropout(img: &RgbImage, fraction: f32, per_channel: bool, seed: u64) -> RgbImage {
    let p = fraction.clamp(0.0, 1.0) as f64;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = img.clone();
    for px in out.pixels_mut() {
        if per_channel {
            for c in 0..3 {
                if rng.random_bool(p) {
                    px.0[c] = 0;
                }
            }
        } else if rng.random_bool(p) {
            *px = Rgb([0, 0, 0]);
        }
    }
    out
}

fn coarse_dropout(img: &RgbImage, fraction: f32, size: f32, per_channel: bool, seed: u64) -> RgbImage {
    let (w, h) = img.dimensions();
    let gw = ((w as f32 * size).round() as u32).max(1);
    let gh = ((h as f32 * size).round() as u32).max(1);
    let p = fraction.clamp(0.0, 1.0) as f64;
    let planes = if per_channel { 3 } else { 1 };

    let mut rng = StdRng::seed_from_u64(seed);
    let mask: Vec<bool> = (0..(gw * gh) as usize * planes)
        .map(|_| rng.random_bool(p))
        .collect();

    let mut out = img.clone();
    for (x, y, px) in out.enumerate_pixels_mut() {
        let cell = ((y as u64 * gh as u64 / h as u64) * gw as u64 + x as u64 * gw as u64 / w as u64)
            as usize;
        for c in 0..3 {
            let plane = if per_channel { c } else { 0 };
            if mask[plane * (gw * gh) as usize + cell] {
                px.0[c] = 0;
            }
        }
    }
    out
}

fn grayscale_blend(img: &RgbImage, alpha: f32) -> RgbImage {
    let mut out = img.clone();
    for px in out.pixels_mut() {
        let [r, g, b] = px.0.map(|v| v as f32);
        let l = 0.299 * r + 0.587 * g + 0.114 * b;
        for c in 0..3 {
            let v = px.0[c] as f32;
            px.0[c] = to_u8((1.0 - alpha) * v + alpha * l);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgb([200, 120, 40])
            } else {
                Rgb([20, 60, 220])
            }
        })
    }

    fn all_ops() -> Vec<PhotometricOp> {
        vec![
            PhotometricOp::Superpixels {
                replace: 0.7,
                segments: 30,
                seed: 1,
            },
            PhotometricOp::GaussianBlur { sigma: 1.5 },
            PhotometricOp::AverageBlur { kernel: 4 },
            PhotometricOp::MedianBlur { kernel: 5 },
            PhotometricOp::MotionBlur {
                kernel: 5,
                angle_degrees: 100.0,
            },
            PhotometricOp::EdgeDetect { alpha: 0.4 },
            PhotometricOp::DirectedEdgeDetect {
                alpha: 0.6,
                direction: 0.25,
            },
            PhotometricOp::AdditiveGaussianNoise {
                scale: 8.0,
                per_channel: true,
                seed: 2,
            },
            PhotometricOp::Dropout {
                fraction: 0.05,
                per_channel: false,
                seed: 3,
            },
            PhotometricOp::CoarseDropout {
                fraction: 0.1,
                size: 0.05,
                per_channel: true,
                seed: 4,
            },
            PhotometricOp::Invert {
                channels: [true, false, true],
            },
            PhotometricOp::Add {
                value: [5.0, -5.0, 0.0],
            },
            PhotometricOp::Multiply {
                factor: [1.2, 0.8, 1.0],
            },
            PhotometricOp::LinearContrast {
                alpha: [1.5, 1.5, 1.5],
            },
            PhotometricOp::SigmoidContrast {
                gain: 6.0,
                cutoff: 0.5,
            },
            PhotometricOp::Grayscale { alpha: 0.5 },
        ]
    }

    #[test]
    fn every_op_keeps_size_and_is_deterministic() {
        let img = checker(37, 23);
        for op in all_ops() {
            let a = op.apply(&img);
            let b = op.apply(&img);
            assert_eq!(a.dimensions(), img.dimensions(), "{} resized", op.name());
            assert_eq!(a, b, "{} is not deterministic", op.name());
        }
    }

    #[test]
    fn invert_flips_selected_channels_only() {
        let img = RgbImage::from_pixel(3, 3, Rgb([10, 20, 30]));
        let out = PhotometricOp::Invert {
            channels: [true, false, false],
        }
        .apply(&img);
        assert_eq!(out.get_pixel(1, 1).0, [245, 20, 30]);
    }

    #[test]
    fn add_and_multiply_saturate() {
        let img = RgbImage::from_pixel(2, 2, Rgb([250, 5, 100]));
        let added = PhotometricOp::Add {
            value: [10.0, -10.0, 0.0],
        }
        .apply(&img);
        assert_eq!(added.get_pixel(0, 0).0, [255, 0, 100]);
        let scaled = PhotometricOp::Multiply {
            factor: [2.0, 2.0, 0.5],
        }
        .apply(&img);
        assert_eq!(scaled.get_pixel(0, 0).0, [255, 10, 50]);
    }

    #[test]
    fn full_grayscale_equalizes_channels() {
        let img = checker(8, 8);
        let out = PhotometricOp::Grayscale { alpha: 1.0 }.apply(&img);
        for px in out.pixels() {
            assert!(px.0[0].abs_diff(px.0[1]) <= 1 && px.0[1].abs_diff(px.0[2]) <= 1);
        }
    }

    #[test]
    fn blur_of_flat_image_is_flat() {
        let img = RgbImage::from_pixel(12, 9, Rgb([90, 90, 90]));
        for op in [
            PhotometricOp::AverageBlur { kernel: 3 },
            PhotometricOp::MotionBlur {
                kernel: 7,
                angle_degrees: 72.0,
            },
            PhotometricOp::MedianBlur { kernel: 3 },
        ] {
            // Filters may truncate instead of round when going back to u8.
            let out = op.apply(&img);
            assert_eq!(out.dimensions(), img.dimensions());
            for px in out.pixels() {
                assert!(px.0.iter().all(|&v| v.abs_diff(90) <= 1), "{}: {:?}", op.name(), px);
            }
        }
    }

    #[test]
    fn motion_kernel_is_normalized() {
        let k = motion_kernel(5, 30.0);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
    }

    #[test]
    fn full_dropout_blacks_out_everything() {
        let img = checker(10, 10);
        let out = PhotometricOp::Dropout {
            fraction: 1.0,
            per_channel: false,
            seed: 9,
        }
        .apply(&img);
        assert!(out.pixels().all(|p| p.0 == [0, 0, 0]));
    }
}
