//! Raster I/O boundary: everything enters and leaves the pipeline as RGB8.

use crate::AugmentError;
use image::RgbImage;
use std::{fs, path::Path};

/// Decode `path` into RGB8. Grayscale and alpha sources are converted.
pub fn load_rgb(path: &Path) -> Result<RgbImage, AugmentError> {
    if !path.is_file() {
        return Err(AugmentError::MissingImage {
            path: path.to_path_buf(),
        });
    }
    let decoded = image::open(path).map_err(|source| AugmentError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.to_rgb8())
}

/// Encode `image` with the codec implied by the extension of `path`,
/// creating parent directories as needed.
pub fn save_rgb(image: &RgbImage, path: &Path) -> Result<(), AugmentError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    image.save(path).map_err(|source| AugmentError::Image {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb};

    #[test]
    fn missing_file_is_reported_as_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_rgb(&dir.path().join("nope.png")).expect_err("missing");
        assert!(matches!(err, AugmentError::MissingImage { .. }));
    }

    #[test]
    fn garbage_file_is_an_image_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").expect("write");
        let err = load_rgb(&path).expect_err("undecodable");
        assert!(matches!(err, AugmentError::Image { .. }));
    }

    #[test]
    fn grayscale_source_becomes_rgb() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gray.png");
        GrayImage::from_pixel(4, 3, Luma([77])).save(&path).expect("save");
        let rgb = load_rgb(&path).expect("load");
        assert_eq!(rgb.dimensions(), (4, 3));
        assert_eq!(*rgb.get_pixel(1, 1), Rgb([77, 77, 77]));
    }

    #[test]
    fn save_creates_nested_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a").join("b").join("x.png");
        save_rgb(&RgbImage::new(2, 2), &path).expect("save");
        assert!(path.is_file());
    }
}
