use crate::{BoundingBox, Keypoint, KEYPOINT_COUNT};
use image::RgbImage;
use nalgebra::Point2;

/// An RGB raster with its box and keypoints, all in the raster's frame.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotatedImage {
    pub image: RgbImage,
    pub bbox: BoundingBox,
    pub keypoints: [Keypoint; KEYPOINT_COUNT],
}

/// Number of points produced by [`AnnotatedImage::annotation_points`].
pub const ANNOTATION_POINT_COUNT: usize = KEYPOINT_COUNT + 4;

impl AnnotatedImage {
    pub fn new(image: RgbImage, bbox: BoundingBox, keypoints: [Keypoint; KEYPOINT_COUNT]) -> Self {
        Self {
            image,
            bbox,
            keypoints,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Flatten the annotation into points: the keypoints followed by the four
    /// box corners (see [`BoundingBox::corners`]).
    pub fn annotation_points(&self) -> [Point2<f32>; ANNOTATION_POINT_COUNT] {
        let corners = self.bbox.corners();
        let mut out = [Point2::origin(); ANNOTATION_POINT_COUNT];
        for (dst, kp) in out.iter_mut().zip(self.keypoints.iter()) {
            *dst = kp.position;
        }
        out[KEYPOINT_COUNT..].copy_from_slice(&corners);
        out
    }

    /// Rebuild from a transformed raster and points laid out as in
    /// [`AnnotatedImage::annotation_points`]. The box becomes the axis-aligned
    /// box enclosing the transformed corners.
    pub fn from_transformed(image: RgbImage, points: &[Point2<f32>; ANNOTATION_POINT_COUNT]) -> Self {
        let mut keypoints = [Keypoint::new(0.0, 0.0); KEYPOINT_COUNT];
        for (kp, p) in keypoints.iter_mut().zip(points.iter()) {
            kp.position = *p;
        }
        let bbox = BoundingBox::enclosing(&points[KEYPOINT_COUNT..])
            .unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0));
        Self {
            image,
            bbox,
            keypoints,
        }
    }

    /// Indices of keypoints lying outside the frame.
    pub fn out_of_frame_keypoints(&self) -> Vec<usize> {
        let (w, h) = (self.width() as f32, self.height() as f32);
        self.keypoints
            .iter()
            .enumerate()
            .filter(|(_, kp)| !kp.is_in_frame(w, h))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn bbox_in_frame(&self) -> bool {
        self.bbox
            .is_in_frame(self.width() as f32, self.height() as f32)
    }

    /// The box clamped to the current frame.
    pub fn clipped_bbox(&self) -> BoundingBox {
        self.bbox.clipped(self.width() as f32, self.height() as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnnotatedImage {
        AnnotatedImage::new(
            RgbImage::new(100, 80),
            BoundingBox::from_top_left_size(10.0, 10.0, 50.0, 50.0),
            [
                Keypoint::new(20.0, 20.0),
                Keypoint::new(50.0, 20.0),
                Keypoint::new(50.0, 50.0),
                Keypoint::new(120.0, 50.0),
            ],
        )
    }

    #[test]
    fn points_round_trip_through_flattening() {
        let a = sample();
        let pts = a.annotation_points();
        assert_eq!(pts[0], Point2::new(20.0, 20.0));
        assert_eq!(pts[KEYPOINT_COUNT], Point2::new(10.0, 10.0));
        assert_eq!(pts[KEYPOINT_COUNT + 2], Point2::new(60.0, 60.0));

        let b = AnnotatedImage::from_transformed(a.image.clone(), &pts);
        assert_eq!(a, b);
    }

    #[test]
    fn flags_out_of_frame_keypoints() {
        let a = sample();
        assert_eq!(a.out_of_frame_keypoints(), vec![3]);
        assert!(a.bbox_in_frame());
    }
}
