use annotaug_core::{AnnotatedImage, BoundingBox, Keypoint, KEYPOINT_COUNT};
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// One annotated image: file reference, box and the four keypoints.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Image path as written in the annotation file (usually relative).
    pub file: String,
    pub bbox: BoundingBox,
    pub keypoints: [Keypoint; KEYPOINT_COUNT],
}

impl Record {
    pub fn new(
        file: impl Into<String>,
        bbox: BoundingBox,
        keypoints: [Keypoint; KEYPOINT_COUNT],
    ) -> Self {
        Self {
            file: file.into(),
            bbox,
            keypoints,
        }
    }

    /// Pair the annotation with its decoded raster.
    pub fn to_annotated(&self, image: RgbImage) -> AnnotatedImage {
        AnnotatedImage::new(image, self.bbox, self.keypoints)
    }

    /// Record for an augmented raster; the box is clamped to the frame when
    /// `clip_box` is set.
    pub fn from_annotated(file: impl Into<String>, annotated: &AnnotatedImage, clip_box: bool) -> Self {
        let bbox = if clip_box {
            annotated.clipped_bbox()
        } else {
            annotated.bbox
        };
        Self::new(file, bbox, annotated.keypoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_annotated_clips_only_when_asked() {
        let a = AnnotatedImage::new(
            RgbImage::new(50, 40),
            BoundingBox::new(-4.0, 5.0, 60.0, 30.0),
            [Keypoint::new(1.0, 1.0); KEYPOINT_COUNT],
        );
        let clipped = Record::from_annotated("x.jpg", &a, true);
        assert_eq!(clipped.bbox, BoundingBox::new(0.0, 5.0, 50.0, 30.0));
        let raw = Record::from_annotated("x.jpg", &a, false);
        assert_eq!(raw.bbox, a.bbox);
        assert_eq!(raw.to_annotated(RgbImage::new(50, 40)).bbox, a.bbox);
    }
}
