use annotaug_core::AnnotatedImage;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

const BOX_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// One color per keypoint index so a swapped order is visible at a glance.
const KEYPOINT_COLORS: [Rgb<u8>; 4] = [
    Rgb([0, 255, 0]),
    Rgb([0, 160, 255]),
    Rgb([255, 255, 0]),
    Rgb([255, 0, 255]),
];
const KEYPOINT_RADIUS: i32 = 2;

/// Copy of the raster with the (clipped) box outline and keypoint markers drawn.
pub fn draw_annotations(annotated: &AnnotatedImage) -> RgbImage {
    let mut canvas = annotated.image.clone();
    let bbox = annotated.clipped_bbox();
    let rect = Rect::at(bbox.x1.round() as i32, bbox.y1.round() as i32).of_size(
        (bbox.width().round() as u32).max(1),
        (bbox.height().round() as u32).max(1),
    );
    draw_hollow_rect_mut(&mut canvas, rect, BOX_COLOR);

    for (kp, color) in annotated.keypoints.iter().zip(KEYPOINT_COLORS) {
        if !kp.is_in_frame(annotated.width() as f32, annotated.height() as f32) {
            continue;
        }
        let center = (kp.x().round() as i32, kp.y().round() as i32);
        draw_filled_circle_mut(&mut canvas, center, KEYPOINT_RADIUS, color);
    }
    canvas
}
