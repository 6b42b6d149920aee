use annotaug_pipeline::{
    GeometricParams, GeometricPipeline, PhotometricParams, PipelineInstance, PipelineParams, Stage,
};
use image::{Rgb, RgbImage};
use nalgebra::Point2;

const W: u32 = 101;
const H: u32 = 81;

/// Black raster with a white 3x3 blob centered on pixel `(cx, cy)`.
fn marked_image(cx: u32, cy: u32) -> RgbImage {
    let mut img = RgbImage::new(W, H);
    for y in cy - 1..=cy + 1 {
        for x in cx - 1..=cx + 1 {
            img.put_pixel(x, y, Rgb([255, 255, 255]));
        }
    }
    img
}

/// Intensity-weighted centroid in continuous coordinates.
fn bright_centroid(img: &RgbImage) -> Option<Point2<f32>> {
    let mut sx = 0.0f64;
    let mut sy = 0.0f64;
    let mut sw = 0.0f64;
    for (x, y, p) in img.enumerate_pixels() {
        let v = p.0[0] as f64;
        if v > 0.0 {
            sx += v * (x as f64 + 0.5);
            sy += v * (y as f64 + 0.5);
            sw += v;
        }
    }
    (sw > 0.0).then(|| Point2::new((sx / sw) as f32, (sy / sw) as f32))
}

fn assert_within(a: Point2<f32>, b: Point2<f32>, tol: f32, what: &str) {
    let d = ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt();
    assert!(
        d <= tol,
        "{what}: keypoint ({:.2},{:.2}) vs marked ({:.2},{:.2}), distance {d:.3}",
        a.x,
        a.y,
        b.x,
        b.y
    );
}

#[test]
fn rotated_keypoint_tracks_marked_pixel() {
    let img = marked_image(70, 25);
    let kp = Point2::new(70.5, 25.5);
    for degrees in [-25.0f32, -12.5, -3.0, 0.0, 7.0, 18.0, 25.0] {
        let inst = PipelineInstance::from_stages(vec![Stage::Rotate { degrees }]);
        let (out, pts) = inst.apply(&img, &[kp]);
        let marked = bright_centroid(&out).expect("blob stays in frame");
        assert_within(pts[0], marked, 1.0, &format!("rotate {degrees}"));
    }
}

#[test]
fn rotation_after_flip_and_crop_tracks_marked_pixel() {
    let img = marked_image(30, 55);
    let kp = Point2::new(30.5, 55.5);
    let inst = PipelineInstance::from_stages(vec![
        Stage::FlipVertical,
        Stage::Crop(annotaug_pipeline::CropSpec {
            top: 0.05,
            right: 0.02,
            bottom: 0.08,
            left: 0.1,
            keep_size: true,
        }),
        Stage::Rotate { degrees: -20.0 },
        Stage::FlipHorizontal,
    ]);
    let (out, pts) = inst.apply(&img, &[kp]);
    let marked = bright_centroid(&out).expect("blob stays in frame");
    assert_within(pts[0], marked, 1.0, "composite");
}

#[test]
fn random_geometric_draws_keep_correspondence() {
    let params = PipelineParams {
        geometric: GeometricParams::default(),
        photometric: PhotometricParams::disabled(),
    };
    let pipeline = GeometricPipeline::new(params).expect("valid params");
    let img = marked_image(55, 38);
    let kp = Point2::new(55.5, 38.5);

    let mut checked = 0;
    for draw in 0..40 {
        let inst = pipeline.build(234, draw);
        let (out, pts) = inst.apply(&img, &[kp]);
        let p = pts[0];
        let (w, h) = out.dimensions();
        let margin = 5.0;
        if p.x < margin || p.y < margin || p.x > w as f32 - margin || p.y > h as f32 - margin {
            continue;
        }
        let marked = bright_centroid(&out).expect("blob in frame");
        assert_within(p, marked, 1.0, &format!("draw {draw} {:?}", inst.stages));
        checked += 1;
    }
    assert!(checked > 20);
}

#[test]
fn rotated_box_encloses_rotated_corners() {
    let inst = PipelineInstance::from_stages(vec![Stage::Rotate { degrees: 25.0 }]);
    let corners = [
        Point2::new(30.0f32, 20.0),
        Point2::new(70.0, 20.0),
        Point2::new(70.0, 60.0),
        Point2::new(30.0, 60.0),
    ];
    let (_, moved) = inst.apply(&RgbImage::new(W, H), &corners);
    let enclosing = annotaug_core::BoundingBox::enclosing(&moved).expect("non-empty");
    assert!(enclosing.width() > 40.0 && enclosing.height() > 40.0);
    for p in &moved {
        assert!(p.x >= enclosing.x1 && p.x <= enclosing.x2);
        assert!(p.y >= enclosing.y1 && p.y <= enclosing.y2);
    }
}
