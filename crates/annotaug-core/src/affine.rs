use nalgebra::{Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};

/// 2D affine transform stored as a 3x3 matrix with last row `[0, 0, 1]`.
///
/// Points use the continuous image convention: pixel `(i, j)` covers
/// `[i, i + 1) x [j, j + 1)`, so an image of size `W x H` spans `[0, W] x [0, H]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affine2 {
    pub m: Matrix3<f64>,
}

impl Default for Affine2 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine2 {
    pub fn new(m: Matrix3<f64>) -> Self {
        Self { m }
    }

    pub fn identity() -> Self {
        Self::new(Matrix3::identity())
    }

    pub fn from_array(rows: [[f64; 3]; 2]) -> Self {
        Self::new(Matrix3::new(
            rows[0][0], rows[0][1], rows[0][2], //
            rows[1][0], rows[1][1], rows[1][2], //
            0.0, 0.0, 1.0,
        ))
    }

    pub fn to_array(&self) -> [[f64; 3]; 2] {
        [
            [self.m[(0, 0)], self.m[(0, 1)], self.m[(0, 2)]],
            [self.m[(1, 0)], self.m[(1, 1)], self.m[(1, 2)]],
        ]
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(Matrix3::new(
            1.0, 0.0, tx, //
            0.0, 1.0, ty, //
            0.0, 0.0, 1.0,
        ))
    }

    pub fn scaling(sx: f64, sy: f64) -> Self {
        Self::new(Matrix3::new(
            sx, 0.0, 0.0, //
            0.0, sy, 0.0, //
            0.0, 0.0, 1.0,
        ))
    }

    /// Rotation by `degrees` about `center`.
    ///
    /// Positive angles rotate clockwise on screen (y axis points down), which
    /// is the usual image-space convention.
    pub fn rotation_about(center: Point2<f64>, degrees: f64) -> Self {
        let (s, c) = degrees.to_radians().sin_cos();
        let rot = Matrix3::new(
            c, -s, 0.0, //
            s, c, 0.0, //
            0.0, 0.0, 1.0,
        );
        Self::new(
            Self::translation(center.x, center.y).m
                * rot
                * Self::translation(-center.x, -center.y).m,
        )
    }

    /// Mirror across the vertical midline of an image `width` wide: `x -> width - x`.
    pub fn flip_horizontal(width: f64) -> Self {
        Self::new(Matrix3::new(
            -1.0, 0.0, width, //
            0.0, 1.0, 0.0, //
            0.0, 0.0, 1.0,
        ))
    }

    /// Mirror across the horizontal midline of an image `height` tall: `y -> height - y`.
    pub fn flip_vertical(height: f64) -> Self {
        Self::new(Matrix3::new(
            1.0, 0.0, 0.0, //
            0.0, -1.0, height, //
            0.0, 0.0, 1.0,
        ))
    }

    /// Compose: the result applies `self` first, then `next`.
    pub fn then(&self, next: &Affine2) -> Affine2 {
        Self::new(next.m * self.m)
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.m * Vector3::new(p.x as f64, p.y as f64, 1.0);
        Point2::new(v[0] as f32, v[1] as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.m.try_inverse().map(Self::new)
    }

    /// True when the transform keeps axis-aligned rectangles axis-aligned.
    pub fn is_axis_aligned(&self) -> bool {
        self.m[(0, 1)].abs() < 1e-12 && self.m[(1, 0)].abs() < 1e-12
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point2<f32>, b: Point2<f32>, tol: f32) {
        let dx = (a.x - b.x).abs();
        let dy = (a.y - b.y).abs();
        assert!(
            dx < tol && dy < tol,
            "expected ({:.6},{:.6}) ~ ({:.6},{:.6}) within {}",
            a.x,
            a.y,
            b.x,
            b.y,
            tol
        );
    }

    #[test]
    fn inverse_round_trips_points() {
        let t = Affine2::rotation_about(Point2::new(40.0, 30.0), 17.0)
            .then(&Affine2::translation(5.0, -3.0))
            .then(&Affine2::scaling(1.3, 0.8));
        let inv = t.inverse().expect("invertible");

        for p in [
            Point2::new(0.0_f32, 0.0),
            Point2::new(50.0_f32, -20.0),
            Point2::new(320.0_f32, 200.0),
        ] {
            assert_close(inv.apply(t.apply(p)), p, 1e-3);
        }
    }

    #[test]
    fn rotation_keeps_center_fixed() {
        let c = Point2::new(50.0, 40.0);
        let t = Affine2::rotation_about(c, 23.0);
        assert_close(t.apply(Point2::new(50.0, 40.0)), Point2::new(50.0, 40.0), 1e-5);
    }

    #[test]
    fn quarter_turn_moves_right_to_down() {
        let t = Affine2::rotation_about(Point2::new(0.0, 0.0), 90.0);
        assert_close(t.apply(Point2::new(10.0, 0.0)), Point2::new(0.0, 10.0), 1e-5);
        assert!(!t.is_axis_aligned());
    }

    #[test]
    fn flips_mirror_across_midlines() {
        let h = Affine2::flip_horizontal(100.0);
        let v = Affine2::flip_vertical(80.0);
        assert_close(h.apply(Point2::new(20.0, 7.0)), Point2::new(80.0, 7.0), 1e-6);
        assert_close(v.apply(Point2::new(20.0, 7.0)), Point2::new(20.0, 73.0), 1e-6);
        assert!(h.is_axis_aligned());
        assert_close(h.then(&h).apply(Point2::new(13.0, 2.0)), Point2::new(13.0, 2.0), 1e-6);
    }

    #[test]
    fn composition_applies_left_to_right() {
        let t = Affine2::translation(10.0, 0.0).then(&Affine2::scaling(2.0, 2.0));
        assert_close(t.apply(Point2::new(1.0, 1.0)), Point2::new(22.0, 2.0), 1e-6);
    }

    #[test]
    fn array_round_trip() {
        let t = Affine2::from_array([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        assert_eq!(t.to_array(), [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    }
}
