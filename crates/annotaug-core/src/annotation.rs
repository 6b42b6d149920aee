use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Number of landmarks carried by every annotated image.
pub const KEYPOINT_COUNT: usize = 4;

/// One landmark. Its identity is its index in the owning `[Keypoint; 4]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub position: Point2<f32>,
}

impl Keypoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            position: Point2::new(x, y),
        }
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.position.y
    }

    /// Inside the closed frame `[0, width] x [0, height]`.
    pub fn is_in_frame(&self, width: f32, height: f32) -> bool {
        let p = self.position;
        p.x >= 0.0 && p.y >= 0.0 && p.x <= width && p.y <= height
    }
}

/// Axis-aligned box in corner form. Invariant: `x2 >= x1`, `y2 >= y1`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    /// Build from corners, reordering them if needed.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x1: x1.min(x2),
            y1: y1.min(y2),
            x2: x1.max(x2),
            y2: y1.max(y2),
        }
    }

    /// Build from the `(top, left, width, height)` form used by annotation files.
    pub fn from_top_left_size(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    /// Smallest axis-aligned box enclosing `points`. `None` for an empty slice.
    pub fn enclosing(points: &[Point2<f32>]) -> Option<Self> {
        let first = points.first()?;
        let mut b = Self {
            x1: first.x,
            y1: first.y,
            x2: first.x,
            y2: first.y,
        };
        for p in &points[1..] {
            b.x1 = b.x1.min(p.x);
            b.y1 = b.y1.min(p.y);
            b.x2 = b.x2.max(p.x);
            b.y2 = b.y2.max(p.y);
        }
        Some(b)
    }

    pub fn top(&self) -> f32 {
        self.y1
    }

    pub fn left(&self) -> f32 {
        self.x1
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    /// Corners in order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point2<f32>; 4] {
        [
            Point2::new(self.x1, self.y1),
            Point2::new(self.x2, self.y1),
            Point2::new(self.x2, self.y2),
            Point2::new(self.x1, self.y2),
        ]
    }

    /// Clamp to the frame `[0, width] x [0, height]`.
    pub fn clipped(&self, width: f32, height: f32) -> Self {
        Self::new(
            self.x1.clamp(0.0, width),
            self.y1.clamp(0.0, height),
            self.x2.clamp(0.0, width),
            self.y2.clamp(0.0, height),
        )
    }

    /// True when the box fully lies inside the frame.
    pub fn is_in_frame(&self, width: f32, height: f32) -> bool {
        self.x1 >= 0.0 && self.y1 >= 0.0 && self.x2 <= width && self.y2 <= height
    }
}
