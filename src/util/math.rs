//! Integer geometry helpers for rail segments.

/// Pixel coordinate in image space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Point {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl Point {
    /// Creates a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Point) -> f32 {
        let dx = (other.x - self.x) as f32;
        let dy = (other.y - self.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Number of pixels a Bresenham walk to `other` visits (both ends included).
    pub(crate) fn steps_to(self, other: Point) -> i32 {
        let dx = (other.x - self.x).abs();
        let dy = (other.y - self.y).abs();
        dx.max(dy) + 1
    }
}

/// Iterator over the pixels of a Bresenham line, endpoints included.
#[derive(Clone, Debug)]
pub struct LineWalker {
    x: i32,
    y: i32,
    end: Point,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    error: i32,
    done: bool,
}

impl LineWalker {
    /// Walks from `start` to `end`.
    pub fn new(start: Point, end: Point) -> Self {
        let dx = (end.x - start.x).abs();
        let dy = (end.y - start.y).abs();
        Self {
            x: start.x,
            y: start.y,
            end,
            dx,
            dy,
            sx: if start.x < end.x { 1 } else { -1 },
            sy: if start.y < end.y { 1 } else { -1 },
            error: (if dx > dy { dx } else { -dy }) / 2,
            done: false,
        }
    }
}

impl Iterator for LineWalker {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        if self.done {
            return None;
        }
        let current = Point::new(self.x, self.y);
        if current == self.end {
            self.done = true;
            return Some(current);
        }

        let e = self.error;
        if e > -self.dx {
            self.error -= self.dy;
            self.x += self.sx;
        }
        if e < self.dy {
            self.error += self.dx;
            self.y += self.sy;
        }
        Some(current)
    }
}

/// Distance between two directed segments, independent of their direction.
///
/// Both endpoint pairings are tried and the smaller of the two worst endpoint
/// distances is returned.
pub fn segment_distance(a: (Point, Point), b: (Point, Point)) -> f32 {
    let same = a.0.distance(b.0).max(a.1.distance(b.1));
    let swapped = a.0.distance(b.1).max(a.1.distance(b.0));
    same.min(swapped)
}

/// Interpolates along `start -> end` at `t` and rounds to the nearest pixel.
pub(crate) fn lerp_point(start: Point, end: Point, t: f32) -> Point {
    let x = start.x as f32 + (end.x - start.x) as f32 * t;
    let y = start.y as f32 + (end.y - start.y) as f32 * t;
    Point::new(x.round() as i32, y.round() as i32)
}
