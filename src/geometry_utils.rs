use std::ops::{Add, Sub};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A position in the image plane (pixels). The y axis grows downwards.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        distance(self.x, self.y, other.x, other.y)
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Point { x, y }
    }
}

impl From<Point> for (f32, f32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Displacement from `rhs` to `self`
impl Sub for Point {
    type Output = Vector2<f32>;

    fn sub(self, rhs: Point) -> Self::Output {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Vector2<f32>> for Point {
    type Output = Point;

    fn add(self, rhs: Vector2<f32>) -> Self::Output {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

pub fn distance(x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    ((x2 - x1).powf(2.0) + (y2 - y1).powf(2.0)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_is_euclidean() {
        let a = Point::new(0., 0.);
        let b = Point::new(3., 4.);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
        assert_eq!(a.distance(&a), 0.);
    }

    #[test]
    fn test_displacement_and_offset() {
        let start = Point::new(10., 20.);
        let end = Point::new(15., 12.);
        let v = end - start;
        assert_eq!(v, Vector2::new(5., -8.));
        assert_eq!(start + v, end);
    }
}
