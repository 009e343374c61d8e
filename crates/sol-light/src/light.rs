//! Light sources.

use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// A point light (a sun) for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// World position.
    pub position: Vec2,
    /// Visual radius of the light body.
    pub radius: f64,
    /// Split lights divide the world into two halves at `position.x` and take
    /// no part in ray casting or shadow geometry.
    #[serde(default)]
    pub is_split: bool,
}

/// The half of the world a point falls in relative to a split light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitSide {
    /// Strictly left of the light (`x < light.x`).
    West,
    /// At or right of the light (`x >= light.x`).
    East,
}

impl Light {
    /// An ordinary ray-casting light.
    pub fn new(position: Vec2, radius: f64) -> Self {
        Self {
            position,
            radius,
            is_split: false,
        }
    }

    /// A split light at `position`.
    pub fn split(position: Vec2, radius: f64) -> Self {
        Self {
            position,
            radius,
            is_split: true,
        }
    }

    /// Which side of this light `point` lies on, by x-coordinate alone.
    ///
    /// Defined for every light; only meaningful for split lights.
    pub fn split_side(&self, point: Vec2) -> SplitSide {
        if point.x < self.position.x {
            SplitSide::West
        } else {
            SplitSide::East
        }
    }

    /// Whether this light takes part in ray casting and shadow geometry.
    #[inline]
    pub fn casts_rays(&self) -> bool {
        !self.is_split
    }
}
