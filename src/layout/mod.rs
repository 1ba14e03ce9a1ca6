use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hierarchy::{Hierarchy, NodeId};

pub mod visibility;

pub use visibility::VisibilityPolicy;

/// Angular (`x0..x1`, radians) and radial (`y0..y1`, unit depth bands) extent of one arc.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Interval {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl Interval {
    pub fn new(x0: f64, x1: f64, y0: f64, y1: f64) -> Self {
        Self { x0, x1, y0, y1 }
    }

    pub fn angle_span(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn band(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Approximate arc area in (band x radian) units.
    pub fn area(&self) -> f64 {
        self.band() * self.angle_span()
    }

    pub fn mid_angle(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }

    pub fn lerp(&self, other: &Interval, t: f64) -> Interval {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Interval {
            x0: mix(self.x0, other.x0),
            x1: mix(self.x1, other.x1),
            y0: mix(self.y0, other.y0),
            y1: mix(self.y1, other.y1),
        }
    }

    pub fn approx_eq(&self, other: &Interval, epsilon: f64) -> bool {
        (self.x0 - other.x0).abs() <= epsilon
            && (self.x1 - other.x1).abs() <= epsilon
            && (self.y0 - other.y0).abs() <= epsilon
            && (self.y1 - other.y1).abs() <= epsilon
    }
}

/// Maps unit radial bands to pixel radii.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RadialScale {
    /// `r = outer * sqrt(y / extent)`: equal band areas.
    #[default]
    AreaPreserving,
    /// `r = outer * y / extent`: equal band widths.
    Linear,
}

impl RadialScale {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "area-preserving" | "area" | "sqrt" => Some(Self::AreaPreserving),
            "linear" => Some(Self::Linear),
            _ => None,
        }
    }

    pub fn radius(self, y: f64, extent: f64, outer_radius: f64) -> f64 {
        let extent = extent.max(f64::EPSILON);
        let y = y.max(0.0);
        match self {
            Self::AreaPreserving => outer_radius * (y / extent).sqrt(),
            Self::Linear => outer_radius * y / extent,
        }
    }

    pub fn invert(self, radius: f64, extent: f64, outer_radius: f64) -> f64 {
        if outer_radius <= 0.0 {
            return 0.0;
        }
        let ratio = radius.max(0.0) / outer_radius;
        match self {
            Self::AreaPreserving => ratio * ratio * extent,
            Self::Linear => ratio * extent,
        }
    }
}

/// Base layout of a hierarchy with the root as focus. Indexed by [`NodeId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    intervals: Vec<Interval>,
}

impl Partition {
    pub fn get(&self, id: NodeId) -> Interval {
        self.intervals[id.index()]
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Splits each node's angular interval among its children proportionally to their
/// aggregated values, in sorted child order. Bands are `depth..depth + 1`.
pub fn partition(hierarchy: &Hierarchy) -> Partition {
    let mut intervals = vec![Interval::default(); hierarchy.len()];
    let root = hierarchy.root();
    intervals[root.index()] = Interval::new(0.0, TAU, 0.0, 1.0);

    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let node = hierarchy.node(id);
        let parent = intervals[id.index()];
        let scale = if node.aggregated_value > 0.0 {
            parent.angle_span() / node.aggregated_value
        } else {
            0.0
        };

        let mut cursor = parent.x0;
        for child_id in &node.children {
            let child = hierarchy.node(*child_id);
            let span = child.aggregated_value * scale;
            let depth = child.depth as f64;
            intervals[child_id.index()] = Interval::new(cursor, cursor + span, depth, depth + 1.0);
            cursor += span;
            stack.push(*child_id);
        }
    }

    debug!(nodes = intervals.len(), "computed partition");
    Partition { intervals }
}
