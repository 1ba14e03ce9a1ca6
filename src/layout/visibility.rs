use serde::{Deserialize, Serialize};

use super::Interval;

/// Decides which arcs and labels are drawn, relative to the focus depth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VisibilityPolicy {
    /// Outermost band (relative to the focus) that is still drawn.
    pub max_visible_depth: f64,
    /// Minimum `band * angle` area for a label to be drawn.
    pub label_area_threshold: f64,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            max_visible_depth: 3.0,
            label_area_threshold: 0.03,
        }
    }
}

impl VisibilityPolicy {
    pub fn arc_visible(&self, interval: &Interval, focus_depth: f64) -> bool {
        interval.y1 - focus_depth <= self.max_visible_depth
            && interval.y0 - focus_depth >= 1.0
            && interval.x1 > interval.x0
    }

    pub fn label_visible(&self, interval: &Interval, focus_depth: f64) -> bool {
        self.arc_visible(interval, focus_depth) && interval.area() > self.label_area_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_boundary_is_inclusive() {
        let policy = VisibilityPolicy::default();
        let at_edge = Interval::new(0.0, 1.0, 2.0, 3.0);
        let past_edge = Interval::new(0.0, 1.0, 3.0, 4.0);
        assert!(policy.arc_visible(&at_edge, 0.0));
        assert!(!policy.arc_visible(&past_edge, 0.0));
        assert!(policy.arc_visible(&past_edge, 1.0));
    }

    #[test]
    fn focus_band_and_inner_rings_are_hidden() {
        let policy = VisibilityPolicy::default();
        assert!(!policy.arc_visible(&Interval::new(0.0, 1.0, 0.0, 1.0), 0.0));
        assert!(policy.arc_visible(&Interval::new(0.0, 1.0, 1.0, 2.0), 0.0));
        assert!(!policy.arc_visible(&Interval::new(0.0, 1.0, 2.0, 3.0), 2.0));
    }

    #[test]
    fn zero_width_arcs_are_hidden() {
        let policy = VisibilityPolicy::default();
        assert!(!policy.arc_visible(&Interval::new(1.0, 1.0, 1.0, 2.0), 0.0));
    }

    #[test]
    fn labels_need_enough_area() {
        let policy = VisibilityPolicy::default();
        assert!(!policy.label_visible(&Interval::new(0.0, 0.02, 1.0, 2.0), 0.0));
        assert!(policy.label_visible(&Interval::new(0.0, 0.05, 1.0, 2.0), 0.0));

        let relaxed = VisibilityPolicy {
            label_area_threshold: 0.01,
            ..VisibilityPolicy::default()
        };
        assert!(relaxed.label_visible(&Interval::new(0.0, 0.02, 1.0, 2.0), 0.0));
    }

    #[test]
    fn label_threshold_is_strict() {
        let policy = VisibilityPolicy {
            label_area_threshold: 0.25,
            ..VisibilityPolicy::default()
        };
        // Band 1 times span 0.25: area equals the threshold exactly.
        let at_threshold = Interval::new(0.5, 0.75, 1.0, 2.0);
        assert_eq!(at_threshold.area(), policy.label_area_threshold);
        assert!(policy.arc_visible(&at_threshold, 0.0));
        assert!(!policy.label_visible(&at_threshold, 0.0));
        assert!(policy.label_visible(&Interval::new(0.5, 0.875, 1.0, 2.0), 0.0));
    }
}
