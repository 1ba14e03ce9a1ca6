use std::f64::consts::TAU;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::hierarchy::{Hierarchy, NodeId};
use crate::layout::{Interval, Partition, VisibilityPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    Linear,
    #[default]
    CubicInOut,
}

impl Easing {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Some(Self::Linear),
            "cubic-in-out" | "cubic" | "cubicinout" => Some(Self::CubicInOut),
            _ => None,
        }
    }

    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::CubicInOut => {
                let t2 = t * 2.0;
                if t2 <= 1.0 {
                    t2 * t2 * t2 / 2.0
                } else {
                    let u = t2 - 2.0;
                    (u * u * u + 2.0) / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionConfig {
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 750,
            easing: Easing::CubicInOut,
        }
    }
}

impl TransitionConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Transitioning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomOutcome {
    /// A transition began from a committed state.
    Started,
    /// An in-flight transition was cancelled and a new one began from its sampled state.
    Restarted,
    /// The request does not trigger a transition (leaf or unknown node).
    Ignored,
}

#[derive(Debug, Clone)]
struct Transition {
    from: Vec<Interval>,
    elapsed: Duration,
}

/// Focus/zoom state of one chart.
///
/// `current` holds what is on screen, `target` the end-state of the last zoom. While
/// idle the two are equal. Intervals stored here are renormalized against the focus,
/// so visibility is always evaluated with a focus depth of zero.
#[derive(Debug, Clone)]
pub struct FocusState {
    base: Partition,
    focus: NodeId,
    current: Vec<Interval>,
    target: Vec<Interval>,
    transition: Option<Transition>,
    config: TransitionConfig,
    policy: VisibilityPolicy,
}

impl FocusState {
    pub fn new(
        hierarchy: &Hierarchy,
        base: Partition,
        config: TransitionConfig,
        policy: VisibilityPolicy,
    ) -> Self {
        let current = base.as_slice().to_vec();
        Self {
            focus: hierarchy.root(),
            target: current.clone(),
            current,
            base,
            transition: None,
            config,
            policy,
        }
    }

    pub fn focus(&self) -> NodeId {
        self.focus
    }

    pub fn phase(&self) -> Phase {
        if self.transition.is_some() {
            Phase::Transitioning
        } else {
            Phase::Idle
        }
    }

    pub fn base(&self) -> &Partition {
        &self.base
    }

    pub fn policy(&self) -> &VisibilityPolicy {
        &self.policy
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    pub fn current(&self, id: NodeId) -> Interval {
        self.current[id.index()]
    }

    pub fn target(&self, id: NodeId) -> Interval {
        self.target[id.index()]
    }

    pub fn current_intervals(&self) -> &[Interval] {
        &self.current
    }

    pub fn target_intervals(&self) -> &[Interval] {
        &self.target
    }

    /// Normalized time of the in-flight transition, `1.0` when idle.
    pub fn progress(&self) -> f64 {
        match &self.transition {
            Some(transition) => self.normalized(transition.elapsed),
            None => 1.0,
        }
    }

    pub fn zoom_to(&mut self, hierarchy: &Hierarchy, node: NodeId) -> ZoomOutcome {
        let Some(tree_node) = hierarchy.get(node) else {
            return ZoomOutcome::Ignored;
        };
        if tree_node.is_leaf() {
            trace!(node = %tree_node.name, "ignoring zoom on leaf");
            return ZoomOutcome::Ignored;
        }

        let outcome = if self.transition.is_some() {
            ZoomOutcome::Restarted
        } else {
            ZoomOutcome::Started
        };
        self.target = renormalize(hierarchy, &self.base, node);
        self.transition = Some(Transition {
            from: self.current.clone(),
            elapsed: Duration::ZERO,
        });
        self.focus = node;
        debug!(focus = %hierarchy.path(node), ?outcome, "zoom");
        outcome
    }

    /// Center click: zoom to the focus's parent, or the root when the focus has none.
    pub fn zoom_out(&mut self, hierarchy: &Hierarchy) -> ZoomOutcome {
        let parent = hierarchy
            .node(self.focus)
            .parent
            .unwrap_or_else(|| hierarchy.root());
        self.zoom_to(hierarchy, parent)
    }

    /// Advances the in-flight transition by `elapsed` and commits it once complete.
    pub fn tick(&mut self, elapsed: Duration) -> Phase {
        let Some(transition) = self.transition.as_mut() else {
            return Phase::Idle;
        };
        transition.elapsed = transition.elapsed.saturating_add(elapsed);
        let total = transition.elapsed;
        let t = self.normalized(total);
        if t >= 1.0 {
            return self.finish();
        }
        self.current = self.sample(t);
        Phase::Transitioning
    }

    /// Jumps to the end of the in-flight transition.
    pub fn finish(&mut self) -> Phase {
        if self.transition.take().is_some() {
            self.current = self.target.clone();
        }
        Phase::Idle
    }

    /// Intervals at normalized time `t` of the in-flight transition, without advancing it.
    pub fn sample(&self, t: f64) -> Vec<Interval> {
        let from = match &self.transition {
            Some(transition) => &transition.from,
            None => &self.current,
        };
        let eased = self.config.easing.apply(t);
        from.iter()
            .zip(&self.target)
            .map(|(start, end)| start.lerp(end, eased))
            .collect()
    }

    pub fn arc_visible(&self, id: NodeId) -> bool {
        self.policy.arc_visible(&self.current(id), 0.0)
    }

    pub fn label_visible(&self, id: NodeId) -> bool {
        self.policy.label_visible(&self.current(id), 0.0)
    }

    /// Whether the node takes part in the visual transition: visible before or after it.
    pub fn participates(&self, id: NodeId) -> bool {
        self.policy.arc_visible(&self.current(id), 0.0)
            || self.policy.arc_visible(&self.target(id), 0.0)
    }

    fn normalized(&self, elapsed: Duration) -> f64 {
        let duration = self.config.duration();
        if duration.is_zero() {
            return 1.0;
        }
        (elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
    }
}

/// Remaps every base interval into the coordinate space where `focus` fills the full
/// circle and sits at band zero.
pub fn renormalize(hierarchy: &Hierarchy, base: &Partition, focus: NodeId) -> Vec<Interval> {
    let p = base.get(focus);
    let span = p.angle_span();
    let depth = hierarchy.node(focus).depth as f64;
    let ratio = |x: f64| {
        if span > 0.0 {
            ((x - p.x0) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    };
    base.as_slice()
        .iter()
        .map(|d| Interval {
            x0: ratio(d.x0) * TAU,
            x1: ratio(d.x1) * TAU,
            y0: (d.y0 - depth).max(0.0),
            y1: (d.y1 - depth).max(0.0),
        })
        .collect()
}
