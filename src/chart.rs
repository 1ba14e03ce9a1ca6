use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::focus::{FocusState, Phase, ZoomOutcome};
use crate::hierarchy::{Hierarchy, NodeId};
use crate::layout::partition;
use crate::render::{Hit, SunburstRenderer};
use crate::theme::Theme;

/// One rendered chart: the hierarchy, its focus state and the renderer that draws it.
///
/// Hosts feed pointer events and frame ticks in and take SVG out.
#[derive(Debug, Clone)]
pub struct Chart {
    hierarchy: Hierarchy,
    state: FocusState,
    renderer: SunburstRenderer,
    hovered: Option<Hit>,
}

impl Chart {
    pub fn new(hierarchy: Hierarchy, config: &Config) -> Self {
        let state = FocusState::new(
            &hierarchy,
            partition(&hierarchy),
            config.layout.transition,
            config.layout.visibility(),
        );
        Self {
            hierarchy,
            state,
            renderer: SunburstRenderer::from_config(config),
            hovered: None,
        }
    }

    pub fn from_json_str(input: &str, config: &Config) -> Result<Self> {
        Ok(Self::new(Hierarchy::from_json_str(input)?, config))
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn state(&self) -> &FocusState {
        &self.state
    }

    pub fn renderer(&self) -> &SunburstRenderer {
        &self.renderer
    }

    pub fn zoom_to(&mut self, node: NodeId) -> ZoomOutcome {
        self.state.zoom_to(&self.hierarchy, node)
    }

    pub fn zoom_out(&mut self) -> ZoomOutcome {
        self.state.zoom_out(&self.hierarchy)
    }

    /// Zooms level by level from the root along a slash-joined path, e.g. `A/A1`. The
    /// last transition is left in flight; the empty path zooms back to the root.
    pub fn zoom_to_path(&mut self, path: &str) -> Result<ZoomOutcome> {
        let target = self
            .hierarchy
            .find_path(path)
            .ok_or_else(|| Error::UnknownPath(path.to_string()))?;
        if self.hierarchy.node(target).is_leaf() {
            return Err(Error::NotZoomable(path.to_string()));
        }

        if target == self.state.focus() {
            return Ok(ZoomOutcome::Ignored);
        }

        let root = self.hierarchy.root();
        let mut steps: Vec<NodeId> = self
            .hierarchy
            .ancestors(target)
            .filter(|id| *id != root)
            .collect();
        steps.reverse();
        steps.push(target);
        let mut outcome = ZoomOutcome::Ignored;
        for (idx, step) in steps.iter().enumerate() {
            if idx > 0 {
                self.state.finish();
            }
            outcome = self.zoom_to(*step);
        }
        debug!(%path, ?outcome, "zoomed along path");
        Ok(outcome)
    }

    pub fn click(&mut self, x: f64, y: f64) -> ZoomOutcome {
        self.renderer.click(&self.hierarchy, &mut self.state, x, y)
    }

    /// Updates the hover target; returns whether it changed. Leaves are not hover targets.
    pub fn hover(&mut self, x: f64, y: f64) -> bool {
        let hit = self
            .renderer
            .hit_test(&self.hierarchy, &self.state, x, y)
            .filter(|hit| match hit {
                Hit::Arc(id) => !self.hierarchy.node(*id).is_leaf(),
                _ => true,
            });
        let changed = hit != self.hovered;
        self.hovered = hit;
        changed
    }

    pub fn clear_hover(&mut self) {
        self.hovered = None;
    }

    pub fn tick(&mut self, elapsed: Duration) -> Phase {
        self.state.tick(elapsed)
    }

    pub fn finish(&mut self) -> Phase {
        self.state.finish()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.renderer.set_theme(theme);
    }

    pub fn render_svg(&self) -> String {
        self.renderer
            .render_svg(&self.hierarchy, &self.state, self.hovered)
    }

    /// SVG frames of the in-flight transition at `count` evenly spaced times, ending at
    /// the committed state. Does not advance the transition.
    pub fn transition_frames(&self, count: usize) -> Vec<String> {
        let mut preview = self.clone();
        let step = preview.state.config().duration().div_f64(count.max(1) as f64);
        (0..count)
            .map(|_| {
                preview.state.tick(step);
                preview.render_svg()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INPUT: &str = r#"{"name":"root","children":[
        {"name":"A","children":[{"name":"A1","children":[{"name":"deep","value":2}]},{"name":"A2","value":4}]},
        {"name":"B","value":10}
    ]}"#;

    #[test]
    fn zoom_to_path_walks_each_level() {
        let mut chart = Chart::from_json_str(INPUT, &Config::default()).unwrap();
        let outcome = chart.zoom_to_path("A/A1").unwrap();
        assert_eq!(outcome, ZoomOutcome::Started);
        assert_eq!(chart.state().phase(), Phase::Transitioning);
        chart.finish();
        assert_eq!(chart.state().focus(), chart.hierarchy().find_path("A/A1").unwrap());
    }

    #[test]
    fn zoom_to_path_errors() {
        let mut chart = Chart::from_json_str(INPUT, &Config::default()).unwrap();
        assert!(matches!(chart.zoom_to_path("Z"), Err(Error::UnknownPath(_))));
        assert!(matches!(chart.zoom_to_path("B"), Err(Error::NotZoomable(_))));
        assert_eq!(chart.state().focus(), chart.hierarchy().root());
    }

    #[test]
    fn root_path_zooms_to_root() {
        let mut chart = Chart::from_json_str(INPUT, &Config::default()).unwrap();
        assert_eq!(chart.zoom_to_path("").unwrap(), ZoomOutcome::Ignored);
        assert_eq!(chart.state().phase(), Phase::Idle);
    }

    #[test]
    fn hover_highlights_internal_arc_only() {
        let mut chart = Chart::from_json_str(INPUT, &Config::default()).unwrap();
        let radius = chart.renderer().radius_at(1.5);
        let arc_attrs = |svg: &str, id: NodeId| {
            let start = svg.find(&format!("data-node=\"{}\"", id.index())).unwrap();
            let tail = &svg[start..];
            tail[..tail.find('>').unwrap()].to_string()
        };

        // B is a leaf: no hover target, opacity stays at the leaf level.
        let b = chart.hierarchy().find_path("B").unwrap();
        assert!(!chart.hover(-radius * 0.1, radius));
        assert!(arc_attrs(&chart.render_svg(), b).contains("fill-opacity=\"0.40\""));

        let a = chart.hierarchy().find_path("A").unwrap();
        assert!(chart.hover(radius * 0.1, -radius));
        assert!(!chart.hover(radius * 0.1, -radius));
        assert!(arc_attrs(&chart.render_svg(), a).contains("fill-opacity=\"1.00\""));
        chart.clear_hover();
        assert!(arc_attrs(&chart.render_svg(), a).contains("fill-opacity=\"0.60\""));
    }

    #[test]
    fn center_control_click_returns_to_root() {
        let mut chart = Chart::from_json_str(INPUT, &Config::default()).unwrap();
        chart.zoom_to_path("A/A1").unwrap();
        chart.finish();
        assert_eq!(chart.click(0.0, 0.0), ZoomOutcome::Started);
        chart.finish();
        assert_eq!(chart.state().focus(), chart.hierarchy().root());
        assert_eq!(chart.hierarchy().path(chart.state().focus()), "");
    }

    #[test]
    fn frames_end_at_target() {
        let mut chart = Chart::from_json_str(INPUT, &Config::default()).unwrap();
        chart.zoom_to_path("A").unwrap();
        let frames = chart.transition_frames(4);
        assert_eq!(frames.len(), 4);
        assert_eq!(chart.state().phase(), Phase::Transitioning);
        chart.finish();
        assert_eq!(frames.last().unwrap(), &chart.render_svg());
    }
}
