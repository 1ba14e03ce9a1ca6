use crate::config::{Config, LayoutConfig, RenderConfig};
use crate::focus::{FocusState, ZoomOutcome};
use crate::hierarchy::{Hierarchy, NodeId, TreeNode};
use crate::layout::{Interval, RadialScale, VisibilityPolicy};
use crate::text::{escape_xml, label_font_size, wrap_label};
use crate::theme::Theme;
use anyhow::Result;
use std::f64::consts::{PI, TAU};
use std::fmt::Write as _;
use std::path::Path;
use tracing::trace;

/// Half extents of the "Go to previous layer" control drawn at the center.
const CONTROL_HALF_WIDTH: f64 = 40.0;
const CONTROL_HALF_HEIGHT: f64 = 10.0;

/// What sits under a pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// The center disc outside the control: zooms to the focus's parent.
    Center,
    /// The center control: zooms back to the root.
    CenterControl,
    Arc(NodeId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArcVisual {
    pub id: NodeId,
    pub fill: String,
    pub fill_opacity: f64,
    pub path: String,
    pub clickable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelVisual {
    pub id: NodeId,
    pub lines: Vec<String>,
    pub font_size: f64,
    pub transform: String,
    pub opacity: f64,
}

/// Maps nodes and their intervals to SVG geometry and styling.
///
/// Owns its theme; switching between light and dark only touches colors, never the
/// layout or the focus state.
#[derive(Debug, Clone)]
pub struct SunburstRenderer {
    theme: Theme,
    config: RenderConfig,
    policy: VisibilityPolicy,
    radial_scale: RadialScale,
}

impl SunburstRenderer {
    pub fn new(theme: Theme, layout: &LayoutConfig, config: RenderConfig) -> Self {
        Self {
            theme,
            config,
            policy: layout.visibility(),
            radial_scale: layout.radial_scale,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.theme.clone(), &config.layout, config.render.clone())
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn outer_radius(&self) -> f64 {
        self.config.width / 2.0
    }

    pub fn radius_at(&self, band: f64) -> f64 {
        self.radial_scale
            .radius(band, self.policy.max_visible_depth, self.outer_radius())
    }

    pub fn center_radius(&self) -> f64 {
        self.radius_at(1.0)
    }

    pub fn fill_color(&self, node: &TreeNode) -> &str {
        match node.category {
            Some(category) => self.theme.category_color(category),
            None => self.theme.center_fill.as_str(),
        }
    }

    pub fn arc_opacity(&self, node: &TreeNode, interval: &Interval, hovered: bool) -> f64 {
        if !self.policy.arc_visible(interval, 0.0) {
            0.0
        } else if hovered && !node.is_leaf() {
            self.config.hover_opacity
        } else if node.is_leaf() {
            self.config.leaf_opacity
        } else {
            self.config.internal_opacity
        }
    }

    pub fn arc_visual(
        &self,
        hierarchy: &Hierarchy,
        id: NodeId,
        interval: &Interval,
        hovered: bool,
    ) -> ArcVisual {
        let node = hierarchy.node(id);
        ArcVisual {
            id,
            fill: self.fill_color(node).to_string(),
            fill_opacity: self.arc_opacity(node, interval, hovered),
            path: self.arc_path(interval),
            clickable: !node.is_leaf(),
        }
    }

    pub fn label_visual(&self, hierarchy: &Hierarchy, id: NodeId, interval: &Interval) -> LabelVisual {
        let node = hierarchy.node(id);
        let mid_radius = self.radius_at((interval.y0 + interval.y1) / 2.0);
        LabelVisual {
            id,
            lines: wrap_label(&node.name, self.config.label_wrap_chars),
            font_size: label_font_size(
                interval.angle_span() * mid_radius,
                self.config.min_font_size,
                self.config.max_font_size,
            ),
            transform: self.label_transform(interval),
            opacity: if self.policy.label_visible(interval, 0.0) {
                1.0
            } else {
                0.0
            },
        }
    }

    /// Rotates to the arc's mid angle and flips labels on the left half upright.
    pub fn label_transform(&self, interval: &Interval) -> String {
        let angle = interval.mid_angle().to_degrees();
        let radius = (self.radius_at(interval.y0) + self.radius_at(interval.y1)) / 2.0;
        let flip = if angle < 180.0 { 0 } else { 180 };
        format!(
            "rotate({}) translate({},0) rotate({flip})",
            fmt_num(angle - 90.0),
            fmt_num(radius)
        )
    }

    /// Annular sector path, angles clockwise from twelve o'clock.
    pub fn arc_path(&self, interval: &Interval) -> String {
        let r0 = self.radius_at(interval.y0);
        let r1 = self.radius_at(interval.y1);
        let span = interval.angle_span();
        if r1 <= 0.0 || span <= 0.0 || r1 <= r0 {
            return String::new();
        }

        if span >= TAU - 1e-9 {
            return ring_path(r0, r1);
        }

        let pad_radius = self.center_radius() * self.config.pad_radius_factor;
        let half_pad = span.min(self.config.pad_angle * 2.0) / 4.0;
        let (o0, o1) = padded_angles(interval, r1, pad_radius, half_pad);
        let large = if o1 - o0 > PI { 1 } else { 0 };

        let mut d = String::new();
        let (sx, sy) = polar(r1, o0);
        let (ex, ey) = polar(r1, o1);
        let _ = write!(
            d,
            "M{},{}A{},{},0,{large},1,{},{}",
            fmt_num(sx),
            fmt_num(sy),
            fmt_num(r1),
            fmt_num(r1),
            fmt_num(ex),
            fmt_num(ey)
        );

        if r0 > 0.0 {
            let (i0, i1) = padded_angles(interval, r0, pad_radius, half_pad);
            let large = if i1 - i0 > PI { 1 } else { 0 };
            let (ix, iy) = polar(r0, i1);
            let (jx, jy) = polar(r0, i0);
            let _ = write!(
                d,
                "L{},{}A{},{},0,{large},0,{},{}Z",
                fmt_num(ix),
                fmt_num(iy),
                fmt_num(r0),
                fmt_num(r0),
                fmt_num(jx),
                fmt_num(jy)
            );
        } else {
            d.push_str("L0,0Z");
        }
        d
    }

    /// Resolves a point in chart coordinates (origin at the center) against the
    /// currently displayed intervals.
    pub fn hit_test(&self, hierarchy: &Hierarchy, state: &FocusState, x: f64, y: f64) -> Option<Hit> {
        if x.abs() <= CONTROL_HALF_WIDTH && y.abs() <= CONTROL_HALF_HEIGHT {
            return Some(Hit::CenterControl);
        }
        let radius = x.hypot(y);
        if radius <= self.center_radius() {
            return Some(Hit::Center);
        }
        if radius > self.outer_radius() {
            return None;
        }
        let band = self
            .radial_scale
            .invert(radius, self.policy.max_visible_depth, self.outer_radius());
        let angle = x.atan2(-y).rem_euclid(TAU);
        hierarchy
            .ids()
            .filter(|id| *id != hierarchy.root())
            .find(|id| {
                let interval = state.current(*id);
                self.policy.arc_visible(&interval, 0.0)
                    && interval.x0 <= angle
                    && angle < interval.x1
                    && interval.y0 <= band
                    && band < interval.y1
            })
            .map(Hit::Arc)
    }

    /// Routes a click: the control zooms to the root, the rest of the center zooms out,
    /// an arc zooms in, anything else is ignored.
    pub fn click(&self, hierarchy: &Hierarchy, state: &mut FocusState, x: f64, y: f64) -> ZoomOutcome {
        match self.hit_test(hierarchy, state, x, y) {
            Some(Hit::CenterControl) => state.zoom_to(hierarchy, hierarchy.root()),
            Some(Hit::Center) => state.zoom_out(hierarchy),
            Some(Hit::Arc(id)) => state.zoom_to(hierarchy, id),
            None => ZoomOutcome::Ignored,
        }
    }

    pub fn render_svg(&self, hierarchy: &Hierarchy, state: &FocusState, hovered: Option<Hit>) -> String {
        let width = self.config.width;
        let half = width / 2.0;
        let mut svg = String::new();

        let _ = write!(
            svg,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{w}\" viewBox=\"{h} {h} {w} {w}\" class=\"sunburst-chart\" font-family=\"{}\">",
            escape_xml(&self.theme.font_family),
            w = fmt_num(width),
            h = fmt_num(-half),
        );
        let _ = write!(
            svg,
            "<rect x=\"{h}\" y=\"{h}\" width=\"{w}\" height=\"{w}\" fill=\"{}\"/>",
            self.theme.background,
            w = fmt_num(width),
            h = fmt_num(-half),
        );

        let hovered_arc = match hovered {
            Some(Hit::Arc(id)) => Some(id),
            _ => None,
        };

        svg.push_str("<g class=\"arcs\" fill-rule=\"evenodd\">");
        let mut drawn = 0usize;
        for id in hierarchy.ids().filter(|id| *id != hierarchy.root()) {
            if !state.participates(id) {
                continue;
            }
            let interval = state.current(id);
            let visual = self.arc_visual(hierarchy, id, &interval, hovered_arc == Some(id));
            let node = hierarchy.node(id);
            let cursor = if visual.clickable {
                " style=\"cursor:pointer\""
            } else {
                ""
            };
            let _ = write!(
                svg,
                "<path data-node=\"{}\" d=\"{}\" fill=\"{}\" fill-opacity=\"{}\" stroke=\"{}\" stroke-width=\"0.5\"{cursor}><title>{} ({})</title></path>",
                id.index(),
                visual.path,
                visual.fill,
                fmt_num(visual.fill_opacity),
                self.theme.arc_stroke,
                escape_xml(&hierarchy.path(id)),
                format_value(node.aggregated_value),
            );
            drawn += 1;
        }
        svg.push_str("</g>");

        let _ = write!(
            svg,
            "<g class=\"labels\" pointer-events=\"none\" text-anchor=\"middle\" fill=\"{}\" style=\"user-select:none\">",
            self.theme.text_color
        );
        for id in hierarchy.ids().filter(|id| *id != hierarchy.root()) {
            if !state.participates(id) {
                continue;
            }
            let label = self.label_visual(hierarchy, id, &state.current(id));
            if label.opacity <= 0.0 {
                continue;
            }
            let _ = write!(
                svg,
                "<text dy=\"0.35em\" transform=\"{}\" font-size=\"{}\" fill-opacity=\"{}\">",
                label.transform,
                fmt_num(label.font_size),
                fmt_num(label.opacity)
            );
            for (idx, line) in label.lines.iter().enumerate() {
                let dy = if idx == 0 {
                    "0em".to_string()
                } else {
                    format!("{}em", fmt_num(self.config.label_line_height))
                };
                let _ = write!(svg, "<tspan x=\"0\" dy=\"{dy}\">{}</tspan>", escape_xml(line));
            }
            svg.push_str("</text>");
        }
        svg.push_str("</g>");

        let control_opacity = match hovered {
            Some(Hit::Center | Hit::CenterControl) => 0.5,
            _ => 0.0,
        };
        let _ = write!(
            svg,
            "<circle class=\"center\" data-focus=\"{}\" r=\"{}\" fill=\"none\" pointer-events=\"all\"/>",
            state.focus().index(),
            fmt_num(self.center_radius())
        );
        let _ = write!(
            svg,
            "<g class=\"center-control\" pointer-events=\"all\" style=\"cursor:pointer\"><rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"5\" ry=\"5\" fill=\"{}\" fill-opacity=\"{}\"/><text text-anchor=\"middle\" dy=\"0.35em\" font-size=\"{}\" fill=\"{}\" fill-opacity=\"{}\">{}</text></g>",
            fmt_num(-CONTROL_HALF_WIDTH),
            fmt_num(-CONTROL_HALF_HEIGHT),
            fmt_num(CONTROL_HALF_WIDTH * 2.0),
            fmt_num(CONTROL_HALF_HEIGHT * 2.0),
            self.theme.center_fill,
            fmt_num(control_opacity),
            fmt_num(self.config.center_label_size),
            self.theme.center_text_color,
            fmt_num(control_opacity),
            escape_xml(&self.config.center_label)
        );

        svg.push_str("</svg>");
        trace!(arcs = drawn, focus = state.focus().index(), "rendered svg");
        svg
    }
}

fn polar(radius: f64, angle: f64) -> (f64, f64) {
    (radius * angle.sin(), -radius * angle.cos())
}

/// Angles of one arc edge after applying the pad, collapsed to the midpoint when the
/// pad would exceed the span.
fn padded_angles(interval: &Interval, radius: f64, pad_radius: f64, half_pad: f64) -> (f64, f64) {
    if radius <= 0.0 || half_pad <= 0.0 {
        return (interval.x0, interval.x1);
    }
    let inset = ((pad_radius / radius) * half_pad.sin()).clamp(-1.0, 1.0).asin();
    let start = interval.x0 + inset;
    let end = interval.x1 - inset;
    if end < start {
        let mid = interval.mid_angle();
        (mid, mid)
    } else {
        (start, end)
    }
}

fn ring_path(r0: f64, r1: f64) -> String {
    let mut d = format!(
        "M0,{}A{r},{r},0,1,1,0,{}A{r},{r},0,1,1,0,{}Z",
        fmt_num(-r1),
        fmt_num(r1),
        fmt_num(-r1),
        r = fmt_num(r1)
    );
    if r0 > 0.0 {
        let _ = write!(
            d,
            "M0,{}A{r},{r},0,1,0,0,{}A{r},{r},0,1,0,0,{}Z",
            fmt_num(-r0),
            fmt_num(r0),
            fmt_num(-r0),
            r = fmt_num(r0)
        );
    }
    d
}

fn fmt_num(value: f64) -> String {
    let text = format!("{value:.2}");
    if text == "-0.00" {
        "0.00".to_string()
    } else {
        text
    }
}

fn format_value(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if (rounded - rounded.round()).abs() < 0.001 {
        format!("{:.0}", rounded)
    } else {
        format!("{:.2}", rounded)
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    if let Some(family) = theme.font_family.split(',').next() {
        opt.font_family = family.trim().trim_matches('"').to_string();
    }
    let side = render_cfg.width as f32;
    opt.default_size = usvg::Size::from_wh(side, side)
        .ok_or_else(|| anyhow::anyhow!("invalid output size {side}"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig, _theme: &Theme) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}
