use crate::focus::{Easing, TransitionConfig};
use crate::layout::{RadialScale, VisibilityPolicy};
use crate::theme::Theme;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub max_visible_depth: f64,
    pub label_area_threshold: f64,
    pub radial_scale: RadialScale,
    pub transition: TransitionConfig,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let visibility = VisibilityPolicy::default();
        Self {
            max_visible_depth: visibility.max_visible_depth,
            label_area_threshold: visibility.label_area_threshold,
            radial_scale: RadialScale::AreaPreserving,
            transition: TransitionConfig::default(),
        }
    }
}

impl LayoutConfig {
    pub fn visibility(&self) -> VisibilityPolicy {
        VisibilityPolicy {
            max_visible_depth: self.max_visible_depth,
            label_area_threshold: self.label_area_threshold,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Side of the square chart in pixels.
    pub width: f64,
    pub pad_angle: f64,
    /// Pad radius as a multiple of the innermost band radius.
    pub pad_radius_factor: f64,
    pub label_wrap_chars: usize,
    pub min_font_size: f64,
    pub max_font_size: f64,
    pub label_line_height: f64,
    pub internal_opacity: f64,
    pub leaf_opacity: f64,
    pub hover_opacity: f64,
    pub center_label: String,
    pub center_label_size: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 928.0,
            pad_angle: 0.005,
            pad_radius_factor: 1.5,
            label_wrap_chars: 10,
            min_font_size: 8.0,
            max_font_size: 14.0,
            label_line_height: 1.0,
            internal_opacity: 0.6,
            leaf_opacity: 0.4,
            hover_opacity: 1.0,
            center_label: "Go to previous layer".to_string(),
            center_label_size: 7.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    text_color: Option<String>,
    background: Option<String>,
    palette: Option<Vec<String>>,
    arc_stroke: Option<String>,
    center_fill: Option<String>,
    center_text_color: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

impl NumberOrString {
    fn as_f64(&self) -> Option<f64> {
        match self {
            NumberOrString::Number(val) => Some(*val),
            NumberOrString::String(val) => val.trim().parse::<f64>().ok(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct SunburstConfigFile {
    max_visible_depth: Option<NumberOrString>,
    label_area_threshold: Option<NumberOrString>,
    radial_scale: Option<String>,
    duration_ms: Option<u64>,
    easing: Option<String>,
    width: Option<NumberOrString>,
    pad_angle: Option<NumberOrString>,
    pad_radius_factor: Option<NumberOrString>,
    label_wrap_chars: Option<usize>,
    min_font_size: Option<NumberOrString>,
    max_font_size: Option<NumberOrString>,
    label_line_height: Option<NumberOrString>,
    internal_opacity: Option<NumberOrString>,
    leaf_opacity: Option<NumberOrString>,
    hover_opacity: Option<NumberOrString>,
    center_label: Option<String>,
    center_label_size: Option<NumberOrString>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    sunburst: Option<SunburstConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config {}", path.display()))
}

/// Parses a config document. Strict JSON first, JSON5 (comments, trailing commas) second.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let parsed: ConfigFile = match serde_json::from_str(contents) {
        Ok(parsed) => parsed,
        Err(json_err) => json5::from_str(contents).map_err(|_| json_err)?,
    };

    let mut config = Config::default();

    if let Some(theme_name) = parsed.theme.as_deref() {
        config.theme = Theme::from_name(theme_name)
            .ok_or_else(|| anyhow::anyhow!("unknown theme '{theme_name}'"))?;
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.palette
            && !v.is_empty()
        {
            config.theme.palette = v;
        }
        if let Some(v) = vars.arc_stroke {
            config.theme.arc_stroke = v;
        }
        if let Some(v) = vars.center_fill {
            config.theme.center_fill = v;
        }
        if let Some(v) = vars.center_text_color {
            config.theme.center_text_color = v;
        }
    }

    if let Some(sunburst) = parsed.sunburst {
        apply_sunburst(&mut config, sunburst)?;
    }

    Ok(config)
}

fn apply_sunburst(config: &mut Config, file: SunburstConfigFile) -> anyhow::Result<()> {
    let layout = &mut config.layout;
    let render = &mut config.render;

    if let Some(v) = file.max_visible_depth.as_ref().and_then(NumberOrString::as_f64) {
        layout.max_visible_depth = v.max(1.0);
    }
    if let Some(v) = file.label_area_threshold.as_ref().and_then(NumberOrString::as_f64) {
        layout.label_area_threshold = v.max(0.0);
    }
    if let Some(name) = file.radial_scale.as_deref() {
        layout.radial_scale = RadialScale::from_name(name)
            .ok_or_else(|| anyhow::anyhow!("unknown radialScale '{name}'"))?;
    }
    if let Some(v) = file.duration_ms {
        layout.transition.duration_ms = v;
    }
    if let Some(name) = file.easing.as_deref() {
        layout.transition.easing =
            Easing::from_name(name).ok_or_else(|| anyhow::anyhow!("unknown easing '{name}'"))?;
    }

    if let Some(v) = file.width.as_ref().and_then(NumberOrString::as_f64) {
        render.width = v.max(1.0);
    }
    if let Some(v) = file.pad_angle.as_ref().and_then(NumberOrString::as_f64) {
        render.pad_angle = v.max(0.0);
    }
    if let Some(v) = file.pad_radius_factor.as_ref().and_then(NumberOrString::as_f64) {
        render.pad_radius_factor = v.max(0.0);
    }
    if let Some(v) = file.label_wrap_chars {
        render.label_wrap_chars = v.max(1);
    }
    if let Some(v) = file.min_font_size.as_ref().and_then(NumberOrString::as_f64) {
        render.min_font_size = v;
    }
    if let Some(v) = file.max_font_size.as_ref().and_then(NumberOrString::as_f64) {
        render.max_font_size = v;
    }
    if render.max_font_size < render.min_font_size {
        render.max_font_size = render.min_font_size;
    }
    if let Some(v) = file.label_line_height.as_ref().and_then(NumberOrString::as_f64) {
        render.label_line_height = v;
    }
    if let Some(v) = file.internal_opacity.as_ref().and_then(NumberOrString::as_f64) {
        render.internal_opacity = v.clamp(0.0, 1.0);
    }
    if let Some(v) = file.leaf_opacity.as_ref().and_then(NumberOrString::as_f64) {
        render.leaf_opacity = v.clamp(0.0, 1.0);
    }
    if let Some(v) = file.hover_opacity.as_ref().and_then(NumberOrString::as_f64) {
        render.hover_opacity = v.clamp(0.0, 1.0);
    }
    if let Some(v) = file.center_label {
        render.center_label = v;
    }
    if let Some(v) = file.center_label_size.as_ref().and_then(NumberOrString::as_f64) {
        render.center_label_size = v;
    }
    Ok(())
}
