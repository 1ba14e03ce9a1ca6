use std::time::Duration;

use serde::Deserialize;
use sunburst_renderer::{
    Chart, Config, Phase, RenderOptions, Theme, ZoomOutcome, render_with_options,
};
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SunburstRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    width: Option<f64>,
    focus: Option<String>,
    duration_ms: Option<u64>,
}

fn build_render_options(options: SunburstRenderOptions) -> Result<RenderOptions, String> {
    let mut render_options = match options.theme.as_deref() {
        None => RenderOptions::light(),
        Some(name) => RenderOptions {
            theme: Theme::from_name(name).ok_or_else(|| format!("unknown theme '{name}'"))?,
            ..RenderOptions::default()
        },
    };

    if let Some(font_family) = options.font_family {
        render_options.theme.font_family = font_family;
    }
    if let Some(width) = options.width {
        render_options.render.width = width.max(1.0);
    }
    if let Some(duration_ms) = options.duration_ms {
        render_options.layout.transition.duration_ms = duration_ms;
    }
    render_options.focus = options.focus;

    Ok(render_options)
}

fn parse_options(options_json: Option<String>) -> Result<RenderOptions, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<SunburstRenderOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        SunburstRenderOptions::default()
    };
    build_render_options(options).map_err(|error| JsValue::from_str(&error))
}

fn outcome_name(outcome: ZoomOutcome) -> String {
    match outcome {
        ZoomOutcome::Started => "started",
        ZoomOutcome::Restarted => "restarted",
        ZoomOutcome::Ignored => "ignored",
    }
    .to_string()
}

#[wasm_bindgen]
pub fn render_sunburst_svg(data: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let render_options = parse_options(options_json)?;
    render_with_options(data, render_options).map_err(|error| JsValue::from_str(&error.to_string()))
}

/// Interactive chart for hosts that own the animation loop: feed pointer events and
/// frame deltas in, take SVG out.
#[wasm_bindgen]
pub struct SunburstChart {
    chart: Chart,
}

#[wasm_bindgen]
impl SunburstChart {
    #[wasm_bindgen(constructor)]
    pub fn new(data: &str, options_json: Option<String>) -> Result<SunburstChart, JsValue> {
        let options = parse_options(options_json)?;
        let focus = options.focus.clone();
        let config = Config {
            theme: options.theme,
            layout: options.layout,
            render: options.render,
        };
        let mut chart = Chart::from_json_str(data, &config)
            .map_err(|error| JsValue::from_str(&error.to_string()))?;
        if let Some(path) = focus.as_deref() {
            chart
                .zoom_to_path(path)
                .map_err(|error| JsValue::from_str(&error.to_string()))?;
            chart.finish();
        }
        Ok(SunburstChart { chart })
    }

    /// Returns "started", "restarted" or "ignored".
    pub fn click(&mut self, x: f64, y: f64) -> String {
        outcome_name(self.chart.click(x, y))
    }

    pub fn hover(&mut self, x: f64, y: f64) -> bool {
        self.chart.hover(x, y)
    }

    pub fn clear_hover(&mut self) {
        self.chart.clear_hover();
    }

    /// Advances the transition; returns true while it is still running. Negative or NaN
    /// deltas count as zero, overflowing ones finish the transition.
    pub fn tick(&mut self, elapsed_ms: f64) -> bool {
        let elapsed =
            Duration::try_from_secs_f64(elapsed_ms.max(0.0) / 1000.0).unwrap_or(Duration::MAX);
        self.chart.tick(elapsed) == Phase::Transitioning
    }

    pub fn set_theme(&mut self, name: &str) -> Result<(), JsValue> {
        let theme = Theme::from_name(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown theme '{name}'")))?;
        self.chart.set_theme(theme);
        Ok(())
    }

    pub fn focus_path(&self) -> String {
        self.chart.hierarchy().path(self.chart.state().focus())
    }

    pub fn svg(&self) -> String {
        self.chart.render_svg()
    }
}

#[cfg(test)]
mod tests {
    use sunburst_renderer::render_with_options;

    use crate::{SunburstChart, SunburstRenderOptions, build_render_options};

    const DATA: &str = r#"{"name":"root","children":[
        {"name":"A","children":[{"name":"A1","value":6},{"name":"A2","value":4}]},
        {"name":"B","value":10}
    ]}"#;

    #[test]
    fn renders_with_default_options() {
        let svg = render_with_options(DATA, build_render_options(SunburstRenderOptions::default()).unwrap())
            .expect("sunburst should render");

        assert!(svg.contains("<svg"));
        assert!(svg.contains(">A<"));
        assert!(svg.contains(">B<"));
    }

    #[test]
    fn options_select_theme_and_focus() {
        let options = build_render_options(SunburstRenderOptions {
            theme: Some("dark".to_string()),
            focus: Some("A".to_string()),
            ..SunburstRenderOptions::default()
        })
        .unwrap();
        assert_eq!(options.theme.name, "dark");
        assert_eq!(options.focus.as_deref(), Some("A"));

        let unknown = build_render_options(SunburstRenderOptions {
            theme: Some("neon".to_string()),
            ..SunburstRenderOptions::default()
        });
        assert!(unknown.is_err());
    }

    #[test]
    fn chart_tracks_focus_through_ticks() {
        let mut chart =
            SunburstChart::new(DATA, Some(r#"{"focus":"A"}"#.to_string())).unwrap_or_else(|_| panic!("chart"));
        assert_eq!(chart.focus_path(), "A");
        assert!(!chart.tick(16.0));
        assert!(chart.svg().contains(">A1<"));
    }

    #[test]
    fn tick_accepts_non_finite_deltas() {
        let mut chart = SunburstChart::new(DATA, None).unwrap_or_else(|_| panic!("chart"));
        chart.chart.zoom_to_path("A").unwrap();
        assert!(chart.tick(f64::NAN));
        assert!(chart.tick(-5.0));
        assert!(!chart.tick(f64::INFINITY));
        assert_eq!(chart.focus_path(), "A");
        assert!(!chart.tick(1e300));
    }
}
