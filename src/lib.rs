pub mod chart;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod focus;
pub mod hierarchy;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod text;
pub mod theme;

pub use chart::Chart;
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, LayoutConfig, RenderConfig, load_config};
pub use error::{Error, LoadError, MalformedInputError};
pub use focus::{Easing, FocusState, Phase, TransitionConfig, ZoomOutcome};
pub use hierarchy::{Hierarchy, InputNode, NodeId, TreeNode};
pub use layout::{Interval, Partition, RadialScale, VisibilityPolicy, partition};
pub use render::{Hit, SunburstRenderer};
pub use theme::Theme;

/// Everything needed to render one chart from a JSON document.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub theme: Theme,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
    /// Slash-joined path of the node to focus, e.g. `A/A1`.
    pub focus: Option<String>,
}

impl RenderOptions {
    pub fn light() -> Self {
        Self::default()
    }

    pub fn dark() -> Self {
        Self {
            theme: Theme::dark(),
            ..Self::default()
        }
    }

    pub fn from_config(config: Config) -> Self {
        Self {
            theme: config.theme,
            layout: config.layout,
            render: config.render,
            focus: None,
        }
    }

    fn config(&self) -> Config {
        Config {
            theme: self.theme.clone(),
            layout: self.layout.clone(),
            render: self.render.clone(),
        }
    }
}

/// Renders the committed (post-zoom) state of a chart to SVG.
pub fn render_with_options(input: &str, options: RenderOptions) -> Result<String, Error> {
    let mut chart = Chart::from_json_str(input, &options.config())?;
    if let Some(path) = options.focus.as_deref() {
        chart.zoom_to_path(path)?;
        chart.finish();
    }
    Ok(chart.render_svg())
}

pub fn render(input: &str) -> Result<String, Error> {
    render_with_options(input, RenderOptions::default())
}
