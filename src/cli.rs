use crate::chart::Chart;
use crate::config::load_config;
use crate::hierarchy::Hierarchy;
use crate::layout_dump::write_layout_dump;
use crate::render::{write_output_png, write_output_svg};
use crate::theme::Theme;
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "sunburst", version, about = "Zoomable sunburst chart renderer")]
pub struct Args {
    /// Input file (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file (svg/png). Defaults to stdout for SVG if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, themeVariables, sunburst)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Color theme, overrides the config file
    #[arg(short = 't', long = "theme", value_enum)]
    pub theme: Option<ThemeName>,

    /// Chart width (and height) in pixels
    #[arg(short = 'w', long = "width")]
    pub width: Option<f64>,

    /// Slash-separated path of the node to zoom into, e.g. "A/A1"
    #[arg(short = 'f', long = "focus")]
    pub focus: Option<String>,

    /// Write this many frames of the zoom transition instead of the final state
    #[arg(long = "frames", default_value_t = 0)]
    pub frames: usize,

    /// Write a JSON dump of every node's intervals
    #[arg(long = "dumpLayout")]
    pub dump_layout: Option<PathBuf>,

    /// Debug verbosity, repeat for more (-d -d -d)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count)]
    pub debug: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeName {
    Light,
    Dark,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.debug);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(theme) = args.theme {
        config.theme = match theme {
            ThemeName::Light => Theme::light(),
            ThemeName::Dark => Theme::dark(),
        };
    }
    if let Some(width) = args.width {
        config.render.width = width.max(1.0);
    }

    let hierarchy = read_hierarchy(args.input.as_deref())?;
    info!(nodes = hierarchy.len(), "loaded hierarchy");
    let mut chart = Chart::new(hierarchy, &config);
    if let Some(focus) = args.focus.as_deref() {
        chart.zoom_to_path(focus)?;
    }

    if let Some(path) = args.dump_layout.as_deref() {
        let mut committed = chart.clone();
        committed.finish();
        write_layout_dump(path, committed.hierarchy(), committed.state())
            .with_context(|| format!("failed to write layout dump {}", path.display()))?;
    }

    if args.frames > 0 {
        if args.focus.is_none() {
            return Err(anyhow::anyhow!("--frames requires --focus"));
        }
        let outputs = resolve_multi_outputs(args.output.as_deref(), args.output_format, args.frames)?;
        for (svg, output) in chart.transition_frames(args.frames).iter().zip(&outputs) {
            debug!(output = %output.display(), "writing frame");
            match args.output_format {
                OutputFormat::Svg => write_output_svg(svg, Some(output))?,
                OutputFormat::Png => write_output_png(svg, output, &config.render, &config.theme)?,
            }
        }
        return Ok(());
    }

    chart.finish();
    let svg = chart.render_svg();
    match args.output_format {
        OutputFormat::Svg => {
            write_output_svg(&svg, args.output.as_deref())?;
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg, &output, &config.render, &config.theme)?;
        }
    }
    Ok(())
}

fn setup_logging(verbosity: u8) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_filter(log_filter(verbosity, rust_log.as_deref()));

    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}

/// `-d` flags win; without them `RUST_LOG` directives apply, falling back to warn.
fn log_filter(verbosity: u8, rust_log: Option<&str>) -> EnvFilter {
    let level = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let builder = EnvFilter::builder().with_default_directive(level.into());
    match rust_log {
        Some(directives) if verbosity == 0 => builder.parse_lossy(directives),
        _ => builder.parse_lossy(""),
    }
}

fn read_hierarchy(path: Option<&Path>) -> Result<Hierarchy> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(Hierarchy::load(path)?);
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Hierarchy::from_json_str(&buf)?)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}

fn resolve_multi_outputs(
    output: Option<&Path>,
    format: OutputFormat,
    count: usize,
) -> Result<Vec<PathBuf>> {
    let ext = match format {
        OutputFormat::Svg => "svg",
        OutputFormat::Png => "png",
    };
    let base = output.ok_or_else(|| anyhow::anyhow!("Output path required for frame output"))?;
    if base.is_dir() {
        return Ok((1..=count)
            .map(|idx| base.join(format!("frame-{idx}.{ext}")))
            .collect());
    }
    let stem = base.file_stem().and_then(|s| s.to_str()).unwrap_or("frame");
    let parent = base.parent().unwrap_or_else(|| Path::new("."));
    Ok((1..=count)
        .map(|idx| parent.join(format!("{stem}-{idx}.{ext}")))
        .collect())
}
