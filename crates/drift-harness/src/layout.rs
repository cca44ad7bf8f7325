use std::io::Write;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use drift_core::Size;
use drift_layout::{CollageLayout, ImageMetrics, LayoutStrategy, compute_layout, subject_seed};
use drift_runtime::{FsImageLoader, MetricsProber, ProbeProgress};

use crate::error::{HarnessError, Result};
use crate::load_config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Masonry,
    Scatter,
}

impl From<StrategyArg> for LayoutStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Masonry => Self::Masonry,
            StrategyArg::Scatter => Self::Scatter,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct LayoutArgs {
    /// Viewport width in CSS pixels.
    #[arg(long)]
    pub width: f64,

    /// Viewport height in CSS pixels.
    #[arg(long)]
    pub height: f64,

    /// Viewer config file (`.json` or TOML).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the configured strategy.
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Scatter seed; defaults to the hash of `--subject`.
    #[arg(long)]
    pub seed: Option<u32>,

    #[arg(long, default_value = "harness")]
    pub subject: String,

    /// Directory image paths are resolved against.
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Compute the layout this many times and fail if any run differs.
    #[arg(long, default_value_t = 1)]
    pub repeat: usize,

    /// Pretty-print the JSON output.
    #[arg(long)]
    pub pretty: bool,

    /// Image files, in collage order.
    #[arg(required = true)]
    pub files: Vec<String>,
}

pub fn run_layout(args: &LayoutArgs) -> Result<()> {
    let layout = layout_for(args)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&layout)?
    } else {
        serde_json::to_string(&layout)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

/// Measure the files and compute the layout `args` describes.
pub fn layout_for(args: &LayoutArgs) -> Result<CollageLayout> {
    if args.repeat == 0 {
        return Err(HarnessError::invalid("--repeat must be at least 1"));
    }
    if !args.root.is_dir() {
        return Err(HarnessError::MissingPath {
            path: args.root.clone(),
        });
    }
    let mut config = load_config(args.config.as_deref())?.layout;
    if let Some(strategy) = args.strategy {
        config.strategy = strategy.into();
    }
    let viewport = Size::new(args.width, args.height);
    let seed = args.seed.unwrap_or_else(|| subject_seed(&args.subject));
    let metrics = probe_files(args)?;

    let layout = compute_layout(viewport, &metrics, &config, seed).ok_or_else(|| {
        HarnessError::invalid(format!(
            "viewport {}x{} cannot hold a layout",
            args.width, args.height
        ))
    })?;

    let reference = serde_json::to_vec(&layout)?;
    for run in 2..=args.repeat {
        let again = compute_layout(viewport, &metrics, &config, seed)
            .ok_or(HarnessError::Nondeterministic { run })?;
        if serde_json::to_vec(&again)? != reference {
            tracing::warn!(target: "drift.harness", run, "layout differs between runs");
            return Err(HarnessError::Nondeterministic { run });
        }
    }
    tracing::debug!(
        target: "drift.harness",
        items = layout.items.len(),
        runs = args.repeat,
        "layout verified"
    );
    Ok(layout)
}

fn probe_files(args: &LayoutArgs) -> Result<Vec<ImageMetrics>> {
    let mut loader = FsImageLoader::new(&args.root);
    let mut prober = MetricsProber::new();
    let mut progress = prober.begin(&args.files, &mut loader);
    for completion in loader.drain_completions() {
        progress = prober.complete(completion);
    }
    match progress {
        ProbeProgress::Resolved(metrics) => Ok(metrics),
        other => Err(HarnessError::invalid(format!(
            "image probe did not finish: {other:?}"
        ))),
    }
}
