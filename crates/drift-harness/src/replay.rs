use std::io::Write;
use std::path::PathBuf;

use clap::Args;
use drift_web::{FrameOutput, WebHost};

use crate::error::{HarnessError, Result};
use crate::load_config;

#[derive(Debug, Clone, Args)]
pub struct ReplayArgs {
    /// JSONL file with one encoded host event per line.
    #[arg(long)]
    pub script: PathBuf,

    /// Viewer config file (`.json` or TOML).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub fn run_replay(args: &ReplayArgs) -> Result<()> {
    let outputs = replay_outputs(args)?;
    let mut stdout = std::io::stdout().lock();
    for output in &outputs {
        writeln!(stdout, "{}", output.to_json_string()?)?;
    }
    Ok(())
}

/// Replay the script and collect the frame outputs.
pub fn replay_outputs(args: &ReplayArgs) -> Result<Vec<FrameOutput>> {
    if !args.script.is_file() {
        return Err(HarnessError::MissingPath {
            path: args.script.clone(),
        });
    }
    let config = load_config(args.config.as_deref())?;
    let script = std::fs::read_to_string(&args.script)?;
    let mut host = WebHost::new(config)?;
    let outputs = host.replay_jsonl(&script)?;
    tracing::debug!(
        target: "drift.harness",
        frames = outputs.len(),
        script = %args.script.display(),
        "replay finished"
    );
    Ok(outputs)
}
