use clap::{Parser, Subcommand};

use crate::error::Result;
use crate::layout::{LayoutArgs, run_layout};
use crate::replay::{ReplayArgs, run_replay};

#[derive(Debug, Parser)]
#[command(
    name = "drift-harness",
    about = "Compute collage layouts from image files and replay viewer sessions",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Measure images and print the collage layout as JSON.
    Layout(LayoutArgs),

    /// Replay a JSONL host event script and print each frame output.
    Replay(ReplayArgs),
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Layout(args) => run_layout(&args),
        Commands::Replay(args) => run_replay(&args),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{Cli, Commands, run};
    use crate::error::HarnessError;
    use crate::layout::StrategyArg;
    use crate::replay::ReplayArgs;

    #[test]
    fn layout_arguments_parse() {
        let cli = Cli::try_parse_from([
            "drift-harness",
            "layout",
            "--width",
            "1280",
            "--height",
            "800",
            "--strategy",
            "scatter",
            "--repeat",
            "3",
            "a.png",
            "b.png",
        ])
        .expect("parses");
        let Commands::Layout(args) = cli.command else {
            panic!("expected layout command");
        };
        assert_eq!(args.width, 1280.0);
        assert_eq!(args.strategy, Some(StrategyArg::Scatter));
        assert_eq!(args.repeat, 3);
        assert_eq!(args.files, vec!["a.png".to_owned(), "b.png".to_owned()]);
    }

    #[test]
    fn layout_requires_files() {
        let result =
            Cli::try_parse_from(["drift-harness", "layout", "--width", "1", "--height", "1"]);
        assert!(result.is_err());
    }

    #[test]
    fn replay_command_dispatches_missing_path_error() {
        let result = run(Cli {
            command: Commands::Replay(ReplayArgs {
                script: PathBuf::from("/definitely/not/here.jsonl"),
                config: None,
            }),
        });
        let error = result.expect_err("missing script should fail");
        assert!(matches!(error, HarnessError::MissingPath { .. }));
        assert_eq!(error.exit_code(), 2);
    }
}
