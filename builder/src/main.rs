//! Thin CLI bootstrap for the build controller.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use builder::exit_codes;
use builder::io::config::load_config;
use builder::io::gateway::OllamaGateway;
use builder::io::init::bootstrap;
use builder::io::paths::BuilderPaths;
use builder::run::{RunOutcome, run_once};

#[derive(Parser)]
#[command(
    name = "builder",
    version,
    about = "Single-step, file-state-driven incremental build controller"
)]
struct Cli {
    /// State directory holding project.md, rules.json, and progress.json.
    #[arg(long, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the state layout (project.md, rules.json, progress.json,
    /// builder.toml, output/, logs/) if missing.
    Init {
        /// Overwrite existing documents.
        #[arg(short, long)]
        force: bool,
    },
    /// Execute exactly one pipeline invocation.
    Step,
}

fn main() -> ExitCode {
    builder::logging::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(exit_codes::INVALID as u8)
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let paths = BuilderPaths::new(&cli.root);
    match cli.command {
        Command::Init { force } => {
            bootstrap(&paths, force)?;
            println!("initialized {}", paths.root.display());
            Ok(exit_codes::OK)
        }
        Command::Step => {
            let config = load_config(&paths.config_path)?;
            let gateway = OllamaGateway::new(&config);
            match run_once(&paths.root, &gateway)? {
                RunOutcome::Complete => {
                    println!("progress is done; nothing to do");
                    Ok(exit_codes::COMPLETE)
                }
                RunOutcome::Step(report) => {
                    println!("step: {}", report.step);
                    for path in &report.writes_performed {
                        println!(" - {path}");
                    }
                    if report.rejected > 0 {
                        println!("rejected blocks: {}", report.rejected);
                    }
                    println!("next: {}", report.progress.next);
                    Ok(exit_codes::OK)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["builder", "init"]);
        assert!(matches!(cli.command, Command::Init { force: false }));
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["builder", "init", "--force"]);
        assert!(matches!(cli.command, Command::Init { force: true }));
    }

    #[test]
    fn parse_step_with_root() {
        let cli = Cli::parse_from(["builder", "--root", "/tmp/site", "step"]);
        assert!(matches!(cli.command, Command::Step));
        assert_eq!(cli.root, PathBuf::from("/tmp/site"));
    }
}
