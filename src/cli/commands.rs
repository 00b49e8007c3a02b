//! CLI commands implementation

use crate::codegen::{self, Artifact};
use crate::config::{Manifest, ManifestError, MANIFEST_FILE};
use crate::model::{self, StateMachine};
use crate::parser::{Builder, DanglingPolicy, ParseError};
use crate::SourceLocation;
use clap::{ArgAction, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Description written by `smgen init`
const EXAMPLE_FILE: &str = "example.xazsm";

const EXAMPLE_DESCRIPTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<stateMachine>
  <title>Door</title>

  <state name="Open" entry="onOpen" initial="true">
    <transition to="Closed" condition="closeRequested()" action="closeDoor"/>
  </state>

  <state name="Closed" entry="onClosed">
    <transition to="Open" condition="openRequested()" action="openDoor"/>
    <transition to="Jammed" condition="motorStalled()"/>
  </state>

  <state name="Jammed" entry="raiseAlarm" during="retryMotor" error="true"/>

  <transition from="Jammed" to="Closed" condition="motorFree()"/>
</stateMachine>
"#;

/// State machine description compiler
#[derive(Parser, Debug)]
#[command(name = "smgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log more detail (repeat for more)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate artifacts from a description
    Generate {
        /// Description file
        input: PathBuf,
        /// Output directory (overrides manifest setting)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Artifacts to generate (diagram, header, source, documentation)
        #[arg(long, value_delimiter = ',')]
        only: Vec<Artifact>,
        /// Name of the generated files (defaults to the formatted title)
        #[arg(long)]
        base_name: Option<String>,
        /// Handling of undeclared transition endpoints
        #[arg(long)]
        dangling: Option<DanglingPolicy>,
        /// Manifest to use instead of searching for smgen.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a description for problems
    Check {
        /// Description file
        input: PathBuf,
        /// Handling of undeclared transition endpoints
        #[arg(long)]
        dangling: Option<DanglingPolicy>,
        /// Manifest to use instead of searching for smgen.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a manifest and an example description
    Init {
        /// Directory to initialize
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

/// Run the CLI with the given arguments
///
/// # Errors
///
/// Returns an error if the command fails.
pub fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Generate {
            input,
            output,
            only,
            base_name,
            dangling,
            config,
        } => {
            let (mut manifest, root) = load_manifest(&input, config.as_deref())?;
            if let Some(policy) = dangling {
                manifest.parse.dangling = policy;
            }
            if !only.is_empty() {
                manifest.output.select(&only);
            }
            let output_dir = output.unwrap_or_else(|| root.join(&manifest.output.dir));

            cmd_generate(&input, &manifest, &output_dir, base_name.as_deref())
        }
        Commands::Check {
            input,
            dangling,
            config,
        } => {
            let (manifest, _) = load_manifest(&input, config.as_deref())?;
            cmd_check(&input, dangling.unwrap_or(manifest.parse.dangling))
        }
        Commands::Init { dir } => cmd_init(&dir),
    }
}

fn cmd_generate(
    input: &Path,
    manifest: &Manifest,
    output_dir: &Path,
    base_name: Option<&str>,
) -> Result<(), CliError> {
    let machine = load_machine(input, manifest.parse.dangling)?;

    for gap in model::check(&machine) {
        warn!("{}: {gap}", input.display());
    }

    let base_name =
        base_name.map_or_else(|| codegen::base_name(&machine, Some(input)), codegen::file_stem);

    fs::create_dir_all(output_dir).map_err(|e| CliError::Io {
        path: output_dir.to_path_buf(),
        source: e,
    })?;

    println!("Generating {base_name} from {}...", input.display());

    let generators = manifest.generators();
    let results = codegen::write_artifacts(&machine, &generators, output_dir, &base_name);

    let mut generated = 0;
    let mut failed = 0;
    for result in results {
        match result {
            Ok(path) => {
                generated += 1;
                println!("  Generated: {}", path.display());
            }
            Err(e) => {
                failed += 1;
                eprintln!("  Failed: {e}");
            }
        }
    }

    println!("\n{generated} file(s) generated");

    if failed > 0 {
        return Err(CliError::GenerationFailed(failed));
    }
    Ok(())
}

fn cmd_check(input: &Path, policy: DanglingPolicy) -> Result<(), CliError> {
    let machine = load_machine(input, policy)?;

    println!("Checking {}...", input.display());
    println!("  {} state(s)", machine.state_count());
    println!("  {} transition(s)", machine.transitions().len());

    let gaps = model::check(&machine);
    if gaps.is_empty() {
        println!("\nNo problems found.");
    } else {
        println!("\nFound {} problem(s):\n", gaps.len());
        for gap in &gaps {
            println!("  - {gap}");
        }
    }

    Ok(())
}

fn cmd_init(dir: &Path) -> Result<(), CliError> {
    if dir.exists() {
        let is_empty = dir
            .read_dir()
            .map(|mut d| d.next().is_none())
            .unwrap_or(false);

        if !is_empty {
            return Err(CliError::DirectoryNotEmpty(dir.to_path_buf()));
        }
    }

    fs::create_dir_all(dir).map_err(|e| CliError::Io {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let manifest_path = dir.join(MANIFEST_FILE);
    Manifest::default().save(&manifest_path)?;

    let example_path = dir.join(EXAMPLE_FILE);
    fs::write(&example_path, EXAMPLE_DESCRIPTION).map_err(|e| CliError::Io {
        path: example_path.clone(),
        source: e,
    })?;

    println!("Initialized smgen in {}", dir.display());
    println!("  {}", manifest_path.display());
    println!("  {}", example_path.display());
    println!("\nTo get started:");
    println!("  smgen generate {}", example_path.display());

    Ok(())
}

/// Load the manifest for an input file.
///
/// Returns the manifest and the directory its relative paths resolve
/// against. Without a manifest, defaults apply relative to the input's
/// directory, so artifacts land next to the description.
fn load_manifest(input: &Path, config: Option<&Path>) -> Result<(Manifest, PathBuf), CliError> {
    let path = match config {
        Some(path) => path.to_path_buf(),
        None => {
            let start = input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            match Manifest::find(start) {
                Ok(path) => path,
                Err(ManifestError::NotFound { .. }) => {
                    debug!("no manifest found, using defaults");
                    return Ok((Manifest::default(), start.to_path_buf()));
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    debug!(path = %path.display(), "loading manifest");
    let manifest = Manifest::load(&path)?;
    let root = path
        .parent()
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((manifest, root))
}

fn load_machine(input: &Path, policy: DanglingPolicy) -> Result<StateMachine, CliError> {
    let source = fs::read_to_string(input).map_err(|e| CliError::Io {
        path: input.to_path_buf(),
        source: e,
    })?;

    debug!(input = %input.display(), %policy, "parsing description");
    Builder::new()
        .with_policy(policy)
        .parse_str(&source)
        .map_err(|e| CliError::Parse {
            path: input.to_path_buf(),
            location: SourceLocation::from_offset(&source, e.span().start),
            source: e,
        })
}

/// CLI errors
#[derive(Debug, Error)]
pub enum CliError {
    /// IO error
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        /// Path that caused the error
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
    /// Manifest error
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    /// Description could not be parsed
    #[error("{}:{location}: {source}", .path.display())]
    Parse {
        /// Description file
        path: PathBuf,
        /// Where the problem starts
        location: SourceLocation,
        /// Underlying parse error
        source: ParseError,
    },
    /// Some artifacts could not be written
    #[error("{0} artifact(s) could not be written")]
    GenerationFailed(usize),
    /// Directory not empty
    #[error("directory {} is not empty", .0.display())]
    DirectoryNotEmpty(PathBuf),
}
