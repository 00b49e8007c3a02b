//! Artifact generators
//!
//! Every backend reads a finished [`StateMachine`] and produces one text
//! artifact:
//!
//! - `DotGenerator`: Graphviz diagram (`.dot`)
//! - `HeaderGenerator` / `SourceGenerator`: C declaration and definition
//!   files (`.h` / `.c`)
//! - `DocGenerator`: plain-text report (`.txt`)
//!
//! Backends share nothing but the model, which they only read, so
//! [`write_artifacts`] runs them side by side and reports each result on
//! its own.

mod c;
mod doc;
mod dot;

pub use c::{HeaderGenerator, SourceGenerator};
pub use doc::DocGenerator;
pub use dot::{DiagramStyle, DotGenerator};

use crate::model::StateMachine;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::thread;
use thiserror::Error;
use tracing::debug;

/// Name used when neither a title nor an input file name is available
pub const DEFAULT_NAME: &str = "state_machine";

/// Kind of artifact a generator produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Artifact {
    /// Graphviz diagram
    Diagram,
    /// C header
    Header,
    /// C source
    Source,
    /// Plain-text documentation
    Documentation,
}

impl Artifact {
    /// All artifacts, in generation order
    pub const ALL: [Artifact; 4] = [
        Artifact::Diagram,
        Artifact::Header,
        Artifact::Source,
        Artifact::Documentation,
    ];

    /// Lower-case artifact name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Artifact::Diagram => "diagram",
            Artifact::Header => "header",
            Artifact::Source => "source",
            Artifact::Documentation => "documentation",
        }
    }

    /// File extension, without the dot
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Artifact::Diagram => "dot",
            Artifact::Header => "h",
            Artifact::Source => "c",
            Artifact::Documentation => "txt",
        }
    }

    /// Output file name for a base name
    #[must_use]
    pub fn file_name(self, base_name: &str) -> String {
        format!("{base_name}.{}", self.extension())
    }

    /// Generator for this artifact with default settings
    #[must_use]
    pub fn generator(self) -> Box<dyn Generator> {
        match self {
            Artifact::Diagram => Box::new(DotGenerator::default()),
            Artifact::Header => Box::new(HeaderGenerator),
            Artifact::Source => Box::new(SourceGenerator),
            Artifact::Documentation => Box::new(DocGenerator),
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Artifact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s) || a.extension().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown artifact `{s}`, expected diagram, header, source or documentation")
            })
    }
}

/// An artifact could not be written
#[derive(Debug, Error)]
#[error("cannot write {artifact} to {target}: {source}")]
pub struct SinkError {
    /// Artifact being written
    pub artifact: Artifact,
    /// Description of the sink (usually a file path)
    pub target: String,
    /// Underlying I/O error
    pub source: io::Error,
}

/// A backend that renders a state machine as text
pub trait Generator: Send + Sync {
    /// Artifact this generator produces
    fn artifact(&self) -> Artifact;

    /// Render the artifact.
    ///
    /// `base_name` is the name the artifacts are saved under; generators use
    /// it for cross references and as a fallback identifier.
    fn generate(&self, machine: &StateMachine, base_name: &str) -> String;

    /// Render the artifact into a sink
    ///
    /// # Errors
    ///
    /// Returns an error if the sink cannot be written or flushed.
    fn write_to(
        &self,
        machine: &StateMachine,
        base_name: &str,
        sink: &mut dyn Write,
    ) -> Result<(), SinkError> {
        emit(&self.generate(machine, base_name), sink).map_err(|source| SinkError {
            artifact: self.artifact(),
            target: "output stream".to_string(),
            source,
        })
    }
}

/// Base name for a machine's artifacts.
///
/// The formatted title wins; otherwise the input file name up to its first
/// `.` is used, falling back to [`DEFAULT_NAME`]. The result is passed
/// through [`file_stem`].
#[must_use]
pub fn base_name(machine: &StateMachine, input: Option<&Path>) -> String {
    if !machine.formatted_title().is_empty() {
        return file_stem(machine.formatted_title());
    }

    let stem = input
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .and_then(|name| name.split('.').next())
        .filter(|stem| !stem.is_empty())
        .unwrap_or(DEFAULT_NAME);
    file_stem(stem)
}

/// Make `name` usable as a single file name and inside a quoted `#include`.
///
/// Path separators, quotes, angle brackets and control characters become
/// `_`. An empty result falls back to [`DEFAULT_NAME`].
#[must_use]
pub fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' | '<' | '>' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match stem.as_str() {
        "" | "." | ".." => DEFAULT_NAME.to_string(),
        _ => stem,
    }
}

/// Write one artifact to `<dir>/<base_name>.<ext>`
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_file(
    generator: &dyn Generator,
    machine: &StateMachine,
    dir: &Path,
    base_name: &str,
) -> Result<PathBuf, SinkError> {
    let artifact = generator.artifact();
    let path = dir.join(artifact.file_name(base_name));
    let sink_error = |source| SinkError {
        artifact,
        target: path.display().to_string(),
        source,
    };

    let file = File::create(&path).map_err(sink_error)?;
    let mut sink = BufWriter::new(file);
    emit(&generator.generate(machine, base_name), &mut sink).map_err(sink_error)?;

    debug!(%artifact, path = %path.display(), "artifact written");
    Ok(path)
}

/// Write several artifacts concurrently.
///
/// Returns one result per generator, in the order given. A failing
/// generator never stops the others.
#[must_use]
pub fn write_artifacts(
    machine: &StateMachine,
    generators: &[Box<dyn Generator>],
    dir: &Path,
    base_name: &str,
) -> Vec<Result<PathBuf, SinkError>> {
    thread::scope(|scope| {
        let handles: Vec<_> = generators
            .iter()
            .map(|generator| {
                let artifact = generator.artifact();
                let handle =
                    scope.spawn(move || write_file(generator.as_ref(), machine, dir, base_name));
                (artifact, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(artifact, handle)| {
                handle.join().unwrap_or_else(|_| {
                    Err(SinkError {
                        artifact,
                        target: dir.join(artifact.file_name(base_name)).display().to_string(),
                        source: io::Error::other("generator panicked"),
                    })
                })
            })
            .collect()
    })
}

fn emit(text: &str, sink: &mut dyn Write) -> io::Result<()> {
    sink.write_all(text.as_bytes())?;
    sink.flush()
}
