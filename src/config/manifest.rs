//! Project manifest (smgen.toml)

use crate::codegen::{Artifact, DiagramStyle, DotGenerator, Generator};
use crate::parser::DanglingPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name searched for by [`Manifest::find`]
pub const MANIFEST_FILE: &str = "smgen.toml";

/// Project manifest loaded from `smgen.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Builder configuration
    #[serde(default)]
    pub parse: ParseConfig,

    /// Diagram styling
    #[serde(default)]
    pub diagram: DiagramStyle,
}

impl Manifest {
    /// Load a manifest from a file path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Save a manifest to a file path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let content = toml::to_string_pretty(self).map_err(|e| ManifestError::Serialize {
            path: path.to_path_buf(),
            source: e,
        })?;

        std::fs::write(path, content).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Find a manifest by searching upward from `start`
    ///
    /// # Errors
    ///
    /// Returns an error if no manifest is found.
    pub fn find(start: &Path) -> Result<PathBuf, ManifestError> {
        let mut current = start.to_path_buf();

        loop {
            let manifest_path = current.join(MANIFEST_FILE);
            if manifest_path.is_file() {
                return Ok(manifest_path);
            }

            if !current.pop() {
                return Err(ManifestError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Generators for every enabled artifact, in [`Artifact::ALL`] order
    #[must_use]
    pub fn generators(&self) -> Vec<Box<dyn Generator>> {
        self.output
            .artifacts()
            .into_iter()
            .map(|artifact| match artifact {
                Artifact::Diagram => {
                    Box::new(DotGenerator::new(self.diagram.clone())) as Box<dyn Generator>
                }
                other => other.generator(),
            })
            .collect()
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory for generated files (relative to the manifest)
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Generate the Graphviz diagram
    #[serde(default = "default_true")]
    pub diagram: bool,
    /// Generate the C header
    #[serde(default = "default_true")]
    pub header: bool,
    /// Generate the C source
    #[serde(default = "default_true")]
    pub source: bool,
    /// Generate the text documentation
    #[serde(default = "default_true")]
    pub documentation: bool,
}

impl OutputConfig {
    /// Whether an artifact is enabled
    #[must_use]
    pub const fn enabled(&self, artifact: Artifact) -> bool {
        match artifact {
            Artifact::Diagram => self.diagram,
            Artifact::Header => self.header,
            Artifact::Source => self.source,
            Artifact::Documentation => self.documentation,
        }
    }

    /// Enable exactly the given artifacts
    pub fn select(&mut self, artifacts: &[Artifact]) {
        self.diagram = artifacts.contains(&Artifact::Diagram);
        self.header = artifacts.contains(&Artifact::Header);
        self.source = artifacts.contains(&Artifact::Source);
        self.documentation = artifacts.contains(&Artifact::Documentation);
    }

    /// Enabled artifacts, in [`Artifact::ALL`] order
    #[must_use]
    pub fn artifacts(&self) -> Vec<Artifact> {
        Artifact::ALL
            .into_iter()
            .filter(|&artifact| self.enabled(artifact))
            .collect()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            diagram: true,
            header: true,
            source: true,
            documentation: true,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

const fn default_true() -> bool {
    true
}

/// Builder configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Handling of transitions that name undeclared states
    #[serde(default)]
    pub dangling: DanglingPolicy,
}

/// Errors that can occur when working with manifests
#[derive(Debug, Error)]
pub enum ManifestError {
    /// IO error reading/writing manifest
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        /// Path that caused the error
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },
    /// Parse error in TOML
    #[error("invalid manifest {}: {source}", .path.display())]
    Parse {
        /// Path that caused the error
        path: PathBuf,
        /// Underlying parse error
        source: toml::de::Error,
    },
    /// Serialization error
    #[error("cannot serialize manifest for {}: {source}", .path.display())]
    Serialize {
        /// Path that caused the error
        path: PathBuf,
        /// Underlying serialization error
        source: toml::ser::Error,
    },
    /// No manifest found
    #[error("no smgen.toml found searching from {}", .searched_from.display())]
    NotFound {
        /// Directory searched from
        searched_from: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_default() {
        let manifest = Manifest::default();

        assert_eq!(manifest.output.dir, PathBuf::from("."));
        assert_eq!(manifest.output.artifacts(), Artifact::ALL);
        assert_eq!(manifest.parse.dangling, DanglingPolicy::Warn);
        assert_eq!(manifest.diagram, DiagramStyle::default());
    }

    #[test]
    fn test_manifest_serialize() {
        let toml = toml::to_string_pretty(&Manifest::default()).unwrap();

        assert!(toml.contains("[output]"));
        assert!(toml.contains("[parse]"));
        assert!(toml.contains("dangling = \"warn\""));
        assert!(toml.contains("[diagram]"));
        assert!(toml.contains("initial_shape = \"doublecircle\""));
    }

    #[test]
    fn test_manifest_deserialize() {
        let toml = r#"
            [output]
            dir = "build/fsm"
            diagram = false
            documentation = false

            [parse]
            dangling = "reject"

            [diagram]
            show_functions = true
            error_fill = "orange"
        "#;

        let manifest: Manifest = toml::from_str(toml).unwrap();

        assert_eq!(manifest.output.dir, PathBuf::from("build/fsm"));
        assert_eq!(
            manifest.output.artifacts(),
            [Artifact::Header, Artifact::Source]
        );
        assert_eq!(manifest.parse.dangling, DanglingPolicy::Reject);
        assert!(manifest.diagram.show_functions);
        assert_eq!(manifest.diagram.error_fill, "orange");
        assert_eq!(manifest.diagram.initial_shape, "doublecircle");
    }

    #[test]
    fn test_manifest_empty_file() {
        let manifest: Manifest = toml::from_str("").unwrap();
        assert_eq!(manifest, Manifest::default());
    }

    #[test]
    fn test_manifest_rejects_unknown_policy() {
        let result: Result<Manifest, _> = toml::from_str("[parse]\ndangling = \"ignore\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_select_artifacts() {
        let mut output = OutputConfig::default();
        output.select(&[Artifact::Documentation, Artifact::Diagram]);

        assert_eq!(
            output.artifacts(),
            [Artifact::Diagram, Artifact::Documentation]
        );
        assert!(!output.enabled(Artifact::Header));
    }

    #[test]
    fn test_generators_follow_selection() {
        let mut manifest = Manifest::default();
        manifest.output.select(&[Artifact::Source, Artifact::Diagram]);

        let artifacts: Vec<_> = manifest.generators().iter().map(|g| g.artifact()).collect();
        assert_eq!(artifacts, [Artifact::Diagram, Artifact::Source]);
    }

    #[test]
    fn test_save_load_and_find() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let mut manifest = Manifest::default();
        manifest.parse.dangling = DanglingPolicy::Declare;
        let path = dir.path().join(MANIFEST_FILE);
        manifest.save(&path).unwrap();

        assert_eq!(Manifest::load(&path).unwrap(), manifest);
        assert_eq!(Manifest::find(&nested).unwrap(), path);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(MANIFEST_FILE);
        assert!(matches!(
            Manifest::load(&missing),
            Err(ManifestError::Io { .. })
        ));

        std::fs::write(&missing, "[output\n").unwrap();
        let err = Manifest::load(&missing).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid manifest"));
    }
}
