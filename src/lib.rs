//! smgen: state machine description compiler
//!
//! smgen reads a declarative description of a finite state machine written
//! in XML and derives several artifacts from it:
//!
//! - **Diagram**: a Graphviz DOT graph of states and guarded transitions
//! - **Header / Source**: a C declaration/definition pair implementing a
//!   first-match-wins dispatch function
//! - **Documentation**: a plain-text report of states and transitions
//!
//! # Example
//!
//! ```
//! use smgen::codegen::{Artifact, Generator};
//!
//! let machine = smgen::parser::parse(r#"
//!     <stateMachine title="Door">
//!         <state name="Open" initial="true"/>
//!         <state name="Closed" error="true"/>
//!         <transition from="Open" to="Closed" condition="locked" action="lockDoor"/>
//!     </stateMachine>
//! "#).unwrap();
//!
//! let header = Artifact::Header.generator().generate(&machine, "door");
//! assert!(header.contains("door_Open"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod codegen;
pub mod config;
pub mod model;
pub mod parser;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create an empty span at `offset`
    #[must_use]
    pub const fn point(offset: usize) -> Self {
        Self::new(offset, offset)
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.end.saturating_sub(span.start)).into()
    }
}

/// A human-readable source location (1-indexed line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Compute the line and column for a byte offset in source text
    #[must_use]
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let mut line = 1;
        let mut column = 1;

        for (i, ch) in source.char_indices() {
            if i >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        Self { line, column }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
