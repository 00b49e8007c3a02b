//! Parser error types

#![allow(unused_assignments)] // Fields used by thiserror Display derive

use crate::Span;
use miette::Diagnostic;
use thiserror::Error;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// A description that could not be turned into a state machine
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum ParseError {
    /// The markup itself is malformed
    #[error("malformed XML: {message}")]
    Xml {
        /// Reader error message
        message: String,
        /// Location of the error
        #[label("here")]
        span: Span,
    },

    /// No root element at all
    #[error("document has no <stateMachine> root element")]
    MissingRoot {
        /// End of the document
        #[label("end of input")]
        span: Span,
    },

    /// An element that is not allowed where it appears
    #[error("unexpected element <{element}> inside {parent}")]
    UnexpectedElement {
        /// Element name
        element: String,
        /// Enclosing element, or `document` at the top level
        parent: String,
        /// Location of the start tag
        #[label("not allowed here")]
        span: Span,
    },

    /// An attribute the element does not support
    #[error("unexpected attribute `{attribute}` on <{element}>")]
    UnexpectedAttribute {
        /// Attribute name
        attribute: String,
        /// Element name
        element: &'static str,
        /// Location of the start tag
        #[label("unknown attribute")]
        span: Span,
    },

    /// A required attribute is absent or blank
    #[error("<{element}> requires a non-empty `{attribute}` attribute")]
    MissingAttribute {
        /// Attribute name
        attribute: &'static str,
        /// Element name
        element: &'static str,
        /// Location of the start tag
        #[label("missing `{attribute}`")]
        span: Span,
    },

    /// A flag attribute with a value that is not a boolean
    #[error("invalid boolean `{value}` for `{attribute}`, expected true/false, yes/no or 1/0")]
    InvalidBoolean {
        /// Attribute name
        attribute: &'static str,
        /// Value found
        value: String,
        /// Location of the start tag
        #[label("not a boolean")]
        span: Span,
    },

    /// A nested transition whose `from` disagrees with its enclosing state
    #[error("transition inside state `{enclosing}` declares from=\"{declared}\"")]
    MismatchedSource {
        /// Value of the `from` attribute
        declared: String,
        /// Name of the enclosing state
        enclosing: String,
        /// Location of the start tag
        #[label("conflicting source")]
        span: Span,
    },

    /// Character data outside a <title>
    #[error("unexpected text `{text}`")]
    UnexpectedText {
        /// The text, shortened
        text: String,
        /// Location of the text
        #[label("text is only allowed in <title>")]
        span: Span,
    },

    /// Anything after the root element has been closed
    #[error("unexpected content after the root element")]
    TrailingContent {
        /// Location of the content
        #[label("after </stateMachine>")]
        span: Span,
    },

    /// The document ended inside an element
    #[error("unexpected end of input: <{element}> is not closed")]
    UnclosedElement {
        /// Innermost open element
        element: &'static str,
        /// End of the document
        #[label("end of input")]
        span: Span,
    },

    /// A transition endpoint names an undeclared state
    #[error("transition {endpoint} `{name}` is not a declared state")]
    DanglingEndpoint {
        /// `source` or `destination`
        endpoint: String,
        /// The undeclared state name
        name: String,
        /// Location of the transition
        #[label("undeclared state")]
        span: Span,
    },
}

impl ParseError {
    /// Create a malformed-markup error from any reader error
    pub fn xml(error: &impl std::fmt::Display, span: Span) -> Self {
        ParseError::Xml {
            message: error.to_string(),
            span,
        }
    }

    /// Create an unexpected text error, shortening long text
    pub fn unexpected_text(text: &str, span: Span) -> Self {
        const MAX: usize = 32;
        let text = match text.char_indices().nth(MAX) {
            Some((cut, _)) => format!("{}...", &text[..cut]),
            None => text.to_string(),
        };
        ParseError::UnexpectedText { text, span }
    }

    /// Get the span of the error
    #[must_use]
    pub const fn span(&self) -> Span {
        match self {
            ParseError::Xml { span, .. }
            | ParseError::MissingRoot { span }
            | ParseError::UnexpectedElement { span, .. }
            | ParseError::UnexpectedAttribute { span, .. }
            | ParseError::MissingAttribute { span, .. }
            | ParseError::InvalidBoolean { span, .. }
            | ParseError::MismatchedSource { span, .. }
            | ParseError::UnexpectedText { span, .. }
            | ParseError::TrailingContent { span }
            | ParseError::UnclosedElement { span, .. }
            | ParseError::DanglingEndpoint { span, .. } => *span,
        }
    }
}
