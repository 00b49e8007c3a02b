//! Description builder
//!
//! This module turns an XML state machine description into a
//! [`StateMachine`] in a single streaming pass:
//!
//! ```xml
//! <stateMachine title="Door">
//!   <state name="Open" entry="onOpen" initial="true">
//!     <transition to="Closed" condition="locked" action="lockDoor"/>
//!   </state>
//!   <state name="Closed" error="yes"/>
//!   <transition from="Closed" to="Open" condition="!locked"/>
//! </stateMachine>
//! ```
//!
//! A state may be declared several times; each declaration is folded into
//! the first through [`StateMachine::add_state`]. Nested transitions take
//! their source from the enclosing state. Once the document is read, the
//! configured [`DanglingPolicy`] decides what happens to transitions whose
//! endpoints were never declared.

mod error;

pub use error::{ParseError, ParseResult};

use crate::model::{dangling_endpoints, State, StateMachine, Transition, ValidationGap};
use crate::Span;
use indexmap::IndexMap;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::io::BufRead;
use std::str::FromStr;
use tracing::{debug, warn};

const ROOT: &str = "stateMachine";
const TITLE: &str = "title";
const STATE: &str = "state";
const TRANSITION: &str = "transition";

/// What to do with transition endpoints that name undeclared states
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DanglingPolicy {
    /// Keep them silently
    Accept,
    /// Keep them and log a warning for each
    #[default]
    Warn,
    /// Declare a bare state for each undeclared name
    Declare,
    /// Fail the parse
    Reject,
}

impl DanglingPolicy {
    /// All policies, in documentation order
    pub const ALL: [DanglingPolicy; 4] = [
        DanglingPolicy::Accept,
        DanglingPolicy::Warn,
        DanglingPolicy::Declare,
        DanglingPolicy::Reject,
    ];

    /// Lower-case policy name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            DanglingPolicy::Accept => "accept",
            DanglingPolicy::Warn => "warn",
            DanglingPolicy::Declare => "declare",
            DanglingPolicy::Reject => "reject",
        }
    }
}

impl fmt::Display for DanglingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DanglingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown policy `{s}`, expected accept, warn, declare or reject"))
    }
}

/// Parse a description held in memory with the default policy
///
/// # Errors
///
/// Returns an error if the document is malformed or structurally invalid.
pub fn parse(source: &str) -> ParseResult<StateMachine> {
    Builder::new().parse_str(source)
}

/// Builds a [`StateMachine`] from an XML description
#[derive(Debug, Default)]
pub struct Builder {
    policy: DanglingPolicy,
    machine: StateMachine,
    stack: Vec<Frame>,
    seen_root: bool,
    transition_spans: Vec<Span>,
}

/// An open element
#[derive(Debug)]
enum Frame {
    Root,
    Title(String),
    State(SmolStr),
    Transition,
}

impl Frame {
    const fn tag(&self) -> &'static str {
        match self {
            Frame::Root => ROOT,
            Frame::Title(_) => TITLE,
            Frame::State(_) => STATE,
            Frame::Transition => TRANSITION,
        }
    }
}

impl Builder {
    /// Create a builder using the default dangling-endpoint policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given dangling-endpoint policy
    #[must_use]
    pub const fn with_policy(mut self, policy: DanglingPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Parse a description held in memory
    ///
    /// # Errors
    ///
    /// Returns an error if the document is malformed or structurally invalid.
    pub fn parse_str(self, source: &str) -> ParseResult<StateMachine> {
        self.parse_reader(source.as_bytes())
    }

    /// Parse a description from any buffered reader
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the document is malformed or
    /// structurally invalid. The partially built machine is discarded.
    pub fn parse_reader<R: BufRead>(mut self, input: R) -> ParseResult<StateMachine> {
        let mut reader = Reader::from_reader(input);
        let mut buf = Vec::new();

        loop {
            let start = offset(reader.buffer_position());
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| ParseError::xml(&e, Span::point(offset(reader.error_position()))))?;
            let span = Span::new(start, offset(reader.buffer_position()));

            match event {
                Event::Start(element) => self.open(&element, span)?,
                Event::Empty(element) => {
                    self.open(&element, span)?;
                    self.close(span)?;
                }
                Event::End(_) => self.close(span)?,
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| ParseError::xml(&e, span))?;
                    self.text(&text, span)?;
                }
                Event::CData(data) => {
                    let text = std::str::from_utf8(&data).map_err(|e| ParseError::xml(&e, span))?;
                    self.text(text, span)?;
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        self.finish(Span::point(offset(reader.buffer_position())))
    }

    fn open(&mut self, element: &BytesStart<'_>, span: Span) -> ParseResult<()> {
        let tag = String::from_utf8_lossy(element.name().as_ref()).into_owned();

        let frame = match (self.stack.last(), tag.as_str()) {
            (None, _) if self.seen_root => return Err(ParseError::TrailingContent { span }),
            (None, ROOT) => {
                self.seen_root = true;
                let mut attrs = Attributes::read(element, ROOT, &["title"], span)?;
                if let Some(title) = attrs.take("title") {
                    self.machine.set_title(title.trim());
                }
                Frame::Root
            }
            (Some(Frame::Root), TITLE) => {
                Attributes::read(element, TITLE, &[], span)?;
                Frame::Title(String::new())
            }
            (Some(Frame::Root), STATE) => {
                let state = read_state(element, span)?;
                let name = state.name.clone();
                debug!(state = %name, "state declared");
                self.machine.add_state(state);
                Frame::State(name)
            }
            (Some(Frame::Root), TRANSITION) => {
                let transition = read_transition(element, None, span)?;
                self.transition_spans.push(span);
                self.machine.add_transition(transition);
                Frame::Transition
            }
            (Some(Frame::State(owner)), TRANSITION) => {
                let transition = read_transition(element, Some(owner), span)?;
                self.transition_spans.push(span);
                self.machine.add_transition(transition);
                Frame::Transition
            }
            (parent, _) => {
                return Err(ParseError::UnexpectedElement {
                    element: tag.clone(),
                    parent: parent.map_or("document", Frame::tag).to_string(),
                    span,
                })
            }
        };

        self.stack.push(frame);
        Ok(())
    }

    fn close(&mut self, span: Span) -> ParseResult<()> {
        match self.stack.pop() {
            Some(Frame::Title(text)) => {
                self.machine.set_title(text.trim());
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(ParseError::TrailingContent { span }),
        }
    }

    fn text(&mut self, text: &str, span: Span) -> ParseResult<()> {
        match self.stack.last_mut() {
            Some(Frame::Title(title)) => {
                title.push_str(text);
                Ok(())
            }
            _ if text.trim().is_empty() => Ok(()),
            None if self.seen_root => Err(ParseError::TrailingContent { span }),
            _ => Err(ParseError::unexpected_text(text.trim(), span)),
        }
    }

    fn finish(mut self, span: Span) -> ParseResult<StateMachine> {
        if let Some(open) = self.stack.last() {
            return Err(ParseError::UnclosedElement {
                element: open.tag(),
                span,
            });
        }
        if !self.seen_root {
            return Err(ParseError::MissingRoot { span });
        }

        self.apply_policy()?;
        debug!(
            states = self.machine.state_count(),
            transitions = self.machine.transitions().len(),
            "description parsed"
        );
        Ok(self.machine)
    }

    fn apply_policy(&mut self) -> ParseResult<()> {
        let gaps = dangling_endpoints(&self.machine);

        for gap in gaps {
            let ValidationGap::DanglingEndpoint {
                index,
                endpoint,
                name,
            } = gap
            else {
                continue;
            };

            match self.policy {
                DanglingPolicy::Accept => {}
                DanglingPolicy::Warn => {
                    warn!(transition = index + 1, %endpoint, state = %name, "undeclared state");
                }
                DanglingPolicy::Declare => {
                    debug!(state = %name, "declaring undeclared state");
                    self.machine.add_state(State::new(name));
                }
                DanglingPolicy::Reject => {
                    return Err(ParseError::DanglingEndpoint {
                        endpoint: endpoint.to_string(),
                        name: name.to_string(),
                        span: self.transition_spans.get(index).copied().unwrap_or_default(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn read_state(element: &BytesStart<'_>, span: Span) -> ParseResult<State> {
    let mut attrs = Attributes::read(
        element,
        STATE,
        &["name", "entry", "during", "initial", "error"],
        span,
    )?;

    Ok(State {
        name: attrs.required("name")?.into(),
        entry: attrs.optional("entry").into(),
        during: attrs.optional("during").into(),
        is_initial: attrs.flag("initial")?,
        is_error: attrs.flag("error")?,
    })
}

fn read_transition(
    element: &BytesStart<'_>,
    owner: Option<&SmolStr>,
    span: Span,
) -> ParseResult<Transition> {
    let mut attrs = Attributes::read(
        element,
        TRANSITION,
        &["from", "to", "condition", "action"],
        span,
    )?;

    let from = match owner {
        Some(owner) => match attrs.take("from") {
            Some(declared) if declared.trim() != owner.as_str() => {
                return Err(ParseError::MismatchedSource {
                    declared,
                    enclosing: owner.to_string(),
                    span,
                })
            }
            _ => owner.clone(),
        },
        None => attrs.required("from")?.into(),
    };

    Ok(Transition {
        from,
        to: attrs.required("to")?.into(),
        condition: attrs.optional("condition"),
        action: attrs.optional("action").into(),
    })
}

/// Unescaped attribute values of one start tag
struct Attributes {
    values: IndexMap<&'static str, String>,
    element: &'static str,
    span: Span,
}

impl Attributes {
    fn read(
        start: &BytesStart<'_>,
        element: &'static str,
        allowed: &[&'static str],
        span: Span,
    ) -> ParseResult<Self> {
        let mut values = IndexMap::new();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| ParseError::xml(&e, span))?;
            let key = attr.key.as_ref();
            let Some(&name) = allowed.iter().find(|name| name.as_bytes() == key) else {
                return Err(ParseError::UnexpectedAttribute {
                    attribute: String::from_utf8_lossy(key).into_owned(),
                    element,
                    span,
                });
            };
            let value = attr.unescape_value().map_err(|e| ParseError::xml(&e, span))?;
            values.insert(name, value.into_owned());
        }

        Ok(Self {
            values,
            element,
            span,
        })
    }

    fn take(&mut self, name: &str) -> Option<String> {
        self.values.shift_remove(name)
    }

    fn optional(&mut self, name: &str) -> String {
        self.take(name)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }

    fn required(&mut self, name: &'static str) -> ParseResult<String> {
        let value = self.optional(name);
        if value.is_empty() {
            return Err(ParseError::MissingAttribute {
                attribute: name,
                element: self.element,
                span: self.span,
            });
        }
        Ok(value)
    }

    fn flag(&mut self, name: &'static str) -> ParseResult<bool> {
        let value = self.optional(name);
        match value.to_ascii_lowercase().as_str() {
            "" | "false" | "no" | "0" => Ok(false),
            "true" | "yes" | "1" => Ok(true),
            _ => Err(ParseError::InvalidBoolean {
                attribute: name,
                value,
                span: self.span,
            }),
        }
    }
}

fn offset(position: u64) -> usize {
    usize::try_from(position).unwrap_or(usize::MAX)
}
