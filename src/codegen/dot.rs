//! Graphviz diagram generator
//!
//! Emits one node per state and one labeled edge per transition, both in
//! declaration order, so regenerating an unchanged machine reproduces the
//! file byte for byte.

use super::{Artifact, Generator, DEFAULT_NAME};
use crate::model::{State, StateMachine, Transition};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Visual markers used for special states
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramStyle {
    /// Append entry/during functions to node labels
    pub show_functions: bool,
    /// Shape of ordinary states
    pub default_shape: String,
    /// Shape of the initial state
    pub initial_shape: String,
    /// Fill color of error states
    pub error_fill: String,
    /// Outline color of error states
    pub error_color: String,
}

impl Default for DiagramStyle {
    fn default() -> Self {
        Self {
            show_functions: false,
            default_shape: "ellipse".to_string(),
            initial_shape: "doublecircle".to_string(),
            error_fill: "lightcoral".to_string(),
            error_color: "red".to_string(),
        }
    }
}

/// Graphviz DOT generator
#[derive(Debug, Clone, Default)]
pub struct DotGenerator {
    style: DiagramStyle,
}

impl DotGenerator {
    /// Create a generator with the given style
    #[must_use]
    pub const fn new(style: DiagramStyle) -> Self {
        Self { style }
    }

    fn node_attributes(&self, state: &State) -> Vec<(&'static str, String)> {
        let mut label = state.name.to_string();
        if self.style.show_functions {
            if let Some(entry) = state.entry_fn() {
                write!(label, "\nentry: {entry}").unwrap();
            }
            if let Some(during) = state.during_fn() {
                write!(label, "\nduring: {during}").unwrap();
            }
        }

        let mut attrs = vec![("label", label)];
        if state.is_initial {
            attrs.push(("shape", self.style.initial_shape.clone()));
        }
        if state.is_error {
            attrs.push(("style", "filled".to_string()));
            attrs.push(("fillcolor", self.style.error_fill.clone()));
            attrs.push(("color", self.style.error_color.clone()));
        }
        attrs
    }

    fn edge_label(transition: &Transition) -> Option<String> {
        let condition = transition.condition.as_str();
        match (condition.is_empty(), transition.action_fn()) {
            (true, None) => None,
            (false, None) => Some(condition.to_string()),
            (true, Some(action)) => Some(format!("/ {action}")),
            (false, Some(action)) => Some(format!("{condition} / {action}")),
        }
    }
}

impl Generator for DotGenerator {
    fn artifact(&self) -> Artifact {
        Artifact::Diagram
    }

    fn generate(&self, machine: &StateMachine, _base_name: &str) -> String {
        let mut output = String::new();

        let name = match machine.formatted_title() {
            "" => DEFAULT_NAME,
            title => title,
        };
        writeln!(output, "digraph {} {{", quote(name)).unwrap();
        writeln!(
            output,
            "    node [shape = {}];",
            quote(&self.style.default_shape)
        )
        .unwrap();

        if machine.state_count() > 0 {
            writeln!(output).unwrap();
        }
        for state in machine.states() {
            let attrs: Vec<String> = self
                .node_attributes(state)
                .into_iter()
                .map(|(key, value)| format!("{key} = {}", quote(&value)))
                .collect();
            writeln!(output, "    {} [{}];", quote(&state.name), attrs.join(", ")).unwrap();
        }

        if !machine.transitions().is_empty() {
            writeln!(output).unwrap();
        }
        for transition in machine.transitions() {
            let edge = format!("{} -> {}", quote(&transition.from), quote(&transition.to));
            match Self::edge_label(transition) {
                Some(label) => writeln!(output, "    {edge} [label = {}];", quote(&label)).unwrap(),
                None => writeln!(output, "    {edge};").unwrap(),
            }
        }

        writeln!(output, "}}").unwrap();
        output
    }
}

/// Quote a DOT identifier or attribute value
fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for ch in text.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => {}
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}
