//! Plain-text documentation generator

use super::{Artifact, Generator};
use crate::model::{State, StateMachine};
use std::fmt::Write;

/// Title used when the machine has none
const UNTITLED: &str = "Untitled state machine";

/// Plain-text report generator
#[derive(Debug, Clone, Copy, Default)]
pub struct DocGenerator;

impl DocGenerator {
    fn heading(output: &mut String, text: &str, underline: char) {
        writeln!(output, "{text}").unwrap();
        let rule: String = std::iter::repeat(underline)
            .take(text.chars().count())
            .collect();
        writeln!(output, "{rule}\n").unwrap();
    }

    fn flags(state: &State) -> String {
        let flags: Vec<&str> = [(state.is_initial, "initial"), (state.is_error, "error")]
            .into_iter()
            .filter_map(|(set, name)| set.then_some(name))
            .collect();

        if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        }
    }

    fn generate_states(output: &mut String, machine: &StateMachine) {
        Self::heading(output, "States", '-');

        if machine.state_count() == 0 {
            writeln!(output, "(none)").unwrap();
        }
        for state in machine.states() {
            writeln!(output, "{}{}", state.name, Self::flags(state)).unwrap();
            if let Some(entry) = state.entry_fn() {
                writeln!(output, "    entry:  {entry}").unwrap();
            }
            if let Some(during) = state.during_fn() {
                writeln!(output, "    during: {during}").unwrap();
            }
        }
        writeln!(output).unwrap();
    }

    fn generate_transitions(output: &mut String, machine: &StateMachine) {
        Self::heading(output, "Transitions", '-');

        let groups = machine.transition_groups();
        if groups.is_empty() {
            writeln!(output, "(none)").unwrap();
        }

        for (from, transitions) in &groups {
            writeln!(output, "{from}").unwrap();
            for transition in transitions {
                let condition = match transition.condition.as_str() {
                    "" => "-",
                    text => text,
                };
                let action = transition.action_fn().unwrap_or("-");

                writeln!(output, "    {} -> {}", transition.from, transition.to).unwrap();
                writeln!(output, "        condition: {condition}  action: {action}").unwrap();
            }
        }
    }
}

impl Generator for DocGenerator {
    fn artifact(&self) -> Artifact {
        Artifact::Documentation
    }

    fn generate(&self, machine: &StateMachine, _base_name: &str) -> String {
        let mut output = String::new();

        let title = match machine.title() {
            "" => UNTITLED,
            title => title,
        };
        Self::heading(&mut output, title, '=');
        Self::generate_states(&mut output, machine);
        Self::generate_transitions(&mut output, machine);

        output
    }
}
