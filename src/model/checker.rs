//! Soft validation of a finished model
//!
//! Nothing reported here stops generation. Dangling endpoints and a missing
//! initial flag are legal in a description; the gaps are surfaced so the
//! CLI can warn about them.

use super::StateMachine;
use smol_str::SmolStr;
use std::fmt;

/// Which end of a transition a gap refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// The source state
    From,
    /// The destination state
    To,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::From => f.write_str("source"),
            Endpoint::To => f.write_str("destination"),
        }
    }
}

/// A problem in a model that generation tolerates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationGap {
    /// A transition endpoint names a state that was never declared
    DanglingEndpoint {
        /// Position of the transition in declaration order
        index: usize,
        /// Which endpoint is dangling
        endpoint: Endpoint,
        /// The undeclared state name
        name: SmolStr,
    },
    /// No state is flagged initial; the first declared state is used
    NoInitialState {
        /// The state used instead
        fallback: SmolStr,
    },
    /// More than one state is flagged initial; the first one wins
    MultipleInitialStates {
        /// All flagged states in declaration order
        names: Vec<SmolStr>,
    },
    /// The model declares no states at all
    NoStates,
}

impl fmt::Display for ValidationGap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationGap::DanglingEndpoint {
                index,
                endpoint,
                name,
            } => write!(
                f,
                "transition #{} has undeclared {endpoint} state `{name}`",
                index + 1
            ),
            ValidationGap::NoInitialState { fallback } => {
                write!(f, "no initial state flagged, using `{fallback}`")
            }
            ValidationGap::MultipleInitialStates { names } => {
                let names: Vec<_> = names.iter().map(|n| format!("`{n}`")).collect();
                write!(
                    f,
                    "several initial states flagged ({}), using the first",
                    names.join(", ")
                )
            }
            ValidationGap::NoStates => f.write_str("no states declared"),
        }
    }
}

/// Collect every validation gap in `machine`, in a stable order
#[must_use]
pub fn check(machine: &StateMachine) -> Vec<ValidationGap> {
    let mut gaps = dangling_endpoints(machine);

    let initials: Vec<SmolStr> = machine
        .states()
        .filter(|s| s.is_initial)
        .map(|s| s.name.clone())
        .collect();

    match (initials.len(), machine.states().next()) {
        (_, None) => gaps.push(ValidationGap::NoStates),
        (0, Some(first)) => gaps.push(ValidationGap::NoInitialState {
            fallback: first.name.clone(),
        }),
        (1, _) => {}
        _ => gaps.push(ValidationGap::MultipleInitialStates { names: initials }),
    }

    gaps
}

/// Transition endpoints naming undeclared states, source before destination
pub(crate) fn dangling_endpoints(machine: &StateMachine) -> Vec<ValidationGap> {
    let mut gaps = Vec::new();

    for (index, transition) in machine.transitions().iter().enumerate() {
        for (endpoint, name) in [
            (Endpoint::From, &transition.from),
            (Endpoint::To, &transition.to),
        ] {
            if !machine.has_state(name) {
                gaps.push(ValidationGap::DanglingEndpoint {
                    index,
                    endpoint,
                    name: name.clone(),
                });
            }
        }
    }

    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{State, Transition};

    #[test]
    fn test_check_clean_machine() {
        let mut machine = StateMachine::new();
        machine.add_state(State::new("A").initial());
        machine.add_state(State::new("B"));
        machine.add_transition(Transition::new("A", "B"));

        assert!(check(&machine).is_empty());
    }

    #[test]
    fn test_check_empty_machine() {
        assert_eq!(check(&StateMachine::new()), vec![ValidationGap::NoStates]);
    }

    #[test]
    fn test_check_dangling_endpoints() {
        let mut machine = StateMachine::new();
        machine.add_state(State::new("A").initial());
        machine.add_transition(Transition::new("A", "B"));
        machine.add_transition(Transition::new("C", "A"));

        let gaps = check(&machine);
        assert_eq!(
            gaps,
            vec![
                ValidationGap::DanglingEndpoint {
                    index: 0,
                    endpoint: Endpoint::To,
                    name: "B".into(),
                },
                ValidationGap::DanglingEndpoint {
                    index: 1,
                    endpoint: Endpoint::From,
                    name: "C".into(),
                },
            ]
        );
        assert_eq!(
            gaps[0].to_string(),
            "transition #1 has undeclared destination state `B`"
        );
    }

    #[test]
    fn test_check_no_initial() {
        let mut machine = StateMachine::new();
        machine.add_state(State::new("A"));
        machine.add_state(State::new("B"));

        let gaps = check(&machine);
        assert_eq!(
            gaps,
            vec![ValidationGap::NoInitialState {
                fallback: "A".into()
            }]
        );
        assert_eq!(gaps[0].to_string(), "no initial state flagged, using `A`");
    }

    #[test]
    fn test_check_multiple_initial() {
        let mut machine = StateMachine::new();
        machine.add_state(State::new("A").initial());
        machine.add_state(State::new("B").initial());

        let gaps = check(&machine);
        assert_eq!(
            gaps,
            vec![ValidationGap::MultipleInitialStates {
                names: vec!["A".into(), "B".into()]
            }]
        );
    }
}
