//! State machine model
//!
//! This module provides the in-memory representation of a state machine
//! description:
//!
//! - `StateMachine`: ordered, name-keyed states plus ordered transitions
//! - `State` / `Transition`: the records stored in it
//! - `check`: soft validation of a finished model
//!
//! The model never fails. Declaring a state twice folds the second
//! declaration into the first (see [`State::merge`]); transitions are kept
//! exactly in the order they were added because guard evaluation is
//! first-match-wins.

mod checker;
mod state;

pub(crate) use checker::dangling_endpoints;
pub use checker::{check, Endpoint, ValidationGap};
pub use state::{State, Transition};

use indexmap::{IndexMap, IndexSet};
use smol_str::SmolStr;

/// A complete state machine description
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateMachine {
    title: String,
    formatted_title: String,
    states: IndexMap<SmolStr, State>,
    transitions: Vec<Transition>,
}

impl StateMachine {
    /// Create an empty state machine
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to the empty state
    pub fn clear(&mut self) {
        self.title.clear();
        self.formatted_title.clear();
        self.states.clear();
        self.transitions.clear();
    }

    /// Add a state, merging it into an existing state of the same name
    pub fn add_state(&mut self, state: State) {
        match self.states.get_mut(&state.name) {
            Some(existing) => existing.merge(state),
            None => {
                self.states.insert(state.name.clone(), state);
            }
        }
    }

    /// Append a transition
    pub fn add_transition(&mut self, transition: Transition) {
        self.transitions.push(transition);
    }

    /// Set the title and recompute the formatted title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.formatted_title = format_title(&self.title);
    }

    /// Raw title as declared
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Lower-cased title with whitespace runs replaced by `_`
    #[must_use]
    pub fn formatted_title(&self) -> &str {
        &self.formatted_title
    }

    /// States in declaration order
    pub fn states(&self) -> impl ExactSizeIterator<Item = &State> {
        self.states.values()
    }

    /// Look up a state by name
    #[must_use]
    pub fn state(&self, name: &str) -> Option<&State> {
        self.states.get(name)
    }

    /// Whether a state with this name has been declared
    #[must_use]
    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// Number of declared states
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Transitions in declaration order
    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Transitions leaving `name`, in declaration order
    pub fn transitions_from<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Transition> {
        self.transitions.iter().filter(move |t| t.from == name)
    }

    /// Whether the machine has no states, transitions or title
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty() && self.transitions.is_empty() && self.title.is_empty()
    }

    /// The state the machine starts in.
    ///
    /// This is the first state flagged initial, or the first declared state
    /// when none is flagged.
    #[must_use]
    pub fn initial_state(&self) -> Option<&State> {
        self.states
            .values()
            .find(|s| s.is_initial)
            .or_else(|| self.states.values().next())
    }

    /// Transitions grouped by source state.
    ///
    /// Groups follow state declaration order, followed by undeclared source
    /// names in order of first appearance. Each group keeps declaration
    /// order and empty groups are omitted.
    #[must_use]
    pub fn transition_groups(&self) -> IndexMap<&str, Vec<&Transition>> {
        let mut groups: IndexMap<&str, Vec<&Transition>> = self
            .states
            .keys()
            .map(|name| (name.as_str(), Vec::new()))
            .collect();

        for transition in &self.transitions {
            groups
                .entry(transition.from.as_str())
                .or_default()
                .push(transition);
        }

        groups.retain(|_, transitions| !transitions.is_empty());
        groups
    }

    /// Every distinct function name the machine refers to.
    ///
    /// Entry then during functions of each state in declaration order come
    /// first, followed by transition actions.
    #[must_use]
    pub fn function_names(&self) -> IndexSet<&str> {
        let state_fns = self
            .states
            .values()
            .flat_map(|s| [s.entry_fn(), s.during_fn()]);
        let action_fns = self.transitions.iter().map(Transition::action_fn);

        state_fns.chain(action_fns).flatten().collect()
    }
}

fn format_title(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door() -> StateMachine {
        let mut machine = StateMachine::new();
        machine.set_title("Door");
        machine.add_state(State::new("Open").initial());
        machine.add_state(State::new("Closed").error());
        machine.add_transition(
            Transition::new("Open", "Closed")
                .with_condition("locked")
                .with_action("lockDoor"),
        );
        machine
    }

    #[test]
    fn test_clear() {
        let mut machine = door();
        machine.clear();

        assert!(machine.is_empty());
        assert_eq!(machine.states().len(), 0);
        assert!(machine.transitions().is_empty());
        assert_eq!(machine.title(), "");
        assert_eq!(machine.formatted_title(), "");
        assert_eq!(machine, StateMachine::new());
    }

    #[test]
    fn test_add_state_merges_fragments() {
        let mut machine = StateMachine::new();
        machine.add_state(State::new("Idle").with_entry("enterIdle").initial());
        machine.add_state(State::new("Idle").with_during("pollIdle"));

        assert_eq!(machine.state_count(), 1);
        let idle = machine.state("Idle").unwrap();
        assert_eq!(idle.entry, "enterIdle");
        assert_eq!(idle.during, "pollIdle");
        assert!(idle.is_initial);
        assert!(!idle.is_error);
    }

    #[test]
    fn test_stub_before_declaration_keeps_position() {
        let mut machine = StateMachine::new();
        machine.add_state(State::new("B"));
        machine.add_state(State::new("A"));
        machine.add_state(State::new("B").with_entry("enterB").error());

        let names: Vec<_> = machine.states().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["B", "A"]);
        assert!(machine.state("B").unwrap().is_error);
    }

    #[test]
    fn test_transitions_are_never_merged() {
        let mut machine = StateMachine::new();
        machine.add_transition(Transition::new("A", "B"));
        machine.add_transition(Transition::new("A", "B"));
        assert_eq!(machine.transitions().len(), 2);
    }

    #[test]
    fn test_formatted_title() {
        let mut machine = StateMachine::new();
        machine.set_title("My   State Machine");
        assert_eq!(machine.formatted_title(), "my_state_machine");

        machine.set_title("My   State Machine");
        assert_eq!(machine.formatted_title(), "my_state_machine");

        machine.set_title("  Tabs\tand\nLines ");
        assert_eq!(machine.formatted_title(), "tabs_and_lines");

        machine.set_title("");
        assert_eq!(machine.formatted_title(), "");
    }

    #[test]
    fn test_initial_state_flagged() {
        let mut machine = StateMachine::new();
        machine.add_state(State::new("A"));
        machine.add_state(State::new("B").initial());
        assert_eq!(machine.initial_state().unwrap().name, "B");
    }

    #[test]
    fn test_initial_state_fallback_is_first_declared() {
        let mut machine = StateMachine::new();
        machine.add_state(State::new("First"));
        machine.add_state(State::new("Second"));
        assert_eq!(machine.initial_state().unwrap().name, "First");

        assert!(StateMachine::new().initial_state().is_none());
    }

    #[test]
    fn test_transition_groups_order() {
        let mut machine = StateMachine::new();
        machine.add_state(State::new("A"));
        machine.add_state(State::new("B"));
        machine.add_transition(Transition::new("B", "A").with_condition("b1"));
        machine.add_transition(Transition::new("Ghost", "A").with_condition("g1"));
        machine.add_transition(Transition::new("A", "B").with_condition("a1"));
        machine.add_transition(Transition::new("B", "B").with_condition("b2"));

        let groups = machine.transition_groups();
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, ["A", "B", "Ghost"]);

        let b: Vec<_> = groups["B"].iter().map(|t| t.condition.as_str()).collect();
        assert_eq!(b, ["b1", "b2"]);
    }

    #[test]
    fn test_transition_groups_skip_states_without_transitions() {
        let machine = door();
        let groups = machine.transition_groups();
        assert_eq!(groups.len(), 1);
        assert!(groups.contains_key("Open"));
    }

    #[test]
    fn test_function_names_are_distinct_and_ordered() {
        let mut machine = StateMachine::new();
        machine.add_state(State::new("A").with_entry("shared").with_during("tickA"));
        machine.add_state(State::new("B").with_entry("enterB"));
        machine.add_transition(Transition::new("A", "B").with_action("shared"));
        machine.add_transition(Transition::new("B", "A").with_action("reset"));
        machine.add_transition(Transition::new("B", "A"));

        let names: Vec<_> = machine.function_names().into_iter().collect();
        assert_eq!(names, ["shared", "tickA", "enterB", "reset"]);
    }

    #[test]
    fn test_transitions_from() {
        let mut machine = door();
        machine.add_transition(Transition::new("Closed", "Open"));
        let from_open: Vec<_> = machine.transitions_from("Open").collect();
        assert_eq!(from_open.len(), 1);
        assert_eq!(from_open[0].to, "Closed");
    }
}
