//! State and transition records
//!
//! These are the plain values the description builder produces and the
//! generators consume. Symbolic function names are kept verbatim; an empty
//! string means "no function".

use smol_str::SmolStr;

/// A named mode of the machine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    /// State name, unique within a machine
    pub name: SmolStr,
    /// Function executed on transition into the state
    pub entry: SmolStr,
    /// Function executed while remaining in the state
    pub during: SmolStr,
    /// Whether the machine starts in this state
    pub is_initial: bool,
    /// Whether this state is flagged as an error state
    pub is_error: bool,
}

impl State {
    /// Create a state carrying only a name
    #[must_use]
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set the entry function
    #[must_use]
    pub fn with_entry(mut self, entry: impl Into<SmolStr>) -> Self {
        self.entry = entry.into();
        self
    }

    /// Set the during function
    #[must_use]
    pub fn with_during(mut self, during: impl Into<SmolStr>) -> Self {
        self.during = during.into();
        self
    }

    /// Flag the state as initial
    #[must_use]
    pub const fn initial(mut self) -> Self {
        self.is_initial = true;
        self
    }

    /// Flag the state as an error state
    #[must_use]
    pub const fn error(mut self) -> Self {
        self.is_error = true;
        self
    }

    /// Fold a later declaration of the same state into this one.
    ///
    /// Non-empty function names replace the stored ones; flags are only
    /// ever raised. A previously set field is never cleared.
    pub fn merge(&mut self, other: Self) {
        if !other.entry.is_empty() {
            self.entry = other.entry;
        }
        if !other.during.is_empty() {
            self.during = other.during;
        }
        self.is_initial |= other.is_initial;
        self.is_error |= other.is_error;
    }

    /// Entry function, if any
    #[must_use]
    pub fn entry_fn(&self) -> Option<&str> {
        non_empty(&self.entry)
    }

    /// During function, if any
    #[must_use]
    pub fn during_fn(&self) -> Option<&str> {
        non_empty(&self.during)
    }
}

/// A guarded edge between two states
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transition {
    /// Source state name
    pub from: SmolStr,
    /// Destination state name
    pub to: SmolStr,
    /// Free-text guard expression
    pub condition: String,
    /// Function executed when the transition fires
    pub action: SmolStr,
}

impl Transition {
    /// Create an unguarded transition with no action
    #[must_use]
    pub fn new(from: impl Into<SmolStr>, to: impl Into<SmolStr>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            ..Self::default()
        }
    }

    /// Set the guard expression
    #[must_use]
    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    /// Set the action function
    #[must_use]
    pub fn with_action(mut self, action: impl Into<SmolStr>) -> Self {
        self.action = action.into();
        self
    }

    /// Action function, if any
    #[must_use]
    pub fn action_fn(&self) -> Option<&str> {
        non_empty(&self.action)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}
