//! C code generator
//!
//! Produces a header declaring the state enumeration, the application
//! functions the machine calls, and two entry points:
//!
//! - `<prefix>_initial_state()` returns the state the machine starts in
//! - `<prefix>_step(current)` advances the machine by one step
//!
//! The source file implements `<prefix>_step` as a `switch` over the
//! current state. Each case runs the state's during function, then tests
//! the guards of its outgoing transitions in declaration order; the first
//! guard that holds runs the transition action and the destination's entry
//! function and returns the destination.

use super::{Artifact, Generator, DEFAULT_NAME};
use crate::model::StateMachine;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt::Write;

/// Generated C identifiers for one machine
#[derive(Debug)]
struct Symbols<'m> {
    /// Namespace prefix shared by every generated identifier
    prefix: String,
    /// Upper-case prefix for macros
    upper: String,
    state_type: String,
    count: String,
    initial_fn: String,
    step_fn: String,
    states: IndexMap<&'m str, String>,
}

impl<'m> Symbols<'m> {
    fn new(machine: &'m StateMachine, base_name: &str) -> Self {
        let prefix = [machine.formatted_title(), base_name]
            .into_iter()
            .map(identifier)
            .find(|id| !id.is_empty())
            .unwrap_or_else(|| DEFAULT_NAME.to_string());
        let upper = prefix.to_ascii_uppercase();

        let state_type = format!("{prefix}_state_t");
        let count = format!("{upper}_STATE_COUNT");
        let initial_fn = format!("{prefix}_initial_state");
        let step_fn = format!("{prefix}_step");

        // Application functions share the C namespace with the enum constants.
        let mut taken: HashSet<String> = [&state_type, &count, &initial_fn, &step_fn]
            .into_iter()
            .cloned()
            .chain(machine.function_names().into_iter().map(str::to_string))
            .collect();

        let mut states = IndexMap::new();
        for state in machine.states() {
            let base = format!("{prefix}_{}", identifier(&state.name));
            let mut candidate = base.clone();
            let mut suffix = 2;
            while taken.contains(&candidate) {
                candidate = format!("{base}_{suffix}");
                suffix += 1;
            }
            taken.insert(candidate.clone());
            states.insert(state.name.as_str(), candidate);
        }

        Self {
            prefix,
            upper,
            state_type,
            count,
            initial_fn,
            step_fn,
            states,
        }
    }

    /// Identifier for a state name.
    ///
    /// Undeclared names get the identifier they would have had, so the
    /// generated code refers to a symbol nobody defines.
    fn state(&self, name: &str) -> String {
        self.states
            .get(name)
            .cloned()
            .unwrap_or_else(|| format!("{}_{}", self.prefix, identifier(name)))
    }
}

/// Turn arbitrary text into a C identifier
fn identifier(text: &str) -> String {
    let mut id: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if id.starts_with(|c: char| c.is_ascii_digit()) {
        id.insert(0, '_');
    }
    id
}

/// Text safe to place inside a `/* */` comment
fn comment_text(text: &str) -> String {
    text.replace("*/", "* /")
}

fn file_banner(output: &mut String, file_name: &str, machine: &StateMachine) {
    writeln!(output, "/*").unwrap();
    writeln!(output, " * {file_name}").unwrap();
    writeln!(output, " *").unwrap();
    if !machine.title().is_empty() {
        writeln!(output, " * State machine: {}", comment_text(machine.title())).unwrap();
    }
    writeln!(output, " * Generated by smgen. Do not edit.").unwrap();
    writeln!(output, " */\n").unwrap();
}

/// C header generator
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderGenerator;

impl Generator for HeaderGenerator {
    fn artifact(&self) -> Artifact {
        Artifact::Header
    }

    fn generate(&self, machine: &StateMachine, base_name: &str) -> String {
        let symbols = Symbols::new(machine, base_name);
        let guard = format!("{}_H", symbols.upper);
        let mut output = String::new();

        file_banner(&mut output, &Artifact::Header.file_name(base_name), machine);

        writeln!(output, "#ifndef {guard}").unwrap();
        writeln!(output, "#define {guard}\n").unwrap();
        writeln!(output, "#ifdef __cplusplus").unwrap();
        writeln!(output, "extern \"C\" {{").unwrap();
        writeln!(output, "#endif\n").unwrap();

        writeln!(output, "/* States */").unwrap();
        writeln!(output, "typedef enum {{").unwrap();
        for id in symbols.states.values() {
            writeln!(output, "    {id},").unwrap();
        }
        writeln!(output, "    {}", symbols.count).unwrap();
        writeln!(output, "}} {};\n", symbols.state_type).unwrap();

        let functions = machine.function_names();
        if !functions.is_empty() {
            writeln!(output, "/* Functions provided by the application */").unwrap();
            for function in &functions {
                writeln!(output, "void {function}(void);").unwrap();
            }
            writeln!(output).unwrap();
        }

        writeln!(output, "/* State the machine starts in */").unwrap();
        writeln!(
            output,
            "{} {}(void);\n",
            symbols.state_type, symbols.initial_fn
        )
        .unwrap();
        writeln!(output, "/* Advance the machine by one step */").unwrap();
        writeln!(
            output,
            "{ty} {}({ty} current);\n",
            symbols.step_fn,
            ty = symbols.state_type
        )
        .unwrap();

        writeln!(output, "#ifdef __cplusplus").unwrap();
        writeln!(output, "}}").unwrap();
        writeln!(output, "#endif\n").unwrap();
        writeln!(output, "#endif /* {guard} */").unwrap();

        output
    }
}

/// C source generator
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceGenerator;

impl SourceGenerator {
    fn generate_initial_state(output: &mut String, machine: &StateMachine, symbols: &Symbols<'_>) {
        let initial = machine
            .initial_state()
            .map_or_else(|| symbols.count.clone(), |state| symbols.state(&state.name));

        writeln!(output, "{} {}(void)", symbols.state_type, symbols.initial_fn).unwrap();
        writeln!(output, "{{").unwrap();
        writeln!(output, "    return {initial};").unwrap();
        writeln!(output, "}}\n").unwrap();
    }

    fn generate_step(output: &mut String, machine: &StateMachine, symbols: &Symbols<'_>) {
        let groups = machine.transition_groups();

        writeln!(
            output,
            "{ty} {}({ty} current)",
            symbols.step_fn,
            ty = symbols.state_type
        )
        .unwrap();
        writeln!(output, "{{").unwrap();
        writeln!(output, "    switch (current) {{").unwrap();

        let declared = machine.states().map(|s| s.name.as_str());
        let undeclared = groups.keys().copied().filter(|name| !machine.has_state(name));

        for name in declared.chain(undeclared) {
            writeln!(output, "    case {}:", symbols.state(name)).unwrap();

            if let Some(during) = machine.state(name).and_then(|s| s.during_fn()) {
                writeln!(output, "        {during}();").unwrap();
            }

            for transition in groups.get(name).into_iter().flatten() {
                let condition = match transition.condition.trim() {
                    "" => "1",
                    text => text,
                };
                writeln!(output, "        if ({condition}) {{").unwrap();
                if let Some(action) = transition.action_fn() {
                    writeln!(output, "            {action}();").unwrap();
                }
                if let Some(entry) = machine.state(&transition.to).and_then(|s| s.entry_fn()) {
                    writeln!(output, "            {entry}();").unwrap();
                }
                writeln!(output, "            return {};", symbols.state(&transition.to)).unwrap();
                writeln!(output, "        }}").unwrap();
            }

            writeln!(output, "        break;").unwrap();
        }

        writeln!(output, "    default:").unwrap();
        writeln!(output, "        break;").unwrap();
        writeln!(output, "    }}\n").unwrap();
        writeln!(output, "    return current;").unwrap();
        writeln!(output, "}}").unwrap();
    }
}

impl Generator for SourceGenerator {
    fn artifact(&self) -> Artifact {
        Artifact::Source
    }

    fn generate(&self, machine: &StateMachine, base_name: &str) -> String {
        let symbols = Symbols::new(machine, base_name);
        let mut output = String::new();

        file_banner(&mut output, &Artifact::Source.file_name(base_name), machine);
        writeln!(output, "#include \"{}\"\n", Artifact::Header.file_name(base_name)).unwrap();

        Self::generate_initial_state(&mut output, machine, &symbols);
        Self::generate_step(&mut output, machine, &symbols);

        output
    }
}
