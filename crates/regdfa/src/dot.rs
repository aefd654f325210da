//! Graphviz DOT rendering shared by both automata.

use crate::state::StateId;
use std::fmt;

/// A labeled edge in the graph representation: (source, destination, label).
pub type GraphEdge = (StateId, StateId, String);

/// A renderable automaton graph.
pub(crate) struct Dot<'a> {
    pub(crate) name: &'a str,
    pub(crate) start: StateId,
    pub(crate) accepting: Vec<StateId>,
    pub(crate) edges: Vec<GraphEdge>,
}

fn escape(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for c in label.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph {} {{", self.name)?;

        if !self.accepting.is_empty() {
            f.write_str("node [shape = doublecircle];")?;
            for state in &self.accepting {
                write!(f, " {state}")?;
            }
            writeln!(f, ";")?;
        }
        writeln!(f, "node [shape = circle];")?;

        writeln!(f, "start [shape = point];")?;
        writeln!(f, "start -> {};", self.start)?;

        for (src, dst, label) in &self.edges {
            writeln!(f, "{src} -> {dst} [label = \"{}\"];", escape(label))?;
        }

        writeln!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(escape("a"), "a");
        assert_eq!(escape("\""), "\\\"");
        assert_eq!(escape("\\x0a"), "\\\\x0a");
    }

    #[test]
    fn test_render() {
        let dot = Dot {
            name: "G",
            start: 1,
            accepting: vec![0, 2],
            edges: vec![(1, 0, "x".to_string()), (1, 2, "\"".to_string())],
        };
        assert_eq!(
            dot.to_string(),
            "digraph G {\n\
             node [shape = doublecircle]; 0 2;\n\
             node [shape = circle];\n\
             start [shape = point];\n\
             start -> 1;\n\
             1 -> 0 [label = \"x\"];\n\
             1 -> 2 [label = \"\\\"\"];\n\
             }\n"
        );
    }
}
