//! Epsilon Non-deterministic Finite Automaton (ε-NFA) built from regex fragments.

use crate::determinize::subset_construction;
use crate::dfa::Dfa;
use crate::dot::{Dot, GraphEdge};
use crate::error::ParseError;
use crate::parser;
use crate::state::{StateId, StateSet};
use crate::symbol::{self, EPSILON, SymbolId, from_byte, is_epsilon};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Default)]
struct NfaState {
    /// Ordered multi-map: symbol (or `EPSILON`) -> destinations.
    transitions: BTreeMap<SymbolId, Vec<StateId>>,
}

/// An Epsilon Non-deterministic Finite Automaton.
///
/// States are stored in an arena and addressed by [`StateId`]. An NFA always
/// has at least one state. The start state never has incoming transitions,
/// which the combinators rely on when they splice fragments together.
#[derive(Debug, Clone)]
pub struct Nfa {
    states: Vec<NfaState>,
    start: StateId,
    accepting: BTreeSet<StateId>,
}

impl Nfa {
    /// The NFA accepting exactly the empty string: one accepting start state.
    pub fn new() -> Self {
        Self {
            states: vec![NfaState::default()],
            start: 0,
            accepting: BTreeSet::from([0]),
        }
    }

    /// Parse a regex into an NFA.
    pub fn from_regex(regex: &str) -> Result<Self, ParseError> {
        parser::parse(regex)
    }

    /// Add a new state and return its ID.
    pub fn add_state(&mut self, accepting: bool) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(NfaState::default());
        if accepting {
            self.accepting.insert(id);
        }
        id
    }

    /// Ensure a state exists, expanding the arena if needed.
    fn ensure_state(&mut self, state: StateId) {
        let needed = state as usize + 1;
        if needed > self.states.len() {
            self.states.resize_with(needed, NfaState::default);
        }
    }

    /// Add a transition from source to destination on the given symbol.
    pub fn add_transition(&mut self, source: StateId, symbol: SymbolId, destination: StateId) {
        self.ensure_state(source);
        self.ensure_state(destination);
        let dests = self.states[source as usize]
            .transitions
            .entry(symbol)
            .or_default();
        if !dests.contains(&destination) {
            dests.push(destination);
        }
    }

    /// Append a transition to a state created after every existing edge was
    /// added, so no duplicate check is needed.
    fn push_fresh_transition(&mut self, source: StateId, symbol: SymbolId, destination: StateId) {
        self.states[source as usize]
            .transitions
            .entry(symbol)
            .or_default()
            .push(destination);
    }

    /// Add an epsilon transition from source to destination.
    pub fn add_epsilon_transition(&mut self, source: StateId, destination: StateId) {
        self.add_transition(source, EPSILON, destination);
    }

    pub fn set_accepting(&mut self, state: StateId, accepting: bool) {
        self.ensure_state(state);
        if accepting {
            self.accepting.insert(state);
        } else {
            self.accepting.remove(&state);
        }
    }

    /// Get the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    pub fn start_state(&self) -> StateId {
        self.start
    }

    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.contains(&state)
    }

    fn accepting_states(&self) -> Vec<StateId> {
        self.accepting.iter().copied().collect()
    }

    /// Transitions leaving `state`, keyed by symbol.
    pub(crate) fn outgoing(&self, state: StateId) -> &BTreeMap<SymbolId, Vec<StateId>> {
        &self.states[state as usize].transitions
    }

    /// Get the alphabet (all symbols except epsilon).
    pub fn alphabet(&self) -> BTreeSet<SymbolId> {
        self.states
            .iter()
            .flat_map(|s| s.transitions.keys().copied())
            .filter(|&sym| !is_epsilon(sym))
            .collect()
    }

    /// Get all transitions as an iterator, ordered by source then symbol.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, SymbolId, StateId)> + '_ {
        self.states.iter().enumerate().flat_map(|(src, state)| {
            state.transitions.iter().flat_map(move |(&sym, dests)| {
                dests.iter().map(move |&dst| (src as StateId, sym, dst))
            })
        })
    }

    /// Append every transition on `symbol` from the accepting states to one
    /// fresh accepting state; the old accepting states stop accepting.
    pub fn add_symbol(&mut self, symbol: SymbolId) {
        let finals = std::mem::take(&mut self.accepting);
        let target = self.add_state(true);
        for state in finals {
            self.push_fresh_transition(state, symbol, target);
        }
    }

    /// Move `other`'s states into this arena and return the index shift
    /// applied to them. Only `other` is walked.
    fn absorb(&mut self, other: Nfa) -> StateId {
        let offset = self.states.len() as StateId;
        self.accepting
            .extend(other.accepting.iter().map(|&state| state + offset));
        self.states.extend(other.states.into_iter().map(|mut state| {
            for dests in state.transitions.values_mut() {
                for dst in dests.iter_mut() {
                    *dst += offset;
                }
            }
            state
        }));
        offset
    }

    /// Concatenation: accepting states epsilon-link to `other`'s start and
    /// stop accepting. `other` is consumed.
    pub fn concat(&mut self, other: Nfa) {
        let finals = std::mem::take(&mut self.accepting);
        let other_start = other.start;
        let offset = self.absorb(other);
        for state in finals {
            self.push_fresh_transition(state, EPSILON, other_start + offset);
        }
    }

    /// Union: the start state epsilon-branches into `other`'s start. Both
    /// sets of accepting states are kept. `other` is consumed.
    pub fn alternative(&mut self, other: Nfa) {
        let other_start = other.start;
        let offset = self.absorb(other);
        self.push_fresh_transition(self.start, EPSILON, other_start + offset);
    }

    /// Kleene star.
    ///
    /// Accepting states loop back to the current start, and a fresh accepting
    /// start state epsilon-links into it. The old start is only re-entered
    /// between iterations, and the new start has no incoming transitions.
    pub fn kleene(&mut self) {
        let body = self.start;
        for state in self.accepting_states() {
            self.add_epsilon_transition(state, body);
        }
        let start = self.add_state(true);
        self.add_epsilon_transition(start, body);
        self.start = start;
    }

    /// Compute the epsilon closure of a set of states using DFS.
    pub fn epsilon_closure(&self, states: &StateSet) -> StateSet {
        let mut closure = StateSet::with_capacity(self.states.len());
        let mut stack: Vec<StateId> = states.iter().collect();

        while let Some(s) = stack.pop() {
            if closure.contains(s) {
                continue;
            }
            closure.insert(s);

            if let Some(destinations) = self.outgoing(s).get(&EPSILON) {
                stack.extend(destinations.iter().filter(|&&d| !closure.contains(d)));
            }
        }

        closure
    }

    /// Get the states reachable from a set of states on a given symbol.
    /// Returns the epsilon closure of the reached states.
    pub fn move_on_symbol(&self, states: &StateSet, symbol: SymbolId) -> StateSet {
        debug_assert!(!is_epsilon(symbol), "use epsilon_closure for epsilon moves");

        let mut reached = StateSet::with_capacity(self.states.len());
        for state in states.iter() {
            if let Some(destinations) = self.outgoing(state).get(&symbol) {
                for &dest in destinations {
                    reached.insert(dest);
                }
            }
        }

        self.epsilon_closure(&reached)
    }

    /// Simulate the NFA on `input` without determinizing it.
    pub fn accepts(&self, input: impl AsRef<[u8]>) -> bool {
        let start = StateSet::singleton(self.start, self.states.len());
        let mut current = self.epsilon_closure(&start);
        for &byte in input.as_ref() {
            current = self.move_on_symbol(&current, from_byte(byte));
            if current.is_empty() {
                return false;
            }
        }
        current.iter().any(|s| self.is_accepting(s))
    }

    /// Product of this NFA with a DFA, accepting the intersection of their
    /// languages.
    ///
    /// Product state `(i, j)` has index `i * dfa.size() + j`. A symbol moves
    /// both components; an epsilon transition moves only the NFA component.
    /// All pairs are materialized, reachable or not.
    pub fn intersect(&self, dfa: &Dfa) -> Nfa {
        let width = dfa.size() as StateId;
        let pair = |i: StateId, j: StateId| i * width + j;

        let mut product = Nfa {
            states: Vec::with_capacity(self.states.len() * dfa.size()),
            start: pair(self.start, dfa.start_state()),
            accepting: BTreeSet::new(),
        };
        for i in 0..self.states.len() as StateId {
            for j in 0..width {
                product.add_state(self.is_accepting(i) && dfa.is_accepting(j));
            }
        }

        for (src, sym, dst) in self.transitions() {
            for j in 0..width {
                if is_epsilon(sym) {
                    product.add_epsilon_transition(pair(src, j), pair(dst, j));
                } else if let Some(k) = dfa.transition(j, sym) {
                    product.add_transition(pair(src, j), sym, pair(dst, k));
                }
            }
        }

        product
    }

    /// Convert to a minimal DFA: subset construction, then minimization.
    pub fn determinize(&self) -> Dfa {
        let mut dfa = subset_construction(self);
        dfa.minimize();
        dfa
    }

    /// Convert to a graph representation (edges with labels).
    /// Returns: (nodes, edges) where edges are (src, dst, label)
    pub fn to_graph(&self) -> (Vec<StateId>, Vec<GraphEdge>) {
        let nodes = (0..self.states.len() as StateId).collect();
        let edges = self
            .transitions()
            .map(|(src, sym, dst)| (src, dst, symbol::label(sym)))
            .collect();
        (nodes, edges)
    }
}

impl Default for Nfa {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Nfa {
    /// Graphviz DOT rendering.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (_, edges) = self.to_graph();
        let dot = Dot {
            name: "NFA",
            start: self.start,
            accepting: self.accepting_states(),
            edges,
        };
        write!(f, "{dot}")
    }
}
