//! Deterministic Finite Automaton (DFA) implementation with Hopcroft minimization.

use crate::dot::{Dot, GraphEdge};
use crate::error::ParseError;
use crate::parser;
use crate::state::{StateId, StateSet};
use crate::symbol::{self, SymbolId, from_byte, is_epsilon};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct DfaState {
    accepting: bool,
    /// At most one destination per symbol.
    transitions: BTreeMap<SymbolId, StateId>,
}

/// A Deterministic Finite Automaton.
///
/// The transition function is partial: a missing transition rejects. The
/// start state is always state 0 and there is always at least one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa {
    states: Vec<DfaState>,
}

impl Dfa {
    /// A one-state DFA accepting nothing.
    pub fn new() -> Self {
        Self {
            states: vec![DfaState::default()],
        }
    }

    /// Compile a regex into a minimal DFA.
    pub fn from_regex(regex: &str) -> Result<Self, ParseError> {
        Ok(parser::parse(regex)?.determinize())
    }

    /// Add a new state and return its ID.
    pub fn add_state(&mut self, accepting: bool) -> StateId {
        let id = self.states.len() as StateId;
        self.states.push(DfaState {
            accepting,
            transitions: BTreeMap::new(),
        });
        id
    }

    /// Ensure a state exists, expanding the arena with non-accepting states.
    fn ensure_state(&mut self, state: StateId) {
        let needed = state as usize + 1;
        if needed > self.states.len() {
            self.states.resize_with(needed, DfaState::default);
        }
    }

    pub fn set_accepting(&mut self, state: StateId, accepting: bool) {
        self.ensure_state(state);
        self.states[state as usize].accepting = accepting;
    }

    /// Add a transition, replacing any previous one on the same symbol.
    /// Missing source or destination states are created.
    pub fn add_transition(&mut self, source: StateId, symbol: SymbolId, destination: StateId) {
        debug_assert!(!is_epsilon(symbol), "a DFA has no epsilon transitions");
        self.ensure_state(source);
        self.ensure_state(destination);
        self.states[source as usize]
            .transitions
            .insert(symbol, destination);
    }

    /// Get the transition from a state on a symbol.
    pub fn transition(&self, source: StateId, symbol: SymbolId) -> Option<StateId> {
        self.states
            .get(source as usize)?
            .transitions
            .get(&symbol)
            .copied()
    }

    /// Get the number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    pub fn start_state(&self) -> StateId {
        0
    }

    pub fn is_accepting(&self, state: StateId) -> bool {
        self.states
            .get(state as usize)
            .is_some_and(|s| s.accepting)
    }

    /// Get the alphabet: every symbol with at least one transition.
    pub fn alphabet(&self) -> BTreeSet<SymbolId> {
        self.states
            .iter()
            .flat_map(|s| s.transitions.keys().copied())
            .collect()
    }

    /// Get all transitions as an iterator, ordered by source then symbol.
    pub fn transitions(&self) -> impl Iterator<Item = (StateId, SymbolId, StateId)> + '_ {
        self.states.iter().enumerate().flat_map(|(src, state)| {
            state
                .transitions
                .iter()
                .map(move |(&sym, &dst)| (src as StateId, sym, dst))
        })
    }

    /// Run the DFA over `input`. A missing transition rejects immediately.
    pub fn accepts(&self, input: impl AsRef<[u8]>) -> bool {
        let mut state = self.start_state();
        for &byte in input.as_ref() {
            match self.transition(state, from_byte(byte)) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.is_accepting(state)
    }

    /// Check if the DFA is empty (accepts no strings).
    pub fn is_empty(&self) -> bool {
        let reachable = self.find_reachable_states();
        !reachable.iter().any(|s| self.is_accepting(s))
    }

    /// Find all states reachable from the start state.
    fn find_reachable_states(&self) -> StateSet {
        let mut reachable = StateSet::with_capacity(self.states.len());
        let mut queue = VecDeque::new();
        queue.push_back(self.start_state());

        while let Some(state) = queue.pop_front() {
            if reachable.contains(state) {
                continue;
            }
            reachable.insert(state);

            for &next in self.states[state as usize].transitions.values() {
                if !reachable.contains(next) {
                    queue.push_back(next);
                }
            }
        }

        reachable
    }

    /// Find all states from which some accepting state is reachable.
    fn find_live_states(&self) -> StateSet {
        let n = self.states.len();
        let mut predecessors: Vec<Vec<StateId>> = vec![Vec::new(); n];
        for (src, _, dst) in self.transitions() {
            predecessors[dst as usize].push(src);
        }

        let mut live = StateSet::with_capacity(n);
        let mut queue: VecDeque<StateId> = (0..n as StateId)
            .filter(|&s| self.is_accepting(s))
            .collect();

        while let Some(state) = queue.pop_front() {
            if live.contains(state) {
                continue;
            }
            live.insert(state);
            queue.extend(
                predecessors[state as usize]
                    .iter()
                    .filter(|&&p| !live.contains(p)),
            );
        }

        live
    }

    /// Keep the states in `keep` (in index order), sending every transition
    /// through `remap`. Transitions whose destination maps to `None` vanish.
    fn compact(&mut self, keep: &StateSet, remap: &[Option<StateId>]) {
        let old = std::mem::take(&mut self.states);
        self.states = keep
            .iter()
            .map(|s| {
                let state = &old[s as usize];
                DfaState {
                    accepting: state.accepting,
                    transitions: state
                        .transitions
                        .iter()
                        .filter_map(|(&sym, &dst)| remap[dst as usize].map(|d| (sym, d)))
                        .collect(),
                }
            })
            .collect();
    }

    /// Discard every state not reachable from the start state. Surviving
    /// states keep their relative order, so the start state stays 0.
    pub fn strip_unreachable(&mut self) {
        let reachable = self.find_reachable_states();
        if reachable.len() == self.states.len() {
            return;
        }

        let mut remap = vec![None; self.states.len()];
        for (new, old) in reachable.iter().enumerate() {
            remap[old as usize] = Some(new as StateId);
        }
        self.compact(&reachable, &remap);
    }

    /// Drop transitions into states that cannot reach an accepting state.
    /// Rejecting on such a transition or later is indistinguishable.
    fn prune_dead_transitions(&mut self) {
        let live = self.find_live_states();
        for state in &mut self.states {
            state.transitions.retain(|_, dst| live.contains(*dst));
        }
    }

    /// Reverse transitions: (destination, symbol) -> sources.
    fn reverse_transitions(&self) -> HashMap<(StateId, SymbolId), Vec<StateId>> {
        let mut reverse: HashMap<(StateId, SymbolId), Vec<StateId>> = HashMap::new();
        for (src, sym, dst) in self.transitions() {
            reverse.entry((dst, sym)).or_default().push(src);
        }
        reverse
    }

    /// Find all states that can reach the target set on a given symbol.
    fn find_predecessors(
        &self,
        reverse: &HashMap<(StateId, SymbolId), Vec<StateId>>,
        targets: &StateSet,
        symbol: SymbolId,
    ) -> StateSet {
        let mut predecessors = StateSet::with_capacity(self.states.len());

        for target in targets.iter() {
            if let Some(sources) = reverse.get(&(target, symbol)) {
                for &source in sources {
                    predecessors.insert(source);
                }
            }
        }

        predecessors
    }

    /// Hopcroft's partition refinement, starting from {accepting, rejecting}.
    fn refine_partitions(&self) -> Vec<StateSet> {
        let n = self.states.len();
        let alphabet = self.alphabet();
        let reverse = self.reverse_transitions();

        let mut finals = StateSet::with_capacity(n);
        let mut others = StateSet::with_capacity(n);
        for state in 0..n as StateId {
            if self.is_accepting(state) {
                finals.insert(state);
            } else {
                others.insert(state);
            }
        }

        let mut partitions: Vec<StateSet> = [finals, others]
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect();

        // With a partial transition function both initial blocks must split.
        let mut worklist: Vec<usize> = (0..partitions.len()).collect();
        let mut queued = vec![true; partitions.len()];

        while let Some(splitter_idx) = worklist.pop() {
            queued[splitter_idx] = false;
            let splitter = partitions[splitter_idx].clone();

            for &symbol in &alphabet {
                let predecessors = self.find_predecessors(&reverse, &splitter, symbol);
                if predecessors.is_empty() {
                    continue;
                }

                for part_idx in 0..partitions.len() {
                    let inside = partitions[part_idx].intersection(&predecessors);
                    if inside.is_empty() {
                        continue;
                    }
                    let outside = partitions[part_idx].difference(&predecessors);
                    if outside.is_empty() {
                        continue;
                    }

                    let new_idx = partitions.len();
                    let inside_is_smaller = inside.len() <= outside.len();
                    partitions[part_idx] = inside;
                    partitions.push(outside);
                    queued.push(false);

                    if queued[part_idx] {
                        // Both halves replace the queued block.
                        worklist.push(new_idx);
                        queued[new_idx] = true;
                    } else {
                        let smaller = if inside_is_smaller { part_idx } else { new_idx };
                        worklist.push(smaller);
                        queued[smaller] = true;
                    }
                }
            }
        }

        partitions
    }

    /// Minimize the DFA in place.
    ///
    /// Dead transitions and unreachable states are removed first; the
    /// remaining states are refined into language-equivalence blocks, and
    /// each block collapses onto its smallest member.
    pub fn minimize(&mut self) {
        self.prune_dead_transitions();
        self.strip_unreachable();

        let partitions = self.refine_partitions();

        let n = self.states.len();
        let mut representative: Vec<StateId> = (0..n as StateId).collect();
        let mut survivors = StateSet::with_capacity(n);
        for partition in &partitions {
            let Some(rep) = partition.min() else {
                continue;
            };
            survivors.insert(rep);
            for state in partition.iter() {
                representative[state as usize] = rep;
            }
        }

        let mut new_id = vec![None; n];
        for (new, old) in survivors.iter().enumerate() {
            new_id[old as usize] = Some(new as StateId);
        }
        let remap: Vec<Option<StateId>> = representative
            .iter()
            .map(|&rep| new_id[rep as usize])
            .collect();

        self.compact(&survivors, &remap);
    }

    /// Product automaton accepting the intersection of both languages,
    /// minimized.
    ///
    /// Every pair of states is materialized (pair `(i, j)` has index
    /// `i * other.size() + j`); minimization discards the unreachable ones.
    pub fn intersect(&self, other: &Dfa) -> Dfa {
        let width = other.states.len();
        let pair = |i: StateId, j: StateId| (i as usize * width + j as usize) as StateId;

        let mut product = Dfa {
            states: Vec::with_capacity(self.states.len() * width),
        };
        for left in &self.states {
            for right in &other.states {
                let transitions = left
                    .transitions
                    .iter()
                    .filter_map(|(sym, &l)| right.transitions.get(sym).map(|&r| (*sym, pair(l, r))))
                    .collect();
                product.states.push(DfaState {
                    accepting: left.accepting && right.accepting,
                    transitions,
                });
            }
        }

        product.minimize();
        product
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

impl Default for Dfa {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Dfa {
    /// Graphviz DOT rendering.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (nodes, edges) = self.to_graph();
        let dot = Dot {
            name: "DFA",
            start: self.start_state(),
            accepting: nodes.into_iter().filter(|&s| self.is_accepting(s)).collect(),
            edges,
        };
        write!(f, "{dot}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: SymbolId = b'a' as SymbolId;
    const B: SymbolId = b'b' as SymbolId;

    #[test]
    fn test_dfa_basic() {
        let mut dfa = Dfa::new();
        let s1 = dfa.add_state(false);
        let s2 = dfa.add_state(true);
        dfa.add_transition(0, A, s1);
        dfa.add_transition(s1, B, s2);

        assert_eq!(dfa.size(), 3);
        assert_eq!(dfa.start_state(), 0);
        assert!(!dfa.is_empty());
        assert!(dfa.accepts("ab"));
        assert!(!dfa.accepts("a"));
        assert!(!dfa.accepts("abb"));
        assert!(!dfa.accepts("ba"));
    }

    #[test]
    fn test_add_transition_replaces() {
        let mut dfa = Dfa::new();
        let s1 = dfa.add_state(true);
        let s2 = dfa.add_state(false);
        dfa.add_transition(0, A, s1);
        dfa.add_transition(0, A, s2);
        assert_eq!(dfa.transition(0, A), Some(s2));
        assert_eq!(dfa.transitions().count(), 1);
    }

    #[test]
    fn test_builder_grows_arena() {
        let mut dfa = Dfa::new();
        dfa.add_transition(0, A, 3);
        assert_eq!(dfa.size(), 4);
        assert!(!dfa.is_accepting(3));
        assert!(dfa.is_empty());

        dfa.set_accepting(5, true);
        dfa.add_transition(3, B, 5);
        assert_eq!(dfa.size(), 6);
        assert!(dfa.accepts("ab"));

        dfa.minimize();
        assert_eq!(dfa.size(), 3);
        assert!(dfa.accepts("ab"));
        assert!(!dfa.accepts("a"));
    }

    #[test]
    fn test_dfa_minimization() {
        // 0 -a-> 1 -b-> 3 (final)
        // 0 -b-> 2 -b-> 4 (final)
        // 1 and 2 merge, as do 3 and 4.
        let mut dfa = Dfa::new();
        for accepting in [false, false, true, true] {
            dfa.add_state(accepting);
        }
        dfa.add_transition(0, A, 1);
        dfa.add_transition(0, B, 2);
        dfa.add_transition(1, B, 3);
        dfa.add_transition(2, B, 4);

        dfa.minimize();

        assert_eq!(dfa.size(), 3);
        assert_eq!(dfa.transition(0, A), dfa.transition(0, B));
        assert!(dfa.accepts("ab"));
        assert!(dfa.accepts("bb"));
        assert!(!dfa.accepts("b"));
    }

    #[test]
    fn test_minimize_is_idempotent() {
        let mut dfa = Dfa::from_regex("ab*(c|)").unwrap();
        let once = dfa.clone();
        dfa.minimize();
        assert_eq!(dfa, once);
    }

    #[test]
    fn test_strip_unreachable() {
        let mut dfa = Dfa::new();
        let orphan = dfa.add_state(true);
        let s2 = dfa.add_state(true);
        dfa.add_transition(orphan, A, s2);
        dfa.add_transition(0, B, s2);

        dfa.strip_unreachable();

        assert_eq!(dfa.size(), 2);
        assert_eq!(dfa.transition(0, B), Some(1));
        assert!(dfa.is_accepting(1));
    }

    #[test]
    fn test_empty_dfa() {
        let dfa = Dfa::new();
        assert!(dfa.is_empty());
        assert!(!dfa.accepts(""));

        // Accepting state exists but is unreachable.
        let mut dfa = Dfa::new();
        dfa.add_state(true);
        assert!(dfa.is_empty());
    }

    #[test]
    fn test_intersection_with_disjoint_alphabets() {
        let a = Dfa::from_regex("a").unwrap();
        let b = Dfa::from_regex("b").unwrap();
        let product = a.intersect(&b);
        assert_eq!(product.size(), 1);
        assert!(product.is_empty());
        for input in ["", "a", "b", "hello", "nothing goes"] {
            assert!(!product.accepts(input));
        }
    }

    #[test]
    fn test_dead_states_are_pruned() {
        // ab ∩ ac: after `a` nothing can be accepted any more.
        let product = Dfa::from_regex("ab")
            .unwrap()
            .intersect(&Dfa::from_regex("ac").unwrap());
        assert_eq!(product.size(), 1);
        assert!(!product.accepts("a"));
    }

    #[test]
    fn test_regex_sizes() {
        for (regex, size) in [("0|1*", 3), ("", 1), ("ab*(c|)", 3), ("(0|(1(01*0)*1))*", 3)] {
            assert_eq!(Dfa::from_regex(regex).unwrap().size(), size, "{regex}");
        }
    }

    #[test]
    fn test_accepts_rejects_unknown_symbols() {
        let dfa = Dfa::from_regex("0|1*").unwrap();
        assert!(dfa.accepts(""));
        assert!(dfa.accepts("0"));
        assert!(dfa.accepts("1111"));
        assert!(!dfa.accepts("2"));
        assert!(!dfa.accepts("11112"));
        assert!(!dfa.accepts("01"));
    }

    #[test]
    fn test_dot_rendering() {
        let dfa = Dfa::from_regex("a*").unwrap();
        let expected = "digraph DFA {\n\
                        node [shape = doublecircle]; 0;\n\
                        node [shape = circle];\n\
                        start [shape = point];\n\
                        start -> 0;\n\
                        0 -> 0 [label = \"a\"];\n\
                        }\n";
        assert_eq!(dfa.to_string(), expected);

        let rendered = Dfa::new().to_string();
        assert!(!rendered.contains("doublecircle"));
    }
}
