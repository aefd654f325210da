//! Subset construction for converting an ε-NFA to a DFA.
//!
//! Epsilon cycles are collapsed first: the strongly connected components of
//! the epsilon-only subgraph become *epsilon-classes*, each class gets its
//! epsilon closure once, and the powerset construction then runs over sets
//! of classes whose symbol moves are already closure-saturated.

use crate::dfa::Dfa;
use crate::nfa::Nfa;
use crate::state::{StateId, StateSet};
use crate::symbol::{EPSILON, SymbolId, is_epsilon};
use indexmap::IndexSet;
use std::collections::BTreeMap;

/// Class index assigned to NFA states not yet placed in a component.
const UNASSIGNED: usize = usize::MAX;

/// The NFA condensed over strongly connected epsilon components.
#[derive(Debug)]
pub(crate) struct EpsilonClasses {
    /// Component of every NFA state. Components are numbered in topological
    /// order of the condensed epsilon graph: epsilon edges only go from a
    /// class to itself or to a higher class.
    class_of: Vec<usize>,
    /// Classes from which an accepting state is epsilon-reachable.
    accepting: StateSet,
    /// Epsilon closure of every class, itself included.
    closures: Vec<StateSet>,
    /// Symbol moves of every class, saturated with the destination closures.
    moves: Vec<BTreeMap<SymbolId, StateSet>>,
}

impl EpsilonClasses {
    pub(crate) fn new(nfa: &Nfa) -> Self {
        let (class_of, count) = epsilon_components(nfa);

        let mut accepting = vec![false; count];
        let mut successors = vec![StateSet::with_capacity(count); count];
        let mut moves: Vec<BTreeMap<SymbolId, StateSet>> = vec![BTreeMap::new(); count];

        for (state, transitions) in (0..nfa.size() as StateId).map(|s| (s, nfa.outgoing(s))) {
            let class = class_of[state as usize];
            accepting[class] |= nfa.is_accepting(state);
            for (&symbol, dests) in transitions {
                for &dest in dests {
                    let target = class_of[dest as usize];
                    if is_epsilon(symbol) {
                        if target != class {
                            successors[class].insert(target as StateId);
                        }
                    } else {
                        moves[class]
                            .entry(symbol)
                            .or_insert_with(|| StateSet::with_capacity(count))
                            .insert(target as StateId);
                    }
                }
            }
        }

        // Reverse topological order: every successor's closure is final by
        // the time its predecessors are visited.
        let mut closures = vec![StateSet::with_capacity(count); count];
        for class in (0..count).rev() {
            let mut closure = StateSet::singleton(class as StateId, count);
            for next in successors[class].iter() {
                debug_assert!(next as usize > class, "epsilon classes out of order");
                closure.union_with(&closures[next as usize]);
                let reaches_final = accepting[next as usize];
                accepting[class] |= reaches_final;
            }
            closures[class] = closure;
        }

        for class_moves in &mut moves {
            for targets in class_moves.values_mut() {
                let mut saturated = StateSet::with_capacity(count);
                for target in targets.iter() {
                    saturated.union_with(&closures[target as usize]);
                }
                *targets = saturated;
            }
        }

        Self {
            class_of,
            accepting: (0..count as StateId)
                .filter(|&class| accepting[class as usize])
                .collect(),
            closures,
            moves,
        }
    }

    /// Number of epsilon-classes.
    pub(crate) fn len(&self) -> usize {
        self.closures.len()
    }

    /// Closure of the class containing `state`.
    pub(crate) fn closure_of_state(&self, state: StateId) -> &StateSet {
        &self.closures[self.class_of[state as usize]]
    }

    /// Whether any class in `subset` reaches an accepting state.
    pub(crate) fn is_accepting(&self, subset: &StateSet) -> bool {
        subset.intersects(&self.accepting)
    }

    /// Successor subsets of `subset`, per symbol. Empty targets are omitted.
    fn step(&self, subset: &StateSet) -> BTreeMap<SymbolId, StateSet> {
        let mut next: BTreeMap<SymbolId, StateSet> = BTreeMap::new();
        for class in subset.iter() {
            for (&symbol, targets) in &self.moves[class as usize] {
                next.entry(symbol)
                    .or_insert_with(|| StateSet::with_capacity(self.len()))
                    .union_with(targets);
            }
        }
        next.retain(|_, targets| !targets.is_empty());
        next
    }
}

fn epsilon_edges(nfa: &Nfa, state: StateId) -> &[StateId] {
    nfa.outgoing(state)
        .get(&EPSILON)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Kosaraju's algorithm over the epsilon-only subgraph, iteratively.
///
/// Returns the component of every state and the number of components.
/// Components come out in topological order of the condensation.
fn epsilon_components(nfa: &Nfa) -> (Vec<usize>, usize) {
    let n = nfa.size();
    let edges = |state: StateId| epsilon_edges(nfa, state);

    let mut reverse: Vec<Vec<StateId>> = vec![Vec::new(); n];
    for state in 0..n as StateId {
        for &dest in edges(state) {
            reverse[dest as usize].push(state);
        }
    }

    // First pass: finishing order on the forward graph.
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for root in 0..n as StateId {
        if visited[root as usize] {
            continue;
        }
        visited[root as usize] = true;
        let mut stack = vec![(root, 0usize)];
        while let Some(&(state, next)) = stack.last() {
            match edges(state).get(next) {
                Some(&dest) => {
                    let top = stack.len() - 1;
                    stack[top].1 += 1;
                    if !visited[dest as usize] {
                        visited[dest as usize] = true;
                        stack.push((dest, 0));
                    }
                }
                None => {
                    order.push(state);
                    stack.pop();
                }
            }
        }
    }

    // Second pass: components on the transposed graph, latest finisher first.
    let mut class_of = vec![UNASSIGNED; n];
    let mut count = 0;
    for &root in order.iter().rev() {
        if class_of[root as usize] != UNASSIGNED {
            continue;
        }
        class_of[root as usize] = count;
        let mut stack = vec![root];
        while let Some(state) = stack.pop() {
            for &prev in &reverse[state as usize] {
                if class_of[prev as usize] == UNASSIGNED {
                    class_of[prev as usize] = count;
                    stack.push(prev);
                }
            }
        }
        count += 1;
    }

    (class_of, count)
}

/// Convert an epsilon-NFA to a DFA using the powerset construction over
/// epsilon-classes. The result is not minimized.
///
/// DFA state ids follow discovery order; the start state is 0.
pub fn subset_construction(nfa: &Nfa) -> Dfa {
    let classes = EpsilonClasses::new(nfa);

    // Each DFA state corresponds to a set of epsilon-classes; its position
    // in `subsets` is its DFA state id.
    let mut subsets: IndexSet<StateSet> = IndexSet::new();
    let initial = classes.closure_of_state(nfa.start_state()).clone();

    let mut dfa = Dfa::new();
    dfa.set_accepting(dfa.start_state(), classes.is_accepting(&initial));
    subsets.insert(initial);

    let mut current = 0;
    while let Some(subset) = subsets.get_index(current) {
        let moves = classes.step(subset);
        for (symbol, target) in moves {
            let destination = match subsets.get_index_of(&target) {
                Some(existing) => existing as StateId,
                None => {
                    let id = dfa.add_state(classes.is_accepting(&target));
                    subsets.insert(target);
                    id
                }
            };
            dfa.add_transition(current as StateId, symbol, destination);
        }
        current += 1;
    }

    dfa
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::from_byte;

    #[test]
    fn test_epsilon_cycle_collapses_to_one_class() {
        // 0 -ε-> 1 -ε-> 2 -ε-> 0, 2 -a-> 3 (final)
        let mut nfa = Nfa::new();
        nfa.set_accepting(0, false);
        nfa.add_epsilon_transition(0, 1);
        nfa.add_epsilon_transition(1, 2);
        nfa.add_epsilon_transition(2, 0);
        nfa.add_transition(2, from_byte(b'a'), 3);
        nfa.set_accepting(3, true);

        let classes = EpsilonClasses::new(&nfa);
        assert_eq!(classes.len(), 2);
        assert_eq!(classes.class_of[0], classes.class_of[1]);
        assert_eq!(classes.class_of[1], classes.class_of[2]);
        assert_ne!(classes.class_of[2], classes.class_of[3]);
        assert!(!classes.is_accepting(classes.closure_of_state(0)));
        assert!(classes.is_accepting(classes.closure_of_state(3)));
    }

    #[test]
    fn test_classes_are_topologically_numbered() {
        // 0 -ε-> 1 -ε-> 2 (final)
        let mut nfa = Nfa::new();
        nfa.set_accepting(0, false);
        nfa.add_epsilon_transition(0, 1);
        nfa.add_epsilon_transition(1, 2);
        nfa.set_accepting(2, true);

        let classes = EpsilonClasses::new(&nfa);
        assert_eq!(classes.len(), 3);
        assert!(classes.class_of[0] < classes.class_of[1]);
        assert!(classes.class_of[1] < classes.class_of[2]);
        // acceptance propagates backwards along the closure
        assert!(classes.is_accepting(classes.closure_of_state(0)));
        assert_eq!(classes.closure_of_state(0).len(), 3);
    }

    #[test]
    fn test_subset_construction_basic() {
        // 0 -a-> 1, 0 -a-> 2, 1 -b-> 3 (final), 2 -b-> 3
        let mut nfa = Nfa::new();
        nfa.set_accepting(0, false);
        nfa.add_transition(0, from_byte(b'a'), 1);
        nfa.add_transition(0, from_byte(b'a'), 2);
        nfa.add_transition(1, from_byte(b'b'), 3);
        nfa.add_transition(2, from_byte(b'b'), 3);
        nfa.set_accepting(3, true);

        let dfa = subset_construction(&nfa);
        assert_eq!(dfa.size(), 3);
        assert!(dfa.accepts("ab"));
        assert!(!dfa.accepts("a"));
        assert!(!dfa.accepts("abb"));
    }

    #[test]
    fn test_subset_construction_with_epsilon() {
        // 0 -ε-> 1 -a-> 2 (final)
        let mut nfa = Nfa::new();
        nfa.set_accepting(0, false);
        nfa.add_epsilon_transition(0, 1);
        nfa.add_transition(1, from_byte(b'a'), 2);
        nfa.set_accepting(2, true);

        let dfa = subset_construction(&nfa);
        assert_eq!(dfa.size(), 2);
        assert!(!dfa.is_accepting(0));
        assert_eq!(dfa.transition(0, from_byte(b'a')), Some(1));
        assert!(dfa.is_accepting(1));
    }

    #[test]
    fn test_single_accepting_state() {
        let dfa = subset_construction(&Nfa::new());
        assert_eq!(dfa.size(), 1);
        assert!(dfa.accepts(""));
        assert!(!dfa.accepts("x"));
    }

    #[test]
    fn test_nested_stars_match_nfa_simulation() {
        let nfa = Nfa::from_regex("(0|(1(01*0)*1))*").unwrap();
        let dfa = subset_construction(&nfa);
        for n in 0u32..200 {
            let bits = format!("{n:b}");
            assert_eq!(dfa.accepts(&bits), nfa.accepts(&bits), "{bits}");
            assert_eq!(dfa.accepts(&bits), n % 3 == 0, "{bits}");
        }
        assert!(dfa.accepts(""));
    }

    #[test]
    fn test_optional_under_star_has_epsilon_cycle() {
        // The empty branch loops straight back to the body start.
        let nfa = Nfa::from_regex("(a|)*").unwrap();
        let classes = EpsilonClasses::new(&nfa);
        assert!(classes.len() < nfa.size());

        let dfa = subset_construction(&nfa);
        assert!(dfa.accepts(""));
        assert!(dfa.accepts("aaa"));
        assert!(!dfa.accepts("b"));
    }
}
