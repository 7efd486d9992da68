use crate::{State, StateVariable, VarId};
use serde::Serialize;
use std::fmt;

/// A mutually accessible region of the dungeon containing one mechanism which changes a
/// state variable.
///
/// Reversible variables are operated by a single enclave. Irreversible variables get one
/// enclave per increment: the enclave with `stage` k advances the variable from k to k+1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Enclave {
    pub mechanism: StateVariable,
    pub stage: usize,
}

impl Enclave {
    pub fn new(mechanism: StateVariable, stage: usize) -> Self {
        debug_assert!(stage < mechanism.enclave_count());
        Enclave { mechanism, stage }
    }

    /// All enclaves required to operate a variable, in build order
    pub fn stages(mechanism: StateVariable) -> impl Iterator<Item = Enclave> {
        (0..mechanism.enclave_count()).map(move |stage| Enclave { mechanism, stage })
    }

    pub fn var(&self) -> VarId {
        self.mechanism.id
    }

    /// If the mechanism can still change its variable in the given state
    pub fn mutable(&self, state: &State) -> bool {
        self.mechanism.reversible || state.value(self.var()) == self.stage
    }

    /// Values the variable can hold after activating the mechanism once
    pub fn activations(&self, state: &State) -> Vec<usize> {
        if self.mechanism.reversible {
            (0..self.mechanism.cardinality).collect()
        } else if self.mutable(state) {
            vec![self.stage + 1]
        } else {
            vec![]
        }
    }

    /// States obtainable in this enclave from `state`: the unchanged state followed by every
    /// state which differs by one activation.
    pub fn alternates(&self, state: &State) -> Vec<State> {
        let current = state.value(self.var());
        std::iter::once(state.clone())
            .chain(
                self.activations(state)
                    .into_iter()
                    .filter(|&value| value != current)
                    .map(|value| state.with_value(self.mechanism, value)),
            )
            .collect()
    }
}

impl fmt::Display for Enclave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mechanism.enclave_count() > 1 {
            write!(f, "{}{}", self.var(), self.stage + 1)
        } else {
            write!(f, "{}", self.var())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversible_alternates() {
        let var = StateVariable::reversible(VarId::new(0), 3);
        let enclave = Enclave::new(var, 0);
        let s = State::single(var, 1);

        assert!(enclave.mutable(&s));
        let alts = enclave.alternates(&s);
        assert_eq!(alts.len(), 3);
        assert_eq!(alts[0], s);
        assert!(alts.contains(&State::single(var, 0)));
        assert!(alts.contains(&State::single(var, 2)));
    }

    #[test]
    fn test_irreversible_alternates() {
        let var = StateVariable::irreversible(VarId::new(1), 2);
        let enclave = Enclave::new(var, 0);

        let s0 = State::single(var, 0);
        assert!(enclave.mutable(&s0));
        assert_eq!(enclave.alternates(&s0), vec![s0.clone(), State::single(var, 1)]);

        let s1 = State::single(var, 1);
        assert!(!enclave.mutable(&s1));
        assert_eq!(enclave.alternates(&s1), vec![s1]);
    }

    #[test]
    fn test_irreversible_stages() {
        let var = StateVariable::irreversible(VarId::new(2), 4);
        let stages: Vec<_> = Enclave::stages(var).collect();
        assert_eq!(stages.len(), 3);
        assert_eq!(stages[0].to_string(), "C1");
        assert_eq!(stages[2].to_string(), "C3");

        let s = State::single(var, 1);
        assert!(!stages[0].mutable(&s));
        assert!(stages[1].mutable(&s));
        assert_eq!(stages[1].activations(&s), vec![2]);
        assert!(stages[2].activations(&s).is_empty());
    }

    #[test]
    fn test_unknown_variable_is_at_baseline() {
        let var = StateVariable::irreversible(VarId::new(0), 2);
        let enclave = Enclave::new(var, 0);
        assert!(enclave.mutable(&State::new()));
        assert_eq!(enclave.alternates(&State::new()).len(), 2);
    }
}
