use crate::{Dungeon, EnclaveId, State};
use rand::{Rng, seq::SliceRandom};
use std::collections::{HashSet, VecDeque};

/// A node in the product space of enclaves and states
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub enclave: EnclaveId,
    pub state: State,
}

impl Position {
    pub fn new(enclave: EnclaveId, state: State) -> Self {
        Position { enclave, state }
    }
}

/// Explicit-state search over (enclave, state) pairs of a dungeon.
///
/// A move activates the mechanism of the current enclave (or leaves it alone) and then crosses
/// a doorway whose label is satisfied by the resulting state.
pub struct Reachability<'a> {
    dungeon: &'a Dungeon,
}

impl<'a> Reachability<'a> {
    pub fn new(dungeon: &'a Dungeon) -> Self {
        Reachability { dungeon }
    }

    /// Positions reachable with a single move
    pub fn successors(&self, position: &Position) -> Vec<Position> {
        let enclave = self.dungeon.enclave(position.enclave);
        let mut out = vec![];
        for alternate in enclave.alternates(&position.state) {
            for (doorway, neighbor) in self.dungeon.crossings(position.enclave) {
                if alternate.satisfies(&doorway.label) {
                    out.push(Position::new(neighbor, alternate.merge(&doorway.label)));
                }
            }
        }
        out
    }

    /// All positions reachable from `start` including `start` itself, in breadth-first order.
    pub fn accessible_from(&self, start: &Position) -> Vec<Position> {
        let mut visited = HashSet::new();
        let mut order = vec![start.clone()];
        visited.insert(start.clone());

        let mut q = VecDeque::new();
        q.push_back(start.clone());

        while let Some(current) = q.pop_front() {
            for next in self.successors(&current) {
                if visited.insert(next.clone()) {
                    order.push(next.clone());
                    q.push_back(next);
                }
            }
        }

        log::trace!(
            "{} positions accessible from {} {}",
            order.len(),
            self.dungeon.enclave(start.enclave),
            start.state
        );

        order
    }

    /// Every state in which `dst` can be reached from `start`
    pub fn states_reaching(&self, start: &Position, dst: EnclaveId) -> Vec<State> {
        self.accessible_from(start)
            .into_iter()
            .filter(|p| p.enclave == dst)
            .map(|p| p.state)
            .collect()
    }

    /// One randomly selected state in which `dst` can be reached, or None if `dst` is
    /// unreachable.
    pub fn state_reaching<R: Rng + ?Sized>(
        &self,
        start: &Position,
        dst: EnclaveId,
        rng: &mut R,
    ) -> Option<State> {
        self.states_reaching(start, dst).choose(rng).cloned()
    }

    pub fn reaches(&self, start: &Position, dst: EnclaveId) -> bool {
        self.accessible_from(start).iter().any(|p| p.enclave == dst)
    }

    /// Checks that the player can travel from `start` to `dst`, arrive there with `extra`
    /// satisfied (possibly picking it up on the way) and return to the start enclave while
    /// `extra` still holds.
    pub fn loop_feasible(&self, start: &Position, dst: EnclaveId, extra: &State) -> bool {
        let src = start.enclave;

        // The flag marks the return leg of the trip
        let mut visited = HashSet::new();
        let mut q = VecDeque::new();
        let first = (false, start.clone());
        visited.insert(first.clone());
        q.push_back(first);

        while let Some((returning, current)) = q.pop_front() {
            let returning = returning || (current.enclave == dst && current.state.satisfies(extra));
            if returning && current.enclave == src && current.state.satisfies(extra) {
                return true;
            }

            for next in self.successors(&current) {
                let item = (returning, next);
                if visited.insert(item.clone()) {
                    q.push_back(item);
                }
            }
        }

        false
    }

    /// True if `dst` is unreachable from `start`, or if a round trip to `dst` keeping `extra`
    /// is possible. Runs the round trip search only when a single search can not decide.
    pub fn keeps_reachable(&self, start: &Position, dst: EnclaveId, extra: &State) -> bool {
        let reached = self.accessible_from(start);
        if !reached.iter().any(|p| p.enclave == dst) {
            return true;
        }
        if !reached
            .iter()
            .any(|p| p.enclave == dst && p.state.satisfies(extra))
        {
            return false;
        }
        self.loop_feasible(start, dst, extra)
    }

    /// Checks the construction guarantee: starting in the first enclave with `initial` every
    /// enclave can be visited and every doorway can be crossed.
    pub fn is_solvable(&self, initial: &State) -> bool {
        let Some(first) = self.dungeon.first_enclave() else {
            return true;
        };

        let reached = self.accessible_from(&Position::new(first, initial.clone()));

        let all_visited = self
            .dungeon
            .enclave_ids()
            .all(|id| reached.iter().any(|p| p.enclave == id));

        let all_crossable = self.dungeon.doorways().all(|(src, doorway, dst)| {
            reached.iter().any(|p| {
                let at_side = p.enclave == src || (!doorway.directed && p.enclave == dst);
                at_side
                    && self
                        .dungeon
                        .enclave(p.enclave)
                        .alternates(&p.state)
                        .iter()
                        .any(|s| s.satisfies(&doorway.label))
            })
        });

        all_visited && all_crossable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Enclave, StateVariable, VarId};

    /// A (reversible, 2) -- {A:T} -- B (irreversible, 2) -- {B:T} -- C (reversible, 3)
    fn chain() -> (Dungeon, [EnclaveId; 3], [StateVariable; 3]) {
        let va = StateVariable::reversible(VarId::new(0), 2);
        let vb = StateVariable::irreversible(VarId::new(1), 2);
        let vc = StateVariable::reversible(VarId::new(2), 3);

        let mut dungeon = Dungeon::new();
        let a = dungeon.add_enclave(Enclave::new(va, 0));
        let b = dungeon.add_enclave(Enclave::new(vb, 0));
        let c = dungeon.add_enclave(Enclave::new(vc, 0));
        dungeon.add_doorway(a, b, State::single(va, 1));
        dungeon.add_doorway(b, c, State::single(vb, 1));

        (dungeon, [a, b, c], [va, vb, vc])
    }

    #[test]
    fn test_accessible_from() {
        let (dungeon, [a, b, c], vars) = chain();
        let reach = Reachability::new(&dungeon);
        let start = Position::new(a, State::initial(vars));

        let reached = reach.accessible_from(&start);
        assert_eq!(reached[0], start);
        assert!(reached.iter().any(|p| p.enclave == b));
        assert!(reached.iter().any(|p| p.enclave == c));

        // C is only ever reached with B advanced
        for s in reach.states_reaching(&start, c) {
            assert_eq!(s.value(vars[1].id), 1);
            assert_eq!(s.value(vars[0].id), 1);
        }
    }

    #[test]
    fn test_unreachable() {
        let (mut dungeon, [a, _, _], vars) = chain();
        let d = dungeon.add_enclave(Enclave::new(StateVariable::reversible(VarId::new(3), 2), 0));
        let reach = Reachability::new(&dungeon);
        let start = Position::new(a, State::initial(vars));

        let mut rng = rand::thread_rng();
        assert!(reach.state_reaching(&start, d, &mut rng).is_none());
        assert!(!reach.reaches(&start, d));
        assert!(!reach.is_solvable(&State::initial(vars)));
    }

    #[test]
    fn test_directed_doorway() {
        let (mut dungeon, [a, _, c], vars) = chain();
        let d = dungeon.add_enclave(Enclave::new(StateVariable::reversible(VarId::new(3), 2), 0));
        dungeon.add_one_way(d, a, State::new());
        let reach = Reachability::new(&dungeon);

        assert!(!reach.reaches(&Position::new(a, State::initial(vars)), d));
        assert!(reach.reaches(&Position::new(d, State::initial(vars)), c));
    }

    #[test]
    fn test_loop_feasible() {
        let (dungeon, [a, b, c], vars) = chain();
        let reach = Reachability::new(&dungeon);
        let start = Position::new(a, State::initial(vars));

        // going to B and back keeping A raised works
        assert!(reach.loop_feasible(&start, b, &State::single(vars[0], 1)));

        // reaching C requires A raised, so C cannot be visited with A lowered
        assert!(!reach.loop_feasible(&start, c, &State::single(vars[0], 0)));

        // trivial loop
        assert!(reach.loop_feasible(&start, a, &State::new()));
    }

    #[test]
    fn test_keeps_reachable() {
        let (mut dungeon, [a, b, c], vars) = chain();
        let d = dungeon.add_enclave(Enclave::new(StateVariable::reversible(VarId::new(3), 2), 0));
        let reach = Reachability::new(&dungeon);
        let start = Position::new(a, State::initial(vars));

        // unreachable destinations do not constrain
        assert!(reach.keeps_reachable(&start, d, &State::single(vars[0], 0)));

        // C is reachable, but never with A lowered
        assert!(!reach.keeps_reachable(&start, c, &State::single(vars[0], 0)));

        for (dst, extra) in [
            (b, State::single(vars[0], 1)),
            (c, State::single(vars[1], 1)),
            (a, State::new()),
        ] {
            assert_eq!(
                reach.keeps_reachable(&start, dst, &extra),
                reach.loop_feasible(&start, dst, &extra)
            );
        }
    }

    #[test]
    fn test_one_way_trip_is_not_a_loop() {
        let va = StateVariable::reversible(VarId::new(0), 2);
        let vb = StateVariable::reversible(VarId::new(1), 2);
        let mut dungeon = Dungeon::new();
        let a = dungeon.add_enclave(Enclave::new(va, 0));
        let b = dungeon.add_enclave(Enclave::new(vb, 0));
        dungeon.add_one_way(a, b, State::new());

        let reach = Reachability::new(&dungeon);
        let start = Position::new(a, State::initial([va, vb]));
        assert!(reach.reaches(&start, b));
        assert!(!reach.loop_feasible(&start, b, &State::new()));
    }

    #[test]
    fn test_chain_is_solvable() {
        let (dungeon, _, vars) = chain();
        assert!(Reachability::new(&dungeon).is_solvable(&State::initial(vars)));
    }
}
