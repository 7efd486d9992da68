use crate::{Enclave, State, StateVariable, VarId};
use petgraph::{
    Direction,
    graph::{DiGraph, EdgeIndex, NodeIndex},
    visit::EdgeRef,
};
use std::ops::Deref;

/// Passage between two enclaves which can only be crossed if the state satisfies the label
#[derive(Debug, Clone, PartialEq)]
pub struct Doorway {
    /// Partial state required to cross. An empty label is always open.
    pub label: State,

    /// One-way doorways can only be crossed from source to destination
    pub directed: bool,
}

impl Doorway {
    pub fn two_way(label: State) -> Self {
        Doorway {
            label,
            directed: false,
        }
    }

    pub fn one_way(label: State) -> Self {
        Doorway {
            label,
            directed: true,
        }
    }

    pub fn is_unconditional(&self) -> bool {
        self.label.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnclaveId(NodeIndex);

impl Deref for EnclaveId {
    type Target = NodeIndex;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DoorwayId(EdgeIndex);

impl Deref for DoorwayId {
    type Target = EdgeIndex;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

type EnclaveGraph = DiGraph<Enclave, Doorway>;

/// Enclaves connected by doorways. Grows monotonically while a dungeon is generated.
#[derive(Debug, Clone, Default)]
pub struct Dungeon {
    graph: EnclaveGraph,
}

impl Dungeon {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_enclave(&mut self, enclave: Enclave) -> EnclaveId {
        EnclaveId(self.graph.add_node(enclave))
    }

    /// Adds a doorway which can be crossed in both directions
    pub fn add_doorway(&mut self, src: EnclaveId, dst: EnclaveId, label: State) -> DoorwayId {
        self.connect(src, dst, Doorway::two_way(label))
    }

    /// Adds a doorway which can only be crossed from `src` to `dst`
    pub fn add_one_way(&mut self, src: EnclaveId, dst: EnclaveId, label: State) -> DoorwayId {
        self.connect(src, dst, Doorway::one_way(label))
    }

    pub fn connect(&mut self, src: EnclaveId, dst: EnclaveId, doorway: Doorway) -> DoorwayId {
        DoorwayId(self.graph.add_edge(*src, *dst, doorway))
    }

    pub fn enclave(&self, id: EnclaveId) -> &Enclave {
        &self.graph[*id]
    }

    pub fn doorway(&self, id: DoorwayId) -> &Doorway {
        &self.graph[*id]
    }

    pub fn enclave_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn doorway_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// The enclave where the player starts
    pub fn first_enclave(&self) -> Option<EnclaveId> {
        self.graph.node_indices().next().map(EnclaveId)
    }

    pub fn enclave_ids(&self) -> impl Iterator<Item = EnclaveId> + '_ {
        self.graph.node_indices().map(EnclaveId)
    }

    pub fn enclaves(&self) -> impl Iterator<Item = (EnclaveId, &Enclave)> + '_ {
        self.graph
            .node_indices()
            .map(|ix| (EnclaveId(ix), &self.graph[ix]))
    }

    /// All doorways as (source, doorway, destination) in insertion order
    pub fn doorways(&self) -> impl Iterator<Item = (EnclaveId, &Doorway, EnclaveId)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (EnclaveId(e.source()), e.weight(), EnclaveId(e.target())))
    }

    pub fn find_enclave(&self, var: VarId, stage: usize) -> Option<EnclaveId> {
        self.enclaves()
            .find(|(_, e)| e.var() == var && e.stage == stage)
            .map(|(id, _)| id)
    }

    /// Every doorway which can be crossed when leaving `from` together with the enclave on
    /// the other side.
    pub fn crossings(&self, from: EnclaveId) -> impl Iterator<Item = (&Doorway, EnclaveId)> + '_ {
        let outgoing = self
            .graph
            .edges_directed(*from, Direction::Outgoing)
            .map(|e| (e.weight(), EnclaveId(e.target())));

        let incoming = self
            .graph
            .edges_directed(*from, Direction::Incoming)
            .filter(|e| !e.weight().directed)
            .map(move |e| {
                let other = if e.source() == *from {
                    e.target()
                } else {
                    e.source()
                };
                (e.weight(), EnclaveId(other))
            });

        outgoing.chain(incoming)
    }

    /// Variables operated by the enclaves of this dungeon in order of appearance
    pub fn variables(&self) -> Vec<StateVariable> {
        let mut out: Vec<StateVariable> = Vec::new();
        for (_, enclave) in self.enclaves() {
            if !out.iter().any(|v| v.id == enclave.var()) {
                out.push(enclave.mechanism);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(i: usize) -> StateVariable {
        StateVariable::reversible(VarId::new(i), 2)
    }

    #[test]
    fn test_crossings_respect_direction() {
        let mut dungeon = Dungeon::new();
        let a = dungeon.add_enclave(Enclave::new(var(0), 0));
        let b = dungeon.add_enclave(Enclave::new(var(1), 0));
        let c = dungeon.add_enclave(Enclave::new(var(2), 0));

        dungeon.add_doorway(a, b, State::single(var(0), 1));
        dungeon.add_one_way(b, c, State::new());

        let from_a: Vec<_> = dungeon.crossings(a).map(|(_, n)| n).collect();
        assert_eq!(from_a, vec![b]);

        let mut from_b: Vec<_> = dungeon.crossings(b).map(|(_, n)| n).collect();
        from_b.sort();
        assert_eq!(from_b, vec![a, c]);

        assert_eq!(dungeon.crossings(c).count(), 0);
    }

    #[test]
    fn test_parallel_doorways() {
        let mut dungeon = Dungeon::new();
        let a = dungeon.add_enclave(Enclave::new(var(0), 0));
        let b = dungeon.add_enclave(Enclave::new(var(1), 0));

        let d0 = dungeon.add_doorway(a, b, State::single(var(0), 0));
        let d1 = dungeon.add_doorway(a, b, State::single(var(0), 1));

        assert_eq!(dungeon.doorway_count(), 2);
        assert_ne!(d0, d1);
        assert_eq!(dungeon.doorway(d0).label, State::single(var(0), 0));
        assert_eq!(dungeon.doorway(d1).label, State::single(var(0), 1));
        assert_eq!(dungeon.crossings(b).count(), 2);
    }

    #[test]
    fn test_variables_in_order() {
        let mut dungeon = Dungeon::new();
        let c = StateVariable::irreversible(VarId::new(2), 3);
        dungeon.add_enclave(Enclave::new(var(0), 0));
        dungeon.add_enclave(Enclave::new(c, 0));
        dungeon.add_enclave(Enclave::new(c, 1));

        assert_eq!(dungeon.variables(), vec![var(0), c]);
        assert_eq!(dungeon.find_enclave(VarId::new(2), 1).map(|id| id.index()), Some(2));
        assert_eq!(dungeon.first_enclave().map(|id| id.index()), Some(0));
    }
}
