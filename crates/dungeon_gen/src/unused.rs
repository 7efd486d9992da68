use crate::{Dungeon, StateVariable, VarId};
use std::collections::HashSet;

/// Variables which no doorway depends on. Their mechanisms are never required to progress and
/// can be wired into optional paths by a designer.
pub fn unused_variables(dungeon: &Dungeon) -> Vec<StateVariable> {
    let used: HashSet<VarId> = dungeon
        .doorways()
        .flat_map(|(_, doorway, _)| doorway.label.iter().map(|e| e.var.id))
        .collect();

    dungeon
        .variables()
        .into_iter()
        .filter(|var| !used.contains(&var.id))
        .collect()
}
