use crate::GenError;
use serde::{Serialize, Serializer};
use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

/// Identifier of a state variable. Displayed as a letter: the first variable is `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn new(index: usize) -> Self {
        VarId(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// Description of a single state variable. Values are not stored here but in [`State`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StateVariable {
    pub id: VarId,

    /// Number of distinct values: the variable takes values in `0..cardinality`
    pub cardinality: usize,

    /// Reversible variables can be set to any value at any time. Irreversible variables only
    /// ever advance.
    pub reversible: bool,
}

impl StateVariable {
    pub fn reversible(id: VarId, cardinality: usize) -> Self {
        StateVariable {
            id,
            cardinality,
            reversible: true,
        }
    }

    pub fn irreversible(id: VarId, cardinality: usize) -> Self {
        StateVariable {
            id,
            cardinality,
            reversible: false,
        }
    }

    pub fn is_binary(&self) -> bool {
        self.cardinality == 2
    }

    /// Number of enclaves needed to operate this variable over its full range. An irreversible
    /// variable gets one enclave per increment.
    pub fn enclave_count(&self) -> usize {
        if self.reversible {
            1
        } else {
            self.cardinality - 1
        }
    }

    /// Compact value notation: binary variables are `F`/`T`, all others use digits.
    pub fn format_value(&self, value: usize) -> String {
        match (self.is_binary(), value) {
            (true, 0) => "F".into(),
            (true, 1) => "T".into(),
            _ => value.to_string(),
        }
    }
}

/// Shorthand descriptor of a requested variable: `r5` is reversible with 5 values, `i2` is
/// irreversible with 2 values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableSpec {
    pub reversible: bool,
    pub cardinality: usize,
}

impl VariableSpec {
    pub const MAX_CARDINALITY: usize = 255;

    pub fn reversible(cardinality: usize) -> Self {
        VariableSpec {
            reversible: true,
            cardinality,
        }
    }

    pub fn irreversible(cardinality: usize) -> Self {
        VariableSpec {
            reversible: false,
            cardinality,
        }
    }

    pub fn assign(self, id: VarId) -> StateVariable {
        StateVariable {
            id,
            cardinality: self.cardinality,
            reversible: self.reversible,
        }
    }
}

impl FromStr for VariableSpec {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| GenError::InvalidDescriptor {
            descriptor: s.to_string(),
            reason: reason.to_string(),
        };

        let mut chars = s.chars();
        let reversible = match chars.next().map(|c| c.to_ascii_lowercase()) {
            Some('r') => true,
            Some('i') => false,
            Some(_) => return Err(invalid("expected prefix 'r' (reversible) or 'i' (irreversible)")),
            None => return Err(invalid("empty descriptor")),
        };

        let digits = chars.as_str();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected the number of values after the prefix"));
        }

        let cardinality: usize = digits
            .parse()
            .map_err(|_| invalid("number of values is too large"))?;
        if cardinality < 2 {
            return Err(invalid("a variable needs at least 2 values"));
        }
        if cardinality > Self::MAX_CARDINALITY {
            return Err(invalid("number of values is too large"));
        }

        Ok(VariableSpec {
            reversible,
            cardinality,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StateEntry {
    pub var: StateVariable,
    pub value: usize,
}

/// Immutable assignment of values to variables. Variables which are not listed are unknown
/// to the state; mechanisms treat them as being at their baseline value 0.
///
/// Entries keep the position in which a variable was first seen. Equality and hashing only
/// consider the set of (variable, value) pairs.
#[derive(Debug, Clone, Default)]
pub struct State {
    entries: Vec<StateEntry>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later entries for the same variable override the value but keep the original position.
    pub fn from_entries(entries: impl IntoIterator<Item = StateEntry>) -> Self {
        let mut out: Vec<StateEntry> = Vec::new();
        for entry in entries {
            match out.iter_mut().find(|e| e.var.id == entry.var.id) {
                Some(existing) => *existing = entry,
                None => out.push(entry),
            }
        }
        State { entries: out }
    }

    /// All variables at their baseline value 0
    pub fn initial(vars: impl IntoIterator<Item = StateVariable>) -> Self {
        Self::from_entries(vars.into_iter().map(|var| StateEntry { var, value: 0 }))
    }

    pub fn single(var: StateVariable, value: usize) -> Self {
        State {
            entries: vec![StateEntry { var, value }],
        }
    }

    /// Last write wins: values in `other` override values in `self`.
    pub fn merge(&self, other: &State) -> State {
        Self::from_entries(self.entries.iter().chain(other.entries.iter()).copied())
    }

    pub fn with_value(&self, var: StateVariable, value: usize) -> State {
        self.merge(&State::single(var, value))
    }

    pub fn get(&self, id: VarId) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.var.id == id)
            .map(|e| e.value)
    }

    /// Value of a variable with unknown variables at baseline
    pub fn value(&self, id: VarId) -> usize {
        self.get(id).unwrap_or(0)
    }

    pub fn contains(&self, id: VarId) -> bool {
        self.get(id).is_some()
    }

    /// True if every variable in `target` is present in `self` with the same value.
    pub fn satisfies(&self, target: &State) -> bool {
        target
            .entries
            .iter()
            .all(|t| self.get(t.var.id) == Some(t.value))
    }

    /// Keeps reversible variables and irreversible variables which left their baseline.
    pub fn relevant(&self) -> State {
        State {
            entries: self
                .entries
                .iter()
                .filter(|e| e.var.reversible || e.value != 0)
                .copied()
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &StateEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn sorted_pairs(&self) -> Vec<(VarId, usize)> {
        let mut pairs: Vec<_> = self.entries.iter().map(|e| (e.var.id, e.value)).collect();
        pairs.sort_unstable();
        pairs
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        // ids are unique within a state
        self.len() == other.len() && self.satisfies(other)
    }
}

impl Eq for State {}

impl Hash for State {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sorted_pairs().hash(state);
    }
}

// Display

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match u8::try_from(self.0) {
            Ok(i) if i < 26 => write!(f, "{}", (b'A' + i) as char),
            _ => write!(f, "V{}", self.0),
        }
    }
}

impl fmt::Display for VariableSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.reversible { 'r' } else { 'i' };
        write!(f, "{prefix}{}", self.cardinality)
    }
}

impl fmt::Display for StateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.var.id, self.var.format_value(self.value))
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{entry}")?;
        }
        write!(f, "}}")
    }
}

impl Serialize for VarId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|e| (e.var.id, e.value)))
    }
}
