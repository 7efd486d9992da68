use crate::{
    Doorway, Dungeon, Enclave, EnclaveId, GenError, Position, Reachability, Result, State,
    StateVariable, VarId, VariableSpec, unused_variables,
};
use rand::{Rng, seq::SliceRandom};
use serde::Serialize;
use std::{collections::VecDeque, fmt};

/// One variable per display letter
pub const MAX_VARIABLES: usize = 26;

/// Number of arrival states tried per intermediate gate before the gate is skipped
const ARRIVAL_ATTEMPTS: usize = 8;

/// How the builder picks a value when it operates a reversible mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReactivationPolicy {
    /// The mechanism may be set to the value it already has
    #[default]
    MayRepeat,

    /// The mechanism is always set to a different value
    MustChange,
}

impl ReactivationPolicy {
    pub fn choices(&self, enclave: &Enclave, state: &State) -> Vec<usize> {
        let values = enclave.activations(state);
        match self {
            ReactivationPolicy::MayRepeat => values,
            ReactivationPolicy::MustChange => {
                let current = state.value(enclave.var());
                values.into_iter().filter(|&v| v != current).collect()
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    pub reactivation: ReactivationPolicy,

    /// Gates leading to newly placed enclaves can not be crossed backwards
    pub one_way_gates: bool,
}

impl GeneratorConfig {
    pub fn with_reactivation(mut self, reactivation: ReactivationPolicy) -> Self {
        self.reactivation = reactivation;
        self
    }

    pub fn with_one_way_gates(mut self, one_way_gates: bool) -> Self {
        self.one_way_gates = one_way_gates;
        self
    }
}

/// Rejects requests which can not be generated. Runs before any enclave is created.
pub fn validate_request(specs: &[VariableSpec]) -> Result<()> {
    if specs.is_empty() {
        return Err(GenError::NoVariables);
    }
    if specs.len() > MAX_VARIABLES {
        return Err(GenError::TooManyVariables {
            count: specs.len(),
            max: MAX_VARIABLES,
        });
    }
    Ok(())
}

/// Moves made by the builder while it grows the dungeon. Replaying them from the initial state
/// solves the dungeon.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WalkStep {
    /// Walked to an enclave through existing doorways
    Travel { to: Enclave, state: State },

    /// Built a doorway and crossed it
    Open {
        from: Enclave,
        to: Enclave,
        label: State,
    },

    /// Operated the mechanism of the current enclave
    Activate { enclave: Enclave, state: State },

    /// Placed a new enclave behind a gate and entered it
    Gate {
        anchor: Enclave,
        enclave: Enclave,
        label: State,
    },
}

/// Result of a successful generation run
#[derive(Debug, Clone)]
pub struct Generated {
    pub variables: Vec<StateVariable>,
    pub dungeon: Dungeon,

    /// All variables at baseline. The player starts in the first enclave.
    pub initial: State,

    /// State of the player after the last enclave was entered
    pub final_state: State,

    pub walk: Vec<WalkStep>,
}

impl Generated {
    pub fn unused(&self) -> Vec<StateVariable> {
        unused_variables(&self.dungeon)
    }

    pub fn is_solvable(&self) -> bool {
        Reachability::new(&self.dungeon).is_solvable(&self.initial)
    }
}

/// Grows a dungeon one enclave at a time while keeping it solvable.
///
/// The builder simulates a player walking through the dungeon under construction. Every new
/// enclave is placed behind a gate which requires the mechanisms the player just operated.
pub struct DungeonBuilder<R> {
    rng: R,
    config: GeneratorConfig,
    variables: Vec<StateVariable>,
    pending: VecDeque<Enclave>,
    dungeon: Dungeon,
    current: Option<EnclaveId>,
    state: State,
    walk: Vec<WalkStep>,
}

impl<R: Rng> DungeonBuilder<R> {
    pub fn new(specs: &[VariableSpec], config: GeneratorConfig, rng: R) -> Result<Self> {
        validate_request(specs)?;

        let variables: Vec<StateVariable> = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| spec.assign(VarId::new(i)))
            .collect();

        let pending = variables.iter().flat_map(|&v| Enclave::stages(v)).collect();

        Ok(DungeonBuilder {
            rng,
            config,
            variables,
            pending,
            dungeon: Dungeon::new(),
            current: None,
            state: State::new(),
            walk: Vec::new(),
        })
    }

    pub fn build(mut self) -> Result<Generated> {
        while let Some(enclave) = self.pending.pop_front() {
            self.place(enclave)?;
        }

        log::info!(
            "generated {} enclaves with {} doorways",
            self.dungeon.enclave_count(),
            self.dungeon.doorway_count()
        );

        Ok(Generated {
            initial: State::initial(self.variables.iter().copied()),
            variables: self.variables,
            dungeon: self.dungeon,
            final_state: self.state,
            walk: self.walk,
        })
    }

    fn place(&mut self, enclave: Enclave) -> Result<()> {
        let Some(current) = self.current else {
            let id = self.dungeon.add_enclave(enclave);
            self.enter(id);
            log::debug!("{enclave} is the entrance");
            return Ok(());
        };

        let ids: Vec<EnclaveId> = self.dungeon.enclave_ids().collect();
        let anchor = ids.choose(&mut self.rng).copied().unwrap_or(current);

        let mut candidates: Vec<EnclaveId> = ids
            .into_iter()
            .filter(|&id| self.dungeon.enclave(id).mutable(&self.state))
            .collect();
        candidates.shuffle(&mut self.rng);

        let count = if candidates.is_empty() {
            0
        } else {
            self.rng.gen_range(1..=candidates.len())
        };

        log::debug!(
            "placing {enclave} next to {}, forcing {count} of {} mechanisms",
            self.dungeon.enclave(anchor),
            candidates.len()
        );

        let mut fragments = State::new();
        let mut forced = 0;
        for candidate in candidates {
            if forced == count {
                break;
            }
            if self.force_gate(candidate, anchor, &mut fragments) {
                forced += 1;
            }
        }

        self.reach_anchor(anchor, &fragments)?;

        let id = self.dungeon.add_enclave(enclave);
        let gate = if self.config.one_way_gates {
            Doorway::one_way(fragments.clone())
        } else {
            Doorway::two_way(fragments.clone())
        };
        self.dungeon.connect(anchor, id, gate);

        log::debug!(
            "gate {} -> {enclave} requires {fragments}",
            self.dungeon.enclave(anchor)
        );
        self.walk.push(WalkStep::Gate {
            anchor: *self.dungeon.enclave(anchor),
            enclave,
            label: fragments.clone(),
        });

        self.state = self.state.merge(&fragments);
        self.enter(id);

        Ok(())
    }

    /// Brings the player to `candidate` and operates its mechanism. Returns false if the
    /// candidate can not serve as a gate condition, in which case `fragments` is unchanged.
    fn force_gate(
        &mut self,
        candidate: EnclaveId,
        anchor: EnclaveId,
        fragments: &mut State,
    ) -> bool {
        let Some(current) = self.current else {
            return false;
        };
        let gate = *self.dungeon.enclave(candidate);

        let arrivals = Reachability::new(&self.dungeon)
            .states_reaching(&Position::new(current, self.state.clone()), candidate);

        if arrivals.is_empty() {
            // Not reachable at all, thus a doorway there is necessary. It is only committed if
            // the mechanism behind it can be operated.
            let mut trial = self.dungeon.clone();
            trial.add_doorway(current, candidate, self.state.relevant());
            let state = self.state.clone();
            let picked = Self::pick_activation(
                &mut self.rng,
                self.config.reactivation,
                &trial,
                candidate,
                anchor,
                &state,
                fragments,
            );
            return match picked {
                Some(fragment) => {
                    self.open(current, candidate);
                    self.activate(candidate, &fragment, fragments);
                    true
                }
                None => {
                    log::debug!("skipping {gate}: operating it would trap the player");
                    false
                }
            };
        }

        let mut usable: Vec<State> = arrivals
            .into_iter()
            .filter(|s| s.satisfies(fragments) && gate.mutable(s))
            .collect();
        usable.shuffle(&mut self.rng);

        for state in usable.into_iter().take(ARRIVAL_ATTEMPTS) {
            let picked = Self::pick_activation(
                &mut self.rng,
                self.config.reactivation,
                &self.dungeon,
                candidate,
                anchor,
                &state,
                fragments,
            );
            if let Some(fragment) = picked {
                self.travel(candidate, state);
                self.activate(candidate, &fragment, fragments);
                return true;
            }
        }

        log::debug!("skipping {gate}: can not be operated without undoing {fragments}");
        false
    }

    /// Picks a value for the mechanism of `candidate` which does not trap the player: the
    /// anchor must stay reachable with all conditions intact, unless it is not reachable at
    /// all (then a doorway to the anchor will be added).
    fn pick_activation(
        rng: &mut R,
        policy: ReactivationPolicy,
        dungeon: &Dungeon,
        candidate: EnclaveId,
        anchor: EnclaveId,
        state: &State,
        fragments: &State,
    ) -> Option<State> {
        let gate = *dungeon.enclave(candidate);
        let mut values = policy.choices(&gate, state);
        values.shuffle(rng);

        let reach = Reachability::new(dungeon);
        values
            .into_iter()
            .map(|value| State::single(gate.mechanism, value))
            .find(|fragment| {
                let wanted = fragments.merge(fragment);
                let next = Position::new(candidate, state.merge(fragment));
                reach.keeps_reachable(&next, anchor, &wanted)
            })
    }

    fn reach_anchor(&mut self, anchor: EnclaveId, fragments: &State) -> Result<()> {
        let Some(current) = self.current else {
            return Ok(());
        };

        let arrivals = Reachability::new(&self.dungeon)
            .states_reaching(&Position::new(current, self.state.clone()), anchor);

        if arrivals.is_empty() {
            self.open(current, anchor);
            return Ok(());
        }

        let usable: Vec<State> = arrivals
            .into_iter()
            .filter(|s| s.satisfies(fragments))
            .collect();

        match usable.choose(&mut self.rng) {
            Some(state) => {
                let state = state.clone();
                self.travel(anchor, state);
                Ok(())
            }
            None => Err(GenError::Unsatisfiable {
                enclave: self.dungeon.enclave(anchor).to_string(),
                reason: format!("it can only be reached by undoing {fragments}"),
            }),
        }
    }

    /// Adds a doorway which requires everything achieved so far and crosses it.
    fn open(&mut self, from: EnclaveId, to: EnclaveId) {
        let label = self.state.relevant();
        let (src, dst) = (*self.dungeon.enclave(from), *self.dungeon.enclave(to));
        log::debug!("doorway {src} -> {dst} requires {label}");

        self.dungeon.add_doorway(from, to, label.clone());
        self.walk.push(WalkStep::Open {
            from: src,
            to: dst,
            label,
        });
        self.current = Some(to);
    }

    fn travel(&mut self, to: EnclaveId, state: State) {
        if self.current != Some(to) || self.state != state {
            log::trace!("travel to {} with {state}", self.dungeon.enclave(to));
            self.walk.push(WalkStep::Travel {
                to: *self.dungeon.enclave(to),
                state: state.clone(),
            });
        }
        self.state = state;
        self.current = Some(to);
    }

    fn activate(&mut self, id: EnclaveId, fragment: &State, fragments: &mut State) {
        self.state = self.state.merge(fragment);
        *fragments = fragments.merge(fragment);

        let enclave = *self.dungeon.enclave(id);
        log::trace!("operate {enclave}: {}", self.state);
        self.walk.push(WalkStep::Activate {
            enclave,
            state: self.state.clone(),
        });
    }

    /// Moves the player into a newly placed enclave
    fn enter(&mut self, id: EnclaveId) {
        let var = self.dungeon.enclave(id).mechanism;
        if !self.state.contains(var.id) {
            self.state = self.state.with_value(var, 0);
        }
        self.current = Some(id);
    }
}

impl fmt::Display for WalkStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkStep::Travel { to, state } => write!(f, "walk to {to} with {state}"),
            WalkStep::Open { from, to, label } => {
                write!(f, "open doorway {from} -> {to} requiring {label}")
            }
            WalkStep::Activate { enclave, state } => write!(f, "operate {enclave} -> {state}"),
            WalkStep::Gate {
                anchor,
                enclave,
                label,
            } => write!(f, "enter {enclave} from {anchor} through {label}"),
        }
    }
}
