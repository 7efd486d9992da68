use crate::{Dungeon, Generated, State, VarId, unused_variables};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct EnclaveRow {
    pub name: String,
    pub mechanism: VarId,
    pub cardinality: usize,
    pub reversible: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoorwayRow {
    pub from: String,
    pub to: String,
    pub label: State,
    pub one_way: bool,
}

/// Textual (and JSON) description of a generated dungeon for renderers and layout tools
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub enclaves: Vec<EnclaveRow>,
    pub doorways: Vec<DoorwayRow>,
    pub unused: Vec<VarId>,
    pub walk: Vec<String>,
}

impl Report {
    pub fn new(generated: &Generated) -> Self {
        let mut report = Self::from_dungeon(&generated.dungeon);
        report.walk = generated.walk.iter().map(|step| step.to_string()).collect();
        report
    }

    pub fn from_dungeon(dungeon: &Dungeon) -> Self {
        let enclaves = dungeon
            .enclaves()
            .map(|(_, e)| EnclaveRow {
                name: e.to_string(),
                mechanism: e.var(),
                cardinality: e.mechanism.cardinality,
                reversible: e.mechanism.reversible,
            })
            .collect();

        let doorways = dungeon
            .doorways()
            .map(|(src, doorway, dst)| DoorwayRow {
                from: dungeon.enclave(src).to_string(),
                to: dungeon.enclave(dst).to_string(),
                label: doorway.label.clone(),
                one_way: doorway.directed,
            })
            .collect();

        Report {
            seed: None,
            enclaves,
            doorways,
            unused: unused_variables(dungeon).iter().map(|v| v.id).collect(),
            walk: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(seed) = self.seed {
            writeln!(f, "Seed: {seed}")?;
        }

        writeln!(f, "Enclaves:")?;
        for e in &self.enclaves {
            writeln!(
                f,
                "  {:<4} mechanism {}, {} values, {}",
                e.name,
                e.mechanism,
                e.cardinality,
                if e.reversible { "reversible" } else { "irreversible" },
            )?;
        }

        if self.doorways.is_empty() {
            writeln!(f, "Doorways: none")?;
        } else {
            writeln!(f, "Doorways:")?;
            for d in &self.doorways {
                let left = if d.one_way { "--" } else { "<-" };
                writeln!(f, "  {} {left}{}-> {}", d.from, d.label, d.to)?;
            }
        }

        if self.unused.is_empty() {
            writeln!(f, "Unused: none")?;
        } else {
            let names: Vec<String> = self.unused.iter().map(|id| id.to_string()).collect();
            writeln!(f, "Unused: {}", names.join(", "))?;
        }

        if !self.walk.is_empty() {
            writeln!(f, "Walk:")?;
            for (i, step) in self.walk.iter().enumerate() {
                writeln!(f, "  {:>3}. {step}", i + 1)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Enclave, StateVariable};

    #[test]
    fn test_render_report() {
        let a = StateVariable::reversible(VarId::new(0), 2);
        let b = StateVariable::irreversible(VarId::new(1), 2);
        let c = StateVariable::reversible(VarId::new(2), 4);

        let mut dungeon = Dungeon::new();
        let ea = dungeon.add_enclave(Enclave::new(a, 0));
        let eb = dungeon.add_enclave(Enclave::new(b, 0));
        let ec = dungeon.add_enclave(Enclave::new(c, 0));
        dungeon.add_doorway(ea, eb, State::single(a, 1));
        dungeon.add_one_way(eb, ec, State::single(a, 1).with_value(b, 1));

        let text = Report::from_dungeon(&dungeon).with_seed(3).to_string();
        assert!(text.starts_with("Seed: 3\nEnclaves:\n"));
        assert!(text.contains("  A    mechanism A, 2 values, reversible\n"));
        assert!(text.contains("  B    mechanism B, 2 values, irreversible\n"));
        assert!(text.contains("  A <-{A:T}-> B\n"));
        assert!(text.contains("  B --{A:T, B:T}-> C\n"));
        assert!(text.ends_with("Unused: C\n"));
    }

    #[test]
    fn test_render_empty() {
        let mut dungeon = Dungeon::new();
        let a = StateVariable::reversible(VarId::new(0), 2);
        let ea = dungeon.add_enclave(Enclave::new(a, 0));
        let eb = dungeon.add_enclave(Enclave::new(StateVariable::reversible(VarId::new(1), 2), 0));
        dungeon.add_doorway(ea, eb, State::single(a, 0));

        let text = Report::from_dungeon(&dungeon).to_string();
        assert!(text.contains("Doorways:\n  A <-{A:F}-> B\n"));
        assert!(text.contains("Unused: B\n"));
    }

    #[test]
    fn test_json() {
        let mut dungeon = Dungeon::new();
        let a = StateVariable::reversible(VarId::new(0), 3);
        let ea = dungeon.add_enclave(Enclave::new(a, 0));
        let eb = dungeon.add_enclave(Enclave::new(StateVariable::irreversible(VarId::new(1), 2), 0));
        dungeon.add_doorway(ea, eb, State::single(a, 2));

        let json = serde_json::to_value(Report::from_dungeon(&dungeon)).unwrap();
        assert_eq!(json["doorways"][0]["from"], "A");
        assert_eq!(json["doorways"][0]["label"]["A"], 2);
        assert_eq!(json["doorways"][0]["one_way"], false);
        assert_eq!(json["unused"][0], "B");
        assert!(json.get("seed").is_none());
    }
}
