use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};

use crate::config::PersonaOverride;

use super::prompt::*;

/// Crew member roles. Each role gets its own persona and system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    Collector,
    Validator,
    Optimizer,
    Architect,
    Engineer,
    Reviewer,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Collector,
        Role::Validator,
        Role::Optimizer,
        Role::Architect,
        Role::Engineer,
        Role::Reviewer,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Role::Collector => "collector",
            Role::Validator => "validator",
            Role::Optimizer => "optimizer",
            Role::Architect => "architect",
            Role::Engineer => "engineer",
            Role::Reviewer => "reviewer",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.key() == s)
            .ok_or_else(|| anyhow!("Unknown crew role '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub title: String,
    pub goal: String,
    pub backstory: String,
    pub instructions: String,
}

impl Persona {
    fn builtin(role: Role) -> Self {
        let (title, goal, backstory, instructions) = match role {
            Role::Collector => (
                COLLECTOR_TITLE,
                COLLECTOR_GOAL,
                COLLECTOR_BACKSTORY,
                COLLECTOR_INSTRUCTIONS,
            ),
            Role::Validator => (
                VALIDATOR_TITLE,
                VALIDATOR_GOAL,
                VALIDATOR_BACKSTORY,
                VALIDATOR_INSTRUCTIONS,
            ),
            Role::Optimizer => (
                OPTIMIZER_TITLE,
                OPTIMIZER_GOAL,
                OPTIMIZER_BACKSTORY,
                OPTIMIZER_INSTRUCTIONS,
            ),
            Role::Architect => (
                ARCHITECT_TITLE,
                ARCHITECT_GOAL,
                ARCHITECT_BACKSTORY,
                ARCHITECT_INSTRUCTIONS,
            ),
            Role::Engineer => (
                ENGINEER_TITLE,
                ENGINEER_GOAL,
                ENGINEER_BACKSTORY,
                ENGINEER_INSTRUCTIONS,
            ),
            Role::Reviewer => (
                REVIEWER_TITLE,
                REVIEWER_GOAL,
                REVIEWER_BACKSTORY,
                REVIEWER_INSTRUCTIONS,
            ),
        };

        Self {
            title: title.to_string(),
            goal: goal.to_string(),
            backstory: backstory.to_string(),
            instructions: instructions.to_string(),
        }
    }

    fn apply(&mut self, overrides: &PersonaOverride) {
        if let Some(goal) = &overrides.goal {
            self.goal = goal.clone();
        }
        if let Some(backstory) = &overrides.backstory {
            self.backstory = backstory.clone();
        }
        if let Some(instructions) = &overrides.instructions {
            self.instructions = instructions.clone();
        }
    }

    pub fn system_prompt(&self) -> String {
        format!(
            "You are the {}.\nGoal: {}\n\n{}\n\n{}",
            self.title,
            self.goal,
            self.backstory.trim(),
            self.instructions.trim()
        )
    }
}

/// One persona per role: built-in text with config overrides applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaTable {
    personas: [Persona; 6],
}

impl PersonaTable {
    pub fn builtin() -> Self {
        Self {
            personas: Role::ALL.map(Persona::builtin),
        }
    }

    pub fn with_overrides(overrides: &BTreeMap<String, PersonaOverride>) -> Result<Self> {
        let mut table = Self::builtin();
        for (key, persona) in overrides {
            let role: Role = key.parse()?;
            table.personas[role.index()].apply(persona);
        }
        Ok(table)
    }

    pub fn get(&self, role: Role) -> &Persona {
        &self.personas[role.index()]
    }
}

impl Default for PersonaTable {
    fn default() -> Self {
        Self::builtin()
    }
}
