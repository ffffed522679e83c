use anyhow::Result;
use std::collections::BTreeMap;

use super::types::{Config, LlmSettings, ModelSettings, PersonaOverride, PipelineSettings};

#[derive(Debug)]
pub struct ConfigBuilder {
    pub(super) llm: LlmSettings,
    pub(super) models: ModelSettings,
    pub(super) pipeline: PipelineSettings,
    pub(super) personas: BTreeMap<String, PersonaOverride>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            llm: LlmSettings::default(),
            models: ModelSettings::default(),
            pipeline: PipelineSettings::default(),
            personas: BTreeMap::new(),
        }
    }

    pub fn with_llm<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut LlmSettings),
    {
        update(&mut self.llm);
        self
    }

    pub fn with_models<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut ModelSettings),
    {
        update(&mut self.models);
        self
    }

    pub fn with_pipeline<F>(mut self, update: F) -> Self
    where
        F: FnOnce(&mut PipelineSettings),
    {
        update(&mut self.pipeline);
        self
    }

    pub fn with_persona(mut self, role: impl Into<String>, persona: PersonaOverride) -> Self {
        self.personas.insert(role.into(), persona);
        self
    }

    pub fn build(self) -> Result<Config> {
        Ok(Config {
            llm: self.llm,
            models: self.models,
            pipeline: self.pipeline,
            personas: self.personas,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
