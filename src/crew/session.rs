use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use tracing::debug;

use crate::client::{ChatCompletionRequest, ChatMessage, DynLlmClient};
use crate::config::{Config, ModelSettings};
use crate::pipeline::{
    Collaborator, ProjectState, RequirementsBrief, RequirementsRecord, RequirementsVerdict,
    ReviewVerdict, Reviewer, TaskDesigner, ValidationIssues, WorkBrief, WorkExecutor, WorkItem,
    WorkItemDraft, WorkStatus,
};

use super::parsing::{parse_reply, strip_prompt_prefix, strip_think_blocks};
use super::persona::{PersonaTable, Role};
use super::types::{DesignPayload, ReviewPayload, ValidationPayload};

/// LLM-backed crew: one chat-completions call per role invocation, with the
/// role's persona as the system prompt.
pub struct LlmCrew {
    client: Arc<DynLlmClient>,
    personas: PersonaTable,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl LlmCrew {
    pub fn new(client: Arc<DynLlmClient>, models: &ModelSettings, personas: PersonaTable) -> Self {
        Self {
            client,
            personas,
            model: models.model.clone(),
            max_tokens: models.max_tokens,
            temperature: models.temperature,
        }
    }

    pub fn from_config(client: Arc<DynLlmClient>, config: &Config) -> Result<Self> {
        let personas = PersonaTable::with_overrides(&config.personas)?;
        Ok(Self::new(client, &config.models, personas))
    }

    async fn ask(&self, role: Role, content: String) -> Result<String> {
        let persona = self.personas.get(role);
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(persona.system_prompt()),
                ChatMessage::user(content),
            ],
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };

        debug!(%role, model = %self.model, "asking crew member");
        let response = self
            .client
            .chat_completion(request)
            .await
            .with_context(|| format!("{} call failed", persona.title))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("{} returned no choices", persona.title))?;

        let content = choice.message.content.trim().to_string();
        if content.is_empty() {
            bail!("{} response was empty", persona.title);
        }
        Ok(content)
    }
}

fn requirements_json(record: &RequirementsRecord) -> Result<String> {
    serde_json::to_string_pretty(record).context("Failed to serialize requirements")
}

#[async_trait]
impl Collaborator for LlmCrew {
    async fn collect_requirements(&self, brief: &RequirementsBrief) -> Result<RequirementsRecord> {
        let mut content = format!("Request:\n{}\n", brief.input.trim());

        if !brief.clarifications.is_empty() {
            content.push_str("\nAnswers the user already gave:\n");
            for clarification in &brief.clarifications {
                let _ = writeln!(content, "Q: {}", clarification.question);
                let _ = writeln!(content, "A: {}", clarification.answer);
            }
        }

        if !brief.issues.is_empty() {
            content.push_str("\nIssues found by validation that must be resolved:\n");
            for issue in &brief.issues {
                let _ = writeln!(content, "- {issue}");
            }
        }

        let reply = self.ask(Role::Collector, content).await?;
        parse_reply(&reply, "collector")
    }

    async fn validate_requirements(
        &self,
        record: &RequirementsRecord,
    ) -> Result<RequirementsVerdict> {
        let reply = self
            .ask(Role::Validator, requirements_json(record)?)
            .await?;
        let payload: ValidationPayload = parse_reply(&reply, "validator")?;

        if payload.valid && payload.issues.is_empty() {
            let validated = payload.requirements.unwrap_or_else(|| record.clone());
            return Ok(RequirementsVerdict::Valid(validated));
        }

        let mut issues = payload.issues;
        if issues.is_empty() {
            issues.push(
                "the validator rejected the requirements without naming a problem".to_string(),
            );
        }
        Ok(RequirementsVerdict::Issues(ValidationIssues {
            issues,
            question: payload.question.filter(|question| !question.trim().is_empty()),
        }))
    }

    async fn optimize_prompt(&self, record: &RequirementsRecord) -> Result<String> {
        let reply = self
            .ask(Role::Optimizer, requirements_json(record)?)
            .await?;

        let prompt = strip_prompt_prefix(&reply);
        if prompt.is_empty() {
            bail!("optimizer returned an empty prompt");
        }
        Ok(prompt)
    }
}

#[async_trait]
impl TaskDesigner for LlmCrew {
    async fn design(
        &self,
        requirements: &RequirementsRecord,
        prompt: &str,
        feedback: Option<&str>,
    ) -> Result<Vec<WorkItemDraft>> {
        let mut content = format!(
            "Project prompt:\n{}\n\nRequirements:\n{}\n",
            prompt.trim(),
            requirements_json(requirements)?
        );
        if let Some(feedback) = feedback {
            let _ = write!(content, "\nReviewer feedback on the previous attempt:\n{feedback}\n");
        }

        let reply = self.ask(Role::Architect, content).await?;
        let payload: DesignPayload = parse_reply(&reply, "architect")?;

        Ok(payload
            .tasks
            .into_iter()
            .filter(|task| !task.title.trim().is_empty())
            .map(|task| WorkItemDraft {
                title: task.title.trim().to_string(),
                description: task.description.trim().to_string(),
            })
            .collect())
    }
}

#[async_trait]
impl WorkExecutor for LlmCrew {
    async fn execute(&self, item: &WorkItem, brief: &WorkBrief) -> Result<String> {
        let mut content = format!(
            "Project prompt:\n{}\n\nRequirements:\n{}\n\nWork-item {}: {}\n{}\n",
            brief.prompt.trim(),
            requirements_json(&brief.requirements)?,
            item.id,
            item.title,
            item.description
        );

        if let Some(feedback) = &item.feedback {
            let _ = write!(content, "\nReviewer feedback to address:\n{feedback}\n");
        }
        if let Some(previous) = &item.output {
            let _ = write!(content, "\nYour previous attempt:\n{previous}\n");
        }

        let reply = self.ask(Role::Engineer, content).await?;
        let output = strip_think_blocks(&reply);
        if output.is_empty() {
            bail!("engineer returned no deliverable for {}", item.id);
        }
        Ok(output)
    }
}

#[async_trait]
impl Reviewer for LlmCrew {
    async fn review(&self, state: &ProjectState) -> Result<ReviewVerdict> {
        let prompt = state.task.as_deref().unwrap_or(&state.input);
        let mut content = format!("Project prompt:\n{}\n", prompt.trim());
        if let Some(requirements) = &state.requirements {
            let _ = write!(content, "\nRequirements:\n{}\n", requirements_json(requirements)?);
        }

        for item in &state.tasks {
            let _ = write!(content, "\n## {} ({})\n", item.id, item.title);
            match (&item.status, &item.output) {
                (WorkStatus::Complete, Some(output)) => {
                    let _ = writeln!(content, "{}", output.trim());
                }
                _ => content.push_str("(no output)\n"),
            }
        }

        let reply = self.ask(Role::Reviewer, content).await?;
        let payload: ReviewPayload = parse_reply(&reply, "reviewer")?;

        let rework = payload
            .rework
            .into_iter()
            .filter(|id| state.tasks.iter().any(|item| &item.id == id))
            .collect();

        Ok(ReviewVerdict {
            passed: payload.passed,
            feedback: payload.feedback.filter(|feedback| !feedback.trim().is_empty()),
            rework,
        })
    }
}
