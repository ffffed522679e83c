use serde::Deserialize;

use crate::pipeline::RequirementsRecord;

#[derive(Debug, Deserialize)]
pub(crate) struct ValidationPayload {
    pub valid: bool,
    #[serde(default)]
    pub requirements: Option<RequirementsRecord>,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DesignPayload {
    pub tasks: Vec<TaskPayload>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskPayload {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewPayload {
    pub passed: bool,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub rework: Vec<String>,
}
