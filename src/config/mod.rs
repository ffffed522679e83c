//! Configuration management for crewflow.
//!
//! Settings are layered in this order, later layers winning:
//! - built-in defaults
//! - the JSON file at `~/.crewflow/config`
//! - environment variable overrides
//! - command-line flags (applied by the CLI)

mod builder;
mod constants;
mod defaults;
mod environment;
mod loader;
mod types;
mod validation;

pub use types::{
    Config, LlmProvider, LlmSettings, ModelSettings, PersonaOverride, PipelineSettings,
    RetrySettings, ReviewFailureRoute,
};

pub use constants::KNOWN_ROLES;
