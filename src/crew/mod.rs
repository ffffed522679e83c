//! LLM-backed crew implementing the pipeline's collaborator seams.

mod parsing;
mod persona;
mod prompt;
mod session;
mod types;

#[allow(unused_imports)]
pub use persona::{Persona, PersonaTable, Role};
pub use session::LlmCrew;

#[cfg(test)]
mod tests;
