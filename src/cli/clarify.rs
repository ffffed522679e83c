use std::io::{self, Write};
use std::thread;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::pipeline::ClarificationResolver;

/// Asks clarifying questions on the terminal. Answering `skip` or nothing
/// declines the question.
pub(crate) struct StdinClarifier;

#[async_trait]
impl ClarificationResolver for StdinClarifier {
    async fn resolve(&self, question: &str, issues: &[String]) -> Result<Option<String>> {
        println!("\n🤔 The crew needs more information: {question}");
        for issue in issues {
            println!("   • {issue}");
        }
        print!("Your answer (or 'skip'): ");
        io::stdout().flush()?;

        // A detached thread rather than the blocking pool: a pending read
        // must not hold up runtime shutdown once the run is cancelled.
        let (tx, rx) = oneshot::channel();
        thread::Builder::new()
            .name("clarify-stdin".to_string())
            .spawn(move || {
                let mut answer = String::new();
                let read = io::stdin().read_line(&mut answer).map(|_| answer);
                let _ = tx.send(read);
            })
            .context("Failed to start the terminal reader")?;

        let answer = rx
            .await
            .context("Terminal reader stopped without an answer")?
            .context("Failed to read the answer from stdin")?;
        Ok(normalize_answer(&answer))
    }
}

pub(crate) fn normalize_answer(answer: &str) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() || answer.eq_ignore_ascii_case("skip") {
        None
    } else {
        Some(answer.to_string())
    }
}
