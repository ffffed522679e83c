use colored::Colorize;

use crate::pipeline::{PipelineError, PipelineGraph, PipelineRun, ProjectState, StageKind};

pub(crate) fn print_run(run: &PipelineRun) {
    println!("{}", "✅ Pipeline finished".green().bold());

    let visits = StageKind::ALL
        .iter()
        .map(|stage| format!("{stage} ×{}", run.entries(*stage)))
        .collect::<Vec<_>>()
        .join(", ");
    println!("   Stages: {}", visits.dimmed());
    print_summary(&run.state);

    if let Some(output) = run.output() {
        println!("\n{}", output.trim_end());
    }
}

pub(crate) fn print_failure(err: &PipelineError) {
    eprintln!("{} {err}", "❌ Pipeline failed:".red().bold());

    if let Some(snapshot) = err.snapshot() {
        if let Some(stage) = err.stage() {
            eprintln!("   Last stage: {stage}");
        }
        if !snapshot.requirement_issues.is_empty() {
            eprintln!("   Open requirement issues:");
            for issue in &snapshot.requirement_issues {
                eprintln!("     • {issue}");
            }
        }
        let summary = snapshot.work_summary();
        if !snapshot.tasks.is_empty() {
            eprintln!(
                "   Work-items: {} complete, {} pending, {} failed",
                summary.complete, summary.pending, summary.failed
            );
        }
    }

    let hint = match err {
        PipelineError::Stalled { .. } => {
            Some("Raise --max-iterations or answer the crew's questions to let it converge.")
        }
        PipelineError::Cancelled { .. } => {
            Some("Resume later with --resume <checkpoint-dir>/checkpoint.json if checkpoints are on.")
        }
        _ => None,
    };
    if let Some(hint) = hint {
        eprintln!("   {}", hint.yellow());
    }
}

fn print_summary(state: &ProjectState) {
    if let Some(requirements) = &state.requirements {
        println!(
            "   Requirements: {} project at {}",
            requirements.language, requirements.project_path
        );
    }

    let summary = state.work_summary();
    println!(
        "   Work-items: {} complete, {} pending, {} failed",
        summary.complete, summary.pending, summary.failed
    );

    if let Some(review) = &state.review {
        println!("   Review rounds: {}", review.round);
    }
}

pub(crate) fn print_graph(graph: &PipelineGraph) {
    println!("{} {}", "Entry:".bold(), graph.entry());
    println!("\n{}", "Transitions:".bold());
    for (from, branch, to) in graph.edges() {
        println!("   {from} --{}--> {to}", branch.to_string().cyan());
    }

    println!("\n{}", "Recovery (missing field routed to its producer):".bold());
    for (from, to) in graph.recovery_edges() {
        println!("   {from} ~~> {to}");
    }
}
