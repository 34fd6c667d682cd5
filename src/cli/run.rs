// src/cli/run.rs — Local (non-server) commands against the spec store

use std::io::Read;

use serde_json::{json, Value};

use crate::core::engine::{validate_max_iters, IterationEngine, ProgressEvent};
use crate::core::extractor;
use crate::core::types::IterationRecord;
use crate::evaluator;
use crate::infra::config::Config;
use crate::infra::errors::SpecError;
use crate::memory::store::Store;

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `promptspec generate <prompt>`
pub fn run_generate(store: &Store, prompt: &str) -> anyhow::Result<()> {
    let spec = extractor::extract(prompt)?;
    let report = store.insert_report(prompt, &spec)?;
    print_json(&json!({ "id": report.id, "json_spec": report.json_spec }))
}

/// `promptspec evaluate [--report ID] [FILE|-]`
pub fn run_evaluate(
    store: &Store,
    report_id: Option<&str>,
    file: Option<&str>,
) -> anyhow::Result<()> {
    let result = if let Some(id) = report_id {
        let report = store.get_report(id)?.ok_or_else(|| SpecError::NotFound {
            what: "Report",
            id: id.to_string(),
        })?;
        let result = evaluator::evaluate(&report.json_spec)?;
        store.insert_evaluation(id, result.score, &result.comments)?;
        result
    } else {
        let value = read_spec_input(file)?;
        evaluator::evaluate(&value)?
    };
    print_json(&result)
}

fn read_spec_input(file: Option<&str>) -> anyhow::Result<Value> {
    let text = match file {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)?,
    };
    serde_json::from_str(&text).map_err(|e| SpecError::TypeMismatch(format!("invalid JSON: {e}")).into())
}

/// `promptspec iterate <prompt> [-n N] [--json]`
pub fn run_iterate(
    store: &Store,
    config: &Config,
    prompt: &str,
    max_iters: Option<u32>,
    json_only: bool,
) -> anyhow::Result<()> {
    let max_iters = max_iters.unwrap_or(config.engine.default_max_iters);
    validate_max_iters(max_iters)?;

    let mut engine = IterationEngine::new();
    if !json_only {
        engine = engine.with_progress(|event| {
            if let ProgressEvent::RoundStart {
                iteration,
                max_iters,
            } = event
            {
                eprintln!("[round {iteration}/{max_iters}]");
            }
        });
    }

    let history = engine.run(prompt, max_iters)?;
    let initial = history
        .first()
        .map(|r| r.before_json.clone())
        .ok_or(SpecError::EmptyResult)?;
    let report = store.record_iteration_run(prompt, &initial, &history)?;

    if !json_only {
        print_score_table(&history);
    }
    print_json(&json!({ "report_id": report.id, "iterations": history }))
}

fn print_score_table(history: &[IterationRecord]) {
    println!("{:<6} {:>7} {:>7}  comments", "round", "before", "after");
    for r in history {
        println!(
            "{:<6} {:>7.2} {:>7.2}  {}",
            r.iteration_number, r.score_before, r.score_after, r.comments_after
        );
    }
    println!();
}

/// `promptspec report <id>`
pub fn run_report(store: &Store, id: &str) -> anyhow::Result<()> {
    let detail = store.get_report_detail(id)?.ok_or_else(|| SpecError::NotFound {
        what: "Report",
        id: id.to_string(),
    })?;
    print_json(&detail)
}
