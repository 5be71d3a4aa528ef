//! Evaluate command - compare saved extractions against ground truth.
//!
//! Walks the ground truth entries rather than the output directory, so
//! bills that were never processed still show up in the report as
//! missing extractions.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use console::style;

use ebill_core::FieldSet;
use ebill_core::eval::{FileEvaluation, evaluate, load_ground_truth, render_report, summarize};

use super::DEFAULT_GROUND_TRUTH;

/// Arguments for the evaluate command.
#[derive(Args)]
pub struct EvaluateArgs {
    /// Directory holding *_extracted.json files
    #[arg(short, long, default_value = "output")]
    results_dir: PathBuf,

    /// Ground truth JSON to evaluate against
    #[arg(short, long, default_value = DEFAULT_GROUND_TRUTH)]
    ground_truth: PathBuf,
}

pub async fn run(args: EvaluateArgs) -> anyhow::Result<()> {
    let entries = load_ground_truth(&args.ground_truth)
        .with_context(|| format!("could not load {}", args.ground_truth.display()))?;
    println!(
        "{} Loaded {} ground truth entries from {}",
        style("ℹ").blue(),
        entries.len(),
        args.ground_truth.display()
    );

    let mut results: Vec<FileEvaluation> = Vec::with_capacity(entries.len());
    for entry in &entries {
        let stem = Path::new(entry.file_name())
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(entry.file_name());
        let extracted_path = args.results_dir.join(format!("{stem}_extracted.json"));

        if !extracted_path.exists() {
            println!(
                "{} No extraction found for: {}",
                style("⚠").yellow(),
                entry.file_name()
            );
            results.push(FileEvaluation::no_extraction(entry.file_name()));
            continue;
        }

        let content = fs::read_to_string(&extracted_path)?;
        let fields: FieldSet = serde_json::from_str(&content)
            .with_context(|| format!("malformed extraction file {}", extracted_path.display()))?;

        let report = evaluate(&fields, &entry.expected_fields());
        println!(
            "{} Evaluated: {} - accuracy {:.2}%",
            style("✓").green(),
            entry.file_name(),
            report.overall_accuracy
        );
        results.push(FileEvaluation::evaluated(entry.file_name(), report));
    }

    let summary = summarize(&results);
    let text = render_report(&results);

    fs::create_dir_all(&args.results_dir)?;
    let text_path = args.results_dir.join("evaluation_report.txt");
    fs::write(&text_path, &text)?;
    let json_path = args.results_dir.join("evaluation_report.json");
    fs::write(&json_path, serde_json::to_string_pretty(&results)?)?;

    println!();
    println!("{text}");
    println!(
        "{} Evaluation report saved to {}",
        style("✓").green(),
        text_path.display()
    );
    println!(
        "{} JSON results saved to {}",
        style("✓").green(),
        json_path.display()
    );
    if summary.files_without_extraction > 0 {
        println!(
            "{} {} file(s) had no extraction output in {}",
            style("⚠").yellow(),
            summary.files_without_extraction,
            args.results_dir.display()
        );
    }

    Ok(())
}
