//! Process command - extract fields from a single bill file.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use ebill_core::eval::{evaluate, find_entry, load_ground_truth, render_accuracy_report};
use ebill_core::extract::ModelOutcome;
use ebill_core::pipeline::{DebugRecorder, StageEvent, StageObserver};
use ebill_core::BillField;

use super::{CliObserver, build_pipeline, load_config, resolve_ground_truth};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output directory for extraction artifacts
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Ground truth JSON for accuracy evaluation
    #[arg(short, long)]
    ground_truth: Option<PathBuf>,

    /// Print extracted fields to stdout instead of writing files
    #[arg(long)]
    stdout: bool,

    /// Record every pipeline stage under <output>/debug_logs/
    #[arg(long)]
    debug: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config)?;

    let filename = args
        .input
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("input path has no file name: {}", args.input.display()))?;

    if !args.stdout || args.debug {
        fs::create_dir_all(&args.output_dir)?;
    }

    let recorder = if args.debug {
        Some(DebugRecorder::create(&args.output_dir, &filename)?)
    } else {
        None
    };

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    bar.enable_steady_tick(Duration::from_millis(120));

    let observer = CliObserver::new(&bar, recorder.as_ref());
    let extraction = match pipeline.process_with(&args.input, &observer).await {
        Ok(extraction) => extraction,
        Err(error) => {
            bar.finish_and_clear();
            if let Some(recorder) = &recorder {
                recorder.record_error("process", &error);
                let _ = recorder.finish();
            }
            return Err(error.into());
        }
    };
    bar.finish_with_message("Extraction complete");

    // Evaluate when a ground truth entry covers this file.
    let mut accuracy = None;
    if let Some(gt_path) = resolve_ground_truth(args.ground_truth.clone()) {
        let entries = load_ground_truth(&gt_path)?;
        match find_entry(&entries, &filename) {
            Some(entry) => {
                let report = evaluate(&extraction.fields, &entry.expected_fields());
                observer.on_stage(&StageEvent::Evaluated { report: &report });
                accuracy = Some(report);
            }
            None => {
                println!(
                    "{} No ground truth entry for {}",
                    style("ℹ").blue(),
                    filename
                );
            }
        }
    }

    let extracted_json = serde_json::to_string_pretty(&extraction.fields)?;
    let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bill");

    if args.stdout {
        println!("{extracted_json}");
    } else {
        let extracted_path = args.output_dir.join(format!("{stem}_extracted.json"));
        fs::write(&extracted_path, &extracted_json)?;
        println!(
            "{} Saved extracted data to {}",
            style("✓").green(),
            extracted_path.display()
        );
    }

    if let Some(report) = &accuracy {
        if !args.stdout {
            let accuracy_path = args.output_dir.join(format!("{stem}_accuracy_report.json"));
            fs::write(&accuracy_path, serde_json::to_string_pretty(report)?)?;
            println!(
                "{} Saved accuracy report to {}",
                style("✓").green(),
                accuracy_path.display()
            );
        }
        println!();
        println!("{}", render_accuracy_report(report));
    }

    if let ModelOutcome::Degraded { reason } = &extraction.model.outcome {
        println!(
            "{} Model extraction degraded ({reason}); results are pattern-only",
            style("⚠").yellow()
        );
    }

    println!(
        "{} Extracted {}/{} fields",
        style("✓").green(),
        extraction.fields.present_count(),
        BillField::ALL.len()
    );
    debug!("total processing time: {:?}", start.elapsed());

    if let Some(recorder) = &recorder {
        recorder.finish()?;
        println!(
            "{} Stage recordings in {}",
            style("ℹ").blue(),
            recorder.dir().display()
        );
    }

    Ok(())
}
