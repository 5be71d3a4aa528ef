//! Batch processing command for multiple bill files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

use ebill_core::document::is_supported;
use ebill_core::eval::{
    FileEvaluation, evaluate, find_entry, load_ground_truth, render_report, summarize,
};
use ebill_core::pipeline::{BillExtraction, DebugRecorder, StageEvent, StageObserver};
use ebill_core::{BillField, SUPPORTED_EXTENSIONS};

use super::{CliObserver, build_pipeline, load_config, resolve_ground_truth};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input directory or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for extraction artifacts
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Ground truth JSON for accuracy evaluation
    #[arg(short, long)]
    ground_truth: Option<PathBuf>,

    /// Stop at the first file that fails
    #[arg(long)]
    fail_fast: bool,

    /// Record every pipeline stage under <output>/debug_logs/
    #[arg(long)]
    debug: bool,

    /// Also write a per-file summary CSV
    #[arg(long)]
    summary: bool,
}

/// One row of the optional summary CSV.
struct SummaryRow {
    filename: String,
    status: &'static str,
    fields_found: String,
    invoice_number: String,
    units_consumed: String,
    bill_amount: String,
    due_date: String,
    accuracy: String,
    processing_time_ms: String,
    error: String,
}

impl SummaryRow {
    fn success(
        filename: &str,
        extraction: &BillExtraction,
        evaluation: &FileEvaluation,
        elapsed_ms: u128,
    ) -> Self {
        let field = |field: BillField| {
            extraction
                .fields
                .get(field)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            filename: filename.to_string(),
            status: "success",
            fields_found: extraction.fields.present_count().to_string(),
            invoice_number: field(BillField::InvoiceNumber),
            units_consumed: field(BillField::UnitsConsumed),
            bill_amount: field(BillField::BillAmount),
            due_date: field(BillField::DueDate),
            accuracy: evaluation
                .accuracy()
                .map(|report| format!("{:.2}", report.overall_accuracy))
                .unwrap_or_default(),
            processing_time_ms: elapsed_ms.to_string(),
            error: String::new(),
        }
    }

    fn failure(filename: &str, error: &str, elapsed_ms: u128) -> Self {
        Self {
            filename: filename.to_string(),
            status: "error",
            fields_found: String::new(),
            invoice_number: String::new(),
            units_consumed: String::new(),
            bill_amount: String::new(),
            due_date: String::new(),
            accuracy: String::new(),
            processing_time_ms: elapsed_ms.to_string(),
            error: error.to_string(),
        }
    }
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;
    let pipeline = build_pipeline(&config)?;

    let files = collect_files(&args.input)?;
    if files.is_empty() {
        anyhow::bail!(
            "no matching files found for: {} (supported: {})",
            args.input,
            SUPPORTED_EXTENSIONS.join(", ")
        );
    }
    println!(
        "{} Found {} file(s) to process",
        style("ℹ").blue(),
        files.len()
    );

    let entries = match resolve_ground_truth(args.ground_truth.clone()) {
        Some(path) => {
            let entries = load_ground_truth(&path)?;
            println!(
                "{} Loaded {} ground truth entries from {}",
                style("ℹ").blue(),
                entries.len(),
                path.display()
            );
            Some(entries)
        }
        None => {
            println!(
                "{} No ground truth file found; accuracy evaluation skipped",
                style("ℹ").blue()
            );
            None
        }
    };

    fs::create_dir_all(&args.output_dir)?;

    let overall = ProgressBar::new(files.len() as u64);
    overall.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut evaluations: Vec<FileEvaluation> = Vec::with_capacity(files.len());
    let mut rows: Vec<SummaryRow> = Vec::with_capacity(files.len());
    let mut failures = 0usize;

    for path in &files {
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("bill")
            .to_string();
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("bill");

        let recorder = if args.debug {
            Some(DebugRecorder::create(&args.output_dir, &filename)?)
        } else {
            None
        };
        let observer = CliObserver::new(&overall, recorder.as_ref());

        let file_start = Instant::now();
        match pipeline.process_with(path, &observer).await {
            Ok(extraction) => {
                let extracted_path = args.output_dir.join(format!("{stem}_extracted.json"));
                fs::write(
                    &extracted_path,
                    serde_json::to_string_pretty(&extraction.fields)?,
                )?;

                let evaluation = match entries.as_deref().and_then(|e| find_entry(e, &filename)) {
                    Some(entry) => {
                        let report = evaluate(&extraction.fields, &entry.expected_fields());
                        observer.on_stage(&StageEvent::Evaluated { report: &report });
                        let accuracy_path =
                            args.output_dir.join(format!("{stem}_accuracy_report.json"));
                        fs::write(&accuracy_path, serde_json::to_string_pretty(&report)?)?;
                        FileEvaluation::evaluated(filename.clone(), report)
                    }
                    None => FileEvaluation::no_ground_truth(filename.clone()),
                };

                rows.push(SummaryRow::success(
                    &filename,
                    &extraction,
                    &evaluation,
                    file_start.elapsed().as_millis(),
                ));
                evaluations.push(evaluation);
            }
            Err(error) => {
                failures += 1;
                if let Some(recorder) = &recorder {
                    recorder.record_error("process", &error);
                }
                if args.fail_fast {
                    if let Some(recorder) = &recorder {
                        let _ = recorder.finish();
                    }
                    overall.abandon_with_message("failed");
                    return Err(error.into());
                }
                warn!("failed to process {}: {error}", path.display());
                rows.push(SummaryRow::failure(
                    &filename,
                    &error.to_string(),
                    file_start.elapsed().as_millis(),
                ));
                evaluations.push(FileEvaluation::no_extraction(filename.clone()));
            }
        }

        if let Some(recorder) = &recorder {
            let _ = recorder.finish();
        }
        overall.inc(1);
    }
    overall.finish_with_message("Complete");

    // Evaluation report, in both shapes, when ground truth was in play.
    if entries.is_some() {
        let summary = summarize(&evaluations);
        let text = render_report(&evaluations);
        let text_path = args.output_dir.join("evaluation_report.txt");
        fs::write(&text_path, &text)?;
        fs::write(
            args.output_dir.join("evaluation_report.json"),
            serde_json::to_string_pretty(&evaluations)?,
        )?;

        println!();
        println!("{text}");
        println!(
            "{} Evaluated {} file(s); report saved to {}",
            style("✓").green(),
            summary.files_evaluated,
            text_path.display()
        );
    }

    if args.summary {
        let summary_path = args.output_dir.join("summary.csv");
        write_summary_csv(&summary_path, &rows)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!(
        "{} Processed {} file(s), {} failed, in {:?}",
        style("✓").green(),
        files.len(),
        failures,
        start.elapsed()
    );

    Ok(())
}

/// Expand a directory or glob pattern into supported bill files.
fn collect_files(input: &str) -> anyhow::Result<Vec<PathBuf>> {
    let path = Path::new(input);
    let mut files: Vec<PathBuf> = if path.is_dir() {
        fs::read_dir(path)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| is_supported(p))
            .collect()
    } else {
        glob(input)?
            .filter_map(|r| r.ok())
            .filter(|p| is_supported(p))
            .collect()
    };
    files.sort();
    Ok(files)
}

fn write_summary_csv(path: &Path, rows: &[SummaryRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "fields_found",
        "invoice_number",
        "units_consumed",
        "bill_amount",
        "due_date",
        "accuracy",
        "processing_time_ms",
        "error",
    ])?;

    for row in rows {
        wtr.write_record([
            row.filename.as_str(),
            row.status,
            row.fields_found.as_str(),
            row.invoice_number.as_str(),
            row.units_consumed.as_str(),
            row.bill_amount.as_str(),
            row.due_date.as_str(),
            row.accuracy.as_str(),
            row.processing_time_ms.as_str(),
            row.error.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
