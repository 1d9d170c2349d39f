//! Developer utility to train the priority regressor on a CSV and report its fit.

use std::path::PathBuf;

use civic_priority::config;
use civic_priority::dataset::{CsvFileSource, SampleSource};
use civic_priority::ml::metrics::BandConfusion;
use civic_priority::ml::regressor::TrainOptions;
use civic_priority::priority::pipeline::train_from_samples;
use civic_priority::priority::{ComplaintPayload, PriorityLevel};
use ndarray::Array1;

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let options = parse_args(std::env::args().skip(1).collect())?;
    let settings = match &options.config {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())?;
    let dataset = match &options.dataset {
        Some(path) => path.clone(),
        None => settings.dataset_path().map_err(|err| err.to_string())?,
    };
    let mut train_options = settings.training.to_options();
    options.apply(&mut train_options);

    let source = CsvFileSource::new(&dataset);
    let samples = source.load().map_err(|err| err.to_string())?;
    println!("Loaded {} samples from {}", samples.len(), source.describe());
    let (scorer, report) =
        train_from_samples(&samples, &train_options).map_err(|err| err.to_string())?;

    println!(
        "features={} vocabulary={} categories={}",
        report.feature_len, report.vocabulary_size, report.categories
    );
    println!(
        "distribution: low={} medium={} high={} critical={}",
        report.distribution[0], report.distribution[1], report.distribution[2], report.distribution[3]
    );
    println!(
        "epochs={} stopped_early={} best_val_loss={:.4} elapsed={}ms",
        report.epochs_run, report.stopped_early, report.best_val_loss, report.elapsed_ms
    );
    if let Some(last) = report.final_epoch {
        println!(
            "final epoch {}: loss={:.4} val_loss={:.4} mae={:.4} val_mae={:.4}",
            last.epoch, last.loss, last.val_loss, last.mae, last.val_mae
        );
    }
    println!(
        "validation ({} rows): mse={:.4} mae={:.4} band accuracy={:.3}",
        report.validation.rows,
        report.validation.mse,
        report.validation.mae,
        report.validation.band_accuracy
    );

    let mut predicted = Vec::with_capacity(samples.len());
    for sample in &samples {
        let payload = ComplaintPayload::new(sample.category.as_str(), sample.description.as_str());
        predicted.push(scorer.score(&payload).map_err(|err| err.to_string())?);
    }
    let predicted = Array1::from(predicted);
    let targets: Array1<f32> = samples.iter().map(|sample| sample.priority).collect();
    let confusion = BandConfusion::from_scores(predicted.view(), targets.view());
    println!("all rows band accuracy: {:.4}", confusion.accuracy());
    for stats in confusion.per_band() {
        println!(
            "{:<9} precision={:.3}  recall={:.3}  support={}",
            stats.level.as_str(),
            stats.precision,
            stats.recall,
            stats.support
        );
    }
    println!("confusion matrix (rows=true, cols=pred):");
    for truth in PriorityLevel::ALL {
        let mut row = format!("{:<9}", truth.as_str());
        for pred in PriorityLevel::ALL {
            row.push_str(&format!("{:6}", confusion.get(truth, pred)));
        }
        println!("{row}");
    }

    if let Some(out) = &options.snapshot_out {
        let snapshot = serde_json::json!({ "report": report, "scorer": scorer });
        let json = serde_json::to_vec_pretty(&snapshot).map_err(|err| err.to_string())?;
        std::fs::write(out, json)
            .map_err(|err| format!("Failed to write {}: {err}", out.display()))?;
        println!("Snapshot written to {}", out.display());
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
struct CliOptions {
    dataset: Option<PathBuf>,
    config: Option<PathBuf>,
    snapshot_out: Option<PathBuf>,
    epochs: Option<usize>,
    batch_size: Option<usize>,
    learning_rate: Option<f32>,
    patience: Option<usize>,
    l2_penalty: Option<f32>,
    seed: Option<u64>,
}

impl CliOptions {
    fn apply(&self, options: &mut TrainOptions) {
        if let Some(epochs) = self.epochs {
            options.epochs = epochs;
        }
        if let Some(batch_size) = self.batch_size {
            options.batch_size = batch_size;
        }
        if let Some(learning_rate) = self.learning_rate {
            options.learning_rate = learning_rate;
        }
        if let Some(patience) = self.patience {
            options.patience = patience;
        }
        if let Some(l2_penalty) = self.l2_penalty {
            options.l2_penalty = l2_penalty;
        }
        if let Some(seed) = self.seed {
            options.seed = seed;
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        if flag == "-h" || flag == "--help" {
            return Err(help_text());
        }
        idx += 1;
        let value = args
            .get(idx)
            .ok_or_else(|| format!("{flag} requires a value\n\n{}", help_text()))?;
        match flag {
            "--dataset" => options.dataset = Some(PathBuf::from(value)),
            "--config" => options.config = Some(PathBuf::from(value)),
            "--out" => options.snapshot_out = Some(PathBuf::from(value)),
            "--epochs" => options.epochs = Some(parse_value(flag, value)?),
            "--batch" => options.batch_size = Some(parse_value(flag, value)?),
            "--learning-rate" => options.learning_rate = Some(parse_value(flag, value)?),
            "--patience" => options.patience = Some(parse_value(flag, value)?),
            "--l2" => options.l2_penalty = Some(parse_value(flag, value)?),
            "--seed" => options.seed = Some(parse_value(flag, value)?),
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String> {
    value
        .parse::<T>()
        .map_err(|_| format!("Invalid {flag} value: {value}"))
}

fn help_text() -> String {
    [
        "civic-priority-train",
        "",
        "Trains the complaint priority regressor and prints fit diagnostics.",
        "",
        "Usage:",
        "  civic-priority-train [--dataset complaints.csv] [--out snapshot.json]",
        "",
        "Options:",
        "  --dataset <file>      CSV with category,description,priority columns (default: configured dataset)",
        "  --config <file>       Settings file (default: config.toml in the app directory)",
        "  --out <file>          Write encoders, weights and report as JSON",
        "  --epochs <n>          Maximum epochs (default 200)",
        "  --batch <n>           Batch size (default 32)",
        "  --learning-rate <f>   Adam learning rate (default 0.001)",
        "  --patience <n>        Early-stopping patience (default 30)",
        "  --l2 <f>              L2 penalty (default 5e-4)",
        "  --seed <n>            RNG seed (default 42)",
    ]
    .join("\n")
}
