//! candor-predict - offline deception screening.
//!
//! Two modes:
//! - audio mode: decode each file, extract features, align, classify
//! - dataset mode (`--csv`): score rows of precomputed feature columns

mod dataset;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use candor_classifier::PipelineModel;
use candor_detect::Detector;

/// Offline deception screening over audio files or feature tables.
#[derive(Parser, Debug)]
#[command(name = "candor-predict")]
#[command(about = "Classify recordings as truthful or deceptive")]
struct Args {
    /// Audio files to score
    #[arg(required_unless_present = "csv")]
    audio: Vec<PathBuf>,

    /// Trained model artifact (JSON)
    #[arg(short, long)]
    model: PathBuf,

    /// Score a CSV of precomputed feature columns instead of audio
    #[arg(long, conflicts_with = "audio")]
    csv: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    /// Also print the extracted feature set (audio mode)
    #[arg(long)]
    features: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    }

    let model = PipelineModel::from_path(&args.model)
        .with_context(|| format!("loading model artifact {}", args.model.display()))?;
    let detector = Detector::new(model).context("resolving classifier feature schema")?;
    tracing::debug!(
        columns = detector.schema().len(),
        "classifier schema resolved"
    );

    if let Some(csv_path) = &args.csv {
        return dataset::run(&detector, csv_path, args.json);
    }

    run_audio(&detector, &args)
}

fn run_audio(detector: &Detector<PipelineModel>, args: &Args) -> Result<()> {
    let mut outputs = Vec::new();

    for path in &args.audio {
        let analysis = detector
            .analyze(path)
            .with_context(|| format!("analyzing {}", path.display()))?;

        if args.json {
            let mut value = serde_json::to_value(&analysis)?;
            if !args.features {
                if let Some(obj) = value.as_object_mut() {
                    obj.remove("features");
                }
            }
            if let Some(obj) = value.as_object_mut() {
                obj.insert(
                    "audio".to_string(),
                    serde_json::Value::String(path.display().to_string()),
                );
            }
            outputs.push(value);
            continue;
        }

        println!("{}", path.display());
        println!("  Prediction: {}", analysis.verdict.label);
        println!(
            "  Confidence: truth {:.3}, lie {:.3}",
            analysis.verdict.truth_probability, analysis.verdict.lie_probability
        );
        if args.features {
            for (name, value) in analysis.features.iter() {
                println!("  {name}: {value:.4}");
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
    }

    Ok(())
}
