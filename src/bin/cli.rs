//! Offline training and batch prediction

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use ventilator_pressure::dataset::Dataset;
use ventilator_pressure::model::{ModelKind, TrainOptions, VentilatorModel};
use ventilator_pressure::submission::{write_csv, SubmissionRow};

/// Ventilator pressure model tools
#[derive(Parser, Debug)]
#[command(name = "ventilator-cli")]
#[command(version)]
#[command(about = "Train a ventilator pressure model or run batch predictions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train a model from a CSV with a pressure column
    Train(TrainArgs),

    /// Predict pressure for every row of a CSV
    Predict(PredictArgs),
}

#[derive(Parser, Debug)]
struct TrainArgs {
    /// Training CSV
    input: PathBuf,

    /// Where to write the model
    #[arg(short, long, default_value = "model.bin")]
    output: PathBuf,

    /// Use only the first N rows (0 = all)
    #[arg(long, default_value_t = 10_000)]
    limit: usize,

    /// fast (random forest) or accurate (gradient boosting)
    #[arg(long, default_value = "fast")]
    model_type: ModelKind,

    /// Validation share
    #[arg(long, default_value_t = 0.2)]
    validation_split: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

#[derive(Parser, Debug)]
struct PredictArgs {
    /// CSV to predict
    input: PathBuf,

    /// Trained model
    #[arg(short, long, default_value = "model.bin")]
    model: PathBuf,

    /// Submission file to write
    #[arg(short, long, default_value = "submission.csv")]
    output: PathBuf,

    /// Use only the first N rows (0 = all)
    #[arg(long, default_value_t = 0)]
    limit: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ventilator_pressure=info".into()),
        )
        .init();

    match Cli::parse().command {
        Command::Train(args) => train(args),
        Command::Predict(args) => predict(args),
    }
}

fn train(args: TrainArgs) -> Result<()> {
    let mut dataset = Dataset::from_path(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    dataset.truncate(args.limit);
    tracing::info!("Loaded {} rows, {} breaths", dataset.len(), dataset.breath_count());

    let opts = TrainOptions {
        kind: args.model_type,
        validation_split: args.validation_split,
        seed: args.seed,
    };
    let (model, report) = VentilatorModel::train(&dataset, &opts).context("training failed")?;
    model
        .save(&args.output)
        .with_context(|| format!("failed to save {}", args.output.display()))?;

    tracing::info!(
        "Validation MAE {:.4} cmH2O, model written to {}",
        report.val_mae,
        args.output.display()
    );
    Ok(())
}

fn predict(args: PredictArgs) -> Result<()> {
    let model = VentilatorModel::load(&args.model)
        .with_context(|| format!("failed to load model {}", args.model.display()))?;

    let mut dataset = Dataset::from_path(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    dataset.truncate(args.limit);

    let predictions = model.predict(&dataset)?;
    let rows: Vec<SubmissionRow> = dataset
        .rows()
        .iter()
        .zip(&predictions)
        .map(|(row, &pressure)| SubmissionRow { id: row.id, pressure })
        .collect();

    std::fs::write(&args.output, write_csv(&rows)?)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    tracing::info!("{} predictions written to {}", rows.len(), args.output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_train_defaults() {
        let cli = Cli::try_parse_from(["ventilator-cli", "train", "train.csv"]).unwrap();
        match cli.command {
            Command::Train(args) => {
                assert_eq!(args.input, PathBuf::from("train.csv"));
                assert_eq!(args.output, PathBuf::from("model.bin"));
                assert_eq!(args.limit, 10_000);
                assert_eq!(args.model_type, ModelKind::Fast);
            }
            _ => panic!("Expected Train command"),
        }
    }

    #[test]
    fn test_parse_predict_with_overrides() {
        let cli = Cli::try_parse_from([
            "ventilator-cli",
            "predict",
            "test.csv",
            "--model",
            "m.bin",
            "--output",
            "out.csv",
            "--limit",
            "500",
        ])
        .unwrap();
        match cli.command {
            Command::Predict(args) => {
                assert_eq!(args.model, PathBuf::from("m.bin"));
                assert_eq!(args.output, PathBuf::from("out.csv"));
                assert_eq!(args.limit, 500);
            }
            _ => panic!("Expected Predict command"),
        }
    }

    #[test]
    fn test_parse_model_type() {
        let cli = Cli::try_parse_from(["ventilator-cli", "train", "t.csv", "--model-type", "accurate"]).unwrap();
        match cli.command {
            Command::Train(args) => assert_eq!(args.model_type, ModelKind::Accurate),
            _ => panic!("Expected Train command"),
        }
        assert!(Cli::try_parse_from(["ventilator-cli", "train", "t.csv", "--model-type", "lstm"]).is_err());
    }
}
