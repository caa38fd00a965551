//! Configuration module

use std::env;
use std::path::PathBuf;

use crate::model::{ModelKind, TrainOptions};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Where the trained artifact is written and loaded from
    pub model_path: PathBuf,

    /// Upload cap in bytes
    pub max_upload_bytes: usize,

    /// Rows kept from a training upload (0 = all)
    pub train_sample_limit: usize,

    /// Regressor family for new models
    pub model_kind: ModelKind,

    /// Hold-out share for validation metrics
    pub validation_split: f64,

    /// Seed for the split and the regressor
    pub random_seed: u64,

    /// Predictions echoed back by `/api/predict`
    pub preview_limit: usize,

    /// Largest id span a submission may cover
    pub max_submission_rows: usize,

    /// Seed for submission gap filling; entropy when unset
    pub synthetic_seed: Option<u64>,

    /// Environment (development, production)
    pub environment: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            model_path: PathBuf::from("model.bin"),
            max_upload_bytes: 16 * 1024 * 1024,
            train_sample_limit: 50_000,
            model_kind: ModelKind::Fast,
            validation_split: 0.2,
            random_seed: 42,
            preview_limit: 100,
            max_submission_rows: 10_000_000,
            synthetic_seed: None,
            environment: "development".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let validation_split = match parse_var::<f64>("VALIDATION_SPLIT") {
            Some(v) if v > 0.0 && v < 1.0 => v,
            Some(v) => {
                tracing::warn!("VALIDATION_SPLIT={} outside (0, 1), using {}", v, defaults.validation_split);
                defaults.validation_split
            }
            None => defaults.validation_split,
        };

        let model_kind = match env::var("MODEL_TYPE") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}, using {}", e, defaults.model_kind);
                defaults.model_kind
            }),
            Err(_) => defaults.model_kind,
        };

        Self {
            port: parse_var("PORT").unwrap_or(defaults.port),

            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            max_upload_bytes: parse_var::<usize>("MAX_UPLOAD_MB")
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(defaults.max_upload_bytes),

            train_sample_limit: parse_var("TRAIN_SAMPLE_LIMIT").unwrap_or(defaults.train_sample_limit),

            model_kind,

            validation_split,

            random_seed: parse_var("RANDOM_SEED").unwrap_or(defaults.random_seed),

            preview_limit: parse_var("PREVIEW_LIMIT").unwrap_or(defaults.preview_limit),

            max_submission_rows: parse_var("MAX_SUBMISSION_ROWS").unwrap_or(defaults.max_submission_rows),

            synthetic_seed: parse_var("SYNTHETIC_SEED"),

            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    pub fn train_options(&self) -> TrainOptions {
        TrainOptions {
            kind: self.model_kind,
            validation_split: self.validation_split,
            seed: self.random_seed,
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
