//! Command-line and environment configuration.

use clap::Parser;
use std::path::PathBuf;

use crate::error::{AppError, Result};
use crate::model::ForestParams;

/// Student pass/fail dashboard: dataset explorer, charts and random forest predictor
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Path to the student records CSV
    #[arg(short, long, env = "STUDENT_DATA", default_value = "data/student_data.csv")]
    pub data: PathBuf,

    /// Field delimiter of the CSV file
    #[arg(long, env = "STUDENT_DELIMITER", default_value_t = ',')]
    pub delimiter: char,

    /// Address to bind the dashboard to
    #[arg(long, env = "STUDENT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind the dashboard to
    #[arg(short, long, env = "STUDENT_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Seed for the train/test shuffle and the forest
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of trees in the forest
    #[arg(long, default_value_t = 100)]
    pub trees: usize,

    /// Share of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub test_size: f64,

    /// Share of the features each tree is grown on
    #[arg(long, default_value_t = 0.7)]
    pub feature_fraction: f64,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if !self.delimiter.is_ascii() {
            return Err(AppError::InvalidInput(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )));
        }
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(AppError::InvalidInput(format!(
                "test size must be between 0 and 1, got {}",
                self.test_size
            )));
        }
        if !(self.feature_fraction > 0.0 && self.feature_fraction <= 1.0) {
            return Err(AppError::InvalidInput(format!(
                "feature fraction must be in (0, 1], got {}",
                self.feature_fraction
            )));
        }
        if self.trees == 0 {
            return Err(AppError::InvalidInput("at least one tree is required".into()));
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.trees,
            feature_fraction: self.feature_fraction,
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse_from(["student-pass"]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.delimiter_byte(), b',');
        assert_eq!(config.forest_params(), ForestParams::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = Config::parse_from(["student-pass", "--delimiter", ";"]);
        assert_eq!(config.delimiter_byte(), b';');

        config.test_size = 1.0;
        assert!(config.validate().is_err());

        config.test_size = 0.2;
        config.trees = 0;
        assert!(config.validate().is_err());
    }
}
