//! Student pass/fail dashboard.
//!
//! Loads a student-records CSV once, renders dataset, chart and help pages,
//! and serves pass/fail predictions from a random forest fitted at startup
//! on the six features age, studytime, failures, absences, G1 and G2.

pub mod charts;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod report;
pub mod server;
pub mod stats;
pub mod views;

pub use config::Config;
pub use data::{load_data, DataLoader, StudentTable};
pub use error::{AppError, Result};
pub use model::{train_model, ForestParams, PredictResponse, RandomForest, StudentInput, TrainedModel};
pub use server::{configure, start_server, AppState};
pub use views::{render, DashboardQuery, RenderContext, View};

/// Loads the dataset through `loader` and fits the model the dashboard serves.
pub fn build_state(loader: &DataLoader, config: &Config) -> Result<AppState> {
    let table = loader.load()?;
    let model = train_model(&table, config.test_size, config.forest_params())?;
    Ok(AppState { table, model })
}
