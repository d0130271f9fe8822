use csv::ReaderBuilder;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use crate::error::{AppError, Result};

/// The student records as read from disk. Cells are kept as text; numeric
/// views are derived on demand.
#[derive(Debug, Clone)]
pub struct StudentTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl StudentTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AppError::MissingColumn(name.to_string()))
    }

    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let idx = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, record)| {
                let cell = record.get(idx).map_or("", |c| c.trim());
                cell.parse::<f64>().map_err(|_| AppError::NonNumeric {
                    column: name.to_string(),
                    row,
                    value: cell.to_string(),
                })
            })
            .collect()
    }

    /// Columns whose every cell parses as a number, in table order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(idx, _)| {
                !self.rows.is_empty()
                    && self
                        .rows
                        .iter()
                        .all(|r| r.get(*idx).is_some_and(|c| c.trim().parse::<f64>().is_ok()))
            })
            .map(|(_, h)| h.clone())
            .collect()
    }

    /// Resolves a column selection against the table. Unknown names are
    /// dropped, order follows the table, and an empty request selects every
    /// column.
    pub fn select_columns(&self, requested: &[String]) -> Vec<usize> {
        let picked: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| requested.iter().any(|r| r == *h))
            .map(|(idx, _)| idx)
            .collect();

        if picked.is_empty() {
            (0..self.headers.len()).collect()
        } else {
            picked
        }
    }
}

pub fn load_data(path: &Path, delimiter: u8) -> Result<StudentTable> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)?;

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let mut rows = Vec::new();

    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    if rows.is_empty() {
        return Err(AppError::EmptyDataset {
            path: path.display().to_string(),
        });
    }

    debug!(columns = headers.len(), "parsed header");
    Ok(StudentTable::new(headers, rows))
}

/// Reads the dataset once and hands out the same table afterwards.
#[derive(Debug)]
pub struct DataLoader {
    path: PathBuf,
    delimiter: u8,
    cache: OnceLock<Arc<StudentTable>>,
}

impl DataLoader {
    pub fn new(path: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            path: path.into(),
            delimiter,
            cache: OnceLock::new(),
        }
    }

    pub fn load(&self) -> Result<Arc<StudentTable>> {
        if let Some(table) = self.cache.get() {
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(load_data(&self.path, self.delimiter)?);
        info!(
            path = %self.path.display(),
            records = table.nrows(),
            "loaded student records"
        );
        // A racing caller may have filled the cell first; either copy is identical.
        Ok(Arc::clone(self.cache.get_or_init(|| table)))
    }

    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }
}
