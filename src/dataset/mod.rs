//! Dataset Module - CSV ingestion of ventilator breath data
//!
//! Parses the Kaggle-style layout `id,breath_id,R,C,time_step,u_in,u_out[,pressure]`
//! into typed rows. Unknown columns are ignored.

pub mod record;

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub use record::BreathRow;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("dataset is empty")]
    Empty,

    #[error("the dataset must have a \"pressure\" column")]
    MissingPressure,
}

/// Rows of an uploaded file, in upload order
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<BreathRow>,
}

impl Dataset {
    pub fn new(rows: Vec<BreathRow>) -> Self {
        Self { rows }
    }

    /// Parse CSV with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let rows = csv_reader
            .deserialize::<BreathRow>()
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Parsed {} rows", rows.len());
        Ok(Self { rows })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DatasetError> {
        Self::from_reader(bytes)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DatasetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn rows(&self) -> &[BreathRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep only the first `limit` rows. A limit of 0 keeps everything.
    pub fn truncate(&mut self, limit: usize) {
        if limit > 0 && self.rows.len() > limit {
            self.rows.truncate(limit);
        }
    }

    /// Number of distinct breath cycles
    pub fn breath_count(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.breath_id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// True when every row carries a target pressure
    pub fn has_pressure(&self) -> bool {
        !self.rows.is_empty() && self.rows.iter().all(|r| r.pressure.is_some())
    }

    /// Fail unless the dataset can be used for training
    pub fn ensure_trainable(&self) -> Result<(), DatasetError> {
        if self.is_empty() {
            return Err(DatasetError::Empty);
        }
        if !self.has_pressure() {
            return Err(DatasetError::MissingPressure);
        }
        Ok(())
    }

    /// Inclusive id range, `None` when empty
    pub fn id_range(&self) -> Option<(u64, u64)> {
        let min = self.rows.iter().map(|r| r.id).min()?;
        let max = self.rows.iter().map(|r| r.id).max()?;
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRAIN_CSV: &str = "\
id,breath_id,R,C,time_step,u_in,u_out,pressure
1,1,20,50,0.0,0.08,0,5.84
2,1,20,50,0.03,18.38,0,5.91
3,1,20,50,0.07,22.51,0,7.88
4,2,5,10,0.0,1.5,1,6.1
";

    const TEST_CSV: &str = "\
id,breath_id,R,C,time_step,u_in,u_out
10,7,50,20,0.0,0.0,0
11,7,50,20,0.03,4.2,0
";

    #[test]
    fn test_parse_train_file() {
        let ds = Dataset::from_bytes(TRAIN_CSV.as_bytes()).unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.breath_count(), 2);
        assert!(ds.has_pressure());
        assert_eq!(ds.rows()[1].u_in, 18.38);
        assert_eq!(ds.rows()[0].r, 20.0);
        assert_eq!(ds.id_range(), Some((1, 4)));
        assert!(ds.ensure_trainable().is_ok());
    }

    #[test]
    fn test_parse_test_file_without_pressure() {
        let ds = Dataset::from_bytes(TEST_CSV.as_bytes()).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(!ds.has_pressure());
        assert!(ds.rows().iter().all(|r| r.pressure.is_none()));
        assert!(matches!(ds.ensure_trainable(), Err(DatasetError::MissingPressure)));
    }

    #[test]
    fn test_missing_required_column_is_error() {
        let csv = "id,breath_id,R,C,time_step,u_in\n1,1,20,50,0.0,0.1\n";
        assert!(matches!(Dataset::from_bytes(csv.as_bytes()), Err(DatasetError::Csv(_))));
    }

    #[test]
    fn test_extra_columns_ignored() {
        let csv = "id,breath_id,R,C,time_step,u_in,u_out,note\n1,1,20,50,0.0,0.1,0,x\n";
        let ds = Dataset::from_bytes(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn test_truncate() {
        let mut ds = Dataset::from_bytes(TRAIN_CSV.as_bytes()).unwrap();
        ds.truncate(0);
        assert_eq!(ds.len(), 4);
        ds.truncate(2);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.breath_count(), 1);
    }

    #[test]
    fn test_empty_dataset() {
        let ds = Dataset::from_bytes(b"id,breath_id,R,C,time_step,u_in,u_out\n").unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.id_range(), None);
        assert!(matches!(ds.ensure_trainable(), Err(DatasetError::Empty)));
    }

    #[test]
    fn test_reference_pressure() {
        let ds = Dataset::from_bytes(TRAIN_CSV.as_bytes()).unwrap();
        let row = &ds.rows()[1];
        let expected = 20.0 * 18.38 * 0.1 + (1.0 / 50.0) * 0.03 * 0.5;
        assert!((row.reference_pressure().unwrap() - expected).abs() < 1e-12);

        let zero_c = BreathRow { c: 0.0, ..row.clone() };
        assert_eq!(zero_c.reference_pressure(), None);
    }
}
