//! Training Data Loading
//!
//! ## Overview
//!
//! Loads the historical humidity/temperature series the model is fit on.
//! The file is plain CSV with a header row; the two columns of interest are
//! resolved by name so column order and extra columns don't matter:
//!
//! ```csv
//! Timestamp,Relative_humidity_room,Indoor_temperature_room,CO2_room
//! 2012-03-13 11:45,45.2,21.3,412
//! ```
//!
//! ## Failure Policy
//!
//! Loading happens once at startup and any malformed content is a hard
//! error: a bad row in the training file means a silently different model,
//! which is worse than refusing to start. This is the opposite of the live
//! serial path, where bad lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::info;

use crate::errors::{DatasetError, DatasetResult};
use crate::sample::Sample;

/// Header name of the humidity column
pub const HUMIDITY_COLUMN: &str = "Relative_humidity_room";
/// Header name of the temperature column
pub const TEMPERATURE_COLUMN: &str = "Indoor_temperature_room";

/// An ordered, immutable series of training samples
#[derive(Debug, Clone)]
pub struct TrainingData {
    samples: Vec<Sample>,
}

impl TrainingData {
    /// Load from a CSV file on disk
    pub fn from_csv(path: impl AsRef<Path>) -> DatasetResult<Self> {
        let file = File::open(path.as_ref())?;
        let data = Self::from_reader(file)?;
        info!(
            "loaded {} training samples from {}",
            data.len(),
            path.as_ref().display()
        );
        Ok(data)
    }

    /// Load from any CSV byte source (used by tests)
    pub fn from_reader(reader: impl Read) -> DatasetResult<Self> {
        let mut lines = BufReader::new(reader).lines();

        let header = match lines.next() {
            Some(line) => line?,
            None => return Err(DatasetError::MissingHeader),
        };

        let columns: Vec<&str> = header.split(',').map(str::trim).collect();
        let humidity_idx = find_column(&columns, HUMIDITY_COLUMN)?;
        let temperature_idx = find_column(&columns, TEMPERATURE_COLUMN)?;
        let expected = columns.len();

        let mut samples = Vec::new();
        for (i, line) in lines.enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            // Header is row 1
            let row = i + 2;

            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            if fields.len() < expected {
                return Err(DatasetError::ShortRow {
                    row,
                    found: fields.len(),
                    expected,
                });
            }

            let humidity = parse_field(fields[humidity_idx], row, HUMIDITY_COLUMN)?;
            let temperature = parse_field(fields[temperature_idx], row, TEMPERATURE_COLUMN)?;
            samples.push(Sample::new(humidity, temperature));
        }

        Ok(Self { samples })
    }

    /// Number of samples in the series
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the file contained no data rows
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The samples in file order
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

fn find_column(columns: &[&str], name: &'static str) -> DatasetResult<usize> {
    columns
        .iter()
        .position(|c| *c == name)
        .ok_or(DatasetError::MissingColumn(name))
}

fn parse_field(field: &str, row: usize, column: &'static str) -> DatasetResult<f32> {
    field.parse::<f32>().map_err(|_| DatasetError::BadField {
        row,
        column,
        value: field.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Timestamp,Relative_humidity_room,Indoor_temperature_room
1,45.0,21.5
2,46.5,21.0
3,44.0,20.5
";

    #[test]
    fn loads_named_columns() {
        let data = TrainingData::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.samples()[0], Sample::new(45.0, 21.5));
        assert_eq!(data.samples()[2], Sample::new(44.0, 20.5));
    }

    #[test]
    fn column_order_does_not_matter() {
        let csv = "Indoor_temperature_room,Relative_humidity_room\n21.5,45.0\n";
        let data = TrainingData::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(data.samples()[0], Sample::new(45.0, 21.5));
    }

    #[test]
    fn missing_column_is_fatal() {
        let csv = "Timestamp,Relative_humidity_room\n1,45.0\n";
        let err = TrainingData::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MissingColumn(TEMPERATURE_COLUMN)
        ));
    }

    #[test]
    fn bad_value_is_fatal() {
        let csv = "Relative_humidity_room,Indoor_temperature_room\n45.0,warm\n";
        let err = TrainingData::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::BadField { row: 2, .. }));
    }

    #[test]
    fn empty_file_has_no_header() {
        let err = TrainingData::from_reader("".as_bytes()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingHeader));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let csv = "Relative_humidity_room,Indoor_temperature_room\n45.0,21.5\n\n46.0,21.0\n";
        let data = TrainingData::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(data.len(), 2);
    }
}
