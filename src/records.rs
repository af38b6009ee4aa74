//! Loading label records from delimited tables.

use log::{debug, info};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// One label: the text encoded in the QR code plus an optional description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    label: String,
    description: String,
}

impl Record {
    pub fn new<L: Into<String>, D: Into<String>>(label: L, description: D) -> Self {
        Record {
            label: label.into(),
            description: description.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Read records from a CSV file with a header row.
///
/// Fails when the file can't be read or when the header lacks `label_column`.
/// A missing description column or a short row yields an empty description.
/// Row order is preserved.
pub fn load_records<P: AsRef<Path>>(
    path: P,
    label_column: &str,
    description_column: &str,
) -> Result<Vec<Record>, Error> {
    let path = path.as_ref();
    let reader = builder()
        .from_path(path)
        .map_err(|source| Error::Source {
            path: path.to_path_buf(),
            source,
        })?;
    let records = collect(reader, path, label_column, description_column)?;
    info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Read records from any CSV source, see [`load_records`].
pub fn read_records<R: io::Read>(
    rdr: R,
    label_column: &str,
    description_column: &str,
) -> Result<Vec<Record>, Error> {
    let reader = builder().from_reader(rdr);
    collect(reader, &PathBuf::from("<reader>"), label_column, description_column)
}

fn builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

fn collect<R: io::Read>(
    mut reader: csv::Reader<R>,
    origin: &Path,
    label_column: &str,
    description_column: &str,
) -> Result<Vec<Record>, Error> {
    let source_error = |source: csv::Error| Error::Source {
        path: origin.to_path_buf(),
        source,
    };

    let headers = reader.headers().map_err(source_error)?.clone();
    if headers.is_empty() {
        debug!("{} has no header row", origin.display());
        return Ok(Vec::new());
    }
    let label_idx = headers
        .iter()
        .position(|h| h == label_column)
        .ok_or_else(|| Error::MissingColumn(label_column.to_string()))?;
    let desc_idx = headers.iter().position(|h| h == description_column);
    if desc_idx.is_none() {
        debug!(
            "Column {:?} not found, descriptions will be empty",
            description_column
        );
    }

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(source_error)?;
        let label = row.get(label_idx).unwrap_or("");
        let description = desc_idx.and_then(|i| row.get(i)).unwrap_or("");
        records.push(Record::new(label, description));
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_in_order() {
        let data = "label,description\nA1,Tomato\nA2,Basil\nA3,\n";
        let records = read_records(data.as_bytes(), "label", "description").unwrap();
        assert_eq!(
            records,
            vec![
                Record::new("A1", "Tomato"),
                Record::new("A2", "Basil"),
                Record::new("A3", ""),
            ]
        );
    }

    #[test]
    fn columns_are_found_by_name() {
        let data = "notes,description,label\nx,Pepper,P-1\n";
        let records = read_records(data.as_bytes(), "label", "description").unwrap();
        assert_eq!(records, vec![Record::new("P-1", "Pepper")]);
    }

    #[test]
    fn missing_label_column_is_fatal() {
        let data = "name,description\nA1,Tomato\n";
        match read_records(data.as_bytes(), "label", "description") {
            Err(Error::MissingColumn(column)) => assert_eq!(column, "label"),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn missing_description_column_gives_empty_descriptions() {
        let data = "label\nA1\nA2\n";
        let records = read_records(data.as_bytes(), "label", "description").unwrap();
        assert_eq!(records, vec![Record::new("A1", ""), Record::new("A2", "")]);
    }

    #[test]
    fn short_rows_are_padded() {
        let data = "label,description\nA1\nA2,Chili\n";
        let records = read_records(data.as_bytes(), "label", "description").unwrap();
        assert_eq!(records, vec![Record::new("A1", ""), Record::new("A2", "Chili")]);
    }

    #[test]
    fn quoted_fields_keep_delimiters() {
        let data = "label,description\n\"B,7\",\"Sweet \"\"Genovese\"\" basil\"\n";
        let records = read_records(data.as_bytes(), "label", "description").unwrap();
        assert_eq!(records, vec![Record::new("B,7", "Sweet \"Genovese\" basil")]);
    }

    #[test]
    fn header_only_table_is_empty() {
        let records = read_records("label,description\n".as_bytes(), "label", "description")
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn empty_input_has_no_records() {
        let records = read_records("".as_bytes(), "label", "description").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn missing_file_is_a_source_error() {
        let result = load_records("/nonexistent/labels.csv", "label", "description");
        assert!(matches!(result, Err(Error::Source { .. })));
    }
}
