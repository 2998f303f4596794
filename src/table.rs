use std::collections::HashMap;
use std::path::Path;

use csv::ReaderBuilder;

use crate::error::MetadataError;

/// A single CSV row: column name to string value, missing cells as "".
pub type Record = HashMap<String, String>;

/// Metadata table loaded from CSV, keyed by the `fileIdentifier` column.
///
/// Every value is kept as a raw string. Rows sharing an identifier are not
/// deduplicated; the last occurrence wins.
#[derive(Debug, Default)]
pub struct MetadataTable {
    records: HashMap<String, Record>,
}

impl MetadataTable {
    pub fn from_csv(path: &Path) -> Result<Self, MetadataError> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|source| MetadataError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

        let headers = reader
            .headers()
            .map_err(|source| MetadataError::Csv {
                path: path.to_path_buf(),
                source,
            })?
            .clone();

        let key_index = headers
            .iter()
            .position(|h| h == "fileIdentifier")
            .ok_or_else(|| MetadataError::MissingKeyColumn(path.to_path_buf()))?;

        let mut records = HashMap::new();
        for result in reader.records() {
            let row = result.map_err(|source| MetadataError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

            // Short rows pad out to empty strings so templates never see
            // missing fields.
            let mut record = Record::with_capacity(headers.len());
            for (i, header) in headers.iter().enumerate() {
                record.insert(header.to_string(), row.get(i).unwrap_or("").to_string());
            }

            let key = row.get(key_index).unwrap_or("").to_string();
            records.insert(key, record);
        }

        Ok(Self { records })
    }

    pub fn get(&self, identifier: &str) -> Option<&Record> {
        self.records.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
