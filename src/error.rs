use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the metadata table.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read CSV table {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("CSV table {} has no 'fileIdentifier' column", .0.display())]
    MissingKeyColumn(PathBuf),
}
