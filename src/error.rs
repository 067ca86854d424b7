use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum MirError {
    #[error("invalid species code: {0} (expected one of hsa, mmu, dme, cel)")]
    InvalidSpecies(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("record table not found: {0}")]
    MissingTable(String),

    #[error("no column containing {label:?} in {path}")]
    MissingIdColumn { label: String, path: String },

    #[error("failed to read record table {path}: {message}")]
    TableParse { path: String, message: String },

    #[error("failed to read FASTA {0}")]
    FastaParse(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("MirGeneDB request failed: {0}")]
    Http(String),

    #[error("MirGeneDB returned status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("no {category} link for {species} on the download page")]
    MissingLink { species: String, category: String },

    #[error("no table found at {0}")]
    MissingHtmlTable(String),

    #[error("workbook error: {0}")]
    Workbook(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl From<rust_xlsxwriter::XlsxError> for MirError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        MirError::Workbook(err.to_string())
    }
}
