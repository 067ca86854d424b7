//! Download MirGeneDB miRNA annotation data and merge it into one workbook.
//!
//! The pipeline has three stages sharing a local data directory ([`store`]):
//! downloading FASTA/coordinate files, saving each species' browse table as
//! CSV, and the [`merge`] stage that matches precursor, mature and star
//! sequences to every table row and writes one sheet per species.

pub mod acquire;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fasta;
pub mod html;
pub mod merge;
pub mod mirgenedb;
pub mod output;
pub mod resolve;
pub mod sheet;
pub mod store;
pub mod table;
