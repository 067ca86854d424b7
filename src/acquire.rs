//! Turning scraped MirGeneDB tables into download links and CSV files.

use csv::WriterBuilder;
use url::Url;

use crate::domain::{DownloadKind, Species};
use crate::error::MirError;
use crate::html::{HtmlCell, HtmlTable};
use crate::mirgenedb::resolve_href;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadLink {
    pub kind: DownloadKind,
    pub url: Url,
}

/// Finds the row of `species` in the download table (matched on the latin
/// name in the first cell) and resolves the link of every [`DownloadKind`].
pub fn species_links(
    table: &HtmlTable,
    species: Species,
    base_url: &str,
) -> Result<Vec<DownloadLink>, MirError> {
    let row = table
        .body_rows
        .iter()
        .find(|row| {
            row.first()
                .map(|cell| cell.text.contains(species.latin_name()))
                .unwrap_or(false)
        })
        .ok_or_else(|| MirError::MissingLink {
            species: species.to_string(),
            category: "species row".to_string(),
        })?;

    DownloadKind::ALL
        .into_iter()
        .map(|kind| {
            let href = table
                .column_index(kind.column_label())
                .and_then(|index| row.get(index))
                .and_then(|cell| cell.href.as_deref())
                .filter(|href| !href.is_empty())
                .ok_or_else(|| MirError::MissingLink {
                    species: species.to_string(),
                    category: kind.column_label().to_string(),
                })?;
            Ok(DownloadLink {
                kind,
                url: resolve_href(base_url, href)?,
            })
        })
        .collect()
}

/// Header rows first, then body rows, cell text only.
pub fn table_to_csv(table: &HtmlTable) -> Result<Vec<u8>, MirError> {
    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
    for row in table.header_rows.iter().chain(&table.body_rows) {
        writer
            .write_record(row.iter().map(|cell: &HtmlCell| cell.text.as_str()))
            .map_err(|err| MirError::Filesystem(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| MirError::Filesystem(err.to_string()))
}
