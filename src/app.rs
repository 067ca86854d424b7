use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use crate::acquire::{species_links, table_to_csv};
use crate::config::{MergeConfig, SpeciesTarget};
use crate::domain::{DownloadKind, SequenceCategory, Species};
use crate::error::MirError;
use crate::html::{HtmlTable, extract_tables};
use crate::merge::{MergeEngine, MergeSummary};
use crate::mirgenedb::{MirGeneDbClient, browse_url, download_page_url};
use crate::sheet::XlsxWorkbook;
use crate::store::{Metadata, MetadataFile, Store};

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchOptions {
    pub force: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub items: Vec<FetchItemResult>,
    pub failures: Vec<FetchFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchItemResult {
    pub species: Species,
    pub kind: String,
    pub url: String,
    pub path: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FetchFailure {
    pub species: Species,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResult {
    pub data_dir: String,
    pub species: Vec<StatusEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusEntry {
    pub species: Species,
    pub sheet_name: String,
    pub table: bool,
    pub precursor: bool,
    pub mature: bool,
    pub star: bool,
    pub coordinates: bool,
    pub downloaded_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearResult {
    pub cleared: bool,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

impl ProgressEvent {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            elapsed: None,
        }
    }
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<C: MirGeneDbClient> {
    store: Store,
    client: C,
    base_url: String,
}

impl<C: MirGeneDbClient> App<C> {
    pub fn new(store: Store, client: C, base_url: impl Into<String>) -> Self {
        Self {
            store,
            client,
            base_url: base_url.into(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Downloads the FASTA and coordinate files of every target from the
    /// MirGeneDB download page. A species whose links cannot be resolved or
    /// downloaded is reported in `failures`; the others still proceed.
    pub fn download(
        &self,
        targets: &[SpeciesTarget],
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, MirError> {
        let page_url = download_page_url(&self.base_url);
        sink.event(ProgressEvent::message(format!("fetching links from {page_url}")));
        let table = self.first_table(&page_url, sink)?;

        if !options.dry_run {
            self.store.ensure_root()?;
        }

        let mut items = Vec::new();
        let mut failures = Vec::new();
        for target in targets {
            match self.download_species(&table, target, options, sink) {
                Ok(mut species_items) => items.append(&mut species_items),
                Err(err) => {
                    warn!(species = %target.species, error = %err, "download failed");
                    sink.event(ProgressEvent::message(format!(
                        "download failed for {}: {err}",
                        target.sheet_name
                    )));
                    failures.push(FetchFailure {
                        species: target.species,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(FetchResult { items, failures })
    }

    /// Saves the first table of each species' browse page as `{code}.csv`.
    pub fn fetch_tables(
        &self,
        targets: &[SpeciesTarget],
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchResult, MirError> {
        if !options.dry_run {
            self.store.ensure_root()?;
        }

        let mut items = Vec::new();
        let mut failures = Vec::new();
        for target in targets {
            match self.fetch_species_table(target, options, sink) {
                Ok(item) => items.push(item),
                Err(err) => {
                    warn!(species = %target.species, error = %err, "table fetch failed");
                    sink.event(ProgressEvent::message(format!(
                        "no table for {}: {err}",
                        target.sheet_name
                    )));
                    failures.push(FetchFailure {
                        species: target.species,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(FetchResult { items, failures })
    }

    /// Runs the merge engine over the store and saves the workbook.
    pub fn merge(
        &self,
        config: MergeConfig,
        output: &camino::Utf8Path,
        sink: &dyn ProgressSink,
    ) -> Result<MergeSummary, MirError> {
        sink.event(ProgressEvent::message(format!(
            "Starting merge... Saving to '{output}'"
        )));
        let mut workbook = XlsxWorkbook::new(output, config.max_column_width);
        let engine = MergeEngine::new(config, self.store.clone());
        let mut summary = engine.run(&mut workbook, sink)?;

        if summary.written() == 0 {
            warn!("no species merged; workbook not written");
            sink.event(ProgressEvent::message("nothing to write"));
            return Ok(summary);
        }
        let saved = workbook.save()?;
        let absolute = std::path::absolute(saved.as_std_path())
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| saved.to_string());
        info!(output = %absolute, "workbook saved");
        sink.event(ProgressEvent::message(format!("Done! Saved to {absolute}")));
        summary.output = Some(absolute);
        Ok(summary)
    }

    pub fn status(&self, targets: &[SpeciesTarget]) -> Result<StatusResult, MirError> {
        let mut species = Vec::new();
        for target in targets {
            let code = target.species;
            let exists =
                |kind: DownloadKind| self.store.exists(&self.store.download_path(code, kind));
            species.push(StatusEntry {
                species: code,
                sheet_name: target.sheet_name.clone(),
                table: self.store.exists(&self.store.table_path(code)),
                precursor: exists(DownloadKind::Sequences(SequenceCategory::Precursor)),
                mature: exists(DownloadKind::Sequences(SequenceCategory::Mature)),
                star: exists(DownloadKind::Sequences(SequenceCategory::Star)),
                coordinates: exists(DownloadKind::Coordinates),
                downloaded_at: self
                    .store
                    .read_metadata(code)?
                    .map(|meta| meta.downloaded_at),
            });
        }
        Ok(StatusResult {
            data_dir: self.store.root().to_string(),
            species,
        })
    }

    pub fn clear(&self, sink: &dyn ProgressSink) -> Result<ClearResult, MirError> {
        sink.event(ProgressEvent::message(format!(
            "clearing data directory {}",
            self.store.root()
        )));
        let cleared = self.store.clear()?;
        Ok(ClearResult { cleared })
    }

    fn first_table(&self, url: &str, sink: &dyn ProgressSink) -> Result<HtmlTable, MirError> {
        let start = Instant::now();
        let html = self.client.fetch_text(url)?;
        sink.event(ProgressEvent {
            message: format!("GET {url}"),
            elapsed: Some(start.elapsed()),
        });
        extract_tables(&html)
            .into_iter()
            .next()
            .ok_or_else(|| MirError::MissingHtmlTable(url.to_string()))
    }

    fn download_species(
        &self,
        table: &HtmlTable,
        target: &SpeciesTarget,
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<FetchItemResult>, MirError> {
        let species = target.species;
        let links = species_links(table, species, &self.base_url)?;

        let mut items = Vec::new();
        let mut files = Vec::new();
        for link in links {
            let path = self.store.download_path(species, link.kind);
            let action = if !options.force && self.store.exists(&path) {
                "present"
            } else if options.dry_run {
                "dry-run"
            } else {
                let start = Instant::now();
                let bytes = self.client.fetch_bytes(link.url.as_str())?;
                Store::write_bytes_atomic(&path, &bytes)?;
                sink.event(ProgressEvent {
                    message: format!(
                        "downloading {} - {} -> {path}",
                        target.sheet_name,
                        link.kind.column_label()
                    ),
                    elapsed: Some(start.elapsed()),
                });
                "download"
            };
            files.push(MetadataFile {
                kind: link.kind.to_string(),
                url: link.url.to_string(),
                path: path.to_string(),
            });
            items.push(FetchItemResult {
                species,
                kind: link.kind.to_string(),
                url: link.url.to_string(),
                path: path.to_string(),
                action: action.to_string(),
            });
        }

        if !options.dry_run {
            self.store.write_metadata(&Metadata {
                species,
                files,
                downloaded_at: chrono::Utc::now().to_rfc3339(),
                tool: format!("mirmerge/{}", env!("CARGO_PKG_VERSION")),
            })?;
        }
        Ok(items)
    }

    fn fetch_species_table(
        &self,
        target: &SpeciesTarget,
        options: FetchOptions,
        sink: &dyn ProgressSink,
    ) -> Result<FetchItemResult, MirError> {
        let url = browse_url(&self.base_url, target.species);
        let path = self.store.table_path(target.species);
        sink.event(ProgressEvent::message(format!(
            "processing {} from {url}",
            target.sheet_name
        )));

        let action = if !options.force && self.store.exists(&path) {
            "present"
        } else if options.dry_run {
            "dry-run"
        } else {
            let table = self.first_table(&url, sink)?;
            let csv = table_to_csv(&table)?;
            Store::write_bytes_atomic(&path, &csv)?;
            "download"
        };

        Ok(FetchItemResult {
            species: target.species,
            kind: "table".to_string(),
            url,
            path: path.to_string(),
            action: action.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::JsonOutput;
    use camino::Utf8PathBuf;

    struct OfflineClient;

    impl MirGeneDbClient for OfflineClient {
        fn fetch_text(&self, url: &str) -> Result<String, MirError> {
            Err(MirError::Http(format!("offline: {url}")))
        }

        fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, MirError> {
            Err(MirError::Http(format!("offline: {url}")))
        }
    }

    #[test]
    fn existing_table_is_not_refetched() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("data")).unwrap();
        let store = Store::new(root);
        Store::write_bytes_atomic(&store.table_path(Species::Cel), b"MirGeneDB ID\n").unwrap();

        let app = App::new(store, OfflineClient, "https://mirgenedb.org");
        let targets = [SpeciesTarget::from(Species::Cel), SpeciesTarget::from(Species::Dme)];
        let result = app
            .fetch_tables(&targets, FetchOptions::default(), &JsonOutput)
            .unwrap();

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].action, "present");
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].species, Species::Dme);
    }
}
