use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::domain::{DownloadKind, SequenceCategory, Species};
use crate::error::MirError;

/// Local data directory shared by the download and merge stages.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn table_path(&self, species: Species) -> Utf8PathBuf {
        self.root.join(format!("{}.csv", species.code()))
    }

    pub fn sequence_path(&self, species: Species, category: SequenceCategory) -> Utf8PathBuf {
        self.download_path(species, DownloadKind::Sequences(category))
    }

    pub fn download_path(&self, species: Species, kind: DownloadKind) -> Utf8PathBuf {
        let extension = match kind {
            DownloadKind::Sequences(_) => "fas",
            DownloadKind::Coordinates => "gff",
        };
        self.root
            .join(format!("{}_{}.{extension}", species.code(), kind.file_suffix()))
    }

    pub fn metadata_path(&self, species: Species) -> Utf8PathBuf {
        self.root
            .join("metadata")
            .join(format!("{}.json", species.code()))
    }

    pub fn ensure_root(&self) -> Result<(), MirError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| MirError::Filesystem(err.to_string()))
    }

    pub fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().exists()
    }

    pub fn clear(&self) -> Result<bool, MirError> {
        if !self.root.as_std_path().exists() {
            return Ok(false);
        }
        fs::remove_dir_all(self.root.as_std_path())
            .map_err(|err| MirError::Filesystem(err.to_string()))?;
        Ok(true)
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), MirError> {
        let parent = path
            .parent()
            .ok_or_else(|| MirError::Filesystem("invalid destination path".to_string()))?;
        fs::create_dir_all(parent.as_std_path())
            .map_err(|err| MirError::Filesystem(err.to_string()))?;
        let temp = tempfile::Builder::new()
            .prefix("mirmerge-file")
            .tempfile_in(parent.as_std_path())
            .map_err(|err| MirError::Filesystem(err.to_string()))?;
        fs::write(temp.path(), content).map_err(|err| MirError::Filesystem(err.to_string()))?;
        temp.persist(path.as_std_path())
            .map_err(|err| MirError::Filesystem(err.to_string()))?;
        Ok(())
    }

    pub fn write_metadata(&self, metadata: &Metadata) -> Result<(), MirError> {
        let content = serde_json::to_vec_pretty(metadata)
            .map_err(|err| MirError::Filesystem(err.to_string()))?;
        Self::write_bytes_atomic(&self.metadata_path(metadata.species), &content)
    }

    pub fn read_metadata(&self, species: Species) -> Result<Option<Metadata>, MirError> {
        let path = self.metadata_path(species);
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| MirError::Filesystem(err.to_string()))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|err| MirError::Filesystem(format!("{path}: {err}")))
    }
}

/// Download manifest for one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub species: Species,
    pub files: Vec<MetadataFile>,
    pub downloaded_at: String,
    pub tool: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataFile {
    pub kind: String,
    pub url: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths() {
        let store = Store::new("data");
        assert_eq!(store.table_path(Species::Hsa), "data/hsa.csv");
        assert_eq!(
            store.sequence_path(Species::Mmu, SequenceCategory::Mature),
            "data/mmu_mature.fas"
        );
        assert_eq!(
            store.download_path(Species::Cel, DownloadKind::Coordinates),
            "data/cel_gff.gff"
        );
        assert!(store.metadata_path(Species::Dme).ends_with("metadata/dme.json"));
    }

    #[test]
    fn metadata_round_trip_on_disk() {
        let temp = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(temp.path().join("data")).unwrap();
        let store = Store::new(root);
        assert!(store.read_metadata(Species::Hsa).unwrap().is_none());

        let meta = Metadata {
            species: Species::Hsa,
            files: vec![MetadataFile {
                kind: "mature".to_string(),
                url: "https://mirgenedb.org/fasta/hsa?mat=1".to_string(),
                path: store
                    .sequence_path(Species::Hsa, SequenceCategory::Mature)
                    .to_string(),
            }],
            downloaded_at: "2024-01-01T00:00:00+00:00".to_string(),
            tool: "mirmerge/0.1.0".to_string(),
        };
        store.write_metadata(&meta).unwrap();
        assert_eq!(store.read_metadata(Species::Hsa).unwrap(), Some(meta));
    }
}
