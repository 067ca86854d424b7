use camino::Utf8PathBuf;

use mirmerge::domain::{SequenceCategory, Species};
use mirmerge::fasta::SequenceMap;
use mirmerge::store::{Metadata, MetadataFile, Store};

fn temp_store(temp: &tempfile::TempDir) -> Store {
    Store::new(Utf8PathBuf::from_path_buf(temp.path().join("data")).unwrap())
}

#[test]
fn atomic_write_creates_parents_and_overwrites() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    let path = store.sequence_path(Species::Hsa, SequenceCategory::Precursor);

    Store::write_bytes_atomic(&path, b">Hsa-Mir-1_pre\nAAA\n").unwrap();
    Store::write_bytes_atomic(&path, b">Hsa-Mir-1_pre\nCCCC\n").unwrap();

    let map = SequenceMap::load(&path).unwrap().unwrap();
    assert_eq!(map.get("Hsa-Mir-1"), Some("CCCC"));
    assert!(SequenceMap::load(&store.sequence_path(Species::Hsa, SequenceCategory::Star))
        .unwrap()
        .is_none());
}

#[test]
fn metadata_round_trips_through_disk() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    let metadata = Metadata {
        species: Species::Dme,
        files: vec![MetadataFile {
            kind: "mature".to_string(),
            url: "https://mirgenedb.org/static/data/dme/dme-mat.fas".to_string(),
            path: store
                .sequence_path(Species::Dme, SequenceCategory::Mature)
                .to_string(),
        }],
        downloaded_at: "2026-01-01T00:00:00+00:00".to_string(),
        tool: "mirmerge/0.1.0".to_string(),
    };

    store.write_metadata(&metadata).unwrap();
    assert_eq!(store.read_metadata(Species::Dme).unwrap(), Some(metadata));
    assert_eq!(store.read_metadata(Species::Hsa).unwrap(), None);
}

#[test]
fn clear_removes_data_directory() {
    let temp = tempfile::tempdir().unwrap();
    let store = temp_store(&temp);
    assert!(!store.clear().unwrap());

    store.ensure_root().unwrap();
    Store::write_bytes_atomic(&store.table_path(Species::Cel), b"MirGeneDB ID\n").unwrap();
    assert!(store.clear().unwrap());
    assert!(!store.exists(store.root()));
}
