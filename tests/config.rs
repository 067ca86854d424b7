use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use mirmerge::config::{Config, ConfigLoader, SpeciesEntry, SpeciesEntryObject, default_columns};
use mirmerge::domain::Species;
use mirmerge::error::MirError;

#[test]
fn parse_config_shorthand_and_detailed() {
    let config = Config {
        species: vec![
            SpeciesEntry::Shorthand("mmu".to_string()),
            SpeciesEntry::Detailed(SpeciesEntryObject {
                code: "HSA".to_string(),
                sheet_name: Some("Homo sapiens".to_string()),
            }),
            SpeciesEntry::Detailed(SpeciesEntryObject {
                code: "cel".to_string(),
                sheet_name: None,
            }),
        ],
        ..Config::default()
    };

    let resolved = ConfigLoader::resolve_config(config).unwrap();
    let targets: Vec<(Species, &str)> = resolved
        .species
        .iter()
        .map(|target| (target.species, target.sheet_name.as_str()))
        .collect();
    assert_eq!(
        targets,
        vec![
            (Species::Mmu, "House mouse"),
            (Species::Hsa, "Homo sapiens"),
            (Species::Cel, "Roundworm"),
        ]
    );
}

#[test]
fn unknown_species_code_is_rejected() {
    let config = Config {
        species: vec![SpeciesEntry::Shorthand("rno".to_string())],
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, MirError::InvalidSpecies(code) if code == "rno");
}

#[test]
fn resolve_reads_json_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("mirmerge.json");
    fs::write(
        &path,
        r#"{
  "schema_version": 1,
  "data_dir": "cache",
  "output": "out/mirna.xlsx",
  "max_column_width": 30,
  "species": ["dme", {"code": "hsa", "sheet_name": "Human"}]
}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.data_dir, Utf8PathBuf::from("cache"));
    assert_eq!(resolved.output, Utf8PathBuf::from("out/mirna.xlsx"));
    assert_eq!(resolved.max_column_width, 30);
    assert_eq!(resolved.id_label, "MirGeneDB ID");
    assert_eq!(resolved.species.len(), 2);
    assert_eq!(resolved.species[0].sheet_name, "Fruit fly");

    let merge = resolved.merge_config();
    assert_eq!(merge.max_column_width, 30);
    assert_eq!(merge.columns, default_columns());
}

#[test]
fn explicit_missing_file_is_an_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, MirError::ConfigRead(_));
}

#[test]
fn malformed_json_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("mirmerge.json");
    fs::write(&path, "{ \"species\": 42 }").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, MirError::ConfigParse(_));
}

#[test]
fn restrict_species_keeps_configured_names() {
    let config = Config {
        species: vec![
            SpeciesEntry::Detailed(SpeciesEntryObject {
                code: "hsa".to_string(),
                sheet_name: Some("People".to_string()),
            }),
            SpeciesEntry::Shorthand("mmu".to_string()),
        ],
        ..Config::default()
    };
    let mut resolved = ConfigLoader::resolve_config(config).unwrap();
    resolved.restrict_species(&[Species::Cel, Species::Hsa]);

    let names: Vec<&str> = resolved
        .species
        .iter()
        .map(|target| target.sheet_name.as_str())
        .collect();
    assert_eq!(names, vec!["People", "Roundworm"]);
}

#[test]
fn absent_default_file_yields_defaults() {
    let resolved = ConfigLoader::resolve(None).unwrap();
    assert_eq!(resolved.output, Utf8PathBuf::from("merged_data.xlsx"));
    assert_eq!(resolved.base_url, "https://mirgenedb.org");
    let codes: Vec<Species> = resolved.species.iter().map(|t| t.species).collect();
    assert_eq!(codes, Species::ALL.to_vec());
}

fn detailed(code: &str, sheet_name: &str) -> SpeciesEntry {
    SpeciesEntry::Detailed(SpeciesEntryObject {
        code: code.to_string(),
        sheet_name: Some(sheet_name.to_string()),
    })
}

#[test]
fn duplicate_sheet_names_are_rejected() {
    let config = Config {
        species: vec![
            detailed("hsa", "Human"),
            detailed("mmu", "human"),
            SpeciesEntry::Shorthand("cel".to_string()),
        ],
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, MirError::InvalidConfig(message) if message.contains("human"));
}

#[test]
fn duplicate_species_are_rejected() {
    let config = Config {
        species: vec![
            SpeciesEntry::Shorthand("dme".to_string()),
            detailed("dme", "Fly"),
        ],
        ..Config::default()
    };
    let err = ConfigLoader::resolve_config(config).unwrap_err();
    assert_matches!(err, MirError::InvalidConfig(message) if message.contains("dme"));
}

#[test]
fn invalid_sheet_names_are_rejected() {
    for name in ["Mouse/Rat", "", "A name that is far too long for a sheet"] {
        let config = Config {
            species: vec![detailed("mmu", name)],
            ..Config::default()
        };
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, MirError::InvalidConfig(_));
    }
}
