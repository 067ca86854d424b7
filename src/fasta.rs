use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::sync::LazyLock;

use bio::io::fasta;
use camino::Utf8Path;
use regex::Regex;

use crate::domain::Arm;
use crate::error::MirError;

static VERSION_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-_]v\d+").expect("version tag pattern"));

/// Identifier parsed out of a MirGeneDB FASTA header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderKey {
    pub base: String,
    pub arm: Option<Arm>,
}

impl HeaderKey {
    /// Lookup key in a [`SequenceMap`]: `{base}_{arm}` or the bare base.
    pub fn key(&self) -> String {
        match self.arm {
            Some(arm) => arm_key(&self.base, arm.as_str()),
            None => self.base.clone(),
        }
    }
}

pub fn arm_key(base: &str, arm: &str) -> String {
    format!("{base}_{arm}")
}

/// Strips `>`/`*` markers and version tags, then splits off the arm suffix.
pub fn normalize_header(header: &str) -> HeaderKey {
    let raw = header.trim().replace(['>', '*'], "");
    let clean = VERSION_TAG.replace_all(&raw, "").into_owned();

    if let Some(base) = clean.strip_suffix("_5p") {
        HeaderKey {
            base: base.to_string(),
            arm: Some(Arm::FivePrime),
        }
    } else if let Some(base) = clean.strip_suffix("_3p") {
        HeaderKey {
            base: base.to_string(),
            arm: Some(Arm::ThreePrime),
        }
    } else if let Some(base) = clean.strip_suffix("_pre") {
        HeaderKey {
            base: base.to_string(),
            arm: None,
        }
    } else {
        HeaderKey {
            base: clean,
            arm: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceMap {
    sequences: HashMap<String, String>,
}

impl SequenceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, sequence: impl Into<String>) {
        self.sequences.insert(key.into(), sequence.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.sequences.get(key).map(String::as_str)
    }

    /// Like [`SequenceMap::get`] but treats an empty sequence as missing.
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|seq| !seq.is_empty())
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Builds the map from FASTA records; a repeated key keeps the last
    /// sequence.
    pub fn parse<R: Read>(reader: R) -> Result<Self, MirError> {
        let mut map = SequenceMap::new();
        for result in fasta::Reader::new(reader).records() {
            let record = result.map_err(|err| MirError::FastaParse(err.to_string()))?;
            let sequence = String::from_utf8(record.seq().to_vec())
                .map_err(|err| MirError::FastaParse(format!("{}: {err}", record.id())))?;
            map.insert(normalize_header(record.id()).key(), sequence);
        }
        Ok(map)
    }

    /// Reads a FASTA file. `Ok(None)` means the file does not exist.
    pub fn load(path: &Utf8Path) -> Result<Option<Self>, MirError> {
        if !path.as_std_path().exists() {
            return Ok(None);
        }
        let file = File::open(path.as_std_path())
            .map_err(|err| MirError::Filesystem(format!("open {path}: {err}")))?;
        match Self::parse(file) {
            Ok(map) => Ok(Some(map)),
            Err(MirError::FastaParse(message)) => {
                Err(MirError::FastaParse(format!("{path}: {message}")))
            }
            Err(err) => Err(err),
        }
    }
}

impl FromIterator<(String, String)> for SequenceMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            sequences: iter.into_iter().collect(),
        }
    }
}
