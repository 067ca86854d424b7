use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::MirError;

/// Placeholder written when no sequence can be resolved for a field.
pub const NOT_AVAILABLE: &str = "N/A";

pub const ID_COLUMN: &str = "MirGeneDB ID";
pub const SEED_COLUMN: &str = "Seed";
pub const PRECURSOR_SEQUENCE: &str = "Precursor sequence";
pub const MATURE_SEQUENCE: &str = "Mature sequence";
pub const STAR_SEQUENCE: &str = "Star sequence";
pub const MATURE_LOCATION: &str = "Mature location";
pub const PRECURSOR_LENGTH: &str = "Precursor length";
pub const MATURE_LENGTH: &str = "Mature length";
pub const STAR_LENGTH: &str = "Star length";

pub const OUTPUT_COLUMNS: [&str; 15] = [
    ID_COLUMN,
    "MiRBase ID",
    "Family",
    SEED_COLUMN,
    "Chromosome",
    "Start",
    "End",
    "Strand",
    PRECURSOR_SEQUENCE,
    MATURE_SEQUENCE,
    STAR_SEQUENCE,
    MATURE_LOCATION,
    PRECURSOR_LENGTH,
    MATURE_LENGTH,
    STAR_LENGTH,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Species {
    Hsa,
    Mmu,
    Dme,
    Cel,
}

impl Species {
    pub const ALL: [Species; 4] = [Species::Hsa, Species::Mmu, Species::Dme, Species::Cel];

    pub fn code(&self) -> &'static str {
        match self {
            Species::Hsa => "hsa",
            Species::Mmu => "mmu",
            Species::Dme => "dme",
            Species::Cel => "cel",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Species::Hsa => "Human",
            Species::Mmu => "House mouse",
            Species::Dme => "Fruit fly",
            Species::Cel => "Roundworm",
        }
    }

    /// Name used in the first column of the MirGeneDB download table.
    pub fn latin_name(&self) -> &'static str {
        match self {
            Species::Hsa => "Homo sapiens",
            Species::Mmu => "Mus musculus",
            Species::Dme => "Drosophila melanogaster",
            Species::Cel => "Caenorhabditis elegans",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Species {
    type Err = MirError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "hsa" => Ok(Species::Hsa),
            "mmu" => Ok(Species::Mmu),
            "dme" => Ok(Species::Dme),
            "cel" => Ok(Species::Cel),
            _ => Err(MirError::InvalidSpecies(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arm {
    FivePrime,
    ThreePrime,
}

impl Arm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Arm::FivePrime => "5p",
            Arm::ThreePrime => "3p",
        }
    }

    pub fn opposite(&self) -> Arm {
        match self {
            Arm::FivePrime => Arm::ThreePrime,
            Arm::ThreePrime => Arm::FivePrime,
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Arm carrying the mature product of a record, or `N/A` when the mature
/// FASTA has neither arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatureLocation {
    Arm(Arm),
    NotAvailable,
}

impl MatureLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatureLocation::Arm(arm) => arm.as_str(),
            MatureLocation::NotAvailable => NOT_AVAILABLE,
        }
    }

    /// Arm searched for the star sequence. Anything that is not `5p`,
    /// including `N/A`, targets `5p`.
    pub fn star_target(&self) -> Arm {
        match self {
            MatureLocation::Arm(Arm::FivePrime) => Arm::ThreePrime,
            _ => Arm::FivePrime,
        }
    }
}

impl fmt::Display for MatureLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceCategory {
    Precursor,
    Mature,
    Star,
}

impl SequenceCategory {
    pub const ALL: [SequenceCategory; 3] = [
        SequenceCategory::Precursor,
        SequenceCategory::Mature,
        SequenceCategory::Star,
    ];

    pub fn file_suffix(&self) -> &'static str {
        match self {
            SequenceCategory::Precursor => "pre",
            SequenceCategory::Mature => "mature",
            SequenceCategory::Star => "star",
        }
    }
}

impl fmt::Display for SequenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_suffix())
    }
}

/// Files offered per species on the MirGeneDB download page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadKind {
    Sequences(SequenceCategory),
    Coordinates,
}

impl DownloadKind {
    pub const ALL: [DownloadKind; 4] = [
        DownloadKind::Sequences(SequenceCategory::Precursor),
        DownloadKind::Sequences(SequenceCategory::Mature),
        DownloadKind::Sequences(SequenceCategory::Star),
        DownloadKind::Coordinates,
    ];

    /// Column header of the download table holding the link.
    pub fn column_label(&self) -> &'static str {
        match self {
            DownloadKind::Sequences(SequenceCategory::Precursor) => "Precursor sequences",
            DownloadKind::Sequences(SequenceCategory::Mature) => "Mature sequences",
            DownloadKind::Sequences(SequenceCategory::Star) => "Star sequences",
            DownloadKind::Coordinates => "Genomic coordinates",
        }
    }

    pub fn file_suffix(&self) -> &'static str {
        match self {
            DownloadKind::Sequences(category) => category.file_suffix(),
            DownloadKind::Coordinates => "gff",
        }
    }
}

impl fmt::Display for DownloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_suffix())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_species_code() {
        let species: Species = " MMU ".parse().unwrap();
        assert_eq!(species, Species::Mmu);
        assert_eq!(species.display_name(), "House mouse");
    }

    #[test]
    fn parse_species_invalid() {
        let err = "rno".parse::<Species>().unwrap_err();
        assert_matches!(err, MirError::InvalidSpecies(_));
    }

    #[test]
    fn star_target_of_not_available_is_five_prime() {
        assert_eq!(MatureLocation::NotAvailable.star_target(), Arm::FivePrime);
        assert_eq!(
            MatureLocation::Arm(Arm::FivePrime).star_target(),
            Arm::ThreePrime
        );
        assert_eq!(
            MatureLocation::Arm(Arm::ThreePrime).star_target(),
            Arm::FivePrime
        );
    }
}
