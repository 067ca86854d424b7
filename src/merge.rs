use serde::Serialize;
use tracing::{error, info, warn};

use crate::app::{ProgressEvent, ProgressSink};
use crate::config::{MergeConfig, SpeciesTarget, validate_targets};
use crate::domain::{
    ID_COLUMN, MATURE_LENGTH, MATURE_LOCATION, MATURE_SEQUENCE, PRECURSOR_LENGTH,
    PRECURSOR_SEQUENCE, SEED_COLUMN, STAR_LENGTH, STAR_SEQUENCE, SequenceCategory, Species,
};
use crate::error::MirError;
use crate::fasta::SequenceMap;
use crate::resolve::{ResolvedSequences, sequence_length};
use crate::sheet::{Sheet, SheetSink};
use crate::store::Store;
use crate::table::{RecordTable, Value, clean_identifier};

/// Where the merge engine reads its per-species inputs from.
pub trait MergeInputs {
    fn table(&self, species: Species, id_label: &str) -> Result<RecordTable, MirError>;

    /// `Ok(None)` when the FASTA file of that category is absent.
    fn sequences(
        &self,
        species: Species,
        category: SequenceCategory,
    ) -> Result<Option<SequenceMap>, MirError>;
}

impl MergeInputs for Store {
    fn table(&self, species: Species, id_label: &str) -> Result<RecordTable, MirError> {
        RecordTable::load(&self.table_path(species), id_label)
    }

    fn sequences(
        &self,
        species: Species,
        category: SequenceCategory,
    ) -> Result<Option<SequenceMap>, MirError> {
        SequenceMap::load(&self.sequence_path(species, category))
    }
}

/// The three FASTA-derived maps of one species.
#[derive(Debug, Clone, Default)]
pub struct SpeciesSequences {
    pub precursor: SequenceMap,
    pub mature: SequenceMap,
    pub star: SequenceMap,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub output: Option<String>,
    pub species: Vec<SpeciesOutcome>,
}

impl MergeSummary {
    pub fn written(&self) -> usize {
        self.species
            .iter()
            .filter(|outcome| outcome.status == OutcomeStatus::Written)
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Written,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpeciesOutcome {
    pub species: Species,
    pub sheet_name: String,
    pub status: OutcomeStatus,
    pub rows: usize,
    pub missing_fasta: Vec<SequenceCategory>,
    pub reason: Option<String>,
}

struct MergedSpecies {
    sheet: Sheet,
    missing_fasta: Vec<SequenceCategory>,
}

pub struct MergeEngine<I: MergeInputs> {
    config: MergeConfig,
    inputs: I,
}

impl<I: MergeInputs> MergeEngine<I> {
    pub fn new(config: MergeConfig, inputs: I) -> Self {
        Self { config, inputs }
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merges every configured species into `sink`, in order. A species that
    /// fails is logged and reported as skipped; sink errors abort the run.
    pub fn run(
        &self,
        sink: &mut dyn SheetSink,
        progress: &dyn ProgressSink,
    ) -> Result<MergeSummary, MirError> {
        validate_targets(&self.config.species)?;
        let mut outcomes = Vec::new();
        for target in &self.config.species {
            progress.event(ProgressEvent::message(format!(
                "Processing {} ({})...",
                target.sheet_name, target.species
            )));

            match self.merge_species(target, progress) {
                Ok(merged) => {
                    sink.write_sheet(&merged.sheet)?;
                    info!(
                        species = %target.species,
                        rows = merged.sheet.rows.len(),
                        "sheet written"
                    );
                    outcomes.push(SpeciesOutcome {
                        species: target.species,
                        sheet_name: target.sheet_name.clone(),
                        status: OutcomeStatus::Written,
                        rows: merged.sheet.rows.len(),
                        missing_fasta: merged.missing_fasta,
                        reason: None,
                    });
                }
                Err(err) => {
                    error!(species = %target.species, error = %err, "species skipped");
                    progress.event(ProgressEvent::message(format!(
                        "  Skipping {}: {err}",
                        target.sheet_name
                    )));
                    outcomes.push(SpeciesOutcome {
                        species: target.species,
                        sheet_name: target.sheet_name.clone(),
                        status: OutcomeStatus::Skipped,
                        rows: 0,
                        missing_fasta: Vec::new(),
                        reason: Some(err.to_string()),
                    });
                }
            }
        }

        Ok(MergeSummary {
            output: None,
            species: outcomes,
        })
    }

    fn merge_species(
        &self,
        target: &SpeciesTarget,
        progress: &dyn ProgressSink,
    ) -> Result<MergedSpecies, MirError> {
        let mut table = self.inputs.table(target.species, &self.config.id_label)?;

        let mut missing_fasta = Vec::new();
        let mut load = |category: SequenceCategory| -> Result<SequenceMap, MirError> {
            match self.inputs.sequences(target.species, category)? {
                Some(map) => Ok(map),
                None => {
                    warn!(species = %target.species, %category, "FASTA file missing");
                    progress.event(ProgressEvent::message(format!(
                        "  Warning: missing {category} sequences for {}",
                        target.species
                    )));
                    missing_fasta.push(category);
                    Ok(SequenceMap::new())
                }
            }
        };
        let sequences = SpeciesSequences {
            precursor: load(SequenceCategory::Precursor)?,
            mature: load(SequenceCategory::Mature)?,
            star: load(SequenceCategory::Star)?,
        };

        enrich(&mut table, &sequences);
        Ok(MergedSpecies {
            sheet: Sheet::project(&target.sheet_name, &table, &self.config.columns),
            missing_fasta,
        })
    }
}

/// Adds the resolved sequence, location and length columns to every record,
/// keeping record order.
pub fn enrich(table: &mut RecordTable, sequences: &SpeciesSequences) {
    let resolved: Vec<ResolvedSequences> = table
        .records()
        .iter()
        .map(|record| {
            let id = record
                .get(ID_COLUMN)
                .map(|value| clean_identifier(&value.to_string()))
                .unwrap_or_default();
            let seed = record
                .get(SEED_COLUMN)
                .map(Value::to_string)
                .unwrap_or_default();
            ResolvedSequences::resolve(
                &id,
                &seed,
                &sequences.precursor,
                &sequences.mature,
                &sequences.star,
            )
        })
        .collect();

    let mut columns: [Vec<Value>; 7] = Default::default();
    for r in &resolved {
        columns[0].push(Value::text(&r.precursor));
        columns[1].push(Value::text(&r.mature));
        columns[2].push(Value::text(&r.star));
        columns[3].push(Value::text(r.location.as_str()));
        columns[4].push(length_value(&r.precursor));
        columns[5].push(length_value(&r.mature));
        columns[6].push(length_value(&r.star));
    }

    let names = [
        PRECURSOR_SEQUENCE,
        MATURE_SEQUENCE,
        STAR_SEQUENCE,
        MATURE_LOCATION,
        PRECURSOR_LENGTH,
        MATURE_LENGTH,
        STAR_LENGTH,
    ];
    for (name, values) in names.into_iter().zip(columns) {
        table.set_column(name, values);
    }
}

fn length_value(sequence: &str) -> Value {
    Value::Integer(sequence_length(sequence) as i64)
}
