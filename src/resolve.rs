//! Matching of mature, star and precursor sequences to a miRNA identifier.
//!
//! The mature arm is decided from which arms the mature FASTA carries and,
//! when it carries both, from which of them contains the seed motif. The star
//! sequence is then taken from the opposite arm.

use crate::domain::{Arm, MatureLocation, NOT_AVAILABLE};
use crate::fasta::{SequenceMap, arm_key};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatureResolution {
    pub sequence: String,
    pub location: MatureLocation,
}

/// Sequence fields resolved for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSequences {
    pub precursor: String,
    pub mature: String,
    pub star: String,
    pub location: MatureLocation,
}

impl ResolvedSequences {
    pub fn resolve(
        id: &str,
        seed: &str,
        precursor: &SequenceMap,
        mature: &SequenceMap,
        star: &SequenceMap,
    ) -> Self {
        let resolution = resolve_mature(id, seed, mature);
        let star_sequence = resolve_star(id, resolution.location, mature, star);
        Self {
            precursor: resolve_precursor(id, precursor),
            mature: resolution.sequence,
            star: star_sequence,
            location: resolution.location,
        }
    }
}

pub fn resolve_mature(id: &str, seed: &str, mature: &SequenceMap) -> MatureResolution {
    let five = mature.get_non_empty(&arm_key(id, Arm::FivePrime.as_str()));
    let three = mature.get_non_empty(&arm_key(id, Arm::ThreePrime.as_str()));

    let picked = match (five, three) {
        (Some(seq), None) => Some((seq, Arm::FivePrime)),
        (None, Some(seq)) => Some((seq, Arm::ThreePrime)),
        (Some(five), Some(three)) => Some(pick_by_seed(seed.trim(), five, three)),
        (None, None) => None,
    };

    match picked {
        Some((sequence, arm)) => MatureResolution {
            sequence: sequence.to_string(),
            location: MatureLocation::Arm(arm),
        },
        None => MatureResolution {
            sequence: NOT_AVAILABLE.to_string(),
            location: MatureLocation::NotAvailable,
        },
    }
}

/// Seed found on exactly one arm picks that arm; otherwise 5p.
fn pick_by_seed<'a>(seed: &str, five: &'a str, three: &'a str) -> (&'a str, Arm) {
    match (five.contains(seed), three.contains(seed)) {
        (false, true) => (three, Arm::ThreePrime),
        _ => (five, Arm::FivePrime),
    }
}

/// Star lookup order: mature map on the opposite arm, star map on the
/// opposite arm, star map keyed by the mature location. Empty when all miss.
pub fn resolve_star(
    id: &str,
    location: MatureLocation,
    mature: &SequenceMap,
    star: &SequenceMap,
) -> String {
    let target = arm_key(id, location.star_target().as_str());
    mature
        .get_non_empty(&target)
        .or_else(|| star.get_non_empty(&target))
        .or_else(|| star.get(&arm_key(id, location.as_str())))
        .unwrap_or_default()
        .to_string()
}

pub fn resolve_precursor(id: &str, precursor: &SequenceMap) -> String {
    precursor
        .get(id)
        .map(str::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Character count, with `N/A` counting as zero.
pub fn sequence_length(sequence: &str) -> usize {
    if sequence == NOT_AVAILABLE {
        0
    } else {
        sequence.chars().count()
    }
}
