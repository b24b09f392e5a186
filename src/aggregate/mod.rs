//! Per-position and per-allele aggregation of read observations.
//!
//! A [`PositionAggregator`] lives in the window while its position can still
//! receive reads. On eviction it is consumed by
//! [`PositionAggregator::finalize`], which turns every [`AlleleAggregator`]
//! into an immutable [`FinalizedAllele`].

mod allele;
mod position;

use std::fmt;

pub use allele::{AlleleAggregator, FinalizedAllele, ReadContextGroup, SecondCandidateThresholds};
pub use position::{AlleleObservation, PositionAggregator};

/// Ref/alt bases identifying a candidate variant at a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlleleKey {
    ref_bases: Vec<u8>,
    alt_bases: Vec<u8>,
}

impl AlleleKey {
    /// Key from reference and alternate bases.
    pub fn new(ref_bases: &[u8], alt_bases: &[u8]) -> Self {
        Self {
            ref_bases: ref_bases.to_vec(),
            alt_bases: alt_bases.to_vec(),
        }
    }

    /// Reference bases.
    pub fn ref_bases(&self) -> &[u8] {
        &self.ref_bases
    }

    /// Alternate bases.
    pub fn alt_bases(&self) -> &[u8] {
        &self.alt_bases
    }

    /// Single-base substitution.
    pub fn is_snv(&self) -> bool {
        self.ref_bases.len() == 1 && self.alt_bases.len() == 1
    }

    /// Multi-base substitution.
    pub fn is_mnv(&self) -> bool {
        self.ref_bases.len() > 1 && self.ref_bases.len() == self.alt_bases.len()
    }

    /// Insertion or deletion.
    pub fn is_indel(&self) -> bool {
        self.ref_bases.len() != self.alt_bases.len()
    }

    /// Inserted or deleted base count; zero for substitutions.
    pub fn indel_length(&self) -> usize {
        self.ref_bases.len().abs_diff(self.alt_bases.len())
    }
}

impl fmt::Display for AlleleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}>{}",
            String::from_utf8_lossy(&self.ref_bases),
            String::from_utf8_lossy(&self.alt_bases)
        )
    }
}
