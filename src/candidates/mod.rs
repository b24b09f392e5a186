//! Cross-sample candidate records.
//!
//! Region tasks emit one [`SampleCandidate`] per surviving allele. The
//! [`CandidateSelector`] folds them into [`Candidate`]s keyed by
//! chromosome, position and allele, keeping the best-supported read context
//! as the representative while support stays per sample.

mod selector;
mod tsv;

use std::sync::Arc;

use crate::aggregate::{AlleleKey, ReadContextGroup};
use crate::classify::Tier;
use crate::context::ReadContext;

pub use selector::CandidateSelector;
pub use tsv::render_tsv;

/// One sample's finalized allele, ready for merging.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleCandidate {
    /// Chromosome.
    pub chrom: Arc<str>,
    /// 1-based position.
    pub position: u32,
    /// Ref/alt bases.
    pub key: AlleleKey,
    /// Confidence tier.
    pub tier: Tier,
    /// Reads counted at the position.
    pub raw_depth: u32,
    /// Reads carrying the allele.
    pub raw_alt_support: u32,
    /// Sum of the supporting base qualities.
    pub raw_base_quality: u64,
    /// Best-supported read-context group.
    pub primary: ReadContextGroup,
    /// Structurally distinct second group, if promoted.
    pub secondary: Option<ReadContextGroup>,
}

/// Support one sample contributed to a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSupport {
    /// Sample name.
    pub sample: Arc<str>,
    /// Full matches of the sample's primary context.
    pub full_matches: u32,
    /// Core matches of the sample's primary context.
    pub core_matches: u32,
    /// Reads carrying the allele.
    pub raw_alt_support: u32,
    /// Reads counted at the position.
    pub raw_depth: u32,
}

/// Finalized cross-sample variant candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Chromosome.
    pub chrom: Arc<str>,
    /// 1-based position.
    pub position: u32,
    /// Ref/alt bases.
    pub key: AlleleKey,
    /// Confidence tier.
    pub tier: Tier,
    /// Representative read context from the best-supported report.
    pub read_context: ReadContext,
    /// Second context promoted alongside the representative, if any.
    pub secondary_context: Option<ReadContext>,
    /// Fewest events seen on a fully matching read, over all reports.
    pub min_events: u32,
    /// Full matches of the representative context.
    pub read_context_support: u32,
    /// Core matches of the representative context.
    pub core_support: u32,
    /// Per-sample support, in sample order.
    pub samples: Vec<SampleSupport>,
}

impl Candidate {
    /// Support of one sample, if it reported the candidate.
    pub fn sample(&self, name: &str) -> Option<&SampleSupport> {
        self.samples.iter().find(|support| &*support.sample == name)
    }

    /// Summed full matches over samples.
    pub fn total_full_matches(&self) -> u32 {
        self.samples.iter().map(|support| support.full_matches).sum()
    }
}
