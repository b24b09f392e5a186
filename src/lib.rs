//! # Windowed aggregation of somatic variant candidates
//!
//! This library turns a stream of aligned reads over a genomic region into
//! candidate variants while holding only a small multiple of the maximum read
//! length in memory, however deep the coverage.
//!
//! ## Pipeline
//!
//! 1. **Read consumption**: each read's CIGAR is walked and translated into
//!    SNV, MNV, insertion, deletion and clip-encoded insertion observations,
//!    gated by adjusted mapping quality and per-position depth ceilings.
//! 2. **Windowed aggregation**: observations land in a ring buffer of
//!    per-position aggregators indexed by genomic position.
//! 3. **Eviction**: positions far enough behind the newest read are evicted
//!    in order and finalized exactly once, selecting the best-supported read
//!    context (and possibly a distinct second one) per allele.
//! 4. **Selection**: finalized alleles are tiered, thresholded and merged
//!    across samples and regions into sorted [`Candidate`]s.
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::atomic::AtomicBool;
//! use somavar::{Diagnostics, EngineConfig, RegionTask, SharedResources};
//!
//! let config = EngineConfig::default();
//! let resources = SharedResources::default();
//! let diagnostics = Diagnostics::new();
//! let task = RegionTask::new(region, "tumor", &config, &resources, &diagnostics);
//! let result = task.run(&reference, &reads, &AtomicBool::new(false))?;
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod aggregate;  // Per-position and per-allele aggregation
pub mod candidates; // Cross-sample candidate merging
pub mod classify;   // Depth ceilings and tiers
pub mod config;     // Engine configuration
pub mod consumer;   // CIGAR to observation translation
pub mod context;    // Read contexts and matching
pub mod engine;     // Region tasks and parallel driver
pub mod genomics;   // Read, reference and region primitives
pub mod window;     // Evicting ring buffer

// Re-exports for convenience
pub use aggregate::{AlleleKey, FinalizedAllele, PositionAggregator, SecondCandidateThresholds};
pub use candidates::{render_tsv, Candidate, CandidateSelector, SampleCandidate, SampleSupport};
pub use classify::{DepthGovernor, HotspotSet, Tier, TierClassifier};
pub use config::{ConfigError, EngineConfig};
pub use consumer::{ConsumerStats, ReadConsumer};
pub use context::{MatchType, ReadContext};
pub use engine::{call_regions, Diagnostics, RegionJob, RegionTask, SharedResources};
pub use genomics::{AlignedRead, GenomeRegion, RefSequence, RegionParseError, RegionSet};
pub use window::PositionWindow;

use thiserror::Error;

/// Errors surfaced by region processing.
///
/// Per-read problems (malformed CIGARs, positions behind the window floor,
/// depth ceilings) are counted, never raised.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A region string could not be parsed.
    #[error(transparent)]
    Region(#[from] RegionParseError),

    /// An htslib record could not be converted.
    #[error(transparent)]
    ReadConversion(#[from] genomics::ReadConversionError),

    /// Processing stopped through the cancellation flag.
    #[error("processing of region {region} was cancelled")]
    Cancelled {
        /// Region being processed.
        region: String,
    },

    /// The caller's loader failed to supply reads or reference.
    #[error("failed to load region {region}: {message}")]
    RegionLoad {
        /// Region being loaded.
        region: String,
        /// Loader's description of the failure.
        message: String,
    },
}
