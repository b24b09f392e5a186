use std::collections::BTreeSet;

use tracing::debug;

use crate::aggregate::{AlleleObservation, FinalizedAllele, ReadContextGroup};

/// Positions whose observations and finalizations are logged in full.
///
/// Passed explicitly to every region task; an empty set disables the
/// per-position output entirely.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    debug_positions: BTreeSet<u32>,
}

impl Diagnostics {
    /// No debug positions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trace the given positions.
    pub fn with_debug_positions(positions: impl IntoIterator<Item = u32>) -> Self {
        Self {
            debug_positions: positions.into_iter().collect(),
        }
    }

    /// Whether `position` is traced.
    pub fn is_debug(&self, position: u32) -> bool {
        self.debug_positions.contains(&position)
    }

    pub(crate) fn observation(&self, chrom: &str, position: u32, observation: &AlleleObservation) {
        if !self.is_debug(position) {
            return;
        }
        debug!(
            chrom,
            position,
            allele = %observation.key,
            quality = observation.quality,
            events = observation.events,
            counts_depth = observation.counts_depth,
            context = %observation
                .context
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            "observation"
        );
    }

    pub(crate) fn finalized(&self, chrom: &str, allele: &FinalizedAllele) {
        if !self.is_debug(allele.position) {
            return;
        }
        let support = |group: &Option<ReadContextGroup>| {
            group
                .as_ref()
                .map(|g| format!("{} full={} core={}", g.context(), g.full_matches(), g.core_matches()))
                .unwrap_or_default()
        };
        debug!(
            chrom,
            position = allele.position,
            allele = %allele.key,
            raw_depth = allele.raw_depth,
            raw_alt_support = allele.raw_alt_support,
            primary = %support(&allele.primary),
            secondary = %support(&allele.secondary),
            "finalized allele"
        );
    }
}
