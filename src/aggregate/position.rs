use std::collections::HashMap;

use crate::context::ReadContext;

use super::{AlleleAggregator, AlleleKey, FinalizedAllele, SecondCandidateThresholds};

/// One read's evidence for an allele at a position.
#[derive(Debug, Clone, PartialEq)]
pub struct AlleleObservation {
    /// Ref/alt bases.
    pub key: AlleleKey,
    /// Base quality of the observation.
    pub quality: u8,
    /// Fully resolved read context, if one could be built.
    pub context: Option<ReadContext>,
    /// Events on the read.
    pub events: u32,
    /// Whether the observation counts toward raw depth: the read passed
    /// mapping-quality admission and this position was not already counted.
    pub counts_depth: bool,
}

/// Per-position container of raw depth and allele aggregators.
#[derive(Debug, Clone)]
pub struct PositionAggregator {
    position: u32,
    raw_depth: u32,
    depth_limit: Option<u32>,
    alleles: HashMap<AlleleKey, AlleleAggregator>,
}

impl PositionAggregator {
    /// Empty aggregator for a 1-based position.
    pub fn new(position: u32) -> Self {
        Self {
            position,
            raw_depth: 0,
            depth_limit: None,
            alleles: HashMap::new(),
        }
    }

    /// 1-based position.
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Reads counted at this position.
    pub fn raw_depth(&self) -> u32 {
        self.raw_depth
    }

    /// Registered depth ceiling.
    pub fn depth_limit(&self) -> Option<u32> {
        self.depth_limit
    }

    /// Count one read of raw depth.
    pub fn increment_depth(&mut self) {
        self.raw_depth += 1;
    }

    /// Set the ceiling unless one is already registered.
    pub fn register_depth_limit(&mut self, limit: u32) {
        self.depth_limit.get_or_insert(limit);
    }

    /// Whether raw depth reached the ceiling; `None` without a ceiling.
    pub fn exceeds_depth_limit(&self) -> Option<bool> {
        self.depth_limit.map(|limit| self.raw_depth >= limit)
    }

    /// Aggregator for one allele, if observed.
    pub fn allele(&self, key: &AlleleKey) -> Option<&AlleleAggregator> {
        self.alleles.get(key)
    }

    /// Number of distinct alleles observed.
    pub fn allele_count(&self) -> usize {
        self.alleles.len()
    }

    /// Fold one observation into the raw counters and context groups.
    pub fn record(&mut self, observation: AlleleObservation) {
        let AlleleObservation {
            key,
            quality,
            context,
            events,
            counts_depth,
        } = observation;

        if counts_depth {
            self.raw_depth += 1;
        }

        let aggregator = self
            .alleles
            .entry(key)
            .or_insert_with_key(|key| AlleleAggregator::new(key.clone()));
        aggregator.add_observation(quality);
        if let Some(context) = context {
            aggregator.add_read_context(context, events);
        }
    }

    /// Finalize every allele, ordered by key.
    pub fn finalize(self, thresholds: &SecondCandidateThresholds) -> Vec<FinalizedAllele> {
        let position = self.position;
        let raw_depth = self.raw_depth;
        let mut finalized: Vec<FinalizedAllele> = self
            .alleles
            .into_values()
            .map(|aggregator| aggregator.select_candidates(position, raw_depth, thresholds))
            .collect();
        finalized.sort_by(|a, b| a.key.cmp(&b.key));
        finalized
    }
}
