use std::borrow::Borrow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info_span};

use crate::aggregate::{FinalizedAllele, PositionAggregator};
use crate::candidates::SampleCandidate;
use crate::classify::DepthGovernor;
use crate::config::EngineConfig;
use crate::consumer::{ConsumerStats, ReadConsumer};
use crate::genomics::{AlignedRead, GenomeRegion, RefSequence};
use crate::window::{PositionWindow, WindowStats};
use crate::EngineError;

use super::{Diagnostics, SharedResources};

/// Output of one region for one sample.
#[derive(Debug, Clone)]
pub struct RegionResult {
    /// Region processed.
    pub region: GenomeRegion,
    /// Sample the reads came from.
    pub sample: Arc<str>,
    /// Surviving alleles in position then allele order.
    pub candidates: Vec<SampleCandidate>,
    /// Read translation counters.
    pub consumer: ConsumerStats,
    /// Ring buffer counters.
    pub window: WindowStats,
    /// Alleles below their tier's minimum alt support.
    pub below_tier_threshold: u64,
    /// Alleles for which no read context could be built.
    pub without_context: u64,
}

/// Aggregates one sample's reads over one region.
///
/// Owns nothing mutable beyond the run: every call builds a fresh window,
/// so tasks for different regions can run concurrently over the same
/// shared resources.
#[derive(Debug, Clone)]
pub struct RegionTask<'a> {
    region: GenomeRegion,
    sample: Arc<str>,
    config: &'a EngineConfig,
    resources: &'a SharedResources,
    diagnostics: &'a Diagnostics,
}

impl<'a> RegionTask<'a> {
    /// Task for `sample` over `region`.
    pub fn new(
        region: GenomeRegion,
        sample: impl Into<Arc<str>>,
        config: &'a EngineConfig,
        resources: &'a SharedResources,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            region,
            sample: sample.into(),
            config,
            resources,
            diagnostics,
        }
    }

    /// Consume `reads` (sorted by alignment start) and finalize every
    /// position they touched.
    ///
    /// `cancel` is checked before each read; once set, the window is
    /// discarded and [`EngineError::Cancelled`] returned.
    pub fn run<I, R>(
        &self,
        reference: &RefSequence,
        reads: I,
        cancel: &AtomicBool,
    ) -> Result<RegionResult, EngineError>
    where
        I: IntoIterator<Item = R>,
        R: Borrow<AlignedRead>,
    {
        self.config.validate()?;
        let _span = info_span!("region", region = %self.region, sample = %self.sample).entered();

        let depth = DepthGovernor::for_region(
            &self.region,
            self.config.read_length_buffer(),
            Arc::clone(&self.resources.panel),
            &self.config.depth,
        );
        let thresholds = &self.config.second_candidate;
        let chrom = &self.region.chrom;
        let diagnostics = self.diagnostics;

        let mut finalized: Vec<FinalizedAllele> = Vec::new();
        let (consumer_stats, window_stats) = {
            let mut window = PositionWindow::from_config(self.config, |aggregator: PositionAggregator| {
                for allele in aggregator.finalize(thresholds) {
                    diagnostics.finalized(chrom, &allele);
                    finalized.push(allele);
                }
            });
            let mut consumer = ReadConsumer::new(
                reference,
                self.config,
                &depth,
                &self.resources.hotspots,
                self.diagnostics,
            );

            for read in reads {
                if cancel.load(Ordering::Relaxed) {
                    debug!("region cancelled");
                    return Err(EngineError::Cancelled {
                        region: self.region.to_string(),
                    });
                }
                consumer.consume(read.borrow(), &mut window);
            }
            window.evict_all();
            (consumer.stats(), window.stats())
        };

        let mut result = RegionResult {
            region: self.region.clone(),
            sample: Arc::clone(&self.sample),
            candidates: Vec::new(),
            consumer: consumer_stats,
            window: window_stats,
            below_tier_threshold: 0,
            without_context: 0,
        };
        let classifier = self.resources.classifier();

        for allele in finalized {
            if !self.region.contains(allele.position) {
                continue;
            }
            let tier = classifier.classify(chrom, allele.position, &allele.key);
            if allele.raw_alt_support < self.config.tiers.min_alt_support(tier) {
                result.below_tier_threshold += 1;
                continue;
            }
            let Some(primary) = allele.primary else {
                result.without_context += 1;
                continue;
            };
            result.candidates.push(SampleCandidate {
                chrom: Arc::clone(chrom),
                position: allele.position,
                key: allele.key,
                tier,
                raw_depth: allele.raw_depth,
                raw_alt_support: allele.raw_alt_support,
                raw_base_quality: allele.raw_base_quality,
                primary,
                secondary: allele.secondary,
            });
        }

        debug!(
            reads = result.consumer.reads_seen,
            observations = result.consumer.observations,
            evicted = result.window.evicted,
            candidates = result.candidates.len(),
            "region complete"
        );
        Ok(result)
    }
}
