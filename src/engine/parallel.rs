use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::info;

use crate::candidates::{Candidate, CandidateSelector};
use crate::config::EngineConfig;
use crate::consumer::ConsumerStats;
use crate::genomics::{AlignedRead, GenomeRegion, RefSequence};
use crate::window::WindowStats;
use crate::EngineError;

use super::{Diagnostics, RegionResult, RegionTask, SharedResources};

/// One sample over one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionJob {
    /// Sample name.
    pub sample: Arc<str>,
    /// Region to aggregate.
    pub region: GenomeRegion,
}

impl RegionJob {
    /// Job for `sample` over `region`.
    pub fn new(sample: impl Into<Arc<str>>, region: GenomeRegion) -> Self {
        Self {
            sample: sample.into(),
            region,
        }
    }
}

/// Inputs a loader supplies for one job.
#[derive(Debug, Clone)]
pub struct RegionInput {
    /// Reference slice covering every read.
    pub reference: RefSequence,
    /// Reads overlapping the region's [`GenomeRegion::fetch_span`], sorted by
    /// alignment start. Missing reads that start one base past the region
    /// lose leading soft-clip insertions anchored at its last position.
    pub reads: Vec<AlignedRead>,
}

/// Counters summed over every region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Regions completed.
    pub regions: u64,
    /// Read translation counters.
    pub consumer: ConsumerStats,
    /// Ring buffer counters.
    pub window: WindowStats,
    /// Alleles below their tier's minimum alt support.
    pub below_tier_threshold: u64,
    /// Alleles for which no read context could be built.
    pub without_context: u64,
}

impl RunStats {
    fn absorb(&mut self, result: &RegionResult) {
        self.regions += 1;
        self.consumer.merge(&result.consumer);
        self.window.merge(&result.window);
        self.below_tier_threshold += result.below_tier_threshold;
        self.without_context += result.without_context;
    }
}

/// Merged output of [`call_regions`].
#[derive(Debug, Clone)]
pub struct CallResult {
    /// Candidates sorted by chromosome, position, ref and alt.
    pub candidates: Vec<Candidate>,
    /// Summed counters.
    pub stats: RunStats,
}

/// Run every job on the rayon pool and merge the results.
///
/// Each job gets its own window and consumer; `loader` fetches the job's
/// reference slice and reads and may run concurrently for different jobs.
/// Setting `cancel` stops workers between reads.
pub fn call_regions<L>(
    jobs: &[RegionJob],
    config: &EngineConfig,
    resources: &SharedResources,
    diagnostics: &Diagnostics,
    cancel: &AtomicBool,
    loader: L,
) -> Result<CallResult, EngineError>
where
    L: Fn(&RegionJob) -> Result<RegionInput, EngineError> + Sync,
{
    config.validate()?;

    let results = jobs
        .par_iter()
        .map(|job| {
            if cancel.load(Ordering::Relaxed) {
                return Err(EngineError::Cancelled {
                    region: job.region.to_string(),
                });
            }
            let input = loader(job)?;
            RegionTask::new(
                job.region.clone(),
                Arc::clone(&job.sample),
                config,
                resources,
                diagnostics,
            )
            .run(&input.reference, &input.reads, cancel)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut stats = RunStats::default();
    let mut selector = CandidateSelector::new();
    for result in results {
        stats.absorb(&result);
        selector.add_sample(result.sample, result.candidates);
    }
    let candidates = selector.into_candidates();

    info!(
        regions = stats.regions,
        reads = stats.consumer.reads_seen,
        candidates = candidates.len(),
        "calling complete"
    );
    Ok(CallResult { candidates, stats })
}
