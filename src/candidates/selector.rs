use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use crate::aggregate::AlleleKey;
use crate::classify::Tier;
use crate::context::ReadContext;

use super::{Candidate, SampleCandidate, SampleSupport};

type CandidateKey = (Arc<str>, u32, AlleleKey);

/// One report's representative context and its support.
#[derive(Debug, Clone)]
struct Report {
    full_matches: u32,
    core_matches: u32,
    context: ReadContext,
    secondary: Option<ReadContext>,
}

impl Report {
    fn from_candidate(candidate: &SampleCandidate) -> Self {
        Self {
            full_matches: candidate.primary.full_matches(),
            core_matches: candidate.primary.core_matches(),
            context: candidate.primary.context().clone(),
            secondary: candidate
                .secondary
                .as_ref()
                .map(|group| group.context().clone()),
        }
    }

    /// Higher support wins; ties go to the smaller context.
    fn outranks(&self, other: &Report) -> bool {
        (self.full_matches, self.core_matches, Reverse(&self.context))
            > (other.full_matches, other.core_matches, Reverse(&other.context))
    }
}

#[derive(Debug)]
struct SampleEntry {
    sample_index: usize,
    support: SampleSupport,
    report: Report,
}

#[derive(Debug)]
struct Entry {
    tier: Tier,
    min_events: u32,
    samples: Vec<SampleEntry>,
}

/// Folds per-sample region output into sorted cross-sample candidates.
///
/// The result does not depend on the order in which regions or reports
/// arrive: each sample keeps its best report, the representative context is
/// the best report over all samples, and the minimum event count is taken
/// over every report seen.
#[derive(Debug, Default)]
pub struct CandidateSelector {
    samples: Vec<Arc<str>>,
    entries: BTreeMap<CandidateKey, Entry>,
}

impl CandidateSelector {
    /// Empty selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct candidates so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge one sample's candidates, from any number of regions.
    pub fn add_sample(
        &mut self,
        sample: impl Into<Arc<str>>,
        candidates: impl IntoIterator<Item = SampleCandidate>,
    ) {
        let sample = sample.into();
        let sample_index = match self.samples.iter().position(|s| *s == sample) {
            Some(index) => index,
            None => {
                self.samples.push(Arc::clone(&sample));
                self.samples.len() - 1
            }
        };

        for candidate in candidates {
            self.add(&sample, sample_index, candidate);
        }
    }

    fn add(&mut self, sample: &Arc<str>, sample_index: usize, candidate: SampleCandidate) {
        let report = Report::from_candidate(&candidate);
        let support = SampleSupport {
            sample: Arc::clone(sample),
            full_matches: candidate.primary.full_matches(),
            core_matches: candidate.primary.core_matches(),
            raw_alt_support: candidate.raw_alt_support,
            raw_depth: candidate.raw_depth,
        };
        let min_events = candidate.primary.min_events();

        let entry = self
            .entries
            .entry((candidate.chrom, candidate.position, candidate.key))
            .or_insert_with(|| Entry {
                tier: candidate.tier,
                min_events,
                samples: Vec::new(),
            });
        entry.min_events = entry.min_events.min(min_events);
        entry.tier = entry.tier.min(candidate.tier);

        match entry
            .samples
            .iter_mut()
            .find(|existing| existing.sample_index == sample_index)
        {
            Some(existing) => {
                if report.outranks(&existing.report) {
                    trace!(sample = %sample, "replacing weaker duplicate report");
                    existing.support = support;
                    existing.report = report;
                }
            }
            None => entry.samples.push(SampleEntry {
                sample_index,
                support,
                report,
            }),
        }
    }

    /// Candidates sorted by chromosome, position, ref and alt.
    pub fn into_candidates(self) -> Vec<Candidate> {
        self.entries
            .into_iter()
            .filter_map(|((chrom, position, key), mut entry)| {
                entry.samples.sort_by_key(|s| s.sample_index);
                let best = entry
                    .samples
                    .iter()
                    .map(|s| &s.report)
                    .reduce(|best, report| if report.outranks(best) { report } else { best })?
                    .clone();

                Some(Candidate {
                    chrom,
                    position,
                    key,
                    tier: entry.tier,
                    read_context: best.context,
                    secondary_context: best.secondary,
                    min_events: entry.min_events,
                    read_context_support: best.full_matches,
                    core_support: best.core_matches,
                    samples: entry.samples.into_iter().map(|s| s.support).collect(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ReadContextGroup;

    fn candidate(position: u32, alt: &[u8], core: &str, full: u32, core_hits: u32, events: u32) -> SampleCandidate {
        SampleCandidate {
            chrom: Arc::from("chr1"),
            position,
            key: AlleleKey::new(b"C", alt),
            tier: Tier::LowConfidence,
            raw_depth: 40,
            raw_alt_support: full + core_hits,
            raw_base_quality: 30 * (full + core_hits) as u64,
            primary: ReadContextGroup::with_counts(
                ReadContext::new(b"AAA".to_vec(), core.as_bytes().to_vec(), b"TTT".to_vec()),
                full,
                core_hits,
                events,
            ),
            secondary: None,
        }
    }

    #[test]
    fn keeps_best_sample_context_and_min_events() {
        let mut selector = CandidateSelector::new();
        selector.add_sample("tumor", vec![candidate(100, b"T", "GCTGC", 8, 1, 3)]);
        selector.add_sample("normal", vec![candidate(100, b"T", "GCTGA", 2, 0, 1)]);

        let candidates = selector.into_candidates();
        assert_eq!(candidates.len(), 1);
        let merged = &candidates[0];
        assert_eq!(merged.read_context.core(), b"GCTGC");
        assert_eq!(merged.read_context_support, 8);
        assert_eq!(merged.core_support, 1);
        assert_eq!(merged.min_events, 1);
        assert_eq!(merged.samples.len(), 2);
        assert_eq!(merged.sample("normal").map(|s| s.full_matches), Some(2));
        assert_eq!(merged.total_full_matches(), 10);
    }

    #[test]
    fn duplicate_report_from_same_sample_keeps_larger() {
        let mut selector = CandidateSelector::new();
        selector.add_sample("tumor", vec![candidate(100, b"T", "GCTGC", 3, 0, 2)]);
        selector.add_sample("tumor", vec![candidate(100, b"T", "GCTGC", 5, 0, 4)]);
        selector.add_sample("tumor", vec![candidate(100, b"T", "GCTGC", 4, 2, 2)]);

        let candidates = selector.into_candidates();
        assert_eq!(candidates[0].samples.len(), 1);
        assert_eq!(candidates[0].samples[0].full_matches, 5);
        assert_eq!(candidates[0].min_events, 2);
    }

    #[test]
    fn output_is_sorted_and_order_independent() {
        let reports = vec![
            candidate(300, b"A", "GCAGC", 4, 0, 1),
            candidate(100, b"T", "GCTGC", 4, 0, 1),
            candidate(100, b"G", "GCGGC", 4, 0, 1),
            candidate(100, b"T", "ACTGA", 4, 0, 1),
        ];

        let mut forward = CandidateSelector::new();
        forward.add_sample("tumor", reports.clone());
        let mut backward = CandidateSelector::new();
        backward.add_sample("tumor", reports.into_iter().rev());

        let forward = forward.into_candidates();
        let backward = backward.into_candidates();
        assert_eq!(forward, backward);

        let order: Vec<(u32, String)> = forward
            .iter()
            .map(|c| (c.position, c.key.to_string()))
            .collect();
        assert_eq!(
            order,
            vec![(100, "C>G".to_string()), (100, "C>T".to_string()), (300, "C>A".to_string())]
        );
        // Equal support: the smaller context represents the allele.
        assert_eq!(forward[1].read_context.core(), b"ACTGA");
    }
}
