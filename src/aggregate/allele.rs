#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::context::{MatchType, ReadContext};

use super::AlleleKey;

/// Thresholds gating promotion of a second, structurally distinct group.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SecondCandidateThresholds {
    /// Minimum absolute full-match count.
    pub min_full_support: u32,
    /// Minimum full-match count as a fraction of the primary's.
    pub min_fraction: f64,
}

impl Default for SecondCandidateThresholds {
    fn default() -> Self {
        Self {
            min_full_support: 5,
            min_fraction: 0.3,
        }
    }
}

/// One distinct read context observed for an allele, with its support.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadContextGroup {
    context: ReadContext,
    full_matches: u32,
    core_matches: u32,
    min_events: u32,
}

impl ReadContextGroup {
    /// New group seeded by one read; that read counts as a full match.
    pub fn new(context: ReadContext, events: u32) -> Self {
        Self {
            context,
            full_matches: 1,
            core_matches: 0,
            min_events: events,
        }
    }

    /// Group with explicit counters.
    pub fn with_counts(
        context: ReadContext,
        full_matches: u32,
        core_matches: u32,
        min_events: u32,
    ) -> Self {
        Self {
            context,
            full_matches,
            core_matches,
            min_events,
        }
    }

    /// Representative context.
    pub fn context(&self) -> &ReadContext {
        &self.context
    }

    /// Reads matching core and both flanks.
    pub fn full_matches(&self) -> u32 {
        self.full_matches
    }

    /// Reads matching the core only.
    pub fn core_matches(&self) -> u32 {
        self.core_matches
    }

    /// Fewest events seen on a fully matching read.
    pub fn min_events(&self) -> u32 {
        self.min_events
    }

    fn support_key(&self) -> (u32, u32) {
        (self.full_matches, self.core_matches)
    }
}

/// Immutable result of finalizing one allele at one position.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizedAllele {
    /// 1-based position.
    pub position: u32,
    /// Ref/alt bases.
    pub key: AlleleKey,
    /// Raw depth of the position when it was evicted.
    pub raw_depth: u32,
    /// Reads carrying the allele, with or without a usable context.
    pub raw_alt_support: u32,
    /// Sum of observation base qualities.
    pub raw_base_quality: u64,
    /// Best-supported context group.
    pub primary: Option<ReadContextGroup>,
    /// Structurally distinct runner-up, if one qualified.
    pub secondary: Option<ReadContextGroup>,
}

/// Mutable per-allele accumulator; consumed by [`AlleleAggregator::select_candidates`].
#[derive(Debug, Clone)]
pub struct AlleleAggregator {
    key: AlleleKey,
    raw_alt_support: u32,
    raw_base_quality: u64,
    groups: Vec<ReadContextGroup>,
}

impl AlleleAggregator {
    /// Empty aggregator for `key`.
    pub fn new(key: AlleleKey) -> Self {
        Self {
            key,
            raw_alt_support: 0,
            raw_base_quality: 0,
            groups: Vec::new(),
        }
    }

    /// Allele being aggregated.
    pub fn key(&self) -> &AlleleKey {
        &self.key
    }

    /// Reads observed carrying the allele.
    pub fn raw_alt_support(&self) -> u32 {
        self.raw_alt_support
    }

    /// Sum of observation base qualities.
    pub fn raw_base_quality(&self) -> u64 {
        self.raw_base_quality
    }

    /// Groups in insertion order.
    pub fn groups(&self) -> &[ReadContextGroup] {
        &self.groups
    }

    /// Count one supporting read in the raw counters.
    pub fn add_observation(&mut self, quality: u8) {
        self.raw_alt_support += 1;
        self.raw_base_quality += quality as u64;
    }

    /// Match `context` against every group.
    ///
    /// A full match bumps that group's full count and minimum events. Core
    /// matches bump core counts only when no group matched fully, in which
    /// case `context` also starts a new group carrying those core matches.
    pub fn add_read_context(&mut self, context: ReadContext, events: u32) {
        let mut full_match = false;
        let mut core_indices = Vec::new();

        for (idx, group) in self.groups.iter_mut().enumerate() {
            match group.context.match_type(&context) {
                MatchType::Full => {
                    group.full_matches += 1;
                    group.min_events = group.min_events.min(events);
                    full_match = true;
                }
                MatchType::Core => core_indices.push(idx),
                MatchType::None => {}
            }
        }

        if full_match {
            return;
        }

        for &idx in &core_indices {
            self.groups[idx].core_matches += 1;
        }
        let mut group = ReadContextGroup::new(context, events);
        group.core_matches = core_indices.len() as u32;
        self.groups.push(group);
    }

    /// Pick the primary group and optionally a structurally distinct second.
    ///
    /// Groups are ranked by full then core matches. Scanning for a second
    /// candidate stops at the first group below either threshold; groups
    /// whose core contains or is contained in the primary's are skipped.
    pub fn select_candidates(
        self,
        position: u32,
        raw_depth: u32,
        thresholds: &SecondCandidateThresholds,
    ) -> FinalizedAllele {
        let mut groups = self.groups;
        groups.sort_by(|a, b| b.support_key().cmp(&a.support_key()));

        let mut ranked = groups.into_iter();
        let primary = ranked.next();
        let secondary = primary.as_ref().and_then(|primary| {
            let min_relative = primary.full_matches as f64 * thresholds.min_fraction;
            for group in ranked {
                if group.full_matches < thresholds.min_full_support
                    || (group.full_matches as f64) < min_relative
                {
                    return None;
                }
                if !primary.context.core_overlaps(&group.context) {
                    return Some(group);
                }
            }
            None
        });

        FinalizedAllele {
            position,
            key: self.key,
            raw_depth,
            raw_alt_support: self.raw_alt_support,
            raw_base_quality: self.raw_base_quality,
            primary,
            secondary,
        }
    }
}
