//! Translation of aligned reads into per-position observations.
//!
//! [`ReadConsumer::consume`] walks one read's CIGAR, turns mismatches,
//! indels and clip-encoded insertions into [`AlleleObservation`]s, applies
//! mapping-quality and depth admission, and records the survivors in the
//! region's [`PositionWindow`].

mod core_extension;
mod quality;
mod soft_clip;

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::aggregate::{AlleleKey, AlleleObservation, PositionAggregator};
use crate::classify::{DepthGovernor, HotspotSet};
use crate::config::EngineConfig;
use crate::context::{ContextSeed, ReadContextBuilder};
use crate::engine::Diagnostics;
use crate::genomics::{AlignedRead, CigarOpKind, RefSequence};
use crate::window::PositionWindow;

pub use quality::{adjusted_quality, count_events};
pub use soft_clip::{is_adapter_read_through, left_clip_insertion, right_clip_insertion, ClipInsertion};

use core_extension::reconcile_cores;
use quality::min_quality;

/// Longest substitution run reported as one allele.
const MAX_MNV_LENGTH: usize = 3;

/// Per-consumer counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    /// Reads offered to the consumer.
    pub reads_seen: u64,
    /// Unmapped, secondary, duplicate or off-contig reads.
    pub reads_filtered: u64,
    /// Reads with non-positive adjusted quality and no hotspot overlap.
    pub reads_low_quality: u64,
    /// Low-quality reads kept because they overlap a hotspot.
    pub reads_hotspot_rescued: u64,
    /// Observations recorded in the window.
    pub observations: u64,
    /// Observations and depth increments refused by a depth ceiling.
    pub depth_capped: u64,
    /// Observations recorded without a read context.
    pub context_failures: u64,
    /// CIGAR operations skipped as malformed or unsupported.
    pub malformed_ops: u64,
    /// Insertions inferred from soft clips.
    pub soft_clip_insertions: u64,
    /// Reads whose clips were ignored as adapter read-through.
    pub adapter_read_through: u64,
}

impl ConsumerStats {
    /// Add another consumer's counters.
    pub fn merge(&mut self, other: &ConsumerStats) {
        self.reads_seen += other.reads_seen;
        self.reads_filtered += other.reads_filtered;
        self.reads_low_quality += other.reads_low_quality;
        self.reads_hotspot_rescued += other.reads_hotspot_rescued;
        self.observations += other.observations;
        self.depth_capped += other.depth_capped;
        self.context_failures += other.context_failures;
        self.malformed_ops += other.malformed_ops;
        self.soft_clip_insertions += other.soft_clip_insertions;
        self.adapter_read_through += other.adapter_read_through;
    }
}

/// Observation awaiting admission and context construction.
#[derive(Debug, Clone)]
pub(crate) struct PendingObservation {
    pub(crate) position: u32,
    pub(crate) key: AlleleKey,
    pub(crate) quality: u8,
    pub(crate) counts_depth: bool,
    pub(crate) seed: ContextSeed,
}

/// Outcome of depth admission at one position for one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Admitted,
    Capped,
    /// The window already moved past the position.
    BelowFloor,
}

/// Everything one read wants to write into the window.
#[derive(Debug, Default)]
struct ReadEffects {
    /// Reference-matching positions counted toward raw depth.
    depth_positions: Vec<u32>,
    observations: Vec<PendingObservation>,
}

/// Walks reads for one region and sample.
#[derive(Debug)]
pub struct ReadConsumer<'a> {
    reference: &'a RefSequence,
    config: &'a EngineConfig,
    builder: ReadContextBuilder,
    depth: &'a DepthGovernor,
    hotspots: &'a HotspotSet,
    diagnostics: &'a Diagnostics,
    stats: ConsumerStats,
}

impl<'a> ReadConsumer<'a> {
    /// Consumer over a reference slice that covers every read it will see.
    pub fn new(
        reference: &'a RefSequence,
        config: &'a EngineConfig,
        depth: &'a DepthGovernor,
        hotspots: &'a HotspotSet,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            reference,
            config,
            builder: ReadContextBuilder::new(config),
            depth,
            hotspots,
            diagnostics,
            stats: ConsumerStats::default(),
        }
    }

    /// Counters so far.
    pub fn stats(&self) -> ConsumerStats {
        self.stats
    }

    /// Translate one read and record its observations in `window`.
    ///
    /// Reads must arrive in non-decreasing alignment-start order.
    pub fn consume<H>(&mut self, read: &AlignedRead, window: &mut PositionWindow<PositionAggregator, H>)
    where
        H: FnMut(PositionAggregator),
    {
        self.stats.reads_seen += 1;
        if read.flags.unmapped
            || read.flags.secondary
            || read.flags.duplicate
            || read.is_empty()
            || *read.chrom != **self.reference.chrom()
        {
            self.stats.reads_filtered += 1;
            return;
        }

        let events = count_events(read, self.reference);
        let quality = adjusted_quality(read, events, &self.config.quality);
        let sufficient = quality > 0;
        if !sufficient {
            if !self
                .hotspots
                .overlaps(&read.chrom, read.alignment_start, read.alignment_end())
            {
                self.stats.reads_low_quality += 1;
                return;
            }
            self.stats.reads_hotspot_rescued += 1;
        }

        let mut effects = self.walk_cigar(read, sufficient);
        self.clip_insertions(read, &mut effects);
        reconcile_cores(&mut effects.observations);

        if !sufficient {
            effects.depth_positions.clear();
            effects
                .observations
                .retain(|obs| self.hotspots.is_hotspot_position(&read.chrom, obs.position));
        }
        self.apply(read, events, effects, window);
    }

    fn walk_cigar(&mut self, read: &AlignedRead, sufficient: bool) -> ReadEffects {
        let mut effects = ReadEffects::default();
        let mut read_index = 0usize;
        let mut ref_pos = read.alignment_start;
        // A reference base has been walked since the last clip or skip.
        let mut anchored = false;

        for op in &read.cigar {
            let len = op.len as usize;
            match op.kind {
                CigarOpKind::Match => {
                    if !self.match_block(read, read_index, ref_pos, len, sufficient, &mut effects) {
                        self.stats.malformed_ops += 1;
                    }
                }
                CigarOpKind::Insertion => {
                    if !anchored || len == 0 || read_index == 0 {
                        self.stats.malformed_ops += 1;
                    } else if let Some(obs) = self.insertion(read, read_index - 1, ref_pos - 1, len) {
                        effects.observations.push(obs);
                    }
                }
                CigarOpKind::Deletion => {
                    if !anchored || len == 0 || read_index == 0 {
                        self.stats.malformed_ops += 1;
                    } else if let Some(obs) = self.deletion(read, read_index - 1, ref_pos - 1, len) {
                        effects.observations.push(obs);
                    }
                }
                CigarOpKind::Skip | CigarOpKind::SoftClip | CigarOpKind::HardClip | CigarOpKind::Padding => {}
            }

            if op.kind.consumes_read() {
                read_index += len;
            }
            if op.kind.consumes_reference() {
                ref_pos += op.len;
            }
            anchored = match op.kind {
                CigarOpKind::Match | CigarOpKind::Deletion => anchored || op.len > 0,
                CigarOpKind::Skip | CigarOpKind::SoftClip => false,
                CigarOpKind::Insertion | CigarOpKind::HardClip | CigarOpKind::Padding => anchored,
            };
        }

        effects
    }

    /// Walk an aligned block; `false` if it runs off the read or reference.
    fn match_block(
        &self,
        read: &AlignedRead,
        read_index: usize,
        ref_pos: u32,
        len: usize,
        sufficient: bool,
        effects: &mut ReadEffects,
    ) -> bool {
        for i in 0..len {
            let offset = read_index + i;
            let position = ref_pos + i as u32;
            let (Some(base), Some(ref_base)) = (read.base_at(offset), self.reference.base(position)) else {
                return false;
            };

            if base == ref_base {
                if sufficient {
                    effects.depth_positions.push(position);
                }
                continue;
            }
            if base == b'N' || ref_base == b'N' {
                continue;
            }

            effects.observations.push(PendingObservation {
                position,
                key: AlleleKey::new(&[ref_base], &[base]),
                quality: read.quality_at(offset).unwrap_or(0),
                counts_depth: sufficient,
                seed: self.builder.seed(&read.sequence, offset, offset, None),
            });

            for mnv_len in 2..=MAX_MNV_LENGTH.min(len - i) {
                let (Some(alt), Some(reference)) = (
                    read.sequence.get(offset..offset + mnv_len),
                    self.reference.slice(position, mnv_len),
                ) else {
                    break;
                };
                if alt.contains(&b'N') || reference.contains(&b'N') {
                    break;
                }
                if alt[mnv_len - 1] == reference[mnv_len - 1] {
                    continue;
                }
                let quality = (0..mnv_len)
                    .filter(|&k| alt[k] != reference[k])
                    .filter_map(|k| read.quality_at(offset + k))
                    .min()
                    .unwrap_or(0);
                effects.observations.push(PendingObservation {
                    position,
                    key: AlleleKey::new(reference, alt),
                    quality,
                    counts_depth: false,
                    seed: self.builder.seed(&read.sequence, offset, offset + mnv_len - 1, None),
                });
            }
        }
        true
    }

    fn insertion(
        &self,
        read: &AlignedRead,
        anchor_index: usize,
        anchor_position: u32,
        len: usize,
    ) -> Option<PendingObservation> {
        let ref_base = self.reference.base(anchor_position)?;
        let inserted = read.sequence.get(anchor_index + 1..anchor_index + 1 + len)?;
        let mut alt = Vec::with_capacity(len + 1);
        alt.push(ref_base);
        alt.extend_from_slice(inserted);

        Some(PendingObservation {
            position: anchor_position,
            key: AlleleKey::new(&[ref_base], &alt),
            quality: min_quality(read, anchor_index, anchor_index + len),
            counts_depth: false,
            seed: self
                .builder
                .seed(&read.sequence, anchor_index, anchor_index + len, Some(inserted)),
        })
    }

    fn deletion(
        &self,
        read: &AlignedRead,
        anchor_index: usize,
        anchor_position: u32,
        len: usize,
    ) -> Option<PendingObservation> {
        let ref_bases = self.reference.slice(anchor_position, len + 1)?;
        read.base_at(anchor_index + 1)?;

        Some(PendingObservation {
            position: anchor_position,
            key: AlleleKey::new(ref_bases, &ref_bases[..1]),
            quality: min_quality(read, anchor_index, anchor_index + 1),
            counts_depth: false,
            seed: self
                .builder
                .seed(&read.sequence, anchor_index, anchor_index, Some(&ref_bases[1..])),
        })
    }

    fn clip_insertions(&mut self, read: &AlignedRead, effects: &mut ReadEffects) {
        if !read.has_soft_clip() {
            return;
        }
        if is_adapter_read_through(read, &self.config.soft_clip) {
            self.stats.adapter_read_through += 1;
            return;
        }

        let clips = [
            left_clip_insertion(read, self.reference, &self.config.soft_clip),
            right_clip_insertion(read, self.reference, &self.config.soft_clip),
        ];
        for clip in clips.into_iter().flatten() {
            let Some(ref_base) = self.reference.base(clip.anchor_position) else {
                continue;
            };
            let end = clip.anchor_read_index + clip.inserted.len();
            let mut alt = Vec::with_capacity(clip.inserted.len() + 1);
            alt.push(ref_base);
            alt.extend_from_slice(&clip.inserted);

            trace!(
                read_start = read.alignment_start,
                position = clip.anchor_position,
                inserted = clip.inserted.len(),
                "soft clip insertion"
            );
            self.stats.soft_clip_insertions += 1;
            effects.observations.push(PendingObservation {
                position: clip.anchor_position,
                key: AlleleKey::new(&[ref_base], &alt),
                quality: min_quality(read, clip.anchor_read_index, end),
                counts_depth: false,
                seed: self.builder.seed(
                    &read.sequence,
                    clip.anchor_read_index,
                    end,
                    Some(&clip.inserted),
                ),
            });
        }
    }

    /// Admit every touched position once, then write the read's effects.
    fn apply<H>(
        &mut self,
        read: &AlignedRead,
        events: u32,
        effects: ReadEffects,
        window: &mut PositionWindow<PositionAggregator, H>,
    ) where
        H: FnMut(PositionAggregator),
    {
        let mut admission: BTreeMap<u32, Admission> = BTreeMap::new();
        for position in effects
            .depth_positions
            .iter()
            .copied()
            .chain(effects.observations.iter().map(|obs| obs.position))
        {
            admission.entry(position).or_insert(Admission::BelowFloor);
        }
        for (&position, state) in admission.iter_mut() {
            window.register_depth_limit(position, self.depth.ceiling(position));
            *state = match window.exceeds_depth_limit(position) {
                Some(false) => Admission::Admitted,
                Some(true) => Admission::Capped,
                None => Admission::BelowFloor,
            };
        }
        let state_at = |position: u32| {
            admission
                .get(&position)
                .copied()
                .unwrap_or(Admission::BelowFloor)
        };

        for position in effects.depth_positions {
            match state_at(position) {
                Admission::Admitted => {
                    window.increment_depth(position);
                }
                Admission::Capped => self.stats.depth_capped += 1,
                Admission::BelowFloor => {}
            }
        }

        for pending in effects.observations {
            let state = state_at(pending.position);
            if state != Admission::Admitted {
                if state == Admission::Capped {
                    self.stats.depth_capped += 1;
                }
                if self.diagnostics.is_debug(pending.position) {
                    debug!(
                        chrom = %read.chrom,
                        position = pending.position,
                        allele = %pending.key,
                        ?state,
                        "observation refused"
                    );
                }
                continue;
            }

            let context = self.builder.build(&read.sequence, &pending.seed);
            if context.is_none() {
                self.stats.context_failures += 1;
            }
            let observation = AlleleObservation {
                key: pending.key,
                quality: pending.quality,
                context,
                events,
                counts_depth: pending.counts_depth,
            };
            self.diagnostics
                .observation(&read.chrom, pending.position, &observation);

            let position = pending.position;
            if let Some(aggregator) =
                window.get_or_create(position, || PositionAggregator::new(position))
            {
                aggregator.record(observation);
                self.stats.observations += 1;
            }
        }
    }
}
