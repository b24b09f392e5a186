#![allow(dead_code)]

use std::sync::Arc;

use somavar::classify::DepthGovernor;
use somavar::genomics::{CigarOp, CigarOpKind};
use somavar::{
    AlignedRead, Diagnostics, EngineConfig, FinalizedAllele, GenomeRegion, HotspotSet,
    PositionAggregator, PositionWindow, ReadConsumer, RefSequence, RegionSet,
};

pub const CHROM: &str = "chr1";

/// Deterministic pseudo-random generator for fixtures.
#[derive(Debug, Clone)]
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(6364136223846793005).wrapping_add(1))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    pub fn below(&mut self, bound: u32) -> u32 {
        self.next_u32() % bound
    }

    pub fn base(&mut self) -> u8 {
        b"ACGT"[self.below(4) as usize]
    }
}

/// Random ACGT sequence.
pub fn random_bases(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = Lcg::new(seed);
    (0..len).map(|_| rng.base()).collect()
}

/// A base different from `base`.
pub fn other_base(base: u8) -> u8 {
    if base == b'A' {
        b'C'
    } else {
        b'A'
    }
}

/// Reference slice for `bases` starting at position 1.
pub fn reference(bases: &[u8]) -> RefSequence {
    RefSequence::new(CHROM, 1, bases)
}

/// Ungapped read copying `len` reference bases from 1-based `start`.
pub fn matching_read(bases: &[u8], start: u32, len: usize) -> AlignedRead {
    let from = start as usize - 1;
    read_with_cigar(
        start,
        vec![CigarOp::new(CigarOpKind::Match, len as u32)],
        bases[from..from + len].to_vec(),
    )
}

/// Read with an explicit CIGAR and uniform base quality 30.
pub fn read_with_cigar(start: u32, cigar: Vec<CigarOp>, sequence: Vec<u8>) -> AlignedRead {
    let qualities = vec![30u8; sequence.len()];
    AlignedRead::new(CHROM, start, 60, cigar, sequence, qualities)
}

/// Copy of `read` with the base at 1-based reference `position` replaced.
pub fn with_base(read: &AlignedRead, position: u32, base: u8) -> AlignedRead {
    let mut sequence = read.sequence.to_vec();
    sequence[(position - read.alignment_start) as usize] = base;
    AlignedRead::new(
        Arc::clone(&read.chrom),
        read.alignment_start,
        read.mapq,
        read.cigar.clone(),
        sequence,
        read.qualities.to_vec(),
    )
}

/// One evicted position: position, raw depth, finalized alleles.
pub type Evicted = (u32, u32, Vec<FinalizedAllele>);

/// Push `reads` through a consumer and window, returning every eviction.
pub fn run_window(
    bases: &[u8],
    reads: &[AlignedRead],
    config: &EngineConfig,
    hotspots: &HotspotSet,
) -> Vec<Evicted> {
    let reference = reference(bases);
    let region = GenomeRegion::new(CHROM, 1, bases.len() as u32);
    let depth = DepthGovernor::for_region(&region, 0, Arc::new(RegionSet::new()), &config.depth);
    let diagnostics = Diagnostics::new();
    let thresholds = config.second_candidate.clone();

    let mut evicted = Vec::new();
    {
        let mut window = PositionWindow::from_config(config, |agg: PositionAggregator| {
            let position = agg.position();
            let depth = agg.raw_depth();
            evicted.push((position, depth, agg.finalize(&thresholds)));
        });
        let mut consumer = ReadConsumer::new(&reference, config, &depth, hotspots, &diagnostics);
        for read in reads {
            consumer.consume(read, &mut window);
        }
        window.evict_all();
    }
    evicted
}

/// Raw depth at `position`, zero if never buffered.
pub fn depth_at(evicted: &[Evicted], position: u32) -> u32 {
    evicted
        .iter()
        .find(|(p, _, _)| *p == position)
        .map_or(0, |(_, depth, _)| *depth)
}

/// Finalized alleles at `position`.
pub fn alleles_at(evicted: &[Evicted], position: u32) -> Vec<&FinalizedAllele> {
    evicted
        .iter()
        .filter(|(p, _, _)| *p == position)
        .flat_map(|(_, _, alleles)| alleles.iter())
        .collect()
}
