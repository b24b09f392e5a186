mod common;

use std::sync::atomic::AtomicBool;

use common::{matching_read, random_bases, reference, with_base, CHROM};
use somavar::engine::RegionResult;
use somavar::{
    AlignedRead, AlleleKey, CandidateSelector, Diagnostics, EngineConfig, GenomeRegion, RegionTask,
    SharedResources, Tier,
};

const VARIANT: u32 = 105;

/// 300 bases with "GCCGCGCAG" at 101..=109 and a fixed right flank after it.
fn fixture() -> Vec<u8> {
    let mut bases = random_bases(100, 7);
    bases.extend_from_slice(b"GCCGCGCAG");
    bases.extend_from_slice(b"TTACGATCCA");
    bases.extend_from_slice(&random_bases(181, 11));
    bases
}

fn run(bases: &[u8], reads: &[AlignedRead]) -> RegionResult {
    let config = EngineConfig::default();
    let resources = SharedResources::default();
    let diagnostics = Diagnostics::with_debug_positions([VARIANT]);
    let task = RegionTask::new(
        GenomeRegion::new(CHROM, 1, bases.len() as u32),
        "tumor",
        &config,
        &resources,
        &diagnostics,
    );
    task.run(&reference(bases), reads, &AtomicBool::new(false))
        .expect("region completes")
}

fn variant_read(bases: &[u8]) -> AlignedRead {
    with_base(&matching_read(bases, 51, 100), VARIANT, b'T')
}

#[test]
fn single_read_yields_one_low_confidence_candidate() {
    let bases = fixture();
    assert_eq!(bases[VARIANT as usize - 1], b'C');

    let result = run(&bases, &[variant_read(&bases)]);
    assert_eq!(result.candidates.len(), 1);
    let candidate = &result.candidates[0];
    assert_eq!(candidate.position, VARIANT);
    assert_eq!(candidate.key, AlleleKey::new(b"C", b"T"));
    assert_eq!(candidate.tier, Tier::LowConfidence);
    assert_eq!(candidate.primary.full_matches(), 1);
    assert_eq!(candidate.raw_depth, 1);
}

#[test]
fn identical_reads_accumulate_full_matches() {
    let bases = fixture();
    let reads = vec![variant_read(&bases), variant_read(&bases)];

    let result = run(&bases, &reads);
    assert_eq!(result.candidates.len(), 1);
    assert_eq!(result.candidates[0].primary.full_matches(), 2);
    assert_eq!(result.candidates[0].raw_alt_support, 2);
}

#[test]
fn flank_error_counts_as_core_match() {
    let bases = fixture();
    // Position 111 sits in the right flank of the variant's context.
    let flank_error = with_base(&variant_read(&bases), 111, b'G');
    let reads = vec![variant_read(&bases), variant_read(&bases), flank_error];

    let result = run(&bases, &reads);
    let candidate = result
        .candidates
        .iter()
        .find(|c| c.position == VARIANT)
        .expect("variant reported");
    assert_eq!(candidate.raw_alt_support, 3);
    assert_eq!(candidate.primary.full_matches(), 2);
    assert_eq!(candidate.primary.core_matches(), 1);
    assert!(candidate.secondary.is_none());

    let mut selector = CandidateSelector::new();
    selector.add_sample("tumor", result.candidates);
    let merged = selector.into_candidates();
    let merged = merged
        .iter()
        .find(|c| c.position == VARIANT)
        .expect("variant merged");
    assert_eq!(merged.read_context_support, 2);
    assert_eq!(merged.core_support, 1);
    assert!(merged.secondary_context.is_none());
    assert_eq!(merged.read_context.core(), b"CGTGC");
}

#[test]
fn cancelled_region_returns_error() {
    let bases = fixture();
    let config = EngineConfig::default();
    let resources = SharedResources::default();
    let diagnostics = Diagnostics::new();
    let task = RegionTask::new(
        GenomeRegion::new(CHROM, 1, bases.len() as u32),
        "tumor",
        &config,
        &resources,
        &diagnostics,
    );
    let result = task.run(&reference(&bases), &[variant_read(&bases)], &AtomicBool::new(true));
    assert!(matches!(result, Err(somavar::EngineError::Cancelled { .. })));
}
