//! Performance benchmarks

use std::sync::atomic::AtomicBool;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use somavar::genomics::{CigarOp, CigarOpKind};
use somavar::*;

fn bases(len: usize) -> Vec<u8> {
    let mut state = 0x2545_f491_4f6c_dd1du64;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            b"ACGT"[(state % 4) as usize]
        })
        .collect()
}

fn reads(reference: &[u8], read_len: usize, step: usize) -> Vec<AlignedRead> {
    (0..reference.len() - read_len)
        .step_by(step)
        .map(|offset| {
            let mut sequence = reference[offset..offset + read_len].to_vec();
            let variant = read_len / 2;
            sequence[variant] = if sequence[variant] == b'A' { b'C' } else { b'A' };
            AlignedRead::new(
                "chr1",
                offset as u32 + 1,
                60,
                vec![CigarOp::new(CigarOpKind::Match, read_len as u32)],
                sequence,
                vec![30u8; read_len],
            )
        })
        .collect()
}

fn benchmark_window(c: &mut Criterion) {
    c.bench_function("window_get_or_create_100k", |b| {
        b.iter(|| {
            let mut evicted = 0u64;
            let mut window = PositionWindow::new(302, 231, |value: u32| evicted += value as u64);
            for position in 1..=100_000u32 {
                if let Some(slot) = window.get_or_create(position, || 0) {
                    *slot += 1;
                }
            }
            window.evict_all();
            drop(window);
            black_box(evicted)
        });
    });
}

fn benchmark_region(c: &mut Criterion) {
    let reference_bases = bases(20_000);
    let reads = reads(&reference_bases, 150, 5);
    let reference = RefSequence::new("chr1", 1, &reference_bases);
    let config = EngineConfig::default();
    let resources = SharedResources::default();
    let diagnostics = Diagnostics::new();
    let region = GenomeRegion::new("chr1", 1, reference_bases.len() as u32);

    c.bench_function("region_task_20kb_30x", |b| {
        b.iter(|| {
            let task = RegionTask::new(region.clone(), "bench", &config, &resources, &diagnostics);
            let result = task
                .run(&reference, &reads, &AtomicBool::new(false))
                .expect("region completes");
            black_box(result.candidates.len())
        });
    });
}

criterion_group!(benches, benchmark_window, benchmark_region);
criterion_main!(benches);
