use crate::config::QualityConfig;
use crate::genomics::{AlignedRead, CigarOpKind, RefSequence};

/// Local alignment burden of a read: mismatching aligned bases (N excluded)
/// plus one per insertion or deletion.
pub fn count_events(read: &AlignedRead, reference: &RefSequence) -> u32 {
    let mut events = 0u32;
    let mut read_index = 0usize;
    let mut ref_pos = read.alignment_start;

    for op in &read.cigar {
        match op.kind {
            CigarOpKind::Match => {
                for i in 0..op.len {
                    let (Some(base), Some(ref_base)) = (
                        read.base_at(read_index + i as usize),
                        reference.base(ref_pos + i),
                    ) else {
                        continue;
                    };
                    if base != ref_base && base != b'N' && ref_base != b'N' {
                        events += 1;
                    }
                }
            }
            CigarOpKind::Insertion | CigarOpKind::Deletion => events += 1,
            _ => {}
        }
        if op.kind.consumes_read() {
            read_index += op.len as usize;
        }
        if op.kind.consumes_reference() {
            ref_pos += op.len;
        }
    }

    events
}

/// Mapping quality after fixed, event, improper-pair and soft-clip penalties.
pub fn adjusted_quality(read: &AlignedRead, events: u32, config: &QualityConfig) -> i32 {
    let mut quality = read.mapq as i32
        - config.fixed_penalty as i32
        - (config.event_penalty * events.saturating_sub(1)) as i32;
    if read.flags.is_improper_pair() {
        quality -= config.improper_pair_penalty as i32;
    }
    if read.has_soft_clip() {
        quality -= config.soft_clip_penalty as i32;
    }
    quality
}

/// Lowest base quality over the inclusive read offset range.
pub(crate) fn min_quality(read: &AlignedRead, from: usize, to: usize) -> u8 {
    (from..=to)
        .filter_map(|offset| read.quality_at(offset))
        .min()
        .unwrap_or(0)
}
