//! Insertions hidden in soft clips.
//!
//! An aligner often clips a read instead of opening a long insertion near its
//! end. If the clipped bases resume matching the reference after a run of
//! unmatched bases, the run is reported as an insertion anchored at the
//! alignment boundary.

use crate::config::SoftClipConfig;
use crate::genomics::{AlignedRead, CigarOpKind, RefSequence};

/// Insertion inferred from a soft clip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipInsertion {
    /// Reference position of the base preceding the insertion.
    pub anchor_position: u32,
    /// Read offset of that base.
    pub anchor_read_index: usize,
    /// Inserted bases.
    pub inserted: Vec<u8>,
}

/// Fragment so short that the read ran into adapter sequence.
pub fn is_adapter_read_through(read: &AlignedRead, config: &SoftClipConfig) -> bool {
    read.fragment_length != 0
        && (read.fragment_length.unsigned_abs() as u64)
            < read.len() as u64 + config.adapter_min_overlap as u64
}

/// Length of the soft clip opening the read, if an aligned block follows it.
fn leading_clip(read: &AlignedRead) -> Option<usize> {
    let mut ops = read
        .cigar
        .iter()
        .filter(|op| op.kind != CigarOpKind::HardClip);
    let clip = ops.next()?;
    let next = ops.next()?;
    (clip.kind == CigarOpKind::SoftClip && next.kind == CigarOpKind::Match)
        .then_some(clip.len as usize)
}

/// Length of the soft clip closing the read, if an aligned block precedes it.
fn trailing_clip(read: &AlignedRead) -> Option<usize> {
    let mut ops = read
        .cigar
        .iter()
        .rev()
        .filter(|op| op.kind != CigarOpKind::HardClip);
    let clip = ops.next()?;
    let previous = ops.next()?;
    (clip.kind == CigarOpKind::SoftClip && previous.kind == CigarOpKind::Match)
        .then_some(clip.len as usize)
}

/// Insertion just before the alignment start, read from the leading clip.
pub fn left_clip_insertion(
    read: &AlignedRead,
    reference: &RefSequence,
    config: &SoftClipConfig,
) -> Option<ClipInsertion> {
    let clip_len = leading_clip(read)?;
    let min_insert = config.min_insert_length as usize;
    let min_anchor = config.min_anchor_length as usize;
    if clip_len < min_insert + min_anchor || clip_len > read.len() {
        return None;
    }

    let clipped = &read.sequence[..clip_len];
    let start = read.alignment_start;
    if clip_len < start as usize
        && reference.slice(start - clip_len as u32, clip_len) == Some(clipped)
    {
        // Clip matches the reference outright: nothing was inserted.
        return None;
    }

    for inserted_len in min_insert..=clip_len - min_anchor {
        let prefix_len = clip_len - inserted_len;
        if prefix_len >= start as usize {
            continue;
        }
        if reference.slice(start - prefix_len as u32, prefix_len) == Some(&clipped[..prefix_len]) {
            return Some(ClipInsertion {
                anchor_position: start - 1,
                anchor_read_index: prefix_len - 1,
                inserted: clipped[prefix_len..].to_vec(),
            });
        }
    }
    None
}

/// Insertion just after the alignment end, read from the trailing clip.
pub fn right_clip_insertion(
    read: &AlignedRead,
    reference: &RefSequence,
    config: &SoftClipConfig,
) -> Option<ClipInsertion> {
    let clip_len = trailing_clip(read)?;
    let min_insert = config.min_insert_length as usize;
    let min_anchor = config.min_anchor_length as usize;
    if clip_len < min_insert + min_anchor || clip_len >= read.len() {
        return None;
    }

    let clip_start = read.len() - clip_len;
    let clipped = &read.sequence[clip_start..];
    let end = read.alignment_end();
    if reference.slice(end + 1, clip_len) == Some(clipped) {
        return None;
    }

    for inserted_len in min_insert..=clip_len - min_anchor {
        let suffix = &clipped[inserted_len..];
        if reference.slice(end + 1, suffix.len()) == Some(suffix) {
            return Some(ClipInsertion {
                anchor_position: end,
                anchor_read_index: clip_start - 1,
                inserted: clipped[..inserted_len].to_vec(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::CigarOp;

    // 1-based positions 1..=40.
    const REFERENCE: &[u8] = b"GATTACAGGCTTACCGATCGATTGCAACGTTAGCCATGCA";

    fn config() -> SoftClipConfig {
        SoftClipConfig {
            min_insert_length: 3,
            min_anchor_length: 4,
            adapter_min_overlap: 10,
        }
    }

    fn reference() -> RefSequence {
        RefSequence::new("chr1", 1, REFERENCE)
    }

    #[test]
    fn infers_insertion_from_trailing_clip() {
        // Aligned 11..=20, then clip = "TTT" inserted + ref 21..=25.
        let mut sequence = REFERENCE[10..20].to_vec();
        sequence.extend_from_slice(b"TTT");
        sequence.extend_from_slice(&REFERENCE[20..25]);
        let read = AlignedRead::new(
            "chr1",
            11,
            60,
            vec![
                CigarOp::new(CigarOpKind::Match, 10),
                CigarOp::new(CigarOpKind::SoftClip, 8),
            ],
            sequence,
            vec![30u8; 18],
        );

        let insertion = right_clip_insertion(&read, &reference(), &config()).expect("insert");
        assert_eq!(insertion.anchor_position, 20);
        assert_eq!(insertion.anchor_read_index, 9);
        assert_eq!(insertion.inserted, b"TTT".to_vec());
    }

    #[test]
    fn infers_insertion_from_leading_clip() {
        // Clip = ref 11..=15 + "GGGG" inserted, aligned from 16.
        let mut sequence = REFERENCE[10..15].to_vec();
        sequence.extend_from_slice(b"GGGG");
        sequence.extend_from_slice(&REFERENCE[15..25]);
        let read = AlignedRead::new(
            "chr1",
            16,
            60,
            vec![
                CigarOp::new(CigarOpKind::SoftClip, 9),
                CigarOp::new(CigarOpKind::Match, 10),
            ],
            sequence,
            vec![30u8; 19],
        );

        let insertion = left_clip_insertion(&read, &reference(), &config()).expect("insert");
        assert_eq!(insertion.anchor_position, 15);
        assert_eq!(insertion.anchor_read_index, 4);
        assert_eq!(insertion.inserted, b"GGGG".to_vec());
    }

    #[test]
    fn reference_matching_clip_is_not_an_insertion() {
        let read = AlignedRead::new(
            "chr1",
            11,
            60,
            vec![
                CigarOp::new(CigarOpKind::Match, 10),
                CigarOp::new(CigarOpKind::SoftClip, 8),
            ],
            REFERENCE[10..28].to_vec(),
            vec![30u8; 18],
        );
        assert!(right_clip_insertion(&read, &reference(), &config()).is_none());
    }

    #[test]
    fn short_fragments_are_adapter_read_through() {
        let read = AlignedRead::new(
            "chr1",
            1,
            60,
            vec![CigarOp::new(CigarOpKind::Match, 20)],
            REFERENCE[..20].to_vec(),
            vec![30u8; 20],
        );
        assert!(!is_adapter_read_through(&read, &config()));
        assert!(is_adapter_read_through(&read.clone().with_fragment_length(-25), &config()));
        assert!(!is_adapter_read_through(&read.with_fragment_length(30), &config()));
    }
}
