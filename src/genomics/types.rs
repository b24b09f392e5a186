use std::sync::Arc;

/// CIGAR operation kinds describing how a read aligns to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOpKind {
    /// Consuming match/mismatch (`M`, `=`, `X`).
    Match,
    /// Insertion relative to the reference.
    Insertion,
    /// Deletion relative to the reference.
    Deletion,
    /// Skipped reference region (`N`, spliced alignments).
    Skip,
    /// Soft clipping (sequence present in read only).
    SoftClip,
    /// Hard clipping (trimmed sequence not present in read).
    HardClip,
    /// Padding (`P`); consumes neither read nor reference.
    Padding,
}

impl CigarOpKind {
    /// Whether the operation advances the reference coordinate.
    pub fn consumes_reference(self) -> bool {
        matches!(self, Self::Match | Self::Deletion | Self::Skip)
    }

    /// Whether the operation advances the read offset.
    pub fn consumes_read(self) -> bool {
        matches!(self, Self::Match | Self::Insertion | Self::SoftClip)
    }
}

/// CIGAR operation with length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarOp {
    /// Operation kind.
    pub kind: CigarOpKind,
    /// Number of bases affected by the operation.
    pub len: u32,
}

impl CigarOp {
    /// Construct a new CIGAR operation.
    pub fn new(kind: CigarOpKind, len: u32) -> Self {
        Self { kind, len }
    }
}

/// SAM flag bits the engine cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReadFlags {
    /// Read is part of a pair.
    pub paired: bool,
    /// Both mates aligned in the expected orientation and distance.
    pub proper_pair: bool,
    /// Secondary alignment.
    pub secondary: bool,
    /// Supplementary (chimeric) alignment.
    pub supplementary: bool,
    /// PCR or optical duplicate.
    pub duplicate: bool,
    /// Read maps to the reverse strand.
    pub reverse: bool,
    /// Read is unmapped.
    pub unmapped: bool,
}

impl ReadFlags {
    /// Flags of a properly paired, primary, forward-strand read.
    pub fn proper_pair() -> Self {
        Self {
            paired: true,
            proper_pair: true,
            ..Self::default()
        }
    }

    /// Paired but not properly paired.
    pub fn is_improper_pair(&self) -> bool {
        self.paired && !self.proper_pair
    }
}

/// Aligned read with sequence and quality information.
#[derive(Debug, Clone)]
pub struct AlignedRead {
    /// Reference contig/chromosome name.
    pub chrom: Arc<str>,
    /// 1-based leftmost aligned reference coordinate (soft clips excluded).
    pub alignment_start: u32,
    /// Mapping quality (Phred-scaled).
    pub mapq: u8,
    /// CIGAR describing the alignment.
    pub cigar: Vec<CigarOp>,
    /// Read sequence stored as uppercase ASCII.
    pub sequence: Arc<[u8]>,
    /// Per-base quality scores in Phred space.
    pub qualities: Arc<[u8]>,
    /// SAM flags.
    pub flags: ReadFlags,
    /// Observed template length; zero when unknown or unpaired.
    pub fragment_length: i32,
}

impl AlignedRead {
    /// Construct a new aligned read wrapper for a properly paired primary read.
    pub fn new(
        chrom: impl Into<Arc<str>>,
        alignment_start: u32,
        mapq: u8,
        cigar: Vec<CigarOp>,
        sequence: impl Into<Arc<[u8]>>,
        qualities: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            alignment_start,
            mapq,
            cigar,
            sequence: sequence.into(),
            qualities: qualities.into(),
            flags: ReadFlags::proper_pair(),
            fragment_length: 0,
        }
    }

    /// Replace the flags.
    pub fn with_flags(mut self, flags: ReadFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Replace the template length.
    pub fn with_fragment_length(mut self, fragment_length: i32) -> Self {
        self.fragment_length = fragment_length;
        self
    }

    /// Read length inferred from the sequence.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the read carries no bases.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Number of reference bases spanned by the alignment.
    pub fn reference_span(&self) -> u32 {
        self.cigar
            .iter()
            .filter(|op| op.kind.consumes_reference())
            .map(|op| op.len)
            .sum()
    }

    /// 1-based inclusive end of the alignment on the reference.
    pub fn alignment_end(&self) -> u32 {
        (self.alignment_start + self.reference_span()).saturating_sub(1)
    }

    /// Base at the provided read offset.
    pub fn base_at(&self, offset: usize) -> Option<u8> {
        self.sequence.get(offset).copied()
    }

    /// Quality score at the provided read offset.
    pub fn quality_at(&self, offset: usize) -> Option<u8> {
        self.qualities.get(offset).copied()
    }

    /// Whether any soft clip operation is present.
    pub fn has_soft_clip(&self) -> bool {
        self.cigar
            .iter()
            .any(|op| op.kind == CigarOpKind::SoftClip && op.len > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_end_counts_reference_consuming_ops() {
        let read = AlignedRead::new(
            "chr1",
            100,
            60,
            vec![
                CigarOp::new(CigarOpKind::SoftClip, 2),
                CigarOp::new(CigarOpKind::Match, 5),
                CigarOp::new(CigarOpKind::Insertion, 1),
                CigarOp::new(CigarOpKind::Deletion, 3),
                CigarOp::new(CigarOpKind::Match, 4),
            ],
            b"AACCCCCGTTTT".to_vec(),
            vec![30u8; 12],
        );

        assert_eq!(read.reference_span(), 12);
        assert_eq!(read.alignment_end(), 111);
        assert!(read.has_soft_clip());
    }

    #[test]
    fn improper_pair_requires_paired_flag() {
        let unpaired = ReadFlags::default();
        assert!(!unpaired.is_improper_pair());

        let improper = ReadFlags {
            paired: true,
            ..ReadFlags::default()
        };
        assert!(improper.is_improper_pair());
        assert!(!ReadFlags::proper_pair().is_improper_pair());
    }
}
