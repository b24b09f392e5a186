//! Adapters from `rust-htslib` records and FASTA indexes to the engine's
//! read and reference model.

use std::path::Path;
use std::sync::Arc;

use rust_htslib::bam::{self, record::Cigar, Read as BamRead};
use rust_htslib::faidx;
use thiserror::Error;

use super::{AlignedRead, CigarOp, CigarOpKind, GenomeRegion, ReadFlags, RefSequence};

/// Errors raised while converting htslib data.
#[derive(Debug, Error)]
pub enum ReadConversionError {
    /// Record has no alignment.
    #[error("record is unmapped")]
    Unmapped,
    /// Sequence and quality arrays disagree.
    #[error("sequence length {sequence} does not match quality length {qualities}")]
    LengthMismatch {
        /// Number of bases.
        sequence: usize,
        /// Number of quality values.
        qualities: usize,
    },
    /// Alignment start outside the 1-based u32 range.
    #[error("alignment start {0} out of range")]
    PositionOutOfRange(i64),
    /// Error propagated from htslib.
    #[error("htslib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),
}

fn convert_cigar(op: &Cigar) -> CigarOp {
    match *op {
        Cigar::Match(len) | Cigar::Equal(len) | Cigar::Diff(len) => {
            CigarOp::new(CigarOpKind::Match, len)
        }
        Cigar::Ins(len) => CigarOp::new(CigarOpKind::Insertion, len),
        Cigar::Del(len) => CigarOp::new(CigarOpKind::Deletion, len),
        Cigar::RefSkip(len) => CigarOp::new(CigarOpKind::Skip, len),
        Cigar::SoftClip(len) => CigarOp::new(CigarOpKind::SoftClip, len),
        Cigar::HardClip(len) => CigarOp::new(CigarOpKind::HardClip, len),
        Cigar::Pad(len) => CigarOp::new(CigarOpKind::Padding, len),
    }
}

/// Convert a BAM record into an [`AlignedRead`] on `chrom`.
pub fn aligned_read_from_record(
    record: &bam::Record,
    chrom: Arc<str>,
) -> Result<AlignedRead, ReadConversionError> {
    if record.is_unmapped() {
        return Err(ReadConversionError::Unmapped);
    }

    let sequence = record.seq().as_bytes().to_ascii_uppercase();
    // Missing qualities are stored as a run of 0xff.
    let qualities: Vec<u8> = record
        .qual()
        .iter()
        .map(|&q| if q == 0xff { 0 } else { q })
        .collect();
    if sequence.len() != qualities.len() {
        return Err(ReadConversionError::LengthMismatch {
            sequence: sequence.len(),
            qualities: qualities.len(),
        });
    }

    let pos = record.pos();
    let alignment_start = u32::try_from(pos + 1)
        .map_err(|_| ReadConversionError::PositionOutOfRange(pos))?;

    let cigar = record.cigar().iter().map(convert_cigar).collect();
    let flags = ReadFlags {
        paired: record.is_paired(),
        proper_pair: record.is_proper_pair(),
        secondary: record.is_secondary(),
        supplementary: record.is_supplementary(),
        duplicate: record.is_duplicate(),
        reverse: record.is_reverse(),
        unmapped: false,
    };
    let fragment_length = record
        .insert_size()
        .clamp(i32::MIN as i64, i32::MAX as i64) as i32;

    Ok(AlignedRead::new(
        chrom,
        alignment_start,
        record.mapq(),
        cigar,
        sequence,
        qualities,
    )
    .with_flags(flags)
    .with_fragment_length(fragment_length))
}

/// Fetch all reads overlapping [`GenomeRegion::fetch_span`] from an indexed
/// BAM/CRAM file.
///
/// Records that fail conversion are skipped; the count of skipped records is
/// returned alongside the reads.
pub fn fetch_region_reads<P: AsRef<Path>>(
    path: P,
    region: &GenomeRegion,
) -> Result<(Vec<AlignedRead>, usize), ReadConversionError> {
    let (start, end) = region.fetch_span();
    let mut reader = bam::IndexedReader::from_path(path)?;
    reader.fetch((region.chrom.as_ref(), start as i64 - 1, end as i64))?;

    let mut reads = Vec::new();
    let mut skipped = 0usize;
    for record in reader.records() {
        let record = record?;
        match aligned_read_from_record(&record, Arc::clone(&region.chrom)) {
            Ok(read) => reads.push(read),
            Err(err) => {
                tracing::trace!(%region, error = %err, "skipping record");
                skipped += 1;
            }
        }
    }
    Ok((reads, skipped))
}

/// Fetch reference bases for `region` extended by `padding` on both sides,
/// clamped to the contig.
pub fn fetch_reference<P: AsRef<Path>>(
    path: P,
    region: &GenomeRegion,
    padding: u32,
) -> Result<RefSequence, ReadConversionError> {
    let reader = faidx::Reader::from_path(path)?;
    let contig_len = reader.fetch_seq_len(region.chrom.as_ref());
    let start = region.start.saturating_sub(padding).max(1);
    let end = (region.end as u64 + padding as u64).min(contig_len.max(1)) as u32;
    let bases = reader.fetch_seq(
        region.chrom.as_ref(),
        start as usize - 1,
        end as usize - 1,
    )?;
    Ok(RefSequence::new(Arc::clone(&region.chrom), start, bases))
}
