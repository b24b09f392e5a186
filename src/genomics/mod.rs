//! Genomic primitives consumed by the aggregation engine: the aligned-read
//! model, reference slices, interval sets and the htslib adapters that
//! produce them.

mod htslib;
mod reference;
mod regions;
mod types;

pub use htslib::{
    aligned_read_from_record, fetch_reference, fetch_region_reads, ReadConversionError,
};
pub use reference::RefSequence;
pub use regions::{GenomeRegion, RegionParseError, RegionSet};
pub use types::{AlignedRead, CigarOp, CigarOpKind, ReadFlags};
