use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while parsing a `chrom:start-end` region string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionParseError {
    /// Missing `:` separator or `-` range.
    #[error("region '{0}' is not of the form chrom:start-end")]
    Malformed(String),
    /// Start or end is not a positive integer.
    #[error("invalid coordinate '{value}' in region '{region}'")]
    InvalidCoordinate {
        /// Region string being parsed.
        region: String,
        /// Offending coordinate text.
        value: String,
    },
    /// End lies before start.
    #[error("region '{0}' ends before it starts")]
    Inverted(String),
}

/// Closed 1-based genomic interval on one chromosome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenomeRegion {
    /// Chromosome name.
    pub chrom: Arc<str>,
    /// First position (1-based, inclusive).
    pub start: u32,
    /// Last position (1-based, inclusive).
    pub end: u32,
}

impl GenomeRegion {
    /// Construct a region; `start` and `end` are inclusive.
    pub fn new(chrom: impl Into<Arc<str>>, start: u32, end: u32) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }

    /// Number of positions covered.
    pub fn len(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            self.end - self.start + 1
        }
    }

    /// Never true for a valid region; present for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Whether `position` lies inside the region.
    pub fn contains(&self, position: u32) -> bool {
        position >= self.start && position <= self.end
    }

    /// Reference span whose overlapping reads must be loaded for this region.
    ///
    /// An insertion inferred from a leading soft clip is anchored one base
    /// before the read's alignment start, so reads starting right after the
    /// region can still report inside it.
    pub fn fetch_span(&self) -> (u32, u32) {
        (self.start, self.end.saturating_add(1))
    }

    /// Split into consecutive chunks of at most `chunk_size` positions.
    pub fn chunks(&self, chunk_size: u32) -> Vec<GenomeRegion> {
        let chunk_size = chunk_size.max(1);
        let mut chunks = Vec::new();
        let mut start = self.start;
        while start <= self.end {
            let end = start.saturating_add(chunk_size - 1).min(self.end);
            chunks.push(GenomeRegion::new(Arc::clone(&self.chrom), start, end));
            if end == u32::MAX {
                break;
            }
            start = end + 1;
        }
        chunks
    }
}

impl fmt::Display for GenomeRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start, self.end)
    }
}

impl FromStr for GenomeRegion {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chrom, range) = s
            .rsplit_once(':')
            .ok_or_else(|| RegionParseError::Malformed(s.to_string()))?;
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| RegionParseError::Malformed(s.to_string()))?;
        if chrom.is_empty() {
            return Err(RegionParseError::Malformed(s.to_string()));
        }

        let parse = |value: &str| -> Result<u32, RegionParseError> {
            value
                .replace(',', "")
                .parse::<u32>()
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| RegionParseError::InvalidCoordinate {
                    region: s.to_string(),
                    value: value.to_string(),
                })
        };
        let start = parse(start)?;
        let end = parse(end)?;
        if end < start {
            return Err(RegionParseError::Inverted(s.to_string()));
        }
        Ok(GenomeRegion::new(chrom, start, end))
    }
}

/// Immutable set of genomic intervals, merged and sorted per chromosome.
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    intervals: HashMap<Arc<str>, Vec<(u32, u32)>>,
}

impl RegionSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary, possibly overlapping regions.
    pub fn from_regions(regions: impl IntoIterator<Item = GenomeRegion>) -> Self {
        let mut intervals: HashMap<Arc<str>, Vec<(u32, u32)>> = HashMap::new();
        for region in regions {
            intervals
                .entry(region.chrom)
                .or_default()
                .push((region.start, region.end));
        }

        for list in intervals.values_mut() {
            list.sort_unstable();
            let mut merged: Vec<(u32, u32)> = Vec::with_capacity(list.len());
            for &(start, end) in list.iter() {
                match merged.last_mut() {
                    Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
                    _ => merged.push((start, end)),
                }
            }
            *list = merged;
        }

        Self { intervals }
    }

    /// Whether no intervals are held.
    pub fn is_empty(&self) -> bool {
        self.intervals.values().all(Vec::is_empty)
    }

    /// Sorted, non-overlapping intervals on `chrom`.
    pub fn intervals(&self, chrom: &str) -> &[(u32, u32)] {
        self.intervals.get(chrom).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `position` on `chrom` falls in any interval.
    pub fn contains(&self, chrom: &str, position: u32) -> bool {
        self.intervals.get(chrom).map_or(false, |list| {
            let idx = list.partition_point(|&(_, end)| end < position);
            list.get(idx).map_or(false, |&(start, _)| start <= position)
        })
    }

    /// Whether `[start, end]` on `chrom` overlaps any interval.
    pub fn overlaps(&self, chrom: &str, start: u32, end: u32) -> bool {
        self.intervals.get(chrom).map_or(false, |list| {
            let idx = list.partition_point(|&(_, iv_end)| iv_end < start);
            list.get(idx).map_or(false, |&(iv_start, _)| iv_start <= end)
        })
    }
}
