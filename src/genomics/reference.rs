use std::sync::Arc;

/// Reference bases for the active region, indexable by 1-based position.
///
/// Cheap to clone; the bases are shared between region workers.
#[derive(Debug, Clone)]
pub struct RefSequence {
    chrom: Arc<str>,
    /// 1-based position of `bases[0]`.
    start: u32,
    bases: Arc<[u8]>,
}

impl RefSequence {
    /// Wrap reference bases starting at the 1-based `start` coordinate.
    ///
    /// Bases are upper-cased on construction.
    pub fn new(chrom: impl Into<Arc<str>>, start: u32, bases: impl AsRef<[u8]>) -> Self {
        let upper: Vec<u8> = bases.as_ref().to_ascii_uppercase();
        Self {
            chrom: chrom.into(),
            start: start.max(1),
            bases: Arc::from(upper.into_boxed_slice()),
        }
    }

    /// Chromosome the bases belong to.
    pub fn chrom(&self) -> &Arc<str> {
        &self.chrom
    }

    /// First covered position (1-based).
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last covered position (1-based, inclusive).
    pub fn end(&self) -> u32 {
        (self.start + self.bases.len() as u32).saturating_sub(1)
    }

    /// Number of bases held.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Whether no bases are held.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Base at a 1-based position, if covered.
    pub fn base(&self, position: u32) -> Option<u8> {
        let offset = position.checked_sub(self.start)? as usize;
        self.bases.get(offset).copied()
    }

    /// `len` bases starting at `position`, if fully covered.
    pub fn slice(&self, position: u32, len: usize) -> Option<&[u8]> {
        let offset = position.checked_sub(self.start)? as usize;
        self.bases.get(offset..offset.checked_add(len)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_by_one_based_position() {
        let reference = RefSequence::new("chr1", 100, b"acgtn");
        assert_eq!(reference.base(100), Some(b'A'));
        assert_eq!(reference.base(104), Some(b'N'));
        assert_eq!(reference.base(99), None);
        assert_eq!(reference.base(105), None);
        assert_eq!(reference.end(), 104);
        assert_eq!(reference.slice(101, 3), Some(&b"CGT"[..]));
        assert_eq!(reference.slice(103, 3), None);
    }
}
