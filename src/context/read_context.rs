use std::fmt;

/// Outcome of comparing two read contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// Core and both flanks are identical.
    Full,
    /// Core is identical, at least one flank differs.
    Core,
    /// Cores differ.
    None,
}

/// Short tandem repeat adjacent to a variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepeatContext {
    /// Repeated unit.
    pub unit: Vec<u8>,
    /// Number of consecutive copies.
    pub count: u32,
}

impl fmt::Display for RepeatContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", String::from_utf8_lossy(&self.unit), self.count)
    }
}

/// Local read sequence around a candidate allele.
///
/// Immutable once built; two contexts are compared with [`ReadContext::match_type`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadContext {
    core: Vec<u8>,
    left_flank: Vec<u8>,
    right_flank: Vec<u8>,
    microhomology: Vec<u8>,
    repeat: Option<RepeatContext>,
}

impl ReadContext {
    /// Assemble a context from its parts.
    pub fn new(
        left_flank: impl Into<Vec<u8>>,
        core: impl Into<Vec<u8>>,
        right_flank: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            core: core.into(),
            left_flank: left_flank.into(),
            right_flank: right_flank.into(),
            microhomology: Vec::new(),
            repeat: None,
        }
    }

    /// Attach microhomology bases.
    pub fn with_microhomology(mut self, microhomology: impl Into<Vec<u8>>) -> Self {
        self.microhomology = microhomology.into();
        self
    }

    /// Attach a repeat descriptor.
    pub fn with_repeat(mut self, repeat: Option<RepeatContext>) -> Self {
        self.repeat = repeat;
        self
    }

    /// Core bases spanning the allele.
    pub fn core(&self) -> &[u8] {
        &self.core
    }

    /// Bases immediately left of the core.
    pub fn left_flank(&self) -> &[u8] {
        &self.left_flank
    }

    /// Bases immediately right of the core.
    pub fn right_flank(&self) -> &[u8] {
        &self.right_flank
    }

    /// Microhomology of an indel; empty for substitutions.
    pub fn microhomology(&self) -> &[u8] {
        &self.microhomology
    }

    /// Adjacent repeat, if one was detected.
    pub fn repeat(&self) -> Option<&RepeatContext> {
        self.repeat.as_ref()
    }

    /// Compare against another context.
    pub fn match_type(&self, other: &ReadContext) -> MatchType {
        if self.core != other.core {
            MatchType::None
        } else if self.left_flank == other.left_flank && self.right_flank == other.right_flank {
            MatchType::Full
        } else {
            MatchType::Core
        }
    }

    /// Whether the two cores are truncated or extended views of each other.
    pub fn core_overlaps(&self, other: &ReadContext) -> bool {
        contains_subslice(&self.core, &other.core) || contains_subslice(&other.core, &self.core)
    }
}

impl fmt::Display for ReadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            String::from_utf8_lossy(&self.left_flank),
            String::from_utf8_lossy(&self.core),
            String::from_utf8_lossy(&self.right_flank)
        )
    }
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty()
        || (needle.len() <= haystack.len()
            && haystack.windows(needle.len()).any(|window| window == needle))
}
