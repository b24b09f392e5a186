use crate::config::{EngineConfig, RepeatConfig};

use super::{ReadContext, RepeatContext};

/// Inclusive span of read offsets forming a context core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreSpan {
    /// First read offset in the core.
    pub start: usize,
    /// Last read offset in the core.
    pub end: usize,
}

impl CoreSpan {
    /// Construct a span; `start <= end`.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Whether the spans share at least one offset.
    pub fn overlaps(&self, other: &CoreSpan) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Smallest span covering both.
    pub fn union(&self, other: &CoreSpan) -> CoreSpan {
        CoreSpan::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Span widened by `by` on both sides (saturating at offset 0).
    pub fn widened(&self, by: usize) -> CoreSpan {
        CoreSpan::new(self.start.saturating_sub(by), self.end + by)
    }
}

/// Core span plus the metadata discovered while sizing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSeed {
    /// Core span on the read.
    pub span: CoreSpan,
    /// Microhomology of an indel.
    pub microhomology: Vec<u8>,
    /// Repeat starting right after the variant.
    pub repeat: Option<RepeatContext>,
}

/// Sizes read-context cores and cuts contexts out of read bases.
#[derive(Debug, Clone)]
pub struct ReadContextBuilder {
    flank_size: usize,
    core_padding: usize,
    repeat: RepeatConfig,
}

impl ReadContextBuilder {
    /// Builder using the engine's flank, padding and repeat settings.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            flank_size: config.flank_size,
            core_padding: config.core_padding,
            repeat: config.repeat.clone(),
        }
    }

    /// Size the core for a variant occupying `bases[variant_start..=variant_end]`.
    ///
    /// `indel_bases` are the inserted or deleted bases of an indel; they are
    /// used to find microhomology with the read bases following the event.
    pub fn seed(
        &self,
        bases: &[u8],
        variant_start: usize,
        variant_end: usize,
        indel_bases: Option<&[u8]>,
    ) -> ContextSeed {
        let mut span = CoreSpan::new(
            variant_start.saturating_sub(self.core_padding),
            variant_end + self.core_padding,
        );

        let after = bases.get(variant_end + 1..).unwrap_or(&[]);
        let microhomology = indel_bases
            .map(|indel| {
                let shared = indel
                    .iter()
                    .zip(after.iter())
                    .take_while(|(a, b)| a == b)
                    .count();
                indel[..shared].to_vec()
            })
            .unwrap_or_default();
        span.end += microhomology.len();

        let repeat = self.find_repeat(bases, variant_end + 1).map(|(repeat, last)| {
            span.end = span.end.max(last + 1);
            repeat
        });

        ContextSeed {
            span,
            microhomology,
            repeat,
        }
    }

    /// Cut the context out of the read, or `None` when the flanks would run
    /// off either end of the read.
    pub fn build(&self, bases: &[u8], seed: &ContextSeed) -> Option<ReadContext> {
        let CoreSpan { start, end } = seed.span;
        if start < self.flank_size || end + self.flank_size >= bases.len() {
            return None;
        }

        Some(
            ReadContext::new(
                &bases[start - self.flank_size..start],
                &bases[start..=end],
                &bases[end + 1..=end + self.flank_size],
            )
            .with_microhomology(seed.microhomology.clone())
            .with_repeat(seed.repeat.clone()),
        )
    }

    /// Longest qualifying repeat beginning at `from`, with its last offset.
    fn find_repeat(&self, bases: &[u8], from: usize) -> Option<(RepeatContext, usize)> {
        let mut best: Option<(RepeatContext, usize)> = None;

        for unit_len in 1..=self.repeat.max_unit_length {
            let Some(unit) = bases.get(from..from + unit_len) else {
                break;
            };
            if unit.contains(&b'N') {
                continue;
            }

            let mut count = 1u32;
            while bases
                .get(from + count as usize * unit_len..from + (count as usize + 1) * unit_len)
                .map_or(false, |next| next == unit)
            {
                count += 1;
            }
            if count < self.repeat.min_count {
                continue;
            }

            let last = from + count as usize * unit_len - 1;
            if best.as_ref().map_or(true, |(_, best_last)| last > *best_last) {
                best = Some((
                    RepeatContext {
                        unit: unit.to_vec(),
                        count,
                    },
                    last,
                ));
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> ReadContextBuilder {
        ReadContextBuilder::new(&EngineConfig::default().with_flank_size(3))
    }

    #[test]
    fn snv_core_is_padded_variant() {
        let bases = b"ACGTACGTACGTAC";
        let seed = builder().seed(bases, 6, 6, None);
        assert_eq!(seed.span, CoreSpan::new(4, 8));
        assert!(seed.repeat.is_none());

        let context = builder().build(bases, &seed).expect("context fits");
        assert_eq!(context.left_flank(), b"CGT");
        assert_eq!(context.core(), b"ACGTA");
        assert_eq!(context.right_flank(), b"CGT");
    }

    #[test]
    fn context_fails_near_read_ends() {
        let bases = b"ACGTACGTAC";
        assert!(builder().build(bases, &builder().seed(bases, 2, 2, None)).is_none());
        assert!(builder().build(bases, &builder().seed(bases, 7, 7, None)).is_none());
    }

    #[test]
    fn deletion_core_extends_over_microhomology() {
        // Anchor at offset 5; deleted "CAG", read continues with "CAT...".
        let bases = b"GGGGGTCATGGAAGGG";
        let seed = builder().seed(bases, 5, 5, Some(b"CAG"));
        assert_eq!(seed.microhomology, b"CA".to_vec());
        assert_eq!(seed.span, CoreSpan::new(3, 9));
    }

    #[test]
    fn repeat_after_variant_extends_core() {
        // Variant at offset 4, then "ATATAT" repeat from offset 5..=10.
        let bases = b"GGGGCATATATGCCCCC";
        let seed = builder().seed(bases, 4, 4, None);
        let repeat = seed.repeat.clone().expect("repeat found");
        assert_eq!(repeat.unit, b"AT".to_vec());
        assert_eq!(repeat.count, 3);
        assert_eq!(seed.span, CoreSpan::new(2, 11));
    }

    #[test]
    fn span_overlap_and_union() {
        let a = CoreSpan::new(10, 14);
        let b = CoreSpan::new(14, 20);
        let c = CoreSpan::new(21, 22);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(a.union(&c), CoreSpan::new(10, 22));
        assert_eq!(a.widened(12), CoreSpan::new(0, 26));
    }
}
