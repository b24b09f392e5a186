use super::PendingObservation;

/// Let SNV/MNV cores and nearby indel cores on the same read cover each other.
///
/// An indel's core is widened by its length; any substitution whose core
/// touches that widened span has both cores set to the union of the two.
pub(crate) fn reconcile_cores(pending: &mut [PendingObservation]) {
    for indel in 0..pending.len() {
        if !pending[indel].key.is_indel() {
            continue;
        }
        let reach = pending[indel]
            .seed
            .span
            .widened(pending[indel].key.indel_length());

        for other in 0..pending.len() {
            if other == indel || pending[other].key.is_indel() {
                continue;
            }
            let span = pending[other].seed.span;
            if !span.overlaps(&reach) {
                continue;
            }
            let merged = span.union(&pending[indel].seed.span);
            pending[other].seed.span = merged;
            pending[indel].seed.span = merged;
        }
    }
}
