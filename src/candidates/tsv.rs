use std::io::{self, Write};

use super::Candidate;

const HEADER: &str =
    "#chrom\tpos\tref\talt\ttier\tread_context\tmicrohomology\trepeat\tmin_events\tfull\tcore\tsecondary_context\tsamples";

/// Write candidates as tab-separated text, one line per candidate.
///
/// Samples are rendered as `name:full/core/alt/depth`, comma separated.
/// Empty fields are written as `.`.
pub fn render_tsv<W: Write>(candidates: &[Candidate], mut out: W) -> io::Result<()> {
    writeln!(out, "{HEADER}")?;
    for candidate in candidates {
        let context = &candidate.read_context;
        let microhomology = if context.microhomology().is_empty() {
            ".".to_string()
        } else {
            String::from_utf8_lossy(context.microhomology()).into_owned()
        };
        let repeat = context
            .repeat()
            .map_or_else(|| ".".to_string(), ToString::to_string);
        let secondary = candidate
            .secondary_context
            .as_ref()
            .map_or_else(|| ".".to_string(), ToString::to_string);
        let samples = candidate
            .samples
            .iter()
            .map(|s| {
                format!(
                    "{}:{}/{}/{}/{}",
                    s.sample, s.full_matches, s.core_matches, s.raw_alt_support, s.raw_depth
                )
            })
            .collect::<Vec<_>>()
            .join(",");

        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            candidate.chrom,
            candidate.position,
            String::from_utf8_lossy(candidate.key.ref_bases()),
            String::from_utf8_lossy(candidate.key.alt_bases()),
            candidate.tier,
            context,
            microhomology,
            repeat,
            candidate.min_events,
            candidate.read_context_support,
            candidate.core_support,
            secondary,
            samples
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::aggregate::AlleleKey;
    use crate::candidates::SampleSupport;
    use crate::classify::Tier;
    use crate::context::ReadContext;

    #[test]
    fn renders_one_line_per_candidate() {
        let candidate = Candidate {
            chrom: Arc::from("chr2"),
            position: 29_443_695,
            key: AlleleKey::new(b"G", b"T"),
            tier: Tier::Panel,
            read_context: ReadContext::new(b"AC".to_vec(), b"CGTAC".to_vec(), b"TT".to_vec()),
            secondary_context: None,
            min_events: 1,
            read_context_support: 12,
            core_support: 2,
            samples: vec![SampleSupport {
                sample: Arc::from("tumor"),
                full_matches: 12,
                core_matches: 2,
                raw_alt_support: 15,
                raw_depth: 80,
            }],
        };

        let mut out = Vec::new();
        render_tsv(&[candidate], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("#chrom\tpos"));
        assert_eq!(
            lines[1],
            "chr2\t29443695\tG\tT\tPANEL\tAC-CGTAC-TT\t.\t.\t1\t12\t2\t.\ttumor:12/2/15/80"
        );
    }
}
