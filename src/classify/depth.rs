use std::sync::Arc;

use bitvec::prelude::*;

use crate::config::DepthConfig;
use crate::genomics::{GenomeRegion, RegionSet};

/// Contig names treated as mitochondrial.
const MITOCHONDRIAL_CONTIGS: [&str; 4] = ["MT", "M", "chrM", "chrMT"];

/// Whether `chrom` names the mitochondrial contig.
pub fn is_mitochondrial(chrom: &str) -> bool {
    MITOCHONDRIAL_CONTIGS.contains(&chrom)
}

/// Chooses the per-position depth ceiling for one region.
///
/// Panel membership is precomputed as a bitmask over the region plus
/// padding; positions outside the mask fall back to the interval set.
#[derive(Debug, Clone)]
pub struct DepthGovernor {
    chrom: Arc<str>,
    mitochondrial: bool,
    config: DepthConfig,
    panel: Arc<RegionSet>,
    mask_start: u32,
    panel_mask: BitVec,
}

impl DepthGovernor {
    /// Governor for `region`, with the panel mask extended by `padding`.
    pub fn for_region(
        region: &GenomeRegion,
        padding: u32,
        panel: Arc<RegionSet>,
        config: &DepthConfig,
    ) -> Self {
        let mask_start = region.start.saturating_sub(padding).max(1);
        let mask_end = region.end.saturating_add(padding);
        // An inverted region gets an empty mask and falls back to the interval set.
        let mask_len = mask_end
            .checked_sub(mask_start)
            .map_or(0, |span| span as usize + 1);
        let mut panel_mask = bitvec![0; mask_len];

        for &(start, end) in panel.intervals(&region.chrom) {
            if mask_len == 0 || end < mask_start || start > mask_end {
                continue;
            }
            let from = (start.max(mask_start) - mask_start) as usize;
            let to = (end.min(mask_end) - mask_start) as usize;
            panel_mask[from..=to].fill(true);
        }

        Self {
            mitochondrial: is_mitochondrial(&region.chrom),
            chrom: Arc::clone(&region.chrom),
            config: config.clone(),
            panel,
            mask_start,
            panel_mask,
        }
    }

    /// Whether `position` lies in a panel region.
    pub fn in_panel(&self, position: u32) -> bool {
        match position
            .checked_sub(self.mask_start)
            .and_then(|offset| self.panel_mask.get(offset as usize))
        {
            Some(bit) => *bit,
            None => self.panel.contains(&self.chrom, position),
        }
    }

    /// Depth ceiling at `position`.
    pub fn ceiling(&self, position: u32) -> u32 {
        if self.mitochondrial {
            self.config.max_depth_mitochondrial
        } else if self.in_panel(position) {
            self.config.max_depth_panel
        } else {
            self.config.max_depth
        }
    }
}
