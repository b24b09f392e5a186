use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::aggregate::AlleleKey;
use crate::genomics::RegionSet;

/// Confidence tier of a candidate, in decreasing order of confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Tier {
    /// Exact match to a known hotspot variant.
    Hotspot,
    /// Inside a targeted panel region.
    Panel,
    /// Inside a high-confidence region.
    HighConfidence,
    /// Anywhere else.
    LowConfidence,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Tier::Hotspot => "HOTSPOT",
            Tier::Panel => "PANEL",
            Tier::HighConfidence => "HIGH_CONFIDENCE",
            Tier::LowConfidence => "LOW_CONFIDENCE",
        };
        f.write_str(label)
    }
}

/// Known hotspot variants indexed by chromosome and position.
#[derive(Debug, Clone, Default)]
pub struct HotspotSet {
    variants: HashMap<Arc<str>, BTreeMap<u32, Vec<AlleleKey>>>,
}

impl HotspotSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hotspot variant.
    pub fn insert(&mut self, chrom: impl Into<Arc<str>>, position: u32, key: AlleleKey) {
        let alleles = self
            .variants
            .entry(chrom.into())
            .or_default()
            .entry(position)
            .or_default();
        if !alleles.contains(&key) {
            alleles.push(key);
        }
    }

    /// Number of hotspot variants.
    pub fn len(&self) -> usize {
        self.variants
            .values()
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the exact variant is a hotspot.
    pub fn contains(&self, chrom: &str, position: u32, key: &AlleleKey) -> bool {
        self.variants
            .get(chrom)
            .and_then(|positions| positions.get(&position))
            .map_or(false, |alleles| alleles.contains(key))
    }

    /// Whether any hotspot variant sits at `position`.
    pub fn is_hotspot_position(&self, chrom: &str, position: u32) -> bool {
        self.variants
            .get(chrom)
            .map_or(false, |positions| positions.contains_key(&position))
    }

    /// Whether any hotspot lies within `[start, end]`.
    pub fn overlaps(&self, chrom: &str, start: u32, end: u32) -> bool {
        start <= end
            && self
                .variants
                .get(chrom)
                .map_or(false, |positions| positions.range(start..=end).next().is_some())
    }
}

/// Assigns tiers by first match in hotspot, panel, high-confidence order.
#[derive(Debug, Clone, Default)]
pub struct TierClassifier {
    hotspots: Arc<HotspotSet>,
    panel: Arc<RegionSet>,
    high_confidence: Arc<RegionSet>,
}

impl TierClassifier {
    /// Classifier over shared, read-only region sets.
    pub fn new(
        hotspots: Arc<HotspotSet>,
        panel: Arc<RegionSet>,
        high_confidence: Arc<RegionSet>,
    ) -> Self {
        Self {
            hotspots,
            panel,
            high_confidence,
        }
    }

    /// Hotspot variants.
    pub fn hotspots(&self) -> &HotspotSet {
        &self.hotspots
    }

    /// Tier of `key` at `position`.
    pub fn classify(&self, chrom: &str, position: u32, key: &AlleleKey) -> Tier {
        if self.hotspots.contains(chrom, position, key) {
            Tier::Hotspot
        } else if self.panel.contains(chrom, position) {
            Tier::Panel
        } else if self.high_confidence.contains(chrom, position) {
            Tier::HighConfidence
        } else {
            Tier::LowConfidence
        }
    }
}
