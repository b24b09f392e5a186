//! Region orchestration.
//!
//! A [`RegionTask`] runs one sample over one region with its own window;
//! [`call_regions`] fans tasks out over rayon and merges their candidates.
//! Hotspot and region sets are shared read-only through
//! [`SharedResources`].

mod diagnostics;
mod parallel;
mod region;

use std::sync::Arc;

use crate::classify::{HotspotSet, TierClassifier};
use crate::genomics::RegionSet;

pub use diagnostics::Diagnostics;
pub use parallel::{call_regions, CallResult, RegionInput, RegionJob, RunStats};
pub use region::{RegionResult, RegionTask};

/// Immutable inputs shared by every region worker.
#[derive(Debug, Clone, Default)]
pub struct SharedResources {
    /// Known hotspot variants.
    pub hotspots: Arc<HotspotSet>,
    /// Targeted panel regions.
    pub panel: Arc<RegionSet>,
    /// High-confidence regions.
    pub high_confidence: Arc<RegionSet>,
}

impl SharedResources {
    /// Bundle the shared sets.
    pub fn new(hotspots: HotspotSet, panel: RegionSet, high_confidence: RegionSet) -> Self {
        Self {
            hotspots: Arc::new(hotspots),
            panel: Arc::new(panel),
            high_confidence: Arc::new(high_confidence),
        }
    }

    /// Tier classifier over these sets.
    pub fn classifier(&self) -> TierClassifier {
        TierClassifier::new(
            Arc::clone(&self.hotspots),
            Arc::clone(&self.panel),
            Arc::clone(&self.high_confidence),
        )
    }
}
