//! Admission policies: per-position depth ceilings and confidence tiers.

mod depth;
mod tier;

pub use depth::{is_mitochondrial, DepthGovernor};
pub use tier::{HotspotSet, Tier, TierClassifier};
