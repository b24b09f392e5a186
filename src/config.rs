//! Engine configuration.
//!
//! All tunables live in [`EngineConfig`]; nested groups cover read-quality
//! penalties, depth ceilings, second-candidate promotion, soft-clip insert
//! inference, per-tier admission and repeat detection.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::aggregate::SecondCandidateThresholds;
use crate::classify::Tier;

/// Errors raised by [`EngineConfig::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Configuration value is unusable.
    #[error("invalid engine configuration: {0}")]
    Invalid(String),

    /// The eviction slack does not fit inside the window.
    #[error("read length buffer {buffer} must be smaller than window capacity {capacity}")]
    BufferExceedsCapacity {
        /// `max_read_length + max_deletion_length`.
        buffer: u32,
        /// `2 * max_read_length`.
        capacity: u32,
    },
}

/// Mapping-quality penalties used to derive a read's adjusted quality.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QualityConfig {
    /// Subtracted from every read.
    pub fixed_penalty: u32,
    /// Subtracted per event beyond the first.
    pub event_penalty: u32,
    /// Subtracted from paired reads lacking the proper-pair flag.
    pub improper_pair_penalty: u32,
    /// Subtracted from soft-clipped reads.
    pub soft_clip_penalty: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            fixed_penalty: 15,
            event_penalty: 7,
            improper_pair_penalty: 15,
            soft_clip_penalty: 7,
        }
    }
}

/// Per-position read depth ceilings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DepthConfig {
    /// Ceiling outside panel regions.
    pub max_depth: u32,
    /// Ceiling inside targeted panel regions.
    pub max_depth_panel: u32,
    /// Ceiling on the mitochondrial contig.
    pub max_depth_mitochondrial: u32,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            max_depth: 1_000,
            max_depth_panel: 100_000,
            max_depth_mitochondrial: 100_000,
        }
    }
}

/// Soft-clip insertion inference.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SoftClipConfig {
    /// Shortest inserted sequence inferred from a clip.
    pub min_insert_length: u32,
    /// Clipped bases that must re-match the reference after the insert.
    pub min_anchor_length: u32,
    /// Reads whose fragment is shorter than read length plus this are
    /// treated as adapter read-through and their clips ignored.
    pub adapter_min_overlap: u32,
}

impl Default for SoftClipConfig {
    fn default() -> Self {
        Self {
            min_insert_length: 5,
            min_anchor_length: 10,
            adapter_min_overlap: 10,
        }
    }
}

/// Minimum raw alt support an allele needs to survive finalization, per tier.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TierThresholds {
    /// Known hotspot variants.
    pub hotspot: u32,
    /// Targeted panel regions.
    pub panel: u32,
    /// High-confidence regions.
    pub high_confidence: u32,
    /// Everything else.
    pub low_confidence: u32,
}

impl TierThresholds {
    /// Threshold for a tier.
    pub fn min_alt_support(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Hotspot => self.hotspot,
            Tier::Panel => self.panel,
            Tier::HighConfidence => self.high_confidence,
            Tier::LowConfidence => self.low_confidence,
        }
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            hotspot: 1,
            panel: 1,
            high_confidence: 1,
            low_confidence: 1,
        }
    }
}

/// Short tandem repeat detection used when sizing read-context cores.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RepeatConfig {
    /// Longest repeat unit considered.
    pub max_unit_length: usize,
    /// Fewest consecutive copies that count as a repeat.
    pub min_count: u32,
}

impl Default for RepeatConfig {
    fn default() -> Self {
        Self {
            max_unit_length: 3,
            min_count: 3,
        }
    }
}

/// Configuration parameters for the aggregation engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Longest read expected in the input.
    pub max_read_length: u32,
    /// Longest deletion expected in the input.
    pub max_deletion_length: u32,
    /// Bases on each side of a read-context core.
    pub flank_size: usize,
    /// Bases on each side of the variant included in the core.
    pub core_padding: usize,
    /// Adjusted mapping-quality penalties.
    pub quality: QualityConfig,
    /// Depth ceilings.
    pub depth: DepthConfig,
    /// Second-candidate promotion thresholds.
    pub second_candidate: SecondCandidateThresholds,
    /// Soft-clip insertion inference.
    pub soft_clip: SoftClipConfig,
    /// Per-tier finalization thresholds.
    pub tiers: TierThresholds,
    /// Repeat detection.
    pub repeat: RepeatConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_read_length: 151,
            max_deletion_length: 80,
            flank_size: 10,
            core_padding: 2,
            quality: QualityConfig::default(),
            depth: DepthConfig::default(),
            second_candidate: SecondCandidateThresholds::default(),
            soft_clip: SoftClipConfig::default(),
            tiers: TierThresholds::default(),
            repeat: RepeatConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Set the maximum read length.
    pub fn with_max_read_length(mut self, max_read_length: u32) -> Self {
        self.max_read_length = max_read_length;
        self
    }

    /// Set the maximum expected deletion length.
    pub fn with_max_deletion_length(mut self, max_deletion_length: u32) -> Self {
        self.max_deletion_length = max_deletion_length;
        self
    }

    /// Set the flank size.
    pub fn with_flank_size(mut self, flank_size: usize) -> Self {
        self.flank_size = flank_size;
        self
    }

    /// Set the depth ceilings.
    pub fn with_depth(mut self, depth: DepthConfig) -> Self {
        self.depth = depth;
        self
    }

    /// Set second-candidate thresholds.
    pub fn with_second_candidate(mut self, thresholds: SecondCandidateThresholds) -> Self {
        self.second_candidate = thresholds;
        self
    }

    /// Set per-tier thresholds.
    pub fn with_tiers(mut self, tiers: TierThresholds) -> Self {
        self.tiers = tiers;
        self
    }

    /// Ring buffer capacity: twice the maximum read length.
    pub fn window_capacity(&self) -> u32 {
        self.max_read_length * 2
    }

    /// Distance behind the highest requested position that stays buffered.
    pub fn read_length_buffer(&self) -> u32 {
        self.max_read_length + self.max_deletion_length
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_read_length == 0 {
            return Err(ConfigError::Invalid("max read length must be > 0".to_string()));
        }
        if self.flank_size == 0 {
            return Err(ConfigError::Invalid("flank size must be > 0".to_string()));
        }
        let buffer = self.read_length_buffer();
        let capacity = self.window_capacity();
        if buffer >= capacity {
            return Err(ConfigError::BufferExceedsCapacity { buffer, capacity });
        }
        let fraction = self.second_candidate.min_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ConfigError::Invalid(format!(
                "second candidate fraction {fraction} outside [0, 1]"
            )));
        }
        if self.depth.max_depth == 0
            || self.depth.max_depth_panel == 0
            || self.depth.max_depth_mitochondrial == 0
        {
            return Err(ConfigError::Invalid("depth ceilings must be > 0".to_string()));
        }
        if self.repeat.min_count < 2 || self.repeat.max_unit_length == 0 {
            return Err(ConfigError::Invalid(
                "repeats need a unit length > 0 and at least 2 copies".to_string(),
            ));
        }
        if self.soft_clip.min_insert_length == 0 || self.soft_clip.min_anchor_length == 0 {
            return Err(ConfigError::Invalid(
                "soft clip insert and anchor lengths must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
