//! Signal classification with fixed, ordered threshold rules

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalLabel {
    Accumulation,
    Breakout,
    Overheated,
    Distribution,
    Neutral,
}

impl SignalLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalLabel::Accumulation => "ACCUMULATION",
            SignalLabel::Breakout => "BREAKOUT",
            SignalLabel::Overheated => "OVERHEATED",
            SignalLabel::Distribution => "DISTRIBUTION",
            SignalLabel::Neutral => "NEUTRAL",
        }
    }
}

/// Instrument-level intensity derived from the short-horizon z-score.
/// Independent from the spike-ratio event ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityTier {
    Extreme,
    Hot,
    Warm,
    Active,
    Normal,
    Cool,
    Cold,
}

impl IntensityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntensityTier::Extreme => "extreme",
            IntensityTier::Hot => "hot",
            IntensityTier::Warm => "warm",
            IntensityTier::Active => "active",
            IntensityTier::Normal => "normal",
            IntensityTier::Cool => "cool",
            IntensityTier::Cold => "cold",
        }
    }
}

pub struct SignalDetector {
    overheated_short: f64,
    breakout_short: f64,
    breakout_long: f64,
    accumulation_short: f64,
    accumulation_long: f64,
    distribution_short: f64,
    distribution_long: f64,
    /// Tier cut points, highest first: extreme, hot, warm, active, normal, cool
    tier_cuts: [f64; 6],
}

impl SignalDetector {
    pub fn with_defaults() -> Self {
        Self {
            overheated_short: 3.0,
            breakout_short: 2.0,
            breakout_long: 1.0,
            accumulation_short: 1.5,
            accumulation_long: 1.0,
            distribution_short: -1.0,
            distribution_long: 1.0,
            tier_cuts: [3.0, 2.0, 1.0, 0.0, -1.0, -2.0],
        }
    }

    /// Detect the signal label from short and long z-scores
    ///
    /// # Priority
    /// OVERHEATED → BREAKOUT → ACCUMULATION → DISTRIBUTION → NEUTRAL,
    /// first match wins. All comparisons are strict.
    pub fn detect_signal(&self, short_z: f64, long_z: f64) -> SignalLabel {
        if short_z > self.overheated_short {
            return SignalLabel::Overheated;
        }

        if short_z > self.breakout_short && long_z > self.breakout_long {
            return SignalLabel::Breakout;
        }

        if short_z > self.accumulation_short && long_z < self.accumulation_long {
            return SignalLabel::Accumulation;
        }

        if short_z < self.distribution_short && long_z > self.distribution_long {
            return SignalLabel::Distribution;
        }

        SignalLabel::Neutral
    }

    /// Tier from the short z-score alone. Cut points are inclusive.
    pub fn intensity_tier(&self, short_z: f64) -> IntensityTier {
        const TIERS: [IntensityTier; 6] = [
            IntensityTier::Extreme,
            IntensityTier::Hot,
            IntensityTier::Warm,
            IntensityTier::Active,
            IntensityTier::Normal,
            IntensityTier::Cool,
        ];

        self.tier_cuts
            .iter()
            .zip(TIERS)
            .find(|(cut, _)| short_z >= **cut)
            .map(|(_, tier)| tier)
            .unwrap_or(IntensityTier::Cold)
    }

    pub fn classify(&self, short_z: f64, long_z: f64) -> (SignalLabel, IntensityTier) {
        (
            self.detect_signal(short_z, long_z),
            self.intensity_tier(short_z),
        )
    }
}
