//! Audio features: per-track vectors from the catalog and per-mood targets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog-provided numeric track attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFeature {
    Energy,
    Valence,
    Danceability,
    Tempo,
    Acousticness,
    Instrumentalness,
}

/// Full feature vector for one track, as the catalog reports it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    /// Beats per minute, not normalized.
    pub tempo: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
}

impl FeatureVector {
    pub fn get(&self, feature: AudioFeature) -> f64 {
        match feature {
            AudioFeature::Energy => self.energy,
            AudioFeature::Valence => self.valence,
            AudioFeature::Danceability => self.danceability,
            AudioFeature::Tempo => self.tempo,
            AudioFeature::Acousticness => self.acousticness,
            AudioFeature::Instrumentalness => self.instrumentalness,
        }
    }
}

/// Partial target vector. An absent feature is unconstrained, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AudioFeatureTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danceability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acousticness: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrumentalness: Option<f64>,
}

impl AudioFeatureTarget {
    pub fn get(&self, feature: AudioFeature) -> Option<f64> {
        match feature {
            AudioFeature::Energy => self.energy,
            AudioFeature::Valence => self.valence,
            AudioFeature::Danceability => self.danceability,
            AudioFeature::Tempo => self.tempo,
            AudioFeature::Acousticness => self.acousticness,
            AudioFeature::Instrumentalness => self.instrumentalness,
        }
    }

    /// Coarse query qualifiers for features whose target is high (> 0.7).
    #[must_use]
    pub fn hints(&self) -> Vec<FeatureHint> {
        const HIGH: f64 = 0.7;
        [
            (self.energy, FeatureHint::HighEnergy),
            (self.valence, FeatureHint::HighValence),
            (self.danceability, FeatureHint::HighDanceability),
        ]
        .into_iter()
        .filter_map(|(target, hint)| target.filter(|&value| value > HIGH).map(|_| hint))
        .collect()
    }
}

/// Qualifier appended to a catalog query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureHint {
    HighEnergy,
    HighValence,
    HighDanceability,
}

impl fmt::Display for FeatureHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureHint::HighEnergy => f.write_str("energy:high"),
            FeatureHint::HighValence => f.write_str("valence:high"),
            FeatureHint::HighDanceability => f.write_str("danceability:high"),
        }
    }
}
