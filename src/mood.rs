//! Canonical mood labels and the signal both classifiers produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Canonical mood label.
///
/// The set is open: labels outside the known variants are carried as
/// [`Mood::Other`] so tables and playlists can still key on them. Lookups for
/// moods without table entries degrade to neutral.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Surprise,
    Fear,
    Disgust,
    Neutral,
    Energetic,
    Calm,
    Anxious,
    Romantic,
    Party,
    Focus,
    Workout,
    Other(String),
}

impl Mood {
    /// Every named variant, in declaration order.
    pub const KNOWN: [Mood; 14] = [
        Mood::Happy,
        Mood::Sad,
        Mood::Angry,
        Mood::Surprise,
        Mood::Fear,
        Mood::Disgust,
        Mood::Neutral,
        Mood::Energetic,
        Mood::Calm,
        Mood::Anxious,
        Mood::Romantic,
        Mood::Party,
        Mood::Focus,
        Mood::Workout,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
            Mood::Angry => "angry",
            Mood::Surprise => "surprise",
            Mood::Fear => "fear",
            Mood::Disgust => "disgust",
            Mood::Neutral => "neutral",
            Mood::Energetic => "energetic",
            Mood::Calm => "calm",
            Mood::Anxious => "anxious",
            Mood::Romantic => "romantic",
            Mood::Party => "party",
            Mood::Focus => "focus",
            Mood::Workout => "workout",
            Mood::Other(label) => label,
        }
    }

    /// Label with the first letter upper-cased, used for playlist names.
    pub fn capitalized(&self) -> String {
        let label = self.as_str();
        let mut chars = label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsing never fails on a non-empty label; unknown labels become `Other`.
impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        if label.is_empty() {
            return Err("mood must be a non-empty string".to_string());
        }
        Ok(Mood::KNOWN
            .iter()
            .find(|mood| mood.as_str() == label)
            .cloned()
            .unwrap_or(Mood::Other(label)))
    }
}

impl Serialize for Mood {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Mood {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// Which input modality produced a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    Text,
    Facial,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionMethod::Text => f.write_str("text"),
            DetectionMethod::Facial => f.write_str("facial"),
        }
    }
}

/// Result of one detection call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodSignal {
    pub mood: Mood,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub method: DetectionMethod,
    /// Raw polarity score for text detections; `None` for facial ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_score: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl MoodSignal {
    pub fn new(
        mood: Mood,
        confidence: f64,
        method: DetectionMethod,
        raw_score: Option<f64>,
    ) -> Self {
        Self::at(mood, confidence, method, raw_score, Utc::now())
    }

    /// Build a signal with an explicit timestamp.
    pub fn at(
        mood: Mood,
        confidence: f64,
        method: DetectionMethod,
        raw_score: Option<f64>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            mood,
            confidence: clamp_unit(confidence),
            method,
            raw_score,
            timestamp,
        }
    }
}

/// Clamp to `[0, 1]`; non-finite values collapse to 0.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
