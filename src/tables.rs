//! Mood → audio-feature target and mood → genre set tables.

use crate::features::AudioFeatureTarget;
use crate::mood::Mood;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Feature target and candidate genres for one mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodProfile {
    pub features: AudioFeatureTarget,
    /// Ordered; one tag is picked per retrieval.
    pub genres: Vec<String>,
}

/// Read-only lookup tables keyed by mood label.
///
/// Must contain a `neutral` row; every lookup for a missing mood lands there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HashMap<String, MoodProfile>", into = "HashMap<String, MoodProfile>")]
pub struct MoodTables {
    profiles: HashMap<String, MoodProfile>,
}

impl MoodTables {
    /// Build tables from rows. Fails if there is no neutral row to fall back on.
    pub fn new(profiles: HashMap<String, MoodProfile>) -> Result<Self, String> {
        let profiles: HashMap<String, MoodProfile> = profiles
            .into_iter()
            .map(|(mood, profile)| (mood.trim().to_lowercase(), profile))
            .collect();
        if !profiles.contains_key(Mood::Neutral.as_str()) {
            return Err("mood tables must define a `neutral` entry".to_string());
        }
        Ok(Self { profiles })
    }

    /// Profile for `mood`, falling back to neutral.
    pub fn profile(&self, mood: &Mood) -> &MoodProfile {
        self.profiles
            .get(mood.as_str())
            .unwrap_or_else(|| self.neutral())
    }

    /// Mood labels with their own row, in no particular order.
    pub fn moods(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    fn neutral(&self) -> &MoodProfile {
        // `new` guarantees the neutral row.
        &self.profiles[Mood::Neutral.as_str()]
    }
}

impl TryFrom<HashMap<String, MoodProfile>> for MoodTables {
    type Error = String;

    fn try_from(profiles: HashMap<String, MoodProfile>) -> Result<Self, Self::Error> {
        Self::new(profiles)
    }
}

impl From<MoodTables> for HashMap<String, MoodProfile> {
    fn from(tables: MoodTables) -> Self {
        tables.profiles
    }
}

fn row(mood: Mood, features: AudioFeatureTarget, genres: &[&str]) -> (String, MoodProfile) {
    (
        mood.as_str().to_string(),
        MoodProfile {
            features,
            genres: genres.iter().map(|genre| (*genre).to_string()).collect(),
        },
    )
}

impl Default for MoodTables {
    fn default() -> Self {
        let target = AudioFeatureTarget::default;
        let profiles = HashMap::from([
            row(
                Mood::Happy,
                AudioFeatureTarget {
                    valence: Some(0.7),
                    energy: Some(0.7),
                    danceability: Some(0.6),
                    ..target()
                },
                &["pop", "indie-pop", "funk", "soul", "dance"],
            ),
            row(
                Mood::Sad,
                AudioFeatureTarget {
                    valence: Some(0.2),
                    energy: Some(0.3),
                    acousticness: Some(0.6),
                    ..target()
                },
                &["indie", "singer-songwriter", "blues", "folk", "ambient"],
            ),
            row(
                Mood::Energetic,
                AudioFeatureTarget {
                    energy: Some(0.8),
                    danceability: Some(0.8),
                    tempo: Some(120.0),
                    ..target()
                },
                &["electronic", "dance", "house", "techno", "rock"],
            ),
            row(
                Mood::Calm,
                AudioFeatureTarget {
                    energy: Some(0.3),
                    valence: Some(0.5),
                    acousticness: Some(0.7),
                    ..target()
                },
                &["ambient", "classical", "chill", "lo-fi", "acoustic"],
            ),
            row(
                Mood::Angry,
                AudioFeatureTarget {
                    energy: Some(0.9),
                    valence: Some(0.2),
                    tempo: Some(140.0),
                    ..target()
                },
                &["rock", "metal", "punk", "hard-rock", "alternative"],
            ),
            row(
                Mood::Neutral,
                AudioFeatureTarget {
                    valence: Some(0.5),
                    energy: Some(0.5),
                    ..target()
                },
                &["pop", "indie", "alternative", "rock"],
            ),
            row(
                Mood::Romantic,
                AudioFeatureTarget {
                    valence: Some(0.6),
                    energy: Some(0.4),
                    acousticness: Some(0.5),
                    ..target()
                },
                &["r-n-b", "soul", "jazz", "indie", "acoustic"],
            ),
            row(
                Mood::Party,
                AudioFeatureTarget {
                    danceability: Some(0.9),
                    energy: Some(0.8),
                    valence: Some(0.8),
                    ..target()
                },
                &["dance", "pop", "electronic", "hip-hop", "funk"],
            ),
            row(
                Mood::Focus,
                AudioFeatureTarget {
                    energy: Some(0.4),
                    instrumentalness: Some(0.6),
                    acousticness: Some(0.3),
                    ..target()
                },
                &["classical", "ambient", "instrumental", "lo-fi", "post-rock"],
            ),
            row(
                Mood::Workout,
                AudioFeatureTarget {
                    energy: Some(0.9),
                    danceability: Some(0.7),
                    tempo: Some(130.0),
                    ..target()
                },
                &["electronic", "rock", "hip-hop", "pop", "dance"],
            ),
        ]);
        Self { profiles }
    }
}
