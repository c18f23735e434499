//! Feature-target resolution: mood (+ caller overrides) → what to search for
//! and what to rank against.

use crate::error::{MoodError, MoodResult};
use crate::features::AudioFeatureTarget;
use crate::mood::Mood;
use crate::tables::MoodTables;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_LIMIT: usize = 20;

/// Caller-facing playlist request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaylistRequest {
    /// Mood label; unknown labels are allowed and degrade to neutral.
    pub mood: String,
    /// Replaces the mood's genre set for retrieval. Empty means no override.
    pub genres: Option<Vec<String>>,
    pub artist: Option<String>,
    /// Extra energy criterion in `[0, 1]`, checked alongside the mood's own.
    pub energy_level: Option<f64>,
    pub limit: Option<usize>,
    /// Overrides the engine's default market.
    pub market: Option<String>,
}

impl PlaylistRequest {
    pub fn for_mood(mood: impl Into<String>) -> Self {
        Self {
            mood: mood.into(),
            ..Self::default()
        }
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = Some(genres.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_energy_level(mut self, energy_level: f64) -> Self {
        self.energy_level = Some(energy_level);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_market(mut self, market: impl Into<String>) -> Self {
        self.market = Some(market.into());
        self
    }
}

/// Everything retrieval and ranking need for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTarget {
    pub mood: Mood,
    /// Always the mood table's target, even when genres were overridden.
    pub features: AudioFeatureTarget,
    pub genres: Vec<String>,
    /// True when `genres` came from the caller rather than the table.
    pub genres_overridden: bool,
    pub artist: Option<String>,
    pub energy_level: Option<f64>,
    pub limit: usize,
}

/// Looks moods up in the injected [`MoodTables`].
#[derive(Debug, Clone)]
pub struct FeatureTargetResolver {
    tables: Arc<MoodTables>,
    default_limit: usize,
}

impl FeatureTargetResolver {
    pub fn new(tables: Arc<MoodTables>) -> Self {
        Self {
            tables,
            default_limit: DEFAULT_LIMIT,
        }
    }

    /// Limit applied when a request leaves it unset. Zero is ignored.
    pub fn with_default_limit(mut self, default_limit: usize) -> Self {
        if default_limit > 0 {
            self.default_limit = default_limit;
        }
        self
    }

    /// Validate `request` and resolve its target vector, genre set, and limit.
    ///
    /// # Errors
    ///
    /// [`MoodError::InvalidRequest`] for an empty mood, a zero limit, an
    /// energy level outside `[0, 1]`, or a blank explicit genre.
    pub fn resolve(&self, request: &PlaylistRequest) -> MoodResult<ResolvedTarget> {
        let mood: Mood = request.mood.parse().map_err(MoodError::InvalidRequest)?;

        let limit = request.limit.unwrap_or(self.default_limit);
        if limit == 0 {
            return Err(MoodError::InvalidRequest("limit must be a positive integer".into()));
        }

        if let Some(energy) = request.energy_level {
            if !(0.0..=1.0).contains(&energy) {
                return Err(MoodError::InvalidRequest(format!(
                    "energy level must be between 0 and 1, got {energy}"
                )));
            }
        }

        let explicit_genres = match &request.genres {
            Some(genres) if !genres.is_empty() => {
                if genres.iter().any(|genre| genre.trim().is_empty()) {
                    return Err(MoodError::InvalidRequest("genre names must not be blank".into()));
                }
                Some(genres.iter().map(|genre| genre.trim().to_string()).collect::<Vec<_>>())
            }
            _ => None,
        };

        let profile = self.tables.profile(&mood);
        let artist = request
            .artist
            .as_deref()
            .map(str::trim)
            .filter(|artist| !artist.is_empty())
            .map(str::to_string);

        Ok(ResolvedTarget {
            features: profile.features,
            genres_overridden: explicit_genres.is_some(),
            genres: explicit_genres.unwrap_or_else(|| profile.genres.clone()),
            mood,
            artist,
            energy_level: request.energy_level,
            limit,
        })
    }
}

impl Default for FeatureTargetResolver {
    fn default() -> Self {
        Self::new(Arc::new(MoodTables::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_table_row_and_default_limit() {
        let resolved = FeatureTargetResolver::default()
            .resolve(&PlaylistRequest::for_mood("happy"))
            .unwrap();
        assert_eq!(resolved.mood, Mood::Happy);
        assert_eq!(resolved.features.valence, Some(0.7));
        assert_eq!(resolved.genres[0], "pop");
        assert!(!resolved.genres_overridden);
        assert_eq!(resolved.limit, DEFAULT_LIMIT);
        assert_eq!(resolved.energy_level, None);
    }

    #[test]
    fn test_unknown_mood_degrades_to_neutral() {
        let resolver = FeatureTargetResolver::default();
        let neutral = resolver.resolve(&PlaylistRequest::for_mood("neutral")).unwrap();
        let unknown = resolver.resolve(&PlaylistRequest::for_mood("Nostalgic")).unwrap();
        assert_eq!(unknown.mood, Mood::Other("nostalgic".into()));
        assert_eq!(unknown.features, neutral.features);
        assert_eq!(unknown.genres, neutral.genres);
    }

    #[test]
    fn test_explicit_genres_replace_set_but_keep_features() {
        let resolved = FeatureTargetResolver::default()
            .resolve(&PlaylistRequest::for_mood("sad").with_genres([" jazz ", "soul"]))
            .unwrap();
        assert_eq!(resolved.genres, vec!["jazz".to_string(), "soul".to_string()]);
        assert!(resolved.genres_overridden);
        assert_eq!(resolved.features.valence, Some(0.2));

        let empty = FeatureTargetResolver::default()
            .resolve(&PlaylistRequest::for_mood("sad").with_genres(Vec::<String>::new()))
            .unwrap();
        assert!(!empty.genres_overridden);
        assert_eq!(empty.genres[0], "indie");
    }

    #[test]
    fn test_energy_override_is_carried_separately() {
        let resolved = FeatureTargetResolver::default()
            .resolve(&PlaylistRequest::for_mood("calm").with_energy_level(0.8))
            .unwrap();
        assert_eq!(resolved.energy_level, Some(0.8));
        assert_eq!(resolved.features.energy, Some(0.3));
    }

    #[test]
    fn test_input_shape_validation() {
        let resolver = FeatureTargetResolver::default();
        let invalid = [
            PlaylistRequest::for_mood(""),
            PlaylistRequest::for_mood("   "),
            PlaylistRequest::for_mood("happy").with_limit(0),
            PlaylistRequest::for_mood("happy").with_energy_level(1.5),
            PlaylistRequest::for_mood("happy").with_energy_level(f64::NAN),
            PlaylistRequest::for_mood("happy").with_genres(["pop", " "]),
        ];
        for request in invalid {
            assert!(
                matches!(resolver.resolve(&request), Err(MoodError::InvalidRequest(_))),
                "{request:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_blank_artist_is_dropped_and_default_limit_configurable() {
        let resolver = FeatureTargetResolver::default().with_default_limit(5);
        let resolved = resolver
            .resolve(&PlaylistRequest::for_mood("party").with_artist("  "))
            .unwrap();
        assert_eq!(resolved.artist, None);
        assert_eq!(resolved.limit, 5);

        let explicit = resolver
            .resolve(&PlaylistRequest::for_mood("party").with_limit(3).with_artist("Daft Punk"))
            .unwrap();
        assert_eq!(explicit.limit, 3);
        assert_eq!(explicit.artist.as_deref(), Some("Daft Punk"));
    }
}
