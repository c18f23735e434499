//! Music catalog collaborator.
//!
//! The engine only needs two calls from a catalog: a filtered track search and a
//! batch audio-feature lookup. [`Catalog`] is the seam; [`sqlite::SqliteCatalog`]
//! is the local implementation shipped with the CLI, and tests plug in fakes.

pub mod sqlite;

use crate::error::CatalogError;
use crate::features::{FeatureHint, FeatureVector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A track as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub artists: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Filled in by the ranker once fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureVector>,
}

impl Candidate {
    /// Minimal candidate; the remaining fields start empty.
    pub fn new(id: impl Into<String>, name: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            artists: vec![artist.into()],
            album: None,
            duration_ms: 0,
            preview_url: None,
            image_url: None,
            features: None,
        }
    }

    /// Artist names joined for display.
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

/// One catalog search. A query without a genre is the relaxed fallback form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CatalogQuery {
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub hints: Vec<FeatureHint>,
}

impl CatalogQuery {
    pub fn without_genre(&self) -> Self {
        Self {
            genre: None,
            ..self.clone()
        }
    }

    /// Text form, e.g. `genre:rock artist:Muse energy:high`.
    pub fn to_query_string(&self) -> String {
        let mut parts = Vec::new();
        if let Some(genre) = &self.genre {
            parts.push(format!("genre:{genre}"));
        }
        if let Some(artist) = &self.artist {
            parts.push(format!("artist:{artist}"));
        }
        parts.extend(self.hints.iter().map(ToString::to_string));
        parts.join(" ")
    }
}

impl fmt::Display for CatalogQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

/// External music catalog.
///
/// Implementations bound each call by their own timeout and report it as
/// [`CatalogError::Timeout`] rather than blocking indefinitely.
pub trait Catalog: Send + Sync {
    /// Search for at most `limit` tracks available in `market`.
    fn search(
        &self,
        query: &CatalogQuery,
        limit: usize,
        market: &str,
    ) -> Result<Vec<Candidate>, CatalogError>;

    /// Feature vectors for `ids`. Tracks without features are simply absent.
    fn audio_features(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, FeatureVector>, CatalogError>;
}

impl<C: Catalog + ?Sized> Catalog for Arc<C> {
    fn search(
        &self,
        query: &CatalogQuery,
        limit: usize,
        market: &str,
    ) -> Result<Vec<Candidate>, CatalogError> {
        (**self).search(query, limit, market)
    }

    fn audio_features(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, FeatureVector>, CatalogError> {
        (**self).audio_features(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_string_combines_parts() {
        let query = CatalogQuery {
            genre: Some("rock".into()),
            artist: Some("Muse".into()),
            hints: vec![FeatureHint::HighEnergy, FeatureHint::HighDanceability],
        };
        assert_eq!(
            query.to_query_string(),
            "genre:rock artist:Muse energy:high danceability:high"
        );
        assert_eq!(query.without_genre().to_string(), "artist:Muse energy:high danceability:high");
        assert_eq!(CatalogQuery::default().to_query_string(), "");
    }

    #[test]
    fn test_candidate_json_shape() {
        let mut candidate = Candidate::new("t1", "Song", "Artist");
        candidate.artists.push("Guest".into());
        assert_eq!(candidate.artist_line(), "Artist, Guest");

        let json = serde_json::to_value(&candidate).unwrap();
        assert!(json.get("features").is_none());
        assert!(json.get("album").is_none());

        let parsed: Candidate = serde_json::from_str(
            r#"{"id": "t2", "name": "B", "artists": ["X"], "duration_ms": 1000}"#,
        )
        .unwrap();
        assert_eq!(parsed.preview_url, None);
        assert_eq!(parsed.duration_ms, 1000);
    }
}
