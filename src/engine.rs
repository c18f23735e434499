//! The mood engine: classification entry points and playlist building.
//!
//! A [`MoodEngine`] is built once with its collaborators and tables, then
//! shared freely; every call is independent and nothing is mutated after
//! construction.
//!
//! ```no_run
//! use moodmuse::catalog::sqlite::SqliteCatalog;
//! use moodmuse::engine::MoodEngine;
//! use moodmuse::resolver::PlaylistRequest;
//! use std::sync::Arc;
//!
//! let engine = MoodEngine::builder(Arc::new(SqliteCatalog::new("catalog.db", 5000))).build();
//! let signal = engine.classify_text("I am so happy and excited today")?;
//! let playlist = engine.build_playlist(&PlaylistRequest::for_mood(signal.mood.as_str()))?;
//! println!("{} ({} tracks)", playlist.name, playlist.tracks.len());
//! # Ok::<(), moodmuse::error::MoodError>(())
//! ```

use crate::catalog::{Candidate, Catalog};
use crate::error::{MoodError, MoodResult};
use crate::expression::{
    ExpressionAnalysis, ExpressionModel, ExpressionMoodClassifier, ExpressionProbabilities,
    PrecomputedExpressions,
};
use crate::lexicon::Lexicon;
use crate::mood::{Mood, MoodSignal};
use crate::ranker::{FeatureFilter, FilterContext};
use crate::resolver::{FeatureTargetResolver, PlaylistRequest, DEFAULT_LIMIT};
use crate::retriever::{CandidateRetriever, GenrePicker, RandomGenrePicker};
use crate::tables::MoodTables;
use crate::text::{TextAnalysis, TextMoodClassifier, TextScoringContext};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const DEFAULT_MARKET: &str = "US";

/// Cooperative cancellation flag for one request.
///
/// Checked before every catalog call; once set, the request stops with
/// [`MoodError::Cancelled`] and makes no further external calls.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Fails with [`MoodError::Cancelled`] once cancelled.
    pub fn check(&self) -> MoodResult<()> {
        if self.is_cancelled() {
            Err(MoodError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// A generated playlist. Built fresh per request and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub mood: Mood,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<f64>,
    pub tracks: Vec<Candidate>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub fallback_used: bool,
}

impl Playlist {
    fn assemble(
        mood: Mood,
        genre: Option<String>,
        energy: Option<f64>,
        tracks: Vec<Candidate>,
        fallback_used: bool,
    ) -> Self {
        let created_at = Utc::now();
        Self {
            id: format!("mood-{mood}-{}", created_at.timestamp_millis()),
            name: format!("{} Vibes", mood.capitalized()),
            description: format!("A {mood} playlist curated just for you"),
            mood,
            genre,
            energy,
            tracks,
            created_at,
            fallback_used,
        }
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.tracks.iter().map(|track| track.duration_ms).sum()
    }
}

pub struct MoodEngine {
    text: TextMoodClassifier,
    expression: ExpressionMoodClassifier,
    expression_model: Arc<dyn ExpressionModel>,
    resolver: FeatureTargetResolver,
    retriever: CandidateRetriever,
    filter: FeatureFilter,
    market: String,
}

impl MoodEngine {
    #[must_use]
    pub fn builder(catalog: Arc<dyn Catalog>) -> MoodEngineBuilder {
        MoodEngineBuilder::new(catalog)
    }

    pub fn classify_text(&self, text: &str) -> MoodResult<MoodSignal> {
        self.text.classify(text)
    }

    /// Classification plus the evidence behind it.
    pub fn analyze_text(&self, text: &str) -> MoodResult<TextAnalysis> {
        self.text.analyze(text)
    }

    pub fn text_classifier(&self) -> &TextMoodClassifier {
        &self.text
    }

    pub fn classify_expression(&self, probabilities: &ExpressionProbabilities) -> MoodSignal {
        self.expression.classify(probabilities)
    }

    /// Run the expression model on `frame` and classify its output.
    pub fn detect_expression(&self, frame: &[u8]) -> MoodResult<ExpressionAnalysis> {
        let probabilities = self.expression_model.detect(frame)?;
        Ok(self.expression.analyze(&probabilities))
    }

    /// Build a playlist for `request`.
    ///
    /// # Errors
    ///
    /// [`MoodError::InvalidRequest`] for a malformed request and
    /// [`MoodError::CatalogUnavailable`] when the catalog search fails.
    pub fn build_playlist(&self, request: &PlaylistRequest) -> MoodResult<Playlist> {
        self.build_playlist_with_cancel(request, &CancelToken::new())
    }

    /// [`build_playlist`](Self::build_playlist) that stops with
    /// [`MoodError::Cancelled`] once `cancel` fires.
    pub fn build_playlist_with_cancel(
        &self,
        request: &PlaylistRequest,
        cancel: &CancelToken,
    ) -> MoodResult<Playlist> {
        let target = self.resolver.resolve(request)?;
        let market = request.market.as_deref().unwrap_or(&self.market);
        info!("Building {} playlist (limit {}, market {market})", target.mood, target.limit);

        let retrieval = self.retriever.retrieve(&target, market, cancel)?;
        if retrieval.candidates.is_empty() {
            warn!("Catalog returned no tracks for `{}`", retrieval.query);
        }

        let tracks = self.filter.apply(
            retrieval.candidates,
            &target.features,
            target.energy_level,
            target.limit,
            cancel,
        )?;
        debug!("Playlist has {} tracks", tracks.len());

        Ok(Playlist::assemble(
            target.mood,
            retrieval.genre,
            target.energy_level,
            tracks,
            retrieval.fallback_used,
        ))
    }
}

/// Wires collaborators and tables into a [`MoodEngine`].
pub struct MoodEngineBuilder {
    catalog: Arc<dyn Catalog>,
    expression_model: Arc<dyn ExpressionModel>,
    lexicon: Arc<Lexicon>,
    tables: Arc<MoodTables>,
    picker: Arc<dyn GenrePicker>,
    text_context: TextScoringContext,
    filter_context: FilterContext,
    market: String,
    default_limit: usize,
}

impl MoodEngineBuilder {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            expression_model: Arc::new(PrecomputedExpressions),
            lexicon: Arc::new(Lexicon::default()),
            tables: Arc::new(MoodTables::default()),
            picker: Arc::new(RandomGenrePicker),
            text_context: TextScoringContext::default(),
            filter_context: FilterContext::default(),
            market: DEFAULT_MARKET.to_string(),
            default_limit: DEFAULT_LIMIT,
        }
    }

    pub fn expression_model(mut self, model: Arc<dyn ExpressionModel>) -> Self {
        self.expression_model = model;
        self
    }

    pub fn lexicon(mut self, lexicon: Arc<Lexicon>) -> Self {
        self.lexicon = lexicon;
        self
    }

    pub fn tables(mut self, tables: Arc<MoodTables>) -> Self {
        self.tables = tables;
        self
    }

    pub fn genre_picker(mut self, picker: Arc<dyn GenrePicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn text_context(mut self, context: TextScoringContext) -> Self {
        self.text_context = context;
        self
    }

    pub fn filter_context(mut self, context: FilterContext) -> Self {
        self.filter_context = context;
        self
    }

    pub fn market(mut self, market: impl Into<String>) -> Self {
        self.market = market.into();
        self
    }

    pub fn default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    #[must_use]
    pub fn build(self) -> MoodEngine {
        MoodEngine {
            text: TextMoodClassifier::with_context(self.lexicon, self.text_context),
            expression: ExpressionMoodClassifier,
            expression_model: self.expression_model,
            resolver: FeatureTargetResolver::new(self.tables)
                .with_default_limit(self.default_limit),
            retriever: CandidateRetriever::new(self.catalog.clone(), self.picker),
            filter: FeatureFilter::with_context(self.catalog, self.filter_context),
            market: self.market,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogQuery;
    use crate::error::CatalogError;
    use crate::features::FeatureVector;
    use crate::retriever::FirstGenrePicker;
    use std::collections::HashMap;

    struct StaticCatalog {
        tracks: Vec<Candidate>,
    }

    impl Catalog for StaticCatalog {
        fn search(
            &self,
            _query: &CatalogQuery,
            limit: usize,
            _market: &str,
        ) -> Result<Vec<Candidate>, CatalogError> {
            Ok(self.tracks.iter().take(limit).cloned().collect())
        }

        fn audio_features(
            &self,
            _ids: &[String],
        ) -> Result<HashMap<String, FeatureVector>, CatalogError> {
            Ok(HashMap::new())
        }
    }

    fn engine(count: usize) -> MoodEngine {
        let tracks = (0..count)
            .map(|i| {
                let mut track = Candidate::new(format!("t{i}"), format!("Track {i}"), "Artist");
                track.duration_ms = 1000;
                track
            })
            .collect();
        MoodEngine::builder(Arc::new(StaticCatalog { tracks }))
            .genre_picker(Arc::new(FirstGenrePicker))
            .build()
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(MoodError::Cancelled)));
    }

    #[test]
    fn test_playlist_metadata() {
        let playlist = engine(30)
            .build_playlist(&PlaylistRequest::for_mood("happy").with_energy_level(0.8))
            .unwrap();
        assert!(playlist.id.starts_with("mood-happy-"));
        assert_eq!(playlist.name, "Happy Vibes");
        assert_eq!(playlist.description, "A happy playlist curated just for you");
        assert_eq!(playlist.mood, Mood::Happy);
        assert_eq!(playlist.genre.as_deref(), Some("pop"));
        assert_eq!(playlist.energy, Some(0.8));
        assert_eq!(playlist.tracks.len(), DEFAULT_LIMIT);
        assert_eq!(playlist.total_duration_ms(), 20_000);
        assert!(!playlist.fallback_used);
    }

    #[test]
    fn test_empty_catalog_gives_empty_playlist() {
        let playlist = engine(0).build_playlist(&PlaylistRequest::for_mood("sad")).unwrap();
        assert!(playlist.tracks.is_empty());
        assert!(playlist.fallback_used);
    }

    #[test]
    fn test_invalid_request_never_reaches_catalog() {
        let err = engine(5)
            .build_playlist(&PlaylistRequest::for_mood("happy").with_limit(0))
            .unwrap_err();
        assert!(matches!(err, MoodError::InvalidRequest(_)));
    }

    #[test]
    fn test_detect_expression_through_default_model() {
        let engine = engine(0);
        let analysis = engine
            .detect_expression(br#"{"angry": 0.6, "sad": 0.3}"#)
            .unwrap();
        assert_eq!(analysis.signal.mood, Mood::Angry);
        assert!(matches!(
            engine.detect_expression(b"null"),
            Err(MoodError::NoFaceDetected)
        ));
    }

    #[test]
    fn test_playlist_json_round_trip() {
        let playlist = engine(3).build_playlist(&PlaylistRequest::for_mood("calm")).unwrap();
        let json = serde_json::to_string(&playlist).unwrap();
        let parsed: Playlist = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, playlist);
    }
}
