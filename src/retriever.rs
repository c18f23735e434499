//! Candidate retrieval with a single genre-relaxed fallback.

use crate::catalog::{Candidate, Catalog, CatalogQuery};
use crate::engine::CancelToken;
use crate::error::MoodResult;
use crate::resolver::ResolvedTarget;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, SeedableRng};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Chooses which genre of a mood's set to search with.
pub trait GenrePicker: Send + Sync {
    /// Pick one of `genres`, or `None` when the set is empty.
    fn pick<'a>(&self, genres: &'a [String]) -> Option<&'a String>;
}

/// Uniform choice from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomGenrePicker;

impl GenrePicker for RandomGenrePicker {
    fn pick<'a>(&self, genres: &'a [String]) -> Option<&'a String> {
        genres.choose(&mut thread_rng())
    }
}

/// Uniform choice from a seeded generator; same seed, same sequence of picks.
#[derive(Debug)]
pub struct SeededGenrePicker {
    rng: Mutex<StdRng>,
}

impl SeededGenrePicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl GenrePicker for SeededGenrePicker {
    fn pick<'a>(&self, genres: &'a [String]) -> Option<&'a String> {
        // A panic elsewhere cannot leave the generator in a bad state.
        let mut rng = self.rng.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        genres.choose(&mut *rng)
    }
}

/// Always the first genre.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstGenrePicker;

impl GenrePicker for FirstGenrePicker {
    fn pick<'a>(&self, genres: &'a [String]) -> Option<&'a String> {
        genres.first()
    }
}

/// Result of one retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieval {
    /// Primary results first, then fallback results; never longer than the limit.
    pub candidates: Vec<Candidate>,
    /// Genre used for the primary search.
    pub genre: Option<String>,
    pub query: CatalogQuery,
    pub fallback_used: bool,
}

pub struct CandidateRetriever {
    catalog: Arc<dyn Catalog>,
    picker: Arc<dyn GenrePicker>,
}

impl CandidateRetriever {
    pub fn new(catalog: Arc<dyn Catalog>, picker: Arc<dyn GenrePicker>) -> Self {
        Self { catalog, picker }
    }

    /// Search the catalog for `target`, broadening once if the first search
    /// returns fewer than half of the limit. Without a genre there is nothing
    /// to broaden, so the first search stands.
    pub fn retrieve(
        &self,
        target: &ResolvedTarget,
        market: &str,
        cancel: &CancelToken,
    ) -> MoodResult<Retrieval> {
        let limit = target.limit;
        let genre = self.picker.pick(&target.genres).cloned();
        let query = CatalogQuery {
            genre: genre.clone(),
            artist: target.artist.clone(),
            hints: target.features.hints(),
        };
        debug!("Searching catalog for {} with `{query}`", target.mood);

        cancel.check()?;
        let mut candidates = self.catalog.search(&query, limit, market)?;
        candidates.truncate(limit);

        let mut fallback_used = false;
        if let Some(picked) = genre.as_deref().filter(|_| candidates.len() * 2 < limit) {
            info!(
                "Only {} of {limit} tracks for genre {picked}, retrying without genre",
                candidates.len()
            );
            cancel.check()?;
            let fallback = self.catalog.search(&query.without_genre(), limit, market)?;
            fallback_used = true;

            let mut seen: HashSet<String> = candidates.iter().map(|c| c.id.clone()).collect();
            let room = limit - candidates.len();
            candidates.extend(
                fallback
                    .into_iter()
                    .filter(|candidate| seen.insert(candidate.id.clone()))
                    .take(room),
            );
        }

        debug!("Retrieved {} candidates (fallback: {fallback_used})", candidates.len());
        Ok(Retrieval {
            candidates,
            genre,
            query,
            fallback_used,
        })
    }
}
