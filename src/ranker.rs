//! Fail-open audio-feature filter.
//!
//! Candidates are checked against the mood's energy/valence targets and the
//! optional energy override. Order is never changed; tracks are only dropped.
//! When features cannot be fetched the candidates pass through untouched.

use crate::catalog::{Candidate, Catalog};
use crate::engine::CancelToken;
use crate::error::MoodResult;
use crate::features::{AudioFeature, AudioFeatureTarget, FeatureVector};
use log::{debug, warn};
use std::sync::Arc;

/// Tolerances for the feature filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterContext {
    /// Features compared against the mood target.
    pub features: &'static [AudioFeature],
    /// Max distance from a mood target that still counts as a match.
    pub target_tolerance: f64,
    /// Max energy distance from the caller's energy override.
    pub energy_level_tolerance: f64,
    /// Fraction of criteria a track must match to be kept.
    pub pass_ratio: f64,
}

impl Default for FilterContext {
    fn default() -> Self {
        Self {
            features: &[AudioFeature::Energy, AudioFeature::Valence],
            target_tolerance: 0.3,
            energy_level_tolerance: 0.2,
            pass_ratio: 0.6,
        }
    }
}

/// Whether `features` is close enough to `target`.
///
/// A track with nothing to check (no targeted feature and no override) passes.
#[must_use]
pub fn track_matches(
    features: &FeatureVector,
    target: &AudioFeatureTarget,
    energy_level: Option<f64>,
    context: &FilterContext,
) -> bool {
    let mut criteria = 0_u32;
    let mut matches = 0_u32;

    for &feature in context.features {
        if let Some(wanted) = target.get(feature) {
            criteria += 1;
            if (features.get(feature) - wanted).abs() < context.target_tolerance {
                matches += 1;
            }
        }
    }
    if let Some(level) = energy_level {
        criteria += 1;
        if (features.energy - level).abs() < context.energy_level_tolerance {
            matches += 1;
        }
    }

    criteria == 0 || f64::from(matches) / f64::from(criteria) >= context.pass_ratio
}

pub struct FeatureFilter {
    catalog: Arc<dyn Catalog>,
    context: FilterContext,
}

impl FeatureFilter {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self::with_context(catalog, FilterContext::default())
    }

    pub fn with_context(catalog: Arc<dyn Catalog>, context: FilterContext) -> Self {
        Self { catalog, context }
    }

    /// Keep the candidates whose features fit, in their original order, up to
    /// `limit`.
    ///
    /// Candidates without a feature vector are kept. If the feature fetch
    /// fails, or the filter would reject every candidate, the unfiltered list
    /// is returned instead.
    pub fn apply(
        &self,
        candidates: Vec<Candidate>,
        target: &AudioFeatureTarget,
        energy_level: Option<f64>,
        limit: usize,
        cancel: &CancelToken,
    ) -> MoodResult<Vec<Candidate>> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        cancel.check()?;
        let ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();
        let features = match self.catalog.audio_features(&ids) {
            Ok(features) => features,
            Err(err) => {
                warn!("Skipping feature filter, audio features unavailable: {err}");
                return Ok(truncated(candidates, limit));
            }
        };
        cancel.check()?;

        let total = candidates.len();
        let kept: Vec<Candidate> = candidates
            .iter()
            .filter_map(|candidate| match features.get(&candidate.id) {
                Some(vector) if !track_matches(vector, target, energy_level, &self.context) => None,
                vector => Some(Candidate {
                    features: vector.copied(),
                    ..candidate.clone()
                }),
            })
            .collect();

        if kept.is_empty() {
            debug!("Feature filter rejected all {total} candidates, keeping them unfiltered");
            return Ok(truncated(candidates, limit));
        }
        debug!("Feature filter kept {} of {total} candidates", kept.len());
        Ok(truncated(kept, limit))
    }
}

fn truncated(mut candidates: Vec<Candidate>, limit: usize) -> Vec<Candidate> {
    candidates.truncate(limit);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogQuery;
    use crate::error::{CatalogError, MoodError};
    use std::collections::HashMap;

    fn vector(energy: f64, valence: f64) -> FeatureVector {
        FeatureVector {
            energy,
            valence,
            ..Default::default()
        }
    }

    fn calm_target() -> AudioFeatureTarget {
        AudioFeatureTarget {
            energy: Some(0.3),
            valence: Some(0.5),
            acousticness: Some(0.7),
            ..Default::default()
        }
    }

    struct FeatureCatalog {
        features: Option<HashMap<String, FeatureVector>>,
    }

    impl Catalog for FeatureCatalog {
        fn search(
            &self,
            _query: &CatalogQuery,
            _limit: usize,
            _market: &str,
        ) -> Result<Vec<Candidate>, CatalogError> {
            Ok(Vec::new())
        }

        fn audio_features(
            &self,
            _ids: &[String],
        ) -> Result<HashMap<String, FeatureVector>, CatalogError> {
            self.features
                .clone()
                .ok_or_else(|| CatalogError::Unauthorized("token expired".into()))
        }
    }

    fn filter(features: Option<Vec<(&str, FeatureVector)>>) -> FeatureFilter {
        let features = features.map(|pairs| {
            pairs
                .into_iter()
                .map(|(id, vector)| (id.to_string(), vector))
                .collect()
        });
        FeatureFilter::new(Arc::new(FeatureCatalog { features }))
    }

    fn candidates(ids: &[&str]) -> Vec<Candidate> {
        ids.iter().map(|id| Candidate::new(*id, *id, "Artist")).collect()
    }

    fn ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_match_ratio() {
        let context = FilterContext::default();
        let target = calm_target();
        // Both within 0.3.
        assert!(track_matches(&vector(0.4, 0.6), &target, None, &context));
        // 1 of 2 is below 0.6.
        assert!(!track_matches(&vector(0.9, 0.5), &target, None, &context));
        assert!(!track_matches(&vector(0.3, 0.9), &target, None, &context));
    }

    #[test]
    fn test_energy_override_adds_a_criterion() {
        let context = FilterContext::default();
        let target = calm_target();
        // energy 0.45: mood target ok, valence ok, override 0.8 misses -> 2/3.
        assert!(track_matches(&vector(0.45, 0.5), &target, Some(0.8), &context));
        // energy 0.1: mood target ok, valence misses, override misses -> 1/3.
        assert!(!track_matches(&vector(0.1, 0.9), &target, Some(0.8), &context));
    }

    #[test]
    fn test_unconstrained_target_keeps_everything() {
        let context = FilterContext::default();
        let focus = AudioFeatureTarget {
            instrumentalness: Some(0.6),
            ..Default::default()
        };
        assert!(track_matches(&vector(0.0, 0.0), &focus, None, &context));
        assert!(!track_matches(&vector(0.0, 0.0), &focus, Some(0.9), &context));
    }

    #[test]
    fn test_filter_keeps_order_and_attaches_features() {
        let filter = filter(Some(vec![
            ("a", vector(0.3, 0.5)),
            ("b", vector(0.95, 0.1)),
            ("d", vector(0.35, 0.45)),
        ]));
        let kept = filter
            .apply(candidates(&["a", "b", "c", "d"]), &calm_target(), None, 10, &CancelToken::new())
            .unwrap();
        assert_eq!(ids(&kept), vec!["a", "c", "d"]);
        assert_eq!(kept[0].features, Some(vector(0.3, 0.5)));
        assert_eq!(kept[1].features, None);
    }

    #[test]
    fn test_filter_truncates_to_limit() {
        let filter = filter(Some(Vec::new()));
        let kept = filter
            .apply(candidates(&["a", "b", "c"]), &calm_target(), None, 2, &CancelToken::new())
            .unwrap();
        assert_eq!(ids(&kept), vec!["a", "b"]);
    }

    #[test]
    fn test_fetch_failure_fails_open() {
        let filter = filter(None);
        let input = candidates(&["a", "b", "c"]);
        let kept = filter
            .apply(input.clone(), &calm_target(), Some(0.1), 2, &CancelToken::new())
            .unwrap();
        assert_eq!(kept, input[..2].to_vec());
    }

    #[test]
    fn test_never_empties_a_non_empty_list() {
        let filter = filter(Some(vec![("a", vector(1.0, 0.0)), ("b", vector(0.9, 0.0))]));
        let kept = filter
            .apply(candidates(&["a", "b"]), &calm_target(), None, 5, &CancelToken::new())
            .unwrap();
        assert_eq!(ids(&kept), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_input_and_cancellation() {
        let filter = filter(None);
        assert!(filter
            .apply(Vec::new(), &calm_target(), None, 5, &CancelToken::new())
            .unwrap()
            .is_empty());

        let cancel = CancelToken::new();
        cancel.cancel();
        let err = filter
            .apply(candidates(&["a"]), &calm_target(), None, 5, &cancel)
            .unwrap_err();
        assert!(matches!(err, MoodError::Cancelled));
    }
}
